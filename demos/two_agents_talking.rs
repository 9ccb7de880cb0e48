use std::env;

use agentcrew::clients::openai::{Model, OpenAIClient};
use agentcrew::{
    Agent, CompletionOptions, ModelContext, OrchestrationPolicy, Orchestrator,
    TerminationCondition, Turn,
};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

// Run from the root folder of the repo as follows:
// OPENAI_API_KEY=your-open-ai-key-here cargo run --example two_agents_talking

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    agentcrew::init_logger();

    let secret_key = env::var("OPENAI_API_KEY")
        .map_err(|_| "Please set the OPENAI_API_KEY environment variable!")?;

    let client = Arc::new(OpenAIClient::new_with_model_enum(&secret_key, Model::GPT35Turbo));
    let context = ModelContext::new(client).with_options(CompletionOptions {
        temperature: 0.8,
        max_tokens: 150,
        ..CompletionOptions::default()
    });

    let mut pair = Orchestrator::new(context);
    pair.add_agent(Agent::new(
        "Agent A",
        "You are Agent A, a friendly AI enthusiastic about chatting on many topics. \
         When you receive something from Agent B, respond informally and add new insights.",
    ))?;
    pair.add_agent(Agent::new(
        "Agent B",
        "You are Agent B, a knowledgeable AI who enjoys detailed discussions. \
         When Agent A speaks, respond thoughtfully and ask follow-up questions.",
    ))?;

    // Both agents remember earlier topics.
    let mut histories = pair.fresh_histories();

    for topic in ["cricket", "weather", "political news"] {
        let opener = format!("Hey Agent B, let's chat about {}!", topic);
        let run = pair.start_with_histories(
            OrchestrationPolicy::RoundRobin,
            Turn::user(&opener),
            TerminationCondition::new(3),
            histories,
        )?;
        let outcome = run.collect().await?;

        println!("\n=== Conversation on {} ===", topic.to_uppercase());
        println!("A ▶ {}", opener);
        for t in &outcome.turns {
            println!("{} ◀ {}", t.agent_name, t.turn.content);
        }
        histories = outcome.histories;

        // Small pause to stay clear of rate limits
        sleep(Duration::from_secs(1)).await;
    }

    Ok(())
}
