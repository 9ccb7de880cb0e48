use std::env;

use agentcrew::attachment::AttachmentIngestor;
use agentcrew::clients::openai::{Model, OpenAIClient};
use agentcrew::tools::Capability;
use agentcrew::{Agent, ModelContext, Orchestrator, Turn};
use std::sync::Arc;

// Run from the root folder of the repo as follows:
// OPENAI_API_KEY=your-open-ai-key-here cargo run --example recovery_squad -- "what happened" [screenshot.png ...]

const THERAPIST_TEMPLATE: &str = "Analyze the emotional state and provide empathetic support based on:
User's message: {input}

Please provide a compassionate response with:
1. Validation of feelings
2. Gentle words of comfort
3. Relatable experiences or insights
4. Words of encouragement
5. Practical emotional coping strategies

Keep the tone warm, understanding, and supportive.";

const CLOSURE_TEMPLATE: &str = "Help create emotional closure based on:
User's feelings: {input}

Please provide:
1. Template for unsent messages to express feelings
2. Emotional release exercises
3. Closure ritual suggestions
4. Strategies for moving forward
5. Ways to process unresolved emotions

Focus on healthy emotional expression and letting go.";

const ROUTINE_TEMPLATE: &str = "Design a 7-day recovery plan based on:
Current state: {input}

Include:
1. Daily activities and challenges
2. Self-care routines
3. Social media guidelines
4. Mood-lifting music suggestions

Make it practical and achievable.";

const HONESTY_TEMPLATE: &str = "Provide honest, constructive feedback about:
Situation: {input}

Include:
1. Objective analysis of the situation
2. Growth opportunities
3. Future outlook
4. Actionable steps

Be direct and specific, but not harsh.";

fn build_squad() -> Vec<Agent> {
    vec![
        Agent::from_lines(
            "Therapist Agent",
            [
                "You are an empathetic therapist that:",
                "1. Listens with empathy and validates feelings",
                "2. Uses gentle humor to lighten the mood",
                "3. Shares relatable breakup experiences",
                "4. Offers comforting words and encouragement",
                "5. Analyzes both text and image inputs for emotional context",
                "Be supportive and understanding in your responses",
            ],
        )
        .with_input_template(THERAPIST_TEMPLATE),
        Agent::from_lines(
            "Closure Agent",
            [
                "You are a closure specialist that:",
                "1. Creates emotional messages for unsent feelings",
                "2. Helps express raw, honest emotions",
                "3. Formats messages clearly with headers",
                "4. Ensures tone is heartfelt and authentic",
                "Focus on emotional release and closure",
            ],
        )
        .with_input_template(CLOSURE_TEMPLATE),
        Agent::from_lines(
            "Routine Planner Agent",
            [
                "You are a recovery routine planner that:",
                "1. Designs 7-day recovery challenges",
                "2. Includes fun activities and self-care tasks",
                "3. Suggests social media detox strategies",
                "4. Creates empowering playlists",
                "Focus on practical recovery steps",
            ],
        )
        .with_input_template(ROUTINE_TEMPLATE),
        Agent::from_lines(
            "Brutal Honesty Agent",
            [
                "You are a direct feedback specialist that:",
                "1. Gives raw, objective feedback about breakups",
                "2. Explains relationship failures clearly",
                "3. Uses blunt, factual language",
                "4. Provides reasons to move forward",
                "Focus on honest insights without sugar-coating",
            ],
        )
        .with_capability(Capability::web_search())
        .with_input_template(HONESTY_TEMPLATE),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    agentcrew::init_logger();

    let secret_key = env::var("OPENAI_API_KEY")
        .map_err(|_| "Please set the OPENAI_API_KEY environment variable!")?;

    let mut args = env::args().skip(1);
    let feelings = args.next().unwrap_or_default();
    let screenshot_paths: Vec<String> = args.collect();

    let mut uploads = Vec::new();
    for path in &screenshot_paths {
        match std::fs::read(path) {
            Ok(bytes) => uploads.push((path.clone(), bytes)),
            Err(e) => eprintln!("Could not read {}: {}", path, e),
        }
    }
    let screenshots = AttachmentIngestor::new().ingest_all(uploads);

    if feelings.trim().is_empty() && screenshots.is_empty() {
        eprintln!("Please share your feelings or pass chat screenshots to get help.");
        return Ok(());
    }

    let client = Arc::new(OpenAIClient::new_with_model_enum(&secret_key, Model::GPT4o));
    let mut squad = Orchestrator::new(ModelContext::new(client));
    for agent in build_squad() {
        squad.add_agent(agent)?;
    }

    println!("Initializing your recovery team...");
    let seed = Turn::user(feelings).with_attachments(screenshots);
    let outcome = squad.run_independent(seed).await?;

    println!("\n# Your Personalized Recovery Plan");
    for result in &outcome.results {
        println!("\n## {}\n", result.agent_name);
        match &result.result {
            Ok(turn) => println!("{}", turn.content),
            Err(e) => println!(
                "Sorry, there was an issue getting a response from {} ({}). Please try again.",
                result.agent_name, e.kind
            ),
        }
    }

    Ok(())
}
