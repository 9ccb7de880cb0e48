use std::env;
use std::sync::Arc;

use agentcrew::{
    ConsoleInput, CrewConfig, Orchestrator, StopMatch, TerminationCondition, TerminationReason,
};

// Run from the root folder of the repo as follows:
// OPENAI_API_KEY=your-open-ai-key-here cargo run --example group_chat [-- MODE [crew.json]]
//
// MODE is one of:
//   group     (default) every message goes to the ChatBot, whose reply is passed on to the
//             TechSpecialist and then the CreativeAssistant
//   simple    1-on-1 with the ChatBot
//   tech      1-on-1 with the TechSpecialist
//   creative  1-on-1 with the CreativeAssistant
//
// Type 'exit', 'quit', 'bye' or 'goodbye' to leave.

const DEFAULT_CREW: &str = include_str!("group_chat.json");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    agentcrew::init_logger();

    let secret_key = env::var("OPENAI_API_KEY")
        .map_err(|_| "Please set the OPENAI_API_KEY environment variable!")?;

    let mut args = env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "group".to_string());
    let crew_config = match args.next() {
        Some(path) => CrewConfig::from_file(path)?,
        None => CrewConfig::from_json_str(DEFAULT_CREW)?,
    };
    let config = match mode.as_str() {
        "group" => crew_config,
        "simple" => crew_config.solo("ChatBot")?,
        "tech" => crew_config.solo("TechSpecialist")?,
        "creative" => crew_config.solo("CreativeAssistant")?,
        other => {
            eprintln!("Unknown mode '{}'. Use group, simple, tech or creative.", other);
            return Ok(());
        }
    };
    let client = Arc::new(config.openai_client(&secret_key));
    let crew: Orchestrator = config.build_orchestrator(client)?;

    // Console users type the farewell on its own.
    let termination = if config.stop_phrases.is_empty() {
        TerminationCondition::new(config.max_turns)
            .with_stop_phrases(["exit", "quit", "bye", "goodbye"])
            .with_stop_match(StopMatch::Exact)
    } else {
        config.termination()
    };

    let names: Vec<&str> = crew.agents().iter().map(|a| a.name()).collect();
    println!("Chat started with {}.", names.join(", "));
    println!("Type 'exit', 'quit', 'bye', or 'goodbye' to end the conversation.\n");

    let mut console = ConsoleInput::default();
    let outcome = crew
        .converse(&mut console, &termination, |t| {
            println!("\n{}:\n{}\n", t.agent_name, t.turn.content);
        })
        .await?;

    match outcome.reason {
        TerminationReason::TurnLimit => println!("Reached the turn limit. Goodbye!"),
        TerminationReason::InputClosed => println!("\nInput closed. Goodbye!"),
        _ => println!("Goodbye!"),
    }
    Ok(())
}
