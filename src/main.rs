use arxiv_researcher::adk::model::gemini::GeminiModel;
use arxiv_researcher::researcher::config::Config;
use arxiv_researcher::researcher::search::TavilySearch;
use arxiv_researcher::researcher::store::{
    open_database, ChatHistory, RedbChatHistory, RedbMemoryStore, ResearchMemoryManager,
    DEFAULT_SEARCH_LIMIT,
};
use arxiv_researcher::researcher::workflow::{ResearchWorkflow, WorkflowEvent};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc;

const DEFAULT_TOPIC: &str = "Recent advances in quantum computing";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Research a topic and print the report
    Research {
        /// The research topic (prompted for when omitted)
        topic: Option<String>,

        /// The Gemini model to use
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Show the stored research history
    History {
        /// Only show the most recent N messages
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Manage stored memory records
    Memory {
        #[command(subcommand)]
        action: MemoryCommand,
    },
}

#[derive(Subcommand, Debug)]
enum MemoryCommand {
    /// Store a JSON record under a key
    Save { key: String, value: String },
    /// Find records similar to a query
    Search {
        query: String,
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Print the record stored under a key
    Get { key: String },
    /// Remove the record stored under a key
    Delete { key: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let db = open_database(&config.database_path)?;

    match args.command {
        Commands::Research { topic, model } => {
            let topic = match topic {
                Some(t) => t,
                None => prompt_topic()?,
            };
            let model_name = model.unwrap_or_else(|| config.model_name.clone());
            log::info!("Using model: {}", model_name);

            let workflow = ResearchWorkflow::new(
                Arc::new(GeminiModel::new(model_name, config.google_api_key.clone())),
                Arc::new(TavilySearch::new(
                    config.tavily_api_key.clone(),
                    config.search_max_results,
                )),
                Arc::new(RedbChatHistory::new(db, config.session_id.clone())?),
            );

            let (tx, mut rx) = mpsc::channel(16);
            let progress = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match event {
                        WorkflowEvent::StepStarted(step) => eprintln!("[Graph] {}...", step.name()),
                        WorkflowEvent::StepCompleted { .. } => {}
                        WorkflowEvent::Failed { step, error } => {
                            eprintln!("[Graph] {} failed: {}", step.name(), error)
                        }
                    }
                }
            });

            let result = workflow.run_stream(&topic, tx).await;
            let _ = progress.await;
            let state = result?;

            println!("\n=== AI Research Report ===\n");
            println!("{}", state.result);
            println!("\nSaved to research memory.");
        }
        Commands::History { limit } => {
            let history = RedbChatHistory::new(db, config.session_id.clone())?;
            let messages = history.messages().await?;
            let skip = limit.map_or(0, |n| messages.len().saturating_sub(n));
            for m in messages.iter().skip(skip) {
                println!("[{}] {}:\n{}\n", m.created_at.to_rfc3339(), m.role, m.content);
            }
            println!("{} of {} messages", messages.len() - skip, messages.len());
        }
        Commands::Memory { action } => {
            let memory = ResearchMemoryManager::new(Arc::new(RedbMemoryStore::new(db)?));
            match action {
                MemoryCommand::Save { key, value } => {
                    let data: serde_json::Value = serde_json::from_str(&value)?;
                    memory.save_memory(&key, data).await?;
                    println!("Saved {}", key);
                }
                MemoryCommand::Search { query, limit } => {
                    let matches = memory.search_memory(&query, limit).await?;
                    if matches.is_empty() {
                        println!("No memories match '{}'", query);
                    }
                    for m in matches {
                        println!("{:.2}  {}  {}", m.score, m.key, m.value);
                    }
                }
                MemoryCommand::Get { key } => match memory.get_memory(&key).await? {
                    Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                    None => println!("No memory stored for '{}'", key),
                },
                MemoryCommand::Delete { key } => {
                    if memory.delete_memory(&key).await? {
                        println!("Deleted {}", key);
                    } else {
                        println!("No memory stored for '{}'", key);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Ask for a topic on stdin, falling back to the default on blank input
fn prompt_topic() -> io::Result<String> {
    print!("Enter your research topic: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let topic = line.trim();
    Ok(if topic.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        topic.to_string()
    })
}
