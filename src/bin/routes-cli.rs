use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use user_gateway::config::{load_config, AppConfig, RunMode};
use user_gateway::routing::assemble;

#[derive(Parser)]
#[command(name = "routes-cli")]
#[command(about = "Inspect the user gateway's route table", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route table assembled for a run mode
    Table {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        mode: Option<RunMode>,
    },
    /// Fetch the API document from a running server
    Docs {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Table { config, mode } => {
            let mut config = match config {
                Some(path) => load_config(&path)?,
                None => AppConfig::default(),
            };
            if let Some(mode) = mode {
                config.app.mode = mode;
            }

            let table = assemble(&config)?;
            println!("mode: {}", config.app.mode);
            println!("{:<8} {:<32} {:<10} ENDPOINT", "METHOD", "PATH", "AUTH");
            for route in table.describe() {
                println!(
                    "{:<8} {:<32} {:<10} {}",
                    route.method, route.path, route.auth, route.endpoint
                );
            }
        }
        Commands::Docs { url } => {
            let res = reqwest::get(format!("{}/swagger/doc.json", url.trim_end_matches('/'))).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
