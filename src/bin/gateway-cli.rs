use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the dynamic API gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a service from a JSON configuration file
    Configure {
        /// Path to the service configuration (JSON)
        file: PathBuf,
    },
    /// List registered services
    Services,
    /// Check gateway status
    Status,
    /// Unmount a service by name (its prefix without the leading '/')
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Configure { file } => {
            let body = std::fs::read(&file)?;
            // Catch obvious mistakes before the gateway answers "internal error".
            serde_json::from_slice::<Value>(&body)?;
            let res = client
                .post(format!("{}/configure", cli.url))
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?;
            print_text(res).await?;
        }
        Commands::Services => {
            let res = client.get(format!("{}/admin/services", cli.url)).send().await?;
            print_json(res).await?;
        }
        Commands::Status => {
            let res = client.get(format!("{}/admin/status", cli.url)).send().await?;
            print_json(res).await?;
        }
        Commands::Remove { name } => {
            let res = client
                .delete(format!("{}/admin/services/{}", cli.url, name))
                .send()
                .await?;
            print_text(res).await?;
        }
    }

    Ok(())
}

async fn print_text(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if status.is_success() {
        println!("{}", text);
    } else {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("Response: {}", text);
    }
    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
