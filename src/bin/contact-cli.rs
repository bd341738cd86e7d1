use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "contact-cli")]
#[command(about = "Management CLI for the contact and portfolio service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "CONTACT_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Admin key for project writes.
    #[arg(short, long, env = "ADMIN_SECRET_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Health,
    /// List published projects
    Projects {
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
    },
    /// List contact submissions, newest first
    Submissions,
    /// Create a project from a JSON file
    CreateProject { file: PathBuf },
    /// Delete a project by id
    DeleteProject { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
        );
    }

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/api/health", cli.url)).send().await?,
        Commands::Projects { category, status } => {
            let mut query = Vec::new();
            if let Some(category) = category {
                query.push(("category", category));
            }
            if let Some(status) = status {
                query.push(("status", status));
            }
            client
                .get(format!("{}/api/projects", cli.url))
                .query(&query)
                .send()
                .await?
        }
        Commands::Submissions => {
            client
                .get(format!("{}/api/submissions", cli.url))
                .send()
                .await?
        }
        Commands::CreateProject { file } => {
            let project: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            client
                .post(format!("{}/api/projects", cli.url))
                .headers(headers)
                .json(&project)
                .send()
                .await?
        }
        Commands::DeleteProject { id } => {
            client
                .delete(format!("{}/api/projects/{}", cli.url, id))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
