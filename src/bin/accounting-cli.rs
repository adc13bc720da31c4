use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "accounting-cli")]
#[command(about = "Command-line client for the accounting gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Health,
    /// List receipts
    Receipts,
    /// List accounting entries
    Entries,
    /// Show one accounting entry
    Entry { id: String },
    /// List CFEs sent by the configured company
    SentCfes,
    /// Show company info and the stored logo URL
    Settings,
    /// Set the company RUT
    SaveRut { rut: String },
    /// Replace the company logo with an image file
    UploadLogo { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');
    let accounting = format!("{}/accounting", base);

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Receipts => client.get(format!("{}/receipts", accounting)).send().await?,
        Commands::Entries => client.get(format!("{}/entries", accounting)).send().await?,
        Commands::Entry { id } => {
            client
                .get(format!("{}/entries/{}", accounting, id))
                .send()
                .await?
        }
        Commands::SentCfes => client.get(format!("{}/sent-cfes", accounting)).send().await?,
        Commands::Settings => client.get(format!("{}/settings", accounting)).send().await?,
        Commands::SaveRut { rut } => {
            client
                .post(format!("{}/save-rut", accounting))
                .json(&json!({ "rut": rut }))
                .send()
                .await?
        }
        Commands::UploadLogo { path } => {
            let bytes = tokio::fs::read(&path).await?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "logo.jpg".to_string());
            let form = Form::new().part("logo", Part::bytes(bytes).file_name(file_name));
            client
                .post(format!("{}/upload-logo", accounting))
                .multipart(form)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
