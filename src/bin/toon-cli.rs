use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use toon_http::negotiation::TOON_CONTENT_TYPE;
use toon_http::ToonCodec;

#[derive(Parser)]
#[command(name = "toon-cli")]
#[command(about = "Convert between JSON and TOON, and talk TOON to a server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert JSON to TOON (reads stdin when no file is given)
    Encode { file: Option<PathBuf> },
    /// Convert TOON to pretty JSON (reads stdin when no file is given)
    Decode { file: Option<PathBuf> },
    /// GET a path asking for TOON
    Get {
        path: String,
        /// Ask for JSON instead
        #[arg(long)]
        json: bool,
    },
    /// POST a TOON document to a path
    Post {
        path: String,
        file: Option<PathBuf>,
        /// Treat the input as JSON and encode it first
        #[arg(long)]
        from_json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let codec = ToonCodec::new();

    match cli.command {
        Commands::Encode { file } => {
            let value: Value = serde_json::from_str(&read_input(file)?)?;
            println!("{}", codec.encode_value(&value)?);
        }
        Commands::Decode { file } => {
            let value = codec.decode(&read_input(file)?)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Get { path, json } => {
            let accept = if json { "application/json" } else { TOON_CONTENT_TYPE };
            let res = reqwest::Client::new()
                .get(format!("{}{}", cli.url, path))
                .header(ACCEPT, accept)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Post {
            path,
            file,
            from_json,
        } => {
            let input = read_input(file)?;
            let body = if from_json {
                codec.encode_value(&serde_json::from_str(&input)?)?
            } else {
                input
            };
            let res = reqwest::Client::new()
                .post(format!("{}{}", cli.url, path))
                .header(CONTENT_TYPE, TOON_CONTENT_TYPE)
                .header(ACCEPT, TOON_CONTENT_TYPE)
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn read_input(file: Option<PathBuf>) -> Result<String, std::io::Error> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        eprintln!("{}", text);
        std::process::exit(1);
    }

    eprintln!("{} ({})", status, content_type);
    println!("{}", text);
    Ok(())
}
