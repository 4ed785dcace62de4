use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use etymon_rs::web::{WebConfig, serve};
use etymon_rs::{
    HttpModel, HttpModelConfig, LoadingUpdate, LookupConfig, LookupService, POPUP_SOURCE,
    PopupResponse, SidePanelResponse,
};
use tokio::sync::broadcast::Receiver;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "etymon", about = "Look up word origins with a language model", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    model: ModelArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// OpenAI-compatible chat completions endpoint.
    #[arg(
        long,
        global = true,
        env = "ETYMON_ENDPOINT",
        default_value = "http://127.0.0.1:11434/v1/chat/completions"
    )]
    endpoint: String,
    /// Model name sent with every request.
    #[arg(long, global = true, env = "ETYMON_MODEL", default_value = "llama3.2")]
    model: String,
    /// Bearer token for hosted endpoints.
    #[arg(long, global = true, env = "ETYMON_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the brief etymology shown in the popup.
    Popup {
        word: String,
        /// Rate-limit source identifier.
        #[arg(long, default_value = POPUP_SOURCE)]
        source: String,
    },
    /// Print the full side-panel entry: etymology, usage and synonyms.
    Panel {
        word: String,
        #[arg(long, default_value = POPUP_SOURCE)]
        source: String,
    },
    /// Serve the lookup API over HTTP.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
        /// Reject cross-origin requests.
        #[arg(long)]
        strict_cors: bool,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let Cli {
        json,
        model,
        command,
    } = Cli::parse();
    init_tracing();
    let model = HttpModel::new(HttpModelConfig {
        endpoint: model.endpoint,
        model: model.model,
        api_key: model.api_key,
        ..HttpModelConfig::default()
    })?;
    let service = Arc::new(LookupService::new(model, LookupConfig::default()));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match command {
            Command::Popup { word, source } => {
                let response = service.lookup_popup(&source, &word).await;
                service.shutdown().await;
                print_popup(&word, &response, json)
            }
            Command::Panel { word, source } => {
                let updates = service.subscribe();
                let progress = tokio::spawn(log_progress(updates));
                let response = service.lookup_side_panel(&source, &word, Some("cli")).await;
                service.shutdown().await;
                progress.abort();
                print_panel(&response, json)
            }
            Command::Serve { addr, strict_cors } => {
                let config = WebConfig {
                    addr,
                    permissive_cors: !strict_cors,
                };
                serve(config, service).await?;
                Ok(())
            }
        }
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn log_progress(mut updates: Receiver<LoadingUpdate>) {
    while let Ok(update) = updates.recv().await {
        let states = update.states;
        tracing::debug!(
            word = %update.word,
            etymology = states.etymology,
            usage = states.usage,
            synonyms = states.synonyms,
            "loading states"
        );
    }
}

fn print_popup(word: &str, response: &PopupResponse, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }
    println!("{word}");
    println!("{}", "-".repeat(word.chars().count().max(4)));
    println!("{}", response.etymology.trim());
    if let Some(error) = &response.error {
        eprintln!("({error})");
    }
    Ok(())
}

fn print_panel(response: &SidePanelResponse, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }
    let Some(data) = &response.data else {
        let message = response.message.as_deref().unwrap_or("No data.");
        println!("{message}");
        if let Some(error) = &response.error {
            eprintln!("({error})");
        }
        return Ok(());
    };
    println!("Word: {}", response.selected_text);
    print_section("Etymology", &data.etymology);
    print_section("Usage", &data.usage);
    print_section("Synonyms & Antonyms", &data.synonyms);
    Ok(())
}

fn print_section(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("\n{title}:");
    println!("{trimmed}");
}
