//! chatwire - interactive chat with a completion service

mod repl;

use anyhow::{Context, Result};
use chatwire_core::config::load_from_path;
use chatwire_core::{ChatClient, ClientConfig, Conversation, TlsTransport};
use clap::Parser;
use repl::{echo, Command, HELP, OUTPUT_PREFIX, PROMPT};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Chat with a completion service from the terminal
#[derive(Parser, Debug)]
#[command(name = "chatwire", version, about)]
struct Args {
    /// API key for the service
    #[arg(env = "XAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Load settings from a YAML or JSON file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model to talk to
    #[arg(short, long)]
    model: Option<String>,

    /// Service root, e.g. https://api.x.ai
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Wait for whole answers instead of streaming them
    #[arg(long)]
    no_stream: bool,
}

impl Args {
    fn resolve_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = load_from_path(path)
                    .with_context(|| format!("failed to load config from {}", path.display()))?;
                if let Some(key) = &self.api_key {
                    config.api_key = key.as_str().into();
                }
                config
            }
            None => {
                let key = self
                    .api_key
                    .as_deref()
                    .context("no API key given; pass one or set XAI_API_KEY")?;
                ClientConfig::new(key)
            }
        };

        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        Ok(config)
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = args.resolve_config()?;
    let model = config.model.clone();
    info!("Using model {} with key {}", model, config.api_key.partial_redact());

    let mut client = ChatClient::connect(config)
        .await
        .context("failed to connect")?;

    run(&mut client, &model, !args.no_stream).await?;
    println!("end");
    Ok(())
}

async fn run(client: &mut ChatClient<TlsTransport>, model: &str, stream: bool) -> Result<()> {
    let mut log = Conversation::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", PROMPT);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        debug!("Command {:?}", command);

        let result = match command {
            Command::Quit => break,
            Command::Help => {
                println!("{}", HELP);
                Ok(())
            }
            Command::Unknown(name) => {
                println!("unknown command {}; \\h for help", name);
                Ok(())
            }
            Command::ListModels => client.list_models().await.map(print_ids),
            Command::ListLanguageModels => client.list_language_models().await.map(print_ids),
            Command::Prompt(text) => {
                log.push_user(text);
                if stream {
                    print!("{}", OUTPUT_PREFIX);
                    client
                        .chat_streaming(&mut log, model, |piece| {
                            if let Err(e) = echo(&mut std::io::stdout(), piece) {
                                debug!("Could not echo streamed text: {}", e);
                            }
                        })
                        .await
                        .map(|_| println!())
                } else {
                    client
                        .chat(&mut log, model)
                        .await
                        .map(|answer| println!("{}{}", OUTPUT_PREFIX, answer))
                }
            }
        };

        if let Err(err) = result {
            if err.is_transport() {
                return Err(err).context("connection lost");
            }
            eprintln!("error: {}", err);
        }
    }

    Ok(())
}

fn print_ids(ids: Vec<String>) {
    for id in ids {
        println!("{}{}", OUTPUT_PREFIX, id);
    }
}
