use anyhow::Result;
use clap::Parser;
use persona_core::{ai, Config, GeminiClient, OllamaClient, Provider};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "persona")]
#[command(about = "Chat with Owais's portfolio persona over an animated particle field")]
#[command(version)]
struct Cli {
    /// AI provider (gemini, ollama)
    #[arg(short, long)]
    provider: Option<String>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Seconds to wait for a reply (0 waits forever)
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the models available for the provider and exit
    #[arg(long)]
    list_models: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&Config::log_path()?, cli.verbose)?;

    let mut config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not read config, using defaults");
        Config::new()
    });
    if let Some(provider) = cli.provider {
        let provider = Provider::from_str(&provider)
            .ok_or_else(|| anyhow::anyhow!("Unknown provider: {}", provider))?;
        config.provider = Some(provider.as_str().to_string());
    }
    if cli.model.is_some() {
        config.default_model = cli.model;
    }
    if cli.timeout.is_some() {
        config.request_timeout_secs = cli.timeout;
    }

    if cli.list_models {
        return list_models(&config).await;
    }

    let client = ai::client_for(&config)?;
    tracing::info!(provider = config.provider().as_str(), model = %client.model(), "starting");

    let (cols, rows) = crossterm::terminal::size()?;
    let mut app = App::new(client, &config, cols, rows);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    if let Err(err) = &result {
        tracing::error!(error = %err, "exited with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    Ok(())
}

async fn list_models(config: &Config) -> Result<()> {
    let provider = config.provider();
    println!("{} models:", provider.display_name());

    let models = match provider {
        Provider::Gemini => GeminiClient::list_models(),
        Provider::Ollama => {
            let ollama = OllamaClient::new(config.ollama_url(), &config.model());
            match ollama.list_models().await {
                Ok(models) => models,
                Err(err) => {
                    println!("Error connecting to Ollama: {}", err);
                    println!("Make sure Ollama is running: ollama serve");
                    return Ok(());
                }
            }
        }
    };

    if models.is_empty() {
        println!("  (none found)");
    }
    for model in models {
        let marker = if model == config.model() { "*" } else { " " };
        println!(" {} {}", marker, model);
    }
    Ok(())
}
