//! Weather assistant binary entry point.

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use weather_agent::assistant::{build_runner, DEMO_TURNS};
use weather_agent::cli::{is_exit_command, Cli, Commands};
use weather_agent::config::AppConfig;
use weather_agent::error::AgentError;
use weather_agent::provider::create_provider;
use weather_agent::runner::Runner;
use weather_agent::session::{InMemorySessionService, SessionService};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AgentError> {
    let mut config = AppConfig::load()?;
    cli.overrides.apply(&mut config);
    config.validate()?;

    let provider = create_provider(&config)?;
    let sessions: Arc<dyn SessionService> = Arc::new(InMemorySessionService::new());
    let runner = build_runner(&config, provider, Arc::clone(&sessions)).await?;

    match cli.command {
        Commands::Demo => {
            for query in DEMO_TURNS {
                ask(&runner, &config, query).await;
            }
            print_state(&sessions, &config).await?;
        }
        Commands::Ask(args) => ask(&runner, &config, &args.text()).await,
        Commands::Chat => chat(&runner, &config).await?,
    }
    Ok(())
}

async fn ask(runner: &Runner, config: &AppConfig, query: &str) {
    println!("\n>>> User Query: {query}");
    let answer = runner
        .call_agent(&config.user_id, &config.session_id, query)
        .await;
    println!("<<< Agent Response: {answer}");
}

async fn chat(runner: &Runner, config: &AppConfig) -> Result<(), AgentError> {
    let mut stdout = tokio::io::stdout();
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next().await.transpose()? else {
            break;
        };
        if is_exit_command(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let answer = runner
            .call_agent(&config.user_id, &config.session_id, line.trim())
            .await;
        println!("Agent: {answer}");
    }
    Ok(())
}

async fn print_state(sessions: &Arc<dyn SessionService>, config: &AppConfig) -> Result<(), AgentError> {
    let Some(session) = sessions
        .get_session(&config.app_name, &config.user_id, &config.session_id)
        .await?
    else {
        return Ok(());
    };
    println!("\n--- Final session state ---");
    for (key, value) in session.state.as_map() {
        println!("{key}: {value}");
    }
    Ok(())
}
