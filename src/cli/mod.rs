//! Command-line interface for the weather assistant.

use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::tools::TemperatureUnit;

/// Weather assistant CLI
#[derive(Parser, Debug)]
#[command(name = "weather-agent", version, about = "Multi-agent weather assistant")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags layered on top of the file and environment configuration.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct Overrides {
    /// Gemini model name (e.g., gemini-2.0-flash)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// User id owning the session
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Session id to create or resume
    #[arg(long, global = true)]
    pub session: Option<String>,

    /// Temperature unit stored in a newly created session (Celsius, Fahrenheit)
    #[arg(long, global = true)]
    pub unit: Option<TemperatureUnit>,
}

impl Overrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(user) = &self.user {
            config.user_id = user.clone();
        }
        if let Some(session) = &self.session {
            config.session_id = session.clone();
        }
        if let Some(unit) = self.unit {
            config.temperature_unit = unit;
        }
    }
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the scripted demo conversation
    Demo,
    /// Ask a single question
    Ask(AskArgs),
    /// Interactive chat on stdin (type `exit` or `quit` to stop)
    Chat,
}

/// Arguments for the `ask` subcommand.
#[derive(Args, Debug, PartialEq)]
pub struct AskArgs {
    /// The message to send
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

impl AskArgs {
    pub fn text(&self) -> String {
        self.query.join(" ")
    }
}

/// Whether a chat line ends the session.
pub fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ask_with_global_flags() {
        let cli = Cli::try_parse_from([
            "weather-agent",
            "ask",
            "--unit",
            "fahrenheit",
            "weather",
            "in",
            "Paris",
        ])
        .unwrap();

        assert_eq!(cli.overrides.unit, Some(TemperatureUnit::Fahrenheit));
        match cli.command {
            Commands::Ask(args) => assert_eq!(args.text(), "weather in Paris"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn overrides_apply_on_top_of_config() {
        let cli = Cli::try_parse_from([
            "weather-agent",
            "--model",
            "gemini-2.0-flash",
            "--session",
            "s-42",
            "demo",
        ])
        .unwrap();
        assert_eq!(cli.command, Commands::Demo);

        let mut config = AppConfig::default();
        cli.overrides.apply(&mut config);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.session_id, "s-42");
        assert_eq!(config.user_id, crate::config::DEFAULT_USER_ID);
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(Cli::try_parse_from(["weather-agent", "--unit", "kelvin", "chat"]).is_err());
    }

    #[test]
    fn ask_requires_a_query() {
        assert!(Cli::try_parse_from(["weather-agent", "ask"]).is_err());
    }

    #[test]
    fn exit_words() {
        assert!(is_exit_command(" Quit "));
        assert!(is_exit_command("exit"));
        assert!(!is_exit_command("exit now"));
    }
}
