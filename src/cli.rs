//! CLI definitions for TradeReplay.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tradereplay_protocols::Direction;

/// TradeReplay CLI.
#[derive(Parser)]
#[command(name = "tradereplay")]
#[command(about = "Capture trades from trading platforms and review them later")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.tradereplay/config.toml)
    #[arg(short, long, global = true, env = "TRADEREPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the background coordinator and its bridge (default)
    Serve {
        /// Bridge host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bridge port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Popup actions against a running coordinator
    Popup {
        /// Bridge WebSocket URL (default: from config)
        #[arg(long)]
        url: Option<String>,

        #[command(subcommand)]
        action: PopupAction,
    },

    /// Review trades stored in the backend
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },

    /// Sign in to the backend
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, env = "TRADEREPLAY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,
}

#[derive(Subcommand)]
pub(crate) enum PopupAction {
    /// Show connection and recording state
    Status,

    /// Start or stop recording
    Toggle,

    /// List recent trades, newest first
    Trades {
        /// Number of trades to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Capture a screenshot of a tab
    Capture {
        /// Tab to capture
        #[arg(long)]
        tab: Option<i64>,
    },

    /// Delete all recorded trades
    Clear,

    /// Coordinator diagnostics
    Diagnostics,
}

#[derive(Subcommand)]
pub(crate) enum ReviewAction {
    /// Summary statistics over all trades
    Stats,

    /// List trades, newest first
    Timeline {
        /// Keep refreshing until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Add a trade by hand
    Add {
        /// Instrument symbol
        #[arg(long)]
        instrument: String,

        /// BUY or SELL
        #[arg(long, value_parser = parse_direction)]
        direction: Direction,

        #[arg(long)]
        entry: String,

        #[arg(long)]
        exit: String,

        /// Trade date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Trade time (HH:MM or HH:MM:SS)
        #[arg(long)]
        time: String,

        #[arg(long, default_value = "")]
        notes: String,

        /// Recording to upload with the trade
        #[arg(long)]
        attachment: Option<PathBuf>,
    },
}

fn parse_direction(raw: &str) -> Result<Direction, String> {
    match raw.to_ascii_uppercase().as_str() {
        "BUY" | "LONG" => Ok(Direction::Buy),
        "SELL" | "SHORT" => Ok(Direction::Sell),
        _ => Err(format!("expected BUY or SELL, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!(parse_direction("buy"), Ok(Direction::Buy));
        assert_eq!(parse_direction("Short"), Ok(Direction::Sell));
        assert!(parse_direction("flat").is_err());
    }

    #[test]
    fn test_popup_trades_default_limit() {
        let cli = Cli::parse_from(["tradereplay", "popup", "trades"]);
        match cli.command {
            Some(Commands::Popup { url, action: PopupAction::Trades { limit } }) => {
                assert!(url.is_none());
                assert_eq!(limit, 10);
            }
            _ => panic!("expected popup trades"),
        }
    }

    #[test]
    fn test_review_add_parses() {
        let cli = Cli::parse_from([
            "tradereplay", "review", "add", "--instrument", "es", "--direction", "long",
            "--entry", "5000", "--exit", "5010", "--date", "2024-03-01", "--time", "09:30",
        ]);
        match cli.command {
            Some(Commands::Review { action: ReviewAction::Add { direction, notes, attachment, .. } }) => {
                assert_eq!(direction, Direction::Buy);
                assert!(notes.is_empty());
                assert!(attachment.is_none());
            }
            _ => panic!("expected review add"),
        }
    }
}
