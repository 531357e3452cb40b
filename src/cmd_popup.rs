//! Popup subcommand handlers.

use std::sync::Arc;

use anyhow::Context;

use tradereplay_agent::{PopupController, PopupState, WsChannel};
use tradereplay_config::Config;
use tradereplay_protocols::TradeRecord;

use crate::cli::PopupAction;

/// Bridge URL derived from the `[server]` section.
fn default_url(config: &Config) -> String {
    format!("ws://{}:{}/ws", config.server.host, config.server.port)
}

/// Handle popup subcommands.
pub(crate) async fn handle_popup_command(
    config: &Config,
    url: Option<String>,
    action: PopupAction,
) -> anyhow::Result<()> {
    let url = url.unwrap_or_else(|| default_url(config));
    let (channel, _pushes) = WsChannel::connect(&url, None)
        .await
        .with_context(|| format!("is `tradereplay serve` running at {}?", url))?;
    let popup = PopupController::new(Arc::new(channel), config.agent.request_timeout());

    let result = run_action(&popup, action).await;
    if let Some(status) = popup.status() {
        println!("{}", status);
    }
    result
}

async fn run_action(popup: &PopupController, action: PopupAction) -> anyhow::Result<()> {
    match action {
        PopupAction::Status => {
            let recording = popup.init().await?;
            println!(
                "{}, {}",
                state_label(popup.state()),
                if recording { "recording" } else { "not recording" }
            );
        }
        PopupAction::Toggle => {
            popup.toggle_recording().await?;
        }
        PopupAction::Trades { limit } => {
            let trades = popup.recent_trades(limit).await?;
            if trades.is_empty() {
                println!("No trades recorded yet.");
            }
            for trade in &trades {
                println!("{}", trade_line(trade));
            }
        }
        PopupAction::Capture { tab } => {
            let data_url = popup.capture_screenshot(tab).await?;
            println!("Captured {} bytes", data_url.len());
        }
        PopupAction::Clear => {
            popup.clear_trades().await?;
        }
        PopupAction::Diagnostics => {
            let diag = popup.diagnostics().await?;
            println!("{}", serde_json::to_string_pretty(&diag)?);
        }
    }
    Ok(())
}

fn state_label(state: PopupState) -> &'static str {
    match state {
        PopupState::Connected => "connected",
        PopupState::Disconnected => "disconnected",
        PopupState::ContextInvalidated => "extension reloaded",
        PopupState::Unknown => "unknown",
    }
}

fn trade_line(trade: &TradeRecord) -> String {
    format!(
        "{} {} {:<4} {:<10} {} @ {} [{}]",
        trade.trade_date,
        trade.trade_time,
        trade.direction.as_str(),
        trade.instrument,
        trade.platform,
        trade.entry_price,
        trade.id
    )
}
