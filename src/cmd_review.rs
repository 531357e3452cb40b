//! Review subcommand handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use tradereplay_backend::review::{Attachment, DashboardStats, ManualTradeForm, TimelinePoller};
use tradereplay_backend::TradeReplay;
use tradereplay_config::Config;

use crate::cli::ReviewAction;

/// Handle review subcommands.
pub(crate) async fn handle_review_command(config: &Config, action: ReviewAction) -> anyhow::Result<()> {
    let client = crate::backend_client(config).await?;
    if client.session().is_none() {
        anyhow::bail!("not signed in; run `tradereplay login <email>` first");
    }

    match action {
        ReviewAction::Stats => {
            let trades = client.fetch_trades().await?;
            print_stats(&DashboardStats::from_trades(&trades));
        }
        ReviewAction::Timeline { watch: false } => {
            let poller = TimelinePoller::new(Arc::new(client), config.backend.poll_interval());
            print_timeline(&poller.fetch().await?);
        }
        ReviewAction::Timeline { watch: true } => {
            let poller = TimelinePoller::new(Arc::new(client), config.backend.poll_interval());
            watch_timeline(poller).await?;
        }
        ReviewAction::Add {
            instrument,
            direction,
            entry,
            exit,
            date,
            time,
            notes,
            attachment,
        } => {
            let attachment = match attachment {
                Some(path) => Some(read_attachment(&path).await?),
                None => None,
            };
            let form = ManualTradeForm {
                instrument,
                direction: Some(direction),
                entry_price: entry,
                exit_price: exit,
                trade_date: date,
                trade_time: time,
                notes,
                attachment,
            };
            let created = form.submit(&client).await?;
            info!("Created trade {}", created.id);
            println!("Added {}", trade_line(&created));
        }
    }
    Ok(())
}

async fn watch_timeline(poller: TimelinePoller) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let (mut rx, task) = poller.spawn(cancel.clone());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                print_timeline(&rx.borrow_and_update());
                println!();
            }
        }
    }

    cancel.cancel();
    let _ = task.await;
    Ok(())
}

async fn read_attachment(path: &Path) -> anyhow::Result<Attachment> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("attachment needs a UTF-8 file name")?
        .to_string();
    Ok(Attachment {
        content_type: content_type_for(&filename).to_string(),
        filename,
        bytes,
    })
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn print_stats(stats: &DashboardStats) {
    println!("Trades:          {}", stats.total_trades);
    println!("Win rate:        {:.1}%", stats.win_rate);
    println!("Total points:    {:.2}", stats.total_points);
    println!("With recordings: {}", stats.with_recordings);
}

fn print_timeline(trades: &[TradeReplay]) {
    if trades.is_empty() {
        println!("No trades yet.");
    }
    for trade in trades {
        println!("{}", trade_line(trade));
    }
}

fn trade_line(trade: &TradeReplay) -> String {
    let points = trade
        .points()
        .map(|p| format!("{:+.2}", p))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} {} {:<4} {:<10} {:>8}{}",
        trade.trade_date,
        trade.trade_time,
        trade.direction.as_str(),
        trade.instrument,
        points,
        if trade.has_recording() { "  [rec]" } else { "" }
    )
}
