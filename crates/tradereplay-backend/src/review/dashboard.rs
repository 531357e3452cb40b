//! Aggregate statistics for the dashboard.

use serde::Serialize;

use crate::model::TradeReplay;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_trades: usize,
    /// Percentage of winning trades among those with a known direction.
    pub win_rate: f64,
    /// Sum of points (pips) over trades with a known direction.
    pub total_points: f64,
    pub with_recordings: usize,
}

impl DashboardStats {
    pub fn from_trades(trades: &[TradeReplay]) -> Self {
        let moves: Vec<f64> = trades.iter().filter_map(TradeReplay::points).collect();
        let wins = moves.iter().filter(|p| **p > 0.0).count();
        let win_rate = if moves.is_empty() {
            0.0
        } else {
            wins as f64 / moves.len() as f64 * 100.0
        };

        Self {
            total_trades: trades.len(),
            win_rate,
            total_points: moves.iter().sum(),
            with_recordings: trades.iter().filter(|t| t.has_recording()).count(),
        }
    }
}
