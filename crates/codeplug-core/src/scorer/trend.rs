//! Score trend computation and the text chart.

use std::fmt::Write as _;

use crate::models::{ScoreRecord, Trend};

pub const TREND_POINTS: usize = 8;
pub const CHART_POINTS: usize = 12;
pub const CHART_WIDTH: usize = 40;

const SLOPE_EPSILON: f64 = 1.0;

pub struct TrendTracker;

impl TrendTracker {
    /// Least-squares slope of score against index over the most recent points.
    pub fn slope(scores: &[u32]) -> f64 {
        let n = scores.len();
        if n < 2 {
            return 0.0;
        }
        let mean_x = (n - 1) as f64 / 2.0;
        let mean_y = scores.iter().map(|s| f64::from(*s)).sum::<f64>() / n as f64;
        let (mut num, mut den) = (0.0, 0.0);
        for (i, s) in scores.iter().enumerate() {
            let dx = i as f64 - mean_x;
            num += dx * (f64::from(*s) - mean_y);
            den += dx * dx;
        }
        num / den
    }

    /// Trend over the last eight records, oldest first.
    pub fn compute_trend(history: &[ScoreRecord]) -> Trend {
        let recent = &history[history.len().saturating_sub(TREND_POINTS)..];
        let scores: Vec<u32> = recent.iter().map(|r| r.score).collect();
        if scores.len() < 2 {
            return Trend::Stable;
        }
        let slope = Self::slope(&scores);
        if slope > SLOPE_EPSILON {
            Trend::Improving
        } else if slope < -SLOPE_EPSILON {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    /// One bar per record for the last twelve records, most recent last.
    pub fn render_trend_chart(history: &[ScoreRecord]) -> String {
        if history.is_empty() {
            return "No score history available.".to_string();
        }
        let recent = &history[history.len().saturating_sub(CHART_POINTS)..];
        let mut out = String::new();
        for record in recent {
            let filled = ((f64::from(record.score.min(100)) / 100.0) * CHART_WIDTH as f64).round() as usize;
            let _ = writeln!(
                out,
                "{} │{}{}│ {}",
                record.created_at.format("%Y-%m-%d"),
                "█".repeat(filled),
                "░".repeat(CHART_WIDTH - filled),
                record.score
            );
        }
        out.pop();
        out
    }
}
