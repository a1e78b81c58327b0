//! Human-readable signal summaries handed to notifiers.

use crate::ProximityCheck;
use chrono::Duration;
use sma_monitor_core::{SignalDetail, SignalEvent};

/// Display timezone offset (KST). Applied to the rendered text only.
pub const DISPLAY_OFFSET_HOURS: i64 = 9;

fn format_price(price: f64) -> String {
    let abs_price = price.abs();
    if abs_price >= 1.0 {
        format!("{:.4}", price)
    } else if abs_price >= 0.0001 {
        format!("{:.8}", price)
    } else {
        format!("{:.10}", price)
    }
}

/// Compact turnover, e.g. `150.00M`.
pub fn format_volume(volume: f64) -> String {
    if volume >= 1_000_000_000.0 {
        format!("{:.2}B", volume / 1_000_000_000.0)
    } else if volume >= 1_000_000.0 {
        format!("{:.2}M", volume / 1_000_000.0)
    } else if volume >= 1_000.0 {
        format!("{:.2}K", volume / 1_000.0)
    } else {
        format!("{:.2}", volume)
    }
}

/// Render `event` as a text block.
///
/// `tolerance_pct` only labels the proximity band in the alignment header.
pub fn format_signal_summary(event: &SignalEvent, tolerance_pct: f64) -> String {
    let display_time = event.timestamp + Duration::hours(DISPLAY_OFFSET_HOURS);
    let time_str = display_time.format("%Y-%m-%d %H:%M:%S KST");

    match &event.detail {
        SignalDetail::Alignment {
            target_period,
            target_average,
            ..
        } => {
            let diff_pct = ProximityCheck::deviation_pct(event.price, *target_average).unwrap_or(0.0);
            format!(
                "🚀🎯 Reverse alignment & near SMA{period} (±{tol}%) 🚀🎯\n\n\
                 Symbol: {symbol}\n\
                 Price: {price}\n\
                 SMA{period}: {target} (diff: {diff:+.2}%)\n\
                 Time: {time}",
                period = target_period,
                tol = tolerance_pct,
                symbol = event.symbol,
                price = format_price(event.price),
                target = format_price(*target_average),
                diff = diff_pct,
                time = time_str,
            )
        }
        SignalDetail::Momentum { horizon, reading } => format!(
            "⚡💥 Strong momentum ⚡💥\n\n\
             Symbol: {symbol}\n\
             {horizon} change: {change:+.2}%\n\
             {horizon} volume: {volume}\n\
             Time: {time}",
            symbol = event.symbol,
            horizon = horizon,
            change = reading.price_change_pct,
            volume = format_volume(reading.trailing_volume),
            time = time_str,
        ),
    }
}
