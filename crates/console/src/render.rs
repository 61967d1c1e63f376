//! Plain-text views. Everything returns a `String` so the main loop decides
//! where it goes.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use common::{
    models::{ExecutionMode, Signal, SignalSide, Strategy},
    notifications::{Toast, ToastVariant},
};
use monitor::{
    MonitorEvent,
    services::{
        order_service::{ConfirmationPolicy, OrderForm},
        signal_book::FetchStats,
    },
};

use crate::market_clock::{MarketStatus, ist};
use crate::session::{Session, Theme};

pub const NO_SIGNALS: &str =
    "No signals available. Activate the strategy to start receiving signals.";

const RESET: &str = "\x1b[0m";

/// ANSI styling per theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub positive: &'static str,
    pub negative: &'static str,
    pub muted: &'static str,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                positive: "\x1b[92m",
                negative: "\x1b[91m",
                muted: "\x1b[90m",
            },
            Theme::Light => Self {
                positive: "\x1b[32m",
                negative: "\x1b[31m",
                muted: "\x1b[2m",
            },
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        format!("{color}{text}{RESET}")
    }
}

pub fn help(compact: bool) -> String {
    if compact {
        return "help | login | logout | passwd | theme | sidebar | status | strategies | \
                activate | deactivate | auto | signals | refresh | order | confirm | cancel | quit"
            .to_string();
    }
    [
        "  login <user> <password>       start a session",
        "  logout                        end the session",
        "  passwd <current> <new> <new>  change the password",
        "  theme | sidebar               toggle display preferences",
        "  status                        market, session and polling status",
        "  strategies [all|active|auto]  list strategies",
        "  activate <id> | deactivate <id>",
        "  auto <id>                     toggle manual/auto execution",
        "  signals <id> | refresh <id>   show or re-fetch signals",
        "  order mode <manual|auto>      order confirmation policy",
        "  order set <field> <value>     instrument quantity price exchange type action",
        "  order show | order place      review or submit the order form",
        "  confirm | cancel              answer a pending order prompt",
        "  quit",
    ]
    .join("\n")
}

/// One row per strategy with its last refresh time, if any.
pub fn strategy_table(rows: &[(&Strategy, Option<DateTime<Utc>>)], palette: Palette) -> String {
    if rows.is_empty() {
        return "No strategies match.".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4}{:<30}{:>9}  {:<11}{:<8}{}",
        "ID", "NAME", "ACCURACY", "STATUS", "MODE", "LAST UPDATED"
    );
    for (s, updated) in rows {
        let status = if s.is_active {
            palette.paint(palette.positive, "Monitoring")
        } else {
            palette.paint(palette.muted, "Paused    ")
        };
        let mode = match s.execution_mode() {
            ExecutionMode::Auto => "Auto",
            ExecutionMode::Manual => "Manual",
        };
        let updated = updated.map(clock_time).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<4}{:<30}{:>8}%  {} {:<8}{}",
            s.id, s.name, s.accuracy, status, mode, updated
        );
    }
    out.trim_end().to_string()
}

/// 12-hour IST wall clock.
fn clock_time(at: DateTime<Utc>) -> String {
    match ist() {
        Some(offset) => at.with_timezone(&offset).format("%I:%M:%S %p").to_string(),
        None => at.format("%H:%M:%S UTC").to_string(),
    }
}

pub fn signal_lines(signals: &[Signal], palette: Palette) -> String {
    if signals.is_empty() {
        return NO_SIGNALS.to_string();
    }
    signals
        .iter()
        .map(|s| {
            let side = match s.side {
                SignalSide::Buy => palette.paint(palette.positive, "BUY "),
                SignalSide::Sell => palette.paint(palette.negative, "SELL"),
            };
            format!(
                "{side}  {:<12} ₹{:>10.2}  {}",
                s.instrument,
                s.price,
                clock_time(s.timestamp)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn order_form(form: &OrderForm, policy: ConfirmationPolicy) -> String {
    let instrument = if form.instrument().is_empty() {
        "-"
    } else {
        form.instrument()
    };
    let price = if form.price_editable() {
        format!("{:.2}", form.price())
    } else {
        "market".to_string()
    };
    format!(
        "{} {} x{} @ {} on {} [{}], confirmation: {:?}",
        form.action(),
        instrument,
        form.quantity(),
        price,
        form.exchange(),
        form.order_type(),
        policy
    )
}

pub fn status(
    market: MarketStatus,
    session: Option<&Session>,
    active: usize,
    stats: &FetchStats,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "NSE: {market}");
    match session {
        Some(s) => {
            let _ = writeln!(out, "User: {} (since {})", s.username, s.started_at.format("%H:%M:%S UTC"));
        }
        None => {
            let _ = writeln!(out, "User: not logged in");
        }
    }
    let _ = writeln!(out, "Monitoring: {active} strategies");
    let last = stats
        .last_refresh
        .map(|t| t.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    let _ = write!(out, "Last refresh: {last}, fetch errors: {}", stats.fetch_errors);
    if let Some(ref e) = stats.last_error {
        let _ = write!(out, " (last: {e})");
    }
    out
}

pub fn toast(toast: &Toast, palette: Palette) -> String {
    let title = match toast.variant {
        ToastVariant::Default => palette.paint(palette.positive, &toast.title),
        ToastVariant::Destructive => palette.paint(palette.negative, &toast.title),
    };
    match toast.description {
        Some(ref d) => format!("[{title}] {d}"),
        None => format!("[{title}]"),
    }
}

/// Sweep bookkeeping stays in the log.
pub fn event(event: &MonitorEvent) -> Option<String> {
    match event {
        MonitorEvent::SignalsUpdated { strategy_id, count } => {
            Some(format!("strategy {strategy_id}: {count} signals"))
        }
        MonitorEvent::FetchFailed { strategy_id, error } => {
            Some(format!("strategy {strategy_id}: fetch failed ({error})"))
        }
        MonitorEvent::StaleDiscarded { .. } | MonitorEvent::SweepCompleted { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::models::OrderType;

    fn plain() -> Palette {
        Palette {
            positive: "",
            negative: "",
            muted: "",
        }
    }

    #[test]
    fn empty_signal_list_shows_hint() {
        assert_eq!(signal_lines(&[], plain()), NO_SIGNALS);
    }

    #[test]
    fn signal_line_uses_ist_time_and_two_decimals() {
        let signal = Signal {
            id: "s1".into(),
            strategy_id: "1".into(),
            side: SignalSide::Sell,
            instrument: "RELIANCE".into(),
            price: 2950.5,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 4, 0, 0).unwrap(),
        };
        let line = signal_lines(&[signal], plain());
        assert!(line.starts_with("SELL"));
        assert!(line.contains("₹   2950.50"));
        assert!(line.ends_with("09:30:00 AM"));
    }

    #[test]
    fn strategy_table_reports_mode_and_last_update() {
        let mut live = Strategy::new("1", "Supertrend", "trend", 72);
        live.is_active = true;
        live.is_auto = true;
        let idle = Strategy::new("3", "SMA 50/200 Crossover", "crossover", 80);
        let updated = Utc.with_ymd_and_hms(2026, 3, 2, 9, 45, 5).unwrap();

        let table = strategy_table(&[(&live, Some(updated)), (&idle, None)], plain());
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].ends_with("LAST UPDATED"));
        assert!(lines[1].contains("Supertrend"));
        assert!(lines[1].contains("72%"));
        assert!(lines[1].contains("Monitoring"));
        assert!(lines[1].contains("Auto"));
        assert!(lines[1].ends_with("03:15:05 PM"));
        assert!(lines[2].contains("Paused"));
        assert!(lines[2].contains("Manual"));
        assert!(lines[2].ends_with('-'));
    }

    #[test]
    fn market_form_hides_price() {
        let mut form = OrderForm::default();
        form.set_instrument("INFY");
        assert_eq!(
            order_form(&form, ConfirmationPolicy::Manual),
            "BUY INFY x1 @ market on NSE [MARKET], confirmation: Manual"
        );
        form.set_order_type(OrderType::Limit);
        form.set_price(1520.0);
        assert!(order_form(&form, ConfirmationPolicy::Auto).contains("@ 1520.00"));
    }

    #[test]
    fn toast_line_includes_description() {
        let t = Toast::failure("Failed to Place Order", "try again");
        assert_eq!(toast(&t, plain()), "[Failed to Place Order\x1b[0m] try again");
    }

    #[test]
    fn sweep_bookkeeping_is_not_rendered() {
        assert!(event(&MonitorEvent::SweepCompleted { strategies: 2 }).is_none());
        assert_eq!(
            event(&MonitorEvent::SignalsUpdated {
                strategy_id: "1".into(),
                count: 3
            })
            .as_deref(),
            Some("strategy 1: 3 signals")
        );
    }
}
