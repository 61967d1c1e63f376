use anyhow::Context;
use dotenvy::dotenv;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use backend::BackendClient;
use common::config::DashboardConfig;
use common::logger;
use common::notifications::{Notifier, Toast};
use monitor::MonitorEvent;
use monitor::catalog::default_strategies;
use monitor::services::order_service::OrderDesk;
use monitor::services::signal_book::SignalBook;
use monitor::services::signal_fetcher::SignalFetcher;
use monitor::services::strategy_service::StrategyService;

use crate::app::Dashboard;
use crate::render::Palette;
use crate::session::{AppContext, PreferenceStore, Sha256Verifier, Theme};

mod app;
mod commands;
mod market_clock;
mod render;
mod session;

fn spawn_toast_view(
    mut toasts: broadcast::Receiver<Toast>,
    theme: watch::Receiver<Theme>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match toasts.recv().await {
                Ok(toast) => {
                    let palette = Palette::for_theme(*theme.borrow());
                    println!("{}", render::toast(&toast, palette));
                }
                Err(RecvError::Lagged(n)) => warn!("Toast view lagged, {} dropped", n),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn spawn_event_view(mut events: broadcast::Receiver<MonitorEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = render::event(&event) {
                        println!("{line}");
                    } else {
                        debug!("{:?}", event);
                    }
                }
                Err(RecvError::Lagged(n)) => warn!("Event view lagged, {} dropped", n),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// `None` when `interrupt` resolves before `work`.
async fn until_interrupted<T>(work: impl Future<Output = T>, interrupt: impl Future) -> Option<T> {
    tokio::select! {
        out = work => Some(out),
        _ = interrupt => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    let config = DashboardConfig::from_env().context("Invalid configuration")?;
    let backend = Arc::new(BackendClient::new(&config.backend)?);
    info!("Backend at {}", backend.base_url());

    let notifier = Notifier::default();
    let (events_tx, _) = broadcast::channel::<MonitorEvent>(256);
    let fetcher = SignalFetcher::new(
        backend.clone(),
        Arc::new(Mutex::new(SignalBook::new())),
        events_tx,
    );
    let event_view = spawn_event_view(fetcher.subscribe());

    let strategies = StrategyService::new(backend.clone(), fetcher, default_strategies())
        .with_stop_tracking(config.stop_tracking_on_deactivate);
    let poller = strategies.spawn_poller(config.poll_interval);
    let desk = OrderDesk::new(backend, notifier.clone());

    let context = AppContext::open(
        PreferenceStore::new(&config.preferences_path),
        Box::new(Sha256Verifier::new(&config.username, &config.password_sha256)),
        notifier.clone(),
    )
    .context("Failed to open preferences")?;

    let mut dashboard = Dashboard::new(context, strategies, desk);
    let toast_view = spawn_toast_view(notifier.subscribe(), dashboard.theme_receiver());

    println!("{}", render::help(false));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    // A backend call can hang without a timeout; stay interruptible.
                    let work = dashboard.execute_line(&line);
                    let Some(reply) = until_interrupted(work, tokio::signal::ctrl_c()).await else {
                        info!("Interrupted during command");
                        break;
                    };
                    for text in &reply.lines {
                        println!("{text}");
                    }
                    if reply.quit {
                        break;
                    }
                }
                Ok(None) => {
                    info!("End of input");
                    break;
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    poller.shutdown().await;
    toast_view.abort();
    event_view.abort();
    dashboard
        .into_context()
        .close()
        .context("Failed to save preferences")?;
    info!("Shut down cleanly");
    Ok(())
}
