use backend::TradingBackend;
use chrono::Utc;
use monitor::services::{
    order_service::{OrderDesk, PendingOrder, Submission},
    signal_fetcher::FetchOutcome,
    strategy_service::{StrategyFilter, StrategyService},
};
use tokio::sync::watch;
use tracing::debug;

use crate::commands::{Command, OrderField};
use crate::market_clock::nse_status;
use crate::render::{self, Palette};
use crate::session::{AppContext, Theme};

pub const LOGIN_REQUIRED: &str = "Please log in first: login <user> <password>";

#[derive(Debug, Default)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Reply {
    fn text(lines: Vec<String>) -> Self {
        Self { lines, quit: false }
    }
}

/// Single owner of the view state: session, strategy list, order desk and
/// the order waiting for confirmation.
pub struct Dashboard<B: TradingBackend> {
    context: AppContext,
    strategies: StrategyService<B>,
    desk: OrderDesk<B>,
    pending: Option<PendingOrder>,
    theme_tx: watch::Sender<Theme>,
}

impl<B: TradingBackend> Dashboard<B> {
    pub fn new(context: AppContext, strategies: StrategyService<B>, desk: OrderDesk<B>) -> Self {
        let (theme_tx, _) = watch::channel(context.preferences().theme);
        Self {
            context,
            strategies,
            desk,
            pending: None,
            theme_tx,
        }
    }

    pub fn theme_receiver(&self) -> watch::Receiver<Theme> {
        self.theme_tx.subscribe()
    }

    fn palette(&self) -> Palette {
        Palette::for_theme(self.context.preferences().theme)
    }

    pub fn into_context(self) -> AppContext {
        self.context
    }

    pub async fn execute_line(&mut self, line: &str) -> Reply {
        if line.trim().is_empty() {
            return Reply::default();
        }
        match line.parse::<Command>() {
            Ok(command) => self.execute(command).await,
            Err(e) => Reply::text(vec![format!("error: {e}")]),
        }
    }

    pub async fn execute(&mut self, command: Command) -> Reply {
        if command == Command::Quit {
            return Reply {
                lines: Vec::new(),
                quit: true,
            };
        }
        if command.requires_session() && self.context.session().is_none() {
            return Reply::text(vec![LOGIN_REQUIRED.to_string()]);
        }

        debug!("Executing {:?}", command);
        let mut lines = match self.run(command).await {
            Ok(lines) => lines,
            Err(e) => vec![format!("error: {e}")],
        };
        if let Some(banner) = self.strategies.banner() {
            lines.push(banner.to_string());
            self.strategies.clear_banner();
        }
        Reply::text(lines)
    }

    async fn run(&mut self, command: Command) -> anyhow::Result<Vec<String>> {
        let palette = self.palette();
        let lines = match command {
            Command::Help => vec![render::help(self.context.preferences().sidebar_collapsed)],
            Command::Login { username, password } => {
                let session = self.context.login(&username, &password)?;
                vec![format!("Welcome, {}.", session.username)]
            }
            Command::Logout => {
                self.pending = None;
                self.context.logout();
                vec!["Logged out.".to_string()]
            }
            Command::Passwd {
                current,
                new,
                confirm,
            } => {
                self.context.change_password(&current, &new, &confirm)?;
                Vec::new()
            }
            Command::Theme => {
                let theme = self.context.toggle_theme()?;
                self.theme_tx.send_replace(theme);
                vec![format!("Theme: {theme:?}")]
            }
            Command::Sidebar => {
                let collapsed = self.context.toggle_sidebar()?;
                let state = if collapsed { "collapsed" } else { "expanded" };
                vec![format!("Sidebar {state}.")]
            }
            Command::Status => vec![
                render::status(
                    nse_status(Utc::now()),
                    self.context.session(),
                    self.strategies.filter(StrategyFilter::Active).len(),
                    &self.strategies.stats(),
                ),
                format!("Order confirmation: {:?}", self.desk.policy()),
            ],
            Command::Strategies(filter) => {
                let rows = self
                    .strategies
                    .filter(filter)
                    .into_iter()
                    .map(|s| (s, self.strategies.last_updated(&s.id).ok().flatten()))
                    .collect::<Vec<_>>();
                vec![render::strategy_table(&rows, palette)]
            }
            Command::Activate(id) => {
                self.strategies.activate(&id).await?;
                let name = self.strategies.get(&id)?.name.clone();
                vec![
                    format!("{name} activated."),
                    render::signal_lines(&self.strategies.signals(&id)?, palette),
                ]
            }
            Command::Deactivate(id) => {
                self.strategies.deactivate(&id).await?;
                vec![format!("{} deactivated.", self.strategies.get(&id)?.name)]
            }
            Command::Auto(id) => {
                let mode = self.strategies.toggle_auto(&id)?;
                vec![format!("{}: {mode:?} execution.", self.strategies.get(&id)?.name)]
            }
            Command::Signals(id) => {
                vec![render::signal_lines(&self.strategies.signals(&id)?, palette)]
            }
            Command::Refresh(id) => match self.strategies.refresh(&id).await? {
                FetchOutcome::Applied(_) => {
                    vec![render::signal_lines(&self.strategies.signals(&id)?, palette)]
                }
                FetchOutcome::Stale => vec!["Response superseded by a newer one.".to_string()],
                FetchOutcome::Failed(e) => vec![format!("error: {e}")],
            },
            Command::OrderMode(policy) => {
                self.desk.set_policy(policy);
                vec![format!("Order confirmation: {policy:?}")]
            }
            Command::OrderSet(field) => self.set_field(field),
            Command::OrderShow => vec![render::order_form(self.desk.form(), self.desk.policy())],
            Command::OrderPlace => self.place().await?,
            Command::Confirm => match self.pending.take() {
                Some(pending) => {
                    self.desk.confirm(pending).await?;
                    Vec::new()
                }
                None => vec!["Nothing to confirm.".to_string()],
            },
            Command::Cancel => match self.pending.take() {
                Some(_) => vec!["Order cancelled.".to_string()],
                None => vec!["Nothing to cancel.".to_string()],
            },
            Command::Quit => Vec::new(),
        };
        Ok(lines)
    }

    fn set_field(&mut self, field: OrderField) -> Vec<String> {
        let form = self.desk.form_mut();
        match field {
            OrderField::Instrument(v) => form.set_instrument(&v),
            OrderField::Quantity(v) => form.set_quantity(v),
            OrderField::Price(v) => {
                if !form.set_price(v) {
                    return vec!["Price is fixed for MARKET orders.".to_string()];
                }
            }
            OrderField::Exchange(v) => form.set_exchange(v),
            OrderField::Type(v) => form.set_order_type(v),
            OrderField::Action(v) => form.set_action(v),
        }
        vec![render::order_form(self.desk.form(), self.desk.policy())]
    }

    async fn place(&mut self) -> anyhow::Result<Vec<String>> {
        if let Some(ref pending) = self.pending {
            return Ok(vec![
                pending.prompt(),
                "An order is already awaiting confirmation: confirm or cancel.".to_string(),
            ]);
        }
        match self.desk.submit().await? {
            Submission::AwaitingConfirmation(pending) => {
                let prompt = format!("{} [confirm/cancel]", pending.prompt());
                self.pending = Some(pending);
                Ok(vec![prompt])
            }
            Submission::Placed(_) => Ok(Vec::new()),
        }
    }
}
