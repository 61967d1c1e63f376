use std::str::FromStr;

use common::{
    error::ValidationError,
    models::{Exchange, OrderAction, OrderType},
};
use monitor::services::{order_service::ConfirmationPolicy, strategy_service::StrategyFilter};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderField {
    Instrument(String),
    Quantity(u32),
    Price(f64),
    Exchange(Exchange),
    Type(OrderType),
    Action(OrderAction),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Login { username: String, password: String },
    Logout,
    Passwd { current: String, new: String, confirm: String },
    Theme,
    Sidebar,
    Status,
    Strategies(StrategyFilter),
    Activate(String),
    Deactivate(String),
    Auto(String),
    Signals(String),
    Refresh(String),
    OrderMode(ConfirmationPolicy),
    OrderSet(OrderField),
    OrderShow,
    OrderPlace,
    Confirm,
    Cancel,
    Quit,
}

impl Command {
    pub fn requires_session(&self) -> bool {
        !matches!(self, Command::Help | Command::Login { .. } | Command::Quit)
    }
}

fn one_id(args: &[&str], usage: &'static str) -> Result<String, CommandError> {
    match args {
        [id] => Ok(id.to_string()),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn no_args(args: &[&str], command: Command, usage: &'static str) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::Usage(usage))
    }
}

fn parse_order(args: &[&str]) -> Result<Command, CommandError> {
    const USAGE: &str = "order <mode manual|auto | set <field> <value> | show | place>";
    match args {
        ["mode", mode] => match mode.to_lowercase().as_str() {
            "manual" => Ok(Command::OrderMode(ConfirmationPolicy::Manual)),
            "auto" => Ok(Command::OrderMode(ConfirmationPolicy::Auto)),
            _ => Err(CommandError::InvalidValue {
                field: "mode",
                value: mode.to_string(),
            }),
        },
        ["set", field, value @ ..] if !value.is_empty() => {
            parse_field(field, &value.join(" ")).map(Command::OrderSet)
        }
        ["show"] => Ok(Command::OrderShow),
        ["place"] => Ok(Command::OrderPlace),
        _ => Err(CommandError::Usage(USAGE)),
    }
}

fn parse_field(field: &str, value: &str) -> Result<OrderField, CommandError> {
    let field = match field.to_lowercase().as_str() {
        "instrument" => OrderField::Instrument(value.to_string()),
        "quantity" | "qty" => {
            OrderField::Quantity(value.parse().map_err(|_| CommandError::InvalidValue {
                field: "quantity",
                value: value.to_string(),
            })?)
        }
        "price" => OrderField::Price(value.parse().map_err(|_| CommandError::InvalidValue {
            field: "price",
            value: value.to_string(),
        })?),
        "exchange" => OrderField::Exchange(value.parse()?),
        "type" => OrderField::Type(value.parse()?),
        "action" => OrderField::Action(value.parse()?),
        other => {
            return Err(CommandError::InvalidValue {
                field: "order field",
                value: other.to_string(),
            });
        }
    };
    Ok(field)
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((head, args)) = words.split_first() else {
            return Err(CommandError::Usage("<command> [args...] (try `help`)"));
        };

        match head.to_lowercase().as_str() {
            "help" | "?" => Ok(Command::Help),
            "login" => match args {
                [username, password] => Ok(Command::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                }),
                _ => Err(CommandError::Usage("login <user> <password>")),
            },
            "logout" => no_args(args, Command::Logout, "logout"),
            "passwd" => match args {
                [current, new, confirm] => Ok(Command::Passwd {
                    current: current.to_string(),
                    new: new.to_string(),
                    confirm: confirm.to_string(),
                }),
                _ => Err(CommandError::Usage("passwd <current> <new> <confirm>")),
            },
            "theme" => no_args(args, Command::Theme, "theme"),
            "sidebar" => no_args(args, Command::Sidebar, "sidebar"),
            "status" => no_args(args, Command::Status, "status"),
            "strategies" => match args {
                [] | ["all"] => Ok(Command::Strategies(StrategyFilter::All)),
                ["active"] => Ok(Command::Strategies(StrategyFilter::Active)),
                ["auto"] => Ok(Command::Strategies(StrategyFilter::Auto)),
                _ => Err(CommandError::Usage("strategies [all|active|auto]")),
            },
            "activate" => one_id(args, "activate <id>").map(Command::Activate),
            "deactivate" => one_id(args, "deactivate <id>").map(Command::Deactivate),
            "auto" => one_id(args, "auto <id>").map(Command::Auto),
            "signals" => one_id(args, "signals <id>").map(Command::Signals),
            "refresh" => one_id(args, "refresh <id>").map(Command::Refresh),
            "order" => parse_order(args),
            "confirm" | "y" => no_args(args, Command::Confirm, "confirm"),
            "cancel" | "n" => no_args(args, Command::Cancel, "cancel"),
            "quit" | "exit" => no_args(args, Command::Quit, "quit"),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
