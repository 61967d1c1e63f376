use serde::{Deserialize, Serialize};

pub type StrategyId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    Manual,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub id: StrategyId,
    pub name: String,
    pub description: String,
    /// Historical accuracy in percent.
    pub accuracy: u8,
    pub is_active: bool,
    pub is_auto: bool,
}

impl Strategy {
    pub fn new(id: &str, name: &str, description: &str, accuracy: u8) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            accuracy: accuracy.min(100),
            is_active: false,
            is_auto: false,
        }
    }

    /// The auto flag only takes effect while the strategy is monitored.
    pub fn execution_mode(&self) -> ExecutionMode {
        if self.is_active && self.is_auto {
            ExecutionMode::Auto
        } else {
            ExecutionMode::Manual
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_mode_is_manual_while_inactive() {
        let mut strategy = Strategy::new("1", "Supertrend", "trend following", 72);
        strategy.is_auto = true;
        assert_eq!(strategy.execution_mode(), ExecutionMode::Manual);

        strategy.is_active = true;
        assert_eq!(strategy.execution_mode(), ExecutionMode::Auto);
    }

    #[test]
    fn serializes_with_camel_case_flags() {
        let strategy = Strategy::new("3", "SMA 50/200 Crossover", "crossover", 80);
        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["isActive"], false);
        assert_eq!(json["isAuto"], false);
        assert_eq!(json["accuracy"], 80);
    }
}
