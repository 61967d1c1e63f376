use common::models::Strategy;

/// Strategies the dashboard knows about at startup. The backend owns their logic.
pub fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy::new(
            "1",
            "Bollinger Bands + RSI + ATR",
            "Combines Bollinger Bands, RSI, and ATR for signal generation",
            78,
        ),
        Strategy::new(
            "2",
            "Supertrend",
            "Uses Supertrend indicator for trend following",
            72,
        ),
        Strategy::new(
            "3",
            "SMA 50/200 Crossover",
            "Simple Moving Average crossover strategy",
            80,
        ),
    ]
}
