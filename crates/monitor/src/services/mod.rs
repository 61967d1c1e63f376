pub mod order_service;
pub mod signal_book;
pub mod signal_fetcher;
pub mod signal_poller;
pub mod strategy_service;
