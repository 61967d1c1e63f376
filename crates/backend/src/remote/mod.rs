pub mod ack_response;
pub mod backend_client;

pub use ack_response::Ack;
pub use backend_client::BackendClient;

pub const PLACE_ORDER: &str = "place-order";
pub const TRACK_SIGNAL: &str = "track-signal";
pub const GET_SIGNALS: &str = "get-signals";
