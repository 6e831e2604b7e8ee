mod chat_relay;
mod session_coordinator;

pub use chat_relay::*;
pub use session_coordinator::*;
