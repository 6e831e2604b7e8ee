mod config;
mod error;
mod http;
mod room;
mod server;
mod session;
mod signaling;
mod transport;

pub use config::*;
pub use error::*;
pub use http::*;
pub use room::*;
pub use server::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
