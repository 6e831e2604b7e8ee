mod client;
mod config;
mod error;
mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use transport::*;
