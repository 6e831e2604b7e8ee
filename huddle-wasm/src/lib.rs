mod client;
pub mod engine;
mod logger;

pub use client::HuddleClient;
pub use engine::{Callbacks, EngineConfig, HuddleEngine};
