mod local_track;
mod peer_transport;
mod transport_config;
mod transport_event;

pub use local_track::*;
pub use peer_transport::*;
pub use transport_config::*;
pub use transport_event::*;
