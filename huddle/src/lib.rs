pub use huddle_core::{ParticipantId, RoomId};

pub mod model {
    pub use huddle_core::model::*;
}

pub mod mesh {
    pub use huddle_core::mesh::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use huddle_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use huddle_client::*;
}

#[cfg(feature = "wasm")]
pub mod wasm {
    pub use huddle_wasm::*;
}
