pub mod http_helpers;
pub mod test_connection;
pub mod ws_client;

pub use http_helpers::*;
pub use test_connection::*;
pub use ws_client::*;

use huddle_core::{ParticipantId, RoomId};

pub fn pid(s: &str) -> ParticipantId {
    ParticipantId::parse(s).expect("valid participant id")
}

pub fn room(s: &str) -> RoomId {
    RoomId::parse(s).expect("valid room id")
}
