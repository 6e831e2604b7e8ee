pub mod test_chat_between_clients;
pub mod test_track_renegotiation;
pub mod test_two_clients_connect;

use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
