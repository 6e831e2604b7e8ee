pub mod test_server;
pub mod wait_helpers;

pub use test_server::*;
pub use wait_helpers::*;
