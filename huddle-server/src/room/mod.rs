mod participant;
mod room;
mod room_table;

pub use participant::*;
pub use room::*;
pub use room_table::*;
