pub mod test_duplicate_join;
pub mod test_full_room_cycle;
pub mod test_leave_is_idempotent;
pub mod test_rejoin_replaces_handle;
