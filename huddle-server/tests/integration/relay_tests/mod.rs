pub mod test_chat_relay;
pub mod test_signal_relay;
