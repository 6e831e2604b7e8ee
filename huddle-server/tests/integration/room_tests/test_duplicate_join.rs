use huddle_core::{ErrorCode, ServerMessage};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestConnection, room};

#[tokio::test]
async fn test_duplicate_join_is_reported_to_the_joiner_only() {
    init_tracing();

    let service = create_test_service();
    let mut first = TestConnection::open(&service);
    first.join("r1", "a1", "Ada");
    first.drain();

    let mut second = TestConnection::open(&service);
    second.join("r1", "a1", "Impostor");

    match second.recv().await {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::DuplicateParticipant),
        other => panic!("expected error, got {other:?}"),
    }
    first.assert_silent();
    assert_eq!(service.coordinator().rooms().participant_count(&room("r1")), 1);

    // The rejected connection never got bound, so its close is a no-op.
    second.disconnect();
    first.assert_silent();
    assert_eq!(service.coordinator().rooms().participant_count(&room("r1")), 1);
}

#[tokio::test]
async fn test_second_join_on_same_connection_is_rejected() {
    init_tracing();

    let service = create_test_service();
    let mut conn = TestConnection::open(&service);
    conn.join("r1", "a1", "Ada");
    conn.drain();

    conn.join("r2", "a1", "Ada");
    match conn.recv().await {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::AlreadyJoined),
        other => panic!("expected error, got {other:?}"),
    }
    assert!(!service.coordinator().rooms().contains_room(&room("r2")));
}
