use huddle_core::{ClientMessage, NoPayload, ServerMessage};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestConnection, pid, room};

#[tokio::test]
async fn test_leave_then_disconnect_broadcasts_once() {
    init_tracing();

    let service = create_test_service();
    let mut a = TestConnection::open(&service);
    let mut b = TestConnection::open(&service);
    a.join("r1", "a1", "Ada");
    b.join("r1", "b1", "Bob");
    a.drain();
    b.drain();

    b.send(ClientMessage::LeaveRoom(NoPayload));
    b.send(ClientMessage::LeaveRoom(NoPayload));
    b.disconnect();

    let events = a.drain();
    assert_eq!(
        events,
        vec![ServerMessage::UserDisconnected {
            participant_id: pid("b1"),
            display_name: "Bob".into(),
        }]
    );
    b.assert_silent();
    assert_eq!(service.coordinator().rooms().participant_count(&room("r1")), 1);
}

#[tokio::test]
async fn test_connection_can_join_again_after_leaving() {
    init_tracing();

    let service = create_test_service();
    let mut a = TestConnection::open(&service);
    a.join("r1", "a1", "Ada");
    a.send(ClientMessage::LeaveRoom(NoPayload));
    assert!(!service.coordinator().rooms().contains_room(&room("r1")));

    a.join("r2", "a1", "Ada");
    let events = a.drain();
    assert_eq!(
        events,
        vec![
            ServerMessage::CurrentUsers { users: vec![] },
            ServerMessage::CurrentUsers { users: vec![] },
        ]
    );
    assert!(service.coordinator().rooms().contains_room(&room("r2")));
}
