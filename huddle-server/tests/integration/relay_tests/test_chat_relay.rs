use huddle_core::{ErrorCode, ServerMessage};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestConnection, pid};

fn texts(messages: Vec<ServerMessage>) -> Vec<String> {
    messages
        .into_iter()
        .map(|msg| match msg {
            ServerMessage::ReceiveMessage { text, .. } => text,
            other => panic!("unexpected message: {other:?}"),
        })
        .collect()
}

#[tokio::test]
async fn test_chat_order_is_preserved_for_every_member() {
    init_tracing();

    let service = create_test_service();
    let mut a = TestConnection::open(&service);
    let mut b = TestConnection::open(&service);
    let mut c = TestConnection::open(&service);
    a.join("r1", "a1", "Ada");
    b.join("r1", "b1", "Bob");
    c.join("r1", "c1", "Cy");
    a.drain();
    b.drain();
    c.drain();

    a.chat("one");
    b.chat("two");
    a.chat("three");

    let expected = vec!["one".to_string(), "two".into(), "three".into()];
    assert_eq!(texts(a.drain()), expected);
    assert_eq!(texts(b.drain()), expected);
    assert_eq!(texts(c.drain()), expected);
}

#[tokio::test]
async fn test_chat_carries_sender_identity() {
    init_tracing();

    let service = create_test_service();
    let mut a = TestConnection::open(&service);
    a.join("r1", "a1", "  Ada  ");
    a.drain();

    a.chat("hello");
    match a.recv().await {
        ServerMessage::ReceiveMessage {
            sender_id,
            sender_name,
            ..
        } => {
            assert_eq!(sender_id, pid("a1"));
            assert_eq!(sender_name, "Ada");
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_chat_is_rejected() {
    init_tracing();

    let service = create_test_service();
    let mut outsider = TestConnection::open(&service);
    outsider.chat("anyone there?");
    match outsider.recv().await {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::NotJoined),
        other => panic!("expected not-joined, got {other:?}"),
    }

    let mut a = TestConnection::open(&service);
    let mut b = TestConnection::open(&service);
    a.join("r1", "a1", "Ada");
    b.join("r1", "b1", "Bob");
    a.drain();
    b.drain();

    a.chat("   ");
    match a.recv().await {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidMessage),
        other => panic!("expected invalid-message, got {other:?}"),
    }
    b.assert_silent();
}
