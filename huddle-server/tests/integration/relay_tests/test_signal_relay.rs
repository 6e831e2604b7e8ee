use huddle_core::{ClientMessage, ErrorCode, ServerMessage};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestConnection, pid};

#[tokio::test]
async fn test_relay_to_departed_target_is_dropped_silently() {
    init_tracing();

    let service = create_test_service();
    let mut a = TestConnection::open(&service);
    let mut b = TestConnection::open(&service);
    a.join("r1", "a1", "Ada");
    b.join("r1", "b1", "Bob");
    b.disconnect();
    a.drain();

    a.send(ClientMessage::SendOffer {
        target_id: pid("b1"),
        sdp: "late-offer".into(),
    });
    a.assert_silent();
    b.assert_silent();
}

#[tokio::test]
async fn test_relay_never_crosses_rooms() {
    init_tracing();

    let service = create_test_service();
    let mut a = TestConnection::open(&service);
    let mut other = TestConnection::open(&service);
    a.join("r1", "a1", "Ada");
    other.join("r2", "b1", "Bob");
    a.drain();
    other.drain();

    a.send(ClientMessage::SendAnswer {
        target_id: pid("b1"),
        sdp: "answer".into(),
    });
    other.assert_silent();
    a.assert_silent();
}

#[tokio::test]
async fn test_relay_before_join_is_rejected() {
    init_tracing();

    let service = create_test_service();
    let mut conn = TestConnection::open(&service);
    conn.send(ClientMessage::SendOffer {
        target_id: pid("b1"),
        sdp: "offer".into(),
    });

    match conn.recv().await {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::NotJoined),
        other => panic!("expected not-joined, got {other:?}"),
    }
}

#[tokio::test]
async fn test_relays_from_one_sender_keep_their_order() {
    init_tracing();

    let service = create_test_service();
    let a = TestConnection::open(&service);
    let mut b = TestConnection::open(&service);
    a.join("r1", "a1", "Ada");
    b.join("r1", "b1", "Bob");
    b.drain();

    for i in 0..20 {
        a.send(ClientMessage::SendOffer {
            target_id: pid("b1"),
            sdp: format!("sdp-{i}"),
        });
    }

    let received: Vec<String> = b
        .drain()
        .into_iter()
        .map(|msg| match msg {
            ServerMessage::ReceiveOffer { sdp, .. } => sdp,
            other => panic!("unexpected message: {other:?}"),
        })
        .collect();
    let expected: Vec<String> = (0..20).map(|i| format!("sdp-{i}")).collect();
    assert_eq!(received, expected);
}
