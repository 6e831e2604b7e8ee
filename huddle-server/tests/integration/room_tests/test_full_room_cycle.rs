use huddle_core::{ClientMessage, IceCandidate, ParticipantInfo, ServerMessage};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestConnection, pid, room};

#[tokio::test]
async fn test_full_room_cycle() {
    init_tracing();

    let service = create_test_service();
    let r1 = room("r1");

    let mut a = TestConnection::open(&service);
    a.join("r1", "a1", "Ada");
    assert_eq!(a.recv().await, ServerMessage::CurrentUsers { users: vec![] });

    let mut b = TestConnection::open(&service);
    b.join("r1", "b1", "Bob");
    assert_eq!(
        b.recv().await,
        ServerMessage::CurrentUsers {
            users: vec![ParticipantInfo::new(pid("a1"), "Ada")],
        }
    );
    assert_eq!(
        a.recv().await,
        ServerMessage::UserConnected {
            participant_id: pid("b1"),
            display_name: "Bob".into(),
        }
    );

    // a1 already sat in the room, so it offers to the newcomer.
    a.send(ClientMessage::SendOffer {
        target_id: pid("b1"),
        sdp: "offer-sdp".into(),
    });
    assert_eq!(
        b.recv().await,
        ServerMessage::ReceiveOffer {
            sender_id: pid("a1"),
            sender_name: "Ada".into(),
            sdp: "offer-sdp".into(),
        }
    );

    b.send(ClientMessage::SendAnswer {
        target_id: pid("a1"),
        sdp: "answer-sdp".into(),
    });
    assert_eq!(
        a.recv().await,
        ServerMessage::ReceiveAnswer {
            sender_id: pid("b1"),
            sender_name: "Bob".into(),
            sdp: "answer-sdp".into(),
        }
    );

    let candidate = IceCandidate {
        candidate: "candidate:1 1 udp 2122260223 10.0.0.2 51000 typ host".into(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
        username_fragment: None,
    };
    b.send(ClientMessage::SendIceCandidate {
        target_id: pid("a1"),
        candidate: candidate.clone(),
    });
    assert_eq!(
        a.recv().await,
        ServerMessage::ReceiveIceCandidate {
            sender_id: pid("b1"),
            sender_name: "Bob".into(),
            candidate,
        }
    );

    b.chat("hi");
    for conn in [&mut a, &mut b] {
        match conn.recv().await {
            ServerMessage::ReceiveMessage {
                sender_id,
                sender_name,
                text,
                ..
            } => {
                assert_eq!(sender_id, pid("b1"));
                assert_eq!(sender_name, "Bob");
                assert_eq!(text, "hi");
            }
            other => panic!("expected receive-message, got {other:?}"),
        }
    }

    b.disconnect();
    assert_eq!(
        a.recv().await,
        ServerMessage::UserDisconnected {
            participant_id: pid("b1"),
            display_name: "Bob".into(),
        }
    );
    assert_eq!(service.coordinator().rooms().participant_count(&r1), 1);

    a.disconnect();
    assert!(!service.coordinator().rooms().contains_room(&r1));
    assert_eq!(service.coordinator().rooms().room_count(), 0);
    assert!(service.coordinator().registry().is_empty());
    a.assert_silent();
    b.assert_silent();
}
