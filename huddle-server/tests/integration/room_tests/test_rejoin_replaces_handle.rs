use huddle_core::{ErrorCode, ParticipantInfo, ServerMessage};
use huddle_server::{RejoinPolicy, ServerConfig, SignalingService};

use crate::integration::init_tracing;
use crate::utils::{TestConnection, pid, room};

#[tokio::test]
async fn test_rejoin_replaces_handle() {
    init_tracing();

    let service = SignalingService::new(ServerConfig {
        rejoin_policy: RejoinPolicy::ReplaceHandle,
        ..ServerConfig::default()
    });

    let mut old = TestConnection::open(&service);
    let mut b = TestConnection::open(&service);
    old.join("r1", "a1", "Ada");
    b.join("r1", "b1", "Bob");
    old.drain();
    b.drain();

    let mut new = TestConnection::open(&service);
    new.join("r1", "a1", "Ada (phone)");

    assert_eq!(
        new.recv().await,
        ServerMessage::CurrentUsers {
            users: vec![ParticipantInfo::new(pid("b1"), "Bob")],
        }
    );
    assert_eq!(
        b.drain(),
        vec![
            ServerMessage::UserDisconnected {
                participant_id: pid("a1"),
                display_name: "Ada".into(),
            },
            ServerMessage::UserConnected {
                participant_id: pid("a1"),
                display_name: "Ada (phone)".into(),
            },
        ]
    );
    match old.recv().await {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::SessionReplaced),
        other => panic!("expected session-replaced, got {other:?}"),
    }

    // The stale connection closing must not evict the new one.
    old.disconnect();
    b.assert_silent();
    let members = service.coordinator().rooms().snapshot(&room("r1")).unwrap();
    assert_eq!(
        members,
        vec![
            ParticipantInfo::new(pid("a1"), "Ada (phone)"),
            ParticipantInfo::new(pid("b1"), "Bob"),
        ]
    );
}
