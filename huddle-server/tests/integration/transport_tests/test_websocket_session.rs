use huddle_core::{ClientMessage, ErrorCode, ServerMessage};
use huddle_server::ServerConfig;

use crate::integration::{init_tracing, spawn_test_server};
use crate::utils::{WsTestClient, pid, room};

#[tokio::test]
async fn test_websocket_session() {
    init_tracing();

    let (addr, service, _shutdown) = spawn_test_server(ServerConfig::default()).await;

    let mut a = WsTestClient::connect(addr).await.expect("client a connects");
    match a.recv().await.expect("first frame") {
        ServerMessage::IceConfig { ice_servers } => {
            assert_eq!(ice_servers, ServerConfig::default().ice_servers)
        }
        other => panic!("expected ice-config first, got {other:?}"),
    }
    a.send(&ClientMessage::JoinRoom {
        room_id: room("r1"),
        participant_id: pid("a1"),
        display_name: "Ada".into(),
    })
    .await
    .expect("join a1");
    assert_eq!(
        a.recv().await.expect("snapshot"),
        ServerMessage::CurrentUsers { users: vec![] }
    );

    let mut b = WsTestClient::connect(addr).await.expect("client b connects");
    b.recv().await.expect("ice-config");
    b.send(&ClientMessage::JoinRoom {
        room_id: room("r1"),
        participant_id: pid("b1"),
        display_name: "Bob".into(),
    })
    .await
    .expect("join b1");
    assert!(matches!(
        b.recv().await.expect("snapshot"),
        ServerMessage::CurrentUsers { users } if users.len() == 1
    ));
    assert!(matches!(
        a.recv().await.expect("arrival"),
        ServerMessage::UserConnected { participant_id, .. } if participant_id == pid("b1")
    ));

    b.send_raw("{\"op\":\"not-a-thing\"}").await.expect("send garbage");
    match b.recv().await.expect("error frame") {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidMessage),
        other => panic!("expected invalid-message, got {other:?}"),
    }

    b.close().await.expect("close b");
    assert_eq!(
        a.recv().await.expect("departure"),
        ServerMessage::UserDisconnected {
            participant_id: pid("b1"),
            display_name: "Bob".into(),
        }
    );
    assert_eq!(service.coordinator().rooms().participant_count(&room("r1")), 1);
}

#[tokio::test]
async fn test_websocket_rejects_bad_room_and_accepts_documented_leave() {
    init_tracing();

    let (addr, service, _shutdown) = spawn_test_server(ServerConfig::default()).await;

    let mut a = WsTestClient::connect(addr).await.expect("client a connects");
    a.recv().await.expect("ice-config");

    a.send_raw(
        r#"{"op":"join-room","d":{"roomId":"no/slashes","participantId":"a1","displayName":"Ada"}}"#,
    )
    .await
    .expect("send bad join");
    match a.recv().await.expect("error frame") {
        ServerMessage::Error { code, .. } => assert_eq!(code, ErrorCode::InvalidRoom),
        other => panic!("expected invalid-room, got {other:?}"),
    }
    assert_eq!(service.coordinator().rooms().room_count(), 0);

    a.send(&ClientMessage::JoinRoom {
        room_id: room("r2"),
        participant_id: pid("a1"),
        display_name: "Ada".into(),
    })
    .await
    .expect("join a1");
    a.recv().await.expect("snapshot");

    let mut b = WsTestClient::connect(addr).await.expect("client b connects");
    b.recv().await.expect("ice-config");
    b.send(&ClientMessage::JoinRoom {
        room_id: room("r2"),
        participant_id: pid("b1"),
        display_name: "Bob".into(),
    })
    .await
    .expect("join b1");
    b.recv().await.expect("snapshot");
    a.recv().await.expect("arrival");

    b.send_raw(r#"{"op":"leave-room","d":{}}"#)
        .await
        .expect("send leave");
    assert_eq!(
        a.recv().await.expect("departure"),
        ServerMessage::UserDisconnected {
            participant_id: pid("b1"),
            display_name: "Bob".into(),
        }
    );
    assert_eq!(service.coordinator().rooms().participant_count(&room("r2")), 1);
}
