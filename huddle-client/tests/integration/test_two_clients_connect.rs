use huddle_client::ClientEvent;
use huddle_core::ParticipantId;
use huddle_core::mesh::LinkState;

use crate::integration::init_tracing;
use crate::utils::{TestServer, wait_for_event};

fn connected_to(remote: &str) -> impl FnMut(&ClientEvent) -> bool + '_ {
    move |event| {
        matches!(
            event,
            ClientEvent::LinkStateChanged { remote_id, state: LinkState::Connected }
                if remote_id.as_str() == remote
        )
    }
}

#[tokio::test]
async fn test_two_clients_connect() {
    init_tracing();

    let server = TestServer::start().await;

    let mut a = server.connect("r1", "a1", "Ada").await;
    match wait_for_event(&mut a.events, 5000, |e| matches!(e, ClientEvent::Joined { .. })).await {
        ClientEvent::Joined { participants, .. } => assert!(participants.is_empty()),
        other => panic!("unexpected event {other:?}"),
    }

    let mut b = server.connect("r1", "b1", "Bob").await;
    match wait_for_event(&mut b.events, 5000, |e| matches!(e, ClientEvent::Joined { .. })).await {
        ClientEvent::Joined { participants, .. } => {
            let ids: Vec<&str> = participants.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(ids, vec!["a1"]);
        }
        other => panic!("unexpected event {other:?}"),
    }

    wait_for_event(&mut a.events, 20_000, connected_to("b1")).await;
    wait_for_event(&mut b.events, 20_000, connected_to("a1")).await;

    b.handle.leave().expect("leave");
    match wait_for_event(&mut a.events, 5000, |e| matches!(e, ClientEvent::ParticipantLeft(_))).await {
        ClientEvent::ParticipantLeft(info) => {
            assert_eq!(info.id, ParticipantId::parse("b1").unwrap())
        }
        other => panic!("unexpected event {other:?}"),
    }

    b.task
        .await
        .expect("client task panicked")
        .expect("client loop failed");

    a.handle.leave().expect("leave");
    a.task
        .await
        .expect("client task panicked")
        .expect("client loop failed");

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(server.service.coordinator().rooms().room_count(), 0);
}
