use std::time::Duration;

use huddle_client::{ClientConfig, ClientEvent, ClientSession, MeshClient, TrackKind};
use huddle_core::mesh::LinkState;
use huddle_core::{ParticipantId, RoomId};
use tokio::sync::mpsc;

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

const NEGOTIATION_TIMEOUT_MS: u64 = 3000;

async fn connect(server: &TestServer, participant: &str, name: &str) -> ClientSession {
    let config = ClientConfig::new(server.ws_url(), RoomId::parse("r1").unwrap(), name)
        .with_participant_id(ParticipantId::parse(participant).unwrap())
        .with_loopback_candidates(true)
        .with_negotiation_timeout_ms(NEGOTIATION_TIMEOUT_MS);
    MeshClient::connect(config)
        .await
        .expect("Failed to connect client")
}

/// Everything a client emits within `window_ms`.
async fn collect_events(
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    window_ms: u64,
) -> Vec<ClientEvent> {
    let mut seen = Vec::new();
    let _ = tokio::time::timeout(Duration::from_millis(window_ms), async {
        while let Some(event) = events.recv().await {
            seen.push(event);
        }
    })
    .await;
    seen
}

fn offers(events: &[ClientEvent]) -> Vec<&ClientEvent> {
    events
        .iter()
        .filter(|e| matches!(e, ClientEvent::OfferSent { .. }))
        .collect()
}

fn failed(events: &[ClientEvent]) -> bool {
    events.iter().any(|e| {
        matches!(
            e,
            ClientEvent::LinkStateChanged {
                state: LinkState::Failed,
                ..
            }
        )
    })
}

#[tokio::test]
async fn test_added_track_renegotiates_from_initiator_only() {
    init_tracing();

    let server = TestServer::start().await;
    let mut a = connect(&server, "a1", "Ada").await;
    wait_for_event(&mut a.events, 5000, |e| matches!(e, ClientEvent::Joined { .. })).await;
    let mut b = connect(&server, "b1", "Bob").await;

    // a was in the room first, so it initiates the pair.
    wait_for_event(&mut a.events, 20_000, connected_to("b1")).await;
    wait_for_event(&mut b.events, 20_000, connected_to("a1")).await;

    a.handle.add_track(TrackKind::Audio).expect("add track");
    let from_a = collect_events(&mut a.events, 1500).await;
    assert_eq!(
        offers(&from_a),
        vec![&ClientEvent::OfferSent {
            remote_id: b.handle.participant_id().clone(),
            ice_restart: false,
        }]
    );
    assert!(!failed(&from_a));

    b.handle.add_track(TrackKind::Audio).expect("add track");
    let from_b = collect_events(&mut b.events, 1500).await;
    assert!(offers(&from_b).is_empty());
    assert!(!failed(&from_b));

    // Past the negotiation timeout the renegotiated link is still up.
    let later = collect_events(&mut a.events, NEGOTIATION_TIMEOUT_MS).await;
    assert!(offers(&later).is_empty());
    assert!(!failed(&later));

    a.handle.leave().expect("leave");
    b.handle.leave().expect("leave");
    a.task
        .await
        .expect("client task panicked")
        .expect("client loop failed");
    b.task
        .await
        .expect("client task panicked")
        .expect("client loop failed");
}
