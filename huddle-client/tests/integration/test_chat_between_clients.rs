use huddle_client::ClientEvent;

use crate::integration::init_tracing;
use crate::utils::{TestServer, wait_for_event};

fn is_chat(event: &ClientEvent) -> bool {
    matches!(event, ClientEvent::Chat { .. })
}

#[tokio::test]
async fn test_chat_between_clients() {
    init_tracing();

    let server = TestServer::start().await;
    let mut a = server.connect("r1", "a1", "Ada").await;
    wait_for_event(&mut a.events, 5000, |e| matches!(e, ClientEvent::Joined { .. })).await;
    let mut b = server.connect("r1", "b1", "Bob").await;
    wait_for_event(&mut b.events, 5000, |e| matches!(e, ClientEvent::Joined { .. })).await;

    b.handle.chat("hi").expect("chat");

    match wait_for_event(&mut a.events, 5000, is_chat).await {
        ClientEvent::Chat {
            sender_id,
            sender_name,
            text,
            local,
            ..
        } => {
            assert_eq!(sender_id.as_str(), "b1");
            assert_eq!(sender_name, "Bob");
            assert_eq!(text, "hi");
            assert!(!local);
        }
        other => panic!("unexpected event {other:?}"),
    }

    match wait_for_event(&mut b.events, 5000, is_chat).await {
        ClientEvent::Chat { text, local, .. } => {
            assert_eq!(text, "hi");
            assert!(local);
        }
        other => panic!("unexpected event {other:?}"),
    }

    a.handle.leave().expect("leave");
    b.handle.leave().expect("leave");
}
