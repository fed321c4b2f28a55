use huddle_client::SignalingRelay;
use huddle_client::transport::TransportEvent;
use huddle_core::{ControlMessage, PeerId};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{CONVERGENCE_TIMEOUT_MS, TestClient, TestClientConfig, wait_for};

/// Plays the part of a peer already in the room with a bare relay endpoint.
#[tokio::test]
async fn test_join_is_answered_with_announce() {
    init_tracing();

    let relay = create_test_relay(200);
    let existing_id = PeerId::parse("teamroom-a1b2c3").unwrap();
    let existing = relay.endpoint();
    let (events_tx, mut events) = mpsc::unbounded_channel();
    existing
        .register(&existing_id, events_tx)
        .await
        .expect("Failed to register the existing peer");

    let client = TestClient::join(&relay, "Team Room!", TestClientConfig::default())
        .await
        .expect("Failed to join");

    let mut channel = None;
    let mut call = None;
    let greeting = loop {
        let event = timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("Timed out waiting for the newcomer")
            .expect("Event queue closed");
        match event {
            TransportEvent::IncomingConnection { channel: c, .. } => channel = Some(c),
            TransportEvent::IncomingCall { session, .. } => call = Some(session),
            TransportEvent::ChannelData { payload, .. } => {
                break ControlMessage::decode(&payload).expect("Malformed greeting");
            }
            _ => {}
        }
    };

    assert_eq!(
        greeting,
        ControlMessage::Join {
            peer_id: client.peer_id().clone()
        }
    );
    assert!(call.is_some(), "the newcomer should have called");

    let channel = channel.expect("the newcomer should have opened a channel");
    let announce = ControlMessage::Announce {
        peer_id: existing_id.clone(),
    };
    channel
        .send(announce.encode().unwrap())
        .await
        .expect("Failed to answer");
    channel
        .send(bytes::Bytes::from_static(b"not json"))
        .await
        .expect("Failed to send garbage");

    let expected = vec![
        format!("(You) {}", client.peer_id()),
        "teamroom-a1b2c3".to_owned(),
    ];
    let observer = &client.observer;
    let rendered = wait_for(CONVERGENCE_TIMEOUT_MS, move || {
        let expected = expected.clone();
        async move { observer.rendered_peer_list().await == expected }
    })
    .await;
    assert!(rendered, "unexpected peer list");
    assert_eq!(client.known_peers().await, vec![existing_id]);

    client.leave().await.expect("Failed to leave");
}
