use huddle_client::{MeshError, SignalingRelay, Status};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{TestClientConfig, TestRig};

#[tokio::test]
async fn test_invalid_label_is_rejected_before_anything_starts() {
    init_tracing();

    let relay = create_test_relay(200);
    let rig = TestRig::new(&relay, TestClientConfig::default());

    let result = rig.client.join("  !!! ").await;

    assert!(matches!(result, Err(MeshError::InvalidRoomLabel(_))));
    assert!(rig.observer.statuses().await.is_empty());
    assert!(rig.mic.streams().await.is_empty());
}

#[tokio::test]
async fn test_denied_microphone_aborts_join() {
    init_tracing();

    let relay = create_test_relay(200);
    let rig = TestRig::new(
        &relay,
        TestClientConfig {
            microphone_granted: false,
            ..Default::default()
        },
    );

    let result = rig.client.join("teamroom").await;

    assert!(matches!(result, Err(MeshError::CaptureDenied(_))));
    assert_eq!(
        rig.observer.last_status().await,
        Some(Status::CaptureDenied)
    );
    assert!(
        relay.endpoint().list_peers().await.unwrap().is_empty(),
        "nothing should be registered"
    );
}

#[tokio::test]
async fn test_refused_registration_releases_microphone() {
    init_tracing();

    let relay = create_test_relay(200);
    relay.set_accepting_registrations(false);
    let rig = TestRig::new(&relay, TestClientConfig::default());

    let result = rig.client.join("teamroom").await;

    assert!(matches!(
        result,
        Err(MeshError::SignalingRegistrationFailed(_))
    ));
    assert!(matches!(
        rig.observer.last_status().await,
        Some(Status::RegistrationFailed(_))
    ));
    assert_eq!(rig.mic.streams().await.len(), 1);
    assert_eq!(rig.mic.live_streams().await, 0);
}

#[tokio::test]
async fn test_discovery_outage_unregisters_and_releases_microphone() {
    init_tracing();

    let relay = create_test_relay(200);
    relay.set_directory_available(false);
    let rig = TestRig::new(&relay, TestClientConfig::default());

    let result = rig.client.join("teamroom").await;

    assert!(matches!(result, Err(MeshError::DiscoveryUnavailable(_))));
    assert_eq!(
        rig.observer.last_status().await,
        Some(Status::DiscoveryFailed)
    );
    assert_eq!(rig.mic.live_streams().await, 0);

    relay.set_directory_available(true);
    assert!(
        relay.endpoint().list_peers().await.unwrap().is_empty(),
        "the failed client should have unregistered"
    );
}
