use std::sync::Arc;
use tokio::sync::Barrier;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{
    CONVERGENCE_TIMEOUT_MS, GatedRelay, TestClient, TestClientConfig, TestRig, wait_for,
};

#[tokio::test]
async fn test_simultaneous_join_keeps_one_channel_and_one_call() {
    init_tracing();

    let relay = create_test_relay(200);
    // Both clients register before either one looks at the directory.
    let barrier = Arc::new(Barrier::new(2));
    let first_rig = TestRig::with_relay(
        GatedRelay::factory(&relay, Arc::clone(&barrier)),
        TestClientConfig::default(),
    );
    let second_rig = TestRig::with_relay(
        GatedRelay::factory(&relay, Arc::clone(&barrier)),
        TestClientConfig::default(),
    );

    let (first, second) = tokio::join!(
        TestClient::join_with(first_rig, "race"),
        TestClient::join_with(second_rig, "race"),
    );
    let first = first.expect("Failed to join first client");
    let second = second.expect("Failed to join second client");

    assert!(
        first
            .wait_for_known(&[second.peer_id()], CONVERGENCE_TIMEOUT_MS)
            .await
    );
    assert!(
        second
            .wait_for_known(&[first.peer_id()], CONVERGENCE_TIMEOUT_MS)
            .await
    );
    assert!(first.wait_for_full_mesh(1, CONVERGENCE_TIMEOUT_MS).await);
    assert!(second.wait_for_full_mesh(1, CONVERGENCE_TIMEOUT_MS).await);

    // Each side discovered the other and called it.
    let calls = relay.calls().await;
    assert_eq!(calls.len(), 2, "expected crossing calls, got {:?}", calls);
    assert!(calls.contains(&(first.peer_id().clone(), second.peer_id().clone())));
    assert!(calls.contains(&(second.peer_id().clone(), first.peer_id().clone())));

    // One channel end and one session end per client once duplicates are gone.
    let relay_ref = &relay;
    let (first_id, second_id) = (first.peer_id(), second.peer_id());
    let settled = wait_for(CONVERGENCE_TIMEOUT_MS, move || async move {
        relay_ref.open_handles(first_id) == 2 && relay_ref.open_handles(second_id) == 2
    })
    .await;
    assert!(settled, "duplicate handles were not closed");

    assert_eq!(first.playback.target_count(), 1);
    assert_eq!(second.playback.target_count(), 1);

    first.leave().await.expect("Failed to leave");
    second.leave().await.expect("Failed to leave");
}
