use huddle_client::Status;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{CONVERGENCE_TIMEOUT_MS, TestClient, TestClientConfig, expect_within};

#[tokio::test]
async fn test_broken_media_drops_only_that_peer() -> anyhow::Result<()> {
    init_tracing();

    let relay = create_test_relay(200);
    let first = TestClient::join(&relay, "standup", TestClientConfig::default()).await?;
    let second = TestClient::join(&relay, "standup", TestClientConfig::default()).await?;
    let third = TestClient::join(&relay, "standup", TestClientConfig::default()).await?;
    for client in [&first, &second, &third] {
        assert!(client.wait_for_full_mesh(2, CONVERGENCE_TIMEOUT_MS).await);
    }

    relay.fail_media(first.peer_id(), second.peer_id(), "ice-failed");

    assert!(
        first
            .wait_for_known(&[third.peer_id()], CONVERGENCE_TIMEOUT_MS)
            .await
    );
    assert!(
        second
            .wait_for_known(&[third.peer_id()], CONVERGENCE_TIMEOUT_MS)
            .await
    );
    assert!(
        first
            .observer
            .has_status(&Status::PeerError(second.peer_id().clone()))
            .await
    );
    assert!(
        second
            .observer
            .has_status(&Status::PeerError(first.peer_id().clone()))
            .await
    );
    assert!(first.playback.bound(second.peer_id()).is_none());

    // Nobody else is affected.
    assert!(first.handle.is_active());
    assert!(second.handle.is_active());
    assert!(first.wait_for_full_mesh(1, CONVERGENCE_TIMEOUT_MS).await);
    assert!(third.wait_for_full_mesh(2, CONVERGENCE_TIMEOUT_MS).await);

    first.leave().await?;
    second.leave().await?;
    third.leave().await?;
    Ok(())
}

#[tokio::test]
async fn test_refused_call_leaves_no_half_open_peer() -> anyhow::Result<()> {
    init_tracing();

    let relay = create_test_relay(200);
    let first = TestClient::join(&relay, "standup", TestClientConfig::default()).await?;
    let second = TestClient::join(&relay, "standup", TestClientConfig::default()).await?;
    assert!(first.wait_for_full_mesh(1, CONVERGENCE_TIMEOUT_MS).await);
    assert!(second.wait_for_full_mesh(1, CONVERGENCE_TIMEOUT_MS).await);

    // The newcomer reaches `first` over a control channel but cannot call it.
    relay.refuse_calls_to(first.peer_id());
    let newcomer = TestClient::join(&relay, "standup", TestClientConfig::default()).await?;
    let newcomer_id = newcomer.peer_id().clone();

    assert!(
        newcomer
            .wait_for_known(&[second.peer_id()], CONVERGENCE_TIMEOUT_MS)
            .await
    );
    assert!(newcomer.wait_for_full_mesh(1, CONVERGENCE_TIMEOUT_MS).await);
    assert!(
        newcomer
            .observer
            .has_status(&Status::PeerError(first.peer_id().clone()))
            .await
    );
    assert!(newcomer.handle.is_active());

    // `first` only ever saw a channel open and close again.
    let observer = &first.observer;
    let gone = Status::PeerDisconnected(newcomer_id.clone());
    expect_within(CONVERGENCE_TIMEOUT_MS, "half-open peer to be dropped", move || {
        let gone = gone.clone();
        async move { observer.has_status(&gone).await }
    })
    .await?;
    assert_eq!(first.known_peers().await, vec![second.peer_id().clone()]);

    newcomer.leave().await?;
    assert!(
        second
            .wait_for_known(&[first.peer_id()], CONVERGENCE_TIMEOUT_MS)
            .await
    );
    assert_eq!(
        first.snapshot().await.rendered(),
        vec![
            format!("(You) {}", first.peer_id()),
            second.peer_id().to_string()
        ]
    );
    assert!(first.wait_for_full_mesh(1, CONVERGENCE_TIMEOUT_MS).await);
    assert!(!relay.is_registered(&newcomer_id));

    first.leave().await?;
    second.leave().await?;
    Ok(())
}
