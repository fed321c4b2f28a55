use huddle_client::Status;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{CONVERGENCE_TIMEOUT_MS, TestClient, TestClientConfig, expect_within};

#[tokio::test]
async fn test_leave_closes_every_handle_and_stops_the_microphone() -> anyhow::Result<()> {
    init_tracing();

    let relay = create_test_relay(200);
    let leaving = TestClient::join(&relay, "standup", TestClientConfig::default()).await?;
    let staying = TestClient::join(&relay, "standup", TestClientConfig::default()).await?;
    assert!(leaving.wait_for_full_mesh(1, CONVERGENCE_TIMEOUT_MS).await);
    assert!(staying.wait_for_full_mesh(1, CONVERGENCE_TIMEOUT_MS).await);

    let leaving_id = leaving.peer_id().clone();
    let mic = leaving.mic.clone();
    let observer = leaving.observer.clone();
    let playback = leaving.playback.clone();
    leaving.leave().await?;

    assert_eq!(relay.open_handles(&leaving_id), 0);
    assert!(!relay.is_registered(&leaving_id));
    assert_eq!(mic.live_streams().await, 0);
    assert_eq!(playback.target_count(), 0);
    assert!(observer.rendered_peer_list().await.is_empty());
    assert_eq!(observer.last_status().await, Some(Status::Idle));

    // No goodbye message: the remaining client notices the closed call.
    assert!(staying.wait_for_known(&[], CONVERGENCE_TIMEOUT_MS).await);
    let staying_observer = &staying.observer;
    let departed = Status::PeerDisconnected(leaving_id.clone());
    expect_within(
        CONVERGENCE_TIMEOUT_MS,
        "PeerDisconnected status",
        move || {
            let departed = departed.clone();
            async move { staying_observer.has_status(&departed).await }
        },
    )
    .await?;
    assert_eq!(staying.playback.target_count(), 0);
    assert_eq!(relay.open_handles(staying.peer_id()), 0);

    staying.leave().await?;
    Ok(())
}
