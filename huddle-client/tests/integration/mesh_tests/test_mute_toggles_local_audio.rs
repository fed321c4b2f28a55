use huddle_client::Status;
use huddle_client::media::LocalStream;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{CONVERGENCE_TIMEOUT_MS, TestClient, TestClientConfig, expect_within};

#[tokio::test]
async fn test_mute_and_unmute() -> anyhow::Result<()> {
    init_tracing();

    let relay = create_test_relay(200);
    let client = TestClient::join(&relay, "quiet", TestClientConfig::default()).await?;
    let stream = client.mic.streams().await.remove(0);
    assert!(stream.is_enabled());

    client.handle.mute().await?;
    let observer = &client.observer;
    expect_within(CONVERGENCE_TIMEOUT_MS, "Muted status", move || async move {
        observer.last_status().await == Some(Status::Muted)
    })
    .await?;
    assert!(!stream.is_enabled());

    client.handle.unmute().await?;
    expect_within(CONVERGENCE_TIMEOUT_MS, "Unmuted status", move || async move {
        observer.last_status().await == Some(Status::Unmuted)
    })
    .await?;
    assert!(stream.is_enabled());
    assert!(!stream.is_stopped());

    client.leave().await?;
    assert!(stream.is_stopped());
    Ok(())
}
