use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{CONVERGENCE_TIMEOUT_MS, TestClient, TestClientConfig};

#[tokio::test]
async fn test_three_clients_joining_in_sequence_converge() {
    init_tracing();

    let relay = create_test_relay(200);
    let mut clients = Vec::new();
    for name in ["1", "2", "3"] {
        let client = TestClient::join(&relay, "standup", TestClientConfig::default())
            .await
            .unwrap_or_else(|e| panic!("Client {} failed to join: {}", name, e));
        clients.push(client);
    }

    for client in &clients {
        let others: Vec<_> = clients
            .iter()
            .map(TestClient::peer_id)
            .filter(|id| *id != client.peer_id())
            .collect();
        assert!(
            client.wait_for_known(&others, CONVERGENCE_TIMEOUT_MS).await,
            "{} did not converge",
            client.peer_id()
        );
        assert!(
            client.wait_for_full_mesh(2, CONVERGENCE_TIMEOUT_MS).await,
            "{} has no full mesh",
            client.peer_id()
        );
        assert_eq!(client.playback.target_count(), 2);
    }

    for client in clients {
        client.leave().await.expect("Failed to leave");
    }
}
