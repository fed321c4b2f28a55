use std::collections::HashSet;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{CONVERGENCE_TIMEOUT_MS, TestClient, TestClientConfig};

#[tokio::test]
async fn test_each_pair_is_called_exactly_once() {
    init_tracing();

    let relay = create_test_relay(200);
    let mut clients: Vec<TestClient> = Vec::new();
    for _ in 0..3 {
        let client = TestClient::join(&relay, "standup", TestClientConfig::default())
            .await
            .expect("Failed to join");
        // Join one at a time so no two clients race each other.
        for existing in &clients {
            assert!(
                existing
                    .wait_for_full_mesh(clients.len(), CONVERGENCE_TIMEOUT_MS)
                    .await
            );
        }
        clients.push(client);
    }
    for client in &clients {
        assert!(client.wait_for_full_mesh(2, CONVERGENCE_TIMEOUT_MS).await);
    }

    let calls = relay.calls().await;
    assert_eq!(calls.len(), 3, "unexpected calls: {:?}", calls);

    let pairs: HashSet<_> = calls
        .iter()
        .map(|(caller, callee)| {
            if caller < callee {
                (caller.clone(), callee.clone())
            } else {
                (callee.clone(), caller.clone())
            }
        })
        .collect();
    assert_eq!(pairs.len(), 3, "a pair was called twice: {:?}", calls);

    // Later joiners call, earlier ones only answer.
    for (caller, callee) in &calls {
        let caller_pos = clients.iter().position(|c| c.peer_id() == caller);
        let callee_pos = clients.iter().position(|c| c.peer_id() == callee);
        assert!(caller_pos > callee_pos);
    }

    for client in clients {
        client.leave().await.expect("Failed to leave");
    }
}
