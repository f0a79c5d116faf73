//! At-most-once certification under concurrent callers.

use std::sync::Arc;

use agritrace_client::WorkflowClient;
use agritrace_common::error::WorkflowError;
use agritrace_common::product::ProductStatus;
use agritrace_node_integration::spawn_node;
use futures::future::join_all;

const CALLERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_certify_has_exactly_one_winner() {
    tracing_subscriber::fmt::try_init().ok();

    let client = Arc::new(spawn_node().await);
    let product_id = client
        .submit_product("Organic Tomatoes", "BATCH-001", "farmer1")
        .await
        .unwrap();

    let attempts = (0..CALLERS).map(|i| {
        let client = Arc::clone(&client);
        let product_id = product_id.clone();
        async move { client.certify(&product_id, &format!("cert{i}")).await }
    });
    let results = join_all(attempts).await;

    let successes: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let rejections = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(WorkflowError::AlreadyCertified(_)) | Err(WorkflowError::Conflict(_))
            )
        })
        .count();

    assert_eq!(successes.len(), 1, "exactly one caller may win");
    assert_eq!(rejections, CALLERS - 1, "all others get a typed rejection");

    // Exactly one certification record exists, and it belongs to the winner.
    let (product, certification) = client.get_product_with_history(&product_id).await.unwrap();
    assert_eq!(product.status, ProductStatus::Certified);
    assert_eq!(certification.as_ref(), Some(*successes.first().unwrap()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_get_unique_ids() {
    let client = Arc::new(spawn_node().await);

    let submissions = (0..CALLERS).map(|i| {
        let client = Arc::clone(&client);
        async move {
            client
                .submit_product(&format!("Product {i}"), &format!("B-{i}"), "farmer1")
                .await
                .unwrap()
        }
    });
    let mut ids = join_all(submissions).await;

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), CALLERS, "every submission gets a distinct id");

    let pending = client.list_pending_certification().await.unwrap();
    assert_eq!(pending.len(), CALLERS);
}
