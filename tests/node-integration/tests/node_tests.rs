//! Cumulative REST integration tests.
//!
//! All steps run sequentially inside a single `#[tokio::test]` against one
//! spawned node. Each step assumes every previous step succeeded — if any
//! step panics the entire run stops immediately.

use agritrace_client::WorkflowClient;
use agritrace_common::error::WorkflowError;
use agritrace_common::identity::Role;
use agritrace_common::product::{ProductId, ProductStatus};
use agritrace_node_integration::spawn_node_with_url;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cumulative_rest_tests() {
    tracing_subscriber::fmt::try_init().ok();

    let (client, base_url) = spawn_node_with_url().await;

    // ═══════════════════════════════════════════════════════════════════
    // Step 1: register and login all three roles
    // ═══════════════════════════════════════════════════════════════════
    println!("── Step 1: register_and_login_all_roles ──");
    for (name, role) in [
        ("farmer1", Role::Farmer),
        ("cert1", Role::Certifier),
        ("consumer1", Role::Consumer),
    ] {
        let password = format!("{name}-password");
        client.register(name, &password, role).await.unwrap();

        let actor = client.login(name, &password).await.unwrap();
        assert_eq!(actor.username, name);
        assert_eq!(actor.role, role);
    }

    let err = client
        .register("farmer1", "other", Role::Farmer)
        .await
        .unwrap_err();
    assert!(
        matches!(err, WorkflowError::Conflict(_)),
        "duplicate registration should conflict, got {err:?}"
    );

    let err = client.login("farmer1", "wrong").await.unwrap_err();
    assert!(
        matches!(err, WorkflowError::Validation(_)),
        "bad password should be rejected, got {err:?}"
    );
    println!("   PASSED");

    // ═══════════════════════════════════════════════════════════════════
    // Step 2: farmer submits a product; it is pending and uncertified
    // ═══════════════════════════════════════════════════════════════════
    println!("── Step 2: submit_product_appears_pending ──");
    let product_id = client
        .submit_product("Organic Tomatoes", "BATCH-001", "farmer1")
        .await
        .unwrap();

    let pending = client.list_pending_certification().await.unwrap();
    assert!(
        pending.iter().any(|p| p.id == product_id),
        "freshly submitted product should be pending"
    );

    let (product, certification) = client.get_product_with_history(&product_id).await.unwrap();
    assert_eq!(product.status, ProductStatus::Uncertified);
    assert_eq!(product.name, "Organic Tomatoes");
    assert_eq!(product.batch_id, "BATCH-001");
    assert_eq!(product.owner, "farmer1");
    assert!(certification.is_none());

    let err = client
        .submit_product("", "BATCH-002", "farmer1")
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
    println!("   PASSED");

    // ═══════════════════════════════════════════════════════════════════
    // Step 3: certifier certifies the product
    // ═══════════════════════════════════════════════════════════════════
    println!("── Step 3: certify_transitions_product ──");
    let certification = client.certify(&product_id, "cert1").await.unwrap();
    assert_eq!(certification.product_id, product_id);
    assert_eq!(certification.certifier_name, "cert1");

    let (product, stored) = client.get_product_with_history(&product_id).await.unwrap();
    assert_eq!(product.status, ProductStatus::Certified);
    assert_eq!(stored, Some(certification));

    let pending = client.list_pending_certification().await.unwrap();
    assert!(
        !pending.iter().any(|p| p.id == product_id),
        "certified product must leave the pending list"
    );
    println!("   PASSED");

    // ═══════════════════════════════════════════════════════════════════
    // Step 4: second certification attempt is rejected, state unchanged
    // ═══════════════════════════════════════════════════════════════════
    println!("── Step 4: double_certify_rejected ──");
    let err = client.certify(&product_id, "cert2").await.unwrap_err();
    assert!(matches!(err, WorkflowError::AlreadyCertified(_)));

    let (product, stored) = client.get_product_with_history(&product_id).await.unwrap();
    assert_eq!(product.status, ProductStatus::Certified);
    assert_eq!(stored.unwrap().certifier_name, "cert1");
    println!("   PASSED");

    // ═══════════════════════════════════════════════════════════════════
    // Step 5: unknown products are 404 on both read and certify
    // ═══════════════════════════════════════════════════════════════════
    println!("── Step 5: unknown_product_not_found ──");
    let unknown = ProductId("p-0-000000".into());
    assert!(matches!(
        client.get_product_with_history(&unknown).await.unwrap_err(),
        WorkflowError::NotFound(_)
    ));
    assert!(matches!(
        client.certify(&unknown, "cert1").await.unwrap_err(),
        WorkflowError::NotFound(_)
    ));
    println!("   PASSED");

    // ═══════════════════════════════════════════════════════════════════
    // Step 6: wire shapes — canonical field names and status codes
    // ═══════════════════════════════════════════════════════════════════
    println!("── Step 6: canonical_wire_shapes ──");
    let http = reqwest::Client::new();

    let health: serde_json::Value = http
        .get(format!("{base_url}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let response = http
        .get(format!("{base_url}/api/products/{product_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["productId"], product_id.0);
    assert_eq!(body["batchId"], "BATCH-001");
    assert_eq!(body["owner"], "farmer1");
    assert_eq!(body["status"], "certified");
    assert_eq!(body["certifications"][0]["certifierName"], "cert1");

    let response = http
        .post(format!("{base_url}/api/certify"))
        .json(&serde_json::json!({ "productId": product_id.0, "certifier": "cert2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = http
        .get(format!("{base_url}/api/products/p-0-000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = http
        .post(format!("{base_url}/api/products"))
        .json(&serde_json::json!({ "name": "", "batchId": "B", "owner": "farmer1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    println!("   PASSED");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pending_list_preserves_insertion_order() {
    tracing_subscriber::fmt::try_init().ok();

    let (client, _) = spawn_node_with_url().await;

    let first = client
        .submit_product("Milk", "B-1", "farmer1")
        .await
        .unwrap();
    let second = client
        .submit_product("Cheese", "B-2", "farmer1")
        .await
        .unwrap();
    let third = client
        .submit_product("Butter", "B-3", "farmer2")
        .await
        .unwrap();

    let pending = client.list_pending_certification().await.unwrap();
    let ids: Vec<&ProductId> = pending.iter().map(|p| &p.id).collect();
    assert_eq!(ids, vec![&first, &second, &third]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn boxed_client_is_configuration_selectable() {
    // The REST adapter is usable through the capability interface alone.
    let (client, _) = spawn_node_with_url().await;
    let boxed: Box<dyn WorkflowClient> = Box::new(client);

    let id = boxed
        .submit_product("Organic Apples", "BATCH-007", "farmer1")
        .await
        .unwrap();
    let (product, _) = boxed.get_product_with_history(&id).await.unwrap();
    assert_eq!(product.name, "Organic Apples");
}
