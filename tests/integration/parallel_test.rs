//! Ordered-parallel fan-out tests.

use std::sync::Arc;

use db_courier::backend::{MockBackend, Value};
use db_courier::catalog::StaticCatalog;
use db_courier::protocol::{RequestEnvelope, RequestItem, ResponseFormat};
use db_courier::{BatchEngine, EngineOptions};
use pretty_assertions::assert_eq;

/// Scripts five scalar statements with deliberately shuffled delays so that
/// completion order differs from request order.
fn staggered_backend() -> MockBackend {
    let backend = MockBackend::new();
    for (i, delay) in [(1u32, 50u64), (2, 10), (3, 30), (4, 1), (5, 20)] {
        let text = format!("SELECT {i}");
        backend.script_scalar(text.clone(), i as i64);
        backend.script_delay(text, delay);
    }
    backend
}

fn staggered_catalog() -> StaticCatalog {
    let mut catalog = StaticCatalog::new();
    for i in 1..=5 {
        catalog.insert("Nums", format!("S{i}"), format!("SELECT {i}"));
    }
    catalog
}

fn staggered_request() -> RequestEnvelope {
    let mut request = RequestEnvelope::new("par").parallel(true);
    for i in 1..=5 {
        request = request.with_item(
            RequestItem::new(format!("k{i}"), format!("Nums,S{i}"))
                .with_format(ResponseFormat::Scalar),
        );
    }
    request
}

#[tokio::test]
async fn test_parallel_results_preserve_request_order() {
    let engine = BatchEngine::new(
        Arc::new(staggered_backend()),
        Arc::new(staggered_catalog()),
    );

    let response = engine.execute(Some(staggered_request())).await;

    assert!(response.is_ok());
    let ids: Vec<_> = response.items.iter().map(|item| item.id.clone()).collect();
    assert_eq!(ids, vec!["k1", "k2", "k3", "k4", "k5"]);
    let values: Vec<_> = response
        .items
        .iter()
        .map(|item| item.result_value.clone())
        .collect();
    assert_eq!(
        values,
        (1..=5).map(|i| Some(Value::Int(i))).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_parallel_order_holds_under_tight_worker_limit() {
    let engine = BatchEngine::new(
        Arc::new(staggered_backend()),
        Arc::new(staggered_catalog()),
    )
    .with_options(EngineOptions {
        max_parallelism: 2,
        ..EngineOptions::default()
    });

    let response = engine.execute(Some(staggered_request())).await;

    assert!(response.is_ok());
    let ids: Vec<_> = response.items.iter().map(|item| item.id.clone()).collect();
    assert_eq!(ids, vec!["k1", "k2", "k3", "k4", "k5"]);
}

#[tokio::test]
async fn test_parallel_item_failure_stays_on_its_item() {
    let backend = staggered_backend();
    backend.script_failure("SELECT 3", "deadlock detected");
    let engine = BatchEngine::new(Arc::new(backend), Arc::new(staggered_catalog()));

    let response = engine.execute(Some(staggered_request())).await;

    assert!(response.is_ok());
    assert!(response.items[0].is_ok());
    assert!(response.items[1].is_ok());
    assert_eq!(response.items[2].errors.len(), 1);
    assert!(response.items[2].errors[0].message.contains("deadlock"));
    assert!(response.items[3].is_ok());
    assert!(response.items[4].is_ok());
}

#[tokio::test]
async fn test_zero_parallelism_is_clamped_not_deadlocked() {
    let engine = BatchEngine::new(
        Arc::new(staggered_backend()),
        Arc::new(staggered_catalog()),
    )
    .with_options(EngineOptions {
        max_parallelism: 0,
        ..EngineOptions::default()
    });

    let response = engine.execute(Some(staggered_request())).await;

    assert!(response.is_ok());
    assert_eq!(response.items.len(), 5);
}

#[tokio::test]
async fn test_parallel_with_transaction_warns_but_runs_by_default() {
    let backend = MockBackend::new();
    backend.script_affected("INSERT A", 1);
    let catalog = StaticCatalog::new().with_entry("T", "A", "INSERT A");
    let engine = BatchEngine::new(Arc::new(backend.clone()), Arc::new(catalog));

    let request = RequestEnvelope::new("m")
        .parallel(true)
        .transactional(true)
        .with_item(RequestItem::new("a", "T,A"));
    let response = engine.execute(Some(request)).await;

    assert!(response.is_ok());
    assert_eq!(backend.published_effects(), vec!["INSERT A".to_string()]);
}

#[tokio::test]
async fn test_parallel_with_transaction_rejected_when_configured() {
    let backend = MockBackend::new();
    let engine = BatchEngine::new(Arc::new(backend.clone()), Arc::new(StaticCatalog::new()))
        .with_options(EngineOptions {
            forbid_parallel_transactions: true,
            ..EngineOptions::default()
        });

    let request = RequestEnvelope::new("m")
        .parallel(true)
        .transactional(true)
        .with_item(RequestItem::new("a", "T,A"));
    let response = engine.execute(Some(request)).await;

    assert!(!response.is_ok());
    assert_eq!(response.errors[0].code, "protocol");
    assert!(response.items.is_empty());
    assert!(backend.executed_statements().is_empty());
}
