//! End-to-end envelope execution tests.

use std::sync::Arc;
use std::time::Duration;

use db_courier::backend::{ColumnInfo, MockBackend, Parameter, Value};
use db_courier::catalog::StaticCatalog;
use db_courier::protocol::{RequestEnvelope, RequestItem, ResponseFormat};
use db_courier::BatchEngine;
use pretty_assertions::assert_eq;

fn orders_catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_entry("Orders", "GetPage", "SELECT id FROM orders ORDER BY id")
        .with_entry("Orders", "Count", "SELECT COUNT(*) FROM orders")
        .with_entry("Orders", "Purge", "DELETE FROM orders WHERE archived")
}

#[tokio::test]
async fn test_zero_item_envelope_round_trip() {
    let backend = MockBackend::new();
    let engine = BatchEngine::new(Arc::new(backend.clone()), Arc::new(orders_catalog()));

    let response = engine.execute(Some(RequestEnvelope::new("empty-1"))).await;

    assert!(response.is_ok());
    assert_eq!(response.message_id, "empty-1");
    assert!(response.items.is_empty());
    assert!(backend.executed_statements().is_empty());
}

#[tokio::test]
async fn test_absent_request_yields_protocol_error() {
    let backend = MockBackend::new();
    let engine = BatchEngine::new(Arc::new(backend), Arc::new(StaticCatalog::new()));

    let response = engine.execute(None).await;

    assert!(response.message_id.is_empty());
    assert!(response.items.is_empty());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code, "protocol");
}

#[tokio::test]
async fn test_three_windowed_pages_of_one_query() {
    let backend = MockBackend::new();
    backend.script_rows(
        "SELECT id FROM orders ORDER BY id",
        vec![ColumnInfo::new("id", "integer")],
        (0..25).map(|i| vec![Value::Int(i)]).collect(),
    );
    let engine = BatchEngine::new(Arc::new(backend), Arc::new(orders_catalog()));

    let mut request = RequestEnvelope::new("pages");
    for (key, first) in [("p0", 0u64), ("p1", 10), ("p2", 20)] {
        request = request.with_item(
            RequestItem::new(key, "Orders,GetPage")
                .with_format(ResponseFormat::RowSet)
                .with_window(first, 10),
        );
    }

    let response = engine.execute(Some(request)).await;

    assert!(response.is_ok());
    assert_eq!(response.items.len(), 3);

    let page = |i: usize| response.items[i].row_set.as_ref().unwrap();
    assert_eq!(page(0).row_count(), 10);
    assert_eq!(page(0).rows[0], vec![Value::Int(0)]);
    assert_eq!(page(1).row_count(), 10);
    assert_eq!(page(1).rows[0], vec![Value::Int(10)]);
    // Last page is short: only 5 rows remain past offset 20.
    assert_eq!(page(2).row_count(), 5);
    assert_eq!(page(2).rows[4], vec![Value::Int(24)]);
}

#[tokio::test]
async fn test_mixed_item_kinds_in_one_envelope() {
    let backend = MockBackend::new();
    backend.script_rows(
        "SELECT id FROM orders ORDER BY id",
        vec![ColumnInfo::new("id", "integer")],
        vec![vec![Value::Int(1)]],
    );
    backend.script_scalar("SELECT COUNT(*) FROM orders", 7i64);
    backend.script_affected("DELETE FROM orders WHERE archived", 3);
    let engine = BatchEngine::new(Arc::new(backend), Arc::new(orders_catalog()));

    let request = RequestEnvelope::new("mixed")
        .with_item(RequestItem::new("rows", "Orders,GetPage").with_format(ResponseFormat::RowSet))
        .with_item(RequestItem::new("count", "Orders,Count").with_format(ResponseFormat::Scalar))
        .with_item(RequestItem::new("purge", "Orders,Purge"));

    let response = engine.execute(Some(request)).await;

    assert!(response.is_ok());
    assert_eq!(response.items[0].row_set.as_ref().unwrap().row_count(), 1);
    assert_eq!(response.items[1].result_value, Some(Value::Int(7)));
    assert_eq!(response.items[2].result_value, Some(Value::Int(3)));
}

#[tokio::test]
async fn test_catalog_miss_is_inert_not_error() {
    let backend = MockBackend::new();
    let engine = BatchEngine::new(Arc::new(backend.clone()), Arc::new(orders_catalog()));

    let request = RequestEnvelope::new("m")
        .with_item(RequestItem::new("ghost", "Orders,DoesNotExist"));
    let response = engine.execute(Some(request)).await;

    assert!(response.is_ok());
    let item = &response.items[0];
    assert!(item.is_ok());
    assert!(item.query.is_empty());
    assert!(item.result_value.is_none());
    assert!(item.row_set.is_none());
    assert!(backend.executed_statements().is_empty());
}

#[tokio::test]
async fn test_item_failure_is_isolated_and_timed() {
    let backend = MockBackend::new();
    backend.script_scalar("SELECT COUNT(*) FROM orders", 7i64);
    backend.script_failure("SELECT id FROM orders ORDER BY id", "relation missing");
    backend.script_delay("SELECT id FROM orders ORDER BY id", 5);
    let engine = BatchEngine::new(Arc::new(backend), Arc::new(orders_catalog()));

    let request = RequestEnvelope::new("m")
        .with_item(RequestItem::new("bad", "Orders,GetPage").with_format(ResponseFormat::RowSet))
        .with_item(RequestItem::new("good", "Orders,Count").with_format(ResponseFormat::Scalar));
    let response = engine.execute(Some(request)).await;

    assert!(response.is_ok());

    let bad = &response.items[0];
    assert_eq!(bad.errors.len(), 1);
    assert_eq!(bad.errors[0].code, "backend");
    assert!(bad.execution_time >= Duration::from_millis(5));

    let good = &response.items[1];
    assert!(good.is_ok());
    assert_eq!(good.result_value, Some(Value::Int(7)));
}

#[tokio::test]
async fn test_duplicate_parameter_names_rejected_per_item() {
    let backend = MockBackend::new();
    let engine = BatchEngine::new(Arc::new(backend.clone()), Arc::new(orders_catalog()));

    let request = RequestEnvelope::new("m").with_item(
        RequestItem::new("dup", "Orders,Count")
            .with_format(ResponseFormat::Scalar)
            .with_parameter(Parameter::new("year", 2025))
            .with_parameter(Parameter::new("year", 2026)),
    );
    let response = engine.execute(Some(request)).await;

    assert!(response.is_ok());
    let item = &response.items[0];
    assert_eq!(item.errors.len(), 1);
    assert_eq!(item.errors[0].code, "statement");
    assert!(item.errors[0].message.contains("year"));
    assert!(backend.executed_statements().is_empty());
}

#[tokio::test]
async fn test_response_echoes_ids_and_query_text() {
    let backend = MockBackend::new();
    backend.script_scalar("SELECT COUNT(*) FROM orders", 1i64);
    let engine = BatchEngine::new(Arc::new(backend), Arc::new(orders_catalog()));

    let request = RequestEnvelope::new("echo").with_item(
        RequestItem::new("c1", "Orders,Count").with_format(ResponseFormat::Scalar),
    );
    let response = engine.execute(Some(request)).await;

    assert_eq!(response.message_id, "echo");
    assert_eq!(response.items[0].id, "c1");
    assert_eq!(response.items[0].method, "Orders,Count");
    assert_eq!(response.items[0].query, "SELECT COUNT(*) FROM orders");
}

#[tokio::test]
async fn test_envelope_serde_round_trip() {
    let request = RequestEnvelope::new("wire")
        .transactional(true)
        .with_item(
            RequestItem::new("a", "Orders,Count")
                .with_format(ResponseFormat::Scalar)
                .with_parameter(Parameter::new("year", 2026)),
        );

    let json = serde_json::to_string(&request).unwrap();
    let back: RequestEnvelope = serde_json::from_str(&json).unwrap();

    assert_eq!(back.message_id, "wire");
    assert!(back.transactional);
    assert_eq!(back.items[0].parameters[0].name, "year");
}
