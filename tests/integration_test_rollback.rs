mod common;

use axum::http::StatusCode;
use common::{event_fields, parse_body, with_field, TestApp, PNG_BYTES};
use serde_json::json;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_slug_race_rolls_back_upload() {
    let app = TestApp::new().await;
    app.create_event(&event_fields("Race Day")).await;

    // a concurrent writer took the slug between slug generation and insert
    app.set_blind(true);
    let fields = with_field(event_fields("Race Day"), "date", "2026-06-01");
    let res = app.post_event(&fields, Some(("cover.png", "image/png", PNG_BYTES))).await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = parse_body(res).await;
    assert_eq!(body["code"], "DUPLICATE_KEY");
    assert_eq!(body["fields"], json!(["slug"]));

    let uploaded = app.blob_store.uploaded();
    assert_eq!(uploaded.len(), 2);
    assert_eq!(app.blob_store.deleted(), vec![uploaded[1].clone()]);
    assert_eq!(app.count_rows("events").await, 1);
}

#[tokio::test]
async fn test_identity_race_rolls_back_upload() {
    let app = TestApp::new().await;
    app.create_event(&event_fields("Twin Event")).await;

    app.set_blind(true);
    let res = app.post_event(&event_fields("Twin Event"), Some(("cover.png", "image/png", PNG_BYTES))).await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["code"], "DUPLICATE_KEY");

    let uploaded = app.blob_store.uploaded();
    assert_eq!(app.blob_store.deleted(), vec![uploaded[1].clone()]);
}

#[tokio::test]
async fn test_rollback_failure_keeps_original_error() {
    let app = TestApp::new().await;
    app.create_event(&event_fields("Sticky Asset")).await;

    app.set_blind(true);
    app.blob_store.fail_delete.store(true, Ordering::SeqCst);
    let fields = with_field(event_fields("Sticky Asset"), "venue", "Annex");
    let res = app.post_event(&fields, Some(("cover.png", "image/png", PNG_BYTES))).await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(parse_body(res).await["code"], "DUPLICATE_KEY");
    assert_eq!(app.blob_store.deleted().len(), 1);
}

#[tokio::test]
async fn test_successful_create_deletes_nothing() {
    let app = TestApp::new().await;
    app.create_event(&event_fields("Happy Path")).await;
    assert!(app.blob_store.deleted().is_empty());
}
