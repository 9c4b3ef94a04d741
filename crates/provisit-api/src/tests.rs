use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use provisit_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store), 14)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn create_supplier(app: &Router, body: Value) -> Value {
  let (status, created) = send(app, "POST", "/suppliers", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{created}");
  created
}

#[tokio::test]
async fn health_endpoints_respond() {
  let app = app().await;

  let (status, body) = send(&app, "GET", "/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "ok": true }));

  let (status, body) = send(&app, "GET", "/dbhealth", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["counts"], json!({ "suppliers": 0, "visits": 0, "attendance": 0 }));
}

// ─── Suppliers ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn registering_a_supplier_schedules_visits() {
  let app = app().await;
  let created = create_supplier(
    &app,
    json!({
      "name": "Bimbo",
      "pattern": { "kind": "weekly", "days": [1, 3] },
      "start_date": "2024-01-01",
    }),
  )
  .await;

  assert_eq!(created["supplier"]["name"], "Bimbo");
  let dates: Vec<&str> = created["visits"]
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v["date"].as_str().unwrap())
    .collect();
  assert_eq!(dates, [
    "2024-01-01",
    "2024-01-03",
    "2024-01-08",
    "2024-01-10",
    "2024-01-15",
  ]);

  let id = created["supplier"]["supplier_id"].as_i64().unwrap();
  let (status, fetched) = send(&app, "GET", &format!("/suppliers/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["pattern"], json!({ "kind": "weekly", "days": [1, 3] }));
}

#[tokio::test]
async fn invalid_supplier_is_rejected() {
  let app = app().await;

  let (status, body) = send(&app, "POST", "/suppliers", Some(json!({ "name": " x " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (status, _) = send(
    &app,
    "POST",
    "/suppliers",
    Some(json!({ "name": "Lala", "pattern": { "kind": "weekly", "days": [] } })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn supplier_update_and_delete() {
  let app = app().await;
  let created = create_supplier(&app, json!({ "name": "Coca" })).await;
  let id = created["supplier"]["supplier_id"].as_i64().unwrap();
  let uri = format!("/suppliers/{id}");

  let (status, _) = send(&app, "PATCH", &uri, Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, updated) =
    send(&app, "PATCH", &uri, Some(json!({ "name": "Coca-Cola", "visit_type": "Preventa" })))
      .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["name"], "Coca-Cola");
  assert_eq!(updated["visit_type"], "Preventa");

  let (status, _) = send(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, body) = send(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());

  let (status, _) = send(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Visits ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn visit_listing_backfills_only_on_request() {
  let app = app().await;
  create_supplier(
    &app,
    json!({ "name": "Pan", "pattern": { "kind": "daily" }, "start_date": "2024-01-01" }),
  )
  .await;

  let (status, plain) = send(&app, "GET", "/visits?date=2025-06-01", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(plain, json!([]));

  let (_, backfilled) = send(&app, "GET", "/visits?date=2025-06-01&autogen=1", None).await;
  assert_eq!(backfilled.as_array().unwrap().len(), 1);
  assert_eq!(backfilled[0]["visit_type"], "Visita Normal");
}

#[tokio::test]
async fn manual_visit_requires_known_supplier() {
  let app = app().await;
  let created = create_supplier(&app, json!({ "name": "Pan" })).await;
  let id = created["supplier"]["supplier_id"].as_i64().unwrap();

  let (status, visit) = send(
    &app,
    "POST",
    "/visits",
    Some(json!({ "supplier_id": id, "date": "2024-03-10", "visit_type": "Preventa" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(visit["date"], "2024-03-10");

  let (status, _) = send(
    &app,
    "POST",
    "/visits",
    Some(json!({ "supplier_id": id + 100, "date": "2024-03-10" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_creation_is_idempotent() {
  let app = app().await;
  create_supplier(&app, json!({ "name": "Pan" })).await;
  create_supplier(&app, json!({ "name": "Leche" })).await;

  let body = json!({ "date": "2024-03-10", "visit_type": "Preventa" });
  let (status, first) = send(&app, "POST", "/visits/all-suppliers", Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(first.as_array().unwrap().len(), 2);

  let (_, second) = send(&app, "POST", "/visits/all-suppliers", Some(body)).await;
  assert_eq!(second, json!([]));
}

// ─── Agenda and attendance ────────────────────────────────────────────────────

#[tokio::test]
async fn presale_attendance_provisions_delivery() {
  let app = app().await;
  create_supplier(
    &app,
    json!({
      "name": "Bebidas",
      "pattern": { "kind": "daily" },
      "visit_type": "Preventa",
      "start_date": "2024-03-10",
    }),
  )
  .await;

  let (status, agenda) = send(&app, "GET", "/agenda?date=2024-03-10", None).await;
  assert_eq!(status, StatusCode::OK);
  let entry = &agenda[0];
  assert_eq!(entry["supplier_name"], "Bebidas");
  assert_eq!(entry["visit_type"], "Preventa");
  assert_eq!(entry["action_label"], "Pedir");
  assert_eq!(entry["state"], json!({ "state": "unrecorded" }));
  let visit_id = entry["visit"]["visit_id"].as_i64().unwrap();

  let (status, recorded) = send(
    &app,
    "POST",
    "/attendance",
    Some(json!({ "visit_id": visit_id, "attended": true })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(recorded["attendance"]["status"], "Pedir");
  assert_eq!(recorded["attendance"]["did_preorder"], true);
  assert_eq!(recorded["delivery_visit"]["date"], "2024-03-11");
  assert_eq!(recorded["delivery_visit"]["visit_type"], "Entrega de Pedido");

  let (_, agenda) = send(&app, "GET", "/agenda?date=2024-03-10", None).await;
  assert_eq!(agenda[0]["state"]["state"], "recorded");
  assert_eq!(agenda[0]["state"]["attended"], true);

  let (_, history) = send(&app, "GET", "/attendance", None).await;
  assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn attendance_for_unknown_visit_is_not_found() {
  let app = app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/attendance",
    Some(json!({ "visit_id": 42, "attended": true })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("42"));
}

// ─── Reports ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn report_rejects_inverted_range() {
  let app = app().await;
  let (status, _) = send(&app, "GET", "/reports?start=2024-03-11&end=2024-03-10", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_lists_backfilled_visits() {
  let app = app().await;
  create_supplier(
    &app,
    json!({ "name": "Pan", "pattern": { "kind": "daily" }, "start_date": "2030-01-01" }),
  )
  .await;

  let (status, rows) = send(&app, "GET", "/reports?start=2024-03-10&end=2024-03-12", None).await;
  assert_eq!(status, StatusCode::OK);
  let rows = rows.as_array().unwrap();
  assert_eq!(rows.len(), 3);
  assert_eq!(rows[0]["date"], "2024-03-10");
  assert_eq!(rows[0]["supplier_name"], "Pan");
  assert_eq!(rows[0]["attended"], "No");
  assert_eq!(rows[0]["did_preorder"], "—");
  assert_eq!(rows[2]["date"], "2024-03-12");
}

// ─── Backup ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_then_import_into_fresh_store() {
  let source = app().await;
  create_supplier(
    &source,
    json!({ "name": "Pan", "pattern": { "kind": "daily" }, "start_date": "2024-03-10" }),
  )
  .await;
  let (status, snapshot) = send(&source, "GET", "/admin/export", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(snapshot["suppliers"].as_array().unwrap().len(), 1);
  assert_eq!(snapshot["visits"].as_array().unwrap().len(), 15);

  let target = app().await;
  let (status, counts) = send(&target, "POST", "/admin/import", Some(snapshot)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(counts, json!({ "suppliers": 1, "visits": 15, "attendance": 0 }));
}

#[tokio::test]
async fn import_rejects_invalid_snapshot() {
  let app = app().await;
  create_supplier(&app, json!({ "name": "Pan" })).await;
  let snapshot = json!({
    "suppliers": [{
      "supplier_id": 1,
      "name": "Leche",
      "pattern": { "kind": "everyNDays", "n": 0, "start_date": "2024-01-01" },
      "visit_type": null,
      "created_at": "2024-01-01T00:00:00Z",
    }],
  });

  let (status, body) = send(&app, "POST", "/admin/import", Some(snapshot)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (_, suppliers) = send(&app, "GET", "/suppliers", None).await;
  assert_eq!(suppliers[0]["name"], "Pan");
}

// ─── Malformed requests ───────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_requests_get_json_errors() {
  let app = app().await;

  let req = Request::builder()
    .method("POST")
    .uri("/attendance")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{\"visit_id\": 1,"))
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert!(body["error"].is_string());

  let (status, body) =
    send(&app, "GET", "/reports?start=yesterday&end=2024-03-10", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (status, body) = send(&app, "GET", "/suppliers/abc", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}
