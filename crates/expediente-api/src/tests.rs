//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use expediente_core::{
  attention::ROLE_SOCIAL_WORK,
  persistence::ServiceConfig,
  store::CaseStore,
  subject::NewSubject,
};
use expediente_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

const INTERVIEW: &str = "entrevista_inicial_adolescente_pmspl";

async fn app() -> (Router, Arc<SqliteStore>, Uuid) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  store
    .add_attention_type(ROLE_SOCIAL_WORK.into(), "Trabajo social".into())
    .await
    .unwrap();
  let subject = store
    .add_subject(NewSubject {
      birth_date: chrono::NaiveDate::from_ymd_opt(2007, 2, 14),
      ..NewSubject::new("Josefa", "Valdés Moreno")
    })
    .await
    .unwrap();
  store.add_subject(NewSubject::new("Diego", "Fuentes")).await.unwrap();
  let router = api_router(store.clone(), ServiceConfig::default());
  (router, store, subject.subject_id)
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

fn interview(interviewer: &str, observations: &str) -> Value {
  json!({
    "form_type": INTERVIEW,
    "data": { "interviewer_name": interviewer, "observations": observations },
  })
}

// ── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_filters_by_name() {
  let (router, _, _) = app().await;
  let (status, body) = send(&router, "GET", "/subjects?q=VALD%C3%89S", None).await;
  assert_eq!(status, StatusCode::OK);
  let hits = body.as_array().unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0]["given_names"], "Josefa");

  let (_, body) = send(&router, "GET", "/subjects", None).await;
  assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn profile_includes_age() {
  let (router, _, id) = app().await;
  let (status, body) = send(&router, "GET", &format!("/subjects/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["surnames"], "Valdés Moreno");
  assert!(body["age"].as_u64().is_some());
}

#[tokio::test]
async fn unknown_subject_is_404() {
  let (router, _, _) = app().await;
  let (status, body) = send(&router, "GET", &format!("/subjects/{}", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("not found"));
}

// ── Forms ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_inserts_then_updates() {
  let (router, store, id) = app().await;
  let uri = format!("/subjects/{id}/forms/{INTERVIEW}");

  let (status, first) = send(&router, "PUT", &uri, Some(interview("Pía Lagos", "A"))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(first["attention_id"].is_string());

  let (status, second) = send(&router, "PUT", &uri, Some(interview("Pía Lagos", "B"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(second["form_id"], first["form_id"]);
  assert_eq!(second["created_at"], first["created_at"]);

  let (status, latest) = send(&router, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(latest["payload"]["data"]["observations"], "B");
  assert_eq!(store.list_forms(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_required_field_is_422_and_writes_nothing() {
  let (router, store, id) = app().await;
  let uri = format!("/subjects/{id}/forms/{INTERVIEW}");

  let (status, body) = send(&router, "PUT", &uri, Some(interview("  ", "sin nombre"))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["fields"][0]["field"], "interviewer_name");
  assert!(store.list_forms(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn body_of_another_form_type_is_400() {
  let (router, _, id) = app().await;
  let body = json!({ "form_type": "ficha_ingreso_seguridad", "data": { "officer_name": "Cabo Díaz" } });
  let (status, _) =
    send(&router, "PUT", &format!("/subjects/{id}/forms/{INTERVIEW}"), Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mistyped_field_is_a_json_400() {
  let (router, store, id) = app().await;
  let body = json!({
    "form_type": INTERVIEW,
    "data": { "interviewer_name": "Pía Lagos", "works": "sí" },
  });
  let (status, body) =
    send(&router, "PUT", &format!("/subjects/{id}/forms/{INTERVIEW}"), Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("expected a boolean"), "{body}");
  assert!(body.get("fields").is_none());
  assert!(store.list_forms(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_subject_id_is_a_json_400() {
  let (router, _, _) = app().await;
  for uri in ["/subjects/not-a-uuid", "/subjects/not-a-uuid/forms"] {
    let (status, body) = send(&router, "GET", uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    assert!(body["error"].is_string(), "{uri}: {body}");
  }
}

#[tokio::test]
async fn unknown_form_type_is_400() {
  let (router, _, id) = app().await;
  let (status, _) = send(&router, "GET", &format!("/subjects/{id}/forms/bitacora"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn latest_form_missing_is_404() {
  let (router, _, id) = app().await;
  let (status, _) =
    send(&router, "GET", &format!("/subjects/{id}/forms/{INTERVIEW}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_attention_type_is_409() {
  let (router, store, id) = app().await;
  let body = json!({
    "form_type": "evaluacion_psicologica",
    "data": { "psychologist_name": "Rocío Tapia" },
  });
  let (status, body) =
    send(&router, "PUT", &format!("/subjects/{id}/forms/evaluacion_psicologica"), Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("psicologia"));
  assert!(store.list_forms(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn case_file_lists_saved_forms() {
  let (router, _, id) = app().await;
  send(&router, "PUT", &format!("/subjects/{id}/forms/{INTERVIEW}"), Some(interview("Pía", "A")))
    .await;
  let (status, body) = send(&router, "GET", &format!("/subjects/{id}/forms"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["form_type"], INTERVIEW);
}

// ── Attention types ─────────────────────────────────────────────────────────

#[tokio::test]
async fn attention_type_by_role() {
  let (router, _, _) = app().await;
  let (status, body) = send(&router, "GET", "/attention-types/trabajo_social", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Trabajo social");

  let (status, _) = send(&router, "GET", "/attention-types/psicologia", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
