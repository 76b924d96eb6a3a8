use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub type Record = Map<String, Value>;

pub type Db = Arc<RwLock<HashMap<String, Vec<Record>>>>;

const MAX_PER_PAGE: u32 = 500;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    locked: Arc<HashSet<String>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub filter: Option<String>,
    pub expand: Option<String>,
    pub fields: Option<String>,
    pub skip_total: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ViewQuery {
    pub expand: Option<String>,
    pub fields: Option<String>,
}

type ApiFailure = (StatusCode, Json<Value>);

/// PocketBase-style error body.
pub fn error_body(status: StatusCode, message: &str) -> Value {
    json!({ "code": status.as_u16(), "message": message, "data": {} })
}

fn failure(status: StatusCode, message: &str) -> ApiFailure {
    (status, Json(error_body(status, message)))
}

pub fn app() -> Router {
    app_with_locked(&[])
}

/// Router whose `locked` collections answer every request with 403, the way
/// PocketBase treats collections restricted to superusers.
pub fn app_with_locked(locked: &[&str]) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(HashMap::new())),
        locked: Arc::new(locked.iter().map(|name| name.to_string()).collect()),
    };
    Router::new()
        .route(
            "/api/collections/{collection}/records",
            get(list_records).post(create_record),
        )
        .route("/api/collections/{collection}/records/{id}", get(view_record))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_locked(listener: TcpListener, locked: &[&str]) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_locked(locked)).await
}

fn check_access(state: &AppState, collection: &str) -> Result<(), ApiFailure> {
    if state.locked.contains(collection) {
        return Err(failure(
            StatusCode::FORBIDDEN,
            "Only superusers can perform this action.",
        ));
    }
    Ok(())
}

async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiFailure> {
    check_access(&state, &collection)?;
    debug!(%collection, filter = ?query.filter, expand = ?query.expand, "list ignores filter and expand");

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(30).clamp(1, MAX_PER_PAGE);
    let skip_total = matches!(query.skip_total.as_deref(), Some("1") | Some("true"));

    let db = state.db.read().await;
    let mut records: Vec<Record> = db.get(&collection).cloned().unwrap_or_default();
    drop(db);

    if let Some(sort) = query.sort.as_deref() {
        sort_records(&mut records, sort);
    }

    let total = records.len();
    let start = (page as usize - 1).saturating_mul(per_page as usize);
    let items: Vec<Value> = records
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .map(|record| Value::Object(project(record, query.fields.as_deref())))
        .collect();

    let (total_items, total_pages) = if skip_total {
        (-1, -1)
    } else {
        let pages = total.div_ceil(per_page as usize);
        (total as i64, pages as i64)
    };

    Ok(Json(json!({
        "page": page,
        "perPage": per_page,
        "totalItems": total_items,
        "totalPages": total_pages,
        "items": items,
    })))
}

async fn view_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Value>, ApiFailure> {
    check_access(&state, &collection)?;
    debug!(%collection, %id, expand = ?query.expand, "view record");

    let db = state.db.read().await;
    db.get(&collection)
        .and_then(|records| records.iter().find(|r| r.get("id") == Some(&Value::String(id.clone()))))
        .cloned()
        .map(|record| Json(Value::Object(project(record, query.fields.as_deref()))))
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "The requested resource wasn't found."))
}

async fn create_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ViewQuery>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, ApiFailure> {
    check_access(&state, &collection)?;

    let Value::Object(mut record) = input else {
        return Err(failure(StatusCode::BAD_REQUEST, "Failed to create record."));
    };

    let mut db = state.db.write().await;
    let records = db.entry(collection.clone()).or_default();

    let id = match record.get("id") {
        None => new_record_id(),
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(_) => return Err(failure(StatusCode::BAD_REQUEST, "Failed to create record.")),
    };
    if records.iter().any(|r| r.get("id") == Some(&Value::String(id.clone()))) {
        return Err(failure(StatusCode::BAD_REQUEST, "Failed to create record."));
    }

    record.insert("id".to_string(), Value::String(id.clone()));
    record.insert("collectionName".to_string(), Value::String(collection.clone()));
    records.push(record.clone());
    info!(%collection, %id, "record created");

    Ok(Json(Value::Object(project(record, query.fields.as_deref()))))
}

/// 15 lowercase alphanumerics, the shape of PocketBase record ids.
pub fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()[..15].to_string()
}

/// Keep only the comma separated top-level `fields`; `*` keeps everything.
fn project(record: Record, fields: Option<&str>) -> Record {
    let Some(fields) = fields else {
        return record;
    };
    let wanted: HashSet<&str> = fields.split(',').map(str::trim).collect();
    if wanted.contains("*") {
        return record;
    }
    record
        .into_iter()
        .filter(|(key, _)| wanted.contains(key.as_str()))
        .collect()
}

/// Sort by a single field; a leading `-` sorts descending.
fn sort_records(records: &mut [Record], sort: &str) {
    let (field, descending) = match sort.strip_prefix('-') {
        Some(field) => (field, true),
        None => (sort.strip_prefix('+').unwrap_or(sort), false),
    };
    records.sort_by(|a, b| {
        let ordering = compare_values(a.get(field), b.get(field));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
