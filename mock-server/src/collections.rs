//! Generic in-memory collection backing every resource path.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::{reply, AppState, Collection};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(fetch).put(update).delete(remove))
        .route("/{id}/{action}", patch(action).post(action))
}

/// Query keys that control paging or search rather than filter on fields.
const RESERVED: &[&str] = &["page", "limit", "search"];

fn not_found(collection: &str) -> Response {
    reply(
        StatusCode::NOT_FOUND,
        json!({ "success": false, "message": format!("{collection} item not found") }),
    )
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn matches(item: &Value, params: &HashMap<String, String>) -> bool {
    let field_filters = params
        .iter()
        .filter(|(key, _)| !RESERVED.contains(&key.as_str()))
        .all(|(key, expected)| item.get(key).and_then(scalar_text).as_deref() == Some(expected));
    let search = params.get("search").map(|s| s.to_lowercase());
    let searched = search.is_none_or(|needle| {
        item.as_object().is_some_and(|fields| {
            fields
                .values()
                .filter_map(Value::as_str)
                .any(|text| text.to_lowercase().contains(&needle))
        })
    });
    field_filters && searched
}

/// Apply `page`/`limit` when both parse; otherwise return everything.
pub(crate) fn paginate(items: Vec<Value>, params: &HashMap<String, String>) -> Vec<Value> {
    let page = params.get("page").and_then(|p| p.parse::<usize>().ok());
    let limit = params.get("limit").and_then(|l| l.parse::<usize>().ok());
    match (page, limit) {
        (Some(page), Some(limit)) if page > 0 && limit > 0 => items
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect(),
        _ => items,
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(Collection(name)): Extension<Collection>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let collections = state.inner.collections.read().await;
    let matching: Vec<Value> = collections
        .get(name)
        .into_iter()
        .flatten()
        .filter(|item| matches(item, &params))
        .cloned()
        .collect();
    let total = matching.len();
    let page = params.get("page").cloned().unwrap_or_else(|| "1".to_string());
    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "data": paginate(matching, &params),
            "total": total,
            "page": page,
        }),
    )
}

async fn create(
    State(state): State<AppState>,
    Extension(Collection(name)): Extension<Collection>,
    Json(body): Json<Value>,
) -> Response {
    let Value::Object(mut fields) = body else {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "message": "Request body must be an object" }),
        );
    };
    let id = Uuid::new_v4().to_string();
    fields.insert("id".to_string(), Value::String(id.clone()));
    let item = Value::Object(fields);

    state
        .inner
        .collections
        .write()
        .await
        .entry(name.to_string())
        .or_default()
        .push(item.clone());
    info!(collection = name, %id, "created");
    reply(
        StatusCode::CREATED,
        json!({ "success": true, "data": item, "message": "Created" }),
    )
}

async fn fetch(
    State(state): State<AppState>,
    Extension(Collection(name)): Extension<Collection>,
    Path(id): Path<String>,
) -> Response {
    let collections = state.inner.collections.read().await;
    match find(collections.get(name), &id) {
        Some(item) => reply(StatusCode::OK, json!({ "success": true, "data": item })),
        None => not_found(name),
    }
}

async fn update(
    State(state): State<AppState>,
    Extension(Collection(name)): Extension<Collection>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Value::Object(changes) = body else {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "message": "Request body must be an object" }),
        );
    };
    let mut collections = state.inner.collections.write().await;
    let Some(item) = find_mut(collections.get_mut(name), &id) else {
        return not_found(name);
    };
    merge(item, changes);
    reply(StatusCode::OK, json!({ "success": true, "data": item.clone() }))
}

async fn remove(
    State(state): State<AppState>,
    Extension(Collection(name)): Extension<Collection>,
    Path(id): Path<String>,
) -> Response {
    let mut collections = state.inner.collections.write().await;
    let Some(items) = collections.get_mut(name) else {
        return not_found(name);
    };
    let before = items.len();
    items.retain(|item| item.get("id").and_then(Value::as_str) != Some(id.as_str()));
    if items.len() == before {
        return not_found(name);
    }
    info!(collection = name, %id, "deleted");
    reply(StatusCode::OK, json!({ "success": true, "message": "Deleted" }))
}

/// `PATCH|POST /{id}/{action}`: merge the body into the item and record the
/// action, covering status changes, reviews, assignments, and comments.
async fn action(
    State(state): State<AppState>,
    Extension(Collection(name)): Extension<Collection>,
    Path((id, action)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let parsed = if body.is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_slice::<Value>(&body)
    };
    let changes = match parsed {
        Ok(Value::Object(fields)) => fields,
        Ok(Value::Null) => Map::new(),
        _ => {
            return reply(
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": "Request body must be an object" }),
            )
        }
    };
    let mut collections = state.inner.collections.write().await;
    let Some(item) = find_mut(collections.get_mut(name), &id) else {
        return not_found(name);
    };
    if action == "comments" {
        if let Value::Object(fields) = &mut *item {
            let comments = fields
                .entry("comments")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(list) = comments {
                list.push(Value::Object(changes));
            }
        }
    } else {
        merge(item, changes);
    }
    if let Value::Object(fields) = &mut *item {
        fields.insert("lastAction".to_string(), Value::String(action.clone()));
    }
    info!(collection = name, %id, %action, "action applied");
    reply(StatusCode::OK, json!({ "success": true, "data": item.clone() }))
}

fn find<'a>(items: Option<&'a Vec<Value>>, id: &str) -> Option<&'a Value> {
    items?
        .iter()
        .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
}

fn find_mut<'a>(items: Option<&'a mut Vec<Value>>, id: &str) -> Option<&'a mut Value> {
    items?
        .iter_mut()
        .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
}

fn merge(item: &mut Value, changes: Map<String, Value>) {
    if let Value::Object(fields) = &mut *item {
        for (key, value) in changes {
            if key != "id" {
                fields.insert(key, value);
            }
        }
    }
}
