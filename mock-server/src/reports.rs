//! Inventory views and analytics reports computed from stored collections.

use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::collections::{matches, paginate};
use crate::{reply, AppState};

pub(crate) fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(inventory_summary))
        .route("/adjust", post(adjust))
        .route("/movements", get(movements))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Adjustment {
    distributor_id: String,
    product_id: String,
    quantity: i64,
    #[serde(default)]
    reason: String,
}

fn number(item: &Value, key: &str) -> f64 {
    item.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn text<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Apply a stock movement. Taking stock below zero is a business failure
/// reported in the envelope, not an HTTP error.
async fn adjust(State(state): State<AppState>, Json(adjustment): Json<Adjustment>) -> Response {
    let mut collections = state.inner.collections.write().await;
    let stock = collections.entry("inventory".to_string()).or_default();
    let position = stock.iter().position(|item| {
        text(item, "distributorId") == adjustment.distributor_id
            && text(item, "productId") == adjustment.product_id
    });
    let current = position.map_or(0, |index| {
        stock[index].get("quantity").and_then(Value::as_i64).unwrap_or(0)
    });
    let updated = current + adjustment.quantity;
    if updated < 0 {
        return reply(
            StatusCode::OK,
            json!({ "success": false, "message": "Insufficient stock" }),
        );
    }

    let item = match position {
        Some(index) => {
            stock[index]["quantity"] = json!(updated);
            stock[index].clone()
        }
        None => {
            let item = json!({
                "id": uuid::Uuid::new_v4().to_string(),
                "distributorId": adjustment.distributor_id,
                "productId": adjustment.product_id,
                "quantity": updated,
                "reorderLevel": 0,
            });
            stock.push(item.clone());
            item
        }
    };
    drop(collections);

    state.inner.movements.write().await.insert(
        0,
        json!({
            "distributorId": adjustment.distributor_id,
            "productId": adjustment.product_id,
            "quantity": adjustment.quantity,
            "reason": adjustment.reason,
            "balance": updated,
        }),
    );
    info!(
        distributor = %adjustment.distributor_id,
        product = %adjustment.product_id,
        delta = adjustment.quantity,
        "stock adjusted"
    );
    reply(StatusCode::OK, json!({ "success": true, "data": item }))
}

async fn inventory_summary(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let collections = state.inner.collections.read().await;
    let mut totals: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for item in collections.get("inventory").into_iter().flatten() {
        let distributor = text(item, "distributorId");
        if params
            .get("distributorId")
            .is_some_and(|wanted| wanted != distributor)
        {
            continue;
        }
        let entry = totals.entry(distributor.to_string()).or_default();
        entry.0 += 1;
        entry.1 += number(item, "quantity");
    }
    let data: Vec<Value> = totals
        .into_iter()
        .map(|(distributor, (products, quantity))| {
            json!({ "distributorId": distributor, "products": products, "quantity": quantity })
        })
        .collect();
    reply(StatusCode::OK, json!({ "success": true, "data": data }))
}

async fn movements(
    State(state): State<AppState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Response {
    params.remove("lowStock");
    let history: Vec<Value> = state
        .inner
        .movements
        .read()
        .await
        .iter()
        .filter(|movement| matches(movement, &params))
        .cloned()
        .collect();
    reply(
        StatusCode::OK,
        json!({ "success": true, "data": paginate(history, &params) }),
    )
}

fn in_range(order: &Value, params: &HashMap<String, String>) -> bool {
    let date = text(order, "orderDate");
    let after_start = params.get("startDate").is_none_or(|start| date >= start.as_str());
    let before_end = params.get("endDate").is_none_or(|end| date <= end.as_str());
    let distributor = params
        .get("distributorId")
        .is_none_or(|wanted| text(order, "distributorId") == wanted);
    after_start && before_end && distributor
}

fn stored<'a>(collections: &'a HashMap<String, Vec<Value>>, name: &str) -> Vec<&'a Value> {
    collections.get(name).into_iter().flatten().collect()
}

fn count_where(list: &[&Value], key: &str, value: &str) -> usize {
    list.iter().filter(|item| text(item, key) == value).count()
}

/// Orders per `YYYY-MM` period: (orders, units, revenue).
fn by_period(orders: &[&Value]) -> BTreeMap<String, (u64, f64, f64)> {
    let mut periods: BTreeMap<String, (u64, f64, f64)> = BTreeMap::new();
    for order in orders {
        let period: String = text(order, "orderDate").chars().take(7).collect();
        let entry = periods.entry(period).or_default();
        entry.0 += 1;
        entry.1 += number(order, "quantity");
        entry.2 += number(order, "amount");
    }
    periods
}

pub(crate) async fn analytics(
    State(state): State<AppState>,
    Path(report): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let collections = state.inner.collections.read().await;
    let items = |name: &str| stored(&collections, name);
    let orders: Vec<&Value> = items("orders")
        .into_iter()
        .filter(|order| in_range(order, &params))
        .collect();
    let claims = items("damage-claims");

    let data = match report.as_str() {
        "dashboard" => json!({
            "totalOrders": orders.len(),
            "totalRevenue": orders.iter().map(|o| number(o, "amount")).sum::<f64>(),
            "totalDistributors": items("distributors").len(),
            "totalStaff": items("staff").len(),
            "pendingClaims": count_where(&claims, "status", "pending"),
        }),
        "sales" => {
            let periods = by_period(&orders);
            json!({
                "summary": {
                    "orders": orders.len(),
                    "revenue": orders.iter().map(|o| number(o, "amount")).sum::<f64>(),
                },
                "byPeriod": periods
                    .into_iter()
                    .map(|(period, (count, units, revenue))| json!({
                        "period": period,
                        "orders": count,
                        "units": units,
                        "revenue": revenue,
                    }))
                    .collect::<Vec<_>>(),
            })
        }
        "trends" => {
            let periods = by_period(&orders);
            let counts: Vec<_> = periods.values().map(|p| p.0).collect();
            let revenue: Vec<_> = periods.values().map(|p| p.2).collect();
            json!({
                "labels": periods.keys().collect::<Vec<_>>(),
                "datasets": [
                    { "label": "Orders", "data": counts },
                    { "label": "Revenue", "data": revenue },
                ],
            })
        }
        "distributors" => Value::Array(
            items("distributors")
                .into_iter()
                .map(|distributor| {
                    let id = text(distributor, "id");
                    let theirs: Vec<&Value> = orders
                        .iter()
                        .copied()
                        .filter(|order| text(order, "distributorId") == id)
                        .collect();
                    let pending = claims
                        .iter()
                        .filter(|claim| {
                            text(claim, "distributorId") == id && text(claim, "status") == "pending"
                        })
                        .count();
                    json!({
                        "distributor": {
                            "name": distributor.get("name"),
                            "code": distributor.get("code"),
                            "region": distributor.get("region"),
                        },
                        "totalOrders": theirs.len(),
                        "totalRevenue": theirs.iter().map(|o| number(o, "amount")).sum::<f64>(),
                        "pendingClaims": pending,
                    })
                })
                .collect(),
        ),
        "products" => Value::Array(
            items("products")
                .into_iter()
                .map(|product| {
                    let id = text(product, "id");
                    let sold: Vec<&Value> = orders
                        .iter()
                        .copied()
                        .filter(|order| text(order, "productId") == id)
                        .collect();
                    json!({
                        "product": { "name": product.get("name"), "sku": product.get("sku") },
                        "unitsSold": sold.iter().map(|o| number(o, "quantity")).sum::<f64>(),
                        "revenue": sold.iter().map(|o| number(o, "amount")).sum::<f64>(),
                    })
                })
                .collect(),
        ),
        "staff" => {
            let tasks = items("tasks");
            Value::Array(
                items("staff")
                    .into_iter()
                    .map(|member| {
                        let id = text(member, "id");
                        let completed = tasks
                            .iter()
                            .filter(|task| {
                                text(task, "assignedTo") == id
                                    && text(task, "status") == "completed"
                            })
                            .count();
                        json!({
                            "staff": {
                                "name": member.get("name"),
                                "email": member.get("email"),
                                "role": member.get("role"),
                            },
                            "tasksCompleted": completed,
                            "activities": count_where(&items("staff-activities"), "staffId", id),
                            "ordersBooked": count_where(&orders, "staffId", id),
                        })
                    })
                    .collect(),
            )
        }
        "damage-claims" => Value::Array(claims.into_iter().cloned().collect()),
        _ => {
            return reply(
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": format!("Unknown report: {report}") }),
            )
        }
    };
    reply(StatusCode::OK, json!({ "success": true, "data": data }))
}
