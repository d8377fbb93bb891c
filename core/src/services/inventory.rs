//! Distributor stock levels.
//!
//! Stock arithmetic happens server-side; `adjust` only reports a movement.

use serde::Serialize;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Query};

pub const INVENTORY: Resource = Resource::new("/inventory");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    pub distributor_id: Option<String>,
    pub product_id: Option<String>,
    pub low_stock: Option<bool>,
    pub page: Page,
}

impl InventoryFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("distributorId", self.distributor_id.as_deref())
            .push("productId", self.product_id.as_deref())
            .push("lowStock", self.low_stock);
        self.page.extend(query)
    }
}

/// A stock movement: positive `quantity` adds stock, negative removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub distributor_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub reason: String,
}

pub fn list(filter: &InventoryFilter) -> HttpRequest {
    INVENTORY.list(filter.query())
}

pub fn get(id: &str) -> HttpRequest {
    INVENTORY.get(id)
}

/// Aggregated stock per distributor.
pub fn summary(distributor_id: Option<&str>) -> HttpRequest {
    INVENTORY.view("summary", Query::new().push("distributorId", distributor_id))
}

pub fn adjust(adjustment: &StockAdjustment) -> Result<HttpRequest, ApiError> {
    HttpRequest::json(
        HttpMethod::Post,
        format!("{}/adjust", INVENTORY.base()),
        adjustment,
    )
}

/// Movement history, newest first.
pub fn movements(filter: &InventoryFilter) -> HttpRequest {
    INVENTORY.view("movements", filter.query())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_and_movements_paths() {
        assert_eq!(summary(None).target(), "/inventory/summary");
        let filter = InventoryFilter {
            low_stock: Some(true),
            ..InventoryFilter::default()
        };
        assert_eq!(movements(&filter).target(), "/inventory/movements?lowStock=true");
    }

    #[test]
    fn adjust_posts_camel_case_body() {
        let request = adjust(&StockAdjustment {
            distributor_id: "d1".into(),
            product_id: "p1".into(),
            quantity: -3,
            reason: "damaged".into(),
        })
        .unwrap();
        assert_eq!(request.path, "/inventory/adjust");
        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["distributorId"], "d1");
        assert_eq!(body["quantity"], -3);
    }
}
