//! Distributor orders.

use serde::Serialize;
use serde_json::json;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Query};

pub const ORDERS: Resource = Resource::new("/orders");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub search: Option<String>,
    pub distributor_id: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Page,
}

impl OrderFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("search", self.search.as_deref())
            .push("distributorId", self.distributor_id.as_deref())
            .push("status", self.status.as_deref())
            .push("startDate", self.start_date.as_deref())
            .push("endDate", self.end_date.as_deref());
        self.page.extend(query)
    }
}

pub fn list(filter: &OrderFilter) -> HttpRequest {
    ORDERS.list(filter.query())
}

pub fn get(id: &str) -> HttpRequest {
    ORDERS.get(id)
}

pub fn create<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    ORDERS.create(body)
}

/// Advance an order (`approved`, `dispatched`, `delivered`, `cancelled`, ...).
pub fn update_status(
    id: &str,
    status: &str,
    remarks: Option<&str>,
) -> Result<HttpRequest, ApiError> {
    ORDERS.action(
        HttpMethod::Patch,
        id,
        "status",
        &json!({ "status": status, "remarks": remarks }),
    )
}

pub fn delete(id: &str) -> HttpRequest {
    ORDERS.delete(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_and_paging() {
        let filter = OrderFilter {
            status: Some("pending".into()),
            start_date: Some("2024-01-01".into()),
            end_date: None,
            page: Page::new(1, 50),
            ..OrderFilter::default()
        };
        assert_eq!(
            list(&filter).target(),
            "/orders?status=pending&startDate=2024-01-01&page=1&limit=50"
        );
    }
}
