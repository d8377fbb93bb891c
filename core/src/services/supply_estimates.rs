//! Monthly supply estimates submitted by distributors.

use serde::Serialize;
use serde_json::json;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Query};

pub const SUPPLY_ESTIMATES: Resource = Resource::new("/supply-estimates");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EstimateFilter {
    pub distributor_id: Option<String>,
    pub status: Option<String>,
    pub month: Option<String>,
    pub page: Page,
}

impl EstimateFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("distributorId", self.distributor_id.as_deref())
            .push("status", self.status.as_deref())
            .push("month", self.month.as_deref());
        self.page.extend(query)
    }
}

/// Outcome of reviewing an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

pub fn list(filter: &EstimateFilter) -> HttpRequest {
    SUPPLY_ESTIMATES.list(filter.query())
}

pub fn get(id: &str) -> HttpRequest {
    SUPPLY_ESTIMATES.get(id)
}

pub fn create<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    SUPPLY_ESTIMATES.create(body)
}

pub fn update<B: Serialize + ?Sized>(id: &str, body: &B) -> Result<HttpRequest, ApiError> {
    SUPPLY_ESTIMATES.update(id, body)
}

pub fn delete(id: &str) -> HttpRequest {
    SUPPLY_ESTIMATES.delete(id)
}

pub fn review(
    id: &str,
    decision: Decision,
    remarks: Option<&str>,
) -> Result<HttpRequest, ApiError> {
    SUPPLY_ESTIMATES.action(
        HttpMethod::Patch,
        id,
        "review",
        &json!({ "status": decision, "remarks": remarks }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_serializes_decision_lowercase() {
        let request = review("e1", Decision::Rejected, Some("too high")).unwrap();
        assert_eq!(request.path, "/supply-estimates/e1/review");
        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["remarks"], "too high");
    }
}
