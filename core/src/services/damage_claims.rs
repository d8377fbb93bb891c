//! Damage claims raised by distributors against delivered stock.

use serde::Serialize;
use serde_json::json;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Query};

pub const DAMAGE_CLAIMS: Resource = Resource::new("/damage-claims");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimFilter {
    pub distributor_id: Option<String>,
    pub product_id: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Page,
}

impl ClaimFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("distributorId", self.distributor_id.as_deref())
            .push("productId", self.product_id.as_deref())
            .push("status", self.status.as_deref())
            .push("startDate", self.start_date.as_deref())
            .push("endDate", self.end_date.as_deref());
        self.page.extend(query)
    }
}

/// Reviewer's ruling on a claim. `approved_quantity` may be lower than the
/// claimed quantity for a partial approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReview {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

pub fn list(filter: &ClaimFilter) -> HttpRequest {
    DAMAGE_CLAIMS.list(filter.query())
}

pub fn get(id: &str) -> HttpRequest {
    DAMAGE_CLAIMS.get(id)
}

pub fn create<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    DAMAGE_CLAIMS.create(body)
}

pub fn review(id: &str, review: &ClaimReview) -> Result<HttpRequest, ApiError> {
    DAMAGE_CLAIMS.action(HttpMethod::Patch, id, "review", review)
}

/// Attach a free-text comment to a claim's history.
pub fn comment(id: &str, text: &str) -> Result<HttpRequest, ApiError> {
    DAMAGE_CLAIMS.action(HttpMethod::Post, id, "comments", &json!({ "text": text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_approval_body() {
        let request = review(
            "c1",
            &ClaimReview {
                status: "approved".into(),
                approved_quantity: Some(4),
                remarks: None,
            },
        )
        .unwrap();
        assert_eq!(request.path, "/damage-claims/c1/review");
        assert_eq!(
            request.body.as_deref(),
            Some(r#"{"status":"approved","approvedQuantity":4}"#)
        );
    }
}
