//! Sales inquiries (leads) and their assignment to staff.

use serde::Serialize;
use serde_json::json;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Query};

pub const SALES_INQUIRIES: Resource = Resource::new("/sales-inquiries");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InquiryFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub page: Page,
}

impl InquiryFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("search", self.search.as_deref())
            .push("status", self.status.as_deref())
            .push("assignedTo", self.assigned_to.as_deref());
        self.page.extend(query)
    }
}

pub fn list(filter: &InquiryFilter) -> HttpRequest {
    SALES_INQUIRIES.list(filter.query())
}

pub fn get(id: &str) -> HttpRequest {
    SALES_INQUIRIES.get(id)
}

pub fn create<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    SALES_INQUIRIES.create(body)
}

pub fn update<B: Serialize + ?Sized>(id: &str, body: &B) -> Result<HttpRequest, ApiError> {
    SALES_INQUIRIES.update(id, body)
}

pub fn assign(id: &str, staff_id: &str) -> Result<HttpRequest, ApiError> {
    SALES_INQUIRIES.action(HttpMethod::Patch, id, "assign", &json!({ "staffId": staff_id }))
}

pub fn delete(id: &str) -> HttpRequest {
    SALES_INQUIRIES.delete(id)
}
