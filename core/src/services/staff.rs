//! Staff accounts.

use serde::Serialize;
use serde_json::json;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Query};

pub const STAFF: Resource = Resource::new("/staff");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffFilter {
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub page: Page,
}

impl StaffFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("search", self.search.as_deref())
            .push("role", self.role.as_deref())
            .push("status", self.status.as_deref());
        self.page.extend(query)
    }
}

pub fn list(filter: &StaffFilter) -> HttpRequest {
    STAFF.list(filter.query())
}

pub fn get(id: &str) -> HttpRequest {
    STAFF.get(id)
}

pub fn create<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    STAFF.create(body)
}

pub fn update<B: Serialize + ?Sized>(id: &str, body: &B) -> Result<HttpRequest, ApiError> {
    STAFF.update(id, body)
}

pub fn delete(id: &str) -> HttpRequest {
    STAFF.delete(id)
}

/// Activate or deactivate an account.
pub fn set_status(id: &str, status: &str) -> Result<HttpRequest, ApiError> {
    STAFF.action(HttpMethod::Patch, id, "status", &json!({ "status": status }))
}
