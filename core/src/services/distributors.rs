//! Distributor accounts.

use serde::Serialize;
use serde_json::json;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Query};

pub const DISTRIBUTORS: Resource = Resource::new("/distributors");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributorFilter {
    pub search: Option<String>,
    pub region: Option<String>,
    pub status: Option<String>,
    pub page: Page,
}

impl DistributorFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("search", self.search.as_deref())
            .push("region", self.region.as_deref())
            .push("status", self.status.as_deref());
        self.page.extend(query)
    }
}

pub fn list(filter: &DistributorFilter) -> HttpRequest {
    DISTRIBUTORS.list(filter.query())
}

pub fn get(id: &str) -> HttpRequest {
    DISTRIBUTORS.get(id)
}

pub fn create<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    DISTRIBUTORS.create(body)
}

pub fn update<B: Serialize + ?Sized>(id: &str, body: &B) -> Result<HttpRequest, ApiError> {
    DISTRIBUTORS.update(id, body)
}

pub fn delete(id: &str) -> HttpRequest {
    DISTRIBUTORS.delete(id)
}

pub fn set_status(id: &str, status: &str) -> Result<HttpRequest, ApiError> {
    DISTRIBUTORS.action(HttpMethod::Patch, id, "status", &json!({ "status": status }))
}
