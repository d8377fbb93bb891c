//! Retail shops served by distributors.

use serde::Serialize;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpRequest, Query};

pub const SHOPS: Resource = Resource::new("/shops");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopFilter {
    pub search: Option<String>,
    pub distributor_id: Option<String>,
    pub area: Option<String>,
    pub page: Page,
}

impl ShopFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("search", self.search.as_deref())
            .push("distributorId", self.distributor_id.as_deref())
            .push("area", self.area.as_deref());
        self.page.extend(query)
    }
}

pub fn list(filter: &ShopFilter) -> HttpRequest {
    SHOPS.list(filter.query())
}

pub fn get(id: &str) -> HttpRequest {
    SHOPS.get(id)
}

pub fn create<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    SHOPS.create(body)
}

pub fn update<B: Serialize + ?Sized>(id: &str, body: &B) -> Result<HttpRequest, ApiError> {
    SHOPS.update(id, body)
}

pub fn delete(id: &str) -> HttpRequest {
    SHOPS.delete(id)
}
