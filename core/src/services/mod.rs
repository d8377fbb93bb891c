//! Request builders for every backend resource.
//!
//! # Design
//! Each module translates one resource area into `HttpRequest` values and
//! never touches the network: `ApiClient::fetch` executes the request and
//! returns the server's envelope unchanged. Filters are plain structs with
//! optional fields; their `query()` lists keys in a fixed order and drops
//! unset ones, so the same filter always produces the same query string.

use serde::Serialize;

use crate::error::ApiError;
use crate::http::{segment, HttpMethod, HttpRequest, Query};

pub mod activities;
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod damage_claims;
pub mod distributors;
pub mod inquiries;
pub mod inventory;
pub mod orders;
pub mod shops;
pub mod staff;
pub mod supply_estimates;
pub mod tasks;

/// A REST collection rooted at `base`, with the usual CRUD shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    base: &'static str,
}

impl Resource {
    pub const fn new(base: &'static str) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &'static str {
        self.base
    }

    /// `<base>/<id>`, with `id` percent-encoded.
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.base, segment(id))
    }

    pub fn list(&self, query: Query) -> HttpRequest {
        HttpRequest::get(self.base).with_query(query)
    }

    pub fn get(&self, id: &str) -> HttpRequest {
        HttpRequest::get(self.item_path(id))
    }

    pub fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<HttpRequest, ApiError> {
        HttpRequest::json(HttpMethod::Post, self.base, body)
    }

    pub fn update<B: Serialize + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        HttpRequest::json(HttpMethod::Put, self.item_path(id), body)
    }

    pub fn delete(&self, id: &str) -> HttpRequest {
        HttpRequest::delete(self.item_path(id))
    }

    /// Custom action on one item: `<method> <base>/<id>/<action>`.
    pub fn action<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        id: &str,
        action: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        HttpRequest::json(
            method,
            format!("{}/{action}", self.item_path(id)),
            body,
        )
    }

    /// Sub-collection below the base: `GET <base>/<name>`.
    pub fn view(&self, name: &str, query: Query) -> HttpRequest {
        HttpRequest::get(format!("{}/{name}", self.base)).with_query(query)
    }
}

/// Page and page size, shared by most list filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Page {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Append `page` and `limit` to `query`.
    pub fn extend(&self, query: Query) -> Query {
        query.push("page", self.page).push("limit", self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WIDGETS: Resource = Resource::new("/widgets");

    #[test]
    fn crud_shapes() {
        assert_eq!(WIDGETS.get("w1").path, "/widgets/w1");
        assert_eq!(WIDGETS.delete("w1").method, HttpMethod::Delete);

        let create = WIDGETS.create(&json!({"name": "w"})).unwrap();
        assert_eq!((create.method, create.path.as_str()), (HttpMethod::Post, "/widgets"));

        let update = WIDGETS.update("w1", &json!({"name": "w2"})).unwrap();
        assert_eq!((update.method, update.path.as_str()), (HttpMethod::Put, "/widgets/w1"));
    }

    #[test]
    fn action_nests_below_item() {
        let request = WIDGETS
            .action(HttpMethod::Patch, "w 1", "status", &json!({"status": "active"}))
            .unwrap();
        assert_eq!(request.path, "/widgets/w%201/status");
        assert_eq!(request.method, HttpMethod::Patch);
    }

    #[test]
    fn page_is_appended_after_filters() {
        let query = Page::new(3, 25).extend(Query::new().push("search", Some("x")));
        assert_eq!(query.encode(), "search=x&page=3&limit=25");
        assert!(Page::default().extend(Query::new()).is_empty());
    }
}
