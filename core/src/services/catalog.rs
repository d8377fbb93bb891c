//! Product catalog: brands, their variants, and sellable products.

use serde::Serialize;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpRequest, Query};

pub const BRANDS: Resource = Resource::new("/brands");
pub const VARIANTS: Resource = Resource::new("/variants");
pub const PRODUCTS: Resource = Resource::new("/products");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub brand_id: Option<String>,
    pub variant_id: Option<String>,
    pub active: Option<bool>,
    pub page: Page,
}

impl ProductFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("search", self.search.as_deref())
            .push("brandId", self.brand_id.as_deref())
            .push("variantId", self.variant_id.as_deref())
            .push("active", self.active);
        self.page.extend(query)
    }
}

pub fn list_brands(search: Option<&str>) -> HttpRequest {
    BRANDS.list(Query::new().push("search", search))
}

pub fn get_brand(id: &str) -> HttpRequest {
    BRANDS.get(id)
}

pub fn create_brand<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    BRANDS.create(body)
}

pub fn update_brand<B: Serialize + ?Sized>(id: &str, body: &B) -> Result<HttpRequest, ApiError> {
    BRANDS.update(id, body)
}

pub fn delete_brand(id: &str) -> HttpRequest {
    BRANDS.delete(id)
}

/// Variants, optionally narrowed to one brand.
pub fn list_variants(brand_id: Option<&str>) -> HttpRequest {
    VARIANTS.list(Query::new().push("brandId", brand_id))
}

pub fn get_variant(id: &str) -> HttpRequest {
    VARIANTS.get(id)
}

pub fn create_variant<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    VARIANTS.create(body)
}

pub fn update_variant<B: Serialize + ?Sized>(id: &str, body: &B) -> Result<HttpRequest, ApiError> {
    VARIANTS.update(id, body)
}

pub fn delete_variant(id: &str) -> HttpRequest {
    VARIANTS.delete(id)
}

pub fn list_products(filter: &ProductFilter) -> HttpRequest {
    PRODUCTS.list(filter.query())
}

pub fn get_product(id: &str) -> HttpRequest {
    PRODUCTS.get(id)
}

pub fn create_product<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    PRODUCTS.create(body)
}

pub fn update_product<B: Serialize + ?Sized>(id: &str, body: &B) -> Result<HttpRequest, ApiError> {
    PRODUCTS.update(id, body)
}

pub fn delete_product(id: &str) -> HttpRequest {
    PRODUCTS.delete(id)
}
