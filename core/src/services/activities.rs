//! Marketing activities logged in the field and the staff activity feed.

use serde_json::json;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Query};

pub const MARKETING_ACTIVITIES: Resource = Resource::new("/marketing-activities");
pub const STAFF_ACTIVITIES: Resource = Resource::new("/staff-activities");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub staff_id: Option<String>,
    pub activity_type: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Page,
}

impl ActivityFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("staffId", self.staff_id.as_deref())
            .push("type", self.activity_type.as_deref())
            .push("status", self.status.as_deref())
            .push("startDate", self.start_date.as_deref())
            .push("endDate", self.end_date.as_deref());
        self.page.extend(query)
    }
}

pub fn list_marketing(filter: &ActivityFilter) -> HttpRequest {
    MARKETING_ACTIVITIES.list(filter.query())
}

pub fn get_marketing(id: &str) -> HttpRequest {
    MARKETING_ACTIVITIES.get(id)
}

/// Approve or reject a logged marketing activity.
pub fn review_marketing(
    id: &str,
    status: &str,
    remarks: Option<&str>,
) -> Result<HttpRequest, ApiError> {
    MARKETING_ACTIVITIES.action(
        HttpMethod::Patch,
        id,
        "review",
        &json!({ "status": status, "remarks": remarks }),
    )
}

pub fn list_staff(filter: &ActivityFilter) -> HttpRequest {
    STAFF_ACTIVITIES.list(filter.query())
}

pub fn get_staff(id: &str) -> HttpRequest {
    STAFF_ACTIVITIES.get(id)
}
