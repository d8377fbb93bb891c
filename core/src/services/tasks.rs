//! Field tasks assigned to staff.

use serde::Serialize;
use serde_json::json;

use super::{Page, Resource};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Query};

pub const TASKS: Resource = Resource::new("/tasks");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub assigned_to: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Page,
}

impl TaskFilter {
    pub fn query(&self) -> Query {
        let query = Query::new()
            .push("assignedTo", self.assigned_to.as_deref())
            .push("status", self.status.as_deref())
            .push("priority", self.priority.as_deref())
            .push("startDate", self.start_date.as_deref())
            .push("endDate", self.end_date.as_deref());
        self.page.extend(query)
    }
}

pub fn list(filter: &TaskFilter) -> HttpRequest {
    TASKS.list(filter.query())
}

pub fn get(id: &str) -> HttpRequest {
    TASKS.get(id)
}

pub fn create<B: Serialize + ?Sized>(body: &B) -> Result<HttpRequest, ApiError> {
    TASKS.create(body)
}

pub fn update<B: Serialize + ?Sized>(id: &str, body: &B) -> Result<HttpRequest, ApiError> {
    TASKS.update(id, body)
}

pub fn delete(id: &str) -> HttpRequest {
    TASKS.delete(id)
}

/// Move a task through its workflow, with an optional note.
pub fn update_status(id: &str, status: &str, note: Option<&str>) -> Result<HttpRequest, ApiError> {
    let body = match note {
        Some(note) => json!({ "status": status, "note": note }),
        None => json!({ "status": status }),
    };
    TASKS.action(HttpMethod::Patch, id, "status", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_query_keys() {
        let filter = TaskFilter {
            assigned_to: Some("s1".into()),
            end_date: Some("2024-05-31".into()),
            ..TaskFilter::default()
        };
        assert_eq!(list(&filter).target(), "/tasks?assignedTo=s1&endDate=2024-05-31");
    }

    #[test]
    fn status_note_is_optional() {
        let bare = update_status("t1", "done", None).unwrap();
        assert_eq!(bare.body.as_deref(), Some(r#"{"status":"done"}"#));
        let noted = update_status("t1", "done", Some("visited")).unwrap();
        assert_eq!(noted.body.as_deref(), Some(r#"{"status":"done","note":"visited"}"#));
    }
}
