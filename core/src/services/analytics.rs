//! Read-only analytics reports. All aggregation is done by the backend.

use crate::http::{HttpRequest, Query};

use super::Resource;

pub const ANALYTICS: Resource = Resource::new("/analytics");

/// Filters shared by every report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub distributor_id: Option<String>,
    pub staff_id: Option<String>,
    /// Bucket size for time series: `day`, `week`, `month`.
    pub group_by: Option<String>,
    pub limit: Option<u32>,
}

impl AnalyticsFilter {
    pub fn query(&self) -> Query {
        Query::new()
            .push("startDate", self.start_date.as_deref())
            .push("endDate", self.end_date.as_deref())
            .push("distributorId", self.distributor_id.as_deref())
            .push("staffId", self.staff_id.as_deref())
            .push("groupBy", self.group_by.as_deref())
            .push("limit", self.limit)
    }
}

/// Available reports and their path below `/analytics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Dashboard,
    Sales,
    Distributors,
    Products,
    Staff,
    DamageClaims,
    Trends,
}

impl Report {
    pub fn path(self) -> &'static str {
        match self {
            Report::Dashboard => "dashboard",
            Report::Sales => "sales",
            Report::Distributors => "distributors",
            Report::Products => "products",
            Report::Staff => "staff",
            Report::DamageClaims => "damage-claims",
            Report::Trends => "trends",
        }
    }
}

pub fn report(report: Report, filter: &AnalyticsFilter) -> HttpRequest {
    ANALYTICS.view(report.path(), filter.query())
}

pub fn dashboard(filter: &AnalyticsFilter) -> HttpRequest {
    report(Report::Dashboard, filter)
}

pub fn sales(filter: &AnalyticsFilter) -> HttpRequest {
    report(Report::Sales, filter)
}

pub fn distributors(filter: &AnalyticsFilter) -> HttpRequest {
    report(Report::Distributors, filter)
}

pub fn products(filter: &AnalyticsFilter) -> HttpRequest {
    report(Report::Products, filter)
}

pub fn staff(filter: &AnalyticsFilter) -> HttpRequest {
    report(Report::Staff, filter)
}

pub fn damage_claims(filter: &AnalyticsFilter) -> HttpRequest {
    report(Report::DamageClaims, filter)
}

pub fn trends(filter: &AnalyticsFilter) -> HttpRequest {
    report(Report::Trends, filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_paths() {
        let filter = AnalyticsFilter::default();
        assert_eq!(dashboard(&filter).target(), "/analytics/dashboard");
        assert_eq!(damage_claims(&filter).target(), "/analytics/damage-claims");
    }

    #[test]
    fn filter_order_is_stable() {
        let filter = AnalyticsFilter {
            group_by: Some("month".into()),
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-03-31".into()),
            distributor_id: None,
            staff_id: Some(String::new()),
            limit: Some(10),
        };
        assert_eq!(
            sales(&filter).target(),
            "/analytics/sales?startDate=2024-01-01&endDate=2024-03-31&groupBy=month&limit=10"
        );
    }
}
