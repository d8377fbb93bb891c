//! Flatteners from nested analytics payloads to CSV-ready records.

use serde_json::{Map, Value};

/// Fixed record shapes selectable by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportShape {
    Sales,
    Distributors,
    Products,
    Staff,
    Damage,
    Trends,
    Inventory,
}

impl ExportShape {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sales" => Some(Self::Sales),
            "distributors" => Some(Self::Distributors),
            "products" => Some(Self::Products),
            "staff" => Some(Self::Staff),
            "damage" => Some(Self::Damage),
            "trends" => Some(Self::Trends),
            "inventory" => Some(Self::Inventory),
            _ => None,
        }
    }

    /// Column name and dotted source path, in output order.
    fn columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Sales => &[
                ("Period", "period"),
                ("Orders", "orders"),
                ("Units", "units"),
                ("Revenue", "revenue"),
            ],
            Self::Distributors => &[
                ("Distributor", "distributor.name"),
                ("Code", "distributor.code"),
                ("Region", "distributor.region"),
                ("Orders", "totalOrders"),
                ("Revenue", "totalRevenue"),
                ("Pending Claims", "pendingClaims"),
            ],
            Self::Products => &[
                ("Product", "product.name"),
                ("SKU", "product.sku"),
                ("Brand", "product.brand.name"),
                ("Units Sold", "unitsSold"),
                ("Revenue", "revenue"),
            ],
            Self::Staff => &[
                ("Name", "staff.name"),
                ("Email", "staff.email"),
                ("Role", "staff.role"),
                ("Tasks Completed", "tasksCompleted"),
                ("Activities", "activities"),
                ("Orders Booked", "ordersBooked"),
            ],
            Self::Damage => &[
                ("Claim", "claimNumber"),
                ("Distributor", "distributor.name"),
                ("Product", "product.name"),
                ("Quantity", "quantity"),
                ("Approved", "approvedQuantity"),
                ("Status", "status"),
                ("Date", "createdAt"),
            ],
            Self::Inventory => &[
                ("Product", "product.name"),
                ("SKU", "product.sku"),
                ("Distributor", "distributor.name"),
                ("Quantity", "quantity"),
                ("Reorder Level", "reorderLevel"),
            ],
            Self::Trends => &[],
        }
    }
}

/// Flatten `data` with the shape named by `tag`.
///
/// Unknown tags, and payloads that do not have the shape's structure, are
/// returned unchanged.
pub fn format_analytics_for_export(data: &Value, tag: &str) -> Value {
    let Some(shape) = ExportShape::from_tag(tag) else {
        return data.clone();
    };
    let flattened = match shape {
        ExportShape::Trends => flatten_trends(data),
        ExportShape::Sales => rows(data.get("byPeriod").unwrap_or(data), shape),
        ExportShape::Inventory => rows(data, shape).map(|records| {
            records
                .into_iter()
                .zip(data.as_array().into_iter().flatten())
                .map(|(mut record, source)| {
                    if let Value::Object(map) = &mut record {
                        map.insert("Low Stock".into(), Value::String(low_stock(source).into()));
                    }
                    record
                })
                .collect()
        }),
        _ => rows(data, shape),
    };
    match flattened {
        Some(records) => Value::Array(records),
        None => {
            tracing::debug!(tag, "payload does not match export shape; passing through");
            data.clone()
        }
    }
}

fn rows(data: &Value, shape: ExportShape) -> Option<Vec<Value>> {
    let items = data.as_array()?;
    Some(
        items
            .iter()
            .map(|item| {
                let record: Map<String, Value> = shape
                    .columns()
                    .iter()
                    .map(|(column, path)| ((*column).to_string(), pick(item, path)))
                    .collect();
                Value::Object(record)
            })
            .collect(),
    )
}

/// `{ labels: [..], datasets: [{ label, data: [..] }] }` becomes one record
/// per label with a column per dataset.
fn flatten_trends(data: &Value) -> Option<Vec<Value>> {
    let labels = data.get("labels")?.as_array()?;
    let datasets = data.get("datasets")?.as_array()?;
    Some(
        labels
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let mut record = Map::new();
                record.insert("Period".into(), label.clone());
                for dataset in datasets {
                    let name = dataset
                        .get("label")
                        .and_then(Value::as_str)
                        .unwrap_or("Value")
                        .to_string();
                    let value = dataset
                        .get("data")
                        .and_then(|series| series.get(index))
                        .cloned()
                        .unwrap_or(Value::Null);
                    record.insert(name, value);
                }
                Value::Object(record)
            })
            .collect(),
    )
}

fn low_stock(item: &Value) -> &'static str {
    let quantity = item.get("quantity").and_then(Value::as_f64);
    let reorder = item.get("reorderLevel").and_then(Value::as_f64);
    match (quantity, reorder) {
        (Some(q), Some(r)) if q <= r => "yes",
        _ => "no",
    }
}

/// Dotted-path lookup; missing segments yield `null`.
fn pick(item: &Value, path: &str) -> Value {
    path.split('.')
        .try_fold(item, |value, key| value.get(key))
        .cloned()
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_tag_passes_through() {
        let data = json!({"anything": [1, 2, 3]});
        assert_eq!(format_analytics_for_export(&data, "pie-chart"), data);
    }

    #[test]
    fn distributors_flatten_nested_fields() {
        let data = json!([{
            "distributor": {"name": "Acme", "code": "D-01", "region": "North"},
            "totalOrders": 12,
            "totalRevenue": 5400.5,
            "pendingClaims": 1
        }]);
        let out = format_analytics_for_export(&data, "distributors");
        assert_eq!(
            out,
            json!([{
                "Distributor": "Acme",
                "Code": "D-01",
                "Region": "North",
                "Orders": 12,
                "Revenue": 5400.5,
                "Pending Claims": 1
            }])
        );
        let keys: Vec<&String> = out[0].as_object().unwrap().keys().collect();
        assert_eq!(keys[0], "Distributor");
    }

    #[test]
    fn sales_reads_by_period_series() {
        let data = json!({
            "summary": {"revenue": 10},
            "byPeriod": [{"period": "2024-01", "orders": 3, "units": 40, "revenue": 10}]
        });
        let out = format_analytics_for_export(&data, "sales");
        assert_eq!(out[0]["Period"], "2024-01");
        assert_eq!(out[0]["Units"], 40);
    }

    #[test]
    fn missing_nested_fields_become_null() {
        let out = format_analytics_for_export(&json!([{"unitsSold": 5}]), "products");
        assert_eq!(out[0]["Product"], Value::Null);
        assert_eq!(out[0]["Brand"], Value::Null);
        assert_eq!(out[0]["Units Sold"], 5);
    }

    #[test]
    fn trends_pivot_datasets_into_columns() {
        let data = json!({
            "labels": ["Jan", "Feb"],
            "datasets": [
                {"label": "Orders", "data": [4, 6]},
                {"label": "Claims", "data": [1]}
            ]
        });
        let out = format_analytics_for_export(&data, "trends");
        assert_eq!(
            out,
            json!([
                {"Period": "Jan", "Orders": 4, "Claims": 1},
                {"Period": "Feb", "Orders": 6, "Claims": null}
            ])
        );
    }

    #[test]
    fn inventory_flags_low_stock() {
        let data = json!([
            {"product": {"name": "Tea"}, "quantity": 3, "reorderLevel": 5},
            {"product": {"name": "Salt"}, "quantity": 30, "reorderLevel": 5}
        ]);
        let out = format_analytics_for_export(&data, "inventory");
        assert_eq!(out[0]["Low Stock"], "yes");
        assert_eq!(out[1]["Low Stock"], "no");
    }

    #[test]
    fn mismatched_payload_passes_through() {
        let data = json!({"not": "an array"});
        assert_eq!(format_analytics_for_export(&data, "staff"), data);
    }

    #[test]
    fn flattened_records_feed_csv() {
        let data = json!([{
            "staff": {"name": "Asha", "email": "a@x.io", "role": "sales"},
            "tasksCompleted": 7
        }]);
        let out = format_analytics_for_export(&data, "staff");
        let csv = crate::export::convert_to_csv(out.as_array().unwrap()).unwrap();
        assert_eq!(
            csv,
            "Name,Email,Role,Tasks Completed,Activities,Orders Booked\nAsha,a@x.io,sales,7,,"
        );
    }
}
