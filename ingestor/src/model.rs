use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

/// One stored telemetry value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySlot {
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

/// Response body for both reading and writing device telemetry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryResponse {
    /// Device id
    pub id: u32,
    pub complex_id: u32,
    pub telemetry: Vec<TelemetrySlot>,
}

/// Filters for reading back device telemetry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryQuery {
    /// Exclusive lower bound
    pub min_value: Option<f64>,
    /// Exclusive upper bound
    pub max_value: Option<f64>,
    /// Only the first matching slot after ordering
    pub last: Option<bool>,
    /// JSON array such as `[{"field":"value","order":"asc"}]`. Newest
    /// first when absent or empty.
    #[serde(default, deserialize_with = "order_params_from_json")]
    pub order_params: Option<Vec<OrderParam>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum OrderField {
    #[serde(rename = "value")]
    Value,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OrderParam {
    pub field: OrderField,
    #[serde(default)]
    pub order: SortOrder,
}

impl OrderParam {
    pub fn new(field: OrderField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Compares two `(insertion index, slot)` pairs. The insertion index
    /// stands in for `createdAt`, which can tie.
    pub fn compare(&self, a: (usize, &TelemetrySlot), b: (usize, &TelemetrySlot)) -> Ordering {
        let ordering = match self.field {
            OrderField::Value => a.1.value.total_cmp(&b.1.value),
            OrderField::CreatedAt => a.0.cmp(&b.0),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

fn order_params_from_json<'de, D>(deserializer: D) -> Result<Option<Vec<OrderParam>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.filter(|raw| !raw.trim().is_empty())
        .map(|raw| serde_json::from_str(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

impl TelemetryQuery {
    pub fn matches(&self, slot: &TelemetrySlot) -> bool {
        self.min_value.map_or(true, |min| slot.value > min)
            && self.max_value.map_or(true, |max| slot.value < max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_params_parsed_from_json() {
        let query: TelemetryQuery = serde_json::from_str(
            r#"{"orderParams": "[{\"field\":\"value\",\"order\":\"desc\"},{\"field\":\"createdAt\"}]"}"#,
        )
        .unwrap();

        assert_eq!(
            query.order_params,
            Some(vec![
                OrderParam::new(OrderField::Value, SortOrder::Desc),
                OrderParam::new(OrderField::CreatedAt, SortOrder::Asc),
            ])
        );
    }

    #[test]
    fn test_unknown_order_field_rejected() {
        let result: Result<TelemetryQuery, _> =
            serde_json::from_str(r#"{"orderParams": "[{\"field\":\"type\"}]"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_order_params() {
        let query: TelemetryQuery = serde_json::from_str(r#"{"last": true}"#).unwrap();
        assert_eq!(query.order_params, None);
    }
}
