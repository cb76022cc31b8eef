use std::collections::HashMap;

use serde_json::Value;

use crate::error::ReconError;
use crate::model::PropertyValue;

pub const CAPACITY_MW: &str = "capacity_mw";
pub const CUSTOMER_NAME: &str = "customer_name";
pub const CONNECTION_SITE: &str = "connection_site";
pub const PLANT_TYPE: &str = "plant_type";
pub const PROJECT_STATUS: &str = "project_status";

/// Exact, case-sensitive source identifiers and their canonical keys.
const PROPERTY_ALIASES: &[(&str, &str)] = &[
    ("MW Connected", CAPACITY_MW),
    ("MW Increase / Decrease", CAPACITY_MW),
    ("Cumulative Total Capacity (MW)", CAPACITY_MW),
    ("Customer Name", CUSTOMER_NAME),
    ("Connection Site", CONNECTION_SITE),
    ("Plant Type", PLANT_TYPE),
    ("Project Status", PROJECT_STATUS),
];

/// Canonical query-side attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryProperties {
    values: HashMap<String, Value>,
}

impl QueryProperties {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity_mw(&self) -> Option<f64> {
        self.values.get(CAPACITY_MW).and_then(Value::as_f64)
    }

    /// Value as comparable text. Strings as-is, numbers and booleans rendered.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Canonical key for a source identifier: alias table first, then lowercase with `_` for spaces.
pub fn canonical_key(pid: &str) -> String {
    PROPERTY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == pid)
        .map(|(_, key)| (*key).to_string())
        .unwrap_or_else(|| pid.to_lowercase().replace(' ', "_"))
}

/// Coerce a capacity value such as `"1,234.5 MW"` or `50` to megawatts.
pub fn coerce_capacity(value: &Value) -> Result<f64, ReconError> {
    let err = || ReconError::PropertyCoercion {
        key: CAPACITY_MW.into(),
        value: value.to_string(),
    };

    let parsed = match value {
        Value::Number(n) => n.as_f64().ok_or_else(err)?,
        Value::String(s) => s
            .replace(',', "")
            .replace("MW", "")
            .trim()
            .parse::<f64>()
            .map_err(|_| err())?,
        _ => return Err(err()),
    };

    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(err())
    }
}

/// Map `(pid, v)` pairs onto canonical keys.
///
/// Entries missing either half are skipped. A capacity that fails coercion drops
/// only that entry. Later entries win on key collisions.
pub fn extract(properties: &[PropertyValue]) -> QueryProperties {
    let mut values = HashMap::new();

    for prop in properties {
        let (Some(pid), Some(value)) = (prop.pid.as_deref(), prop.v.as_ref()) else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        let key = canonical_key(pid);

        if key == CAPACITY_MW {
            match coerce_capacity(value) {
                Ok(mw) => {
                    values.insert(key, Value::from(mw));
                }
                Err(e) => tracing::debug!(pid, error = %e, "dropping property"),
            }
        } else {
            values.insert(key, value.clone());
        }
    }

    QueryProperties { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prop(pid: &str, v: Value) -> PropertyValue {
        PropertyValue {
            pid: Some(pid.into()),
            v: Some(v),
        }
    }

    #[test]
    fn alias_table_resolves_every_entry() {
        assert_eq!(canonical_key("MW Connected"), CAPACITY_MW);
        assert_eq!(canonical_key("MW Increase / Decrease"), CAPACITY_MW);
        assert_eq!(canonical_key("Cumulative Total Capacity (MW)"), CAPACITY_MW);
        assert_eq!(canonical_key("Customer Name"), CUSTOMER_NAME);
        assert_eq!(canonical_key("Connection Site"), CONNECTION_SITE);
        assert_eq!(canonical_key("Plant Type"), PLANT_TYPE);
        assert_eq!(canonical_key("Project Status"), PROJECT_STATUS);
    }

    #[test]
    fn fallback_lowercases_and_underscores() {
        assert_eq!(canonical_key("Local Authority"), "local_authority");
        assert_eq!(canonical_key("customer name"), "customer_name");
        // Alias lookup is case-sensitive; the fallback still lands on the same key here.
        assert_eq!(canonical_key("PLANT TYPE"), "plant_type");
        assert_eq!(canonical_key("Capacity (MW)"), "capacity_(mw)");
    }

    #[test]
    fn capacity_with_thousands_separator() {
        let props = extract(&[prop("MW Connected", json!("1,234.5"))]);
        assert_eq!(props.capacity_mw(), Some(1234.5));
    }

    #[test]
    fn capacity_with_unit_and_number() {
        assert_eq!(extract(&[prop("MW Connected", json!("49.9MW"))]).capacity_mw(), Some(49.9));
        assert_eq!(extract(&[prop("MW Connected", json!("12 MW"))]).capacity_mw(), Some(12.0));
        assert_eq!(extract(&[prop("Cumulative Total Capacity (MW)", json!(300))]).capacity_mw(), Some(300.0));
    }

    #[test]
    fn bad_capacity_dropped_alone() {
        let props = extract(&[
            prop("MW Connected", json!("not a number")),
            prop("Customer Name", json!("SSE Renewables")),
        ]);
        assert!(!props.contains(CAPACITY_MW));
        assert_eq!(props.text(CUSTOMER_NAME).as_deref(), Some("SSE Renewables"));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn non_finite_and_non_scalar_capacity_rejected() {
        assert!(coerce_capacity(&json!("inf")).is_err());
        assert!(coerce_capacity(&json!(true)).is_err());
        assert!(coerce_capacity(&json!([1])).is_err());
    }

    #[test]
    fn null_or_missing_halves_skipped() {
        let props = extract(&[
            prop("Plant Type", Value::Null),
            PropertyValue { pid: None, v: Some(json!("x")) },
            PropertyValue { pid: Some("Project Status".into()), v: None },
        ]);
        assert!(props.is_empty());
    }

    #[test]
    fn other_values_kept_as_is() {
        let props = extract(&[prop("Connection Site", json!({"name": "Beauly"}))]);
        assert_eq!(props.get(CONNECTION_SITE), Some(&json!({"name": "Beauly"})));
        assert_eq!(props.text(CONNECTION_SITE), None);
    }
}
