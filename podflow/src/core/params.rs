//! Pipeline parameter values.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value of a pipeline-level parameter.
///
/// Variants are tried in declaration order when deserializing, so strings
/// always land in `Text`. Dates only enter through the `From` conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Plain string.
    Text(String),
    /// Lists and mappings, passed through untouched.
    Structured(Value),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without a zone.
    DateTime(NaiveDateTime),
}

impl ParameterValue {
    /// Renders the value as the literal default of a pipeline input.
    ///
    /// Dates and date-times both become `YYYY-MM-DD` strings; every other
    /// value passes through.
    #[must_use]
    pub fn to_default(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::String(s.clone()),
            Self::Structured(v) => v.clone(),
            Self::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Self::DateTime(dt) => Value::String(dt.format("%Y-%m-%d").to_string()),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<NaiveDate> for ParameterValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for ParameterValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_defaults_pass_through() {
        assert_eq!(ParameterValue::from(0.3).to_default(), json!(0.3));
        assert_eq!(ParameterValue::from(42_i64).to_default(), json!(42));
        assert_eq!(ParameterValue::from("abc").to_default(), json!("abc"));
        assert_eq!(ParameterValue::from(true).to_default(), json!(true));
    }

    #[test]
    fn test_date_default_is_iso_calendar_date() {
        let date = NaiveDate::from_ymd_opt(2022, 2, 24).unwrap();
        assert_eq!(ParameterValue::from(date).to_default(), json!("2022-02-24"));
    }

    #[test]
    fn test_datetime_default_drops_time_of_day() {
        let timestamp = NaiveDate::from_ymd_opt(2022, 2, 24)
            .unwrap()
            .and_hms_milli_opt(10, 11, 12, 345)
            .unwrap();
        assert_eq!(
            ParameterValue::from(timestamp).to_default(),
            json!("2022-02-24")
        );
    }

    #[test]
    fn test_timestamp_shaped_string_stays_text() {
        let value: ParameterValue =
            serde_json::from_value(json!("2022-02-24T10:11:12.345")).unwrap();
        assert_eq!(
            value,
            ParameterValue::Text("2022-02-24T10:11:12.345".to_string())
        );
        assert_eq!(value.to_default(), json!("2022-02-24T10:11:12.345"));

        let value: ParameterValue = serde_json::from_value(json!("2022-02-24")).unwrap();
        assert_eq!(value, ParameterValue::Text("2022-02-24".to_string()));
    }

    #[test]
    fn test_untagged_deserialization() {
        let value: ParameterValue = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(value, ParameterValue::Int(42));

        let value: ParameterValue = serde_json::from_value(json!(0.5)).unwrap();
        assert_eq!(value, ParameterValue::Float(0.5));

        let value: ParameterValue = serde_json::from_value(json!({"k": 1})).unwrap();
        assert_eq!(value, ParameterValue::Structured(json!({"k": 1})));
    }
}
