//! Type predicates for `DataType`.

use serde_json::Value;
use std::path::Path;

use crate::model::DataType;

/// Whether `value` is acceptable for a declared `data_type`.
pub fn matches_type(data_type: DataType, value: &Value) -> bool {
    match data_type {
        DataType::String
        | DataType::Binary
        | DataType::Token
        | DataType::Password
        | DataType::VersionNumber => value.is_string(),
        DataType::Integer => value.is_i64() || value.is_u64(),
        DataType::Float => value.is_number(),
        DataType::Boolean => value.is_boolean(),
        DataType::Null => value.is_null(),
        DataType::Json => value.is_object() || value.is_array(),
        DataType::Array => value.is_array(),
        DataType::Object => value.is_object(),
        DataType::File => value.as_str().is_some_and(|p| Path::new(p).exists()),
        DataType::Url => value
            .as_str()
            .is_some_and(|s| s.starts_with("http://") || s.starts_with("https://")),
        DataType::Email => value.as_str().is_some_and(is_email),
        DataType::Uuid => value
            .as_str()
            .is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()),
        DataType::Datetime => value
            .as_str()
            .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
        DataType::DatabaseRecord => value.as_object().is_some_and(|o| o.contains_key("id")),
        DataType::Percentage => value
            .as_f64()
            .is_some_and(|v| (0.0..=100.0).contains(&v)),
    }
}

fn is_email(s: &str) -> bool {
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}
