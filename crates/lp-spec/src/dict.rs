//! On-disk shape of a plot spec.
//!
//! Field names are fixed by the saved layout format. Unknown keys are
//! ignored and missing optional keys default, so older and newer layouts
//! load through the same struct.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlotSpecDict {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub source_type: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub file_source_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_details: Option<serde_json::Value>,
    #[serde(default)]
    pub input_plot_specs: Vec<PlotSpecDict>,
}

/// Identifiers were sometimes written as bare numbers (source index,
/// counter ids); read them back as strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Int(i64),
        Float(f64),
    }

    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        Scalar::Str(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_keys_and_missing_optionals() {
        let value = json!({
            "name": "rpm",
            "unique_id": 7,
            "source_type": "file",
            "file_source_identifier": 0,
            "original_name": "rpm",
            "plot_color": "#ff0000"
        });
        let dict: PlotSpecDict = serde_json::from_value(value).unwrap();
        assert_eq!(dict.unique_id.as_deref(), Some("7"));
        assert_eq!(dict.file_source_identifier.as_deref(), Some("0"));
        assert!(dict.input_plot_specs.is_empty());
        assert!(dict.operation_details.is_none());
    }

    #[test]
    fn null_fields_default() {
        let value = json!({
            "name": "d",
            "unique_id": "a",
            "source_type": "math_diff",
            "operation_details": null,
            "expression": null,
            "input_plot_specs": []
        });
        let dict: PlotSpecDict = serde_json::from_value(value).unwrap();
        assert!(dict.expression.is_none());
        assert!(dict.operation_details.is_none());
    }
}
