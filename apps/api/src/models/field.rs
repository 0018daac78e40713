use serde::{Deserialize, Serialize};
use tracing::warn;

/// The closed set of field types the scanner reports.
///
/// Deserialization is lenient: any input `type` the pipeline does not know
/// (`number`, `password`, `search`, ...) is treated as plain text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Tel,
    Textarea,
    Select,
    Date,
    Url,
}

impl FieldType {
    /// Maps a native control to its field type from its tag name and `type` attribute.
    pub fn from_control(tag: &str, input_type: Option<&str>) -> Self {
        match tag {
            "textarea" => FieldType::Textarea,
            "select" => FieldType::Select,
            _ => input_type.map(FieldType::from).unwrap_or_default(),
        }
    }

    /// Single-line controls that a resume may carry a literal value for.
    pub fn is_extractable(self) -> bool {
        matches!(self, FieldType::Text | FieldType::Url | FieldType::Tel)
    }
}

impl From<&str> for FieldType {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "email" => FieldType::Email,
            "tel" => FieldType::Tel,
            "textarea" => FieldType::Textarea,
            "select" | "select-one" | "select-multiple" => FieldType::Select,
            "date" | "datetime-local" | "month" => FieldType::Date,
            "url" => FieldType::Url,
            _ => FieldType::Text,
        }
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        FieldType::from(raw.as_str())
    }
}

/// A fillable control discovered on the page.
///
/// The scanner sets `id`, `name`, `type` and `current_value`; the resolution
/// pipeline fills in the rest. Lives for a single scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedField {
    pub id: String,
    /// Inferred human-readable label.
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub current_value: String,
    /// 1 iff a deterministic match was found, 0 otherwise.
    #[serde(default)]
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ai_generated: Option<bool>,
}

impl DetectedField {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        field_type: FieldType,
        current_value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field_type,
            current_value: current_value.into(),
            ..Default::default()
        }
    }

    /// The predicted value, if one exists and is non-empty.
    pub fn resolved_value(&self) -> Option<&str> {
        self.predicted_value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_value().is_some()
    }
}

/// Deserializes a loosely-typed list of field records, skipping any entry that
/// is not a usable `DetectedField` instead of failing the whole batch.
pub fn parse_field_records(records: Vec<serde_json::Value>) -> Vec<DetectedField> {
    records
        .into_iter()
        .enumerate()
        .filter_map(
            |(index, record)| match serde_json::from_value::<DetectedField>(record) {
                Ok(field) if !field.id.trim().is_empty() => Some(field),
                Ok(_) => {
                    warn!("Skipping field record {index}: empty id");
                    None
                }
                Err(e) => {
                    warn!("Skipping malformed field record {index}: {e}");
                    None
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_from_control() {
        assert_eq!(FieldType::from_control("textarea", None), FieldType::Textarea);
        assert_eq!(FieldType::from_control("select", None), FieldType::Select);
        assert_eq!(FieldType::from_control("input", Some("EMAIL")), FieldType::Email);
        assert_eq!(FieldType::from_control("input", Some("number")), FieldType::Text);
        assert_eq!(FieldType::from_control("input", None), FieldType::Text);
    }

    #[test]
    fn test_field_type_lenient_deserialization() {
        let t: FieldType = serde_json::from_str(r#""password""#).unwrap();
        assert_eq!(t, FieldType::Text);
        let t: FieldType = serde_json::from_str(r#""tel""#).unwrap();
        assert_eq!(t, FieldType::Tel);
        assert_eq!(serde_json::to_string(&FieldType::Textarea).unwrap(), r#""textarea""#);
    }

    #[test]
    fn test_detected_field_wire_shape_is_camel_case() {
        let mut field = DetectedField::new("autofill_1", "Email", FieldType::Email, "");
        field.predicted_value = Some("jane@example.com".to_string());
        field.confidence = 1;

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "email");
        assert_eq!(value["currentValue"], "");
        assert_eq!(value["predictedValue"], "jane@example.com");
        assert!(value.get("isAiGenerated").is_none());
    }

    #[test]
    fn test_resolved_value_ignores_empty_prediction() {
        let mut field = DetectedField::new("a", "Name", FieldType::Text, "");
        field.predicted_value = Some(String::new());
        assert!(!field.is_resolved());
        field.predicted_value = Some("Jane".to_string());
        assert_eq!(field.resolved_value(), Some("Jane"));
    }

    #[test]
    fn test_parse_field_records_skips_malformed_entries() {
        let records = vec![
            json!({"id": "autofill_1", "name": "First Name", "type": "text", "currentValue": ""}),
            json!({"name": "no id here"}),
            json!("not even an object"),
            json!({"id": "  ", "name": "blank id"}),
            json!({"id": "gf_0", "name": "Why us?", "type": "textarea"}),
        ];

        let fields = parse_field_records(records);
        let ids: Vec<&str> = fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["autofill_1", "gf_0"]);
        assert_eq!(fields[1].field_type, FieldType::Textarea);
    }
}
