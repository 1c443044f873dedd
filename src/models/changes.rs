//! Field-level change sets applied through the member store's update path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

use super::MemberField;

/// New value for one column.
///
/// A field that should stay untouched is simply absent from the change set;
/// `Clear` is the explicit request to store NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Set(String),
    Clear,
}

impl FieldValue {
    /// Blank or whitespace-only text clears the field.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            FieldValue::Clear
        } else {
            FieldValue::Set(text)
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            FieldValue::Set(text) => Some(text),
            FieldValue::Clear => None,
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map(FieldValue::from_text).unwrap_or(FieldValue::Clear)
    }
}

/// Ordered set of column changes for one member.
///
/// Serialized as a JSON object of column name to string or `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<MemberField, Option<String>>",
    into = "BTreeMap<MemberField, Option<String>>"
)]
pub struct MemberChanges(BTreeMap<MemberField, FieldValue>);

impl MemberChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: MemberField, value: FieldValue) -> Self {
        let mut changes = Self::new();
        changes.insert(field, value);
        changes
    }

    /// Builder-style `Set` of a text value.
    pub fn with(mut self, field: MemberField, value: impl Into<String>) -> Self {
        self.insert(field, FieldValue::from_text(value));
        self
    }

    pub fn insert(&mut self, field: MemberField, value: FieldValue) {
        self.0.insert(field, value);
    }

    pub fn get(&self, field: MemberField) -> Option<&FieldValue> {
        self.0.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MemberField, &FieldValue)> {
        self.0.iter().map(|(field, value)| (*field, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate every value against its field's vocabulary.
    pub fn validate(&self) -> Result<(), AppError> {
        self.iter().try_for_each(|(field, value)| field.validate(value))
    }
}

impl From<BTreeMap<MemberField, Option<String>>> for MemberChanges {
    fn from(map: BTreeMap<MemberField, Option<String>>) -> Self {
        Self(
            map.into_iter()
                .map(|(field, value)| (field, FieldValue::from(value)))
                .collect(),
        )
    }
}

impl From<MemberChanges> for BTreeMap<MemberField, Option<String>> {
    fn from(changes: MemberChanges) -> Self {
        changes
            .0
            .into_iter()
            .map(|(field, value)| {
                let value = match value {
                    FieldValue::Set(text) => Some(text),
                    FieldValue::Clear => None,
                };
                (field, value)
            })
            .collect()
    }
}

impl FromIterator<(MemberField, FieldValue)> for MemberChanges {
    fn from_iter<I: IntoIterator<Item = (MemberField, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_text_clears() {
        assert_eq!(FieldValue::from_text(""), FieldValue::Clear);
        assert_eq!(FieldValue::from_text("   "), FieldValue::Clear);
        assert_eq!(
            FieldValue::from_text(" Αθήνα "),
            FieldValue::Set(" Αθήνα ".to_string())
        );
    }

    #[test]
    fn test_json_null_is_explicit_clear() {
        let changes: MemberChanges =
            serde_json::from_value(json!({ "email": null, "city": "Πάτρα" })).unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(changes.get(MemberField::Email), Some(&FieldValue::Clear));
        assert_eq!(
            changes.get(MemberField::City),
            Some(&FieldValue::Set("Πάτρα".to_string()))
        );
        assert_eq!(changes.get(MemberField::Notes), None);
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let result = serde_json::from_value::<MemberChanges>(json!({ "member_id": "5" }));
        assert!(result.is_err());

        let result = serde_json::from_value::<MemberChanges>(json!({ "nickname": "x" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_stops_at_bad_value() {
        let changes = MemberChanges::new()
            .with(MemberField::City, "Λάρισα")
            .with(MemberField::MemberStatus, "Unknown");
        assert!(matches!(changes.validate(), Err(AppError::Validation(_))));
    }
}
