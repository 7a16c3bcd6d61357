//! Structural validation of request input
//!
//! Every violation is collected before failing, so a caller sees all of them
//! in one `BadRequest`.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::Error;

pub const PROPERTY_MISSING: &str = "property missing";

/// Primitive type a field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }

    /// Type name of a JSON value, `None` for `null`
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(_) => Some(FieldType::String),
            Value::Number(_) => Some(FieldType::Number),
            Value::Bool(_) => Some(FieldType::Boolean),
            Value::Object(_) => Some(FieldType::Object),
            Value::Array(_) => Some(FieldType::Array),
        }
    }
}

fn wrong_type(expected: FieldType, actual: FieldType) -> String {
    format!(
        "wrong type. expected {}. instead got {}",
        expected.name(),
        actual.name()
    )
}

/// Accumulates `{field: reason}` violations
#[derive(Debug, Default)]
pub struct Validator {
    violations: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a non-empty string
    pub fn require_str(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if value.map_or(true, str::is_empty) {
            self.violate(field, PROPERTY_MISSING);
        }
        self
    }

    /// Require a JSON value of the given type; `null` and `""` count as missing
    pub fn require_value(
        &mut self,
        field: &str,
        value: Option<&Value>,
        expected: FieldType,
    ) -> &mut Self {
        match value.and_then(|v| FieldType::of(v).map(|t| (v, t))) {
            None => self.violate(field, PROPERTY_MISSING),
            Some((Value::String(s), _)) if s.is_empty() => self.violate(field, PROPERTY_MISSING),
            Some((_, actual)) if actual != expected => {
                self.violate(field, &wrong_type(expected, actual))
            }
            Some(_) => {}
        }
        self
    }

    /// Accept an absent or `null` value, otherwise require the given type
    pub fn optional_value(
        &mut self,
        field: &str,
        value: Option<&Value>,
        expected: FieldType,
    ) -> &mut Self {
        if let Some(actual) = value.and_then(FieldType::of) {
            if actual != expected {
                self.violate(field, &wrong_type(expected, actual));
            }
        }
        self
    }

    fn violate(&mut self, field: &str, reason: &str) {
        self.violations.insert(field.to_string(), reason.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// `BadRequest` listing every violation, if any
    pub fn finish(&mut self) -> Result<(), Error> {
        if self.violations.is_empty() {
            return Ok(());
        }
        Err(Error::BadRequest(std::mem::take(&mut self.violations)))
    }
}

/// Check that `body` holds every listed field with the listed type.
pub fn check_body(body: &Value, fields: &[(&str, FieldType)]) -> Result<(), Error> {
    let mut validator = Validator::new();
    for (field, expected) in fields {
        validator.require_value(field, body.get(field), *expected);
    }
    validator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_body_passes() {
        let body = json!({ "userId": "a1", "userName": "Ann" });
        let fields = [("userId", FieldType::String), ("userName", FieldType::String)];
        assert!(check_body(&body, &fields).is_ok());
    }

    #[test]
    fn test_every_violation_is_reported() {
        let body = json!({ "groupName": "", "groupDescription": 42, "extra": true });
        let fields = [
            ("groupId", FieldType::String),
            ("groupName", FieldType::String),
            ("groupDescription", FieldType::String),
        ];

        match check_body(&body, &fields).unwrap_err() {
            Error::BadRequest(violations) => {
                assert_eq!(violations.len(), 3);
                assert_eq!(violations["groupId"], PROPERTY_MISSING);
                assert_eq!(violations["groupName"], PROPERTY_MISSING);
                assert_eq!(
                    violations["groupDescription"],
                    "wrong type. expected string. instead got number"
                );
            }
            e => panic!("Expected BadRequest, got {:?}", e),
        }
    }

    #[test]
    fn test_null_counts_as_missing() {
        let body = json!({ "userId": null });
        let err = check_body(&body, &[("userId", FieldType::String)]).unwrap_err();
        assert_eq!(err.info(), json!({ "userId": PROPERTY_MISSING }));
    }

    #[test]
    fn test_optional_values_are_only_type_checked() {
        let mut validator = Validator::new();
        validator
            .optional_value("newGroupName", None, FieldType::String)
            .optional_value("newGroupDescription", Some(&Value::Null), FieldType::String);
        assert!(validator.is_valid());

        validator.optional_value("newGroupName", Some(&json!([1])), FieldType::String);
        let err = validator.finish().unwrap_err();
        assert_eq!(
            err.info(),
            json!({ "newGroupName": "wrong type. expected string. instead got array" })
        );
    }

    #[test]
    fn test_require_str() {
        let mut validator = Validator::new();
        validator
            .require_str("userId", Some("a1"))
            .require_str("userName", Some(""))
            .require_str("groupId", None);
        let err = validator.finish().unwrap_err();
        assert_eq!(
            err.info(),
            json!({ "userName": PROPERTY_MISSING, "groupId": PROPERTY_MISSING })
        );
    }
}
