//! External key extraction and numeric suffix parsing.
//!
//! An external key is the source issue key stored on the target record,
//! e.g. `"PROJ-123"`. Only its numeric part takes part in range filtering.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{RecordKind, TargetRecord};

/// Derives the external key from a target record.
#[derive(Debug, Clone, Default)]
pub struct KeyExtractor {
    field: Option<String>,
}

impl KeyExtractor {
    /// Create an extractor reading the given field name.
    ///
    /// With no field configured, issues fall back to their own key and test
    /// cases have no external key.
    pub fn new(field: Option<String>) -> Self {
        Self { field }
    }

    /// Return the external key, or `None` when the record doesn't carry one.
    #[must_use]
    pub fn extract(&self, record: &TargetRecord) -> Option<String> {
        let Some(field) = self.field.as_deref() else {
            return match record.kind {
                RecordKind::Issue => Some(record.key.clone()),
                RecordKind::TestCase => None,
            };
        };

        let value = record.fields.as_ref()?.get(field)?;
        let key = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            // Select-list style custom fields
            Value::Object(obj) => obj.get("value")?.as_str()?.trim().to_string(),
            _ => return None,
        };

        (!key.is_empty()).then_some(key)
    }
}

/// Parse the numeric part of a key.
///
/// Strips any leading non-digit prefix and reads the run of digits that
/// follows; anything after the digits is ignored. `"PROJ-123"` gives 123,
/// `"XYZ"` is an error.
pub fn parse_key_number(key: &str) -> Result<i64> {
    let digits: String = key
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();

    digits.parse::<i64>().map_err(|_| Error::KeyParse {
        key: key.to_string(),
    })
}
