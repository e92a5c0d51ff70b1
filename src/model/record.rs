//! Target record model.
//!
//! Target records are produced one page at a time by the target search
//! endpoint and live only for the current iteration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of record on the target side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A Jira issue (fields live under `fields`).
    Issue,
    /// A TM4J test case (fields live under `customFields`).
    TestCase,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::TestCase => "test case",
        }
    }
}

/// A record in the target instance.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRecord {
    /// System-native identifier (e.g. "QA-12" or "QA-T34").
    pub key: String,

    /// Field map the external key is looked up in, if the provider returned one.
    pub fields: Option<Map<String, Value>>,

    pub kind: RecordKind,
}

impl TargetRecord {
    pub fn new(key: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            key: key.into(),
            fields: None,
            kind,
        }
    }

    /// Attach a field map.
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// Inclusive numeric range over the suffix of external keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyRange {
    pub start: i64,
    pub end: i64,
}

impl KeyRange {
    /// Range covering every representable key number.
    pub const UNBOUNDED: Self = Self {
        start: i64::MIN,
        end: i64::MAX,
    };

    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn contains(&self, n: i64) -> bool {
        n >= self.start && n <= self.end
    }

    /// Both ends were configured explicitly.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.start != i64::MIN && self.end != i64::MAX
    }
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}
