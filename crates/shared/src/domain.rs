use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(RecordId);
id_newtype!(NetworkId);

/// Record types the query service can page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Contact,
    Case,
    Email,
}

impl RecordKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            RecordKind::Contact => "contacts",
            RecordKind::Case => "cases",
            RecordKind::Email => "emails",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Name of an entity-filter slot, also its key in the query payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterName {
    ContactFilter,
    CaseFilter,
    EmailFilter,
}

impl FilterName {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterName::ContactFilter => "contactFilter",
            FilterName::CaseFilter => "caseFilter",
            FilterName::EmailFilter => "emailFilter",
        }
    }
}

impl fmt::Display for FilterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row returned by the query service. Field names are whatever the
/// service sends; `Id` is the identity key and `selected` is UI-only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordView(pub Map<String, Value>);

impl RecordView {
    pub const ID_FIELD: &'static str = "Id";
    pub const SELECTED_FIELD: &'static str = "selected";

    pub fn id(&self) -> Option<RecordId> {
        self.str_field(Self::ID_FIELD).map(RecordId::new)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_selected(&self) -> bool {
        self.0
            .get(Self::SELECTED_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.set_field(Self::SELECTED_FIELD, selected);
    }
}

impl From<Map<String, Value>> for RecordView {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}
