//! Schema definitions for metadata objects.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

/// The category a metadata entry is organized under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Hosts,
    Stacks,
    Services,
    Containers,
}

impl ObjectClass {
    /// All classes, in the order they are listed in help text.
    pub const ALL: [ObjectClass; 4] = [
        ObjectClass::Hosts,
        ObjectClass::Stacks,
        ObjectClass::Services,
        ObjectClass::Containers,
    ];

    /// Path segment used by the metadata service for this class.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::Hosts => "hosts",
            ObjectClass::Stacks => "stacks",
            ObjectClass::Services => "services",
            ObjectClass::Containers => "containers",
        }
    }

    /// Path of a single value belonging to one object of this class.
    pub fn value_path(&self, object_name: &str, value_name: &str) -> String {
        format!("{}/{}/{}", self.as_str(), object_name, value_name)
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectClass::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| Error::InvalidObjectClass(s.to_string()))
    }
}

/// One entry of the object list returned by the metadata service.
///
/// Only `name` and `labels` are read; everything else in the entry is
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledObject {
    /// Identifier, unique within its class.
    pub name: String,

    /// Label name to label value.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: HashMap<String, String>,
}

impl LabeledObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: HashMap::new(),
        }
    }

    /// Builder-style label setter.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Value of a label, `None` when the label is not set.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode the JSON body of an object-list response.
pub fn decode_objects(body: &str) -> crate::Result<Vec<LabeledObject>> {
    serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))
}
