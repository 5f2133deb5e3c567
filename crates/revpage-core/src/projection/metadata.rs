//! Flattening of structured technical metadata into name/value entries

use serde::ser::{SerializeSeq, SerializeStruct, Serializer};
use serde::Serialize;
use serde_json::Value;

/// Element tag for metadata lists, used by consumers that serialize
/// sequences as repeated named elements.
pub const METADATA_TAG: &str = "metadata";

/// Ordered list of metadata entries
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataList {
    pub tag: &'static str,
    pub entries: Vec<MetadataEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub name: String,
    pub value: MetadataValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Scalar(Value),
    Nested(MetadataList),
}

/// Flatten a JSON object or array into a name/value list, recursing into
/// nested containers. Array elements are named by their index. A scalar at
/// the top level has no names to offer and yields an empty list.
pub fn flatten_metadata(value: &Value) -> MetadataList {
    let entries = match value {
        Value::Object(map) => map
            .iter()
            .map(|(name, v)| entry(name.clone(), v))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| entry(i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };
    MetadataList {
        tag: METADATA_TAG,
        entries,
    }
}

fn entry(name: String, value: &Value) -> MetadataEntry {
    let value = match value {
        Value::Object(_) | Value::Array(_) => MetadataValue::Nested(flatten_metadata(value)),
        scalar => MetadataValue::Scalar(scalar.clone()),
    };
    MetadataEntry { name, value }
}

impl Serialize for MetadataList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for e in &self.entries {
            seq.serialize_element(e)?;
        }
        seq.end()
    }
}

impl Serialize for MetadataEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("MetadataEntry", 2)?;
        st.serialize_field("name", &self.name)?;
        match &self.value {
            MetadataValue::Scalar(v) => st.serialize_field("value", v)?,
            MetadataValue::Nested(list) => st.serialize_field("value", list)?,
        }
        st.end()
    }
}
