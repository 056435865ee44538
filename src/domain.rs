//! Payload record carried through both hops.

use serde::{Deserialize, Serialize};

/// A person record. Both names are required; an empty string counts as absent.
///
/// The same type is used for the JSON and protobuf encodings, so the field
/// tags below are part of the wire contract between the two hops.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message, Serialize, Deserialize)]
pub struct User {
    #[prost(string, tag = "1")]
    #[serde(default)]
    pub firstname: String,
    #[prost(string, tag = "2")]
    #[serde(default)]
    pub lastname: String,
}

impl User {
    pub fn new(firstname: impl Into<String>, lastname: impl Into<String>) -> Self {
        Self {
            firstname: firstname.into(),
            lastname: lastname.into(),
        }
    }

    /// Name of the first required field that is empty, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.firstname.is_empty() {
            Some("firstname")
        } else if self.lastname.is_empty() {
            Some("lastname")
        } else {
            None
        }
    }
}
