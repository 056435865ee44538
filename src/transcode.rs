//! JSON <-> protobuf transcoding of [`User`] records.

use crate::domain::User;
use crate::error::DecodeError;
use prost::Message;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";
const PROTOBUF_ALIAS: &str = "application/protobuf";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Protobuf,
}

impl Format {
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Json => JSON_CONTENT_TYPE,
            Format::Protobuf => PROTOBUF_CONTENT_TYPE,
        }
    }

    /// Pick the decoder for an inbound `Content-Type` header. A missing header means JSON.
    pub fn from_content_type(header: Option<&str>) -> Result<Self, DecodeError> {
        let Some(raw) = header else {
            return Ok(Format::Json);
        };
        let base = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match base.as_str() {
            "" | JSON_CONTENT_TYPE => Ok(Format::Json),
            PROTOBUF_CONTENT_TYPE | PROTOBUF_ALIAS => Ok(Format::Protobuf),
            _ => Err(DecodeError::UnsupportedContentType(raw.to_string())),
        }
    }
}

/// Bytes produced from a record, tagged with the format they were written in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPayload {
    pub format: Format,
    pub bytes: Vec<u8>,
}

impl EncodedPayload {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn encode(user: &User, format: Format) -> EncodedPayload {
    let bytes = match format {
        // Serializing a struct of two strings into a Vec cannot fail.
        Format::Json => serde_json::to_vec(user).unwrap_or_default(),
        Format::Protobuf => user.encode_to_vec(),
    };
    EncodedPayload { format, bytes }
}

pub fn decode(bytes: &[u8], format: Format) -> Result<User, DecodeError> {
    let user = match format {
        Format::Json => serde_json::from_slice::<User>(bytes)?,
        Format::Protobuf => User::decode(bytes)?,
    };
    if let Some(field) = user.missing_field() {
        return Err(DecodeError::MissingField(field));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<User> {
        vec![
            User::new("Ada", "Lovelace"),
            User::new("Grace", "Hopper"),
            User::new("Émilie", "du Châtelet"),
            User::new("x", "y".repeat(300)),
        ]
    }

    #[test]
    fn round_trips_in_both_formats() {
        for user in samples() {
            for format in [Format::Json, Format::Protobuf] {
                let payload = encode(&user, format);
                assert_eq!(payload.format, format);
                assert_eq!(decode(&payload.bytes, format).unwrap(), user);
            }
        }
    }

    #[test]
    fn json_encoding_uses_field_names() {
        let payload = encode(&User::new("Ada", "Lovelace"), Format::Json);
        let value: serde_json::Value = serde_json::from_slice(&payload.bytes).unwrap();
        assert_eq!(value["firstname"], "Ada");
        assert_eq!(value["lastname"], "Lovelace");
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = decode(b"{\"firstname\": \"Ada\"", Format::Json).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn json_with_missing_field_is_rejected() {
        let err = decode(br#"{"firstname":"Ada"}"#, Format::Json).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField("lastname")));
    }

    #[test]
    fn malformed_protobuf_is_rejected() {
        // Field 1, length-delimited, claims 10 bytes but only 2 follow.
        let err = decode(&[0x0a, 0x0a, b'A', b'd'], Format::Protobuf).unwrap_err();
        assert!(matches!(err, DecodeError::Protobuf(_)));
    }

    #[test]
    fn empty_protobuf_is_incomplete() {
        let err = decode(&[], Format::Protobuf).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField("firstname")));
    }

    #[test]
    fn json_bytes_are_not_protobuf() {
        let json = encode(&User::new("Ada", "Lovelace"), Format::Json);
        assert!(decode(&json.bytes, Format::Protobuf).is_err());
    }

    #[test]
    fn content_type_selection() {
        assert_eq!(Format::from_content_type(None).unwrap(), Format::Json);
        assert_eq!(
            Format::from_content_type(Some("application/json; charset=utf-8")).unwrap(),
            Format::Json
        );
        assert_eq!(
            Format::from_content_type(Some("application/x-protobuf")).unwrap(),
            Format::Protobuf
        );
        assert_eq!(
            Format::from_content_type(Some("Application/Protobuf")).unwrap(),
            Format::Protobuf
        );
        assert!(matches!(
            Format::from_content_type(Some("text/plain")),
            Err(DecodeError::UnsupportedContentType(_))
        ));
    }
}
