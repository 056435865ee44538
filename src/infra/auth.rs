use crate::app::ports::CredentialValidator;
use crate::constants::APIKEY_SCHEME;

/// Key portion of an `Authorization: Apikey <key>` header: everything after the
/// first space, untouched. Scheme is case-insensitive.
pub fn parse_apikey(header: Option<&str>) -> Option<&str> {
    let (scheme, key) = header?.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(APIKEY_SCHEME) {
        return None;
    }
    (!key.is_empty()).then_some(key)
}

/// Accepts exactly one configured key.
#[derive(Debug, Clone)]
pub struct StaticKeyValidator {
    valid_key: String,
}

impl StaticKeyValidator {
    pub fn new(valid_key: impl Into<String>) -> Self {
        Self {
            valid_key: valid_key.into(),
        }
    }
}

impl CredentialValidator for StaticKeyValidator {
    fn validate(&self, key: &str) -> bool {
        !self.valid_key.is_empty() && key == self.valid_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_apikey_scheme() {
        assert_eq!(parse_apikey(Some("Apikey 123456")), Some("123456"));
        assert_eq!(parse_apikey(Some("apikey 123456")), Some("123456"));
        assert_eq!(parse_apikey(Some("Bearer 123456")), None);
        assert_eq!(parse_apikey(Some("Apikey")), None);
        assert_eq!(parse_apikey(Some("Apikey ")), None);
        assert_eq!(parse_apikey(None), None);
    }

    #[test]
    fn padded_keys_do_not_match() {
        let validator = StaticKeyValidator::new("123456");
        for header in ["Apikey  123456", "Apikey 123456 ", " Apikey 123456"] {
            let accepted = parse_apikey(Some(header))
                .map(|key| validator.validate(key))
                .unwrap_or(false);
            assert!(!accepted, "{header:?} must be rejected");
        }
    }

    #[test]
    fn only_the_configured_key_is_valid() {
        let validator = StaticKeyValidator::new("123456");
        assert!(validator.validate("123456"));
        assert!(!validator.validate("1234560"));
        assert!(!validator.validate("12345"));
        assert!(!validator.validate(""));
    }
}
