//! API key handling
//!
//! Keys live in [`SecretString`], whose `Debug` and `Display` never print the
//! value. [`SecretString::hint`] gives a short fingerprint that is safe to log.

use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// Prefixes of known key formats, longest first
const KEY_PREFIXES: [&str; 3] = ["sk-ant-", "sk-proj-", "sk-"];

/// An API key or other credential
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key, for building request headers only
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Known key prefix plus the last four characters, e.g. `sk-ant-...wxyz`.
    ///
    /// Keys too short to hide anything, or not ASCII, are fully redacted.
    pub fn hint(&self) -> String {
        let key = self.0.as_str();
        if key.is_empty() {
            return "[EMPTY]".to_string();
        }
        if key.len() < 12 || !key.is_ascii() {
            return REDACTED.to_string();
        }

        let prefix = KEY_PREFIXES
            .iter()
            .find(|p| key.starts_with(*p))
            .copied()
            .unwrap_or("");
        format!("{}...{}", prefix, &key[key.len() - 4..])
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Describe a value in logs without leaking credentials
pub trait SafeLogging {
    fn safe_for_logging(&self) -> String;
}

impl SafeLogging for SecretString {
    fn safe_for_logging(&self) -> String {
        self.hint()
    }
}

impl SafeLogging for Option<SecretString> {
    fn safe_for_logging(&self) -> String {
        self.as_ref()
            .map_or_else(|| "unset".to_string(), SecretString::hint)
    }
}

/// Whether a header name suggests it carries a credential
pub fn is_sensitive_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["key", "secret", "token", "password", "auth"]
        .iter()
        .any(|marker| lower.contains(marker))
}
