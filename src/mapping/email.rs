use std::collections::HashSet;

use email_address::EmailAddress;
use regex::Regex;
use tracing::warn;

/// Extracts and validates email addresses from raw form values.
pub struct EmailExtractor {
    embedded: Regex,
}

impl EmailExtractor {
    pub fn new() -> Self {
        Self {
            embedded: Regex::new(
                r"(?i)[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)+",
            )
            .unwrap(),
        }
    }

    /// Returns the lower-cased, validated address, or an empty string.
    ///
    /// If the whole value is not a valid address, an embedded address is
    /// extracted from surrounding text ("Anna <anna@site.se>"). A non-empty
    /// `allowed_tlds` set rejects addresses whose last domain label is not in
    /// the set.
    pub fn extract(&self, raw: &str, allowed_tlds: &HashSet<String>) -> String {
        let mut text = raw.trim().to_string();
        if text.is_empty() {
            return String::new();
        }

        if !EmailAddress::is_valid(&text) {
            match self.embedded.find(&text) {
                Some(found) => text = found.as_str().to_string(),
                None => return String::new(),
            }
        }

        let email = text.to_lowercase();
        if !EmailAddress::is_valid(&email) {
            return String::new();
        }

        if allowed_tlds.is_empty() {
            return email;
        }

        let domain = email.rsplit('@').next().unwrap_or("");
        let tld = domain.rsplit('.').next().unwrap_or("");
        if !allowed_tlds.contains(tld) {
            warn!("email dropped, tld '{}' not allowed: {}", tld, email);
            return String::new();
        }
        email
    }
}

impl Default for EmailExtractor {
    fn default() -> Self {
        Self::new()
    }
}
