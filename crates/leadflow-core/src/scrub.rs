//! PII detection and redaction for text crossing a trust boundary.
//!
//! Research summaries and anything returned by the text-transform service
//! pass through [`scrub_pii`] before they reach a draft. Redaction markers
//! are themselves placeholder artifacts, so a draft that needed scrubbing
//! still fails validation and goes through repair.

use std::sync::OnceLock;

use regex::Regex;

/// Replacement for email-like tokens.
pub const REDACTED_EMAIL: &str = "[REDACTED_EMAIL]";

/// Replacement for phone-like tokens.
pub const REDACTED_PHONE: &str = "[REDACTED_PHONE]";

pub(crate) fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\b")
            .expect("email pattern is a valid regex")
    })
}

pub(crate) fn phone_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\+?\d[\d\-\s]{7,}\d").expect("phone pattern is a valid regex")
    })
}

/// Whether `text` contains an email address or phone number.
pub fn contains_pii(text: &str) -> bool {
    email_pattern().is_match(text) || phone_pattern().is_match(text)
}

/// Replace email- and phone-like tokens with redaction markers.
pub fn scrub_pii(text: &str) -> String {
    let text = email_pattern().replace_all(text, REDACTED_EMAIL);
    phone_pattern().replace_all(&text, REDACTED_PHONE).into_owned()
}
