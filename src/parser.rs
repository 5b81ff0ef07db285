use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{Error, Result};
use crate::types::NameMatch;

// ── Token patterns ─────────────────────────────────────────────────
//
// Real header field examples:
//
//   Structured:
//     Smith, John </O=ENRON/OU=NA/CN=RECIPIENTS/CN=JSMITH>
//     John Smith <jsmith@enron.com>
//     Smith, John <jsmith@enron.com>, Doe, Jane <jdoe@enron.com>
//
//   Address (bare, often quoted):
//     'jsmith@enron.com'
//     jsmith@enron.com
//
//   Bare (no address anywhere in the field):
//     John Smith
//
// One alternation, tried in that order at each position, scanned left
// to right. The bare shape is anchored to the whole field so it only
// fires for single-entry fields with no structure at all. Text between
// matches (separators, X.400 noise) is skipped without error.

static RE_NAME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?P<display>[A-Za-z][A-Za-z0-9 ,.'&_-]*?)\s*<[^<>]*>|(?P<address>["']?[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}["']?)|^(?P<bare>[A-Za-z][A-Za-z .,'-]*)$"#,
    )
    .unwrap()
});

/// All non-overlapping name tokens in a field, left to right.
///
/// Sender fields normally hold exactly one token, but that is the
/// caller's expectation, not a contract here. Recipient fields may
/// yield any number, including zero.
pub fn scan_field(field: &str) -> Result<Vec<NameMatch>> {
    RE_NAME_TOKEN
        .captures_iter(field)
        .map(|caps| shape_of(&caps))
        .collect()
}

/// The first name token in a field, if any. Used for sender fields.
pub fn first_match(field: &str) -> Result<Option<NameMatch>> {
    match RE_NAME_TOKEN.captures(field) {
        Some(caps) => Ok(Some(shape_of(&caps)?)),
        None => Ok(None),
    }
}

/// Classify a match by which group captured. A match where no group
/// captured means the alternation itself is wrong; that propagates as
/// a fatal error rather than being skipped.
fn shape_of(caps: &Captures) -> Result<NameMatch> {
    if let Some(m) = caps.name("display") {
        let display = m.as_str().to_string();
        let has_comma = display.contains(',');
        return Ok(NameMatch::Structured { display, has_comma });
    }
    if let Some(m) = caps.name("address") {
        return Ok(NameMatch::Email {
            address: m.as_str().to_string(),
        });
    }
    if let Some(m) = caps.name("bare") {
        return Ok(NameMatch::Bare {
            text: m.as_str().to_string(),
        });
    }
    Err(Error::InvalidNameMatch {
        matched: caps
            .get(0)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_sender_canonicalizes_to_comma_form() {
        let matches = scan_field("Smith, John <jsmith@enron.com>").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].canonical_key(), "smith, john");
        assert!(matches!(
            matches[0],
            NameMatch::Structured { has_comma: true, .. }
        ));
    }

    #[test]
    fn x400_address_is_stripped() {
        let matches =
            scan_field("Smith, John </O=ENRON/OU=NA/CN=RECIPIENTS/CN=JSMITH>").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].canonical_key(), "smith, john");
    }

    #[test]
    fn quoted_address_keeps_case() {
        let matches = scan_field("'JSmith@enron.com'").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].canonical_key(), "JSmith@enron.com");
    }

    #[test]
    fn bare_name_requires_whole_field() {
        let matches = scan_field("John Smith").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].canonical_key(), "john smith");

        // Digits and colons push the field out of the bare shape.
        assert!(scan_field("re: meeting 10/5").unwrap().is_empty());
    }

    #[test]
    fn recipient_list_yields_tokens_in_order() {
        let matches =
            scan_field("Smith, John <jsmith@x.com>, Doe, Jane <jdoe@x.com>").unwrap();
        let keys: Vec<String> = matches.iter().map(|m| m.canonical_key()).collect();
        assert_eq!(keys, vec!["smith, john", "doe, jane"]);
    }

    #[test]
    fn mixed_recipient_shapes() {
        let matches = scan_field("Doe, Jane <jdoe@x.com>, jsmith@x.com").unwrap();
        let keys: Vec<String> = matches.iter().map(|m| m.canonical_key()).collect();
        assert_eq!(keys, vec!["doe, jane", "jsmith@x.com"]);
    }

    #[test]
    fn unmatched_residue_is_skipped() {
        // Undeliverable-bounce noise around a single structured token.
        let matches =
            scan_field("Undeliverable: Smith, John <jsmith@x.com> (see transcript)").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].canonical_key(), "smith, john");
    }

    #[test]
    fn empty_field_yields_nothing() {
        assert!(scan_field("").unwrap().is_empty());
        assert_eq!(first_match("").unwrap(), None);
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for key in ["smith, john", "john smith", "jsmith@x.com"] {
            let matches = scan_field(key).unwrap();
            assert_eq!(matches.len(), 1);
            assert_eq!(matches[0].canonical_key(), key);
        }
    }
}
