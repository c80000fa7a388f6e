//! Contact masking — a data-handling invariant, not a presentation
//! concern.
//!
//! Raw buyer contact details never leave the escalation component; every
//! summary and detail projection carries only a fixed-length suffix. The
//! masked form also hides the original length.

use paygate_types::constants::CONTACT_MASK_SUFFIX_LEN;

/// Mask a contact handle down to its trailing characters.
///
/// `"+15551234567"` becomes `"****4567"`. Values no longer than the
/// visible suffix collapse to `"****"` entirely.
#[must_use]
pub fn mask_contact(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() <= CONTACT_MASK_SUFFIX_LEN {
        return "****".to_string();
    }
    let suffix: String = chars[chars.len() - CONTACT_MASK_SUFFIX_LEN..].iter().collect();
    format!("****{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_fixed_suffix() {
        assert_eq!(mask_contact("+15551234567"), "****4567");
        assert_eq!(mask_contact("buyer@example.com"), "****.com");
    }

    #[test]
    fn hides_original_length() {
        assert_eq!(mask_contact("+4915770000000").len(), mask_contact("12345").len());
    }

    #[test]
    fn short_values_fully_masked() {
        assert_eq!(mask_contact("123"), "****");
        assert_eq!(mask_contact("1234"), "****");
        assert_eq!(mask_contact(""), "****");
    }

    #[test]
    fn multibyte_contacts_do_not_panic() {
        assert_eq!(mask_contact("käufer@händler.de"), "****r.de");
    }
}
