//! Complaint record model
//!
//! The canonical shape of a complaint record, its status lifecycle, and the
//! formatting rules that must stay consistent between the public form, the
//! stored document, and the receipt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed national phone prefix. Only the 10-digit subscriber part is mutable.
pub const PHONE_PREFIX: &str = "+91 ";

/// Aadhaar identity numbers are 16 digits, displayed in blocks of 4.
const AADHAR_DIGITS: usize = 16;

/// Complaint status lifecycle: `Pending` → `Resolved`, one-directional.
///
/// This is the single source of truth for the wire strings and the
/// status-derived presentation used by both the map and the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintStatus {
    #[serde(rename = "Pending ⏳")]
    Pending,
    #[serde(rename = "Resolved ✅")]
    Resolved,
}

impl ComplaintStatus {
    /// Wire string stored in the document store and shown to operators.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending ⏳",
            Self::Resolved => "Resolved ✅",
        }
    }

    /// Parse the stored wire string. Unknown strings are rejected at the
    /// boundary rather than defaulted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending ⏳" => Some(Self::Pending),
            "Resolved ✅" => Some(Self::Resolved),
            _ => None,
        }
    }

    /// Map marker color for this status.
    pub fn marker_color(&self) -> MarkerColor {
        match self {
            Self::Pending => MarkerColor::Red,
            Self::Resolved => MarkerColor::Green,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    /// Resolved records are rendered with reduced visual emphasis.
    pub fn is_muted(&self) -> bool {
        self.is_resolved()
    }
}

/// Marker color for map pins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    /// Alert color for pending complaints
    Red,
    /// Resolved complaints
    Green,
}

/// One citizen-submitted incident report.
///
/// `complaint_id` is immutable once generated; it joins the record, its
/// uploaded images' storage paths, and its receipt. `created_at` is assigned
/// by the store at insertion time, never by the submitting client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintRecord {
    /// Document id (ULID)
    pub id: String,
    /// Human-shareable identifier, format `CF-XXXXXX`
    #[serde(rename = "complaintId")]
    pub complaint_id: String,
    pub name: String,
    /// `+91 XXXXXXXXXX`
    pub phone: String,
    /// `XXXX XXXX XXXX XXXX`
    pub aadhar: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    /// Resolvable URLs in capture/selection order
    pub images: Vec<String>,
    pub status: ComplaintStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Generate a `CF-XXXXXX` complaint identifier from a uniform random source
/// over `[A-Z0-9]`.
///
/// Called exactly once per submission; the same id keys the image storage
/// paths, the stored record, and the receipt. Collisions are not checked;
/// 36^6 ids make them improbable at expected volumes.
pub fn generate_complaint_id() -> String {
    use rand::Rng;

    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    format!("CF-{}", suffix)
}

/// Format an Aadhaar identity number for storage and display.
///
/// Strips all non-digit characters, truncates to 16 digits, and re-renders
/// grouped in chunks of 4 separated by single spaces. Idempotent: formatting
/// already-formatted input yields the same result.
pub fn format_aadhar(input: &str) -> String {
    let digits: String = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(AADHAR_DIGITS)
        .collect();

    digits
        .as_bytes()
        .chunks(4)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sanitize a phone field edit.
///
/// Any edit that does not begin with the fixed prefix resets the field to
/// the prefix; otherwise only digits after the prefix are kept, capped at 10.
pub fn sanitize_phone(input: &str) -> String {
    let Some(rest) = input.strip_prefix(PHONE_PREFIX) else {
        return PHONE_PREFIX.to_string();
    };

    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).take(10).collect();
    format!("{}{}", PHONE_PREFIX, digits)
}

/// Check that a phone value is fully formed: prefix plus 10 digits.
pub fn is_complete_phone(value: &str) -> bool {
    value
        .strip_prefix(PHONE_PREFIX)
        .map(|rest| rest.len() == 10 && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complaint_id_matches_pattern() {
        for _ in 0..100 {
            let id = generate_complaint_id();
            assert_eq!(id.len(), 9);
            assert!(id.starts_with("CF-"));
            assert!(
                id[3..]
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                "unexpected id: {}",
                id
            );
        }
    }

    #[test]
    fn consecutive_complaint_ids_differ() {
        let first = generate_complaint_id();
        let second = generate_complaint_id();
        // 1 in 36^6 chance of a false failure
        assert_ne!(first, second);
    }

    #[test]
    fn aadhar_groups_in_blocks_of_four() {
        assert_eq!(
            format_aadhar("1234567890123456"),
            "1234 5678 9012 3456"
        );
    }

    #[test]
    fn aadhar_strips_non_digits_and_truncates() {
        assert_eq!(
            format_aadhar("12ab34-5678 9012 3456 789"),
            "1234 5678 9012 3456"
        );
    }

    #[test]
    fn aadhar_formatting_is_idempotent() {
        let once = format_aadhar("1234567890123456");
        assert_eq!(format_aadhar(&once), once);

        let partial = format_aadhar("12345");
        assert_eq!(format_aadhar(&partial), partial);
    }

    #[test]
    fn aadhar_handles_partial_input() {
        assert_eq!(format_aadhar("12345"), "1234 5");
        assert_eq!(format_aadhar(""), "");
    }

    #[test]
    fn phone_resets_when_prefix_removed() {
        assert_eq!(sanitize_phone("9876543210"), PHONE_PREFIX);
        assert_eq!(sanitize_phone(""), PHONE_PREFIX);
        assert_eq!(sanitize_phone("+1 555"), PHONE_PREFIX);
    }

    #[test]
    fn phone_keeps_at_most_ten_digits() {
        assert_eq!(sanitize_phone("+91 98765432109999"), "+91 9876543210");
        assert_eq!(sanitize_phone("+91 98ab76cd54"), "+91 987654");
    }

    #[test]
    fn phone_completeness() {
        assert!(is_complete_phone("+91 9876543210"));
        assert!(!is_complete_phone("+91 987654321"));
        assert!(!is_complete_phone("9876543210"));
    }

    #[test]
    fn status_round_trips_wire_strings() {
        assert_eq!(
            ComplaintStatus::parse(ComplaintStatus::Pending.as_str()),
            Some(ComplaintStatus::Pending)
        );
        assert_eq!(
            ComplaintStatus::parse(ComplaintStatus::Resolved.as_str()),
            Some(ComplaintStatus::Resolved)
        );
        assert_eq!(ComplaintStatus::parse("Pending"), None);
    }

    #[test]
    fn status_presentation_mapping() {
        assert_eq!(ComplaintStatus::Pending.marker_color(), MarkerColor::Red);
        assert_eq!(ComplaintStatus::Resolved.marker_color(), MarkerColor::Green);
        assert!(ComplaintStatus::Resolved.is_muted());
        assert!(!ComplaintStatus::Pending.is_muted());
    }
}
