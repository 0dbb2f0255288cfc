//! Ad unit identifier validation.
//!
//! An AdId is exactly 16 characters drawn from `a-z` and `0-9`. The empty
//! string means "unset" and is accepted wherever an AdId field is optional;
//! that decision belongs to the caller, so [`is_valid_ad_id`] itself rejects
//! it.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Required length of an AdId in characters.
pub const AD_ID_LENGTH: usize = 16;

/// Lexical rule for an AdId.
pub const AD_ID_PATTERN: &str = r"^[a-z0-9]{16}$";

static AD_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(AD_ID_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Return `true` iff `candidate` is 16 characters of lowercase ASCII letters
/// and digits.
pub fn is_valid_ad_id(candidate: &str) -> bool {
    AD_ID_RE.is_match(candidate)
}

/// Why a candidate failed AdId validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdIdError {
    /// Empty string.
    Empty,
    /// Not a string at all (null, number, object, ...).
    WrongType,
    /// A string of the wrong length.
    WrongLength { actual: usize },
    /// Right length, but contains characters outside `a-z0-9`.
    InvalidCharacters,
}

impl AdIdError {
    /// Human-readable description of the failure.
    pub fn message(&self) -> String {
        match self {
            Self::Empty => "Ad ID must not be empty".to_string(),
            Self::WrongType => "Ad ID must be a string".to_string(),
            Self::WrongLength { actual } => {
                format!("Ad ID must be exactly {AD_ID_LENGTH} characters (got {actual})")
            }
            Self::InvalidCharacters => {
                "Ad ID may only contain lowercase letters a-z and digits 0-9".to_string()
            }
        }
    }
}

/// Outcome of [`validate_ad_id_detailed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdIdCheck {
    pub is_valid: bool,
    pub error: Option<AdIdError>,
    /// The candidate as a string, when it was one.
    pub value: Option<String>,
}

/// Validate a raw JSON value as an AdId and classify any failure.
pub fn validate_ad_id_detailed(candidate: &serde_json::Value) -> AdIdCheck {
    let Some(s) = candidate.as_str() else {
        return AdIdCheck {
            is_valid: false,
            error: Some(AdIdError::WrongType),
            value: None,
        };
    };

    let error = classify(s);
    AdIdCheck {
        is_valid: error.is_none(),
        error,
        value: Some(s.to_string()),
    }
}

fn classify(s: &str) -> Option<AdIdError> {
    if s.is_empty() {
        return Some(AdIdError::Empty);
    }
    let actual = s.chars().count();
    if actual != AD_ID_LENGTH {
        return Some(AdIdError::WrongLength { actual });
    }
    if !is_valid_ad_id(s) {
        return Some(AdIdError::InvalidCharacters);
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
