//! AdData document model and validation.
//!
//! An AdData document is the ad configuration of one placement script:
//! default ad-unit IDs plus per-format bidfloor settings. Documents arrive as
//! raw JSON, are checked field by field with [`validate_ad_data`], and are
//! then decoded into the typed [`AdData`] model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ad_id::validate_ad_id_detailed;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default number of bidfloor IDs to attempt loading.
pub const DEFAULT_LOAD_COUNT: u32 = 3;

/// Default auto-reload interval in milliseconds.
pub const DEFAULT_AUTO_RELOAD_INTERVAL_MS: u64 = 99_999;

pub const FIELD_DEFAULT_AD_UNIT_DATA: &str = "defaultAdUnitData";
pub const FIELD_BIDFLOOR_CONFIG: &str = "bidfloorConfig";

const AD_UNIT_FIELDS: &[&str] = &["interstitialId", "rewardedVideoId", "bannerId", "aoaId"];

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Default ad-unit IDs, one per ad format. Empty string means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdUnitData {
    pub interstitial_id: String,
    pub rewarded_video_id: String,
    pub banner_id: String,
    pub aoa_id: String,
}

/// Bidfloor settings for a full-screen format (interstitial or rewarded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BidfloorFormatConfig {
    pub default_id: String,
    /// Load-priority order. Duplicates are kept.
    pub bidfloor_ids: Vec<String>,
    pub load_count: u32,
    pub auto_reload_interval: u64,
    pub auto_retry: bool,
}

impl Default for BidfloorFormatConfig {
    fn default() -> Self {
        Self {
            default_id: String::new(),
            bidfloor_ids: Vec::new(),
            load_count: DEFAULT_LOAD_COUNT,
            auto_reload_interval: DEFAULT_AUTO_RELOAD_INTERVAL_MS,
            auto_retry: false,
        }
    }
}

/// Banner bidfloor settings. Banners reload continuously, so there is no
/// load count or retry flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BannerBidfloorConfig {
    pub bidfloor_banner: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BidfloorConfig {
    pub interstitial: BidfloorFormatConfig,
    pub rewarded: BidfloorFormatConfig,
    pub banner: BannerBidfloorConfig,
}

/// The full ad configuration for one script.
///
/// Decoding is lenient (missing sections take defaults); the structural
/// requirement for both top-level keys is enforced by [`validate_ad_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdData {
    pub default_ad_unit_data: AdUnitData,
    pub bidfloor_config: BidfloorConfig,
}

impl AdData {
    /// Validate a raw JSON document and decode it into the typed model.
    ///
    /// Fails with [`CoreError::Validation`] listing every invalid field.
    /// Blank `bidfloorIds` entries are dropped.
    pub fn parse(doc: &Value) -> Result<Self, CoreError> {
        let report = validate_ad_data(doc);
        if !report.is_valid {
            return Err(CoreError::Validation(report.errors));
        }
        let data: AdData = serde_json::from_value(doc.clone())
            .map_err(|e| CoreError::validation(format!("Invalid AdData document: {e}")))?;
        Ok(data.normalized())
    }

    /// Re-run field validation on an already typed document.
    pub fn validate(&self) -> Result<(), CoreError> {
        let doc = serde_json::to_value(self)
            .map_err(|e| CoreError::Internal(format!("Failed to encode AdData: {e}")))?;
        let report = validate_ad_data(&doc);
        if report.is_valid {
            Ok(())
        } else {
            Err(CoreError::Validation(report.errors))
        }
    }

    /// Drop blank entries from both bidfloor ID lists.
    pub fn normalized(mut self) -> Self {
        for format in [
            &mut self.bidfloor_config.interstitial,
            &mut self.bidfloor_config.rewarded,
        ] {
            format.bidfloor_ids.retain(|id| !id.trim().is_empty());
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Document validation
// ---------------------------------------------------------------------------

/// Result of walking an AdData document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdDataValidation {
    pub is_valid: bool,
    /// One entry per invalid field, prefixed with the field path.
    pub errors: Vec<String>,
}

/// Walk a raw AdData document and collect one error per invalid field.
///
/// Both top-level keys must be present; a missing key is reported as such,
/// separately from invalid values. Never stops at the first error.
pub fn validate_ad_data(doc: &Value) -> AdDataValidation {
    let mut errors = Vec::new();

    match doc.as_object() {
        None => errors.push("AdData must be a JSON object".to_string()),
        Some(obj) => {
            match obj.get(FIELD_DEFAULT_AD_UNIT_DATA) {
                None => errors.push(format!(
                    "Missing required field: {FIELD_DEFAULT_AD_UNIT_DATA}"
                )),
                Some(v) => check_ad_unit_data(v, &mut errors),
            }
            match obj.get(FIELD_BIDFLOOR_CONFIG) {
                None => errors.push(format!("Missing required field: {FIELD_BIDFLOOR_CONFIG}")),
                Some(v) => check_bidfloor_config(v, &mut errors),
            }
        }
    }

    AdDataValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn check_ad_unit_data(value: &Value, errors: &mut Vec<String>) {
    let Some(obj) = expect_object(value, FIELD_DEFAULT_AD_UNIT_DATA, errors) else {
        return;
    };
    for field in AD_UNIT_FIELDS {
        if let Some(v) = obj.get(*field) {
            check_optional_ad_id(v, &format!("{FIELD_DEFAULT_AD_UNIT_DATA}.{field}"), errors);
        }
    }
}

fn check_bidfloor_config(value: &Value, errors: &mut Vec<String>) {
    let Some(obj) = expect_object(value, FIELD_BIDFLOOR_CONFIG, errors) else {
        return;
    };
    for format in ["interstitial", "rewarded"] {
        if let Some(v) = obj.get(format) {
            check_format_config(v, &format!("{FIELD_BIDFLOOR_CONFIG}.{format}"), errors);
        }
    }
    if let Some(v) = obj.get("banner") {
        let path = format!("{FIELD_BIDFLOOR_CONFIG}.banner");
        if let Some(banner) = expect_object(v, &path, errors) {
            if let Some(id) = banner.get("bidfloorBanner") {
                check_optional_ad_id(id, &format!("{path}.bidfloorBanner"), errors);
            }
        }
    }
}

fn check_format_config(value: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(obj) = expect_object(value, path, errors) else {
        return;
    };

    if let Some(v) = obj.get("defaultId") {
        check_optional_ad_id(v, &format!("{path}.defaultId"), errors);
    }

    if let Some(v) = obj.get("bidfloorIds") {
        match v.as_array() {
            None => errors.push(format!("{path}.bidfloorIds: must be an array")),
            Some(ids) => {
                for (i, id) in ids.iter().enumerate() {
                    check_optional_ad_id(id, &format!("{path}.bidfloorIds[{i}]"), errors);
                }
            }
        }
    }

    if let Some(v) = obj.get("loadCount") {
        if !is_positive_int(v, u64::from(u32::MAX)) {
            errors.push(format!("{path}.loadCount: must be a positive integer"));
        }
    }
    if let Some(v) = obj.get("autoReloadInterval") {
        if !is_positive_int(v, u64::MAX) {
            errors.push(format!(
                "{path}.autoReloadInterval: must be a positive integer (milliseconds)"
            ));
        }
    }
    if let Some(v) = obj.get("autoRetry") {
        if !v.is_boolean() {
            errors.push(format!("{path}.autoRetry: must be a boolean"));
        }
    }
}

/// An optional AdId: the empty string is accepted as "unset".
fn check_optional_ad_id(value: &Value, path: &str, errors: &mut Vec<String>) {
    if value.as_str() == Some("") {
        return;
    }
    let check = validate_ad_id_detailed(value);
    if let Some(err) = check.error {
        errors.push(format!("{path}: {}", err.message()));
    }
}

fn expect_object<'a>(
    value: &'a Value,
    path: &str,
    errors: &mut Vec<String>,
) -> Option<&'a Map<String, Value>> {
    let obj = value.as_object();
    if obj.is_none() {
        errors.push(format!("{path}: must be an object"));
    }
    obj
}

fn is_positive_int(value: &Value, max: u64) -> bool {
    value.as_u64().is_some_and(|n| n >= 1 && n <= max)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
