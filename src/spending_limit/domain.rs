//! The spending limit models and the rules for valid limits and thresholds.

use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CategoryLimitId};

/// The warning threshold used when none is given, as a percentage of the limit.
pub const DEFAULT_WARNING_THRESHOLD: f64 = 80.0;

/// Check that `threshold` is a percentage in the range [0, 100].
///
/// # Errors
///
/// Returns an [Error::InvalidThreshold] if `threshold` is outside of [0, 100] or not a number.
pub fn validate_threshold(threshold: f64) -> Result<f64, Error> {
    if (0.0..=100.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(Error::InvalidThreshold)
    }
}

/// Check that `limit` is zero or a positive, finite number.
///
/// # Errors
///
/// Returns an [Error::InvalidLimit] otherwise.
pub fn validate_limit(limit: f64) -> Result<f64, Error> {
    if limit.is_finite() && limit >= 0.0 {
        Ok(limit)
    } else {
        Err(Error::InvalidLimit)
    }
}

/// A cap on the spending in a single category each month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLimit {
    /// The ID of this entry, stable across edits of the other entries.
    pub id: CategoryLimitId,
    /// The expense category the limit applies to, matched ignoring case.
    pub category: String,
    /// The most the user wants to spend in the category each month.
    pub limit: f64,
    /// The percentage of `limit` at which a warning is raised.
    pub warning_threshold: f64,
}

/// A validated category limit that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategoryLimit {
    /// The expense category the limit applies to.
    pub category: String,
    /// The most the user wants to spend in the category each month.
    pub limit: f64,
    /// The percentage of `limit` at which a warning is raised.
    pub warning_threshold: f64,
}

/// Which alerts the user wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettings {
    /// Whether to check spending against the monthly limit.
    pub monthly_limit_enabled: bool,
    /// Whether to check spending against the category limits.
    pub category_limit_enabled: bool,
    /// Whether to compare the month's spending with the month's income.
    pub income_vs_expense_enabled: bool,
    /// The percentage of the monthly limit at which a warning is raised.
    pub monthly_warning_threshold: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            monthly_limit_enabled: true,
            category_limit_enabled: true,
            income_vs_expense_enabled: true,
            monthly_warning_threshold: DEFAULT_WARNING_THRESHOLD,
        }
    }
}

/// Changes to some of the alert settings. Fields left as `None` are kept as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettingsPatch {
    /// See [AlertSettings::monthly_limit_enabled].
    pub monthly_limit_enabled: Option<bool>,
    /// See [AlertSettings::category_limit_enabled].
    pub category_limit_enabled: Option<bool>,
    /// See [AlertSettings::income_vs_expense_enabled].
    pub income_vs_expense_enabled: Option<bool>,
    /// See [AlertSettings::monthly_warning_threshold].
    pub monthly_warning_threshold: Option<f64>,
}

impl AlertSettings {
    /// Apply the fields present in `patch`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidThreshold] if the patch sets a threshold outside of [0, 100].
    pub fn merge(self, patch: AlertSettingsPatch) -> Result<Self, Error> {
        Ok(Self {
            monthly_limit_enabled: patch
                .monthly_limit_enabled
                .unwrap_or(self.monthly_limit_enabled),
            category_limit_enabled: patch
                .category_limit_enabled
                .unwrap_or(self.category_limit_enabled),
            income_vs_expense_enabled: patch
                .income_vs_expense_enabled
                .unwrap_or(self.income_vs_expense_enabled),
            monthly_warning_threshold: patch
                .monthly_warning_threshold
                .map(validate_threshold)
                .transpose()?
                .unwrap_or(self.monthly_warning_threshold),
        })
    }
}

/// A user's spending limits and alert preferences.
///
/// Every user has at most one, created with the defaults the first time it is needed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingLimit {
    /// The cap on total spending each month, zero meaning no cap.
    pub monthly_limit: f64,
    /// Per-category caps, in the order they were added.
    pub category_limits: Vec<CategoryLimit>,
    /// Which alerts are enabled.
    pub alert_settings: AlertSettings,
}

impl SpendingLimit {
    /// Find the limit for `category`, ignoring case.
    pub fn category_limit(&self, category: &str) -> Option<&CategoryLimit> {
        self.category_limits
            .iter()
            .find(|category_limit| same_category(&category_limit.category, category))
    }
}

/// Whether two category names refer to the same category.
///
/// Matches the `NOCASE` collation of the expense category column.
pub fn same_category(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        spending_limit::domain::{
            AlertSettings, AlertSettingsPatch, CategoryLimit, SpendingLimit, validate_limit,
            validate_threshold,
        },
    };

    #[test]
    fn thresholds_must_be_percentages() {
        assert_eq!(validate_threshold(0.0), Ok(0.0));
        assert_eq!(validate_threshold(100.0), Ok(100.0));
        assert_eq!(validate_threshold(-0.5), Err(Error::InvalidThreshold));
        assert_eq!(validate_threshold(100.5), Err(Error::InvalidThreshold));
        assert_eq!(validate_threshold(f64::NAN), Err(Error::InvalidThreshold));
    }

    #[test]
    fn limits_must_not_be_negative() {
        assert_eq!(validate_limit(0.0), Ok(0.0));
        assert_eq!(validate_limit(250.0), Ok(250.0));
        assert_eq!(validate_limit(-1.0), Err(Error::InvalidLimit));
        assert_eq!(validate_limit(f64::INFINITY), Err(Error::InvalidLimit));
    }

    #[test]
    fn merge_keeps_fields_missing_from_patch() {
        let settings = AlertSettings::default();

        let merged = settings
            .merge(AlertSettingsPatch {
                income_vs_expense_enabled: Some(false),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(
            merged,
            AlertSettings {
                income_vs_expense_enabled: false,
                ..settings
            }
        );
    }

    #[test]
    fn merge_rejects_invalid_threshold() {
        let result = AlertSettings::default().merge(AlertSettingsPatch {
            monthly_warning_threshold: Some(150.0),
            ..Default::default()
        });

        assert_eq!(result, Err(Error::InvalidThreshold));
    }

    #[test]
    fn category_limit_lookup_ignores_case() {
        let spending_limit = SpendingLimit {
            monthly_limit: 0.0,
            category_limits: vec![CategoryLimit {
                id: 1,
                category: "Groceries".to_owned(),
                limit: 100.0,
                warning_threshold: 80.0,
            }],
            alert_settings: AlertSettings::default(),
        };

        assert_eq!(
            spending_limit.category_limit("groceries").map(|limit| limit.id),
            Some(1)
        );
        assert!(spending_limit.category_limit("Rent").is_none());
    }
}
