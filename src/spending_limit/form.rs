//! Request bodies for the spending limit endpoints and their validation.

use serde::Deserialize;

use crate::{
    Error,
    extract::{LooseNumber, non_blank},
    spending_limit::domain::{
        AlertSettingsPatch, DEFAULT_WARNING_THRESHOLD, NewCategoryLimit, same_category,
        validate_limit, validate_threshold,
    },
};

const MISSING_CATEGORY_FIELDS: &str = "Category and limit are required";

/// A category limit as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLimitForm {
    /// The expense category.
    pub category: Option<String>,
    /// The monthly cap for the category.
    pub limit: Option<LooseNumber>,
    /// The percentage of the limit at which to warn the user.
    pub warning_threshold: Option<LooseNumber>,
}

/// A validated category limit form. The threshold is `None` when the client did not send one.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCategoryLimit {
    /// The trimmed category name.
    pub category: String,
    /// A positive limit.
    pub limit: f64,
    /// A threshold in [0, 100], if given.
    pub warning_threshold: Option<f64>,
}

impl ValidCategoryLimit {
    /// Convert into a new category limit, using the default threshold if none was given.
    pub fn into_new_limit(self) -> NewCategoryLimit {
        NewCategoryLimit {
            category: self.category,
            limit: self.limit,
            warning_threshold: self.warning_threshold.unwrap_or(DEFAULT_WARNING_THRESHOLD),
        }
    }
}

impl CategoryLimitForm {
    /// Validate a category limit that is being added or edited.
    ///
    /// # Errors
    ///
    /// Returns a:
    /// - [Error::MissingFields] if the category is blank or the limit is missing or zero,
    /// - [Error::InvalidLimit] if the limit is negative or not a number,
    /// - [Error::InvalidThreshold] if the threshold is not a number in [0, 100].
    pub fn validate(self) -> Result<ValidCategoryLimit, Error> {
        let (Some(category), Some(raw_limit)) = (non_blank(self.category), self.limit) else {
            return Err(Error::MissingFields(MISSING_CATEGORY_FIELDS));
        };

        let limit = match raw_limit {
            LooseNumber::Text(text) if text.trim().is_empty() => {
                return Err(Error::MissingFields(MISSING_CATEGORY_FIELDS));
            }
            raw_limit => raw_limit.value().ok_or(Error::InvalidLimit)?,
        };

        if limit == 0.0 {
            return Err(Error::MissingFields(MISSING_CATEGORY_FIELDS));
        }

        Ok(ValidCategoryLimit {
            category,
            limit: validate_limit(limit)?,
            warning_threshold: parse_threshold(self.warning_threshold)?,
        })
    }
}

/// Parse an optional warning threshold.
///
/// # Errors
///
/// Returns an [Error::InvalidThreshold] if the threshold is given but is not a number in [0, 100].
pub fn parse_threshold(raw_threshold: Option<LooseNumber>) -> Result<Option<f64>, Error> {
    raw_threshold
        .map(|threshold| {
            threshold
                .value()
                .ok_or(Error::InvalidThreshold)
                .and_then(validate_threshold)
        })
        .transpose()
}

/// Check that no two of `categories` name the same category, ignoring case.
///
/// # Errors
///
/// Returns an [Error::DuplicateCategoryLimit] on the first repeated name.
pub fn ensure_unique_categories<'a>(
    categories: impl IntoIterator<Item = &'a str>,
) -> Result<(), Error> {
    let mut seen: Vec<&str> = Vec::new();

    for category in categories {
        if seen.iter().any(|other| same_category(other, category)) {
            return Err(Error::DuplicateCategoryLimit);
        }
        seen.push(category);
    }

    Ok(())
}

/// The body of a request to set the monthly limit.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyLimitForm {
    /// The new monthly limit. Missing or non-numeric values clear the limit.
    pub limit: Option<LooseNumber>,
    /// The new monthly warning threshold, if it should change.
    pub warning_threshold: Option<LooseNumber>,
}

impl MonthlyLimitForm {
    /// Validate the form, returning the monthly limit and optional threshold.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidLimit] for a negative limit or an
    /// [Error::InvalidThreshold] for a threshold outside of [0, 100].
    pub fn validate(self) -> Result<(f64, Option<f64>), Error> {
        let warning_threshold = parse_threshold(self.warning_threshold)?;
        let limit = self
            .limit
            .and_then(|limit| limit.value())
            .unwrap_or_default();

        Ok((validate_limit(limit)?, warning_threshold))
    }
}

/// The body of a request to update any part of the spending limits.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingLimitUpdate {
    /// The new monthly limit.
    pub monthly_limit: Option<LooseNumber>,
    /// A list that replaces all of the current category limits.
    pub category_limits: Option<Vec<CategoryLimitForm>>,
    /// Alert settings to merge into the current settings.
    pub alert_settings: Option<AlertSettingsPatch>,
}

/// A validated [SpendingLimitUpdate].
#[derive(Debug, Default, PartialEq)]
pub struct ValidSpendingLimitUpdate {
    /// The new monthly limit.
    pub monthly_limit: Option<f64>,
    /// The replacement category limits.
    pub category_limits: Option<Vec<NewCategoryLimit>>,
    /// Alert settings to merge into the current settings.
    pub alert_settings: Option<AlertSettingsPatch>,
}

impl SpendingLimitUpdate {
    /// Validate every part of the update before anything is written.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found in the monthly limit, the
    /// category limits or the alert settings.
    pub fn validate(self) -> Result<ValidSpendingLimitUpdate, Error> {
        let monthly_limit = self
            .monthly_limit
            .map(|limit| limit.value().ok_or(Error::InvalidLimit).and_then(validate_limit))
            .transpose()?;

        let category_limits = self
            .category_limits
            .map(|forms| {
                forms
                    .into_iter()
                    .map(|form| form.validate().map(ValidCategoryLimit::into_new_limit))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        if let Some(category_limits) = &category_limits {
            ensure_unique_categories(category_limits.iter().map(|limit| limit.category.as_str()))?;
        }

        if let Some(threshold) = self
            .alert_settings
            .and_then(|settings| settings.monthly_warning_threshold)
        {
            validate_threshold(threshold)?;
        }

        Ok(ValidSpendingLimitUpdate {
            monthly_limit,
            category_limits,
            alert_settings: self.alert_settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        extract::LooseNumber,
        spending_limit::form::{
            CategoryLimitForm, MonthlyLimitForm, SpendingLimitUpdate, ValidCategoryLimit,
            ensure_unique_categories,
        },
    };

    fn form(category: &str, limit: LooseNumber, threshold: Option<f64>) -> CategoryLimitForm {
        CategoryLimitForm {
            category: Some(category.to_owned()),
            limit: Some(limit),
            warning_threshold: threshold.map(LooseNumber::Number),
        }
    }

    #[test]
    fn category_form_accepts_string_numbers() {
        let result = form("Food", LooseNumber::Text("150".to_owned()), Some(70.0)).validate();

        assert_eq!(
            result,
            Ok(ValidCategoryLimit {
                category: "Food".to_owned(),
                limit: 150.0,
                warning_threshold: Some(70.0),
            })
        );
    }

    #[test]
    fn category_form_uses_default_threshold() {
        let new_limit = form("Food", LooseNumber::Number(10.0), None)
            .validate()
            .unwrap()
            .into_new_limit();

        assert_eq!(new_limit.warning_threshold, 80.0);
    }

    #[test]
    fn category_form_requires_category_and_non_zero_limit() {
        let want = Err(Error::MissingFields("Category and limit are required"));

        assert_eq!(form("  ", LooseNumber::Number(10.0), None).validate(), want);
        assert_eq!(form("Food", LooseNumber::Number(0.0), None).validate(), want);
        assert_eq!(
            CategoryLimitForm {
                category: Some("Food".to_owned()),
                ..Default::default()
            }
            .validate(),
            want
        );
    }

    #[test]
    fn category_form_rejects_bad_numbers() {
        assert_eq!(
            form("Food", LooseNumber::Number(-5.0), None).validate(),
            Err(Error::InvalidLimit)
        );
        assert_eq!(
            form("Food", LooseNumber::Text("lots".to_owned()), None).validate(),
            Err(Error::InvalidLimit)
        );
        assert_eq!(
            form("Food", LooseNumber::Number(10.0), Some(101.0)).validate(),
            Err(Error::InvalidThreshold)
        );
    }

    #[test]
    fn monthly_form_defaults_to_zero() {
        assert_eq!(MonthlyLimitForm::default().validate(), Ok((0.0, None)));
        assert_eq!(
            MonthlyLimitForm {
                limit: Some(LooseNumber::Text("abc".to_owned())),
                warning_threshold: Some(LooseNumber::Number(50.0)),
            }
            .validate(),
            Ok((0.0, Some(50.0)))
        );
    }

    #[test]
    fn monthly_form_rejects_negative_limit_and_bad_threshold() {
        assert_eq!(
            MonthlyLimitForm {
                limit: Some(LooseNumber::Number(-1.0)),
                warning_threshold: None,
            }
            .validate(),
            Err(Error::InvalidLimit)
        );
        assert_eq!(
            MonthlyLimitForm {
                limit: Some(LooseNumber::Number(100.0)),
                warning_threshold: Some(LooseNumber::Number(-10.0)),
            }
            .validate(),
            Err(Error::InvalidThreshold)
        );
    }

    #[test]
    fn duplicate_categories_are_rejected_ignoring_case() {
        assert_eq!(ensure_unique_categories(["Food", "Rent"]), Ok(()));
        assert_eq!(
            ensure_unique_categories(["Food", "Rent", "FOOD"]),
            Err(Error::DuplicateCategoryLimit)
        );
    }

    #[test]
    fn update_with_duplicate_categories_is_rejected() {
        let update = SpendingLimitUpdate {
            category_limits: Some(vec![
                form("Food", LooseNumber::Number(10.0), None),
                form("food", LooseNumber::Number(20.0), None),
            ]),
            ..Default::default()
        };

        assert_eq!(update.validate(), Err(Error::DuplicateCategoryLimit));
    }
}
