//! Pre-submit form validation.
//!
//! Validation is synchronous and all-or-nothing: the first failing check
//! aborts the submission with an [`Error::Validation`] message, and nothing
//! reaches the remote store. Forms hold raw text as typed by the user and
//! turn into the matching draft on success.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::models::*;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("slug pattern is valid"));

pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Email shape check. Deliberately loose: one `@`, no whitespace, a dot in
/// the domain.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// Trimmed value of a required field.
pub fn require(label: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} is required", label)));
    }
    Ok(trimmed.to_string())
}

/// Trimmed value of an optional field; blank becomes `None`.
pub fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn validate_email(value: &str) -> Result<String> {
    let email = require("Email", value)?;
    if !is_valid_email(&email) {
        return Err(Error::Validation(format!("Email '{}' is invalid", email)));
    }
    Ok(email)
}

/// Parse a decimal number; a comma decimal separator is accepted.
pub fn parse_number(label: &str, value: &str) -> Result<f64> {
    let raw = require(label, value)?;
    let parsed: f64 = raw
        .replace(',', ".")
        .parse()
        .map_err(|_| Error::Validation(format!("{} must be a number", label)))?;
    if !parsed.is_finite() {
        return Err(Error::Validation(format!("{} must be a number", label)));
    }
    Ok(parsed)
}

fn parse_in_range(label: &str, value: &str, (min, max): (f64, f64)) -> Result<f64> {
    let parsed = parse_number(label, value)?;
    if parsed < min || parsed > max {
        return Err(Error::Validation(format!(
            "{} must be between {} and {}",
            label, min, max
        )));
    }
    Ok(parsed)
}

/// Latitude in [-90, 90], bounds included.
pub fn parse_latitude(value: &str) -> Result<f64> {
    parse_in_range("Latitude", value, LATITUDE_RANGE)
}

/// Longitude in [-180, 180], bounds included.
pub fn parse_longitude(value: &str) -> Result<f64> {
    parse_in_range("Longitude", value, LONGITUDE_RANGE)
}

/// Area in hectares, strictly positive.
pub fn parse_area(value: &str) -> Result<f64> {
    let parsed = parse_number("Area", value)?;
    if parsed <= 0.0 {
        return Err(Error::Validation("Area must be greater than zero".into()));
    }
    Ok(parsed)
}

fn parse_optional<F>(value: &str, parse: F) -> Result<Option<f64>>
where
    F: Fn(&str) -> Result<f64>,
{
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

// =============================================================================
// FORMS
// =============================================================================

/// Create/edit form of a technical analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisForm {
    pub client_name: String,
    pub email: String,
    pub phone: String,
    pub property_name: String,
    pub crop: String,
    pub latitude: String,
    pub longitude: String,
    pub area: String,
    pub notes: String,
    pub status: AnalysisStatus,
}

impl AnalysisForm {
    /// Prefill the form for editing an existing analysis.
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let number = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        Self {
            client_name: analysis.client_name.clone(),
            email: analysis.email.clone(),
            phone: analysis.phone.clone().unwrap_or_default(),
            property_name: analysis.property_name.clone().unwrap_or_default(),
            crop: analysis.crop.clone().unwrap_or_default(),
            latitude: number(analysis.latitude),
            longitude: number(analysis.longitude),
            area: number(analysis.area_hectares),
            notes: analysis.notes.clone().unwrap_or_default(),
            status: analysis.status,
        }
    }

    pub fn validate(&self) -> Result<AnalysisDraft> {
        let client_name = require("Name", &self.client_name)?;
        let email = validate_email(&self.email)?;
        let property_name = require("Property name", &self.property_name)?;
        let latitude = parse_optional(&self.latitude, parse_latitude)?;
        let longitude = parse_optional(&self.longitude, parse_longitude)?;
        if latitude.is_some() != longitude.is_some() {
            return Err(Error::Validation(
                "Latitude and longitude must be filled in together".into(),
            ));
        }
        let area_hectares = parse_area(&self.area)?;

        Ok(AnalysisDraft {
            client_name,
            email,
            phone: optional(&self.phone),
            property_name: Some(property_name),
            crop: optional(&self.crop),
            latitude,
            longitude,
            area_hectares: Some(area_hectares),
            notes: optional(&self.notes),
            status: self.status,
        })
    }
}

/// Contact form message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub body: String,
    pub status: MessageStatus,
}

impl MessageForm {
    pub fn validate(&self) -> Result<MessageDraft> {
        Ok(MessageDraft {
            name: require("Name", &self.name)?,
            email: validate_email(&self.email)?,
            phone: optional(&self.phone),
            subject: optional(&self.subject),
            body: require("Message", &self.body)?,
            status: self.status,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserForm {
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
}

impl UserForm {
    pub fn validate(&self) -> Result<UserDraft> {
        Ok(UserDraft {
            email: validate_email(&self.email)?,
            full_name: optional(&self.full_name),
            role: self.role,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationCategoryForm {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub is_active: bool,
}

impl Default for NotificationCategoryForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: String::new(),
            description: String::new(),
            is_active: true,
        }
    }
}

impl NotificationCategoryForm {
    pub fn validate(&self) -> Result<NotificationCategoryDraft> {
        let name = require("Name", &self.name)?;
        if !SLUG_RE.is_match(&name) {
            return Err(Error::Validation(
                "Name must start with a letter and use only lowercase letters, digits and '_'"
                    .into(),
            ));
        }
        Ok(NotificationCategoryDraft {
            name,
            display_name: require("Display name", &self.display_name)?,
            description: optional(&self.description),
            is_active: self.is_active,
        })
    }
}
