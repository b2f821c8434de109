//! Client-side form validation, run before any remote call.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::types::{CompanyInput, ContactInput, DealInput};

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was flagged.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email regex"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://.+").expect("url regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_re().is_match(email)
}

pub fn is_valid_url(url: &str) -> bool {
    url_re().is_match(url)
}

pub fn validate_contact(input: &ContactInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if input.first_name.trim().is_empty() {
        errors.insert("firstName", "First name is required");
    }
    if input.last_name.trim().is_empty() {
        errors.insert("lastName", "Last name is required");
    }
    if input.email.trim().is_empty() {
        errors.insert("email", "Email is required");
    } else if !is_valid_email(&input.email) {
        errors.insert("email", "Email is invalid");
    }
    if input.company.trim().is_empty() {
        errors.insert("company", "Company is required");
    }
    errors.into_result()
}

pub fn validate_company(input: &CompanyInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if input.name.trim().is_empty() {
        errors.insert("name", "Company name is required");
    }
    if !input.website.is_empty() && !is_valid_url(&input.website) {
        errors.insert(
            "website",
            "Please enter a valid URL (include http:// or https://)",
        );
    }
    errors.into_result()
}

pub fn validate_deal(input: &DealInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if input.title.trim().is_empty() {
        errors.insert("title", "Title is required");
    }
    if input.contact_id.is_none() {
        errors.insert("contactId", "Contact is required");
    }
    if !input.value.is_finite() || input.value <= 0.0 {
        errors.insert("value", "Value must be greater than 0");
    }
    if input.expected_close.trim().is_empty() {
        errors.insert("expectedClose", "Expected close date is required");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_contact() -> ContactInput {
        ContactInput {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@navy.mil".into(),
            company: "US Navy".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_contact_passes() {
        assert!(validate_contact(&valid_contact()).is_ok());
    }

    #[test]
    fn test_contact_required_fields() {
        let errors = validate_contact(&ContactInput::default()).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("company"), Some("Company is required"));
    }

    #[test]
    fn test_contact_email_shape() {
        let mut input = valid_contact();
        input.email = "grace-at-navy".into();
        let errors = validate_contact(&input).unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is invalid"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_whitespace_only_is_missing() {
        let mut input = valid_contact();
        input.first_name = "   ".into();
        let errors = validate_contact(&input).unwrap_err();
        assert!(errors.get("firstName").is_some());
    }

    #[test]
    fn test_company_website_optional_but_checked() {
        let mut input = CompanyInput {
            name: "Initech".into(),
            ..Default::default()
        };
        assert!(validate_company(&input).is_ok());

        input.website = "initech.com".into();
        let errors = validate_company(&input).unwrap_err();
        assert!(errors.get("website").is_some());

        input.website = "https://initech.com".into();
        assert!(validate_company(&input).is_ok());
    }

    #[test]
    fn test_deal_rules() {
        let errors = validate_deal(&DealInput::default()).unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["contactId", "expectedClose", "title", "value"]);

        let input = DealInput {
            title: "Renewal".into(),
            contact_id: Some(1),
            value: 5000.0,
            expected_close: "2025-01-31".into(),
            ..Default::default()
        };
        assert!(validate_deal(&input).is_ok());
    }

    #[test]
    fn test_deal_value_must_be_positive() {
        let input = DealInput {
            title: "Zero".into(),
            contact_id: Some(1),
            value: 0.0,
            expected_close: "2025-01-31".into(),
            ..Default::default()
        };
        let errors = validate_deal(&input).unwrap_err();
        assert_eq!(errors.get("value"), Some("Value must be greater than 0"));
    }

    #[test]
    fn test_deal_value_must_be_finite() {
        for value in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let input = DealInput {
                title: "Unbounded".into(),
                contact_id: Some(1),
                value,
                expected_close: "2025-01-31".into(),
                ..Default::default()
            };
            let errors = validate_deal(&input).unwrap_err();
            assert!(errors.get("value").is_some());
        }
    }
}
