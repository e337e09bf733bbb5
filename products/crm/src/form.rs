//! Draft validation and create/update submission.
//!
//! Validation runs entirely client side; a draft that fails it never reaches
//! the backend.

use std::{collections::BTreeMap, fmt};

use entity::{
    Resource, account, calendar_event, campaign, carepack, contact, deal, email, email_template,
    lead, partner, product, task, ticket, user,
};
use platform_api::ApiError;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::source::RecordSink;

/// Upper bound for names, titles and subjects.
pub const MAX_NAME_LEN: usize = 256;
const MAX_TEXT_LEN: usize = 65_535;

/// Field name to message. Only the first error per field is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
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

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (field, message)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

pub trait Validate {
    /// Trim free text and drop empty optional fields.
    fn normalize(&mut self) {}

    fn check(&self, errors: &mut FieldErrors);

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        self.check(&mut errors);
        errors.into_result()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubmitError {
    #[error("invalid input: {0}")]
    Invalid(#[from] FieldErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Normalize and validate `draft`, then create it or, with `editing`, update
/// that record.
pub async fn submit<R, S>(sink: &S, mut draft: R::Draft, editing: Option<Uuid>) -> Result<R, SubmitError>
where
    R: Resource,
    R::Draft: Validate,
    S: RecordSink<R>,
{
    draft.normalize();
    draft.validate()?;
    let saved = match editing {
        Some(id) => sink.update(id, &draft).await?,
        None => sink.create(&draft).await?,
    };
    info!(
        resource = R::PATH,
        id = %saved.id(),
        action = if editing.is_some() { "update" } else { "create" },
        "record saved"
    );
    Ok(saved)
}

fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn trim_opt(value: &mut Option<String>) {
    if let Some(text) = value {
        trim(text);
        if text.is_empty() {
            *value = None;
        }
    }
}

fn required(errors: &mut FieldErrors, field: &'static str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{label} is required"));
    } else {
        max_len(errors, field, value, MAX_NAME_LEN);
    }
}

fn max_len(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("{field} must be at most {max} characters"));
    }
}

fn optional_len(errors: &mut FieldErrors, field: &'static str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        max_len(errors, field, value, max);
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn email_field(errors: &mut FieldErrors, field: &'static str, value: Option<&str>) {
    if value.is_some_and(|v| !is_valid_email(v)) {
        errors.add(field, "Invalid email address");
    }
}

fn non_negative(errors: &mut FieldErrors, field: &'static str, value: Option<i64>) {
    if value.is_some_and(|v| v < 0) {
        errors.add(field, format!("{field} cannot be negative"));
    }
}

fn lowercase_email(value: &mut Option<String>) {
    trim_opt(value);
    if let Some(text) = value {
        *text = text.to_lowercase();
    }
}

impl Validate for account::Draft {
    fn normalize(&mut self) {
        trim(&mut self.name);
        trim_opt(&mut self.industry);
        trim_opt(&mut self.website);
        trim_opt(&mut self.phone);
        lowercase_email(&mut self.email);
        trim_opt(&mut self.currency);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "name", "Name", &self.name);
        email_field(errors, "email", self.email.as_deref());
        non_negative(errors, "annual_revenue_cents", self.annual_revenue_cents);
    }
}

impl Validate for lead::Draft {
    fn normalize(&mut self) {
        trim(&mut self.name);
        trim_opt(&mut self.company);
        lowercase_email(&mut self.email);
        trim_opt(&mut self.phone);
        trim_opt(&mut self.source);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "name", "Name", &self.name);
        email_field(errors, "email", self.email.as_deref());
        non_negative(errors, "value_cents", self.value_cents);
    }
}

impl Validate for contact::Draft {
    fn normalize(&mut self) {
        trim(&mut self.first_name);
        trim(&mut self.last_name);
        lowercase_email(&mut self.email);
        trim_opt(&mut self.phone);
        trim_opt(&mut self.job_title);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "first_name", "First name", &self.first_name);
        required(errors, "last_name", "Last name", &self.last_name);
        email_field(errors, "email", self.email.as_deref());
    }
}

impl Validate for deal::Draft {
    fn normalize(&mut self) {
        trim(&mut self.title);
        trim_opt(&mut self.currency);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "title", "Title", &self.title);
        non_negative(errors, "amount_cents", self.amount_cents);
    }
}

impl Validate for carepack::Draft {
    fn normalize(&mut self) {
        trim(&mut self.name);
        trim_opt(&mut self.serial_number);
        trim_opt(&mut self.currency);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "name", "Name", &self.name);
        if self.start_date > self.end_date {
            errors.add("end_date", "End date must not be before start date");
        }
        non_negative(errors, "price_cents", self.price_cents);
    }
}

impl Validate for email::Draft {
    fn normalize(&mut self) {
        trim(&mut self.to);
        trim(&mut self.subject);
        for cc in &mut self.cc {
            trim(cc);
        }
        self.cc.retain(|cc| !cc.is_empty());
    }

    fn check(&self, errors: &mut FieldErrors) {
        if self.to.is_empty() {
            errors.add("to", "Recipient is required");
        } else if !is_valid_email(&self.to) {
            errors.add("to", "Invalid email address");
        }
        if self.cc.iter().any(|cc| !is_valid_email(cc)) {
            errors.add("cc", "Invalid email address");
        }
        required(errors, "subject", "Subject", &self.subject);
        max_len(errors, "body", &self.body, MAX_TEXT_LEN);
    }
}

impl Validate for email_template::Draft {
    fn normalize(&mut self) {
        trim(&mut self.name);
        trim(&mut self.subject);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "name", "Name", &self.name);
        required(errors, "subject", "Subject", &self.subject);
        max_len(errors, "body", &self.body, MAX_TEXT_LEN);
    }
}

impl Validate for calendar_event::Draft {
    fn normalize(&mut self) {
        trim(&mut self.title);
        trim_opt(&mut self.description);
        trim_opt(&mut self.location);
        for attendee in &mut self.attendees {
            trim(attendee);
        }
        self.attendees.retain(|a| !a.is_empty());
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "title", "Title", &self.title);
        if self.starts_at >= self.ends_at {
            errors.add("ends_at", "End must be after start");
        }
        optional_len(errors, "description", self.description.as_deref(), MAX_TEXT_LEN);
    }
}

impl Validate for campaign::Draft {
    fn normalize(&mut self) {
        trim(&mut self.name);
        trim_opt(&mut self.channel);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "name", "Name", &self.name);
        non_negative(errors, "budget_cents", self.budget_cents);
        if let (Some(start), Some(end)) = (self.starts_on, self.ends_on) {
            if start > end {
                errors.add("ends_on", "End date must not be before start date");
            }
        }
    }
}

impl Validate for task::Draft {
    fn normalize(&mut self) {
        trim(&mut self.title);
        trim_opt(&mut self.notes);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "title", "Title", &self.title);
        optional_len(errors, "notes", self.notes.as_deref(), MAX_TEXT_LEN);
    }
}

impl Validate for ticket::Draft {
    fn normalize(&mut self) {
        trim(&mut self.subject);
        trim_opt(&mut self.description);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "subject", "Subject", &self.subject);
        optional_len(errors, "description", self.description.as_deref(), MAX_TEXT_LEN);
    }
}

impl Validate for partner::Draft {
    fn normalize(&mut self) {
        trim(&mut self.name);
        trim_opt(&mut self.kind);
        lowercase_email(&mut self.email);
        trim_opt(&mut self.phone);
        trim_opt(&mut self.website);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "name", "Name", &self.name);
        email_field(errors, "email", self.email.as_deref());
    }
}

impl Validate for product::Draft {
    fn normalize(&mut self) {
        trim(&mut self.name);
        trim_opt(&mut self.sku);
        trim_opt(&mut self.currency);
    }

    fn check(&self, errors: &mut FieldErrors) {
        required(errors, "name", "Name", &self.name);
        non_negative(errors, "price_cents", Some(self.price_cents));
    }
}

impl Validate for user::Draft {
    fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
        trim_opt(&mut self.display_name);
    }

    fn check(&self, errors: &mut FieldErrors) {
        if self.email.is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.add("email", "Invalid email address");
        }
        optional_len(errors, "display_name", self.display_name.as_deref(), 100);
    }
}
