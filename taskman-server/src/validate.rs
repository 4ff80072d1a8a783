//! Input validation and sanitization for task payloads.
//!
//! Titles and descriptions are trimmed, length-checked, then stripped of
//! `<` and `>`. Due dates may not fall before the start of the current UTC
//! day. Status and priority are already constrained by the JSON decoder.

use chrono::{DateTime, Utc};
use taskman_proto::api::FieldError;
use taskman_proto::task::{
    CreateTask, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, MIN_DESCRIPTION_LENGTH,
    MIN_TITLE_LENGTH, UpdateTask,
};

fn sanitize(value: &str) -> String {
    value.trim().replace(['<', '>'], "")
}

fn field_error(field: &str, message: &str, value: Option<serde_json::Value>) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.to_string(),
        value,
    }
}

/// Checks a text field's trimmed length and returns the sanitized value.
fn check_text(
    field: &str,
    label: &str,
    raw: &str,
    min: usize,
    max: usize,
    errors: &mut Vec<FieldError>,
) -> String {
    let len = raw.trim().chars().count();
    if len < min || len > max {
        errors.push(field_error(
            field,
            &format!("{label} must be between {min} and {max} characters"),
            Some(serde_json::Value::String(raw.to_string())),
        ));
    }
    sanitize(raw)
}

fn check_due_date(due: DateTime<Utc>, now: DateTime<Utc>, errors: &mut Vec<FieldError>) {
    let start_of_today = now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
    if due < start_of_today {
        errors.push(field_error(
            "dueDate",
            "Due date cannot be in the past",
            Some(serde_json::Value::String(due.to_rfc3339())),
        ));
    }
}

/// Validates and sanitizes a create payload.
///
/// # Errors
///
/// Returns every field failure found, not just the first.
pub fn validate_create(
    input: CreateTask,
    now: DateTime<Utc>,
) -> Result<CreateTask, Vec<FieldError>> {
    let mut errors = Vec::new();

    let title = if input.title.trim().is_empty() {
        errors.push(field_error("title", "Title is required", None));
        String::new()
    } else {
        check_text(
            "title",
            "Title",
            &input.title,
            MIN_TITLE_LENGTH,
            MAX_TITLE_LENGTH,
            &mut errors,
        )
    };

    let description = if input.description.trim().is_empty() {
        errors.push(field_error("description", "Description is required", None));
        String::new()
    } else {
        check_text(
            "description",
            "Description",
            &input.description,
            MIN_DESCRIPTION_LENGTH,
            MAX_DESCRIPTION_LENGTH,
            &mut errors,
        )
    };

    if let Some(due) = input.due_date {
        check_due_date(due, now, &mut errors);
    }

    if errors.is_empty() {
        Ok(CreateTask {
            title,
            description,
            ..input
        })
    } else {
        Err(errors)
    }
}

/// Validates and sanitizes an update payload. Only present fields are checked.
///
/// # Errors
///
/// Returns every field failure found.
pub fn validate_update(
    update: UpdateTask,
    now: DateTime<Utc>,
) -> Result<UpdateTask, Vec<FieldError>> {
    let mut errors = Vec::new();

    let title = update.title.as_deref().map(|raw| {
        check_text(
            "title",
            "Title",
            raw,
            MIN_TITLE_LENGTH,
            MAX_TITLE_LENGTH,
            &mut errors,
        )
    });
    let description = update.description.as_deref().map(|raw| {
        check_text(
            "description",
            "Description",
            raw,
            MIN_DESCRIPTION_LENGTH,
            MAX_DESCRIPTION_LENGTH,
            &mut errors,
        )
    });
    if let Some(due) = update.due_date {
        check_due_date(due, now, &mut errors);
    }

    if errors.is_empty() {
        Ok(UpdateTask {
            title,
            description,
            ..update
        })
    } else {
        Err(errors)
    }
}
