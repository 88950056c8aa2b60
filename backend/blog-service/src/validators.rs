use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// Input validation utilities for blog-service forms

// Compile regex patterns once at startup
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

// Letters, digits and @/./+/-/_ only
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.@+-]+$").expect("hardcoded username regex is invalid - fix source code")
});

static CONTACT_NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9][0-9 -]*$")
        .expect("hardcoded contact number regex is invalid - fix source code")
});

/// Validate email format (RFC 5322 simplified)
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Validate username shape (letters, digits and @/./+/-/_)
pub fn validate_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

/// Validate contact number (digits, optional leading +, spaces and dashes)
pub fn validate_contact_number(number: &str) -> bool {
    CONTACT_NUMBER_REGEX.is_match(number)
}

/// True when the value holds a NUL character, which Postgres text rejects
pub fn has_null(value: &str) -> bool {
    value.contains('\0')
}

fn null_characters() -> ValidationError {
    ValidationError::new("null_characters_not_allowed")
        .with_message("Null characters are not allowed.".into())
}

fn required() -> ValidationError {
    ValidationError::new("required").with_message("This field is required.".into())
}

/// validator crate compatible custom validator for usernames
pub fn validate_username_field(username: &str) -> Result<(), ValidationError> {
    if has_null(username) {
        Err(null_characters())
    } else if username.is_empty() {
        Err(required())
    } else if validate_username(username) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username").with_message(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        ))
    }
}

/// Email is optional; only a non-empty value is checked
pub fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    if has_null(email) {
        Err(null_characters())
    } else if email.is_empty() || validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email").with_message("Enter a valid email address.".into()))
    }
}

pub fn validate_contact_number_field(number: &str) -> Result<(), ValidationError> {
    if has_null(number) {
        Err(null_characters())
    } else if number.is_empty() {
        Err(required())
    } else if validate_contact_number(number) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_contact_number")
            .with_message("Enter a valid contact number.".into()))
    }
}

/// Any text without NUL characters
pub fn validate_no_null(value: &str) -> Result<(), ValidationError> {
    if has_null(value) {
        Err(null_characters())
    } else {
        Ok(())
    }
}

/// Required text that is not only whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if has_null(value) {
        Err(null_characters())
    } else if value.trim().is_empty() {
        Err(required())
    } else {
        Ok(())
    }
}
