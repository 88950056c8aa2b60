/// Form objects accepted by the HTML handlers
///
/// Each form deserializes from `application/x-www-form-urlencoded` (or is built
/// from multipart text parts), validates with `validator`, and reports
/// failures as a [`FormErrors`] mapping of field name to messages.
use crate::security::password_problems;
use crate::validators::{
    has_null, validate_contact_number_field, validate_no_null, validate_not_blank,
    validate_optional_email, validate_username_field,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

/// Key for errors not tied to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name to user-facing messages
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Flatten `validator` output, keeping each rule's message
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut form_errors = Self::new();
        for (field, field_errors) in errors.field_errors() {
            let key: &str = if field == "__all__" {
                NON_FIELD_ERRORS
            } else {
                &field
            };
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
                form_errors.add(key, message);
            }
        }
        form_errors
    }
}

/// Submitted values (never secrets) plus their errors, as rendered to a page
#[derive(Debug, Clone, Serialize)]
pub struct BoundForm {
    pub data: Value,
    pub errors: FormErrors,
}

impl BoundForm {
    pub fn unbound() -> Self {
        Self {
            data: json!({}),
            errors: FormErrors::new(),
        }
    }
}

/// Identity and credentials half of registration
#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(
        custom(function = "validate_username_field"),
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub username: String,

    #[validate(
        custom(function = "validate_no_null"),
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub first_name: String,

    #[validate(
        custom(function = "validate_no_null"),
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub last_name: String,

    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,

    #[validate(
        custom(function = "validate_no_null"),
        length(min = 1, message = "This field is required.")
    )]
    pub password1: String,

    #[validate(
        custom(function = "validate_no_null"),
        length(min = 1, message = "This field is required."),
        must_match(other = "password1", message = "The two password fields didn't match.")
    )]
    pub password2: String,
}

impl RegisterForm {
    /// Trim the text fields; passwords are taken verbatim
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }

    /// Field rules, then password strength once both passwords agree
    pub fn errors(&self) -> FormErrors {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from_validation(&e),
        };

        if !errors.has("password1") && !errors.has("password2") {
            for problem in password_problems(&self.password2, &self.username) {
                errors.add("password2", problem);
            }
        }

        errors
    }

    pub fn public_data(&self) -> Value {
        json!({
            "username": self.username,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "email": self.email,
        })
    }
}

/// Profile half of registration; the picture is validated by media storage
#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct ProfileForm {
    #[validate(
        custom(function = "validate_contact_number_field"),
        length(max = 15, message = "Ensure this value has at most 15 characters.")
    )]
    pub contact_number: String,
}

impl ProfileForm {
    pub fn normalized(mut self) -> Self {
        self.contact_number = self.contact_number.trim().to_string();
        self
    }

    pub fn errors(&self) -> FormErrors {
        match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from_validation(&e),
        }
    }

    pub fn public_data(&self) -> Value {
        json!({ "contact_number": self.contact_number })
    }
}

/// All text fields of the registration page in one payload
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegisterFields {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
    pub contact_number: String,
}

impl RegisterFields {
    pub fn split(self) -> (RegisterForm, ProfileForm) {
        let user_form = RegisterForm {
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password1: self.password1,
            password2: self.password2,
        };
        let profile_form = ProfileForm {
            contact_number: self.contact_number,
        };
        (user_form.normalized(), profile_form.normalized())
    }
}

/// Title and content of a blog, shared by create and edit
#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct BlogForm {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 200, message = "Ensure this value has at most 200 characters.")
    )]
    pub title: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub content: String,
}

impl BlogForm {
    pub fn errors(&self) -> FormErrors {
        match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from_validation(&e),
        }
    }

    pub fn public_data(&self) -> Value {
        json!({ "title": self.title, "content": self.content })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    /// Text as submitted, or `None` when it is blank or holds NUL characters
    pub fn text(&self) -> Option<&str> {
        (!self.text.trim().is_empty() && !has_null(&self.text)).then_some(self.text.as_str())
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordResetForm {
    pub username: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordResetForm {
    pub fn passwords_match(&self) -> bool {
        self.new_password == self.confirm_password
    }

    /// Strength rules for the new password, keyed on `new_password`
    pub fn password_errors(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        if let Err(e) = validate_no_null(&self.new_password) {
            errors.add("new_password", e.to_string());
        }
        for problem in password_problems(&self.new_password, self.username.trim()) {
            errors.add("new_password", problem);
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_register() -> RegisterForm {
        RegisterForm {
            username: "alice".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            email: "alice@example.com".into(),
            password1: "correct-horse-battery".into(),
            password2: "correct-horse-battery".into(),
        }
    }

    #[test]
    fn valid_registration_has_no_errors() {
        assert!(valid_register().errors().is_empty());
    }

    #[test]
    fn mismatched_passwords_are_reported_on_password2() {
        let form = RegisterForm {
            password2: "something-else-entirely".into(),
            ..valid_register()
        };
        let errors = form.errors();
        assert_eq!(
            errors.get("password2"),
            &["The two password fields didn't match.".to_string()]
        );
    }

    #[test]
    fn weak_password_is_reported_when_passwords_match() {
        let form = RegisterForm {
            password1: "1234".into(),
            password2: "1234".into(),
            ..valid_register()
        };
        let errors = form.errors();
        assert!(errors.get("password2").iter().any(|m| m.contains("too short")));
        assert!(errors.get("password2").iter().any(|m| m.contains("entirely numeric")));
    }

    #[test]
    fn missing_fields_are_required() {
        let errors = RegisterForm::default().errors();
        assert_eq!(errors.get("username"), &["This field is required.".to_string()]);
        assert!(errors.has("password1"));
        assert!(errors.has("password2"));
        assert!(!errors.has("email"));
    }

    #[test]
    fn username_shape_and_email_format() {
        let form = RegisterForm {
            username: "not valid".into(),
            email: "not-an-email".into(),
            ..valid_register()
        };
        let errors = form.errors();
        assert!(errors.has("username"));
        assert_eq!(errors.get("email"), &["Enter a valid email address.".to_string()]);
    }

    #[test]
    fn public_data_omits_passwords() {
        let data = valid_register().public_data();
        assert_eq!(data["username"], "alice");
        assert!(data.get("password1").is_none());
        assert!(data.get("password2").is_none());
    }

    #[test]
    fn register_fields_split_trims_text() {
        let fields = RegisterFields {
            username: "  bob ".into(),
            contact_number: " 555-0100 ".into(),
            password1: " pw ".into(),
            ..Default::default()
        };
        let (user_form, profile_form) = fields.split();
        assert_eq!(user_form.username, "bob");
        assert_eq!(user_form.password1, " pw ");
        assert_eq!(profile_form.contact_number, "555-0100");
    }

    #[test]
    fn profile_contact_number_rules() {
        assert!(ProfileForm { contact_number: "+1 555 0100".into() }.errors().is_empty());
        assert!(ProfileForm::default().errors().has("contact_number"));
        assert!(ProfileForm { contact_number: "1234567890123456".into() }
            .errors()
            .has("contact_number"));
    }

    #[test]
    fn blog_form_requires_title_and_content() {
        let errors = BlogForm { title: "  ".into(), content: String::new() }.errors();
        assert!(errors.has("title"));
        assert!(errors.has("content"));

        let long = BlogForm { title: "x".repeat(201), content: "body".into() }.errors();
        assert_eq!(
            long.get("title"),
            &["Ensure this value has at most 200 characters.".to_string()]
        );

        assert!(BlogForm { title: "Intro".into(), content: "body".into() }
            .errors()
            .is_empty());
    }

    #[test]
    fn comment_text_is_kept_as_submitted() {
        assert_eq!(CommentForm { text: "  hi ".into() }.text(), Some("  hi "));
        assert_eq!(CommentForm { text: "   ".into() }.text(), None);
        assert_eq!(CommentForm { text: "hi\0".into() }.text(), None);
    }

    #[test]
    fn null_characters_are_field_errors() {
        let message = "Null characters are not allowed.".to_string();
        let form = RegisterForm {
            first_name: "Al\0".into(),
            ..valid_register()
        };
        assert_eq!(form.errors().get("first_name"), &[message.clone()]);

        let blog = BlogForm { title: "T\0".into(), content: "body".into() }.errors();
        assert_eq!(blog.get("title"), &[message.clone()]);

        let reset = PasswordResetForm {
            username: "alice".into(),
            new_password: "fresh-lantern-orbit-42\0".into(),
            confirm_password: "fresh-lantern-orbit-42\0".into(),
        };
        assert!(reset.password_errors().get("new_password").contains(&message));
    }

    #[test]
    fn reset_form_checks() {
        let form = PasswordResetForm {
            username: "alice".into(),
            new_password: "fresh-lantern-orbit-42".into(),
            confirm_password: "fresh-lantern-orbit-43".into(),
        };
        assert!(!form.passwords_match());
        assert!(form.password_errors().is_empty());

        let weak = PasswordResetForm {
            username: "alice".into(),
            new_password: "alice123".into(),
            confirm_password: "alice123".into(),
        };
        assert!(weak.passwords_match());
        assert!(weak.password_errors().has("new_password"));
    }

    #[test]
    fn form_errors_serialize_as_a_map() {
        let mut errors = FormErrors::new();
        errors.add(NON_FIELD_ERRORS, "nope");
        let value = serde_json::to_value(&errors).expect("serializable");
        assert_eq!(value, json!({ "non_field_errors": ["nope"] }));
    }
}
