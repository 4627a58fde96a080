//! Client-side form validation. Runs before any network call.

use crate::model::{Credentials, SignUpFields};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::OnceLock;

pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
pub const USERNAME_REQUIRED: &str = "Username is required";
pub const PROFILE_PIC_REQUIRED: &str = "Profile picture is required";

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Password,
    Username,
    ProfilePic,
}

/// One message per invalid field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn insert(&mut self, field: Field, message: &str) {
        self.0.insert(field, message.to_string());
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        f.write_str(&messages.join(", "))
    }
}

impl std::error::Error for FieldErrors {}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.trim().is_empty() {
        errors.insert(Field::Email, EMAIL_REQUIRED);
    } else if !email_pattern().is_match(email) {
        errors.insert(Field::Email, EMAIL_INVALID);
    }
}

fn check_password(password: &str, errors: &mut FieldErrors) {
    if password.is_empty() {
        errors.insert(Field::Password, PASSWORD_REQUIRED);
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(Field::Password, PASSWORD_TOO_SHORT);
    }
}

pub fn validate_credentials(credentials: &Credentials) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_email(&credentials.email, &mut errors);
    check_password(&credentials.password, &mut errors);
    errors.into_result()
}

pub fn validate_sign_up(fields: &SignUpFields) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if fields.username.trim().is_empty() {
        errors.insert(Field::Username, USERNAME_REQUIRED);
    }
    check_email(&fields.email, &mut errors);
    check_password(&fields.password, &mut errors);
    if fields.profile_pic.is_none() {
        errors.insert(Field::ProfilePic, PROFILE_PIC_REQUIRED);
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProfilePicture;

    #[test]
    fn test_empty_login_reports_required() {
        let errors = validate_credentials(&Credentials::default()).unwrap_err();
        assert_eq!(errors.get(Field::Email), Some(EMAIL_REQUIRED));
        assert_eq!(errors.get(Field::Password), Some(PASSWORD_REQUIRED));
    }

    #[test]
    fn test_malformed_login() {
        let errors = validate_credentials(&Credentials::new("alice@", "abc")).unwrap_err();
        assert_eq!(errors.get(Field::Email), Some(EMAIL_INVALID));
        assert_eq!(errors.get(Field::Password), Some(PASSWORD_TOO_SHORT));
        assert_eq!(errors.iter().count(), 2);
    }

    #[test]
    fn test_valid_login() {
        assert!(validate_credentials(&Credentials::new("alice@example.com", "rabbit")).is_ok());
    }

    #[test]
    fn test_sign_up_requires_username_and_picture() {
        let fields = SignUpFields {
            username: " ".into(),
            email: "alice@example.com".into(),
            password: "rabbit".into(),
            profile_pic: None,
        };
        let errors = validate_sign_up(&fields).unwrap_err();
        assert_eq!(errors.get(Field::Username), Some(USERNAME_REQUIRED));
        assert_eq!(errors.get(Field::ProfilePic), Some(PROFILE_PIC_REQUIRED));
        assert_eq!(errors.get(Field::Email), None);

        let fields = SignUpFields {
            username: "Alice".into(),
            profile_pic: Some(ProfilePicture::default()),
            ..fields
        };
        assert!(validate_sign_up(&fields).is_ok());
    }
}
