//! Client-side validation of the login and signup forms.
//!
//! A form that fails validation never reaches the network. Errors are keyed
//! by field so the caller can show each message next to its input.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Credentials, Registration};

/// Minimum password length accepted by the signup form
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern"));

static DATE_OF_BIRTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0[1-9]|[12]\d|3[01])/(0[1-9]|1[0-2])/\d{4}$").expect("date pattern")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\d+").expect("phone pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FullName,
    Username,
    Email,
    DateOfBirth,
    PhoneNumber,
    Password,
    ConfirmPassword,
    CoverImage,
}

impl Field {
    /// Form field name as the remote authority spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FullName => "fullName",
            Field::Username => "username",
            Field::Email => "email",
            Field::DateOfBirth => "dateOfBirth",
            Field::PhoneNumber => "phoneNumber",
            Field::Password => "password",
            Field::ConfirmPassword => "confirmPassword",
            Field::CoverImage => "coverImage",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-keyed validation messages. At most one message per field; a later
/// rule for the same field replaces the earlier message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[derive(Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();

        if is_blank(&self.email) {
            errors.set(Field::Email, "Email is required");
        } else if !EMAIL_RE.is_match(&self.email) {
            errors.set(Field::Email, "Email is invalid");
        }
        if self.password.is_empty() {
            errors.set(Field::Password, "Password is required");
        }

        errors.into_result(|| Credentials::new(self.email.trim(), self.password.clone()))
    }
}

#[derive(Clone, Default)]
pub struct SignupForm {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub date_of_birth: String,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
    pub cover_image: Option<PathBuf>,
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("full_name", &self.full_name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("date_of_birth", &self.date_of_birth)
            .field("phone_number", &self.phone_number)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .field("cover_image", &self.cover_image)
            .finish()
    }
}

impl SignupForm {
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();

        let required = [
            (Field::FullName, &self.full_name, "Full name is required"),
            (Field::Username, &self.username, "Username is required"),
            (Field::Email, &self.email, "Email is required"),
            (Field::DateOfBirth, &self.date_of_birth, "Date of birth is required"),
            (Field::PhoneNumber, &self.phone_number, "Phone number is required"),
        ];
        for (field, value, message) in required {
            if is_blank(value) {
                errors.set(field, message);
            }
        }
        if self.password.is_empty() {
            errors.set(Field::Password, "Password is required");
        }
        if self.confirm_password.is_empty() {
            errors.set(Field::ConfirmPassword, "Please confirm your password");
        }
        if self.cover_image.is_none() {
            errors.set(Field::CoverImage, "Profile image is required");
        }

        if !self.email.is_empty() && !EMAIL_RE.is_match(&self.email) {
            errors.set(Field::Email, "Email is invalid");
        }
        if !self.date_of_birth.is_empty() && !DATE_OF_BIRTH_RE.is_match(&self.date_of_birth) {
            errors.set(Field::DateOfBirth, "Use DD/MM/YYYY format");
        }
        if !self.phone_number.is_empty() && !PHONE_RE.is_match(&self.phone_number) {
            errors.set(Field::PhoneNumber, "Start with country code (e.g., +91)");
        }
        if !self.password.is_empty() && self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.set(Field::Password, "Password must be at least 8 characters");
        }
        if self.password != self.confirm_password {
            errors.set(Field::ConfirmPassword, "Passwords do not match");
        }

        errors.into_result(|| Registration {
            full_name: self.full_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            date_of_birth: self.date_of_birth.clone(),
            phone_number: self.phone_number.clone(),
            password: self.password.clone(),
            // Checked above: an error is recorded when this is None.
            cover_image: self.cover_image.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_signup() -> SignupForm {
        SignupForm {
            full_name: "Al Smith".to_string(),
            username: "al".to_string(),
            email: "al@example.com".to_string(),
            date_of_birth: "07/03/1990".to_string(),
            phone_number: "+91 1234567890".to_string(),
            password: "goodpass1".to_string(),
            confirm_password: "goodpass1".to_string(),
            cover_image: Some(PathBuf::from("avatar.png")),
        }
    }

    #[test]
    fn test_valid_signup_passes() {
        let registration = valid_signup().validate().expect("form should be valid");
        assert_eq!(registration.username, "al");
        assert_eq!(registration.cover_image, PathBuf::from("avatar.png"));
    }

    #[test]
    fn test_short_password_rejected() {
        let form = SignupForm {
            password: "short".to_string(),
            confirm_password: "short".to_string(),
            ..valid_signup()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get(Field::Password),
            Some("Password must be at least 8 characters")
        );
        assert_eq!(errors.get(Field::ConfirmPassword), None);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_password_mismatch_rejected() {
        let form = SignupForm {
            confirm_password: "different".to_string(),
            ..valid_signup()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get(Field::ConfirmPassword), Some("Passwords do not match"));
        assert_eq!(errors.get(Field::Password), None);
    }

    #[test]
    fn test_empty_signup_reports_every_required_field() {
        let errors = SignupForm::default().validate().unwrap_err();
        assert_eq!(errors.get(Field::FullName), Some("Full name is required"));
        assert_eq!(errors.get(Field::Username), Some("Username is required"));
        assert_eq!(errors.get(Field::Email), Some("Email is required"));
        assert_eq!(errors.get(Field::DateOfBirth), Some("Date of birth is required"));
        assert_eq!(errors.get(Field::PhoneNumber), Some("Phone number is required"));
        assert_eq!(errors.get(Field::Password), Some("Password is required"));
        assert_eq!(
            errors.get(Field::ConfirmPassword),
            Some("Please confirm your password")
        );
        assert_eq!(errors.get(Field::CoverImage), Some("Profile image is required"));
    }

    #[test]
    fn test_format_rules() {
        let form = SignupForm {
            email: "not-an-email".to_string(),
            date_of_birth: "1990-03-07".to_string(),
            phone_number: "1234567890".to_string(),
            ..valid_signup()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get(Field::Email), Some("Email is invalid"));
        assert_eq!(errors.get(Field::DateOfBirth), Some("Use DD/MM/YYYY format"));
        assert_eq!(
            errors.get(Field::PhoneNumber),
            Some("Start with country code (e.g., +91)")
        );
    }

    #[test]
    fn test_date_of_birth_ranges() {
        for dob in ["01/01/2000", "31/12/1999", "29/02/2024"] {
            assert!(DATE_OF_BIRTH_RE.is_match(dob), "{dob} should match");
        }
        for dob in ["00/01/2000", "32/01/2000", "10/13/2000", "1/1/2000", "01/01/20"] {
            assert!(!DATE_OF_BIRTH_RE.is_match(dob), "{dob} should not match");
        }
    }

    #[test]
    fn test_whitespace_only_fields_are_missing() {
        let form = SignupForm {
            full_name: "   ".to_string(),
            ..valid_signup()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get(Field::FullName), Some("Full name is required"));
    }

    #[test]
    fn test_login_form() {
        let creds = LoginForm {
            email: " al@example.com ".to_string(),
            password: "x".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(creds.email, "al@example.com");

        let errors = LoginForm::default().validate().unwrap_err();
        assert_eq!(errors.get(Field::Email), Some("Email is required"));
        assert_eq!(errors.get(Field::Password), Some("Password is required"));

        let errors = LoginForm {
            email: "al".to_string(),
            password: "x".to_string(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.get(Field::Email), Some("Email is invalid"));
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::new();
        errors.set(Field::Password, "too short");
        errors.set(Field::Email, "bad");
        assert_eq!(errors.to_string(), "email: bad; password: too short");
    }

    #[test]
    fn test_debug_hides_passwords() {
        let login = LoginForm {
            email: "a@example.com".to_string(),
            password: "hunter2secret".to_string(),
        };
        let out = format!("{:?}", login);
        assert!(out.contains("a@example.com"));
        assert!(!out.contains("hunter2secret"));

        let mut signup = valid_signup();
        signup.password = "hunter2secret".to_string();
        signup.confirm_password = "hunter2mistyped".to_string();
        let out = format!("{:?}", signup);
        assert!(!out.contains("hunter2secret"));
        assert!(!out.contains("hunter2mistyped"));
        assert!(out.contains(&signup.username));
    }
}
