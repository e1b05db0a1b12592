use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Login credentials sent as the JSON body of the login request.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `{ "data": { "user": {...}, "accessToken": "..." } }`
#[derive(Debug, Deserialize)]
pub struct LoginEnvelope {
    pub data: LoginData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub user: Value,
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// A signup form that passed client-side validation.
#[derive(Clone)]
pub struct Registration {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub date_of_birth: String,
    pub phone_number: String,
    pub password: String,
    pub cover_image: PathBuf,
}

impl Registration {
    /// Text fields in the order the multipart form carries them.
    pub fn text_fields(&self) -> [(&'static str, &str); 6] {
        [
            ("fullName", &self.full_name),
            ("username", &self.username),
            ("email", &self.email),
            ("dateOfBirth", &self.date_of_birth),
            ("phoneNumber", &self.phone_number),
            ("password", &self.password),
        ]
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("cover_image", &self.cover_image)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_envelope() {
        let json = r#"{"statusCode":200,"data":{"user":{"username":"al","email":"al@example.com"},"accessToken":"tok123"},"success":true}"#;
        let envelope: LoginEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.access_token, "tok123");
        assert_eq!(envelope.data.user["username"], "al");
    }

    #[test]
    fn test_login_envelope_requires_token() {
        let json = r#"{"data":{"user":{"username":"al"}}}"#;
        assert!(serde_json::from_str::<LoginEnvelope>(json).is_err());
    }

    #[test]
    fn test_register_response_defaults() {
        let resp: RegisterResponse = serde_json::from_str("{}").unwrap();
        assert!(!resp.success);
        assert!(resp.message.is_none());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("al@example.com", "hunter22");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("al@example.com"));
        assert!(!debug.contains("hunter22"));
    }
}
