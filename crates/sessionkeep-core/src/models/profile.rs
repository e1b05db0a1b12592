use serde_json::Value;

/// Read-only view over an opaque user profile.
#[derive(Debug, Clone, Copy)]
pub struct ProfileView<'a> {
    user: &'a Value,
}

impl<'a> ProfileView<'a> {
    pub fn new(user: &'a Value) -> Self {
        Self { user }
    }

    fn str_field(&self, key: &str) -> Option<&'a str> {
        self.user
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn username(&self) -> Option<&'a str> {
        self.str_field("username")
    }

    pub fn email(&self) -> Option<&'a str> {
        self.str_field("email")
    }

    pub fn full_name(&self) -> Option<&'a str> {
        self.str_field("fullName")
    }

    pub fn cover_image(&self) -> Option<&'a str> {
        self.str_field("coverImage")
    }

    /// Avatar fallback: first letter of the username, uppercased, or "U".
    pub fn initial(&self) -> String {
        self.username()
            .and_then(|u| u.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }

    /// Best available name for display.
    pub fn display_name(&self) -> &'a str {
        self.username()
            .or_else(|| self.full_name())
            .or_else(|| self.email())
            .unwrap_or("user")
    }
}
