//! Session-aware header: navigation plus either the user's menu or the
//! login/signup links.

use sessionkeep_core::models::ProfileView;
use sessionkeep_core::SessionStatus;

/// The screen the header is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Login,
    Signup,
}

const NAVIGATION: &[(&str, Screen)] = &[("Home", Screen::Home)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderItem {
    Nav { label: &'static str, active: bool },
    Avatar { initial: String, username: String, email: Option<String> },
    Action(&'static str),
}

pub fn items(status: &SessionStatus, screen: Screen) -> Vec<HeaderItem> {
    let mut items: Vec<HeaderItem> = NAVIGATION
        .iter()
        .map(|&(label, target)| HeaderItem::Nav {
            label,
            active: target == screen,
        })
        .collect();

    match status.user.as_ref().filter(|_| status.is_authenticated) {
        Some(user) => {
            let profile = ProfileView::new(user);
            items.push(HeaderItem::Avatar {
                initial: profile.initial(),
                username: profile.display_name().to_string(),
                email: profile.email().map(str::to_string),
            });
            items.push(HeaderItem::Action("Log out"));
        }
        None => {
            if screen != Screen::Login {
                items.push(HeaderItem::Action("Login"));
            }
            if screen != Screen::Signup {
                items.push(HeaderItem::Action("Sign up"));
            }
        }
    }
    items
}

/// One-line header, e.g. `[Home] | (A) alice <a@example.com> | Log out`.
pub fn render(status: &SessionStatus, screen: Screen) -> String {
    items(status, screen)
        .into_iter()
        .map(|item| match item {
            HeaderItem::Nav { label, active: true } => format!("[{}]", label),
            HeaderItem::Nav { label, active: false } => label.to_string(),
            HeaderItem::Avatar {
                initial,
                username,
                email: Some(email),
            } => format!("({}) {} <{}>", initial, username, email),
            HeaderItem::Avatar { initial, username, .. } => format!("({}) {}", initial, username),
            HeaderItem::Action(label) => label.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn authenticated(user: serde_json::Value) -> SessionStatus {
        SessionStatus {
            user: Some(user),
            token: Some("tok".to_string()),
            is_authenticated: true,
        }
    }

    #[test]
    fn test_anonymous_header() {
        let status = SessionStatus::default();
        assert_eq!(render(&status, Screen::Home), "[Home] | Login | Sign up");
        assert_eq!(render(&status, Screen::Login), "Home | Sign up");
        assert_eq!(render(&status, Screen::Signup), "Home | Login");
    }

    #[test]
    fn test_authenticated_header() {
        let status = authenticated(json!({"username": "alice", "email": "a@example.com"}));
        assert_eq!(
            render(&status, Screen::Home),
            "[Home] | (A) alice <a@example.com> | Log out"
        );
    }

    #[test]
    fn test_avatar_fallback_initial() {
        let status = authenticated(json!({"fullName": "Al Smith"}));
        let items = items(&status, Screen::Home);
        assert!(items.contains(&HeaderItem::Avatar {
            initial: "U".to_string(),
            username: "Al Smith".to_string(),
            email: None,
        }));
    }
}
