//! User-related models

use serde::{Deserialize, Serialize};

/// User profile as returned by `/get-user` and embedded in chat summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

impl User {
    /// Avatar initials: first letter of first and last name, upper-cased.
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .next()
            .into_iter()
            .chain(self.last_name.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// "First Last" for display.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Body of `POST /register`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
}

impl Registration {
    /// Name of the first field left blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("email", &self.email),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
pub(crate) fn sample_user(id: i64, first: &str, last: &str, username: &str) -> User {
    User {
        id,
        email: format!("{}@example.com", username),
        first_name: first.to_string(),
        last_name: last.to_string(),
        username: username.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initials_upper_cased() {
        let user = sample_user(2, "ada", "byron", "ab");
        assert_eq!(user.initials(), "AB");
    }

    #[test]
    fn test_initials_with_missing_last_name() {
        let user = sample_user(2, "Cher", "", "cher");
        assert_eq!(user.initials(), "C");
        assert_eq!(user.full_name(), "Cher");
    }

    #[test]
    fn test_user_deserializes_backend_shape() {
        let json = r#"{"id":7,"email":"a@b.c","first_name":"A","last_name":"B","username":"ab"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.username, "ab");
    }

    #[test]
    fn test_registration_missing_field() {
        let mut reg = Registration {
            email: "a@b.c".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            username: "ab".into(),
            password: "  ".into(),
        };
        assert_eq!(reg.missing_field(), Some("password"));
        reg.password = "hunter2".into();
        assert_eq!(reg.missing_field(), None);
    }
}
