use serde::Serialize;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Viewer,
}

impl Role {
    pub fn can_record_transfers(self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub username: String,
    pub password: String,
}

impl CredentialPair {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

/// The two configured logins. Admin is tried first; the pairs are expected
/// to be disjoint but nothing enforces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub admin: CredentialPair,
    pub viewer: CredentialPair,
}

impl Credentials {
    pub fn login(&self, username: &str, password: &str) -> Result<Role, AuthError> {
        if self.admin.matches(username, password) {
            Ok(Role::Admin)
        } else if self.viewer.matches(username, password) {
            Ok(Role::Viewer)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            admin: CredentialPair::new("admin", "secret"),
            viewer: CredentialPair::new("viewer", "peek"),
        }
    }

    #[test]
    fn admin_pair_yields_admin() {
        assert_eq!(credentials().login("admin", "secret"), Ok(Role::Admin));
    }

    #[test]
    fn viewer_pair_yields_viewer() {
        assert_eq!(credentials().login("viewer", "peek"), Ok(Role::Viewer));
    }

    #[test]
    fn wrong_password_is_rejected() {
        assert_eq!(
            credentials().login("admin", "wrong"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            credentials().login("viewer", "secret"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn inputs_are_compared_verbatim() {
        assert!(credentials().login(" admin", "secret").is_err());
        assert!(credentials().login("", "").is_err());
    }

    #[test]
    fn admin_wins_when_pairs_overlap() {
        let creds = Credentials {
            admin: CredentialPair::new("same", "pw"),
            viewer: CredentialPair::new("same", "pw"),
        };
        assert_eq!(creds.login("same", "pw"), Ok(Role::Admin));
    }

    #[test]
    fn only_admin_records_transfers() {
        assert!(Role::Admin.can_record_transfers());
        assert!(!Role::Viewer.can_record_transfers());
    }
}
