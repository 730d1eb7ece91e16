use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller as reported by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

impl Identity {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }

    /// Advisor alias shown on captures: the local part of the e-mail.
    pub fn alias(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// An identity with its role resolved against the admin set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Requester {
    pub fn advisor(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_is_email_local_part() {
        let identity = Identity::new(Uuid::new_v4(), "maria.lopez@example.com");
        assert_eq!(identity.alias(), "maria.lopez");

        let identity = Identity::new(Uuid::new_v4(), "nodomain");
        assert_eq!(identity.alias(), "nodomain");
    }
}
