//! Actors and the roles they hold.
//!
//! A user is a provider (publishes resources), a consumer (books them), or
//! both. Administrator is an extra capability and never an identity on its
//! own. The "at least one identity" rule is enforced here and nowhere else:
//! every `User` value in the system has passed [`validate_identity`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationErrors, ValidationFailure};
use crate::id::uuid_id;

uuid_id!(
    /// Identifier of a [`User`].
    UserId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Provider,
    Consumer,
    Administrator,
}

/// The set of capabilities held by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roles(BTreeSet<Role>);

impl Roles {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Roles(roles.into_iter().collect())
    }

    pub fn from_flags(is_provider: bool, is_consumer: bool, is_administrator: bool) -> Self {
        let flagged = [
            (is_provider, Role::Provider),
            (is_consumer, Role::Consumer),
            (is_administrator, Role::Administrator),
        ];

        Roles(
            flagged
                .into_iter()
                .filter_map(|(set, role)| set.then_some(role))
                .collect(),
        )
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_provider(&self) -> bool {
        self.contains(Role::Provider)
    }

    pub fn is_consumer(&self) -> bool {
        self.contains(Role::Consumer)
    }

    pub fn is_administrator(&self) -> bool {
        self.contains(Role::Administrator)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

/// Checks that the roles make up an identity (provider and/or consumer).
pub fn validate_identity(roles: &Roles) -> Result<(), ValidationErrors> {
    if roles.is_provider() || roles.is_consumer() {
        Ok(())
    } else {
        Err(ValidationFailure::IdentityHasNoRole.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserRecord")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    roles: Roles,
}

/// Unchecked shape of a stored user.
#[derive(Deserialize)]
struct UserRecord {
    id: UserId,
    name: String,
    email: String,
    roles: Roles,
}

impl TryFrom<UserRecord> for User {
    type Error = ValidationErrors;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let mut user = User::new(record.name, record.email, record.roles)?;
        user.id = record.id;
        Ok(user)
    }
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        roles: Roles,
    ) -> Result<Self, ValidationErrors> {
        let email = email.into();
        let mut errors = ValidationErrors::default();

        if email.trim().is_empty() {
            errors.push(ValidationFailure::MissingRequiredField(Field::Email));
        }
        if let Err(identity_errors) = validate_identity(&roles) {
            identity_errors.iter().cloned().for_each(|f| errors.push(f));
        }

        errors.into_result(User {
            id: UserId::new(),
            name: name.into(),
            email,
            roles,
        })
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    /// Replaces the user's roles, keeping the old ones if the new set is not an identity.
    pub fn set_roles(&mut self, roles: Roles) -> Result<(), ValidationErrors> {
        validate_identity(&roles)?;
        self.roles = roles;
        Ok(())
    }

    /// "Provider", "Consumer" or "Provider, Consumer".
    pub fn identity_label(&self) -> String {
        let mut identity = Vec::new();
        if self.roles.is_provider() {
            identity.push("Provider");
        }
        if self.roles.is_consumer() {
            identity.push("Consumer");
        }
        identity.join(", ")
    }
}
