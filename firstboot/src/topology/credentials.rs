//! Named credential groups.

use indexmap::IndexMap;
use secrecy::SecretString;

/// Group used for logins and local users.
pub const DEFAULT_GROUP: &str = "default";

/// Group holding the enable secret.
pub const ENABLE_GROUP: &str = "enable";

/// One credential group. Either half may be absent.
#[derive(Debug, Clone, Default)]
pub struct Credential {
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(SecretString::from(password.into())),
        }
    }

    /// A group with only a password, as used for enable secrets.
    pub fn password_only(password: impl Into<String>) -> Self {
        Self {
            username: None,
            password: Some(SecretString::from(password.into())),
        }
    }
}

/// Credential groups of a device, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    groups: IndexMap<String, Credential>,
}

impl Credentials {
    pub fn get(&self, group: &str) -> Option<&Credential> {
        self.groups.get(group)
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Insert or replace a group.
    pub fn insert(&mut self, group: impl Into<String>, credential: Credential) {
        self.groups.insert(group.into(), credential);
    }

    /// Insert a group only if no group of that name exists.
    /// Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, group: &str, credential: Credential) -> bool {
        if self.groups.contains_key(group) {
            return false;
        }
        self.groups.insert(group.to_string(), credential);
        true
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
