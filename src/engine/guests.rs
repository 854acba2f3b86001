use std::collections::HashMap;
use std::collections::hash_map::Entry;

use ulid::Ulid;

use crate::model::{GuestContact, Role, User};

/// Known users, keyed by lowercased email.
#[derive(Debug, Clone, Default)]
pub struct GuestRegistry {
    by_email: HashMap<String, User>,
}

fn key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl GuestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later duplicates of an email are ignored.
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        let mut registry = Self::new();
        for user in users {
            registry.by_email.entry(key(&user.email)).or_insert(user);
        }
        registry
    }

    pub fn find(&self, email: &str) -> Option<&User> {
        self.by_email.get(&key(email))
    }

    pub fn contains(&self, email: &str) -> bool {
        self.by_email.contains_key(&key(email))
    }

    /// Register a guest, or return the existing user with that email.
    /// The flag is true only when a new user was inserted.
    pub fn register(&mut self, guest: &GuestContact) -> (User, bool) {
        match self.by_email.entry(key(&guest.email)) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(slot) => {
                let user = slot.insert(User {
                    id: Ulid::new(),
                    name: guest.name.trim().to_string(),
                    email: guest.email.trim().to_string(),
                    role: Role::Guest,
                });
                (user.clone(), true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}
