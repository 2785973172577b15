use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::contract::model::{NewUser, User};

/// Process-lifetime user store.
///
/// One exclusive lock covers the records and the id counter; reads take it
/// too. Every method returns owned copies so callers never hold a reference
/// into the map once the guard is released.
#[derive(Debug)]
pub struct UserStore {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    // Ordered by id so listings are stable.
    records: BTreeMap<i64, User>,
    next_id: i64,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    /// Empty store; the first created user gets id 1.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Snapshot of all users in ascending id order.
    pub fn list(&self) -> Vec<User> {
        self.inner.lock().records.values().cloned().collect()
    }

    pub fn create(&self, new_user: NewUser) -> User {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        let user = User {
            id,
            name: new_user.name,
            email: new_user.email,
        };
        inner.records.insert(id, user.clone());
        user
    }

    pub fn get(&self, id: i64) -> Option<User> {
        self.inner.lock().records.get(&id).cloned()
    }

    /// Replace name and email of an existing user. The id never changes.
    pub fn update(&self, id: i64, data: NewUser) -> Option<User> {
        let mut inner = self.inner.lock();
        let user = inner.records.get_mut(&id)?;
        user.name = data.name;
        user.email = data.email;
        Some(user.clone())
    }

    /// Returns false when there was nothing to delete.
    pub fn delete(&self, id: i64) -> bool {
        self.inner.lock().records.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
