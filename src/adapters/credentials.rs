//! Credential store adapter.
//!
//! The auth layer owns login and token refresh; this adapter is the
//! slot it writes into and the poll loop reads from once per tick.

use core::cell::RefCell;
use std::rc::Rc;

use log::info;

use crate::app::commands::Credential;
use crate::app::ports::CredentialStore;

/// Shared, clonable token slot.  Clones observe the same value.
#[derive(Debug, Clone, Default)]
pub struct SharedCredential {
    slot: Rc<RefCell<Option<Credential>>>,
}

impl SharedCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(Credential::new(token));
        store
    }

    pub fn set(&self, credential: Credential) {
        info!("Credentials: token updated");
        *self.slot.borrow_mut() = Some(credential);
    }

    /// Log out: subsequent polls report unauthenticated.
    pub fn clear(&self) {
        info!("Credentials: token cleared");
        self.slot.borrow_mut().take();
    }
}

impl CredentialStore for SharedCredential {
    fn get(&self) -> Option<Credential> {
        self.slot.borrow().clone()
    }
}
