//! # Approver Directory
//!
//! Resolves WHO gets notified and who counts as a client contact. Role
//! resolution lives with an external collaborator; the engine consumes the
//! result through this seam so tests can inject a fixed roster.

use std::collections::HashMap;

/// Source of approver and client-contact identities.
///
/// The engine never stores people; it asks this trait at notification
/// fan-out time and when checking whether a deciding actor is the
/// registered client contact for an advertiser.
pub trait ApproverDirectory: Send + Sync {
    /// User ids of everyone who may approve on the internal track.
    fn internal_approvers(&self) -> Vec<String>;

    /// User ids registered as client contacts for the advertiser.
    fn client_contacts(&self, advertiser_id: &str) -> Vec<String>;

    /// Whether the actor is a registered client contact for the advertiser.
    fn is_client_contact(&self, actor_id: &str, advertiser_id: &str) -> bool {
        self.client_contacts(advertiser_id)
            .iter()
            .any(|c| c == actor_id)
    }
}

/// Fixed in-memory roster. Production wires the real user store in here;
/// tests build one inline.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    internal: Vec<String>,
    contacts: HashMap<String, Vec<String>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        StaticDirectory::default()
    }

    /// Adds an internal approver.
    pub fn with_internal_approver(mut self, user_id: impl Into<String>) -> Self {
        self.internal.push(user_id.into());
        self
    }

    /// Registers a client contact for an advertiser.
    pub fn with_client_contact(
        mut self,
        advertiser_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        self.contacts
            .entry(advertiser_id.into())
            .or_default()
            .push(user_id.into());
        self
    }
}

impl ApproverDirectory for StaticDirectory {
    fn internal_approvers(&self) -> Vec<String> {
        self.internal.clone()
    }

    fn client_contacts(&self, advertiser_id: &str) -> Vec<String> {
        self.contacts.get(advertiser_id).cloned().unwrap_or_default()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_directory_lookup() {
        let dir = StaticDirectory::new()
            .with_internal_approver("mgr-1")
            .with_internal_approver("mgr-2")
            .with_client_contact("adv-1", "contact-1");

        assert_eq!(dir.internal_approvers().len(), 2);
        assert!(dir.is_client_contact("contact-1", "adv-1"));
        assert!(!dir.is_client_contact("contact-1", "adv-2"));
        assert!(dir.client_contacts("adv-unknown").is_empty());
    }
}
