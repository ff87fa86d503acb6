//! Role permission lookup
//!
//! Answers "which of these roles grant permission X" so the result can feed
//! [`Policy::filter_by_roles`](crate::Policy::filter_by_roles). The policy
//! model never performs lookups itself; it only receives the resolved set.
//!
//! - [`IamRoleClient`] queries the IAM REST API with application default
//!   credentials and caches every role it fetches
//! - [`RoleCatalog`] answers from a role→permissions file, offline

mod cache;
mod catalog;
mod client;

pub use cache::RoleCache;
pub use catalog::RoleCatalog;
pub use client::{application_default_token, IamRoleClient, DEFAULT_ENDPOINT};

use crate::error::Result;
use std::collections::BTreeSet;
use tracing::info;

/// Source of role definitions
pub trait RoleResolver {
    /// Permissions included in `role`
    ///
    /// `Ok(None)` means the role could not be looked up and should be
    /// skipped; it is never treated as granting anything.
    fn permissions(&mut self, role: &str) -> Result<Option<Vec<String>>>;

    /// Subset of `roles` whose definition includes `permission`
    ///
    /// # Errors
    ///
    /// Propagates `Authentication` and `RoleLookup` failures; no partial
    /// result is returned.
    fn roles_with_permission(
        &mut self,
        roles: &BTreeSet<String>,
        permission: &str,
    ) -> Result<BTreeSet<String>> {
        let mut matching = BTreeSet::new();
        for role in roles {
            if let Some(permissions) = self.permissions(role)? {
                if permissions.iter().any(|p| p == permission) {
                    matching.insert(role.clone());
                }
            }
        }
        info!("{} found in {:?}", permission, matching);
        Ok(matching)
    }
}
