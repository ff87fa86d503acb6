//! Policy data model
//!
//! - Member identity parsing (`type:identity` strings)
//! - Policy/Binding model loaded from a decoded document
//! - Chainable filters by principal, role, type and domain

pub mod member;
pub mod policy;

pub use member::{Member, PrincipalType};
pub use policy::{Binding, FlatRecord, Policy};
