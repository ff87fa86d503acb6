//! # pparse - IAM policy parser and filter
//!
//! `pparse` loads a Google Cloud IAM policy document, narrows it by
//! principal, role, domain, principal type or permission, and renders the
//! result as YAML, JSON, CSV or a table.
//!
//! - **Member parsing** of `type:identity` strings into typed principals
//! - **Chainable filters** that mutate the policy in place
//! - **Role lookup** against the IAM API (or an offline catalog) to answer
//!   "which roles grant this permission"
//!
//! ## Quick Start
//!
//! ```rust
//! use pparse::config::{decode_document, InputFormat};
//! use pparse::format::{render, OutputFormat};
//! use pparse::{Policy, Result};
//!
//! # fn main() -> Result<()> {
//! let text = r#"
//! etag: BwXhqDw6h5k=
//! version: 1
//! bindings:
//! - role: roles/owner
//!   members:
//!   - user:ann@company.com
//!   - group:admins@company.com
//! - role: roles/viewer
//!   members:
//!   - serviceAccount:ci@project.iam.gserviceaccount.com
//! "#;
//!
//! let mut policy = Policy::from_document(&decode_document(text, InputFormat::Yaml)?)?;
//! policy.filter_by_type("user");
//!
//! let csv = render(&policy, OutputFormat::Csv)?;
//! assert_eq!(csv, "principal_type,principal,role\nuser,ann@company.com,roles/owner\n");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod format;
pub mod iam;

pub use crate::core::{Binding, FlatRecord, Member, Policy, PrincipalType};
pub use crate::error::{PolicyError, Result};
pub use crate::iam::{IamRoleClient, RoleCatalog, RoleResolver};
