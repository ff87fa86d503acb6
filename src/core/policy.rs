//! IAM policy document model
//!
//! A policy is an ordered list of role bindings plus the `etag` and `version`
//! metadata of the document it was loaded from. Filters narrow the policy in
//! place and return `&mut Self`, so calls can be chained:
//!
//! ```
//! use pparse::Policy;
//! use serde_json::json;
//!
//! let doc = json!({
//!     "etag": "BwXhqDw=",
//!     "version": 1,
//!     "bindings": [
//!         {"role": "roles/owner", "members": ["user:ann@company.com", "group:ops@company.com"]},
//!         {"role": "roles/viewer", "members": ["user:bob@other.com"]}
//!     ]
//! });
//!
//! let mut policy = Policy::from_document(&doc).unwrap();
//! policy.filter_by_type("user").filter_by_domain("company.com");
//!
//! assert_eq!(policy.principals().into_iter().collect::<Vec<_>>(), ["ann@company.com"]);
//! ```

use super::member::{Member, PrincipalType};
use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// Association between one role and the members granted it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Role identifier, e.g. `roles/editor`
    pub role: String,
    /// Members holding the role, in document order
    pub members: Vec<Member>,
}

impl Binding {
    /// Create a binding from already parsed members
    pub fn new(role: impl Into<String>, members: Vec<Member>) -> Self {
        Binding {
            role: role.into(),
            members,
        }
    }

    /// Build a binding from a document record with `role` and `members` keys
    fn from_document(source: &Value, index: usize) -> Result<Self> {
        let role = source
            .get("role")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(format!("bindings[{index}].role must be a string")))?;

        let raw_members = source
            .get("members")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed(format!("bindings[{index}].members must be a sequence")))?;

        let members = raw_members
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                raw.as_str()
                    .ok_or_else(|| {
                        malformed(format!("bindings[{index}].members[{i}] must be a string"))
                    })
                    .and_then(Member::parse)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Binding::new(role, members))
    }

    fn to_document(&self) -> Value {
        json!({
            "role": self.role,
            "members": self.members.iter().map(|m| m.member.as_str()).collect::<Vec<_>>(),
        })
    }
}

/// One (member, role) pair, the unit of tabular output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub principal_type: PrincipalType,
    pub principal: String,
    pub role: String,
}

/// Complete IAM policy document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    etag: String,
    version: i64,
    bindings: Vec<Binding>,
}

impl Policy {
    /// Create a policy from its parts
    pub fn new(etag: impl Into<String>, version: i64, bindings: Vec<Binding>) -> Self {
        Policy {
            etag: etag.into(),
            version,
            bindings,
        }
    }

    /// Build a policy from a decoded document
    ///
    /// The document must carry `etag` (string), `version` (integer) and
    /// `bindings` (sequence of `{role, members}` records).
    ///
    /// # Errors
    ///
    /// `MalformedDocument` if a key is missing or has the wrong shape,
    /// `MalformedPrincipal` if any member string cannot be parsed. No policy
    /// is returned in either case.
    pub fn from_document(doc: &Value) -> Result<Self> {
        if !doc.is_object() {
            return Err(malformed("document must be a mapping".to_string()));
        }

        let etag = doc
            .get("etag")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("etag must be a string".to_string()))?;

        let version = doc
            .get("version")
            .and_then(Value::as_i64)
            .ok_or_else(|| malformed("version must be an integer".to_string()))?;

        let bindings = doc
            .get("bindings")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed("bindings must be a sequence".to_string()))?
            .iter()
            .enumerate()
            .map(|(i, b)| Binding::from_document(b, i))
            .collect::<Result<Vec<_>>>()?;

        debug!(bindings = bindings.len(), "loaded policy");

        Ok(Policy::new(etag, version, bindings))
    }

    /// Project the policy back to a document with raw member strings
    pub fn to_document(&self) -> Value {
        json!({
            "etag": self.etag,
            "version": self.version,
            "bindings": self.bindings.iter().map(Binding::to_document).collect::<Vec<_>>(),
        })
    }

    /// One record per (binding, member) pair, bindings first then members
    pub fn to_flat_records(&self) -> Vec<FlatRecord> {
        self.bindings
            .iter()
            .flat_map(|b| {
                b.members.iter().map(move |m| FlatRecord {
                    principal_type: m.principal_type,
                    principal: m.principal.clone(),
                    role: b.role.clone(),
                })
            })
            .collect()
    }

    pub fn etag(&self) -> &str {
        &self.etag
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// True when no binding has a member left
    pub fn is_empty(&self) -> bool {
        self.bindings.iter().all(|b| b.members.is_empty())
    }

    /// Distinct bare identities across all members
    pub fn principals(&self) -> BTreeSet<String> {
        self.iter_members().map(|m| m.principal.clone()).collect()
    }

    /// Distinct raw `type:identity` strings across all members
    pub fn members(&self) -> BTreeSet<String> {
        self.iter_members().map(|m| m.member.clone()).collect()
    }

    /// Distinct roles of bindings that still have at least one member
    pub fn roles(&self) -> BTreeSet<String> {
        self.bindings
            .iter()
            .filter(|b| !b.members.is_empty())
            .map(|b| b.role.clone())
            .collect()
    }

    /// Keep only members whose principal is listed
    ///
    /// Bindings left without members are dropped. An empty list means no
    /// filter was requested and leaves the policy unchanged.
    pub fn filter_by_principals<S: AsRef<str>>(&mut self, principals: &[S]) -> &mut Self {
        if principals.is_empty() {
            return self;
        }
        let wanted: HashSet<&str> = principals.iter().map(AsRef::as_ref).collect();
        self.retain_members(|m| wanted.contains(m.principal.as_str()))
    }

    /// Keep only bindings whose role is listed; members are untouched
    ///
    /// An empty list leaves the policy unchanged.
    pub fn filter_by_roles<S: AsRef<str>>(&mut self, roles: &[S]) -> &mut Self {
        if roles.is_empty() {
            return self;
        }
        let wanted: HashSet<&str> = roles.iter().map(AsRef::as_ref).collect();
        self.bindings.retain(|b| wanted.contains(b.role.as_str()));
        debug!(bindings = self.bindings.len(), "filtered by role");
        self
    }

    /// Keep only members of the given principal type, ignoring case
    ///
    /// An empty string leaves the policy unchanged. A type outside the four
    /// known kinds is logged and still applied, which empties the policy.
    pub fn filter_by_type(&mut self, kind: &str) -> &mut Self {
        if kind.is_empty() {
            return self;
        }
        if let Err(e) = PrincipalType::parse_lenient(kind) {
            warn!("{e}");
        }
        self.retain_members(|m| m.principal_type.matches(kind))
    }

    /// Keep only members whose raw member string ends with `domain`
    ///
    /// The suffix is tested against the full `type:identity` text and applies
    /// to every principal type, service accounts included. An empty suffix
    /// leaves the policy unchanged.
    pub fn filter_by_domain(&mut self, domain: &str) -> &mut Self {
        if domain.is_empty() {
            return self;
        }
        self.retain_members(|m| m.member.ends_with(domain))
    }

    fn iter_members(&self) -> impl Iterator<Item = &Member> {
        self.bindings.iter().flat_map(|b| b.members.iter())
    }

    /// Drop non-matching members, then drop bindings left with none
    fn retain_members<F>(&mut self, keep: F) -> &mut Self
    where
        F: Fn(&Member) -> bool,
    {
        for binding in &mut self.bindings {
            binding.members.retain(|m| keep(m));
        }
        self.bindings.retain(|b| !b.members.is_empty());
        debug!(bindings = self.bindings.len(), "filtered members");
        self
    }
}

fn malformed(msg: String) -> PolicyError {
    PolicyError::MalformedDocument(msg)
}
