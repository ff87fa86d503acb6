//! Member identity parsing
//!
//! A binding member is written as `<type>:<id>`, for example
//! `user:ann@example.com` or `serviceAccount:123@cloudbuild.gserviceaccount.com`.
//! Parsing splits the string into a typed principal and keeps the matched text
//! so the member can be written back out unchanged.

use crate::error::{PolicyError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Kind of identity a member refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrincipalType {
    /// A single Google account
    User,
    /// A Google group
    Group,
    /// Every account in a Workspace or Cloud Identity domain
    Domain,
    /// A service account
    ServiceAccount,
}

impl PrincipalType {
    /// All recognized principal types
    pub const ALL: [PrincipalType; 4] = [
        PrincipalType::User,
        PrincipalType::Group,
        PrincipalType::Domain,
        PrincipalType::ServiceAccount,
    ];

    /// Textual form as it appears in policy documents
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalType::User => "user",
            PrincipalType::Group => "group",
            PrincipalType::Domain => "domain",
            PrincipalType::ServiceAccount => "serviceAccount",
        }
    }

    /// Case-insensitive comparison against user input
    pub fn matches(&self, kind: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(kind)
    }

    /// Resolve user input to a principal type, ignoring case
    ///
    /// # Errors
    ///
    /// Returns `UnknownPrincipalType` if `kind` is not one of the four kinds.
    pub fn parse_lenient(kind: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.matches(kind))
            .ok_or_else(|| PolicyError::UnknownPrincipalType(kind.to_string()))
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single member of a binding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    /// Kind of identity
    pub principal_type: PrincipalType,
    /// Bare identity, e.g. `ann@example.com`
    pub principal: String,
    /// Full `type:identity` text as matched in the document
    pub member: String,
}

impl Member {
    /// Pattern for member strings; the type prefix is case-sensitive
    const PATTERN: &'static str = r"(user|group|domain|serviceAccount):(.*@?\w+\.\w+)";

    fn regex() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(Self::PATTERN).expect("member pattern is valid"))
    }

    /// Parse a raw member string
    ///
    /// The first `type:` prefix found in `raw` starts the match, and the
    /// identity must end in a dotted domain component.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPrincipal` carrying `raw` if nothing matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use pparse::{Member, PrincipalType};
    ///
    /// let m = Member::parse("user:ann@example.com").unwrap();
    /// assert_eq!(m.principal_type, PrincipalType::User);
    /// assert_eq!(m.principal, "ann@example.com");
    /// assert_eq!(m.member, "user:ann@example.com");
    ///
    /// assert!(Member::parse("nonsense").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let caps = Self::regex()
            .captures(raw)
            .ok_or_else(|| PolicyError::MalformedPrincipal(raw.to_string()))?;

        let principal_type = match &caps[1] {
            "user" => PrincipalType::User,
            "group" => PrincipalType::Group,
            "domain" => PrincipalType::Domain,
            "serviceAccount" => PrincipalType::ServiceAccount,
            _ => return Err(PolicyError::MalformedPrincipal(raw.to_string())),
        };

        Ok(Member {
            principal_type,
            principal: caps[2].to_string(),
            member: caps[0].to_string(),
        })
    }
}

impl FromStr for Member {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        Member::parse(s)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.member)
    }
}
