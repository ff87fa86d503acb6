//! Command line interface
//!
//! Each invocation loads one policy, applies at most one filter command and
//! renders the result. Commands whose required argument is missing print
//! their help text instead of failing.

use crate::config::{Config, InputFormat, InputSource};
use crate::format::{render, render_lines, OutputFormat};
use crate::iam::{IamRoleClient, RoleCatalog, RoleResolver, DEFAULT_ENDPOINT};
use crate::Policy;
use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "pparse",
    about = "Parse and filter Google Cloud Platform IAM policy documents.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filename of the IAM policy, omit to read from stdin
    #[arg(short = 'f', long, global = true)]
    pub input_file: Option<PathBuf>,

    /// Input format of policy document to parse
    #[arg(short = 'i', long, value_enum, default_value_t = InputFormat::Yaml, global = true, ignore_case = true)]
    pub input_format: InputFormat,

    /// Output format for the parsed policy
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Yaml, global = true, ignore_case = true)]
    pub output_format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter results based on user principal.
    ///
    /// Pass in one or more principal email addresses to receive the roles
    /// bound to those principals.
    Principal {
        /// Principal identities, e.g. ann@company.com
        principals: Vec<String>,

        /// Only show list of roles
        #[arg(short = 's', long)]
        roles_only: bool,
    },

    /// Filter results based on role.
    ///
    /// Pass in one or more role names to receive the members holding them.
    Role {
        /// Role names, e.g. roles/editor
        roles: Vec<String>,

        /// Only show list of users
        #[arg(short = 's', long)]
        users_only: bool,
    },

    /// Filter results based on domain.
    ///
    /// Pass in a domain to receive the bindings of members ending with it.
    Domain {
        /// Domain suffix, e.g. company.com
        domain: Option<String>,
    },

    /// Filter results based on principal type.
    ///
    /// Pass in a type (user, group, domain, serviceAccount) to receive the
    /// bindings of members of that type.
    Type {
        /// Principal type, case-insensitive
        kind: Option<String>,
    },

    /// Filter results based on permission.
    ///
    /// Looks up which of the policy's roles include the permission and keeps
    /// only those bindings. Uses the IAM API with application default
    /// credentials unless --catalog is given.
    Permission {
        /// Permission name, e.g. storage.buckets.get
        permission: Option<String>,

        /// Only show list of roles
        #[arg(short = 'r', long, conflicts_with = "users_only")]
        roles_only: bool,

        /// Only show list of users
        #[arg(short = 'u', long)]
        users_only: bool,

        /// Resolve roles from a role→permissions YAML/JSON file instead of the IAM API
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// IAM API endpoint
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
    },
}

impl Cli {
    /// Build the invocation config from the global options
    pub fn config(&self) -> Config {
        Config::new(
            InputSource::from_path(self.input_file.as_deref()),
            self.input_format,
            self.output_format,
        )
    }

    /// Name of the subcommand whose help should be shown, if its required
    /// argument is missing
    fn missing_argument(&self) -> Option<&'static str> {
        match &self.command {
            Some(Commands::Principal { principals, .. }) if principals.is_empty() => {
                Some("principal")
            }
            Some(Commands::Role { roles, users_only }) if roles.is_empty() && !users_only => {
                Some("role")
            }
            Some(Commands::Domain { domain: None }) => Some("domain"),
            Some(Commands::Type { kind: None }) => Some("type"),
            Some(Commands::Permission {
                permission: None, ..
            }) => Some("permission"),
            _ => None,
        }
    }
}

/// Help text for the root command or one of its subcommands
pub fn help_text(subcommand: Option<&str>) -> String {
    let mut cmd = Cli::command();
    cmd.build();
    if let Some(name) = subcommand {
        if let Some(sub) = cmd.find_subcommand_mut(name) {
            return sub.render_help().to_string();
        }
    }
    cmd.render_help().to_string()
}

/// Execute the parsed command line, returning the text to print
pub fn run(cli: &Cli) -> Result<String> {
    if let Some(name) = cli.missing_argument() {
        return Ok(help_text(Some(name)));
    }

    let config = cli.config();
    if config.input.is_interactive() {
        return Ok(help_text(None));
    }

    let mut policy = config.load_policy().context("failed to load policy")?;
    let format = config.output_format;

    let Some(command) = &cli.command else {
        return Ok(render(&policy, format)?);
    };

    match command {
        Commands::Principal {
            principals,
            roles_only,
        } => {
            policy.filter_by_principals(principals.as_slice());
            if *roles_only {
                return Ok(render_lines(policy.roles()));
            }
        }
        Commands::Role { roles, users_only } => {
            policy.filter_by_roles(roles.as_slice());
            if *users_only {
                return Ok(render_lines(policy.principals()));
            }
        }
        Commands::Domain { domain } => {
            policy.filter_by_domain(domain.as_deref().unwrap_or_default());
        }
        Commands::Type { kind } => {
            policy.filter_by_type(kind.as_deref().unwrap_or_default());
        }
        Commands::Permission {
            permission,
            roles_only,
            users_only,
            catalog,
            endpoint,
        } => {
            let permission = permission.as_deref().unwrap_or_default();
            let mut resolver: Box<dyn RoleResolver> = match catalog {
                Some(path) => Box::new(RoleCatalog::load(path)?),
                None => Box::new(IamRoleClient::from_application_default(endpoint.as_str())?),
            };
            policy = filter_by_permission(policy, resolver.as_mut(), permission)?;
            if *roles_only {
                return Ok(render_lines(policy.roles()));
            }
            if *users_only {
                return Ok(render_lines(policy.principals()));
            }
        }
    }

    debug!(bindings = policy.bindings().len(), "rendering filtered policy");
    Ok(render(&policy, format)?)
}

/// Keep only bindings whose role grants `permission`
///
/// Unlike an empty role filter, no matching role yields an empty policy.
pub fn filter_by_permission(
    mut policy: Policy,
    resolver: &mut dyn RoleResolver,
    permission: &str,
) -> crate::Result<Policy> {
    let matching: Vec<String> = resolver
        .roles_with_permission(&policy.roles(), permission)?
        .into_iter()
        .collect();

    if matching.is_empty() {
        info!("no role in the policy grants {}", permission);
        return Ok(Policy::new(policy.etag(), policy.version(), Vec::new()));
    }

    policy.filter_by_roles(matching.as_slice());
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Policy {
        Policy::from_document(&json!({
            "etag": "BwXhqDw=",
            "version": 1,
            "bindings": [
                {"role": "roles/owner", "members": ["user:a@x.com"]},
                {"role": "roles/storage.admin", "members": ["group:g@x.com"]},
                {"role": "roles/viewer", "members": ["user:b@y.com"]}
            ]
        }))
        .unwrap()
    }

    fn catalog() -> RoleCatalog {
        let mut catalog = RoleCatalog::new();
        catalog.insert("roles/owner", ["storage.buckets.delete", "resourcemanager.projects.get"]);
        catalog.insert("roles/storage.admin", ["storage.buckets.delete"]);
        catalog.insert("roles/viewer", ["resourcemanager.projects.get"]);
        catalog
    }

    #[test]
    fn test_filter_by_permission() {
        let policy = filter_by_permission(sample(), &mut catalog(), "storage.buckets.delete").unwrap();
        assert_eq!(
            policy.roles().into_iter().collect::<Vec<_>>(),
            ["roles/owner", "roles/storage.admin"]
        );
    }

    #[test]
    fn test_filter_by_unmatched_permission_is_empty() {
        let policy = filter_by_permission(sample(), &mut catalog(), "compute.instances.delete").unwrap();
        assert!(policy.bindings().is_empty());
        assert_eq!(policy.etag(), "BwXhqDw=");
    }

    #[test]
    fn test_parse_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pparse", "type", "user", "-f", "policy.json", "-i", "json", "-o", "csv", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.input_format, InputFormat::Json);
        assert_eq!(cli.output_format, OutputFormat::Csv);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Type { kind: Some(ref k) }) if k == "user"));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["pparse"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.input_format, InputFormat::Yaml);
        assert_eq!(cli.output_format, OutputFormat::Yaml);
        assert_eq!(cli.config().input, InputSource::Stdin);
    }

    #[test]
    fn test_rejects_unknown_output_format() {
        assert!(Cli::try_parse_from(["pparse", "-o", "xml"]).is_err());
    }

    #[test]
    fn test_missing_arguments_show_help() {
        let cases: [(&[&str], Option<&str>); 6] = [
            (&["pparse", "principal"], Some("principal")),
            (&["pparse", "role"], Some("role")),
            (&["pparse", "role", "-s"], None),
            (&["pparse", "domain"], Some("domain")),
            (&["pparse", "type"], Some("type")),
            (&["pparse", "permission", "--catalog", "roles.yaml"], Some("permission")),
        ];

        for (args, expected) in cases {
            let cli = Cli::try_parse_from(args).unwrap();
            assert_eq!(cli.missing_argument(), expected, "args: {args:?}");
        }
    }

    #[test]
    fn test_help_text_for_subcommand() {
        let help = help_text(Some("principal"));
        assert!(help.contains("--roles-only"));
        assert!(help_text(None).contains("Parse and filter"));
    }
}
