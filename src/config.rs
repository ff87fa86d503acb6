//! Invocation configuration
//!
//! Everything a single run needs (where the document comes from, how it is
//! encoded, how to render the result) is carried in an explicit [`Config`]
//! value built once from the command line.

use crate::error::{PolicyError, Result};
use crate::format::OutputFormat;
use crate::Policy;
use clap::ValueEnum;
use serde_json::Value;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Encoding of the input policy document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InputFormat {
    #[default]
    Yaml,
    Json,
}

/// Where the input document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    /// A file when a path is given, stdin otherwise
    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(p) => InputSource::File(p.to_path_buf()),
            None => InputSource::Stdin,
        }
    }

    /// True when reading would block on an interactive terminal
    pub fn is_interactive(&self) -> bool {
        matches!(self, InputSource::Stdin) && io::stdin().is_terminal()
    }

    /// Read the whole document as text
    pub fn read_to_string(&self) -> Result<String> {
        match self {
            InputSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
                PolicyError::Io(io::Error::new(
                    e.kind(),
                    format!("failed to read {}: {e}", path.display()),
                ))
            }),
            InputSource::Stdin => {
                let mut buf = String::new();
                io::stdin().read_to_string(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

/// Options for one invocation
#[derive(Debug, Clone)]
pub struct Config {
    pub input: InputSource,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
}

impl Config {
    pub fn new(input: InputSource, input_format: InputFormat, output_format: OutputFormat) -> Self {
        Config {
            input,
            input_format,
            output_format,
        }
    }

    /// Read, decode and parse the configured input into a policy
    pub fn load_policy(&self) -> Result<Policy> {
        let text = self.input.read_to_string()?;
        debug!(bytes = text.len(), format = ?self.input_format, "read policy document");
        let doc = decode_document(&text, self.input_format)?;
        Policy::from_document(&doc)
    }
}

/// Decode YAML or JSON text into a generic document
///
/// # Examples
///
/// ```
/// use pparse::config::{decode_document, InputFormat};
///
/// let doc = decode_document("etag: abc\nversion: 1\nbindings: []\n", InputFormat::Yaml).unwrap();
/// assert_eq!(doc["etag"], "abc");
/// ```
pub fn decode_document(text: &str, format: InputFormat) -> Result<Value> {
    let doc = match format {
        InputFormat::Yaml => serde_yaml::from_str(text)?,
        InputFormat::Json => serde_json::from_str(text)?,
    };
    Ok(doc)
}
