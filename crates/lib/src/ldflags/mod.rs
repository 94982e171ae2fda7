//! Link-time constant embedding.
//!
//! Configuration values reach the agent as Go `-X namespace.variable=value`
//! linker substitutions. [`assemble`] builds the set from a transport profile
//! and the request's build parameters; [`extract`] reads a single value back
//! out of a rendered flag string.

pub mod assemble;
pub mod inspect;

use std::fmt;

use thiserror::Error;

use crate::profile::ProfileError;

pub use assemble::{EMBED_TABLE, EmbedField, FieldKind, PARAMETER_TABLE, ParameterField, assemble};
pub use inspect::extract;

/// Strip the symbol table and DWARF debug info.
pub const STRIP_FLAGS: &str = "-s -w";

/// Suppress the Go build ID.
pub const BUILD_ID_FLAG: &str = "-buildid=";

#[derive(Debug, Error)]
pub enum AssembleError {
  #[error("failed to read transport profile: {0}")]
  Profile(#[from] ProfileError),

  #[error("value for {namespace}.{variable} cannot be embedded: it contains a quote or control character")]
  Unquotable { namespace: String, variable: String },
}

/// One `-X` substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkerFlag {
  pub namespace: String,
  pub variable: String,
  pub value: String,
}

impl LinkerFlag {
  /// Create a substitution, rejecting values that cannot sit inside single quotes.
  pub fn new(namespace: &str, variable: &str, value: impl Into<String>) -> Result<Self, AssembleError> {
    let value = value.into();
    if value.chars().any(|c| c == '\'' || c == '\n' || c == '\r' || c == '\0') {
      return Err(AssembleError::Unquotable {
        namespace: namespace.to_string(),
        variable: variable.to_string(),
      });
    }
    Ok(Self {
      namespace: namespace.to_string(),
      variable: variable.to_string(),
      value,
    })
  }
}

impl fmt::Display for LinkerFlag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "-X '{}.{}={}'", self.namespace, self.variable, self.value)
  }
}

/// Ordered `-X` substitutions destined for a single `-ldflags` argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkerFlagSet {
  flags: Vec<LinkerFlag>,
}

impl LinkerFlagSet {
  pub fn new() -> Self {
    Self { flags: Vec::new() }
  }

  pub fn push(&mut self, flag: LinkerFlag) {
    self.flags.push(flag);
  }

  pub fn flags(&self) -> &[LinkerFlag] {
    &self.flags
  }

  pub fn len(&self) -> usize {
    self.flags.len()
  }

  pub fn is_empty(&self) -> bool {
    self.flags.is_empty()
  }

  /// Value bound to `namespace.variable`, if present.
  pub fn get(&self, namespace: &str, variable: &str) -> Option<&str> {
    self
      .flags
      .iter()
      .find(|f| f.namespace == namespace && f.variable == variable)
      .map(|f| f.value.as_str())
  }

  /// Serialize to the `-ldflags` argument value.
  ///
  /// Always starts with [`STRIP_FLAGS`] and ends with [`BUILD_ID_FLAG`].
  pub fn render(&self) -> String {
    let mut out = String::from(STRIP_FLAGS);
    for flag in &self.flags {
      out.push(' ');
      out.push_str(&flag.to_string());
    }
    out.push(' ');
    out.push_str(BUILD_ID_FLAG);
    out
  }
}

impl fmt::Display for LinkerFlagSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.render())
  }
}
