//! Transport profile parameters and their typed accessors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single profile parameter value as sent by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
  Null,
  Boolean(bool),
  Number(f64),
  String(String),
  List(Vec<ProfileValue>),
  Map(BTreeMap<String, ProfileValue>),
}

impl ProfileValue {
  pub fn kind(&self) -> &'static str {
    match self {
      ProfileValue::Null => "null",
      ProfileValue::Boolean(_) => "boolean",
      ProfileValue::Number(_) => "number",
      ProfileValue::String(_) => "string",
      ProfileValue::List(_) => "list",
      ProfileValue::Map(_) => "map",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
  #[error("profile parameter '{key}' is missing")]
  Missing { key: String },

  #[error("profile parameter '{key}' should be a {expected}, found {found}")]
  WrongType {
    key: String,
    expected: &'static str,
    found: &'static str,
  },
}

/// The transport configuration selected for a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportProfile {
  /// Profile name, also used as a build tag (e.g. "http").
  pub name: String,

  #[serde(default)]
  pub parameters: BTreeMap<String, ProfileValue>,
}

impl TransportProfile {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      parameters: BTreeMap::new(),
    }
  }

  pub fn with(mut self, key: &str, value: ProfileValue) -> Self {
    self.parameters.insert(key.to_string(), value);
    self
  }

  pub fn arg_names(&self) -> impl Iterator<Item = &str> {
    self.parameters.keys().map(String::as_str)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.parameters.contains_key(key)
  }

  fn get(&self, key: &str) -> Result<&ProfileValue, ProfileError> {
    self.parameters.get(key).ok_or_else(|| ProfileError::Missing { key: key.to_string() })
  }

  fn wrong_type(key: &str, expected: &'static str, found: &ProfileValue) -> ProfileError {
    ProfileError::WrongType {
      key: key.to_string(),
      expected,
      found: found.kind(),
    }
  }

  pub fn get_string(&self, key: &str) -> Result<&str, ProfileError> {
    match self.get(key)? {
      ProfileValue::String(s) => Ok(s),
      other => Err(Self::wrong_type(key, "string", other)),
    }
  }

  pub fn get_number(&self, key: &str) -> Result<f64, ProfileError> {
    match self.get(key)? {
      ProfileValue::Number(n) => Ok(*n),
      other => Err(Self::wrong_type(key, "number", other)),
    }
  }

  pub fn get_map(&self, key: &str) -> Result<&BTreeMap<String, ProfileValue>, ProfileError> {
    match self.get(key)? {
      ProfileValue::Map(map) => Ok(map),
      other => Err(Self::wrong_type(key, "map", other)),
    }
  }

  /// Read the encryption key out of a crypto parameter.
  ///
  /// Crypto parameters are maps carrying an `enc_key` entry. A null or
  /// absent `enc_key` means no encryption was chosen and reads as "".
  pub fn get_crypto_key(&self, key: &str) -> Result<String, ProfileError> {
    let map = match self.get(key)? {
      ProfileValue::Map(map) => map,
      other => return Err(Self::wrong_type(key, "crypto map", other)),
    };

    match map.get("enc_key") {
      None | Some(ProfileValue::Null) => Ok(String::new()),
      Some(ProfileValue::String(s)) => Ok(s.clone()),
      Some(other) => Err(Self::wrong_type(&format!("{key}.enc_key"), "string", other)),
    }
  }
}
