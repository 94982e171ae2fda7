//! Reversible literal obfuscation.
//!
//! Values embedded as link-time constants are XORed with a repeating key and
//! rendered as standard base64 so they survive `-X` quoting. This hides them
//! from naive string scanning of the artifact; it is not encryption.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::consts::APP_NAME;

#[derive(Debug, Error)]
pub enum CodecError {
  #[error("obfuscated value is not valid base64: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("decoded value is not valid UTF-8: {0}")]
  Utf8(#[from] std::string::FromUtf8Error),
}

/// Key material for the XOR stream.
#[derive(Clone, PartialEq, Eq)]
pub struct ObfuscationKey(Vec<u8>);

impl ObfuscationKey {
  pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
    Self(bytes.into())
  }

  /// Derive a 32-byte key from a payload identifier.
  ///
  /// The same identifier always yields the same key, so a plan can be
  /// re-rendered and its embedded values decoded later.
  pub fn derive(payload_id: &str) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(APP_NAME.as_bytes());
    hasher.update(b":");
    hasher.update(payload_id.as_bytes());
    Self(hasher.finalize().to_vec())
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  /// Base64 form embedded next to the obfuscated values.
  pub fn to_base64(&self) -> String {
    STANDARD.encode(&self.0)
  }
}

impl fmt::Debug for ObfuscationKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ObfuscationKey({} bytes)", self.0.len())
  }
}

fn xor_in_place(bytes: &mut [u8], key: &[u8]) {
  for (i, byte) in bytes.iter_mut().enumerate() {
    *byte ^= key[i % key.len()];
  }
}

/// XOR `plaintext` with `key` and render the result as base64.
///
/// An empty key returns the plaintext unchanged; an empty plaintext always
/// yields an empty string.
pub fn encode(plaintext: &str, key: &[u8]) -> String {
  if plaintext.is_empty() {
    return String::new();
  }
  if key.is_empty() {
    return plaintext.to_string();
  }

  let mut bytes = plaintext.as_bytes().to_vec();
  xor_in_place(&mut bytes, key);
  STANDARD.encode(bytes)
}

/// Inverse of [`encode`].
pub fn decode(text: &str, key: &[u8]) -> Result<String, CodecError> {
  if text.is_empty() {
    return Ok(String::new());
  }
  if key.is_empty() {
    return Ok(text.to_string());
  }

  let mut bytes = STANDARD.decode(text)?;
  xor_in_place(&mut bytes, key);
  Ok(String::from_utf8(bytes)?)
}
