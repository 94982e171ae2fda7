use anyhow::{Context, Result, bail};

use forge_lib::codec::{self, ObfuscationKey};
use forge_lib::ldflags::extract;

/// Print the value bound to `namespace.var` in `flags`, optionally decoded.
pub fn cmd_extract(flags: &str, namespace: &str, var: &str, key_from: Option<&str>) -> Result<()> {
  let value = extract(flags, namespace, var);
  if value.is_empty() {
    bail!("No value for {}.{}", namespace, var);
  }

  let value = match key_from {
    Some(payload_id) => {
      let key = ObfuscationKey::derive(payload_id);
      codec::decode(&value, key.as_bytes()).with_context(|| format!("Failed to decode {}.{}", namespace, var))?
    }
    None => value,
  };

  println!("{}", value);
  Ok(())
}
