//! Reading embedded values back out of a rendered `-ldflags` string.

/// Return the value bound to `namespace.variable` in a rendered flag string.
///
/// Looks for the directive `-X 'namespace.variable=` and returns the text up
/// to the closing quote. A missing directive and an empty value both yield
/// an empty string.
pub fn extract(flags: &str, namespace: &str, variable: &str) -> String {
  let needle = format!("-X '{namespace}.{variable}=");
  let Some(start) = flags.find(&needle) else {
    return String::new();
  };

  let rest = &flags[start + needle.len()..];
  match rest.find('\'') {
    Some(end) => rest[..end].to_string(),
    None => String::new(),
  }
}
