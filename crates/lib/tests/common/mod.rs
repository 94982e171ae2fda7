//! Shared helpers for library integration tests.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use forge_lib::{BuildRequest, BuilderConfig};
use tempfile::TempDir;

/// Load a JSON request fixture.
pub fn fixture_request(name: &str) -> BuildRequest {
  let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name);
  let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e));
  serde_json::from_str(&text).unwrap()
}

/// Isolated build environment with a scripted stand-in for `go`.
///
/// The script records its arguments to `args.txt` in the agent directory and
/// writes a small artifact to the `-o` path.
pub struct TestEnv {
  pub temp: TempDir,
  pub tool: TempDir,
}

impl TestEnv {
  pub fn new(script_body: &str) -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("agent")).unwrap();

    let tool = TempDir::new().unwrap();
    let script = format!(
      "#!/bin/sh\nprintf '%s\\n' \"$@\" > args.txt\nout=\"\"\nwhile [ $# -gt 0 ]; do\n  \
       if [ \"$1\" = \"-o\" ]; then out=\"$2\"; fi\n  shift\ndone\n{}\n",
      script_body
    );
    let path = tool.path().join("go");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    Self { temp, tool }
  }

  /// Succeeds and writes `MZ` plus padding to the output path.
  pub fn working() -> Self {
    Self::new("echo \"go build $GOOS/$GOARCH CGO=$CGO_ENABLED\"\nprintf 'MZ\\220\\000' > \"$out\"")
  }

  pub fn config(&self) -> BuilderConfig {
    let program = self.tool.path().join("go").to_string_lossy().into_owned();
    BuilderConfig::default()
      .with_build_dir(self.temp.path().join("build"))
      .with_agent_dir(self.temp.path().join("agent"))
      .with_go_program(&program)
      .with_garble_program(&program)
  }

  pub fn recorded_args(&self) -> Vec<String> {
    std::fs::read_to_string(self.temp.path().join("agent").join("args.txt"))
      .map(|text| text.lines().map(str::to_string).collect())
      .unwrap_or_default()
  }
}
