pub const APP_NAME: &str = "forge";

/// Go package that receives the `-X` substitutions.
pub const MAIN_PACKAGE: &str = "main";

/// Deployment target baked into macOS artifact names.
pub const MACOS_VERSION: &str = "10.12";

/// Base name used when handing the artifact back to the orchestrator.
pub const ARTIFACT_BASENAME: &str = "agent";

pub const DEFAULT_BUILD_DIR: &str = "/build";
pub const DEFAULT_AGENT_DIR: &str = "./agent_code";
pub const DEFAULT_GO: &str = "go";
pub const DEFAULT_GARBLE: &str = "/go/bin/garble";

/// Toolchain invocations that run longer than this are killed.
pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 30 * 60;
