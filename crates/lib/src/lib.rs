//! forge-lib: payload build and configuration-embedding pipeline
//!
//! This crate provides the pieces used to turn a build request into a
//! cross-compiled agent binary:
//! - `ldflags`: link-time constant embedding (assembly and inspection)
//! - `codec`: reversible XOR + base64 literal obfuscation
//! - `plan`: toolchain command planning for a target platform and build mode
//! - `padding`: optional binary inflation of the agent source tree
//! - `execute`: child-process execution with step progress reporting
//! - `artifact`: retrieval of the produced binary
//! - `pipeline`: the end-to-end build driver

pub mod artifact;
pub mod codec;
pub mod config;
pub mod consts;
pub mod execute;
pub mod ldflags;
pub mod padding;
pub mod pe;
pub mod pipeline;
pub mod plan;
pub mod platform;
pub mod profile;
pub mod progress;
pub mod request;

#[cfg(test)]
pub mod testutil;

pub use config::BuilderConfig;
pub use pipeline::{BuildError, BuildResult, Builder};
pub use request::BuildRequest;
