pub mod app;
pub mod core;
pub mod github;
pub mod patterns;
pub mod registry;
pub mod scanner;
pub mod store;
pub mod tools;

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Human-readable version line for the CLI banner and logs
pub fn version_string() -> String {
    format!(
        "{} {} ({}, built {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        GIT_HASH,
        BUILD_TIME
    )
}
