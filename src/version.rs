// Build-time version from Cargo.toml

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// "name/version" identifier for outbound HTTP requests.
pub fn user_agent() -> String {
    format!("{NAME}/{VERSION}")
}
