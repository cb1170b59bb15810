//! # Gradebook Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: Access token signing configuration
//! - [`cors`]: Allowed cross-origin callers
//! - [`database`]: Postgres connection settings
//! - [`server`]: Listen addresses and observability toggles
//!
//! Call `dotenvy::dotenv()` before loading so a local `.env` file is honored.

pub mod cors;
pub mod database;
pub mod jwt;
pub mod server;

pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;

/// Reads `key` and parses it, falling back to `default` when unset or invalid.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Interprets common truthy/falsy spellings; anything else yields `default`.
pub(crate) fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("TRUE"), false));
        assert!(parse_flag(Some("1"), false));
        assert!(!parse_flag(Some("false"), true));
        assert!(!parse_flag(Some("0"), true));
        assert!(parse_flag(Some("maybe"), true));
        assert!(!parse_flag(None, false));
    }
}
