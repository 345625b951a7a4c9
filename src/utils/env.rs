/// Get environment variable with UMRAH_ prefix, falling back to unprefixed version
///
/// Checks `UMRAH_{key}` first, then `{key}`.
///
/// # Examples
///
/// ```rust,ignore
/// // Checks UMRAH_EXPIRY_WARNING_DAYS first, then EXPIRY_WARNING_DAYS
/// let days = get_env_with_prefix("EXPIRY_WARNING_DAYS");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("UMRAH_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Parse an environment variable, ignoring values that do not parse.
pub fn parse_env_with_prefix<T: std::str::FromStr>(key: &str) -> Option<T> {
    get_env_with_prefix(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        unsafe {
            std::env::set_var("UMRAH_ENV_TEST_VAR", "prefixed_value");
        }
        assert_eq!(get_env_with_prefix("ENV_TEST_VAR"), Some("prefixed_value".to_string()));
        unsafe {
            std::env::remove_var("UMRAH_ENV_TEST_VAR");
        }

        unsafe {
            std::env::set_var("ENV_FALLBACK_VAR", "unprefixed_value");
        }
        assert_eq!(get_env_with_prefix("ENV_FALLBACK_VAR"), Some("unprefixed_value".to_string()));
        unsafe {
            std::env::remove_var("ENV_FALLBACK_VAR");
        }

        assert_eq!(get_env_with_prefix("ENV_NON_EXISTENT_VAR"), None);
    }

    #[test]
    fn test_parse_env_with_prefix() {
        unsafe {
            std::env::set_var("UMRAH_ENV_PARSE_NUM", " 42 ");
            std::env::set_var("UMRAH_ENV_PARSE_BAD", "forty-two");
        }
        assert_eq!(parse_env_with_prefix::<u32>("ENV_PARSE_NUM"), Some(42));
        assert_eq!(parse_env_with_prefix::<u32>("ENV_PARSE_BAD"), None);
        unsafe {
            std::env::remove_var("UMRAH_ENV_PARSE_NUM");
            std::env::remove_var("UMRAH_ENV_PARSE_BAD");
        }
    }
}
