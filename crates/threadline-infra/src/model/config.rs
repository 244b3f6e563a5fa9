//! Provider configuration and API key resolution.

use secrecy::SecretString;

/// Configuration for an OpenAI-compatible chat-model provider.
pub struct ProviderConfig {
    /// Human-readable provider name (e.g., "groq").
    pub provider_name: String,
    /// Base URL for the API.
    pub base_url: String,
    /// API key for authentication.
    pub api_key: SecretString,
    /// Default model identifier.
    pub model: String,
}

/// Groq default configuration.
///
/// Groq serves an OpenAI-compatible chat completions endpoint at
/// `https://api.groq.com/openai/v1`.
pub fn groq_defaults(api_key: SecretString, model: &str) -> ProviderConfig {
    ProviderConfig {
        provider_name: "groq".into(),
        base_url: "https://api.groq.com/openai/v1".into(),
        api_key,
        model: model.into(),
    }
}

/// Read an API key from the named environment variable.
///
/// Returns `None` when the variable is unset; a set-but-non-unicode
/// value is treated as unset since keys must be valid strings.
pub fn api_key_from_env(var: &str) -> Option<SecretString> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_defaults() {
        let config = groq_defaults(SecretString::from("gsk-test"), "llama-3.1-8b-instant");
        assert_eq!(config.provider_name, "groq");
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.model, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_api_key_from_env_missing() {
        assert!(api_key_from_env("THREADLINE_TEST_NO_SUCH_VAR").is_none());
    }

    #[test]
    fn test_api_key_from_env_present() {
        // SAFETY: test-local variable, removed before the test returns.
        unsafe { std::env::set_var("THREADLINE_TEST_KEY_1", "gsk-value") };
        let key = api_key_from_env("THREADLINE_TEST_KEY_1");
        assert!(key.is_some());
        unsafe { std::env::remove_var("THREADLINE_TEST_KEY_1") };
    }
}
