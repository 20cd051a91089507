//! Secure token manager with masking and end-of-run scrubbing
//!
//! Credentials are held as `secrecy::SecretString` for the whole run. The
//! manager knows how to mask them in text that is about to be logged, and
//! how to overwrite every credential variable with a redacted placeholder
//! once the run is over.

use crate::core::error::ReleaseError;
use crate::core::traits::ActionRuntime;
use aho_corasick::{AhoCorasick, MatchKind};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

/// Value written over every credential variable at run end
pub const REDACTED_PLACEHOLDER: &str = "XXXXX-XXXXX-XXXXX-XXXXX";

/// Variables overwritten at run end, success or failure
pub const SCRUBBED_VARIABLES: &[&str] = &[
    "NODE_AUTH_TOKEN",
    "GITHUB_TOKEN",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
];

const MASK: &str = "***";

/// Replaces known secret values in text
#[derive(Debug, Clone, Default)]
pub struct SecretMasker {
    matcher: Option<AhoCorasick>,
    pattern_count: usize,
}

impl SecretMasker {
    /// Build a masker for the given secret values; empty values are ignored
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = secrets
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if patterns.is_empty() {
            return Self::default();
        }

        let matcher = match AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
        {
            Ok(matcher) => Some(matcher),
            Err(e) => {
                warn!(error = %e, "could not build secret masker, output will not be masked");
                None
            }
        };

        Self {
            matcher,
            pattern_count: patterns.len(),
        }
    }

    /// Mask every occurrence of a known secret
    pub fn mask(&self, text: &str) -> String {
        match &self.matcher {
            Some(matcher) => {
                let replacements = vec![MASK; self.pattern_count];
                matcher.replace_all(text, &replacements)
            }
            None => text.to_string(),
        }
    }
}

/// Secure token manager for the credentials of a run
///
/// # Examples
///
/// ```
/// use release_deployer::security::SecureTokenManager;
/// use secrecy::SecretString;
///
/// let mut manager = SecureTokenManager::new();
/// manager.register("GITHUB_TOKEN", SecretString::from("ghs_abcdef123456".to_string()));
///
/// assert_eq!(manager.mask_secrets_in("token=ghs_abcdef123456"), "token=***");
/// ```
#[derive(Default)]
pub struct SecureTokenManager {
    credentials: Vec<(String, SecretString)>,
}

impl SecureTokenManager {
    /// Creates an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a credential under its variable name; empty values are ignored
    pub fn register(&mut self, name: &str, value: SecretString) {
        if value.expose_secret().is_empty() {
            return;
        }
        self.credentials.retain(|(n, _)| n != name);
        self.credentials.push((name.to_string(), value));
    }

    /// Retrieves a tracked credential by variable name
    pub fn get_token(&self, name: &str) -> Option<&SecretString> {
        self.credentials
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Masker over every tracked credential
    pub fn masker(&self) -> SecretMasker {
        SecretMasker::new(self.credentials.iter().map(|(_, v)| v.expose_secret()))
    }

    /// Masks all tracked credentials in a string
    pub fn mask_secrets_in(&self, text: &str) -> String {
        self.masker().mask(text)
    }

    /// Ask the runner to mask every tracked credential in job logs
    pub fn register_masks(&self, runtime: &mut dyn ActionRuntime) {
        for (_, value) in &self.credentials {
            runtime.add_mask(value.expose_secret());
        }
    }

    /// Overwrite every credential variable with [`REDACTED_PLACEHOLDER`].
    ///
    /// All variables are attempted even if one export fails; the first
    /// failure is returned.
    pub fn scrub(runtime: &mut dyn ActionRuntime) -> Result<(), ReleaseError> {
        let mut first_error = None;

        for name in SCRUBBED_VARIABLES {
            if let Err(e) = runtime.export_variable(name, REDACTED_PLACEHOLDER) {
                warn!(variable = name, error = %e, "failed to scrub credential variable");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapRuntime {
        vars: HashMap<String, String>,
        masks: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl ActionRuntime for MapRuntime {
        fn export_variable(&mut self, name: &str, value: &str) -> Result<(), ReleaseError> {
            if self.fail_on == Some(name) {
                return Err(ReleaseError::ConfigError("boom".to_string()));
            }
            self.vars.insert(name.to_string(), value.to_string());
            Ok(())
        }

        fn set_output(&mut self, _name: &str, _value: &str) -> Result<(), ReleaseError> {
            Ok(())
        }

        fn add_mask(&mut self, value: &str) {
            self.masks.push(value.to_string());
        }
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn test_register_and_get_token() {
        let mut manager = SecureTokenManager::new();
        manager.register("GITHUB_TOKEN", secret("ghs_token_value"));

        assert!(manager.get_token("GITHUB_TOKEN").is_some());
        assert!(manager.get_token("AWS_ACCESS_KEY_ID").is_none());
        assert_eq!(
            manager.get_token("GITHUB_TOKEN").unwrap().expose_secret(),
            "ghs_token_value"
        );
    }

    #[test]
    fn test_register_ignores_empty_values() {
        let mut manager = SecureTokenManager::new();
        manager.register("GITHUB_TOKEN", secret(""));

        assert!(manager.get_token("GITHUB_TOKEN").is_none());
    }

    #[test]
    fn test_register_replaces_existing_value() {
        let mut manager = SecureTokenManager::new();
        manager.register("GITHUB_TOKEN", secret("first-value"));
        manager.register("GITHUB_TOKEN", secret("second-value"));

        assert_eq!(
            manager.get_token("GITHUB_TOKEN").unwrap().expose_secret(),
            "second-value"
        );
    }

    #[test]
    fn test_mask_secrets_in_string() {
        let mut manager = SecureTokenManager::new();
        manager.register("AWS_ACCESS_KEY_ID", secret("AKIAEXAMPLEKEY"));
        manager.register("AWS_SECRET_ACCESS_KEY", secret("wJalrXUtnFEMI/K7MDENG"));

        let masked =
            manager.mask_secrets_in("key=AKIAEXAMPLEKEY secret=wJalrXUtnFEMI/K7MDENG done");

        assert_eq!(masked, "key=*** secret=*** done");
    }

    #[test]
    fn test_mask_secrets_without_credentials() {
        let manager = SecureTokenManager::new();
        let input = "This is a safe string with no tokens";
        assert_eq!(manager.mask_secrets_in(input), input);
    }

    #[test]
    fn test_masker_prefers_longest_secret() {
        let masker = SecretMasker::new(["abc", "abcdef"]);
        assert_eq!(masker.mask("xx abcdef yy"), "xx *** yy");
    }

    #[test]
    fn test_register_masks() {
        let mut manager = SecureTokenManager::new();
        manager.register("GITHUB_TOKEN", secret("ghs_token_value"));
        let mut runtime = MapRuntime::default();

        manager.register_masks(&mut runtime);

        assert_eq!(runtime.masks, vec!["ghs_token_value".to_string()]);
    }

    #[test]
    fn test_scrub_overwrites_all_variables() {
        let mut runtime = MapRuntime::default();

        SecureTokenManager::scrub(&mut runtime).unwrap();

        for name in SCRUBBED_VARIABLES {
            assert_eq!(runtime.vars.get(*name).unwrap(), REDACTED_PLACEHOLDER);
        }
    }

    #[test]
    fn test_scrub_continues_after_failure() {
        let mut runtime = MapRuntime {
            fail_on: Some("GITHUB_TOKEN"),
            ..Default::default()
        };

        let result = SecureTokenManager::scrub(&mut runtime);

        assert!(result.is_err());
        assert_eq!(
            runtime.vars.get("AWS_SECRET_ACCESS_KEY").unwrap(),
            REDACTED_PLACEHOLDER
        );
        assert!(!runtime.vars.contains_key("GITHUB_TOKEN"));
    }
}
