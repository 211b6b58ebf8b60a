//! Required environment variables with optional defaults.

use std::collections::HashMap;

/// A required environment variable could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvError {
    #[error("Environment variable {0} is missing")]
    Missing(String),
}

/// Resolved values of a set of required environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    values: HashMap<String, String>,
}

impl EnvVars {
    /// Returns the value resolved for `key`, if it was requested.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the value resolved for `key`, failing if it was not requested.
    pub fn require(&self, key: &str) -> Result<&str, EnvError> {
        self.get(key).ok_or_else(|| EnvError::Missing(key.to_owned()))
    }

    /// Number of resolved variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variables were requested.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the set, returning the key/value map.
    pub fn into_inner(self) -> HashMap<String, String> {
        self.values
    }
}

/// Resolves every key from the process environment, falling back to
/// `defaults` for keys that are not set.
///
/// Fails on the first key, in input order, that resolves to nothing or to
/// an empty string. A variable that is set always wins over its default,
/// including when it is set to the empty string.
pub fn environment_variables<I, K>(keys: I, defaults: &[(&str, &str)]) -> Result<EnvVars, EnvError>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    environment_variables_with(keys, defaults, |key| std::env::var(key).ok())
}

/// Like [`environment_variables`], reading values through `lookup` instead
/// of the process environment.
pub fn environment_variables_with<I, K, F>(
    keys: I,
    defaults: &[(&str, &str)],
    lookup: F,
) -> Result<EnvVars, EnvError>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
    F: Fn(&str) -> Option<String>,
{
    let mut values = HashMap::new();
    for key in keys {
        let key = key.as_ref();
        let value = lookup(key)
            .or_else(|| default_for(defaults, key).map(str::to_owned))
            .unwrap_or_default();

        if value.is_empty() {
            return Err(EnvError::Missing(key.to_owned()));
        }
        values.insert(key.to_owned(), value);
    }
    Ok(EnvVars { values })
}

fn default_for<'a>(defaults: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    defaults
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_owned())
        }
    }

    #[test]
    fn resolves_set_variables() {
        let env = environment_variables_with(
            ["NODE_ENV", "PORT"],
            &[],
            lookup(&[("NODE_ENV", "development"), ("PORT", "3000")]),
        )
        .unwrap();

        assert_eq!(env.get("NODE_ENV"), Some("development"));
        assert_eq!(env.get("PORT"), Some("3000"));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn reports_first_missing_key() {
        let err = environment_variables_with(["NODE_ENV", "PORT"], &[], lookup(&[])).unwrap_err();
        assert_eq!(err, EnvError::Missing("NODE_ENV".into()));
        assert_eq!(err.to_string(), "Environment variable NODE_ENV is missing");
    }

    #[test]
    fn falls_back_to_default() {
        let env =
            environment_variables_with(["DB_PORT"], &[("DB_PORT", "5432")], lookup(&[])).unwrap();
        assert_eq!(env.get("DB_PORT"), Some("5432"));
    }

    #[test]
    fn set_variable_wins_over_default() {
        let env = environment_variables_with(
            ["DB_PORT"],
            &[("DB_PORT", "5432")],
            lookup(&[("DB_PORT", "3000")]),
        )
        .unwrap();
        assert_eq!(env.get("DB_PORT"), Some("3000"));
    }

    #[test]
    fn empty_value_is_missing() {
        let err = environment_variables_with(
            ["DB_HOST"],
            &[("DB_HOST", "localhost")],
            lookup(&[("DB_HOST", "")]),
        )
        .unwrap_err();
        assert_eq!(err, EnvError::Missing("DB_HOST".into()));
    }

    #[test]
    fn require_rejects_unrequested_key() {
        let env = environment_variables_with(["A"], &[], lookup(&[("A", "1")])).unwrap();
        assert_eq!(env.require("A"), Ok("1"));
        assert!(env.require("B").is_err());
    }

    #[test]
    fn reads_process_environment() {
        // PATH is set in every environment the tests run in.
        let env = environment_variables(["PATH"], &[]).unwrap();
        assert!(!env.require("PATH").unwrap().is_empty());
    }
}
