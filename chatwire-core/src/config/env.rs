//! Environment variable interpolation for configuration files

use super::error::ConfigError;
use regex::Regex;
use std::env;
use std::sync::OnceLock;

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Interpolate `${VAR}` references in a configuration string
///
/// Every referenced variable must be set; the first missing one is reported.
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(content.len());
    let mut last = 0;

    for cap in env_var_pattern().captures_iter(content) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let var_name = &cap[1];

        let value = env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound {
            var: var_name.to_string(),
        })?;

        result.push_str(&content[last..full_match.start()]);
        result.push_str(&value);
        last = full_match.end();
    }

    result.push_str(&content[last..]);
    Ok(result)
}

/// Whether a value still carries an uninterpolated `${VAR}` reference
pub fn has_placeholder(value: &str) -> bool {
    env_var_pattern().is_match(value)
}
