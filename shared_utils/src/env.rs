/// Reads an environment variable, falling back to `default` when unset.
///
/// Connection parameters and data directories are overridable this way
/// without making the variables mandatory.
pub fn env_var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_applies_when_unset() {
        let v = env_var_or("REVIEW_PIPELINE_DOES_NOT_EXIST", "fallback");
        assert_eq!(v, "fallback");
    }

    #[test]
    fn set_variable_wins_over_the_default() {
        // PATH is always present in the test environment.
        let v = env_var_or("PATH", "fallback");
        assert_ne!(v, "fallback");
    }
}
