// ─── Argument Preprocessor ───
// Substitutes `${name}` style variables in launch arguments.

use std::collections::HashMap;

use regex::{Captures, Regex};

use crate::core::error::{LauncherError, LauncherResult};

pub const DEFAULT_VARIABLE_PATTERN: &str = r"\$\{([^}]+)\}";

/// Replaces every match of a pattern whose first capture group names a known
/// variable. Unknown variables are left as written.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    pattern: Regex,
    variables: HashMap<String, String>,
}

impl Preprocessor {
    /// Uses [`DEFAULT_VARIABLE_PATTERN`].
    pub fn new() -> LauncherResult<Self> {
        Self::with_pattern(DEFAULT_VARIABLE_PATTERN)
    }

    /// `pattern` must have at least one capture group holding the name.
    pub fn with_pattern(pattern: &str) -> LauncherResult<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| LauncherError::config("variable_pattern", e.to_string()))?;
        if pattern.captures_len() < 2 {
            return Err(LauncherError::config(
                "variable_pattern",
                "must have a capture group for the variable name",
            ));
        }
        Ok(Self {
            pattern,
            variables: HashMap::new(),
        })
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl ToString) {
        self.variables.insert(name.into(), value.to_string());
    }

    pub fn set_variables<I, K, V>(&mut self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (name, value) in variables {
            self.set_variable(name, value);
        }
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn preprocess(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, |caps: &Captures<'_>| {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                caps.get(1)
                    .and_then(|name| self.value(name.as_str()))
                    .unwrap_or(whole)
                    .to_string()
            })
            .into_owned()
    }

    pub fn preprocess_all<S: AsRef<str>>(&self, inputs: &[S]) -> Vec<String> {
        inputs.iter().map(|s| self.preprocess(s.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_and_keeps_unknown() {
        let mut pre = Preprocessor::new().unwrap();
        pre.set_variable("user_name", "Steve");
        assert_eq!(
            pre.preprocess("--username ${user_name} --token ${session_id} end"),
            "--username Steve --token ${session_id} end"
        );
    }

    #[test]
    fn replacement_text_is_literal() {
        let mut pre = Preprocessor::new().unwrap();
        pre.set_variable("dir", "C:\\Games\\$1");
        assert_eq!(pre.preprocess("-Dpath=${dir}"), "-Dpath=C:\\Games\\$1");
    }

    #[test]
    fn processes_lists_in_order() {
        let mut pre = Preprocessor::new().unwrap();
        pre.set_variables([("a", 1), ("b", 2)]);
        assert_eq!(pre.preprocess_all(&["${a}", "${b}", "c"]), ["1", "2", "c"]);
        pre.clear_variables();
        assert_eq!(pre.variables().count(), 0);
    }

    #[test]
    fn custom_pattern_needs_a_group() {
        assert!(Preprocessor::with_pattern(r"%\w+%").is_err());
        let mut pre = Preprocessor::with_pattern(r"%(\w+)%").unwrap();
        pre.set_variable("HOME", "/home/steve");
        assert_eq!(pre.preprocess("%HOME%/x"), "/home/steve/x");
    }
}
