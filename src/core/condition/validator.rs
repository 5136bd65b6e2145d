use std::collections::BTreeMap;

use super::{EnvironmentContext, CPU_ARCHITECTURE_PROPERTY, OS_NAME_PROPERTY};
use crate::core::error::{LauncherError, LauncherResult};

/// One independent check in the evaluator chain.
///
/// Returns `Ok(true)` when the check passes or does not apply.
pub trait ConditionValidator: Send + Sync {
    fn validate(
        &self,
        context: &EnvironmentContext,
        conditions: &BTreeMap<String, String>,
    ) -> LauncherResult<bool>;
}

/// Passes when an environment property contains the value of one
/// designated condition key.
#[derive(Debug, Clone)]
pub struct PropertyContainsValidator {
    condition_key: &'static str,
    property: &'static str,
}

impl PropertyContainsValidator {
    pub const fn new(condition_key: &'static str, property: &'static str) -> Self {
        Self {
            condition_key,
            property,
        }
    }

    /// `os.name.contains` against `os.name`.
    pub const fn os_name() -> Self {
        Self::new("os.name.contains", OS_NAME_PROPERTY)
    }

    /// `cpu.architecture.contains` against `cpu.architecture`.
    pub const fn cpu_architecture() -> Self {
        Self::new("cpu.architecture.contains", CPU_ARCHITECTURE_PROPERTY)
    }
}

impl ConditionValidator for PropertyContainsValidator {
    fn validate(
        &self,
        context: &EnvironmentContext,
        conditions: &BTreeMap<String, String>,
    ) -> LauncherResult<bool> {
        let expected = match conditions.get(self.condition_key) {
            Some(value) if !value.trim().is_empty() => value,
            _ => return Ok(true),
        };

        let actual = context
            .property(self.property)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| LauncherError::NoSuchProperty {
                property: self.property.to_string(),
            })?;

        Ok(actual.contains(expected.as_str()))
    }
}
