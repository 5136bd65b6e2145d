// ─── Condition Evaluator ───
// Decides whether a conditional resource is needed on this machine.

mod validator;

use std::collections::HashMap;

use tracing::debug;

pub use validator::{ConditionValidator, PropertyContainsValidator};

use crate::core::error::LauncherResult;
use crate::core::resource::Conditional;

pub const OS_NAME_PROPERTY: &str = "os.name";
pub const OS_ARCH_PROPERTY: &str = "os.arch";
pub const CPU_ARCHITECTURE_PROPERTY: &str = "cpu.architecture";

/// Immutable snapshot of environment properties, captured once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentContext {
    properties: HashMap<String, String>,
}

impl EnvironmentContext {
    pub fn new<I, K, V>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Snapshot of the running platform.
    pub fn host() -> Self {
        Self::new([
            (OS_NAME_PROPERTY, platform::os_name()),
            (OS_ARCH_PROPERTY, std::env::consts::ARCH),
            (CPU_ARCHITECTURE_PROPERTY, std::env::consts::ARCH),
        ])
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }
}

mod platform {
    pub fn os_name() -> &'static str {
        match std::env::consts::OS {
            "windows" => "Windows",
            "macos" => "Mac OS X",
            "linux" => "Linux",
            "freebsd" => "FreeBSD",
            other => other,
        }
    }
}

/// Evaluates resources against a fixed environment and validator chain.
pub struct ConditionEvaluator {
    context: EnvironmentContext,
    validators: Vec<Box<dyn ConditionValidator>>,
}

impl ConditionEvaluator {
    pub fn new(context: EnvironmentContext, validators: Vec<Box<dyn ConditionValidator>>) -> Self {
        Self {
            context,
            validators,
        }
    }

    /// Registers the operating-system and CPU-architecture validators.
    pub fn with_default_validators(context: EnvironmentContext) -> Self {
        Self::new(
            context,
            vec![
                Box::new(PropertyContainsValidator::os_name()),
                Box::new(PropertyContainsValidator::cpu_architecture()),
            ],
        )
    }

    pub fn context(&self) -> &EnvironmentContext {
        &self.context
    }

    /// Empty conditions always apply. Otherwise every validator must agree;
    /// the first `false` short-circuits and a missing property is an error.
    pub fn is_applicable<R>(&self, resource: &R) -> LauncherResult<bool>
    where
        R: Conditional + ?Sized,
    {
        let conditions = resource.conditions();
        if conditions.is_empty() {
            return Ok(true);
        }
        for validator in &self.validators {
            if !validator.validate(&self.context, conditions)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Keeps the applicable resources, aborting on the first evaluation error.
    pub fn filter<R, I>(&self, resources: I) -> LauncherResult<Vec<R>>
    where
        R: Conditional,
        I: IntoIterator<Item = R>,
    {
        let mut applicable = Vec::new();
        for resource in resources {
            if self.is_applicable(&resource)? {
                applicable.push(resource);
            } else {
                debug!("Skipping resource, conditions {:?} not met", resource.conditions());
            }
        }
        Ok(applicable)
    }
}
