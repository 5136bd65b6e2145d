use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

/// What to run: entry point, classpath, runtime flags and program arguments.
///
/// An empty classpath is accepted here and rejected at launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LaunchConfigurationDecl")]
pub struct ApplicationLaunchConfiguration {
    main_class: String,
    classpath_entries: Vec<PathBuf>,
    application_arguments: Vec<String>,
    jvm_arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    working_directory: Option<PathBuf>,
}

#[derive(Deserialize)]
struct LaunchConfigurationDecl {
    main_class: Option<String>,
    #[serde(default)]
    classpath_entries: Vec<PathBuf>,
    #[serde(default)]
    application_arguments: Vec<String>,
    #[serde(default)]
    jvm_arguments: Vec<String>,
    #[serde(default)]
    working_directory: Option<PathBuf>,
}

impl TryFrom<LaunchConfigurationDecl> for ApplicationLaunchConfiguration {
    type Error = LauncherError;

    fn try_from(decl: LaunchConfigurationDecl) -> LauncherResult<Self> {
        let main_class = decl
            .main_class
            .ok_or_else(|| LauncherError::config("main_class", "must be set"))?;
        let mut config = Self::new(main_class, decl.classpath_entries)?
            .with_application_arguments(decl.application_arguments)
            .with_jvm_arguments(decl.jvm_arguments);
        config.working_directory = decl.working_directory;
        Ok(config)
    }
}

impl ApplicationLaunchConfiguration {
    pub fn new(
        main_class: impl Into<String>,
        classpath_entries: impl IntoIterator<Item = PathBuf>,
    ) -> LauncherResult<Self> {
        let main_class = main_class.into();
        if main_class.trim().is_empty() {
            return Err(LauncherError::config("main_class", "must not be empty"));
        }
        Ok(Self {
            main_class,
            classpath_entries: classpath_entries.into_iter().collect(),
            application_arguments: Vec::new(),
            jvm_arguments: Vec::new(),
            working_directory: None,
        })
    }

    pub fn with_application_arguments(mut self, arguments: impl IntoIterator<Item = String>) -> Self {
        self.application_arguments = arguments.into_iter().collect();
        self
    }

    pub fn with_jvm_arguments(mut self, arguments: impl IntoIterator<Item = String>) -> Self {
        self.jvm_arguments = arguments.into_iter().collect();
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn main_class(&self) -> &str {
        &self.main_class
    }

    pub fn classpath_entries(&self) -> &[PathBuf] {
        &self.classpath_entries
    }

    pub fn application_arguments(&self) -> &[String] {
        &self.application_arguments
    }

    pub fn jvm_arguments(&self) -> &[String] {
        &self.jvm_arguments
    }

    pub fn working_directory(&self) -> Option<&PathBuf> {
        self.working_directory.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_main_class_is_rejected() {
        assert!(ApplicationLaunchConfiguration::new("  ", Vec::new()).is_err());
        assert!(ApplicationLaunchConfiguration::new("net.example.Main", Vec::new()).is_ok());
    }

    #[test]
    fn deserializes_with_optional_lists() {
        let config: ApplicationLaunchConfiguration = serde_json::from_str(
            r#"{ "main_class": "net.example.Main", "classpath_entries": ["libs/a.jar"] }"#,
        )
        .unwrap();
        assert_eq!(config.classpath_entries(), [PathBuf::from("libs/a.jar")]);
        assert!(config.jvm_arguments().is_empty());
        assert!(config.application_arguments().is_empty());
    }

    #[test]
    fn missing_main_class_is_a_configuration_error() {
        let err = serde_json::from_str::<ApplicationLaunchConfiguration>(r#"{}"#).unwrap_err();
        assert!(err.to_string().contains("main_class"));
    }

    #[test]
    fn serializes_snake_case_fields() {
        let config = ApplicationLaunchConfiguration::new("Main", vec![PathBuf::from("a.jar")])
            .unwrap()
            .with_jvm_arguments(vec!["-Xmx2G".to_string()]);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["main_class"], "Main");
        assert_eq!(json["jvm_arguments"][0], "-Xmx2G");
        assert!(json.get("working_directory").is_none());
    }
}
