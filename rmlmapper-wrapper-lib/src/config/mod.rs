use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::wrapper::RmlMapperWrapper;
use crate::ExecutionError;

fn default_java_path() -> PathBuf {
    PathBuf::from("java")
}

fn default_true() -> bool {
    true
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
}

/// Construction-time configuration, immutable once a wrapper is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WrapperConfig {
    /// Path to the RMLMapper jar.
    pub engine_path: PathBuf,
    /// Directory under which per-execution workspaces are created.
    pub temp_root: PathBuf,
    #[serde(default = "default_true")]
    pub delete_temp_after_run: bool,
    #[serde(default)]
    pub vm_options: BTreeMap<String, String>,
    #[serde(default = "default_java_path")]
    pub java_path: PathBuf,
    #[serde(
        default,
        rename = "timeoutSecs",
        deserialize_with = "deserialize_timeout"
    )]
    pub timeout: Option<Duration>,
}

impl WrapperConfig {
    pub fn new(engine_path: impl Into<PathBuf>, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            temp_root: temp_root.into(),
            delete_temp_after_run: true,
            vm_options: BTreeMap::new(),
            java_path: default_java_path(),
            timeout: None,
        }
    }

    /// Load a configuration file. Comments (`//`, `/* */`) are allowed.
    pub fn from_file<P: Into<PathBuf>>(path: P) -> Result<Self, ExecutionError> {
        let path = path.into();
        tracing::info!("Loading wrapper configuration from {:?}", path);
        let file =
            std::fs::File::open(&path).map_err(|e| ExecutionError::filesystem(&path, e))?;
        let stripped = json_comments::StripComments::new(file);
        let config: WrapperConfig = serde_json::from_reader(stripped).map_err(|e| {
            ExecutionError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ExecutionError> {
        if self.engine_path.as_os_str().is_empty() {
            return Err(ExecutionError::Config("enginePath must not be empty".into()));
        }
        if self.temp_root.as_os_str().is_empty() {
            return Err(ExecutionError::Config("tempRoot must not be empty".into()));
        }
        if self.java_path.as_os_str().is_empty() {
            return Err(ExecutionError::Config("javaPath must not be empty".into()));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ExecutionError::Config(
                "timeoutSecs must be greater than zero".into(),
            ));
        }
        if self.vm_options.keys().any(|key| key.trim().is_empty()) {
            return Err(ExecutionError::Config("VM option keys must not be empty".into()));
        }
        Ok(())
    }
}

/// Fluent construction of an [`RmlMapperWrapper`].
#[derive(Debug, Clone)]
pub struct WrapperBuilder {
    config: WrapperConfig,
}

impl WrapperBuilder {
    pub fn new(engine_path: impl Into<PathBuf>, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            config: WrapperConfig::new(engine_path, temp_root),
        }
    }

    pub fn delete_temp_after_run(mut self, delete: bool) -> Self {
        self.config.delete_temp_after_run = delete;
        self
    }

    pub fn vm_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.vm_options.insert(key.into(), value.into());
        self
    }

    pub fn vm_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.config.vm_options.extend(options);
        self
    }

    pub fn java_path(mut self, java_path: impl Into<PathBuf>) -> Self {
        self.config.java_path = java_path.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<RmlMapperWrapper, ExecutionError> {
        RmlMapperWrapper::from_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_from_file_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrapper.jsonc");
        std::fs::write(
            &path,
            r#"{
  // engine jar
  "enginePath": "./rmlmapper.jar",
  "tempRoot": "./tmp",
  /* keep workspaces around while debugging */
  "deleteTempAfterRun": false,
  "vmOptions": { "file.encoding": "UTF-8" },
  "timeoutSecs": 30
}"#,
        )
        .unwrap();

        let config = WrapperConfig::from_file(&path).unwrap();
        assert_eq!(config.engine_path, PathBuf::from("./rmlmapper.jar"));
        assert!(!config.delete_temp_after_run);
        assert_eq!(config.vm_options["file.encoding"], "UTF-8");
        assert_eq!(config.java_path, PathBuf::from("java"));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_defaults_from_minimal_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrapper.json");
        std::fs::write(&path, r#"{"enginePath": "a.jar", "tempRoot": "tmp"}"#).unwrap();
        let config = WrapperConfig::from_file(&path).unwrap();
        assert!(config.delete_temp_after_run);
        assert!(config.vm_options.is_empty());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrapper.json");
        std::fs::write(
            &path,
            r#"{"enginePath": "a.jar", "tempRoot": "tmp", "tmpFolder": "x"}"#,
        )
        .unwrap();
        let err = WrapperConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_validate() {
        assert!(WrapperConfig::new("a.jar", "tmp").validate().is_ok());
        assert!(WrapperConfig::new("", "tmp").validate().is_err());
        assert!(WrapperConfig::new("a.jar", "").validate().is_err());

        let mut config = WrapperConfig::new("a.jar", "tmp");
        config.timeout = Some(Duration::ZERO);
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn test_builder() {
        let wrapper = WrapperBuilder::new("a.jar", "tmp")
            .delete_temp_after_run(false)
            .vm_option("file.encoding", "UTF-8")
            .java_path("/usr/bin/java")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let config = wrapper.config();
        assert!(!config.delete_temp_after_run);
        assert_eq!(config.vm_options.len(), 1);
        assert_eq!(config.java_path, PathBuf::from("/usr/bin/java"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
