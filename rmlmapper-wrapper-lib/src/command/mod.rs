use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::ExecutionOptions;
use crate::workspace::Workspace;

/// A fully resolved engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Assembles `java <vm flags> -jar <engine> ...` invocations.
#[derive(Debug, Clone)]
pub struct CommandBuilder<'a> {
    java_path: &'a Path,
    engine_path: &'a Path,
    default_vm_options: &'a BTreeMap<String, String>,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(
        java_path: &'a Path,
        engine_path: &'a Path,
        default_vm_options: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            java_path,
            engine_path,
            default_vm_options,
        }
    }

    pub fn build(&self, workspace: &Workspace, options: &ExecutionOptions) -> CommandSpec {
        let mut args: Vec<String> =
            merge_vm_options(self.default_vm_options, &options.vm_options)
                .iter()
                .map(|(key, value)| vm_flag(key, value))
                .collect();

        args.push("-jar".into());
        args.push(path_arg(self.engine_path));
        args.push("-m".into());
        args.push(path_arg(workspace.mapping_file()));

        let serialization = options.effective_serialization();
        args.push("-o".into());
        args.push(path_arg(&workspace.output_file(serialization)));

        if options.generate_metadata {
            args.push("-e".into());
            args.push(path_arg(&workspace.metadata_file(serialization)));
            args.push("-l".into());
            args.push(options.metadata_detail_level.as_str().into());
        }

        // Absent means the engine default, which is what the collector assumes.
        if let Some(serialization) = options.serialization {
            args.push("-s".into());
            args.push(serialization.as_str().into());
        }

        CommandSpec {
            program: self.java_path.to_path_buf(),
            args,
            working_dir: workspace.dir().to_path_buf(),
        }
    }
}

/// Wrapper defaults first, then per-call overrides; later values win.
pub fn merge_vm_options(
    defaults: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = defaults.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Render one VM option. Keys that already carry a leading `-` are kept
/// as-is, everything else becomes a `-D` system property.
pub fn vm_flag(key: &str, value: &str) -> String {
    let flag = if key.starts_with('-') {
        key.to_string()
    } else {
        if let Some(property) = stray_property_prefix(key) {
            tracing::warn!(
                "VM option '{key}' renders as -D{key}; use '{property}' or '-D{property}' to set {property}"
            );
        }
        format!("-D{}", key)
    };
    if value.is_empty() {
        flag
    } else {
        format!("{}={}", flag, value)
    }
}

/// The property name of a key written as `Dname.with.dots`, which looks like
/// a `-D` flag missing its dash.
fn stray_property_prefix(key: &str) -> Option<&str> {
    let property = key.strip_prefix('D')?;
    if property.starts_with(|c: char| c.is_ascii_lowercase()) && property.contains('.') {
        Some(property)
    } else {
        None
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
