//! Per-language description of how a workspace is built and run.
//!
//! The orchestrator only talks to [`LanguageBackend`]; everything that differs
//! between toolchains lives behind it.

use crate::config::{Config, Language, PackageRef};
use crate::runner::CommandSpec;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

mod command;
mod dotnet;
mod jvm;

pub use command::{CommandBackend, ManifestTemplate};
pub use dotnet::Dotnet;
pub use jvm::{Java, Kotlin};

/// A build manifest to write next to the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub filename: String,
    pub contents: String,
}

pub trait LanguageBackend: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Project file for the given extra packages, if the toolchain needs one.
    fn manifest(&self, packages: &[PackageRef]) -> Option<Manifest>;

    /// File the submitted code is written to, verbatim.
    fn source_filename(&self) -> &str;

    fn compile_command(&self, workspace: &Path) -> CommandSpec;

    fn run_command(&self, workspace: &Path) -> CommandSpec;
}

/// Build the backend selected by `config.language`.
pub fn for_language(config: &Config) -> Arc<dyn LanguageBackend> {
    match config.language {
        Language::Dotnet => Arc::new(Dotnet),
        Language::Kotlin => Arc::new(Kotlin::new(jvm::classpath_from_dir(&config.deps_dir))),
        Language::Java => Arc::new(Java::new(jvm::classpath_from_dir(&config.deps_dir))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_backend_by_language() {
        let mut config = Config::default();
        assert_eq!(for_language(&config).name(), "dotnet");
        config.language = Language::Kotlin;
        assert_eq!(for_language(&config).name(), "kotlin");
        config.language = Language::Java;
        assert_eq!(for_language(&config).name(), "java");
    }
}
