use super::{LanguageBackend, Manifest};
use crate::config::PackageRef;
use crate::runner::CommandSpec;
use std::path::Path;

const WORKSPACE_PLACEHOLDER: &str = "{workspace}";

/// Renders one manifest line per package from `entry`, which may contain
/// `{name}` and `{version}`.
#[derive(Debug, Clone)]
pub struct ManifestTemplate {
    pub filename: String,
    pub entry: String,
}

/// Backend assembled from argv templates.
///
/// Every `{workspace}` in an argument is replaced with the workspace path,
/// and both commands run with the workspace as their working directory.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    name: String,
    source_filename: String,
    manifest: Option<ManifestTemplate>,
    compile: Vec<String>,
    run: Vec<String>,
}

impl CommandBackend {
    /// `compile` and `run` must each hold at least the program name.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        source_filename: impl Into<String>,
        compile: impl IntoIterator<Item = S>,
        run: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            source_filename: source_filename.into(),
            manifest: None,
            compile: compile.into_iter().map(Into::into).collect(),
            run: run.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_manifest(mut self, template: ManifestTemplate) -> Self {
        self.manifest = Some(template);
        self
    }

    fn expand(argv: &[String], workspace: &Path) -> CommandSpec {
        let ws = workspace.display().to_string();
        let mut argv = argv.iter().map(|arg| arg.replace(WORKSPACE_PLACEHOLDER, &ws));
        let program = argv.next().unwrap_or_default();
        CommandSpec::new(program).args(argv).current_dir(workspace)
    }
}

impl LanguageBackend for CommandBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn manifest(&self, packages: &[PackageRef]) -> Option<Manifest> {
        let template = self.manifest.as_ref()?;
        let contents = packages
            .iter()
            .map(|p| {
                template
                    .entry
                    .replace("{name}", &p.name)
                    .replace("{version}", &p.version)
            })
            .collect::<Vec<_>>()
            .join("\n");
        Some(Manifest {
            filename: template.filename.clone(),
            contents,
        })
    }

    fn source_filename(&self) -> &str {
        &self.source_filename
    }

    fn compile_command(&self, workspace: &Path) -> CommandSpec {
        Self::expand(&self.compile, workspace)
    }

    fn run_command(&self, workspace: &Path) -> CommandSpec {
        Self::expand(&self.run, workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_packages;

    #[test]
    fn expands_workspace_placeholder() {
        let backend = CommandBackend::new(
            "c",
            "main.c",
            ["cc", "-o", "{workspace}/app", "main.c"],
            ["{workspace}/app"],
        );
        let ws = Path::new("/tmp/ws");
        let compile = backend.compile_command(ws);
        assert_eq!(compile.program, "cc");
        assert_eq!(compile.args, vec!["-o", "/tmp/ws/app", "main.c"]);
        assert_eq!(compile.cwd.as_deref(), Some(ws));
        assert_eq!(backend.run_command(ws).program, "/tmp/ws/app");
    }

    #[test]
    fn renders_manifest_lines() {
        let backend = CommandBackend::new("py", "main.py", ["true"], ["python3", "main.py"])
            .with_manifest(ManifestTemplate {
                filename: "requirements.txt".into(),
                entry: "{name}=={version}".into(),
            });
        let manifest = backend
            .manifest(&parse_packages("requests:2.31.0,broken,numpy:1.26.0"))
            .unwrap();
        assert_eq!(manifest.filename, "requirements.txt");
        assert_eq!(manifest.contents, "requests==2.31.0\nnumpy==1.26.0");
    }

    #[test]
    fn no_manifest_without_template() {
        let backend = CommandBackend::new("sh", "main.sh", ["sh", "-n", "main.sh"], ["sh", "main.sh"]);
        assert!(backend.manifest(&parse_packages("a:1")).is_none());
    }
}
