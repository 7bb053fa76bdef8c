//! Kotlin and Java. Both compile straight to a classes directory and resolve
//! extra libraries from a directory of pre-fetched jars.

use super::{LanguageBackend, Manifest};
use crate::config::PackageRef;
use crate::runner::CommandSpec;
use std::path::Path;
use tracing::{debug, warn};

const CLASSES_DIR: &str = "classes";

#[cfg(unix)]
const PATH_SEPARATOR: &str = ":";
#[cfg(not(unix))]
const PATH_SEPARATOR: &str = ";";

/// Absolute paths of every `*.jar` in `dir`, sorted and joined with the
/// platform path separator. A missing directory yields an empty classpath.
pub fn classpath_from_dir(dir: &Path) -> String {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = ?dir, error = %e, "Dependency directory unavailable, using empty classpath");
            return String::new();
        }
    };

    let mut jars: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jar"))
        .map(|path| {
            std::fs::canonicalize(&path)
                .unwrap_or(path)
                .display()
                .to_string()
        })
        .collect();
    jars.sort();
    debug!(count = jars.len(), "Resolved classpath jars");
    jars.join(PATH_SEPARATOR)
}

fn classes_dir(workspace: &Path) -> String {
    workspace.join(CLASSES_DIR).display().to_string()
}

fn runtime_classpath(workspace: &Path, deps: &str) -> String {
    if deps.is_empty() {
        classes_dir(workspace)
    } else {
        format!("{}{}{}", classes_dir(workspace), PATH_SEPARATOR, deps)
    }
}

/// Fully qualified name of `class` given the `package` header of `source`.
///
/// Only leading blank lines, comments and annotations may precede the
/// header. An unreadable source or no header gives the bare class name.
fn main_class(source: &Path, class: &str) -> String {
    let text = match std::fs::read_to_string(source) {
        Ok(text) => text,
        Err(_) => return class.to_string(),
    };
    let mut in_block_comment = false;
    for line in text.lines().map(str::trim) {
        if in_block_comment {
            in_block_comment = !line.contains("*/");
            continue;
        }
        if line.is_empty() || line.starts_with("//") || line.starts_with('@') {
            continue;
        }
        if line.starts_with("/*") {
            in_block_comment = !line.contains("*/");
            continue;
        }
        let Some(rest) = line.strip_prefix("package") else {
            break;
        };
        let name = rest.trim().trim_end_matches(';').trim();
        let identifier =
            |part: &str| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
        let valid = rest.starts_with(char::is_whitespace) && name.split('.').all(identifier);
        if valid {
            debug!(package = name, "Main class is in a package");
            return format!("{name}.{class}");
        }
        break;
    }
    class.to_string()
}

#[derive(Debug, Clone, Default)]
pub struct Kotlin {
    classpath: String,
}

impl Kotlin {
    pub fn new(classpath: String) -> Self {
        Self { classpath }
    }
}

impl LanguageBackend for Kotlin {
    fn name(&self) -> &str {
        "kotlin"
    }

    fn manifest(&self, _packages: &[PackageRef]) -> Option<Manifest> {
        None
    }

    fn source_filename(&self) -> &str {
        "Main.kt"
    }

    fn compile_command(&self, workspace: &Path) -> CommandSpec {
        let mut cmd = CommandSpec::new("kotlinc")
            .arg(workspace.join(self.source_filename()).display().to_string())
            .arg("-d")
            .arg(classes_dir(workspace));
        if !self.classpath.is_empty() {
            cmd = cmd.arg("-cp").arg(&self.classpath);
        }
        cmd.current_dir(workspace)
    }

    fn run_command(&self, workspace: &Path) -> CommandSpec {
        CommandSpec::new("kotlin")
            .arg("-cp")
            .arg(runtime_classpath(workspace, &self.classpath))
            .arg(main_class(&workspace.join(self.source_filename()), "MainKt"))
            .current_dir(workspace)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Java {
    classpath: String,
}

impl Java {
    pub fn new(classpath: String) -> Self {
        Self { classpath }
    }
}

impl LanguageBackend for Java {
    fn name(&self) -> &str {
        "java"
    }

    fn manifest(&self, _packages: &[PackageRef]) -> Option<Manifest> {
        None
    }

    fn source_filename(&self) -> &str {
        "Main.java"
    }

    fn compile_command(&self, workspace: &Path) -> CommandSpec {
        let mut cmd = CommandSpec::new("javac").arg("-d").arg(classes_dir(workspace));
        if !self.classpath.is_empty() {
            cmd = cmd.arg("-cp").arg(&self.classpath);
        }
        cmd.arg(workspace.join(self.source_filename()).display().to_string())
            .current_dir(workspace)
    }

    fn run_command(&self, workspace: &Path) -> CommandSpec {
        CommandSpec::new("java")
            .arg("-cp")
            .arg(runtime_classpath(workspace, &self.classpath))
            .arg(main_class(&workspace.join(self.source_filename()), "Main"))
            .current_dir(workspace)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classpath_collects_only_jars() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("commons-lang3.jar"), "").unwrap();
        std::fs::write(dir.path().join("commons-math3.jar"), "").unwrap();
        std::fs::write(dir.path().join("README.txt"), "").unwrap();

        let classpath = classpath_from_dir(dir.path());
        let entries: Vec<&str> = classpath.split(':').collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("commons-lang3.jar"));
        assert!(entries[1].ends_with("commons-math3.jar"));
        assert!(entries.iter().all(|e| Path::new(e).is_absolute()));
    }

    #[test]
    fn missing_dependency_dir_is_empty_classpath() {
        assert_eq!(classpath_from_dir(Path::new("/nonexistent/deps")), "");
    }

    #[test]
    fn kotlin_commands() {
        let ws = PathBuf::from("/tmp/ws");
        let kotlin = Kotlin::new("/deps/a.jar".into());
        let compile = kotlin.compile_command(&ws);
        assert_eq!(compile.program, "kotlinc");
        assert_eq!(
            compile.args,
            vec!["/tmp/ws/Main.kt", "-d", "/tmp/ws/classes", "-cp", "/deps/a.jar"]
        );
        let run = kotlin.run_command(&ws);
        assert_eq!(run.args, vec!["-cp", "/tmp/ws/classes:/deps/a.jar", "MainKt"]);
        assert!(kotlin.manifest(&[]).is_none());
    }

    #[test]
    fn java_commands_without_dependencies() {
        let ws = PathBuf::from("/tmp/ws");
        let java = Java::default();
        let compile = java.compile_command(&ws);
        assert_eq!(compile.program, "javac");
        assert_eq!(compile.args, vec!["-d", "/tmp/ws/classes", "/tmp/ws/Main.java"]);
        let run = java.run_command(&ws);
        assert_eq!(run.args, vec!["-cp", "/tmp/ws/classes", "Main"]);
    }

    #[test]
    fn java_package_selects_qualified_main_class() {
        let ws = tempfile::tempdir().unwrap();
        std::fs::write(
            ws.path().join("Main.java"),
            "// header\n/* licence\n * text\n */\npackage com.example.app;\n\npublic class Main {}\n",
        )
        .unwrap();
        let run = Java::default().run_command(ws.path());
        assert_eq!(run.args.last().unwrap(), "com.example.app.Main");
    }

    #[test]
    fn kotlin_package_without_semicolon() {
        let ws = tempfile::tempdir().unwrap();
        std::fs::write(
            ws.path().join("Main.kt"),
            "@file:JvmName(\"MainKt\")\npackage demo\n\nfun main() = println(1)\n",
        )
        .unwrap();
        let run = Kotlin::default().run_command(ws.path());
        assert_eq!(run.args.last().unwrap(), "demo.MainKt");
    }

    #[test]
    fn package_mention_after_code_is_ignored() {
        let ws = tempfile::tempdir().unwrap();
        std::fs::write(
            ws.path().join("Main.java"),
            "import java.util.*;\npackage x;\nclass Main {}\n",
        )
        .unwrap();
        let run = Java::default().run_command(ws.path());
        assert_eq!(run.args.last().unwrap(), "Main");

        std::fs::write(ws.path().join("Main.java"), "packageless;\nclass Main {}\n").unwrap();
        let run = Java::default().run_command(ws.path());
        assert_eq!(run.args.last().unwrap(), "Main");
    }
}
