//! Process-wide configuration, read once at startup.

use clap::{Args, ValueEnum};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Toolchain the service compiles submissions with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Language {
    Dotnet,
    Kotlin,
    Java,
}

/// Configuration flags, each falling back to an environment variable.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Wall-clock limit for a single compiler or program run, in seconds
    #[arg(
        long = "timeout",
        global = true,
        env = "EXECUTION_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Separate limit for the compile phase (defaults to --timeout)
    #[arg(
        long = "compile-timeout",
        global = true,
        env = "COMPILE_TIMEOUT",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub compile_timeout_secs: Option<u64>,

    /// Extra packages as "name:version" pairs separated by commas
    #[arg(long, global = true, env = "PREINSTALL_LIBS", default_value = "")]
    pub packages: String,

    /// Comma-separated origins allowed by CORS
    #[arg(long, global = true, env = "ALLOWED_ORIGINS", default_value = DEFAULT_ORIGIN)]
    pub allowed_origins: String,

    /// Directory under which per-submission workspaces are created
    #[arg(long, global = true, env = "BUILD_DIR", default_value = "build/sandbox")]
    pub build_root: PathBuf,

    /// Directory of *.jar files put on the JVM classpath
    #[arg(long, global = true, env = "DEPS_DIR", default_value = "build/dependencies")]
    pub deps_dir: PathBuf,

    /// Language backend
    #[arg(long, global = true, env = "SANDBOX_LANGUAGE", value_enum, default_value_t = Language::Dotnet)]
    pub language: Language,

    /// Maximum number of submissions compiled or run at once
    #[arg(long, global = true, env = "MAX_CONCURRENT")]
    pub max_concurrent: Option<NonZeroUsize>,
}

/// A `name:version` package reference for the build manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
}

/// Immutable service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub timeout_secs: u64,
    pub compile_timeout_secs: u64,
    pub packages: Vec<PackageRef>,
    pub allowed_origins: Vec<String>,
    pub build_root: PathBuf,
    pub deps_dir: PathBuf,
    pub language: Language,
    pub max_concurrent: Option<NonZeroUsize>,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            compile_timeout_secs: DEFAULT_TIMEOUT_SECS,
            packages: Vec::new(),
            allowed_origins: vec![DEFAULT_ORIGIN.to_string()],
            build_root: PathBuf::from("build/sandbox"),
            deps_dir: PathBuf::from("build/dependencies"),
            language: Language::Dotnet,
            max_concurrent: None,
        }
    }
}

impl From<ConfigArgs> for Config {
    fn from(args: ConfigArgs) -> Self {
        Self {
            timeout_secs: args.timeout_secs,
            compile_timeout_secs: args.compile_timeout_secs.unwrap_or(args.timeout_secs),
            packages: parse_packages(&args.packages),
            allowed_origins: parse_origins(&args.allowed_origins),
            build_root: args.build_root,
            deps_dir: args.deps_dir,
            language: args.language,
            max_concurrent: args.max_concurrent,
        }
    }
}

/// Parse `"Newtonsoft.Json:13.0.1,Another.Package:1.2.3"`.
///
/// Entries without exactly two non-empty `:`-separated fields are skipped,
/// never rejected.
pub fn parse_packages(raw: &str) -> Vec<PackageRef> {
    raw.split(',')
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parts: Vec<&str> = entry.split(':').filter(|p| !p.is_empty()).collect();
            match parts.as_slice() {
                [name, version] => Some(PackageRef {
                    name: name.trim().to_string(),
                    version: version.trim().to_string(),
                }),
                _ => {
                    debug!(entry, "Skipping malformed package entry");
                    None
                }
            }
        })
        .collect()
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn pkg(name: &str, version: &str) -> PackageRef {
        PackageRef {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn parses_well_formed_packages() {
        let packages = parse_packages("Newtonsoft.Json:13.0.1, Humanizer : 2.14.1");
        assert_eq!(
            packages,
            vec![pkg("Newtonsoft.Json", "13.0.1"), pkg("Humanizer", "2.14.1")]
        );
    }

    #[test]
    fn skips_malformed_packages() {
        let packages = parse_packages("a:1:2,,noversion,b:2,:3");
        assert_eq!(packages, vec![pkg("b", "2")]);
    }

    #[test]
    fn empty_package_list() {
        assert!(parse_packages("").is_empty());
        assert!(parse_packages(",,,").is_empty());
    }

    #[test]
    fn parses_origins() {
        assert_eq!(
            parse_origins("http://a.test, http://b.test ,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn cli_defaults() {
        let cli = TestCli::try_parse_from(["codebox"]).unwrap();
        let config = Config::from(cli.config);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.compile_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.allowed_origins, vec![DEFAULT_ORIGIN.to_string()]);
        assert_eq!(config.language, Language::Dotnet);
        assert!(config.max_concurrent.is_none());
    }

    #[test]
    fn compile_timeout_overrides_run_timeout() {
        let cli = TestCli::try_parse_from([
            "codebox",
            "--timeout",
            "2",
            "--compile-timeout",
            "60",
            "--language",
            "kotlin",
        ])
        .unwrap();
        let config = Config::from(cli.config);
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.compile_timeout(), Duration::from_secs(60));
        assert_eq!(config.language, Language::Kotlin);
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(TestCli::try_parse_from(["codebox", "--timeout", "0"]).is_err());
    }
}
