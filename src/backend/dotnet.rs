use super::{LanguageBackend, Manifest};
use crate::config::PackageRef;
use crate::runner::CommandSpec;
use std::fmt::Write;
use std::path::Path;

/// .NET 8 console application built with `dotnet build`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dotnet;

const PROJECT_FILE: &str = "Program.csproj";
const SOURCE_FILE: &str = "Program.cs";
const OUTPUT_DIR: &str = "bin";
const ASSEMBLY: &str = "Program.dll";

impl LanguageBackend for Dotnet {
    fn name(&self) -> &str {
        "dotnet"
    }

    fn manifest(&self, packages: &[PackageRef]) -> Option<Manifest> {
        let mut references = String::new();
        for package in packages {
            let _ = writeln!(
                references,
                "    <PackageReference Include=\"{}\" Version=\"{}\" />",
                package.name, package.version
            );
        }

        let contents = format!(
            r#"<Project Sdk="Microsoft.NET.Sdk">
<PropertyGroup>
    <OutputType>Exe</OutputType>
    <TargetFramework>net8.0</TargetFramework>
    <ImplicitUsings>enable</ImplicitUsings>
    <Nullable>enable</Nullable>
</PropertyGroup>
<ItemGroup>
{references}
</ItemGroup>
</Project>"#
        );
        Some(Manifest {
            filename: PROJECT_FILE.to_string(),
            contents,
        })
    }

    fn source_filename(&self) -> &str {
        SOURCE_FILE
    }

    fn compile_command(&self, workspace: &Path) -> CommandSpec {
        CommandSpec::new("dotnet")
            .arg("build")
            .arg("-o")
            .arg(workspace.join(OUTPUT_DIR).display().to_string())
            .current_dir(workspace)
    }

    fn run_command(&self, workspace: &Path) -> CommandSpec {
        CommandSpec::new("dotnet")
            .arg(workspace.join(OUTPUT_DIR).join(ASSEMBLY).display().to_string())
            .current_dir(workspace)
    }
}
