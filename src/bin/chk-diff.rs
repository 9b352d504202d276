//! chk-diff - Managed object diff tool
//!
//! Loads manifests into registries and reports which objects a reconciliation pass
//! would delete.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use keeper_reconcile::{load_registry, EntityType, MetaObject, Registry};

#[derive(Debug, Parser)]
#[command(name = "chk-diff", version, about = "Managed object diff tool")]
struct Cli {
    /// Output location. Use '-' for stdout.
    #[arg(short, long, default_value = "-", global = true)]
    output: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the managed objects found in a manifest.
    List { file: PathBuf },
    /// List objects present in the cluster that are no longer desired.
    Orphans {
        /// Manifest of the objects the current pass wants.
        #[arg(long)]
        desired: PathBuf,
        /// Manifest of the objects the previous pass left behind.
        #[arg(long)]
        present: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct Entry {
    #[serde(rename = "type")]
    entity_type: EntityType,
    namespace: String,
    name: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> Result<()> {
    let registry = match &cli.command {
        Command::List { file } => read_registry(file)?,
        Command::Orphans { desired, present } => {
            let desired = read_registry(desired)?;
            let present = read_registry(present)?;
            present.subtract(&desired);
            present
        }
    };

    // Opened only once the manifests loaded, so a failed run keeps the previous report.
    let mut output: Box<dyn Write> = if cli.output == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            fs::File::create(&cli.output)
                .with_context(|| format!("failed to create output file {:?}", cli.output))?,
        )
    };
    write_registry(&registry, cli.format, &mut output)
}

fn read_registry(file: &Path) -> Result<Registry> {
    let content =
        fs::read_to_string(file).with_context(|| format!("failed to read manifest {:?}", file))?;
    load_registry(&content).with_context(|| format!("failed to load manifest {:?}", file))
}

fn entries(registry: &Registry) -> Vec<Entry> {
    let mut entries = Vec::new();
    registry.walk(|entity_type, snapshot| {
        entries.push(Entry {
            entity_type,
            namespace: snapshot.namespace().to_string(),
            name: snapshot.name().to_string(),
        });
    });
    entries.sort_by(|a, b| {
        (a.entity_type, &a.namespace, &a.name).cmp(&(b.entity_type, &b.namespace, &b.name))
    });
    entries
}

fn write_registry(registry: &Registry, format: Format, output: &mut dyn Write) -> Result<()> {
    let entries = entries(registry);
    match format {
        Format::Text => {
            for entry in &entries {
                writeln!(output, "{}: {}/{}", entry.entity_type, entry.namespace, entry.name)?;
            }
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut *output, &entries)?;
            writeln!(output)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chk-diff-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_failed_load_keeps_previous_output() {
        let dir = scratch_dir("keep");
        let out = write_manifest(&dir, "out.txt", "previous report\n");
        let present = write_manifest(
            &dir,
            "present.yaml",
            "kind: StatefulSet\nmetadata:\n  name: sts-a\n  namespace: demo\n",
        );

        let cli = Cli {
            output: out.display().to_string(),
            format: Format::Text,
            command: Command::Orphans {
                desired: dir.join("missing.yaml"),
                present,
            },
        };
        assert!(run(cli).is_err());
        assert_eq!(fs::read_to_string(&out).unwrap(), "previous report\n");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_orphans_written_to_file() {
        let dir = scratch_dir("orphans");
        let present = write_manifest(
            &dir,
            "present.yaml",
            "kind: StatefulSet\nmetadata:\n  name: sts-a\n  namespace: demo\n---\n\
             kind: ConfigMap\nmetadata:\n  name: cm-a\n  namespace: demo\n",
        );
        let desired = write_manifest(
            &dir,
            "desired.yaml",
            "kind: ConfigMap\nmetadata:\n  name: cm-a\n  namespace: demo\n",
        );
        let out = dir.join("out.txt");

        let cli = Cli {
            output: out.display().to_string(),
            format: Format::Text,
            command: Command::Orphans { desired, present },
        };
        run(cli).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "StatefulSet: demo/sts-a\n");

        fs::remove_dir_all(&dir).unwrap();
    }
}
