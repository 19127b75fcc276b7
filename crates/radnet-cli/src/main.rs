//! radnet command-line harness.
//!
//! Exercises a bridge configuration outside the host server: validate
//! it and inspect the stage table, or bring the bridge up for real and
//! push a one-shot request through a stage.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use radnet_core::{BridgeConfig, RequestContext, Stage};
use radnet_host::RuntimeBridge;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "radnet", version, about = "Managed-runtime bridge harness")]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a configuration and print the resolved stage table.
    Check {
        /// Path to the TOML configuration.
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Instantiate the bridge, dispatch one request, then detach.
    Run {
        /// Path to the TOML configuration.
        #[arg(short, long)]
        config: PathBuf,
        /// Stage to dispatch.
        #[arg(long, default_value = "authorize")]
        stage: String,
        /// Request attributes as NAME=VALUE pairs.
        #[arg(value_name = "NAME=VALUE")]
        attributes: Vec<String>,
    },
    /// List the pipeline stages this build knows about.
    Stages,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Check { config } => check(&config),
        Command::Run {
            config,
            stage,
            attributes,
        } => run(&config, &stage, &attributes),
        Command::Stages => {
            for stage in Stage::ALL {
                println!("{stage}");
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}

fn load_config(path: &Path) -> Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: BridgeConfig =
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn check(path: &Path) -> Result<()> {
    let config = load_config(path)?;

    println!("runtime library: {}", config.runtime_library.display());
    println!("base path:       {}", config.base_path.display());
    println!("context name:    {}", config.context_name);
    println!();
    for (stage, target) in config.resolve_targets()? {
        match target {
            Some(target) => println!("  {stage:>12}  {target}"),
            None => println!("  {stage:>12}  -"),
        }
    }
    Ok(())
}

fn run(path: &Path, stage_key: &str, attributes: &[String]) -> Result<()> {
    let Some(stage) = Stage::from_key(stage_key) else {
        bail!("unknown stage `{stage_key}`; try `radnet stages`");
    };
    if stage.is_lifecycle() {
        bail!("stage `{stage_key}` runs automatically at instantiate/detach");
    }

    let config = load_config(path)?;

    let mut request = RequestContext::new();
    for attribute in attributes {
        let (name, value) = attribute
            .split_once('=')
            .with_context(|| format!("attribute `{attribute}` is not NAME=VALUE"))?;
        request.push_request(name, value);
    }

    let mut bridge = RuntimeBridge::instantiate(config)?;
    let verdict = bridge.dispatch(stage, &mut request);

    println!("verdict: {verdict}");
    for attribute in request.reply() {
        println!("reply:   {attribute}");
    }

    if let Some(report) = bridge.detach() {
        println!(
            "shutdown: status {} exit code {}",
            report.status, report.latched_exit_code
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_resolves_stage_table() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("radnet.toml");
        std::fs::write(
            &config_path,
            r#"
                base_path = "/opt/radnet"
                trusted_assemblies = ["/opt/radnet/managed"]
                assembly = "Radnet.Managed"
                class = "Radnet.Managed.Handlers"

                [stages.authorize]
                function = "Authorize"
            "#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        let targets = config.resolve_targets().unwrap();
        let configured: Vec<_> = targets
            .iter()
            .filter_map(|(stage, target)| target.as_ref().map(|_| *stage))
            .collect();
        assert_eq!(configured, vec![Stage::Authorize]);
    }

    #[test]
    fn test_load_config_rejects_missing_required_options() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("radnet.toml");
        std::fs::write(&config_path, "base_path = \"/opt/radnet\"\n").unwrap();

        assert!(load_config(&config_path).is_err());
    }
}
