//! `idf config` command - Configuration management
//!
//! Provides commands to view and modify idf configuration.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::core::config::{ConfigError, KEYS};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path(PathArgs),

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only the local (./idf.yaml) config
    #[arg(long = "local-only")]
    pub local_only: bool,

    /// Show only global (user) config
    #[arg(long = "global-only")]
    pub global_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., backend_url, timeout_secs)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of ./idf.yaml
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of ./idf.yaml
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Show only the local config path
    #[arg(long = "local-only")]
    pub local_only: bool,

    /// Show only global config path
    #[arg(long = "global-only")]
    pub global_only: bool,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path(args) => run_path(args),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load().with_overrides(global.backend_url.clone(), global.demo);

    // If a specific key is requested, show just that value
    if let Some(key) = &args.key {
        check_key(key)?;
        return match config.get(key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if args.local_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --local-only and --global-only"
        ));
    }

    if args.local_only {
        show_file("Local config:", &Config::local_config_path())?;
    } else if args.global_only {
        show_file("Global config:", &get_global_config_path()?)?;
    } else {
        println!("{}", style("Effective Configuration").bold().underlined());
        println!();

        for (key, _) in KEYS {
            print_config_value(key, config.get(key).as_deref());
        }

        println!();
        let backend = if config.is_demo() {
            style("demo (in-memory sample data)".to_string()).yellow()
        } else {
            style(format!("HTTP ({})", config.backend_url().unwrap_or_default())).green()
        };
        println!("  {}: {}", style("backend").bold(), backend);

        println!();
        println!("{}", style("Config Sources (in priority order):").dim());
        println!("  1. Command-line flags (--backend-url, --demo)");
        println!("  2. Environment variables (IDF_BACKEND_URL, IDF_WEBHOOK_URL, IDF_TIMEOUT_SECS, IDF_DEMO_LATENCY_MS)");
        println!("  3. Local config (./idf.yaml)");
        println!("  4. Global config (~/.config/idf/config.yaml)");
    }

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    let value = Config::yaml_value(&args.key, &args.value).map_err(config_error)?;
    let config_path = scope_path(args.global)?;

    let mut config_map = read_mapping(&config_path)?;
    if let serde_yml::Value::Mapping(map) = &mut config_map {
        map.insert(serde_yml::Value::String(args.key.clone()), value);
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope_name(args.global)
    );

    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    check_key(&args.key)?;
    let config_path = scope_path(args.global)?;

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    let removed = match &mut config_map {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(args.key.clone()))
            .is_some(),
        _ => false,
    };

    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope_name(args.global)
    );

    Ok(())
}

fn run_path(args: PathArgs) -> Result<()> {
    if args.local_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --local-only and --global-only"
        ));
    }

    if args.local_only {
        println!("{}", Config::local_config_path().display());
    } else if args.global_only {
        println!("{}", get_global_config_path()?.display());
    } else {
        println!("{}", style("Configuration file paths:").bold());
        println!();
        print_path("Global:", &get_global_config_path()?);
        println!();
        print_path("Local:", &Config::local_config_path());
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'idf config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn config_error(e: ConfigError) -> miette::Report {
    match e {
        ConfigError::UnknownKey(_) => miette::miette!(
            help = "Run 'idf config keys' to list valid keys",
            "{}",
            e
        ),
        other => miette::miette!("{}", other),
    }
}

fn check_key(key: &str) -> Result<()> {
    if KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(config_error(ConfigError::UnknownKey(key.to_string())))
    }
}

fn get_global_config_path() -> Result<PathBuf> {
    Config::global_config_path().ok_or_else(|| config_error(ConfigError::NoConfigDir))
}

fn scope_path(global: bool) -> Result<PathBuf> {
    if global {
        get_global_config_path()
    } else {
        Ok(Config::local_config_path())
    }
}

fn scope_name(global: bool) -> &'static str {
    if global {
        "global"
    } else {
        "local"
    }
}

/// Existing file as a YAML mapping; missing, empty or null files start empty
fn read_mapping(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value =
        serde_yml::from_str(&content).unwrap_or(serde_yml::Value::Mapping(Default::default()));
    if parsed.is_mapping() {
        Ok(parsed)
    } else {
        Ok(serde_yml::Value::Mapping(Default::default()))
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

fn print_path(label: &str, path: &Path) {
    println!("  {} {}", style(label).cyan(), path.display());
    if path.exists() {
        println!("         {}", style("(exists)").green());
    } else {
        println!("         {}", style("(not created)").dim());
    }
}

fn show_file(title: &str, path: &Path) -> Result<()> {
    println!("{} {}", style(title).bold(), style(path.display()).dim());
    println!();

    if path.exists() {
        let content = fs::read_to_string(path).into_diagnostic()?;
        print!("{}", content);
    } else {
        println!("{}", style("(not created)").dim());
    }

    Ok(())
}
