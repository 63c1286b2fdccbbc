pub mod cli;
pub mod client;
pub mod components;
pub mod config;
pub mod driver;
pub mod error;
pub mod image;
pub mod install_config;
pub mod machine;

pub use error::InstallerError;

use std::io::Write;

use anyhow::{Context, Result};
use camino::Utf8Path;
use tracing::{info, warn};
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::client::ContainerClient;
use crate::config::Profile;
use crate::driver::Installer;

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .context("failed to set global default tracing subscriber")
}

/// Loads and validates a profile.
pub fn load_profile(path: &Utf8Path) -> Result<Profile> {
    let profile = config::load_profile(path)
        .with_context(|| format!("failed to load profile from {}", path))?;
    profile.validate().context("profile validation failed")?;
    Ok(profile)
}

/// Installs every component on the profile's machine.
///
/// TLS material is checked before the first daemon call.
pub fn run_install(profile: &Profile, client: &dyn ContainerClient) -> Result<()> {
    profile
        .machine
        .tls_files()
        .context("machine TLS credentials are incomplete")?;

    let config = profile.install_config();
    let report = Installer::new(client).install(&profile.machine, &config);
    for outcome in &report.components {
        info!("{}: {}", outcome.name, outcome.state);
    }
    report
        .into_result()
        .with_context(|| format!("install run {} aborted", config.name()))?;
    Ok(())
}

/// Writes the status of every component to `out` as YAML.
///
/// Components that cannot be queried are logged and left out of the report.
pub fn run_status(
    profile: &Profile,
    client: &dyn ContainerClient,
    out: &mut dyn Write,
) -> Result<()> {
    let entries = Installer::new(client).status_all(&profile.machine);
    let mut statuses = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.status {
            Ok(status) => statuses.push(status),
            Err(e) if e.is_not_found() => warn!("{}: not installed", entry.name),
            Err(e) => warn!("{}: status unavailable: {}", entry.name, e),
        }
    }

    serde_yaml::to_writer(&mut *out, &statuses).context("failed to write status report")?;
    Ok(())
}

/// Removes every component, reporting failures after trying them all.
pub fn run_remove(profile: &Profile, client: &dyn ContainerClient) -> Result<()> {
    let failed: Vec<_> = Installer::new(client)
        .remove_all(&profile.machine)
        .into_iter()
        .filter_map(|entry| entry.result.err().map(|e| format!("{}: {}", entry.name, e)))
        .collect();

    if !failed.is_empty() {
        anyhow::bail!("failed to remove {} component(s): {}", failed.len(), failed.join("; "));
    }
    info!("all components removed");
    Ok(())
}

pub fn run_validate(opts: &cli::CommonArgs) -> Result<()> {
    let profile = load_profile(&opts.file)?;
    info!("validation successful:\n{:#?}", profile);
    Ok(())
}
