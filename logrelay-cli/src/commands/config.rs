//! `logrelay config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logrelay_core::config::LogRelayConfig;
use logrelay_router::RouterConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
pub const SECTIONS: [&str; 5] = ["general", "redis", "routing", "intake", "metrics"];

const REDACTED: &str = "***REDACTED***";

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load the file, apply env overrides and run core plus router validation.
///
/// # Errors
///
/// Returns `CliError::Config` when any check fails, after rendering the report.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = validation_report(config_path).await;
    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Build the validation report for a configuration file.
pub async fn validation_report(config_path: &Path) -> ConfigValidationReport {
    let errors = match LogRelayConfig::load(config_path).await {
        Ok(config) => match RouterConfig::from_core(&config.routing).validate() {
            Ok(()) => Vec::new(),
            Err(e) => vec![e.to_string()],
        },
        Err(e) => vec![e.to_string()],
    };

    ConfigValidationReport {
        source: config_path.display().to_string(),
        valid: errors.is_empty(),
        errors,
    }
}

/// Display the effective configuration with credentials redacted.
///
/// # Errors
///
/// Returns `CliError::Core` if loading fails or `CliError::Command` for an unknown section.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let mut config = LogRelayConfig::load(config_path).await?;
    redact_credentials(&mut config);

    let report = ConfigReport {
        source: config_path.display().to_string(),
        config_toml: render_section(&config, section.as_deref())?,
        section,
    };
    writer.render(&report)?;

    Ok(())
}

/// Serialize the whole configuration or one named section as TOML.
pub fn render_section(config: &LogRelayConfig, section: Option<&str>) -> Result<String, CliError> {
    let rendered = match section {
        None => toml::to_string_pretty(config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("redis") => toml::to_string_pretty(&config.redis),
        Some("routing") => toml::to_string_pretty(&config.routing),
        Some("intake") => toml::to_string_pretty(&config.intake),
        Some("metrics") => toml::to_string_pretty(&config.metrics),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                other,
                SECTIONS.join(", ")
            )));
        }
    };
    Ok(rendered.unwrap_or_else(|e| format!("(serialization error: {e})")))
}

/// Redact the Redis URL credentials and password.
pub fn redact_credentials(config: &mut LogRelayConfig) {
    config.redis.url = redact_url(&config.redis.url);
    if config.redis.password.as_deref().is_some_and(|p| !p.is_empty()) {
        config.redis.password = Some(REDACTED.to_owned());
    }
}

/// Replace `user:password@` in a connection URL with a redaction marker.
///
/// `redis://:secret@host:6379/0` becomes `redis://***REDACTED***@host:6379/0`.
pub fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_owned();
    };
    let (scheme, rest) = url.split_at(scheme_end + 3);
    let authority_end = rest.find('/').unwrap_or(rest.len());

    match rest[..authority_end].rfind('@') {
        Some(at_pos) => format!("{scheme}{REDACTED}{}", &rest[at_pos..]),
        None => url.to_owned(),
    }
}

/// Configuration display report.
///
/// `config_toml` is only used for text rendering.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{section}]");
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Debug, Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}
