//! `logrelay patterns` command handler
//!
//! Handlers take a `&dyn LogStore` so they run the same against Redis or an
//! in-memory store. Store calls are blocking and are moved off the runtime.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use logrelay_core::config::LogRelayConfig;
use logrelay_core::types::LogLevel;
use logrelay_router::catalog::{
    MatchType, PatternCatalog, PatternLoader, PatternMatcher, PatternRecord, PatternSource,
    default_patterns,
};
use logrelay_router::{LogStore, RedisStore};

use crate::cli::{AddPatternArgs, PatternScope, PatternsAction, PatternsArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render, truncate};

/// Execute the `patterns` command.
pub async fn execute(
    args: PatternsArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = LogRelayConfig::load(config_path).await?;
    let store: Arc<dyn LogStore> = Arc::new(RedisStore::from_config(&config.redis)?);
    let connector = config.routing.connector_type.clone();

    match args.action {
        PatternsAction::List { scope } => {
            let report = blocking(move || list_patterns(store.as_ref(), &connector, scope)).await?;
            writer.render(&report)
        }
        PatternsAction::Test { message, level } => {
            let seed = config.routing.seed_default_patterns;
            let mut report =
                blocking(move || test_message(store.as_ref(), &connector, seed, &message)).await?;
            report.show_level = level;
            writer.render(&report)
        }
        PatternsAction::Add(add) => {
            let report = blocking(move || add_pattern(store.as_ref(), &connector, &add)).await?;
            writer.render(&report)
        }
        PatternsAction::Disable { id, scope } => {
            let report =
                blocking(move || disable_pattern(store.as_ref(), &connector, &id, scope)).await?;
            writer.render(&report)
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T, CliError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CliError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CliError::Command(format!("pattern command aborted: {e}")))?
}

/// Sources a read command covers, in catalog load order.
pub fn read_sources(scope: PatternScope, connector_type: &str) -> Vec<PatternSource> {
    match scope {
        PatternScope::Global => vec![PatternSource::global()],
        PatternScope::Connector => vec![PatternSource::connector(connector_type)],
        PatternScope::All => PatternSource::standard(connector_type),
    }
}

/// The single hash a write command targets.
pub fn write_source(scope: PatternScope, connector_type: &str) -> Result<PatternSource, CliError> {
    match scope {
        PatternScope::Global => Ok(PatternSource::global()),
        PatternScope::Connector => Ok(PatternSource::connector(connector_type)),
        PatternScope::All => Err(CliError::Command(
            "--scope all is only valid for listing (use global or connector)".to_owned(),
        )),
    }
}

/// List stored records, inactive and malformed ones included.
pub fn list_patterns(
    store: &dyn LogStore,
    connector_type: &str,
    scope: PatternScope,
) -> Result<PatternListReport, CliError> {
    let mut patterns = Vec::new();

    for source in read_sources(scope, connector_type) {
        info!(key = %source.key, "reading pattern source");
        let mut records = PatternLoader::read_source(store, &source)?;
        records.sort_by(|a, b| a.0.cmp(&b.0));

        for (id, record) in records {
            patterns.push(match record {
                Ok(record) => PatternEntry::from_record(&source, id, &record),
                Err(e) => PatternEntry::malformed(&source, id, e.to_string()),
            });
        }
    }

    Ok(PatternListReport {
        total: patterns.len(),
        active: patterns.iter().filter(|p| p.active).count(),
        patterns,
    })
}

/// Load the catalog the router would see and classify one message.
pub fn test_message(
    store: &dyn LogStore,
    connector_type: &str,
    seed_defaults: bool,
    message: &str,
) -> Result<PatternTestReport, CliError> {
    store.ping()?;

    let (mut catalog, summary) =
        PatternCatalog::load(store, &PatternSource::standard(connector_type));
    let mut seeded = false;
    if catalog.is_empty() && seed_defaults {
        catalog = PatternCatalog::from_patterns(default_patterns());
        seeded = true;
    }

    let matched = catalog.find_match(message).map(|p| MatchedPattern {
        id: p.id.clone(),
        match_type: p.match_type.to_string(),
        classification: p.classification.clone(),
        is_log_filter_only: p.is_log_filter_only,
        human_readable_message: p.human_readable_message.clone(),
        call_to_action: p.call_to_action.clone(),
        retry: p.retryable,
    });

    Ok(PatternTestReport {
        message: message.to_owned(),
        level: LogLevel::from_message(message),
        catalog_size: catalog.len(),
        seeded_defaults: seeded,
        failed_sources: summary.failed_sources,
        matched,
        show_level: false,
    })
}

/// Validate a record and store it under its id.
pub fn add_pattern(
    store: &dyn LogStore,
    connector_type: &str,
    args: &AddPatternArgs,
) -> Result<PatternWriteReport, CliError> {
    let source = write_source(args.scope, connector_type)?;
    let record = PatternRecord {
        pattern: args.pattern.clone(),
        match_type: Some(args.match_type.to_lowercase()),
        case_sensitive: args.case_sensitive,
        active: Some(true),
        classification: args.classification.clone(),
        is_log_filter_only: args.log_filter_only,
        human_readable_message: args.message.clone(),
        call_to_action: args.call_to_action.clone(),
        retry: args.retry,
    };
    record.validate(&args.id)?;

    let replaced = store
        .hash_entries(&source.key)?
        .iter()
        .any(|(id, _)| id == &args.id);

    store.hash_set(&source.key, &args.id, &record.to_json()?)?;
    info!(key = %source.key, id = %args.id, replaced, "pattern stored");

    Ok(PatternWriteReport {
        action: if replaced { "replaced" } else { "added" },
        scope: source.scope,
        key: source.key,
        id: args.id.clone(),
    })
}

/// Rewrite a stored record with `active = false`.
pub fn disable_pattern(
    store: &dyn LogStore,
    connector_type: &str,
    id: &str,
    scope: PatternScope,
) -> Result<PatternWriteReport, CliError> {
    let source = write_source(scope, connector_type)?;
    let records = PatternLoader::read_source(store, &source)?;

    let Some((_, record)) = records.into_iter().find(|(field, _)| field == id) else {
        return Err(CliError::Command(format!(
            "pattern '{id}' not found in {}",
            source.key
        )));
    };

    let mut record = record?;
    let action = if record.is_active() {
        record.active = Some(false);
        store.hash_set(&source.key, id, &record.to_json()?)?;
        info!(key = %source.key, id, "pattern disabled");
        "disabled"
    } else {
        "unchanged"
    };

    Ok(PatternWriteReport {
        action,
        scope: source.scope,
        key: source.key,
        id: id.to_owned(),
    })
}

#[derive(Debug, Serialize)]
pub struct PatternListReport {
    pub total: usize,
    pub active: usize,
    pub patterns: Vec<PatternEntry>,
}

#[derive(Debug, Serialize)]
pub struct PatternEntry {
    pub scope: String,
    pub id: String,
    /// Effective match type after fallback.
    pub match_type: String,
    pub active: bool,
    /// Regex failed to compile; the router treats it as substring text.
    pub downgraded: bool,
    pub classification: String,
    pub pattern: String,
    /// Why the record will not behave as written, if anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

impl PatternEntry {
    fn from_record(source: &PatternSource, id: String, record: &PatternRecord) -> Self {
        let (requested, unknown) = record.requested_match_type();
        let downgraded = requested == MatchType::Regex
            && PatternMatcher::compile(&record.pattern, requested, record.case_sensitive).is_err();
        let effective = if downgraded {
            MatchType::Contains
        } else {
            requested
        };

        let problem = if record.is_empty() {
            Some("empty pattern, never loaded".to_owned())
        } else if let Some(raw) = unknown {
            Some(format!("unknown match_type '{raw}'"))
        } else if downgraded {
            Some("invalid regex".to_owned())
        } else {
            None
        };

        Self {
            scope: source.scope.clone(),
            id,
            match_type: effective.to_string(),
            active: record.is_active(),
            downgraded,
            classification: record.classification().to_owned(),
            pattern: record.pattern.clone(),
            problem,
        }
    }

    fn malformed(source: &PatternSource, id: String, reason: String) -> Self {
        Self {
            scope: source.scope.clone(),
            id,
            match_type: "-".to_owned(),
            active: false,
            downgraded: false,
            classification: "-".to_owned(),
            pattern: String::new(),
            problem: Some(reason),
        }
    }
}

impl Render for PatternListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Error Patterns ({} total, {} active)",
            self.total.to_string().bold(),
            self.active
        )?;
        writeln!(w)?;
        writeln!(
            w,
            "{:<10} {:<28} {:<9} {:<9} {:<14} Pattern",
            "Scope", "ID", "Type", "Status", "Class"
        )?;
        writeln!(w, "{}", "-".repeat(100))?;

        for p in &self.patterns {
            let status = if p.problem.is_some() && p.match_type == "-" {
                "broken".red()
            } else if p.active {
                "active".green()
            } else {
                "inactive".yellow()
            };
            let match_type = if p.downgraded {
                format!("{}*", p.match_type).yellow()
            } else {
                p.match_type.normal()
            };

            writeln!(
                w,
                "{:<10} {:<28} {:<9} {:<9} {:<14} {}",
                p.scope,
                truncate(&p.id, 28),
                match_type,
                status,
                truncate(&p.classification, 14),
                truncate(&p.pattern, 40)
            )?;
            if let Some(ref problem) = p.problem {
                writeln!(w, "{:<10} {}", "", problem.red())?;
            }
        }

        if self.patterns.iter().any(|p| p.downgraded) {
            writeln!(w)?;
            writeln!(w, "* regex failed to compile, matched as plain text")?;
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PatternTestReport {
    pub message: String,
    pub level: LogLevel,
    pub catalog_size: usize,
    pub seeded_defaults: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_sources: Vec<String>,
    pub matched: Option<MatchedPattern>,
    #[serde(skip)]
    pub show_level: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchedPattern {
    pub id: String,
    pub match_type: String,
    pub classification: String,
    pub is_log_filter_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_readable_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<String>,
    pub retry: bool,
}

impl Render for PatternTestReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Message: {}", self.message.bold())?;
        if self.show_level {
            writeln!(w, "  Level: {}", self.level.as_str())?;
        }
        let origin = if self.seeded_defaults {
            " (built-in defaults)"
        } else {
            ""
        };
        writeln!(w, "  Catalog: {} patterns{}", self.catalog_size, origin)?;
        for key in &self.failed_sources {
            writeln!(w, "  {} {}", "Unreadable source:".yellow(), key)?;
        }

        match self.matched {
            Some(ref m) => {
                writeln!(w, "  Result: {} {}", "MATCH".red().bold(), m.id.bold())?;
                writeln!(w, "    Type: {}", m.match_type)?;
                writeln!(w, "    Classification: {}", m.classification)?;
                if m.is_log_filter_only {
                    writeln!(w, "    Log filter only: yes")?;
                }
                if let Some(ref msg) = m.human_readable_message {
                    writeln!(w, "    Message: {msg}")?;
                }
                if let Some(ref cta) = m.call_to_action {
                    writeln!(w, "    Action: {cta}")?;
                }
                writeln!(w, "    Retry: {}", if m.retry { "yes" } else { "no" })?;
            }
            None => writeln!(w, "  Result: {}", "no match".green())?,
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PatternWriteReport {
    pub action: &'static str,
    pub scope: String,
    pub key: String,
    pub id: String,
}

impl Render for PatternWriteReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Pattern {} {} in {}",
            self.id.bold(),
            self.action.green(),
            self.key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logrelay_router::MemoryStore;
    use logrelay_router::catalog::GLOBAL_PATTERNS_KEY;

    fn add_args(id: &str, pattern: &str, match_type: &str) -> AddPatternArgs {
        AddPatternArgs {
            id: id.to_owned(),
            pattern: pattern.to_owned(),
            match_type: match_type.to_owned(),
            case_sensitive: false,
            classification: None,
            scope: PatternScope::Global,
            message: None,
            call_to_action: None,
            retry: false,
            log_filter_only: false,
        }
    }

    #[test]
    fn test_write_source_rejects_all_scope() {
        let err = write_source(PatternScope::All, "comfyui").unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_read_sources_all_is_global_first() {
        let keys: Vec<_> = read_sources(PatternScope::All, "comfyui")
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["error_patterns:global", "error_patterns:comfyui"]);
    }

    #[test]
    fn test_entry_flags_downgraded_regex() {
        // Given: a regex record that does not compile
        let store = MemoryStore::new();
        store.seed_hash(
            GLOBAL_PATTERNS_KEY,
            "broken",
            r#"{"pattern": "([a-z", "match_type": "regex"}"#,
        );

        // When
        let report = list_patterns(&store, "comfyui", PatternScope::Global).expect("list");

        // Then: it is reported as contains with a problem note
        let entry = &report.patterns[0];
        assert!(entry.downgraded);
        assert_eq!(entry.match_type, "contains");
        assert_eq!(entry.problem.as_deref(), Some("invalid regex"));
    }

    #[test]
    fn test_add_rejects_invalid_regex_without_writing() {
        let store = MemoryStore::new();
        let err = add_pattern(&store, "comfyui", &add_args("bad", "([a-z", "regex")).unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert!(
            store
                .hash_entries(GLOBAL_PATTERNS_KEY)
                .expect("entries")
                .is_empty()
        );
    }

    #[test]
    fn test_add_reports_replace_on_existing_id() {
        let store = MemoryStore::new();
        add_pattern(&store, "comfyui", &add_args("oom", "out of memory", "contains"))
            .expect("first add");
        let report = add_pattern(&store, "comfyui", &add_args("oom", "OOM", "contains"))
            .expect("second add");
        assert_eq!(report.action, "replaced");
    }

    #[test]
    fn test_test_report_text_shows_level_only_when_asked() {
        let mut report = PatternTestReport {
            message: "ERROR: boom".to_owned(),
            level: LogLevel::Error,
            catalog_size: 0,
            seeded_defaults: false,
            failed_sources: Vec::new(),
            matched: None,
            show_level: false,
        };

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        assert!(!String::from_utf8_lossy(&buffer).contains("Level:"));

        report.show_level = true;
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8_lossy(&buffer).into_owned();
        assert!(output.contains("Level: ERROR"));
        assert!(output.contains("no match"));
    }

    #[test]
    fn test_write_report_json_shape() {
        let report = PatternWriteReport {
            action: "disabled",
            scope: "global".to_owned(),
            key: GLOBAL_PATTERNS_KEY.to_owned(),
            id: "oom".to_owned(),
        };
        let parsed: serde_json::Value =
            serde_json::to_value(&report).expect("JSON serialization should succeed");
        assert_eq!(parsed["action"], "disabled");
        assert_eq!(parsed["key"], "error_patterns:global");
    }
}
