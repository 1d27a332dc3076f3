//! One lookup run: resolve styles, query inventory, export the rows

use crate::config::Settings;
use crate::error::{Result, RunError};
use crate::export;
use crate::inventory::{self, VariantFilter};
use crate::models::{Backend, OutputFormat, StyleSet};
use crate::styles;
use crate::summary::{self, StyleMatrix};
use std::path::PathBuf;

pub const DEFAULT_OUTPUT: &str = "out.xlsx";

/// Options for a single run, usually built from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub styles: Option<String>,
    pub styles_file: Option<PathBuf>,
    pub url: Option<String>,
    /// Free-text product search on the storefront
    pub search: Option<String>,
    /// Overrides the configured backend
    pub backend: Option<Backend>,
    pub output: PathBuf,
    pub format: Option<OutputFormat>,
    pub dry_run: bool,
    pub color: Option<String>,
    pub size: Option<String>,
    pub summary: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            styles: None,
            styles_file: None,
            url: None,
            search: None,
            backend: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            format: None,
            dry_run: false,
            color: None,
            size: None,
            summary: false,
        }
    }
}

impl RunOptions {
    fn has_source(&self) -> bool {
        self.styles.is_some()
            || self.styles_file.is_some()
            || self.url.is_some()
            || self.search.is_some()
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// Styles that would have been queried
    DryRun(StyleSet),
    Exported(ExportSummary),
}

#[derive(Debug)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    /// Styles skipped by a skip-and-warn backend
    pub failed_styles: Vec<String>,
    /// Empty unless a summary was requested
    pub matrices: Vec<StyleMatrix>,
}

/// Run a full lookup with the given options and settings
pub fn run(options: &RunOptions, settings: &Settings) -> Result<RunOutcome> {
    if !options.has_source() {
        return Err(RunError::NoSource);
    }

    let styles = styles::resolve(
        options.styles.as_deref(),
        options.styles_file.as_deref(),
        options.url.as_deref(),
        options.search.as_deref().map(|text| styles::ProductSearch {
            text,
            endpoint: &settings.search_url,
        }),
        settings.timeout,
    );
    if styles.is_empty() {
        return Err(RunError::NoStyles);
    }

    if options.dry_run {
        log::info!("Dry run: {} style(s) resolved, skipping inventory lookup", styles.len());
        return Ok(RunOutcome::DryRun(styles));
    }

    let backend = options.backend.unwrap_or(settings.backend);
    settings.validate_for(backend)?;

    // Settle the format before spending requests on a run that cannot be written
    let format = export::resolve_format(
        options.format,
        &options.output,
        settings.default_format.as_deref(),
    )?;

    let filter = VariantFilter {
        color: options.color.clone(),
        size: options.size.clone(),
    };
    let client = inventory::client_for(settings, backend, filter)?;

    log::info!("Querying {} style(s) via {}", styles.len(), backend);
    let report = client.get_inventory(&styles)?;
    if report.rows.is_empty() {
        return Err(RunError::NoRows);
    }

    let path = export::export(&report.rows, &options.output, format)?;

    let matrices = if options.summary {
        summary::build_matrices(&report.rows)
    } else {
        Vec::new()
    };

    Ok(RunOutcome::Exported(ExportSummary {
        path,
        rows: report.rows.len(),
        failed_styles: report.failed_styles(),
        matrices,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, ExportError};

    fn options() -> RunOptions {
        RunOptions {
            styles: Some("k420, PC61".to_string()),
            ..RunOptions::default()
        }
    }

    #[test]
    fn no_source_is_rejected() {
        let err = run(&RunOptions::default(), &Settings::default()).unwrap_err();
        assert!(matches!(err, RunError::NoSource));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_style_list_is_rejected() {
        let options = RunOptions {
            styles: Some(" , ".to_string()),
            ..RunOptions::default()
        };
        let err = run(&options, &Settings::default()).unwrap_err();
        assert!(matches!(err, RunError::NoStyles));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn dry_run_needs_no_credentials() {
        let options = RunOptions {
            dry_run: true,
            ..options()
        };

        match run(&options, &Settings::default()).unwrap() {
            RunOutcome::DryRun(styles) => assert_eq!(styles.to_strings(), vec!["K420", "PC61"]),
            other => panic!("Expected RunOutcome::DryRun, got: {other:?}"),
        }
    }

    #[test]
    fn missing_credentials_stop_the_run() {
        let options = RunOptions {
            backend: Some(Backend::Standard),
            ..options()
        };

        match run(&options, &Settings::default()) {
            Err(RunError::Config(ConfigError::MissingCredentials(keys))) => {
                assert_eq!(
                    keys,
                    vec!["SANMAR_CUSTOMER_NUMBER", "SANMAR_USERNAME", "SANMAR_PASSWORD"]
                );
            }
            other => panic!("Expected missing credentials, got: {other:?}"),
        }
    }

    #[test]
    fn bad_configured_format_fails_before_querying() {
        let mut settings = Settings::default();
        settings.credentials.username = "shop".to_string();
        settings.credentials.password = "secret".to_string();
        settings.default_format = Some("pdf".to_string());
        // Unroutable host: reaching the query step would be a network error
        settings.base_url = Some("http://127.0.0.1:1".to_string());

        let options = RunOptions {
            output: PathBuf::from("report"),
            ..options()
        };

        let err = run(&options, &settings).unwrap_err();
        assert!(matches!(err, RunError::Export(ExportError::UnsupportedFormat(_))));
        assert_eq!(err.exit_code(), 5);
    }
}
