mod bootstrap;
mod report;

use std::io::Write;

use anyhow::Result;
use recap_core::error::RecapError;
use recap_core::settings::Settings;
use recap_core::time_utils::TimezoneHandler;
use recap_data::analysis::{analyze_export, AnalysisOptions};

use crate::report::TextOptions;

/// Exit status for an input that is not a conversation export.
const EXIT_INVALID_FILE: i32 = 2;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("chat-recap v{} starting", env!("CARGO_PKG_VERSION"));

    if !TimezoneHandler::validate_timezone(&settings.timezone) {
        return Err(RecapError::Config(format!(
            "unknown timezone \"{}\" (expected an IANA name such as Europe/Berlin)",
            settings.timezone
        ))
        .into());
    }
    let timezone = TimezoneHandler::new(&settings.timezone);

    let Some(input) = settings.input.clone().or_else(bootstrap::discover_input) else {
        if settings.clear {
            return Ok(());
        }
        anyhow::bail!(
            "No export given and no conversations.json found in the current directory or ~/Downloads"
        );
    };
    tracing::info!("Reading {}", input.display());

    let options = AnalysisOptions {
        timezone,
        reference_year: settings.year,
    };

    let report = match analyze_export(&input, &options) {
        Ok(report) => report,
        Err(e) if e.is_invalid_input() => {
            eprintln!("{}", e);
            std::process::exit(EXIT_INVALID_FILE);
        }
        Err(e) => return Err(e.into()),
    };

    if !report.has_reference_year_data() {
        tracing::warn!(
            "No data available for {}",
            report.metadata.reference_year
        );
    }

    let rendered = match settings.format.as_str() {
        "json" => report::render_json(&report)?,
        _ => report::render_text(
            &report,
            &TextOptions {
                view: settings.view.clone(),
                top_models: settings.top_models as usize,
                limit: settings.limit,
                offset: settings.offset,
                timezone,
            },
        ),
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
