//! Run bootstrap: opens files, wires the processor and reports fatal errors.

use crate::{
    backends::CategoryLookup,
    batch_processor::{BatchOptions, BatchProcessor},
    config::{delimiter_byte, Config},
    diagnostics::Diagnostics,
    protocol::{RunParameters, RunSummary},
    record_io::{read_records, CsvRecordSink, RecordSink},
};

/// Exit status for a run where every in-range record got a label.
pub(crate) const EXIT_CLEAN: i32 = 0;
/// Exit status for a fatal abort or invalid configuration.
pub(crate) const EXIT_FATAL: i32 = 1;
/// Exit status for a completed run where some records exhausted their retries.
pub(crate) const EXIT_WITH_FAILURES: i32 = 2;

/// Maps a run result to the process exit status.
pub(crate) fn exit_status(result: &Result<RunSummary, String>) -> i32 {
    match result {
        Ok(summary) if summary.is_clean() => EXIT_CLEAN,
        Ok(_) => EXIT_WITH_FAILURES,
        Err(_) => EXIT_FATAL,
    }
}

/// One-line report of a finished run, including the failure policy that
/// decided what happened to the failed rows.
pub(crate) fn summary_line(summary: &RunSummary) -> String {
    format!(
        "Run finished: {} in range of {} records, {} enriched, {} passed through, {} failed (failure policy {})",
        summary
            .effective_range
            .end
            .saturating_sub(summary.effective_range.start),
        summary.total_records,
        summary.enriched,
        summary.passed_through,
        summary.failed.len(),
        summary.failure_policy.as_str()
    )
}

/// Executes one enrichment run end to end.
///
/// A structural failure (unreadable input, unwritable output) is reported
/// once at critical severity and returned; whatever was flushed before it
/// stays in the output file.
pub(crate) fn run_enrichment(
    params: &RunParameters,
    config: &Config,
    lookup: &dyn CategoryLookup,
    diagnostics: &dyn Diagnostics,
) -> Result<RunSummary, String> {
    let options = BatchOptions::from_config(config);
    diagnostics.info(&format!(
        "Starting CSV processing. Input: {}, Output: {}, Start Row: {}, End Row: {}, Max Attempts: {}, Retry Delay: {:?}, Failure Policy: {}",
        params.source_path.display(),
        params.dest_path.display(),
        params.range.start,
        params.range.end,
        options.max_attempts,
        options.retry_delay,
        options.failure_policy.as_str()
    ));

    let result = open_and_process(params, config, options, lookup, diagnostics);
    if let Err(error) = &result {
        diagnostics.critical(&format!("Critical error during CSV processing: {error}"));
    }
    result
}

fn open_and_process(
    params: &RunParameters,
    config: &Config,
    options: BatchOptions,
    lookup: &dyn CategoryLookup,
    diagnostics: &dyn Diagnostics,
) -> Result<RunSummary, String> {
    let delimiter = delimiter_byte(config.batch.delimiter)?;
    let records = read_records(&params.source_path, delimiter)?;
    let mut output = CsvRecordSink::create(&params.dest_path, delimiter)?;
    let mut quarantine = match &params.quarantine_path {
        Some(path) => Some(CsvRecordSink::create(path, delimiter)?),
        None => None,
    };

    let processor = BatchProcessor::new(lookup, diagnostics, options);
    processor.process(
        records,
        &mut output,
        quarantine
            .as_mut()
            .map(|sink| sink as &mut dyn RecordSink),
        params.range,
    )
}
