//! Row-range-bounded batch enrichment with bounded retries.
//!
//! Records outside the requested range are copied through unchanged. Records
//! inside it get one category label appended, fetched through a
//! `CategoryLookup` with up to `max_attempts` tries. Every
//! `checkpoint_interval` successful enrichments the output is flushed so a
//! crash loses at most the records written since the last checkpoint.

use std::time::Duration;

use crate::backends::CategoryLookup;
use crate::config::{Config, FailurePolicy};
use crate::diagnostics::Diagnostics;
use crate::protocol::{
    FailedRecord, LookupOutcome, Record, RowRange, RunSummary, NO_CATEGORY_LABEL,
};
use crate::record_io::RecordSink;

/// Tunables for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub checkpoint_interval: usize,
    pub failure_policy: FailurePolicy,
}

impl BatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry.retry_delay_ms),
            checkpoint_interval: config.batch.checkpoint_interval.max(1),
            failure_policy: config.batch.failure_policy,
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Drives lookups over a record set and writes the combined output.
pub struct BatchProcessor<'a> {
    lookup: &'a dyn CategoryLookup,
    diagnostics: &'a dyn Diagnostics,
    options: BatchOptions,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(
        lookup: &'a dyn CategoryLookup,
        diagnostics: &'a dyn Diagnostics,
        options: BatchOptions,
    ) -> Self {
        Self {
            lookup,
            diagnostics,
            options,
        }
    }

    /// Processes `records` into `output`.
    ///
    /// `quarantine` receives exhausted records when the failure policy is
    /// `quarantine` and is ignored otherwise. Any sink error aborts the run.
    pub fn process(
        &self,
        records: Vec<Record>,
        output: &mut dyn RecordSink,
        mut quarantine: Option<&mut dyn RecordSink>,
        range: RowRange,
    ) -> Result<RunSummary, String> {
        if self.options.failure_policy == FailurePolicy::Quarantine && quarantine.is_none() {
            return Err("failure policy 'quarantine' requires a quarantine sink".to_string());
        }

        let total_records = records.len();
        let (range, adjusted) = range.clamped_to(total_records);
        if adjusted {
            self.diagnostics.warn(&format!(
                "End row adjusted to the end of the file: {}",
                range.end
            ));
        }

        let mut enriched = 0usize;
        let mut passed_through = 0usize;
        let mut failed = Vec::new();

        for (index, mut record) in records.into_iter().enumerate() {
            if !range.contains(index) {
                output.write_record(&record)?;
                passed_through += 1;
                continue;
            }

            let identifier = record.first().cloned().unwrap_or_default();
            let Some(label) = self.fetch_label(&identifier) else {
                self.diagnostics.error(&format!(
                    "Failed to fetch category for identifier {identifier} after {} attempts.",
                    self.options.max_attempts
                ));
                match self.options.failure_policy {
                    FailurePolicy::Drop => {}
                    FailurePolicy::Passthrough => output.write_record(&record)?,
                    FailurePolicy::Quarantine => {
                        if let Some(sink) = quarantine.as_deref_mut() {
                            sink.write_record(&record)?;
                        }
                    }
                }
                failed.push(FailedRecord { index, identifier });
                continue;
            };

            record.push(label);
            output.write_record(&record)?;
            enriched += 1;

            if enriched % self.options.checkpoint_interval == 0 {
                self.diagnostics.info(&format!(
                    "Checkpoint at row {}: identifier {identifier}, category {}. Processed {enriched} rows.",
                    index + 1,
                    record.last().map(String::as_str).unwrap_or_default()
                ));
                output.flush()?;
                if let Some(sink) = quarantine.as_deref_mut() {
                    sink.flush()?;
                }
            }
        }

        output.flush()?;
        if let Some(sink) = quarantine.as_deref_mut() {
            sink.flush()?;
        }

        self.diagnostics.info(&format!(
            "Processing completed. Total rows processed: {enriched}"
        ));
        if !failed.is_empty() {
            self.diagnostics.warn(&format!(
                "{} record(s) exhausted their retries and were handled by failure policy '{}'",
                failed.len(),
                self.options.failure_policy.as_str()
            ));
        }

        Ok(RunSummary {
            total_records,
            effective_range: range,
            enriched,
            passed_through,
            failed,
            failure_policy: self.options.failure_policy,
        })
    }

    /// Returns the label to append, or `None` once every attempt failed transiently.
    fn fetch_label(&self, identifier: &str) -> Option<String> {
        if identifier.trim().is_empty() {
            self.diagnostics
                .warn("Blank identifier in processed range; skipping lookup");
            return Some(NO_CATEGORY_LABEL.to_string());
        }

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let detail = match self.lookup.lookup(identifier) {
                LookupOutcome::TransientError(detail) => detail,
                outcome => return outcome.label().map(ToOwned::to_owned),
            };
            self.diagnostics.error(&format!(
                "Error fetching category for identifier {identifier}: {detail}"
            ));
            if attempts >= self.options.max_attempts {
                return None;
            }
            self.diagnostics
                .warn(&format!("Retry {attempts} for identifier {identifier}"));
            if !self.options.retry_delay.is_zero() {
                std::thread::sleep(self.options.retry_delay);
            }
        }
    }
}
