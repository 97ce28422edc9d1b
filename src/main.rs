mod app_runtime;
mod backends;
mod batch_processor;
mod cli;
mod config;
mod diagnostics;
mod log_style;
mod protocol;
mod record_io;

use clap::Parser;
use log::{error, info, warn};

use app_runtime::{exit_status, run_enrichment, summary_line, EXIT_FATAL};
use backends::google_books::GoogleBooksAdapter;
use cli::Cli;
use config::{load_config, sanitize_config};
use diagnostics::LogDiagnostics;

fn main() {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.format(colog::formatter(log_style::TimestampedStyle));
    clog.filter(None, cli.log_level_filter());
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => sanitize_config(cli.apply_overrides(config)),
        Err(err) => {
            error!("CRITICAL: {err}");
            std::process::exit(EXIT_FATAL);
        }
    };
    let params = match cli.run_parameters(config.batch.failure_policy) {
        Ok(params) => params,
        Err(err) => {
            error!("CRITICAL: {err}");
            std::process::exit(EXIT_FATAL);
        }
    };

    let adapter = GoogleBooksAdapter::new(&config.lookup);
    let result = run_enrichment(&params, &config, &adapter, &LogDiagnostics);
    if let Ok(summary) = &result {
        info!("{}", summary_line(summary));
        for failed in &summary.failed {
            warn!(
                "Row {} (identifier {}) was not enriched",
                failed.index + 1,
                failed.identifier
            );
        }
    }
    std::process::exit(exit_status(&result));
}
