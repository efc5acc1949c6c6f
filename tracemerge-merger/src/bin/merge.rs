use anyhow::Result;
use clap::Parser;
use log::info;

use tracemerge_core::error_bail;
use tracemerge_core::merger::TraceMerger;
use tracemerge_core::tool::init_log;
use tracemerge_merger::Args;

fn main() -> Result<()> {
    init_log();

    let args = Args::parse();

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            error_bail!("invalid arguments: {}", e);
        }
    };

    let summary = match TraceMerger::new(config).run() {
        Ok(summary) => summary,
        Err(e) => {
            error_bail!("merge failed: {}", e);
        }
    };

    info!(
        "done, rows written: {}, sources: {}, output: {}",
        summary.rows_written,
        summary.sources.len(),
        summary.output.display()
    );

    Ok(())
}
