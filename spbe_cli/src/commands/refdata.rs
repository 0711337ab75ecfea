//! The `refdata` subcommand: export the reference-data CSV.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use spbe_lib::{HttpFetcher, ReferenceDataRun, RunConfig, RunSummary};

use crate::output;

#[derive(Args)]
pub struct RefdataArgs {
    /// Write the CSV to this exact path instead of the dated default
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub async fn run(args: &RefdataArgs, cfg: &RunConfig) -> Result<()> {
    let fetcher = HttpFetcher::new(cfg.request_timeout())?;
    let harvest = ReferenceDataRun::new(cfg).collect(&fetcher).await?;

    let mut summary = RunSummary {
        records_extracted: harvest.bonds.len(),
        records_dropped: harvest.dropped,
        detail_pages_failed: harvest.detail_failures,
        ..RunSummary::default()
    };
    summary.pages_skipped = harvest.page_failures;

    let path = match &args.out {
        Some(path) => path.clone(),
        None => cfg.output_dir.join(output::reference_data_filename()),
    };
    let rows =
        output::write_reference_csv(&path, harvest.bonds.iter().map(|bond| &bond.record))?;

    eprintln!("{} records written to {}", rows, path.display());
    if summary.has_warnings() {
        eprintln!("Completed with warnings:\n{}", summary);
    } else {
        eprintln!("{}", summary);
    }
    Ok(())
}
