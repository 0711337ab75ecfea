//! The `all` subcommand: CSV export plus document downloads from one
//! collection pass, so the site is paginated only once.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use spbe_lib::{
    document_tasks, Downloader, HttpFetcher, ReferenceDataRun, RunConfig, RunSummary,
};

use super::download_with_progress;
use crate::output;

#[derive(Args)]
pub struct AllArgs {
    /// Write the CSV to this exact path instead of the dated default
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Also request listings of previously cancelled issues
    #[arg(long)]
    pub include_cancelled: bool,
}

pub async fn run(args: &AllArgs, cfg: &RunConfig) -> Result<()> {
    let mut cfg = cfg.clone();
    cfg.include_cancelled = cfg.include_cancelled || args.include_cancelled;

    let fetcher = HttpFetcher::new(cfg.request_timeout())?;
    let harvest = ReferenceDataRun::new(&cfg).collect(&fetcher).await?;

    let path = match &args.out {
        Some(path) => path.clone(),
        None => cfg.output_dir.join(output::reference_data_filename()),
    };
    let rows =
        output::write_reference_csv(&path, harvest.bonds.iter().map(|bond| &bond.record))?;
    eprintln!("{} records written to {}", rows, path.display());

    let tasks = document_tasks(&harvest.bonds, &cfg.prospectuses_root());
    eprintln!("{} documents to check", tasks.len());

    let downloader = Downloader::new(&cfg)?;
    let outcomes = download_with_progress(&downloader, tasks).await;

    let mut summary = RunSummary {
        records_extracted: harvest.bonds.len(),
        records_dropped: harvest.dropped,
        detail_pages_failed: harvest.detail_failures,
        ..RunSummary::default()
    };
    summary.pages_skipped = harvest.page_failures;
    summary.absorb_outcomes(outcomes);

    eprintln!("{}", summary);
    Ok(())
}
