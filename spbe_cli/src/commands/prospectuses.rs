//! The `prospectuses` subcommand: download disclosure documents.

use anyhow::Result;
use clap::Args;
use spbe_lib::{
    document_tasks, Downloader, HttpFetcher, ReferenceDataRun, RunConfig, RunSummary,
};

use super::download_with_progress;

#[derive(Args)]
pub struct ProspectusesArgs {
    /// Also request listings of previously cancelled issues
    #[arg(long)]
    pub include_cancelled: bool,
}

pub async fn run(args: &ProspectusesArgs, cfg: &RunConfig) -> Result<()> {
    let mut cfg = cfg.clone();
    cfg.include_cancelled = cfg.include_cancelled || args.include_cancelled;

    let fetcher = HttpFetcher::new(cfg.request_timeout())?;
    let harvest = ReferenceDataRun::new(&cfg).collect(&fetcher).await?;

    let tasks = document_tasks(&harvest.bonds, &cfg.prospectuses_root());
    eprintln!(
        "{} bonds, {} documents to check",
        harvest.bonds.len(),
        tasks.len()
    );

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
