pub mod all;
pub mod prospectuses;
pub mod refdata;

use indicatif::{ProgressBar, ProgressStyle};
use spbe_lib::{DownloadOutcome, DownloadTask, Downloader};
use tokio::task::JoinSet;

/// Runs every download task under the downloader's concurrency cap, with a
/// progress bar advanced as tasks finish. Ctrl-C stops new downloads while
/// in-flight ones complete their atomic writes.
pub(crate) async fn download_with_progress(
    downloader: &Downloader,
    tasks: Vec<DownloadTask>,
) -> Vec<DownloadOutcome> {
    let bar = ProgressBar::new(tasks.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    {
        let breaker = downloader.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping new downloads");
                breaker.shutdown();
            }
        });
    }

    let mut set = JoinSet::new();
    for task in tasks {
        let worker = downloader.clone();
        set.spawn(async move { worker.download(&task).await });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(outcome) => {
                bar.inc(1);
                outcomes.push(outcome);
            }
            Err(err) => tracing::error!(error = %err, "download worker panicked"),
        }
    }
    bar.finish_and_clear();
    outcomes
}
