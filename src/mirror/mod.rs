//! Page mirroring pipeline.
//!
//! Coordinates the full run: fetch the page, discover and rewrite asset
//! references, create the assets directory, download every asset
//! concurrently, then write the rewritten page. The page file only appears
//! on disk once every asset landed; a single failed download fails the run
//! after all in-flight downloads settle.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, info};
use url::Url;

use crate::fetch::{FetchError, Fetcher};
use crate::naming;
use crate::rewrite::{self, ResourceRef};

/// Errors a mirroring run can end with.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Filesystem access failed for {}: {source}", .path.display())]
    FsAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to retrieve {url}: {source}")]
    ResourceAccess {
        url: Url,
        #[source]
        source: FetchError,
    },
}

/// Outcome of a successful mirroring run.
#[derive(Debug, Clone)]
pub struct MirrorResult {
    /// Where the rewritten page was saved.
    pub filepath: PathBuf,

    /// Downloaded asset files, in discovery order.
    pub resource_files: Vec<PathBuf>,
}

/// Mirror `page_url` into `output_dir`.
///
/// Returns the path of the saved page along with the asset files written
/// next to it. The rewritten page is only written after every asset
/// download succeeded; on failure, assets already on disk are left behind.
pub async fn mirror_page(
    fetcher: &Fetcher,
    page_url: &Url,
    output_dir: &Path,
) -> Result<MirrorResult, MirrorError> {
    info!("Mirroring {} into {:?}", page_url, output_dir);

    let html = fetcher
        .fetch_text(page_url)
        .await
        .map_err(|e| classify(page_url, e))?;

    let page = rewrite::extract(page_url, &html, output_dir);
    debug!("Found {} resources to download", page.resources.len());

    let assets_dir = output_dir.join(naming::resources_dir_name(page_url));
    prepare_dir(&assets_dir).await?;

    download_all(fetcher, &page.resources).await?;

    let filepath = output_dir.join(naming::page_filename(page_url));
    fs::write(&filepath, page.html)
        .await
        .map_err(|source| MirrorError::FsAccess {
            path: filepath.clone(),
            source,
        })?;

    info!("Page saved to {:?}", filepath);

    Ok(MirrorResult {
        filepath,
        resource_files: page.resources.into_iter().map(|r| r.local_path).collect(),
    })
}

/// Map a fetch failure onto the run-level error taxonomy. Local write
/// problems are filesystem errors even when they surface mid-download.
fn classify(url: &Url, error: FetchError) -> MirrorError {
    match error {
        FetchError::Io { path, source } => MirrorError::FsAccess { path, source },
        other => MirrorError::ResourceAccess {
            url: url.clone(),
            source: other,
        },
    }
}

/// Create the assets directory, tolerating one left over from an earlier
/// run. The parent must already exist.
async fn prepare_dir(path: &Path) -> Result<(), MirrorError> {
    match fs::create_dir(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(MirrorError::FsAccess {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Download every planned asset concurrently. All downloads run to
/// completion even when one fails; the first observed failure is returned
/// once the set has drained.
async fn download_all(fetcher: &Fetcher, resources: &[ResourceRef]) -> Result<(), MirrorError> {
    let mut tasks = JoinSet::new();

    for resource in resources {
        let fetcher = fetcher.clone();
        let resource = resource.clone();
        tasks.spawn(async move {
            fetcher
                .fetch_to_file(&resource.remote_url, &resource.local_path)
                .await
                .map_err(|e| classify(&resource.remote_url, e))
        });
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let result = joined.expect("download task panicked");
        if let Err(error) = result {
            debug!("Download failed: {}", error);
            if first_error.is_none() {
                first_error = Some(error);
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
