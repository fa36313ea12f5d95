use camino::Utf8Path;
use tokio::{fs::File, io::AsyncWriteExt};
use tokio_stream::StreamExt;

use crate::planobs_errors::PlanobsError;

/// Stream a remote file to disk chunk by chunk.
///
/// The data is first written next to `path` with a `.part` suffix and renamed once complete,
/// so that an interrupted download never leaves a truncated grid in the cache.
///
/// Arguments
/// ---------
/// * `url`: the URL of the file to download
/// * `path`: the destination path
async fn download_file(url: &str, path: &Utf8Path) -> Result<(), PlanobsError> {
    let partial = path.with_extension("part");
    let mut file = File::create(&partial).await?;
    log::info!("Downloading {url}...");

    let response = reqwest::get(url).await?.error_for_status()?;
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    tokio::fs::rename(&partial, path).await?;

    log::info!("Downloaded {url} to {path}");
    Ok(())
}

/// Download the ZTF field grid file.
///
/// Blocking wrapper around the async download, running on a dedicated tokio runtime.
///
/// Arguments
/// ---------
/// * `url`: location of `ZTF_Fields.txt`
/// * `path`: destination path, its parent directory must exist
pub fn download_field_grid(url: &str, path: &Utf8Path) -> Result<(), PlanobsError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(download_file(url, path))
}

#[cfg(test)]
mod download_test {
    use super::*;
    use crate::config::FieldsConfig;
    use crate::fields::grid::FieldGrid;

    #[test]
    #[ignore = "requires network access"]
    fn test_download_field_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("ZTF_Fields.txt")).unwrap();

        download_field_grid(&FieldsConfig::default().grid_url, &path).unwrap();

        let grid = FieldGrid::from_path(&path).unwrap();
        assert!(grid.len() > 1000);
        assert!(grid.get(593).is_some());
    }
}
