//! Download and unpack the MovieLens archive.
//!
//! The dataset is published as a zip file. Fetching is idempotent: when the
//! destination directory already has contents nothing is downloaded.

use crate::error::{DataLoadError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Where the small MovieLens release is published
pub const DEFAULT_DATASET_URL: &str =
    "https://files.grouplens.org/datasets/movielens/ml-latest-small.zip";

/// Download `src_url` and extract it into `dest_dir` unless `dest_dir` is
/// already populated.
///
/// The archive is downloaded and unpacked in a staging directory next to
/// `dest_dir`, which is only moved into place once extraction succeeded. A
/// failed fetch leaves `dest_dir` as it was, so the next call retries.
/// Returns `true` when a download happened and `false` when the call was a
/// no-op.
///
/// Uses the blocking reqwest client; call it from `spawn_blocking` inside an
/// async runtime.
pub fn download_and_extract(src_url: &str, dest_dir: &Path) -> Result<bool> {
    if is_populated(dest_dir)? {
        info!("{} already has contents, skipping download", dest_dir.display());
        return Ok(false);
    }

    let parent = match dest_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    // Removed on drop, so every error below cleans up after itself
    let staging = tempfile::Builder::new()
        .prefix(".download-")
        .tempdir_in(parent)?;

    let archive_path = staging.path().join(archive_file_name(src_url));
    info!("Downloading {} to {}", src_url, archive_path.display());
    download(src_url, &archive_path)?;

    let extracted = staging.path().join("extracted");
    extract_archive(&archive_path, &extracted)?;

    if dest_dir.is_dir() {
        // Empty, or `is_populated` would have returned early
        fs::remove_dir(dest_dir)?;
    }
    fs::rename(&extracted, dest_dir)?;
    debug!("Moved extracted dataset into {}", dest_dir.display());
    Ok(true)
}

/// Extract every entry of a zip archive into `dest_dir`
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    info!(
        "Extracting {} entries from {} into {}",
        archive.len(),
        archive_path.display(),
        dest_dir.display()
    );
    archive.extract(dest_dir)?;
    Ok(())
}

fn download(src_url: &str, dest: &Path) -> Result<()> {
    let to_error = |source| DataLoadError::DownloadError {
        url: src_url.to_string(),
        source,
    };

    let bytes = reqwest::blocking::get(src_url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .map_err(to_error)?;

    let mut file = File::create(dest)?;
    file.write_all(&bytes)?;
    Ok(())
}

fn is_populated(dir: &Path) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    Ok(fs::read_dir(dir)?.next().is_some())
}

/// Last path segment of the URL, e.g. `ml-latest-small.zip`
fn archive_file_name(src_url: &str) -> &str {
    match src_url.rfind('/') {
        Some(idx) if idx + 1 < src_url.len() => &src_url[idx + 1..],
        _ => "dataset.zip",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, contents) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// Serve `body` once over HTTP on a local port, returning the base URL
    fn serve_once(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });
        format!("http://{}", addr)
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_archive_file_name() {
        assert_eq!(archive_file_name(DEFAULT_DATASET_URL), "ml-latest-small.zip");
        assert_eq!(archive_file_name("http://example.com/"), "dataset.zip");
    }

    #[test]
    fn test_populated_destination_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("marker"), "x").unwrap();

        // An unroutable URL proves no request is made
        let downloaded = download_and_extract("http://127.0.0.1:9/none.zip", dir.path()).unwrap();
        assert!(!downloaded);
        assert_eq!(entries(dir.path()), vec!["marker"]);
    }

    #[test]
    fn test_failed_download_leaves_destination_untouched() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("data");
        fs::create_dir(&dest).unwrap();
        let url = "http://127.0.0.1:9/ml-latest-small.zip";

        let first = download_and_extract(url, &dest);
        assert!(matches!(first, Err(DataLoadError::DownloadError { .. })));
        assert!(entries(&dest).is_empty());
        assert_eq!(entries(dir.path()), vec!["data"]);

        // Still empty, so the retry downloads again instead of skipping
        let second = download_and_extract(url, &dest);
        assert!(matches!(second, Err(DataLoadError::DownloadError { .. })));
        assert!(entries(&dest).is_empty());
    }

    #[test]
    fn test_download_and_extract_into_new_directory() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("data");
        let body = zip_bytes(&[("ml-latest-small/movies.csv", "movieId,title,genres\n")]);
        let url = format!("{}/ml-latest-small.zip", serve_once(body));

        assert!(download_and_extract(&url, &dest).unwrap());
        assert_eq!(entries(&dest), vec!["ml-latest-small"]);
        assert_eq!(
            fs::read_to_string(dest.join("ml-latest-small/movies.csv")).unwrap(),
            "movieId,title,genres\n"
        );
        // No staging directory is left behind
        assert_eq!(entries(dir.path()), vec!["data"]);

        // The server is gone; a populated destination must not need it
        assert!(!download_and_extract(&url, &dest).unwrap());
    }

    #[test]
    fn test_extract_archive() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("ml.zip");
        fs::write(
            &archive_path,
            zip_bytes(&[("ml-latest-small/movies.csv", "movieId,title,genres\n")]),
        )
        .unwrap();

        let dest = dir.path().join("data");
        extract_archive(&archive_path, &dest).unwrap();

        let contents = fs::read_to_string(dest.join("ml-latest-small/movies.csv")).unwrap();
        assert_eq!(contents, "movieId,title,genres\n");
    }
}
