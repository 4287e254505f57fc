// ============================================================
// Layer 6 — Dataset Fetcher
// ============================================================
// Downloads the English–French Anki export from manythings.org
// and extracts the tab-separated `fra.txt` it contains.
//
//   fra-eng.zip
//     ├── _about.txt
//     └── fra.txt      ← the only member we keep
//
// The site rejects requests without a User-Agent header.

use anyhow::{bail, Context, Result};
use std::{
    fs,
    io::{self, Cursor},
    path::{Path, PathBuf},
};

pub const DATASET_URL: &str = "http://www.manythings.org/anki/fra-eng.zip";
pub const DATASET_MEMBER: &str = "fra.txt";

pub struct DatasetFetcher {
    url:    String,
    client: reqwest::blocking::Client,
}

impl DatasetFetcher {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("mt-compare/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { url: url.into(), client })
    }

    /// Download the archive and write `fra.txt` into `dest_dir`.
    /// Does nothing when the file is already there, unless `force`.
    pub fn fetch(&self, dest_dir: &Path, force: bool) -> Result<PathBuf> {
        let target = dest_dir.join(DATASET_MEMBER);
        if target.exists() && !force {
            tracing::info!("'{}' already exists, skipping download", target.display());
            return Ok(target);
        }

        tracing::info!("Downloading {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .with_context(|| format!("Request to '{}' failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Download of '{}' returned {status}", self.url);
        }
        let bytes = response.bytes().context("Failed to read response body")?;
        tracing::info!("Downloaded {} bytes", bytes.len());

        extract_member(&bytes, DATASET_MEMBER, dest_dir)
    }
}

/// Extract one member of an in-memory zip archive into `dest_dir`.
pub fn extract_member(archive: &[u8], member: &str, dest_dir: &Path) -> Result<PathBuf> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive))
        .context("Downloaded file is not a valid zip archive")?;
    let mut entry = archive
        .by_name(member)
        .with_context(|| format!("Archive has no '{member}' entry"))?;

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Cannot create '{}'", dest_dir.display()))?;
    let target = dest_dir.join(member);
    let mut out = fs::File::create(&target)
        .with_context(|| format!("Cannot create '{}'", target.display()))?;
    let written = io::copy(&mut entry, &mut out)?;

    tracing::info!("Extracted {} ({} bytes) to '{}'", member, written, target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn archive_with(members: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in members {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extracts_only_the_requested_member() {
        let dir   = tempfile::tempdir().unwrap();
        let bytes = archive_with(&[("_about.txt", "about"), ("fra.txt", "Go.\tVa !\tCC-BY\n")]);

        let path = extract_member(&bytes, DATASET_MEMBER, dir.path()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "Go.\tVa !\tCC-BY\n");
        assert!(!dir.path().join("_about.txt").exists());
    }

    #[test]
    fn test_missing_member_is_an_error() {
        let dir   = tempfile::tempdir().unwrap();
        let bytes = archive_with(&[("_about.txt", "about")]);
        assert!(extract_member(&bytes, DATASET_MEMBER, dir.path()).is_err());
    }

    #[test]
    fn test_existing_file_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DATASET_MEMBER), "cached").unwrap();

        // Unroutable URL: reaching the network would fail the test.
        let fetcher = DatasetFetcher::new("http://127.0.0.1:9/none.zip").unwrap();
        let path    = fetcher.fetch(dir.path(), false).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "cached");
    }
}
