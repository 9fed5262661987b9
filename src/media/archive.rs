//! Zip archive creation and extraction.

use crate::error::{MediabotError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Archive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveOperation {
    Create,
    Extract,
}

/// What ended up in a newly created archive.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub added: Vec<String>,
    pub skipped: Vec<PathBuf>,
}

/// Zip every existing file in `files` into `output`, flattened to basenames.
///
/// Inputs that do not exist are skipped; the archive is still written. When
/// two inputs share a basename the later one wins and the earlier one is
/// reported as skipped.
#[instrument(skip(files), fields(count = files.len()))]
pub async fn create(files: Vec<PathBuf>, output: PathBuf) -> Result<ArchiveSummary> {
    tokio::task::spawn_blocking(move || create_blocking(&files, &output))
        .await
        .map_err(|e| MediabotError::external("Archive", e.to_string()))?
}

/// Unpack all of `archive` into `output_dir`.
#[instrument]
pub async fn extract(archive: PathBuf, output_dir: PathBuf) -> Result<usize> {
    tokio::task::spawn_blocking(move || extract_blocking(&archive, &output_dir))
        .await
        .map_err(|e| MediabotError::external("Archive", e.to_string()))?
}

/// Entry name for `path` inside the archive.
fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Existing inputs keyed by entry name, in first-seen order, plus the
/// inputs left out.
fn plan_entries(files: &[PathBuf]) -> (Vec<(String, PathBuf)>, Vec<PathBuf>) {
    let mut entries: Vec<(String, PathBuf)> = Vec::new();
    let mut skipped = Vec::new();

    for path in files {
        if !path.is_file() {
            debug!("Skipping missing input {:?}", path);
            skipped.push(path.clone());
            continue;
        }
        let name = entry_name(path);
        match entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => {
                debug!("{:?} replaces {:?} as {}", path, entry.1, name);
                skipped.push(std::mem::replace(&mut entry.1, path.clone()));
            }
            None => entries.push((name, path.clone())),
        }
    }

    (entries, skipped)
}

fn create_blocking(files: &[PathBuf], output: &Path) -> Result<ArchiveSummary> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let (entries, skipped) = plan_entries(files);

    write_or_remove(&entries, output)?;

    let added: Vec<String> = entries.into_iter().map(|(name, _)| name).collect();
    info!("Archived {} file(s), skipped {}", added.len(), skipped.len());

    Ok(ArchiveSummary {
        path: output.to_path_buf(),
        added,
        skipped,
    })
}

/// Write the archive, removing the partial file if anything fails.
fn write_or_remove(entries: &[(String, PathBuf)], output: &Path) -> Result<()> {
    let result = write_archive(entries, output);
    if result.is_err() && output.exists() {
        let _ = std::fs::remove_file(output);
    }
    result
}

fn write_archive(entries: &[(String, PathBuf)], output: &Path) -> Result<()> {
    let mut writer = ZipWriter::new(BufWriter::new(File::create(output)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in entries {
        writer.start_file(name.as_str(), options)?;
        let mut input = File::open(path)?;
        std::io::copy(&mut input, &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}

fn extract_blocking(archive: &Path, output_dir: &Path) -> Result<usize> {
    if !archive.is_file() {
        return Err(MediabotError::FileNotFound(archive.display().to_string()));
    }
    std::fs::create_dir_all(output_dir)?;

    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let count = zip.len();
    zip.extract(output_dir)?;
    info!("Extracted {} entries into {:?}", count, output_dir);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_skips_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        std::fs::write(&present, b"hello").unwrap();
        let missing = dir.path().join("missing.txt");
        let output = dir.path().join("out.zip");

        let summary = create(vec![missing.clone(), present], output.clone())
            .await
            .unwrap();

        assert_eq!(summary.added, vec!["present.txt".to_string()]);
        assert_eq!(summary.skipped, vec![missing]);

        let zip = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        assert_eq!(zip.file_names().collect::<Vec<_>>(), vec!["present.txt"]);
    }

    #[tokio::test]
    async fn test_shared_basename_keeps_last_input() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("downloads").join("video.mp4");
        let second = dir.path().join("uploads").join("video.mp4");
        for (path, body) in [(&first, "old"), (&second, "new")] {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, body).unwrap();
        }
        let output = dir.path().join("out.zip");

        let summary = create(vec![first.clone(), second], output.clone())
            .await
            .unwrap();

        assert_eq!(summary.added, vec!["video.mp4".to_string()]);
        assert_eq!(summary.skipped, vec![first]);

        let out = dir.path().join("unpacked");
        assert_eq!(extract(output, out.clone()).await.unwrap(), 1);
        assert_eq!(std::fs::read_to_string(out.join("video.mp4")).unwrap(), "new");
    }

    #[test]
    fn test_failed_create_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.zip");
        // Reading a directory as the entry body fails mid-write.
        let entries = vec![("x".to_string(), dir.path().to_path_buf())];

        assert!(write_or_remove(&entries, &output).is_err());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_extract_unpacks_everything() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, b"alpha").unwrap();
        std::fs::write(&b, b"beta").unwrap();
        let archive = dir.path().join("both.zip");
        create(vec![a, b], archive.clone()).await.unwrap();

        let out = dir.path().join("unpacked");
        let count = extract(archive, out.clone()).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(std::fs::read_to_string(out.join("a.txt")).unwrap(), "alpha");
        assert_eq!(std::fs::read_to_string(out.join("b.txt")).unwrap(), "beta");
    }

    #[tokio::test]
    async fn test_extract_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract(dir.path().join("none.zip"), dir.path().to_path_buf())
            .await
            .unwrap_err();
        assert!(matches!(err, MediabotError::FileNotFound(_)));
    }
}
