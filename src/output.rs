//! Materializes the output directory before a run.
//!
//! [`prepare_output`] leaves the output directory existing, emptied, and holding
//! a recursive copy of the static asset directory.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Empty `output_dir` (creating it if needed) and copy `static_dir` into it.
///
/// The two directories must not contain each other: emptying the output would
/// otherwise destroy the sources, or the copy would recurse into itself.
#[tracing::instrument(fields(output = %output_dir.display(), source = %static_dir.display()))]
pub async fn prepare_output(output_dir: &Path, static_dir: &Path) -> Result<()> {
    let metadata = fs::metadata(static_dir).await.map_err(|e| {
        Error::OutputPreparation(format!(
            "static directory {} is not readable: {}",
            static_dir.display(),
            e
        ))
    })?;
    if !metadata.is_dir() {
        return Err(Error::OutputPreparation(format!(
            "static path {} is not a directory",
            static_dir.display()
        )));
    }

    let output =
        std::path::absolute(output_dir).map_err(|e| io_error("resolve", output_dir, e))?;
    let source =
        std::path::absolute(static_dir).map_err(|e| io_error("resolve", static_dir, e))?;
    if output.starts_with(&source) || source.starts_with(&output) {
        return Err(Error::OutputPreparation(format!(
            "output directory {} and static directory {} overlap",
            output.display(),
            source.display()
        )));
    }

    fs::create_dir_all(&output)
        .await
        .map_err(|e| io_error("create", &output, e))?;

    empty_dir(&output).await?;
    let copied = copy_dir_contents(&source, &output).await?;

    tracing::info!(files = copied, "Output directory prepared");
    Ok(())
}

/// Remove everything inside `dir`, keeping the directory itself.
async fn empty_dir(dir: &Path) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| io_error("read", dir, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| io_error("read", dir, e))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| io_error("inspect", &path, e))?;

        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        removed.map_err(|e| io_error("remove", &path, e))?;
    }

    Ok(())
}

/// Copy the contents of `from` into the existing directory `to`.
///
/// Symlinks are followed and their targets copied. Returns the number of files
/// written.
async fn copy_dir_contents(from: &Path, to: &Path) -> Result<usize> {
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(from.to_path_buf(), to.to_path_buf())];
    let mut copied = 0;

    while let Some((src_dir, dst_dir)) = pending.pop() {
        let mut entries = fs::read_dir(&src_dir)
            .await
            .map_err(|e| io_error("read", &src_dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("read", &src_dir, e))?
        {
            let src = entry.path();
            let dst = dst_dir.join(entry.file_name());
            let metadata = fs::metadata(&src)
                .await
                .map_err(|e| io_error("inspect", &src, e))?;

            if metadata.is_dir() {
                fs::create_dir_all(&dst)
                    .await
                    .map_err(|e| io_error("create", &dst, e))?;
                pending.push((src, dst));
            } else {
                fs::copy(&src, &dst)
                    .await
                    .map_err(|e| io_error("copy", &src, e))?;
                tracing::trace!(file = %src.display(), "Copied static asset");
                copied += 1;
            }
        }
    }

    Ok(copied)
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> Error {
    Error::OutputPreparation(format!("failed to {} {}: {}", action, path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overlapping_directories_are_rejected() {
        let root = tempfile::tempdir().unwrap();
        let static_dir = root.path().join("www");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("app.js"), "console.log(1)").unwrap();

        let result = prepare_output(&static_dir.join("out"), &static_dir).await;
        assert!(matches!(result, Err(Error::OutputPreparation(_))));
        assert!(!static_dir.join("out").exists());

        let result = prepare_output(root.path(), &static_dir).await;
        assert!(matches!(result, Err(Error::OutputPreparation(_))));
        assert!(static_dir.join("app.js").exists());
    }

    #[tokio::test]
    async fn test_missing_static_dir_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("out");

        let result = prepare_output(&output, &root.path().join("missing")).await;
        assert!(matches!(result, Err(Error::OutputPreparation(_))));
        assert!(!output.exists());
    }
}
