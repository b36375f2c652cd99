//! File system placer implementation.

use async_trait::async_trait;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};

use super::config::PlacerConfig;
use super::error::PlacerError;
use super::traits::Placer;
use super::types::{destination_dir, sanitize_segment, Placement, PlacementRequest};

/// File system based placer implementation.
pub struct FsPlacer {
    config: PlacerConfig,
}

impl FsPlacer {
    /// Creates a new file system placer with the given configuration.
    pub fn new(config: PlacerConfig) -> Self {
        Self { config }
    }

    /// Attempts to move a file atomically (rename).
    ///
    /// Returns `Ok(false)` when source and destination live on different
    /// filesystems and the rename cannot be atomic.
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // Cross-filesystem moves fail with EXDEV (18 on Linux)
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Copies the artifact next to the destination, then renames it into
    /// place so the destination never holds a partial file.
    async fn copy_then_rename(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(), PlacerError> {
        let parent = destination
            .parent()
            .expect("destination always has a parent directory");
        let staging = parent.join(format!(".presley-{}.part", uuid::Uuid::new_v4()));

        let result = self.copy_file(source, &staging).await;
        if let Err(e) = result {
            let _ = fs::remove_file(&staging).await;
            return Err(e);
        }

        fs::rename(&staging, destination).await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let _ = fs::remove_file(source).await;
        Ok(())
    }

    async fn copy_file(&self, source: &Path, destination: &Path) -> Result<(), PlacerError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacerError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                PlacerError::Io(e)
            }
        })?;

        let dest_file = File::create(destination).await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;
            if bytes_read == 0 {
                break;
            }
            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;
        }

        writer.flush().await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        Ok(())
    }
}

#[async_trait]
impl Placer for FsPlacer {
    fn name(&self) -> &str {
        "fs"
    }

    async fn place(&self, request: PlacementRequest) -> Result<Placement, PlacerError> {
        if !request.artifact.exists() {
            return Err(PlacerError::SourceNotFound {
                path: request.artifact.clone(),
            });
        }

        let dest_dir = destination_dir(
            &self.config.output_root,
            &request.album_artist,
            &request.album_name,
            &request.track_title,
        );
        fs::create_dir_all(&dest_dir)
            .await
            .map_err(|e| PlacerError::DirectoryCreationFailed {
                path: dest_dir.clone(),
                source: e,
            })?;

        let extension = request
            .artifact
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "bin".to_string());
        let destination = dest_dir.join(format!(
            "{}.{}",
            sanitize_segment(&request.track_title),
            extension
        ));

        if destination.exists() && !request.overwrite {
            return Err(PlacerError::DestinationExists { path: destination });
        }

        // rename replaces an existing destination in one atomic step
        if !Self::try_atomic_move(&request.artifact, &destination).await? {
            self.copy_then_rename(&request.artifact, &destination)
                .await?;
        }

        let size_bytes = fs::metadata(&destination).await?.len();
        tracing::info!(
            job_id = %request.job_id,
            destination = %destination.display(),
            size_bytes,
            "placed artifact"
        );

        Ok(Placement {
            destination,
            size_bytes,
        })
    }

    async fn validate(&self) -> Result<(), PlacerError> {
        fs::create_dir_all(&self.config.output_root)
            .await
            .map_err(|e| PlacerError::DirectoryCreationFailed {
                path: self.config.output_root.clone(),
                source: e,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn placer_into(root: &Path) -> FsPlacer {
        FsPlacer::new(PlacerConfig {
            output_root: root.to_path_buf(),
            ..Default::default()
        })
    }

    fn request(artifact: PathBuf, overwrite: bool) -> PlacementRequest {
        PlacementRequest {
            job_id: "job-1".to_string(),
            artifact,
            album_artist: "Queen Singer".to_string(),
            album_name: "Immortal Songs".to_string(),
            track_title: "Every Night".to_string(),
            overwrite,
        }
    }

    #[tokio::test]
    async fn test_place_builds_deterministic_path() {
        let work = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let artifact = work.path().join("tagged.mp3");
        fs::write(&artifact, b"pressed").await.unwrap();

        let placement = placer_into(out.path())
            .place(request(artifact.clone(), false))
            .await
            .unwrap();

        let expected = out
            .path()
            .join("Queen Singer/Immortal Songs/Every Night/Every Night.mp3");
        assert_eq!(placement.destination, expected);
        assert!(expected.exists());
        assert!(!artifact.exists(), "artifact is moved, not copied");
    }

    #[tokio::test]
    async fn test_collision_fails_and_keeps_existing() {
        let work = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let artifact = work.path().join("tagged.mp3");
        fs::write(&artifact, b"new take").await.unwrap();

        let existing = out
            .path()
            .join("Queen Singer/Immortal Songs/Every Night/Every Night.mp3");
        fs::create_dir_all(existing.parent().unwrap()).await.unwrap();
        fs::write(&existing, b"first pressing").await.unwrap();

        let result = placer_into(out.path())
            .place(request(artifact, false))
            .await;
        assert!(matches!(result, Err(PlacerError::DestinationExists { .. })));

        let content = fs::read(&existing).await.unwrap();
        assert_eq!(content, b"first pressing");
    }

    #[tokio::test]
    async fn test_overwrite_replaces_atomically() {
        let work = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let artifact = work.path().join("tagged.mp3");
        fs::write(&artifact, b"second take").await.unwrap();

        let existing = out
            .path()
            .join("Queen Singer/Immortal Songs/Every Night/Every Night.mp3");
        fs::create_dir_all(existing.parent().unwrap()).await.unwrap();
        fs::write(&existing, b"first take").await.unwrap();

        let placement = placer_into(out.path())
            .place(request(artifact, true))
            .await
            .unwrap();

        let content = fs::read(&placement.destination).await.unwrap();
        assert_eq!(content, b"second take");
    }

    #[tokio::test]
    async fn test_missing_artifact() {
        let out = TempDir::new().unwrap();
        let result = placer_into(out.path())
            .place(request(PathBuf::from("/nope/gone.mp3"), false))
            .await;
        assert!(matches!(result, Err(PlacerError::SourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_reserved_characters_sanitized_in_path() {
        let work = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let artifact = work.path().join("tagged.mp3");
        fs::write(&artifact, b"x").await.unwrap();

        let mut req = request(artifact, false);
        req.album_artist = "AC/DC".to_string();
        req.track_title = "Back?".to_string();

        let placement = placer_into(out.path()).place(req).await.unwrap();
        assert!(placement
            .destination
            .to_string_lossy()
            .contains("AC_DC/Immortal Songs/Back_/Back_.mp3"));
    }
}
