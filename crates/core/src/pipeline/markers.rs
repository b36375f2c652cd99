//! Completion markers: the resumption contract.
//!
//! After a stage succeeds, a marker file is written under the job's
//! working directory recording the stage, a fingerprint of its inputs,
//! and its output paths. A later run skips the stage when the marker's
//! fingerprint still matches and every recorded output exists non-empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::types::StageId;

const MARKER_DIR: &str = "markers";

/// Evidence that a stage completed, with enough detail to trust its
/// outputs on a later run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionMarker {
    pub stage: String,
    pub fingerprint: String,
    pub outputs: BTreeMap<String, PathBuf>,
    pub completed_at: DateTime<Utc>,
}

pub fn marker_path(work_dir: &Path, stage: StageId) -> PathBuf {
    work_dir.join(MARKER_DIR).join(format!("{}.json", stage.as_str()))
}

/// Content fingerprint of a stage's declared inputs: the stage id, the
/// source locator, and each input's path and byte size. A missing input
/// hashes as size zero and so never matches a marker written when the
/// input existed.
pub async fn fingerprint(stage: StageId, locator: &str, inputs: &[PathBuf]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(stage.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(locator.as_bytes());
    for path in inputs {
        let size = tokio::fs::metadata(path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        hasher.update(b"|");
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(size.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Loads a stage's marker if one exists and parses cleanly.
pub async fn load(work_dir: &Path, stage: StageId) -> Option<CompletionMarker> {
    let raw = tokio::fs::read_to_string(marker_path(work_dir, stage))
        .await
        .ok()?;
    serde_json::from_str(&raw).ok()
}

/// Writes a stage's marker.
pub async fn store(
    work_dir: &Path,
    stage: StageId,
    fingerprint: String,
    outputs: BTreeMap<String, PathBuf>,
) -> std::io::Result<()> {
    let marker = CompletionMarker {
        stage: stage.as_str().to_string(),
        fingerprint,
        outputs,
        completed_at: Utc::now(),
    };
    let path = marker_path(work_dir, stage);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(&marker).expect("marker always serializes");
    tokio::fs::write(path, json).await
}

/// Whether every recorded output still exists and is non-empty.
pub async fn outputs_intact(marker: &CompletionMarker) -> bool {
    for path in marker.outputs.values() {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.len() > 0 => {}
            _ => return false,
        }
    }
    !marker.outputs.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_then_load_roundtrip() {
        let work = TempDir::new().unwrap();
        let mut outputs = BTreeMap::new();
        outputs.insert("out".to_string(), work.path().join("assembled.mp3"));

        store(
            work.path(),
            StageId::AssembleAudio,
            "fp-1".to_string(),
            outputs.clone(),
        )
        .await
        .unwrap();

        let marker = load(work.path(), StageId::AssembleAudio).await.unwrap();
        assert_eq!(marker.stage, "assemble-audio");
        assert_eq!(marker.fingerprint, "fp-1");
        assert_eq!(marker.outputs, outputs);
    }

    #[tokio::test]
    async fn test_load_missing_marker() {
        let work = TempDir::new().unwrap();
        assert!(load(work.path(), StageId::Acquire).await.is_none());
    }

    #[tokio::test]
    async fn test_fingerprint_tracks_input_size() {
        let work = TempDir::new().unwrap();
        let input = work.path().join("in.dat");
        tokio::fs::write(&input, b"12345").await.unwrap();

        let before = fingerprint(StageId::NormalizeAudio, "loc", &[input.clone()]).await;
        tokio::fs::write(&input, b"123456789").await.unwrap();
        let after = fingerprint(StageId::NormalizeAudio, "loc", &[input.clone()]).await;
        assert_ne!(before, after);

        let again = fingerprint(StageId::NormalizeAudio, "loc", &[input]).await;
        assert_eq!(after, again);
    }

    #[tokio::test]
    async fn test_fingerprint_differs_per_stage_and_locator() {
        let a = fingerprint(StageId::Acquire, "loc-1", &[]).await;
        let b = fingerprint(StageId::Acquire, "loc-2", &[]).await;
        let c = fingerprint(StageId::AssembleAudio, "loc-1", &[]).await;
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_outputs_intact_rejects_empty_and_missing() {
        let work = TempDir::new().unwrap();
        let good = work.path().join("good.mp3");
        let empty = work.path().join("empty.mp3");
        tokio::fs::write(&good, b"data").await.unwrap();
        tokio::fs::write(&empty, b"").await.unwrap();

        let marker = |paths: Vec<(&str, PathBuf)>| CompletionMarker {
            stage: "acquire".to_string(),
            fingerprint: "fp".to_string(),
            outputs: paths
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            completed_at: Utc::now(),
        };

        assert!(outputs_intact(&marker(vec![("out", good.clone())])).await);
        assert!(!outputs_intact(&marker(vec![("out", empty)])).await);
        assert!(!outputs_intact(&marker(vec![("out", work.path().join("gone"))])).await);
        assert!(!outputs_intact(&marker(vec![])).await);
    }
}
