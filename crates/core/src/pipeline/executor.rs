//! Stage executor: one boundary call per stage.
//!
//! A stage consumes known input artifacts, invokes exactly one external
//! collaborator, and produces labeled output artifacts inside the run's
//! working directory. Stages never talk to each other directly; the
//! pipeline driver threads artifacts between them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::converter::{Converter, MuxJob, NormalizeJob, NormalizeKind, TranscodeJob};
use crate::fetcher::{FetchRequest, Fetcher};
use crate::jobspec::JobSpec;
use crate::placer::{PlacementRequest, Placer};
use crate::tagger::{TagJob, Tagger, TrackTags};

use super::error::StageError;
use super::types::{ArtifactSet, StageId};

/// Holds the collaborators and dispatches one stage call at a time.
pub struct StageExecutor {
    fetcher: Arc<dyn Fetcher>,
    converter: Arc<dyn Converter>,
    tagger: Arc<dyn Tagger>,
    placer: Arc<dyn Placer>,
}

impl StageExecutor {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        converter: Arc<dyn Converter>,
        tagger: Arc<dyn Tagger>,
        placer: Arc<dyn Placer>,
    ) -> Self {
        Self {
            fetcher,
            converter,
            tagger,
            placer,
        }
    }

    /// Runs one stage for one job and returns its labeled outputs.
    pub async fn execute(
        &self,
        stage: StageId,
        job_id: &str,
        spec: &JobSpec,
        artifacts: &ArtifactSet,
        work_dir: &Path,
        overwrite: bool,
    ) -> Result<BTreeMap<String, PathBuf>, StageError> {
        match stage {
            StageId::Acquire => {
                let result = self
                    .fetcher
                    .fetch(FetchRequest {
                        job_id: job_id.to_string(),
                        locator: spec.source_locator.clone(),
                        // audio is always needed: audio outputs transcode
                        // it, video outputs mux it
                        want_audio: true,
                        want_video: spec.kind.wants_video_output(),
                        dest_dir: work_dir.to_path_buf(),
                    })
                    .await?;

                let mut outputs = BTreeMap::new();
                if let Some(path) = result.audio_path {
                    outputs.insert("audio".to_string(), path);
                }
                if let Some(path) = result.video_path {
                    outputs.insert("video".to_string(), path);
                }
                Ok(outputs)
            }

            StageId::AssembleAudio => {
                let input = require(&artifacts.source_audio, "source audio stream")?;
                let output = self
                    .converter
                    .transcode_audio(TranscodeJob {
                        job_id: job_id.to_string(),
                        input_path: input,
                        output_path: work_dir.join("assembled.mp3"),
                    })
                    .await?;
                Ok(single("out", output.path))
            }

            StageId::NormalizeAudio => {
                let input = require(&artifacts.assembled_audio, "assembled audio")?;
                let output = self
                    .converter
                    .normalize(NormalizeJob {
                        job_id: job_id.to_string(),
                        input_path: input,
                        output_path: work_dir.join("normalized.mp3"),
                        kind: NormalizeKind::Audio,
                    })
                    .await?;
                Ok(single("out", output.path))
            }

            StageId::Tag => {
                let input = require(&artifacts.normalized_audio, "normalized audio")?;
                let tagged = self
                    .tagger
                    .tag(TagJob {
                        job_id: job_id.to_string(),
                        input_path: input,
                        output_path: work_dir.join("tagged.mp3"),
                        tags: TrackTags::from_spec(spec),
                        cover_image: spec.cover_image.clone(),
                    })
                    .await?;
                Ok(single("out", tagged))
            }

            StageId::PlaceAudio => {
                let artifact = require(&artifacts.tagged_audio, "tagged audio")?;
                let placement = self.place(job_id, spec, artifact, overwrite).await?;
                Ok(single("placed", placement))
            }

            StageId::AssembleVideo => {
                let video = require(&artifacts.source_video, "source video stream")?;
                let audio = require(&artifacts.source_audio, "source audio stream")?;
                let output = self
                    .converter
                    .mux(MuxJob {
                        job_id: job_id.to_string(),
                        video_path: video,
                        audio_path: audio,
                        output_path: work_dir.join("assembled.mkv"),
                    })
                    .await?;
                Ok(single("out", output.path))
            }

            StageId::NormalizeVideo => {
                let input = require(&artifacts.assembled_video, "assembled video")?;
                let output = self
                    .converter
                    .normalize(NormalizeJob {
                        job_id: job_id.to_string(),
                        input_path: input,
                        output_path: work_dir.join("normalized.mkv"),
                        kind: NormalizeKind::Video,
                    })
                    .await?;
                Ok(single("out", output.path))
            }

            StageId::PlaceVideo => {
                let artifact = require(&artifacts.normalized_video, "normalized video")?;
                let placement = self.place(job_id, spec, artifact, overwrite).await?;
                Ok(single("placed", placement))
            }
        }
    }

    async fn place(
        &self,
        job_id: &str,
        spec: &JobSpec,
        artifact: PathBuf,
        overwrite: bool,
    ) -> Result<PathBuf, StageError> {
        let placement = self
            .placer
            .place(PlacementRequest {
                job_id: job_id.to_string(),
                artifact,
                album_artist: spec.album_artist.clone(),
                album_name: spec.album_name.clone(),
                track_title: spec.track_title.clone(),
                overwrite,
            })
            .await?;
        Ok(placement.destination)
    }
}

fn require(path: &Option<PathBuf>, what: &str) -> Result<PathBuf, StageError> {
    path.clone().ok_or_else(|| StageError::MissingArtifact {
        what: what.to_string(),
    })
}

fn single(label: &str, path: PathBuf) -> BTreeMap<String, PathBuf> {
    let mut outputs = BTreeMap::new();
    outputs.insert(label.to_string(), path);
    outputs
}
