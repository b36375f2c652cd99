//! Types for the job pipeline state machine.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::jobspec::{JobKind, JobSpec};
use crate::placer::sanitize_segment;

/// One discrete processing step in a job's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    Acquire,
    AssembleAudio,
    NormalizeAudio,
    Tag,
    PlaceAudio,
    AssembleVideo,
    NormalizeVideo,
    PlaceVideo,
}

/// Which concurrency pool a stage draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageClass {
    /// Network-bound: bounded by the fetch semaphore.
    Network,
    /// CPU/IO-bound transcode work: bounded by the transcode semaphore.
    Transcode,
    /// Cheap local work, unbounded.
    Light,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acquire => "acquire",
            Self::AssembleAudio => "assemble-audio",
            Self::NormalizeAudio => "normalize-audio",
            Self::Tag => "tag",
            Self::PlaceAudio => "place-audio",
            Self::AssembleVideo => "assemble-video",
            Self::NormalizeVideo => "normalize-video",
            Self::PlaceVideo => "place-video",
        }
    }

    /// Stages that must be Succeeded or Resumed before this one may start.
    pub fn predecessors(&self) -> &'static [StageId] {
        match self {
            Self::Acquire => &[],
            Self::AssembleAudio => &[Self::Acquire],
            Self::NormalizeAudio => &[Self::AssembleAudio],
            Self::Tag => &[Self::NormalizeAudio],
            Self::PlaceAudio => &[Self::Tag],
            Self::AssembleVideo => &[Self::Acquire],
            Self::NormalizeVideo => &[Self::AssembleVideo],
            Self::PlaceVideo => &[Self::NormalizeVideo],
        }
    }

    pub fn class(&self) -> StageClass {
        match self {
            Self::Acquire => StageClass::Network,
            Self::AssembleAudio
            | Self::NormalizeAudio
            | Self::AssembleVideo
            | Self::NormalizeVideo => StageClass::Transcode,
            Self::Tag | Self::PlaceAudio | Self::PlaceVideo => StageClass::Light,
        }
    }

    /// The ordered stage sequence for a job kind. For audio-and-video the
    /// single Acquire is shared by both subsequences.
    pub fn sequence_for(kind: JobKind) -> Vec<StageId> {
        let mut stages = vec![Self::Acquire];
        if kind.wants_audio_output() {
            stages.extend([
                Self::AssembleAudio,
                Self::NormalizeAudio,
                Self::Tag,
                Self::PlaceAudio,
            ]);
        }
        if kind.wants_video_output() {
            stages.extend([Self::AssembleVideo, Self::NormalizeVideo, Self::PlaceVideo]);
        }
        stages
    }
}

/// Why a stage was skipped instead of run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A prior run left verifiable completion evidence.
    Resumed,
    /// A predecessor failed; this stage can never run.
    DependencyFailed,
}

/// Stage lifecycle. Transitions are monotonic forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped(SkipReason),
}

/// Failure classes surfaced in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Validation,
    Transient,
    Tool,
    Placement,
    Cancelled,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transient => "transient",
            Self::Tool => "tool",
            Self::Placement => "placement",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Terminal status of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    /// Every stage was skipped from a prior run's completion evidence.
    Resumed,
    Failed {
        stage: String,
        category: FailureCategory,
    },
    Cancelled,
}

impl JobStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Resumed)
    }
}

/// A stage and its current status.
#[derive(Debug, Clone)]
pub struct StageSlot {
    pub id: StageId,
    pub status: StageStatus,
}

/// Paths produced by completed stages, by slot.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    pub source_audio: Option<PathBuf>,
    pub source_video: Option<PathBuf>,
    pub assembled_audio: Option<PathBuf>,
    pub normalized_audio: Option<PathBuf>,
    pub tagged_audio: Option<PathBuf>,
    pub assembled_video: Option<PathBuf>,
    pub normalized_video: Option<PathBuf>,
    pub placed_audio: Option<PathBuf>,
    pub placed_video: Option<PathBuf>,
}

impl ArtifactSet {
    /// Registers a stage's labeled outputs.
    pub fn apply(&mut self, stage: StageId, outputs: &BTreeMap<String, PathBuf>) {
        match stage {
            StageId::Acquire => {
                if let Some(p) = outputs.get("audio") {
                    self.source_audio = Some(p.clone());
                }
                if let Some(p) = outputs.get("video") {
                    self.source_video = Some(p.clone());
                }
            }
            StageId::AssembleAudio => self.assembled_audio = outputs.get("out").cloned(),
            StageId::NormalizeAudio => self.normalized_audio = outputs.get("out").cloned(),
            StageId::Tag => self.tagged_audio = outputs.get("out").cloned(),
            StageId::PlaceAudio => self.placed_audio = outputs.get("placed").cloned(),
            StageId::AssembleVideo => self.assembled_video = outputs.get("out").cloned(),
            StageId::NormalizeVideo => self.normalized_video = outputs.get("out").cloned(),
            StageId::PlaceVideo => self.placed_video = outputs.get("placed").cloned(),
        }
    }

    /// The input artifacts a stage consumes, used for fingerprinting and
    /// for the boundary call itself.
    pub fn inputs_for(&self, stage: StageId, spec: &JobSpec) -> Vec<PathBuf> {
        let mut inputs: Vec<PathBuf> = match stage {
            StageId::Acquire => Vec::new(),
            StageId::AssembleAudio => self.source_audio.iter().cloned().collect(),
            StageId::NormalizeAudio => self.assembled_audio.iter().cloned().collect(),
            StageId::Tag => self.normalized_audio.iter().cloned().collect(),
            StageId::PlaceAudio => self.tagged_audio.iter().cloned().collect(),
            StageId::AssembleVideo => self
                .source_video
                .iter()
                .chain(self.source_audio.iter())
                .cloned()
                .collect(),
            StageId::NormalizeVideo => self.assembled_video.iter().cloned().collect(),
            StageId::PlaceVideo => self.normalized_video.iter().cloned().collect(),
        };
        if stage == StageId::Tag {
            if let Some(cover) = &spec.cover_image {
                inputs.push(cover.clone());
            }
        }
        inputs
    }
}

/// Runtime state for one job traversing its stage sequence.
///
/// Owns its working directory exclusively until it reaches a terminal
/// state; no other run ever touches it.
#[derive(Debug)]
pub struct PipelineRun {
    pub spec: Arc<JobSpec>,
    pub stages: Vec<StageSlot>,
    pub work_dir: PathBuf,
    pub artifacts: ArtifactSet,
}

impl PipelineRun {
    /// Creates the run with its deterministic working directory, so a
    /// rerun of the same job finds its completion markers.
    pub fn new(spec: Arc<JobSpec>, work_root: &Path) -> Self {
        let digest = Sha256::digest(
            format!("{}|{}", spec.source_locator, spec.kind.as_str()).as_bytes(),
        );
        let short: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
        let work_dir = work_root.join(format!("{short}-{}", sanitize_segment(&spec.track_title)));

        let stages = StageId::sequence_for(spec.kind)
            .into_iter()
            .map(|id| StageSlot {
                id,
                status: StageStatus::Pending,
            })
            .collect();

        Self {
            spec,
            stages,
            work_dir,
            artifacts: ArtifactSet::default(),
        }
    }

    pub fn job_id(&self) -> String {
        format!("job-{}-{}", self.spec.index, self.spec.kind.as_str())
    }

    pub fn status_of(&self, stage: StageId) -> Option<StageStatus> {
        self.stages.iter().find(|s| s.id == stage).map(|s| s.status)
    }

    pub fn set_status(&mut self, stage: StageId, status: StageStatus) {
        if let Some(slot) = self.stages.iter_mut().find(|s| s.id == stage) {
            slot.status = status;
        }
    }

    /// A stage may start only when every declared predecessor in this
    /// run's sequence is Succeeded or Resumed.
    pub fn predecessors_ok(&self, stage: StageId) -> bool {
        stage.predecessors().iter().all(|pred| {
            match self.status_of(*pred) {
                Some(StageStatus::Succeeded) | Some(StageStatus::Skipped(SkipReason::Resumed)) => {
                    true
                }
                // Predecessor not part of this kind's sequence
                None => true,
                _ => false,
            }
        })
    }

    pub fn all_resumed(&self) -> bool {
        self.stages
            .iter()
            .all(|s| s.status == StageStatus::Skipped(SkipReason::Resumed))
    }
}
