// Domain models - Core types and data structures

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::errors::{ErrorKind, InvalidTransition, PipelineError};

/// Opaque unique token for one job; namespaces every file the job creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Frame rate as a rational number, e.g. 30000/1001
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    /// Create a new frame rate; both terms must be non-zero
    pub fn new(num: u32, den: u32) -> Result<Self, PipelineError> {
        if num == 0 || den == 0 {
            return Err(PipelineError::Validation(format!(
                "Frame rate {}/{} must have non-zero terms",
                num, den
            )));
        }
        Ok(Self { num, den })
    }

    /// Whole frames per second
    pub fn from_integer(fps: u32) -> Result<Self, PipelineError> {
        Self::new(fps, 1)
    }

    /// Parse `num/den` or a bare integer
    pub fn parse(rate_str: &str) -> Result<Self, PipelineError> {
        let trimmed = rate_str.trim();
        let invalid = || PipelineError::Validation(format!("Invalid frame rate: '{}'", rate_str));

        match trimmed.split_once('/') {
            Some((num, den)) => {
                let num = num.trim().parse::<u32>().map_err(|_| invalid())?;
                let den = den.trim().parse::<u32>().map_err(|_| invalid())?;
                Self::new(num, den)
            }
            None => {
                let fps = trimmed.parse::<u32>().map_err(|_| invalid())?;
                Self::from_integer(fps)
            }
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Integer rate handed to the transcoder: the numerator alone.
    ///
    /// Known approximation kept from the established pipeline behaviour: the
    /// denominator is ignored, so 30/1 gives 30 but 30000/1001 gives 30000.
    /// The inference stage still receives the full rational rate.
    pub fn integer_rate(&self) -> u32 {
        self.num
    }

    /// Duration of a single frame in seconds
    pub fn frame_duration(&self) -> f64 {
        self.den as f64 / self.num as f64
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for FrameRate {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// How the transcoder treats the source resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolutionPolicy {
    PreserveOriginal,
    /// Target width in pixels; height follows the aspect ratio, rounded to even
    ResizeToWidth(u32),
}

/// How much of the source is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrimPolicy {
    FullLength,
    FirstSeconds(u32),
}

/// Where neural inference runs for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExecutionStrategy {
    Local,
    Remote,
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStrategy::Local => write!(f, "local"),
            ExecutionStrategy::Remote => write!(f, "remote"),
        }
    }
}

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JobStatus {
    Created,
    Transcoding,
    AudioExtracted,
    Inferring,
    Remuxed,
    Cleaned,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Cleaned | JobStatus::Failed)
    }

    /// Check whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;

        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Created, Transcoding)
                | (Transcoding, AudioExtracted)
                | (AudioExtracted, Inferring)
                | (Inferring, Remuxed)
                | (Remuxed, Cleaned)
        )
    }
}

/// Pipeline step that was running when something happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineStage {
    Ingest,
    Probe,
    Transcode,
    AudioExtraction,
    Inference,
    Remux,
    Publish,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Ingest => "ingest",
            PipelineStage::Probe => "probe",
            PipelineStage::Transcode => "transcode",
            PipelineStage::AudioExtraction => "audio_extraction",
            PipelineStage::Inference => "inference",
            PipelineStage::Remux => "remux",
            PipelineStage::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Every local path a job can produce. All names are a pure function of the job id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPaths {
    pub original: PathBuf,
    pub transcoded: PathBuf,
    pub audio: PathBuf,
    pub cartoon: PathBuf,
    pub final_output: PathBuf,
}

impl JobPaths {
    /// Derive the job's file names inside `work_dir`
    pub fn for_job(work_dir: &Path, id: &JobId) -> Self {
        let name = |suffix: &str| work_dir.join(format!("{}{}.mp4", id, suffix));
        Self {
            original: name(""),
            transcoded: name("_modified"),
            audio: name("_audio_modified"),
            cartoon: name("_cartoon"),
            final_output: name("_cartoon_audio"),
        }
    }

    /// Intermediate files; the final output is not part of this set
    pub fn intermediates(&self) -> [&Path; 4] {
        [
            self.original.as_path(),
            self.transcoded.as_path(),
            self.audio.as_path(),
            self.cartoon.as_path(),
        ]
    }
}

/// Stage and kind recorded when a job enters `Failed`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub stage: PipelineStage,
    pub kind: ErrorKind,
    pub status_at_failure: JobStatus,
}

/// The unit of work for one video request
#[derive(Debug, Clone, Serialize)]
pub struct VideoJob {
    pub id: JobId,
    pub paths: JobPaths,
    pub frame_rate: Option<FrameRate>,
    pub resolution: ResolutionPolicy,
    pub trim: TrimPolicy,
    strategy: ExecutionStrategy,
    status: JobStatus,
    pub has_audio: bool,
    pub created_at: DateTime<Utc>,
    pub failure: Option<FailureRecord>,
}

impl VideoJob {
    /// Create a job in the `Created` state. The strategy is fixed for the job's lifetime.
    pub fn new(
        id: JobId,
        work_dir: &Path,
        resolution: ResolutionPolicy,
        trim: TrimPolicy,
        strategy: ExecutionStrategy,
    ) -> Self {
        Self {
            paths: JobPaths::for_job(work_dir, &id),
            id,
            frame_rate: None,
            resolution,
            trim,
            strategy,
            status: JobStatus::Created,
            has_audio: true,
            created_at: Utc::now(),
            failure: None,
        }
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Move to the next status
    pub fn advance(&mut self, next: JobStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Enter `Failed`, recording where and why
    pub fn fail(&mut self, stage: PipelineStage, kind: ErrorKind) -> Result<(), InvalidTransition> {
        let status_at_failure = self.status;
        self.advance(JobStatus::Failed)?;
        self.failure = Some(FailureRecord {
            stage,
            kind,
            status_at_failure,
        });
        Ok(())
    }

    /// Rate the inference stage must use; set during preprocessing
    pub fn require_frame_rate(&self) -> Result<FrameRate, PipelineError> {
        self.frame_rate.ok_or_else(|| {
            PipelineError::Internal(format!("Job {} reached inference without a frame rate", self.id))
        })
    }
}

/// Stream metadata read from a source file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<FrameRate>,
    pub duration_secs: Option<f64>,
    pub video_codec: String,
    pub has_audio: bool,
}

/// Declarative description of one transcoder invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscodeSpec {
    /// Keep only the first N seconds
    pub trim_secs: Option<u32>,
    /// Target width; `None` keeps the source resolution
    pub width: Option<u32>,
    /// Integer output frame rate
    pub frame_rate: u32,
}

/// Object stored in a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub object_key: String,
    pub content_type: String,
    /// Address other services use to reach the object
    pub uri: String,
    /// Time-limited read link, once one has been issued
    pub signed_url: Option<String>,
}

impl ObjectRef {
    /// Object name addressed by a URI: its last path segment
    pub fn object_name_from_uri(uri: &str) -> Option<&str> {
        let without_query = uri.split(['?', '#']).next().unwrap_or(uri);
        without_query
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }
}

/// Reply of the remote inference API
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, Serialize)]
pub struct RemoteInferenceResponse {
    pub output_uri: String,
}

/// Cartoonized, audio-less video produced by either backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceResult {
    pub cartoon_path: PathBuf,
}

/// Reference to the deliverable handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ArtifactRef {
    LocalPath(PathBuf),
    SignedUrl(String),
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRef::LocalPath(path) => write!(f, "{}", path.display()),
            ArtifactRef::SignedUrl(url) => write!(f, "{}", url),
        }
    }
}

impl From<ObjectRef> for ArtifactRef {
    /// Published objects are handed out by signed URL, falling back to their URI
    fn from(object: ObjectRef) -> Self {
        ArtifactRef::SignedUrl(object.signed_url.unwrap_or(object.uri))
    }
}

/// Successful job outcome
#[derive(Debug, Clone, Serialize)]
pub struct CompletedJob {
    pub job_id: JobId,
    pub artifact: ArtifactRef,
    pub strategy: ExecutionStrategy,
    pub frame_rate: FrameRate,
    pub status: JobStatus,
    pub elapsed: std::time::Duration,
}
