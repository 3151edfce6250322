// Pipeline interactor - Sequences the stages of one video job and owns its error boundary

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

use crate::app::artifacts::{ArtifactGuard, ArtifactLifecycle, CleanupReport};
use crate::app::preprocess_interactor::VideoPreprocessor;
use crate::app::publish_interactor::ResultPublisher;
use crate::app::remux_interactor::AudioRemuxer;
use crate::config::PipelineConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::error::PipelineFailure;
use crate::ports::*;

/// A stage error tagged with where it happened
#[derive(Debug)]
struct StageError {
    stage: PipelineStage,
    error: PipelineError,
}

trait AtStage<T> {
    fn at(self, stage: PipelineStage) -> Result<T, StageError>;
}

impl<T, E: Into<PipelineError>> AtStage<T> for Result<T, E> {
    fn at(self, stage: PipelineStage) -> Result<T, StageError> {
        self.map_err(|e| StageError {
            stage,
            error: e.into(),
        })
    }
}

/// Controller for the video cartoonization pipeline
pub struct PipelineController {
    work_dir: PathBuf,
    resolution: ResolutionPolicy,
    trim: TrimPolicy,
    lifecycle: ArtifactLifecycle,
    preprocessor: VideoPreprocessor,
    backend: Arc<dyn InferenceBackend>,
    remuxer: AudioRemuxer,
    publisher: Option<ResultPublisher>,
}

impl PipelineController {
    /// Create new controller; the backend fixes the execution strategy of every job
    pub fn new(
        config: &PipelineConfig,
        lifecycle: ArtifactLifecycle,
        preprocessor: VideoPreprocessor,
        backend: Arc<dyn InferenceBackend>,
        remuxer: AudioRemuxer,
        publisher: Option<ResultPublisher>,
    ) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            resolution: config.resolution_policy(),
            trim: config.trim_policy(),
            lifecycle,
            preprocessor,
            backend,
            remuxer,
            publisher,
        }
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        self.backend.strategy()
    }

    pub fn lifecycle(&self) -> &ArtifactLifecycle {
        &self.lifecycle
    }

    pub fn preprocessor(&self) -> &VideoPreprocessor {
        &self.preprocessor
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Turn a submitted video into a cartoonized video with its audio restored.
    ///
    /// Temporary files are removed on success and on failure. Every failure is
    /// logged with full detail and returned as a [`PipelineFailure`].
    pub async fn process_video(&self, submission: &Path) -> Result<CompletedJob, PipelineFailure> {
        let mut job = VideoJob::new(
            JobId::new(),
            &self.work_dir,
            self.resolution,
            self.trim,
            self.backend.strategy(),
        );
        let span = info_span!("video_job", job_id = %job.id, strategy = %job.strategy());

        async move {
            let started = Instant::now();
            info!(submission = %submission.display(), "Starting video job");

            let guard = self.lifecycle.guard(job.id);
            let outcome = self.execute(&mut job, submission, &guard).await;
            let report = self.cleanup(guard).await;
            if !report.is_clean() {
                warn!(failed = report.failed.len(), "Some artifacts could not be removed");
            }

            match outcome {
                Ok(artifact) => {
                    if let Err(e) = job.advance(JobStatus::Cleaned) {
                        return Err(self.fail(&mut job, PipelineStage::Remux, e.into()));
                    }
                    let frame_rate = job
                        .require_frame_rate()
                        .map_err(|e| self.fail(&mut job, PipelineStage::Inference, e))?;

                    info!(
                        artifact = %artifact,
                        removed = report.removed,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Video job completed"
                    );
                    Ok(CompletedJob {
                        job_id: job.id,
                        artifact,
                        strategy: job.strategy(),
                        frame_rate,
                        status: job.status(),
                        elapsed: started.elapsed(),
                    })
                }
                Err(StageError { stage, error }) => Err(self.fail(&mut job, stage, error)),
            }
        }
        .instrument(span)
        .await
    }

    /// Remove the job's files on the blocking pool
    async fn cleanup(&self, guard: ArtifactGuard) -> CleanupReport {
        let job_id = *guard.job_id();
        match tokio::task::spawn_blocking(move || guard.cleanup()).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Cleanup task failed; removing remaining artifacts inline");
                self.lifecycle.cleanup(&job_id)
            }
        }
    }

    /// Run every stage in order; the first error aborts the rest
    async fn execute(
        &self,
        job: &mut VideoJob,
        submission: &Path,
        guard: &ArtifactGuard,
    ) -> Result<ArtifactRef, StageError> {
        guard.track(&job.paths.original);
        self.ingest(submission, &job.paths.original)
            .await
            .at(PipelineStage::Ingest)?;

        let plan = self
            .preprocessor
            .plan(&job.paths.original, job.resolution, job.trim)
            .await
            .at(PipelineStage::Probe)?;
        job.frame_rate = Some(plan.frame_rate);
        job.has_audio = plan.metadata.has_audio;

        job.advance(JobStatus::Transcoding).at(PipelineStage::Transcode)?;
        guard.track(&job.paths.transcoded);
        self.preprocessor
            .transcode(&job.paths.original, &plan, &job.paths.transcoded)
            .await
            .at(PipelineStage::Transcode)?;

        guard.track(&job.paths.audio);
        let audio = self
            .preprocessor
            .extract_audio(&plan, &job.paths.transcoded, &job.paths.audio)
            .await
            .at(PipelineStage::AudioExtraction)?;
        job.advance(JobStatus::AudioExtracted)
            .at(PipelineStage::AudioExtraction)?;

        job.advance(JobStatus::Inferring).at(PipelineStage::Inference)?;
        guard.track(&job.paths.cartoon);
        let inference = self.backend.run(job).await.at(PipelineStage::Inference)?;

        // Tracked until delivered so a partial remux output is removed on failure
        guard.track(&job.paths.final_output);
        let final_path = self
            .remuxer
            .remux(&inference.cartoon_path, audio.as_deref(), &job.paths.final_output)
            .await
            .at(PipelineStage::Remux)?;
        job.advance(JobStatus::Remuxed).at(PipelineStage::Remux)?;

        match &self.publisher {
            Some(publisher) => publisher
                .publish(&job.id, &final_path)
                .await
                .map(ArtifactRef::from)
                .at(PipelineStage::Publish),
            None => {
                guard.untrack(&final_path);
                Ok(ArtifactRef::LocalPath(final_path))
            }
        }
    }

    /// Save the submission as the job's original file
    async fn ingest(&self, submission: &Path, original: &Path) -> Result<(), PipelineError> {
        let metadata = tokio::fs::metadata(submission).await.map_err(|e| {
            PipelineError::Validation(format!(
                "Cannot read submitted file {}: {}",
                submission.display(),
                e
            ))
        })?;
        if !metadata.is_file() {
            return Err(PipelineError::Validation(format!(
                "{} is not a file",
                submission.display()
            )));
        }
        if metadata.len() == 0 {
            return Err(PipelineError::Validation(format!(
                "{} is empty",
                submission.display()
            )));
        }

        tokio::fs::create_dir_all(&self.work_dir).await.map_err(|e| {
            PipelineError::Internal(format!(
                "Cannot create work directory {}: {}",
                self.work_dir.display(),
                e
            ))
        })?;
        tokio::fs::copy(submission, original).await.map_err(|e| {
            PipelineError::Internal(format!("Cannot store submission: {}", e))
        })?;
        Ok(())
    }

    /// Move the job to `Failed` and build the failure surfaced to the caller
    fn fail(&self, job: &mut VideoJob, stage: PipelineStage, error: PipelineError) -> PipelineFailure {
        let status = job.status();
        let kind = error.kind();
        if let Err(e) = job.fail(stage, kind) {
            warn!(error = %e, "Job was already terminal when it failed");
        }

        error!(
            stage = %stage,
            kind = %kind,
            status = ?status,
            error = %error,
            "Video job failed"
        );
        PipelineFailure {
            job_id: job.id,
            stage,
            kind,
            status,
            source: error,
        }
    }
}
