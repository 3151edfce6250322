use std::sync::Arc;
use tracing::debug;

use crate::adapters::{
    CommandCartoonizerAdapter, FFmpegAdapter, FFprobeAdapter, FsObjectStorageAdapter,
    HttpInferenceAdapter, HttpObjectStorageAdapter,
};
use crate::app::{
    artifacts::ArtifactLifecycle,
    inference_backends::{LocalInferenceBackend, RemoteBuckets, RemoteInferenceBackend},
    pipeline_interactor::PipelineController,
    preprocess_interactor::VideoPreprocessor,
    publish_interactor::ResultPublisher,
    remux_interactor::AudioRemuxer,
};
use crate::config::PipelineConfig;
use crate::domain::model::ExecutionStrategy;
use crate::domain::rules::StrategySelector;
use crate::error::ConfigError;
use crate::ports::{
    CartoonizerPort, InferenceBackend, MediaToolPort, ObjectStoragePort, ProbePort,
    RemoteInferencePort,
};

pub trait AppContainer: Send + Sync {
    fn pipeline_controller(&self) -> Arc<PipelineController>;
    fn probe_port(&self) -> Arc<dyn ProbePort>;
    fn config(&self) -> &PipelineConfig;
}

pub struct DefaultAppContainer {
    config: PipelineConfig,
    probe_port: Arc<dyn ProbePort>,
    pipeline_controller: Arc<PipelineController>,
}

impl DefaultAppContainer {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let probe_port: Arc<dyn ProbePort> = Arc::new(FFprobeAdapter::new(
            config.ffprobe_path.clone(),
            config.process_timeout(),
        ));
        let media_port: Arc<dyn MediaToolPort> = Arc::new(FFmpegAdapter::new(
            config.ffmpeg_path.clone(),
            config.process_timeout(),
        ));

        let storage = build_storage(&config)?;
        let backend: Arc<dyn InferenceBackend> = match StrategySelector::select(&config) {
            ExecutionStrategy::Local => {
                let cartoonizer: Arc<dyn CartoonizerPort> = Arc::new(CommandCartoonizerAdapter::new(
                    config.cartoonizer_program.clone(),
                    config.model_dir.clone(),
                    config.gpu,
                    config.process_timeout(),
                ));
                Arc::new(LocalInferenceBackend::new(cartoonizer))
            }
            ExecutionStrategy::Remote => {
                let storage = storage.clone().ok_or_else(|| {
                    ConfigError::invalid("storage_endpoint", "required when run_local is false")
                })?;
                let endpoint = config.inference_endpoint.clone().ok_or_else(|| {
                    ConfigError::invalid("inference_endpoint", "required when run_local is false")
                })?;
                let inference: Arc<dyn RemoteInferencePort> = Arc::new(
                    HttpInferenceAdapter::new(endpoint, config.api_key.clone(), config.request_timeout())
                        .map_err(|e| initialization("inference client", e))?,
                );
                Arc::new(RemoteInferenceBackend::new(
                    storage,
                    inference,
                    RemoteBuckets {
                        inputs: config.inputs_bucket.clone(),
                        results: config.results_bucket.clone(),
                    },
                ))
            }
        };

        let publisher = match (&storage, config.publish_results) {
            (Some(storage), true) => Some(ResultPublisher::new(
                Arc::clone(storage),
                config.published_bucket.clone(),
                config.signed_url_ttl(),
            )),
            _ => None,
        };

        let preprocessor = VideoPreprocessor::new(
            Arc::clone(&probe_port),
            Arc::clone(&media_port),
            &config,
        )?;

        debug!(
            strategy = %backend.strategy(),
            publish = publisher.is_some(),
            work_dir = %config.work_dir.display(),
            "Wired pipeline"
        );

        let pipeline_controller = Arc::new(PipelineController::new(
            &config,
            ArtifactLifecycle::new(),
            preprocessor,
            backend,
            AudioRemuxer::new(media_port),
            publisher,
        ));

        Ok(Self {
            config,
            probe_port,
            pipeline_controller,
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn pipeline_controller(&self) -> Arc<PipelineController> {
        Arc::clone(&self.pipeline_controller)
    }

    fn probe_port(&self) -> Arc<dyn ProbePort> {
        Arc::clone(&self.probe_port)
    }

    fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Object storage for the configured endpoint, if any
fn build_storage(config: &PipelineConfig) -> Result<Option<Arc<dyn ObjectStoragePort>>, ConfigError> {
    let endpoint = match config.storage_endpoint.as_deref() {
        Some(endpoint) if !endpoint.is_empty() => endpoint,
        _ => return Ok(None),
    };

    if endpoint.starts_with("file://") {
        let adapter = FsObjectStorageAdapter::from_endpoint(endpoint)
            .ok_or_else(|| ConfigError::invalid("storage_endpoint", "file:// endpoint has no path"))?;
        return Ok(Some(Arc::new(adapter)));
    }

    let adapter =
        HttpObjectStorageAdapter::new(endpoint, config.api_key.clone(), config.request_timeout())
            .map_err(|e| initialization("object storage client", e))?;
    Ok(Some(Arc::new(adapter)))
}

fn initialization(component: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Initialization {
        component: component.to_string(),
        message: err.to_string(),
    }
}
