// Application layer - Use case interactors

pub mod artifacts;
pub mod container;
pub mod inference_backends;
pub mod pipeline_interactor;
pub mod preprocess_interactor;
pub mod publish_interactor;
pub mod remux_interactor;

// Re-export interactors
pub use artifacts::{ArtifactGuard, ArtifactLifecycle, CleanupReport};
pub use container::{AppContainer, DefaultAppContainer};
pub use inference_backends::{LocalInferenceBackend, RemoteBuckets, RemoteInferenceBackend};
pub use pipeline_interactor::PipelineController;
pub use preprocess_interactor::{PreprocessPlan, VideoPreprocessor};
pub use publish_interactor::ResultPublisher;
pub use remux_interactor::AudioRemuxer;
