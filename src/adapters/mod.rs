// Adapters - External system implementations

pub mod cartoonizer_cmd;
pub mod exec_ffmpeg;
pub mod file_config;
pub mod inference_http;
pub mod probe_ffprobe;
pub mod storage_fs;
pub mod storage_http;
pub mod tracing_log;

// Re-export adapters
pub use cartoonizer_cmd::CommandCartoonizerAdapter;
pub use exec_ffmpeg::FFmpegAdapter;
pub use file_config::FileConfigAdapter;
pub use inference_http::HttpInferenceAdapter;
pub use probe_ffprobe::FFprobeAdapter;
pub use storage_fs::FsObjectStorageAdapter;
pub use storage_http::HttpObjectStorageAdapter;
pub use tracing_log::{init_tracing, LogLevel};
