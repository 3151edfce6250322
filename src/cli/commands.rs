//! Command implementations

use anyhow::{Context, Result};
use std::ffi::OsString;
use tracing::info;

use crate::adapters::FFmpegAdapter;
use crate::app::AppContainer;
use crate::cli::args::{PlanArgs, ProbeArgs, VideoArgs};
use crate::config::PipelineConfig;
use crate::domain::model::{JobId, JobPaths, VideoMetadata};
use crate::utils::Utils;

/// Execute the video command
pub async fn video(container: &dyn AppContainer, args: &VideoArgs) -> Result<()> {
    let controller = container.pipeline_controller();
    info!(input = %args.input.display(), strategy = %controller.strategy(), "Cartoonizing video");

    match controller.process_video(&args.input).await {
        Ok(completed) => {
            println!("{}", completed.artifact);
            info!(
                job_id = %completed.job_id,
                elapsed = %Utils::format_duration(completed.elapsed),
                "Done"
            );
            Ok(())
        }
        // Operators read the detail in the logs; the submitter only gets the generic message
        Err(failure) => Err(anyhow::anyhow!(failure.user_message())),
    }
}

/// Execute the probe command
pub async fn probe(container: &dyn AppContainer, args: &ProbeArgs) -> Result<()> {
    let metadata = container
        .probe_port()
        .probe(&args.input)
        .await
        .with_context(|| format!("Failed to probe {}", args.input.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
        println!("{}", json);
    } else {
        let size = std::fs::metadata(&args.input).map(|m| m.len()).unwrap_or(0);
        print_metadata(&args.input.display().to_string(), size, &metadata);
    }
    Ok(())
}

fn print_metadata(file: &str, size: u64, metadata: &VideoMetadata) {
    println!("Video Information");
    println!("=================");
    println!("File: {}", file);
    println!("File Size: {}", Utils::format_file_size(size));
    println!("Resolution: {}x{}", metadata.width, metadata.height);
    match metadata.frame_rate {
        Some(rate) => println!("Frame Rate: {} ({:.3} fps)", rate, rate.as_f64()),
        None => println!("Frame Rate: unknown"),
    }
    match metadata.duration_secs.filter(|secs| secs.is_finite()) {
        Some(secs) => println!(
            "Duration: {}",
            Utils::format_duration(std::time::Duration::from_secs_f64(secs.max(0.0)))
        ),
        None => println!("Duration: unknown"),
    }
    println!("Video Codec: {}", metadata.video_codec);
    println!("Audio: {}", if metadata.has_audio { "yes" } else { "no" });
}

/// Execute the plan command
pub async fn plan(container: &dyn AppContainer, args: &PlanArgs) -> Result<()> {
    let config = container.config();
    let controller = container.pipeline_controller();
    let plan = controller
        .preprocessor()
        .plan(&args.input, config.resolution_policy(), config.trim_policy())
        .await
        .with_context(|| format!("Failed to plan {}", args.input.display()))?;

    let paths = JobPaths::for_job(controller.work_dir(), &JobId::new());
    let (out_w, out_h) = plan
        .spec
        .output_dimensions(plan.metadata.width, plan.metadata.height);

    println!("Strategy: {}", controller.strategy());
    println!("Frame rate: {} (transcoder: {} fps)", plan.frame_rate, plan.spec.frame_rate);
    println!("Output size: {}x{}", out_w, out_h);
    match plan.spec.trim_secs {
        Some(secs) => println!("Trim: first {}s", secs),
        None => println!("Trim: full length"),
    }
    println!();

    let ffmpeg = &config.ffmpeg_path;
    print_command(
        "transcode",
        ffmpeg,
        &FFmpegAdapter::transcode_args(&paths.original, &plan.spec, &paths.transcoded),
    );
    let audio = if plan.metadata.has_audio {
        print_command(
            "extract audio",
            ffmpeg,
            &FFmpegAdapter::extract_audio_args(&paths.transcoded, &paths.audio),
        );
        Some(paths.audio.as_path())
    } else {
        println!("extract audio: skipped, source has no audio");
        None
    };
    print_command(
        "remux",
        ffmpeg,
        &FFmpegAdapter::remux_args(&paths.cartoon, audio, &paths.final_output),
    );
    Ok(())
}

fn print_command(label: &str, program: &str, args: &[OsString]) {
    let args: Vec<String> = args
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    println!("{}: {} {}", label, program, args.join(" "));
}

/// Execute the config command
pub fn config(config: &PipelineConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)
        .context("Failed to serialize configuration")?;
    println!("{}", json);
    Ok(())
}
