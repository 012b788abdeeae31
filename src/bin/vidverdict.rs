use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use vidverdict::{
    AnalysisClient, AnalysisOptions, AnalysisResult, ApiCredential, DEFAULT_FRAME_COUNT,
    DEFAULT_JPEG_QUALITY, DEFAULT_MODEL, DEFAULT_TEMPERATURE, Detector, FfmpegLogLevel, Frame,
    FrameSampler, OperationType, Phase, ProgressCallback, ProgressInfo, SampleOptions,
    SeekableVideo, SelectedFile, Session, Severity, VideoSource,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vidverdict analyze clip.mp4\n  vidverdict analyze clip.mp4 --frames 8 --json\n  vidverdict sample clip.mp4 --out frames --progress\n  vidverdict probe clip.mp4 --json\n  vidverdict completions zsh > _vidverdict\n\nThe analyze command reads the Gemini key from the API_KEY environment variable.";

#[derive(Debug, Parser)]
#[command(
    name = "vidverdict",
    version,
    about = "Ask a multimodal model whether a video is AI-generated",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while sampling and a spinner while waiting on the model.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<FfmpegLogLevel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sample frames and ask the model for a verdict.
    #[command(
        about = "Analyze a video",
        after_help = "Examples:\n  vidverdict analyze clip.mp4\n  vidverdict analyze clip.mp4 --model gemini-2.5-flash --timeout 120\n  vidverdict analyze clip.mp4 --save-frames sampled --json"
    )]
    Analyze {
        /// Input video path.
        input: PathBuf,
        /// Number of evenly spaced frames to send.
        #[arg(long, default_value_t = DEFAULT_FRAME_COUNT)]
        frames: usize,
        /// Model to query.
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
        /// Sampling temperature.
        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f32,
        /// Give up on the model after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
        /// Print the verdict as machine-readable JSON.
        #[arg(long)]
        json: bool,
        /// Also write the sampled frames to this directory.
        #[arg(long)]
        save_frames: Option<PathBuf>,
    },

    /// Sample frames to disk without contacting the model.
    #[command(
        about = "Write sampled frames",
        after_help = "Examples:\n  vidverdict sample clip.mp4 --out frames\n  vidverdict sample clip.mp4 --out frames --frames 10 --max-dimension 640"
    )]
    Sample {
        /// Input video path.
        input: PathBuf,
        /// Output directory for the JPEG frames.
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = DEFAULT_FRAME_COUNT)]
        frames: usize,
        /// JPEG quality (1-100).
        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
        quality: u8,
        /// Downscale so the longest edge is at most this many pixels.
        #[arg(long)]
        max_dimension: Option<u32>,
    },

    /// Print video metadata.
    #[command(about = "Print video metadata", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,
        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn frame_file_name(index: usize, frame: &Frame) -> String {
    format!(
        "frame_{:02}_{}ms.jpg",
        index + 1,
        frame.timestamp().as_millis()
    )
}

fn write_frames(
    directory: &Path,
    frames: &[Frame],
    global: &GlobalOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(directory)?;
    for (index, frame) in frames.iter().enumerate() {
        let path = directory.join(frame_file_name(index, frame));
        ensure_writable_path(&path, global.overwrite)?;
        fs::write(&path, frame.to_jpeg_bytes()?)?;
        if global.verbose {
            eprintln!("saved frame {} -> {}", index + 1, path.display());
        }
    }
    Ok(())
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    if let Some(level) = global.log_level {
        vidverdict::set_ffmpeg_log_level(level);
    }
}

/// Drives an `indicatif` bar from sampler progress.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(total: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total as u64);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        bar.set_message("sampling");
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.operation != OperationType::FrameSampling {
            return;
        }
        self.bar.set_position(info.current);
        if info.total == Some(info.current) {
            self.bar.finish_and_clear();
        }
    }
}

fn spinner(message: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn sample_options(
    global: &GlobalOptions,
    frames: usize,
) -> Result<SampleOptions, Box<dyn std::error::Error>> {
    let mut options = SampleOptions::new().with_frame_count(frames);
    if global.progress && frames > 0 {
        options = options.with_progress(Arc::new(TerminalProgress::new(frames)?));
    }
    Ok(options)
}

fn paint(text: &str, severity: Severity) -> ColoredString {
    text.color(severity.color_name()).bold()
}

fn print_result(result: &AnalysisResult) {
    let severity = result.severity();
    let title = if result.is_ai_generated {
        result.title().red().bold()
    } else {
        result.title().green().bold()
    };

    println!("{title}");
    println!(
        "Confidence: {} ({severity} severity)",
        paint(&result.confidence_percent(), severity)
    );
    println!();
    println!("{}", "Reasoning".bold());
    println!("{}", result.reasoning);

    if !result.artifacts_detected.is_empty() {
        println!();
        println!("{}", "Artifacts Detected".bold());
        for artifact in &result.artifacts_detected {
            println!("  - {}", artifact.cyan());
        }
    }
}

fn result_json(result: &AnalysisResult, frames: usize) -> serde_json::Value {
    json!({
        "is_ai_generated": result.is_ai_generated,
        "confidence_score": result.confidence_score,
        "confidence_percent": result.confidence_percent(),
        "severity": result.severity(),
        "title": result.title(),
        "reasoning": result.reasoning,
        "artifacts_detected": result.artifacts_detected,
        "frames_analyzed": frames,
    })
}

#[allow(clippy::too_many_arguments)]
fn analyze(
    global: &GlobalOptions,
    input: PathBuf,
    frames: usize,
    model: String,
    temperature: f32,
    timeout: Option<u64>,
    json: bool,
    save_frames: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let credential = ApiCredential::from_env()?;

    let mut session = Session::new();
    session.select_file(SelectedFile::new(input))?;

    let mut analysis = AnalysisOptions::new()
        .with_model(model)
        .with_temperature(temperature);
    if let Some(seconds) = timeout {
        analysis = analysis.with_timeout(Duration::from_secs(seconds));
    }

    let client = AnalysisClient::gemini(credential, analysis)?;
    let detector = Detector::new(client, sample_options(global, frames)?);
    let ticket = session.begin_analysis()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome: Result<AnalysisResult, Box<dyn std::error::Error>> = runtime.block_on(async {
        let interrupt = ticket.cancellation().clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{}", "interrupted, cancelling analysis".yellow());
                interrupt.cancel();
            }
        });

        let path = ticket.file().path();
        let sampled = detector.sample(path, ticket.cancellation()).await?;
        if let Some(directory) = &save_frames {
            write_frames(directory, &sampled, global)?;
        }

        let waiting = if global.progress {
            Some(spinner(&format!("asking {}", detector.client().options().model()))?)
        } else {
            None
        };
        let verdict = detector
            .analyze_frames(&sampled, ticket.cancellation())
            .await;
        if let Some(waiting) = waiting {
            waiting.finish_and_clear();
        }
        Ok(verdict?)
    });

    match outcome {
        Ok(result) => session.complete(ticket.id(), result)?,
        Err(error) => session.fail(ticket.id(), error.to_string())?,
    }

    match (session.phase(), session.result()) {
        (Phase::Success, Some(result)) => {
            if json {
                let payload = result_json(result, detector.sample_options().frame_count());
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_result(result);
            }
            Ok(())
        }
        _ => {
            let message = session.message().unwrap_or_default();
            eprintln!("{}", "Analysis Failed".red().bold());
            Err(message.into())
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match cli.command {
        Commands::Analyze {
            input,
            frames,
            model,
            temperature,
            timeout,
            json,
            save_frames,
        } => analyze(
            &cli.global,
            input,
            frames,
            model,
            temperature,
            timeout,
            json,
            save_frames,
        )?,
        Commands::Sample {
            input,
            out,
            frames,
            quality,
            max_dimension,
        } => {
            let selected = SelectedFile::new(&input);
            if !selected.is_video() {
                return Err(format!(
                    "{} does not look like a video ({})",
                    input.display(),
                    selected.mime_type()
                )
                .into());
            }

            let mut options = sample_options(&cli.global, frames)?.with_jpeg_quality(quality);
            if let Some(max_dimension) = max_dimension {
                options = options.with_max_dimension(max_dimension);
            }

            let sampled = FrameSampler::new(options).sample(VideoSource::open(&input)?)?;
            write_frames(&out, &sampled, &cli.global)?;

            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Sampled {} frame(s) to {}", sampled.len(), out.display()).green()
            );
        }
        Commands::Probe { input, json } => {
            let source = VideoSource::open(&input)?;
            let metadata = source.metadata();
            if json {
                let payload = json!({
                    "path": source.path().display().to_string(),
                    "format": metadata.format,
                    "codec": metadata.codec,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "start_offset_seconds": source.start_offset().as_secs_f64(),
                    "sample_timestamps": FrameSampler::timestamps(metadata.duration, DEFAULT_FRAME_COUNT)
                        .iter()
                        .map(Duration::as_secs_f64)
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("File: {}", source.path().display());
                println!("Format: {}", metadata.format);
                println!("Duration: {:?}", metadata.duration);
                if !source.start_offset().is_zero() {
                    println!("Starts at: {:?}", source.start_offset());
                }
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vidverdict", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
