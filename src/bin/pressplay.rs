use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use sha2::Digest as _;
use tracing_subscriber::EnvFilter;

use pressplay::{
    AudioSync, Fps, GenerationRequest, GoogleTranslateTts, ImageSource, PipelineConfig,
    SUGGESTED_FILENAME,
};

/// Nominal scene length used when rendering without narration.
const PREVIEW_SCENE_SECS: f64 = 3.0;

#[derive(Parser, Debug)]
#[command(
    name = "pressplay",
    version,
    about = "Narrated slideshow videos from a script and images"
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). `PRESSPLAY_LOG` / `RUST_LOG` win.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize the narration and render the MP4 (requires `ffmpeg` and `ffprobe` on PATH).
    Generate(GenerateArgs),
    /// Render a single scene frame as a PNG, without narration.
    Frame(FrameArgs),
    /// Print the scene timeline as JSON for a given narration length.
    Plan(PlanArgs),
    /// List the accepted narration language codes.
    Languages(LanguagesArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ScriptArgs {
    /// Script text.
    #[arg(long)]
    text: Option<String>,

    /// File holding the script text (UTF-8).
    #[arg(long)]
    text_file: Option<PathBuf>,
}

impl ScriptArgs {
    fn read(&self) -> anyhow::Result<String> {
        match (&self.text, &self.text_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("read script '{}'", path.display())),
            (None, None) => anyhow::bail!("either --text or --text-file is required"),
        }
    }
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Pipeline configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Caption font file (overrides config and `PRESSPLAY_FONT`).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Crossfade between scenes, in seconds.
    #[arg(long)]
    crossfade: Option<f64>,

    /// Output frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// `freeze` holds the last frame until the narration ends; `overlap` does not.
    #[arg(long)]
    audio_sync: Option<AudioSync>,

    /// Print the caption font family and SHA-256 of its bytes.
    #[arg(long)]
    dump_font: bool,
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_path(path)?,
            None => PipelineConfig::default(),
        };
        cfg.apply_env();
        if let Some(font) = &self.font {
            cfg.font_path = Some(font.clone());
        }
        if let Some(crossfade) = self.crossfade {
            cfg.crossfade_secs = crossfade;
        }
        if let Some(fps) = self.fps {
            cfg.fps = Fps::new(fps, 1)?;
        }
        if let Some(audio_sync) = self.audio_sync {
            cfg.audio_sync = audio_sync;
        }
        cfg.validate()?;
        if self.dump_font {
            dump_font_diagnostics(&cfg)?;
        }
        Ok(cfg)
    }
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    script: ScriptArgs,

    /// Background image (repeat for more; cycled across scenes).
    #[arg(long = "image", required = true)]
    images: Vec<PathBuf>,

    /// Narration language code.
    #[arg(long, default_value = "en")]
    lang: String,

    /// Output MP4 path.
    #[arg(long, default_value = SUGGESTED_FILENAME)]
    out: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,

    /// Render frames on a rayon thread pool.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for `--parallel` (defaults to rayon's choice).
    #[arg(long)]
    threads: Option<usize>,

    /// Frames per render chunk.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Print the video metadata as JSON on stdout.
    #[arg(long)]
    metadata: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    script: ScriptArgs,

    /// Background image (repeat for more; cycled across scenes).
    #[arg(long = "image", required = true)]
    images: Vec<PathBuf>,

    /// Scene index (0-based).
    #[arg(long, default_value_t = 0)]
    scene: usize,

    /// Seconds into the scene.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    script: ScriptArgs,

    /// Number of images in the pool.
    #[arg(long, default_value_t = 1)]
    images: usize,

    /// Narration length in seconds.
    #[arg(long)]
    audio_secs: f64,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args, Debug)]
struct LanguagesArgs {
    /// Pipeline configuration JSON (for `extra_languages`).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Plan(args) => cmd_plan(args),
        Command::Languages(args) => cmd_languages(args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("PRESSPLAY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn image_sources(paths: &[PathBuf]) -> Vec<ImageSource> {
    paths.iter().cloned().map(ImageSource::from).collect()
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let text = args.script.read()?;
    let mut cfg = args.config.load()?;
    if args.parallel {
        cfg.threading.parallel = true;
    }
    if args.threads.is_some() {
        cfg.threading.threads = args.threads;
    }
    if let Some(chunk_size) = args.chunk_size {
        cfg.threading.chunk_size = chunk_size;
    }
    cfg.validate()?;

    let synthesizer = GoogleTranslateTts::new(cfg.tts.clone())?;
    let request = GenerationRequest::new(text, image_sources(&args.images), args.lang);
    let video = pressplay::generate(&request, &synthesizer, &cfg)?;
    video.write_to(&args.out)?;

    if args.metadata {
        println!("{}", serde_json::to_string_pretty(&video.metadata)?);
    }
    eprintln!(
        "wrote {} ({} scenes, {:.2}s)",
        args.out.display(),
        video.metadata.scene_count,
        video.metadata.duration_secs
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let text = args.script.read()?;
    let cfg = args.config.load()?;
    let frame = pressplay::render_preview_frame(
        &text,
        image_sources(&args.images),
        &cfg,
        args.scene,
        args.at,
        PREVIEW_SCENE_SECS,
    )?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame
        .to_rgba_image()?
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let text = args.script.read()?;
    let cfg = args.config.load()?;
    let timeline = pressplay::plan_timeline(&text, args.images, args.audio_secs, &cfg)?;
    println!("{}", serde_json::to_string_pretty(&timeline)?);
    eprintln!(
        "{} scenes, video {:.3}s (nominal {:.3}s), {} frames",
        timeline.scenes.len(),
        timeline.output_secs(),
        timeline.nominal_video_secs(),
        timeline.frame_count()
    );
    Ok(())
}

fn cmd_languages(args: LanguagesArgs) -> anyhow::Result<()> {
    let cfg = match &args.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    for (code, name) in cfg.languages().iter() {
        println!("{code}\t{name}");
    }
    Ok(())
}

fn dump_font_diagnostics(cfg: &PipelineConfig) -> anyhow::Result<()> {
    let font = pressplay::resolve_caption_font(cfg.font_path.as_deref())?;
    let source = match &font.origin {
        pressplay::FontOrigin::File(path) => path.display().to_string(),
        pressplay::FontOrigin::System => "system".to_owned(),
    };
    eprintln!("caption font diagnostics:");
    eprintln!("  source:  {source}");
    eprintln!("  family:  {}", font.family);
    eprintln!("  index:   {}", font.index);
    eprintln!("  sha256:  {}", sha256_hex(&font.bytes));
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
