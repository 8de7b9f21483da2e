use clap::{Parser, Subcommand};
use expanse::config::{self, AppConfig};
use expanse::generation::GeminiClient;
use expanse::imaging::{
    ExportFormat, FilterParams, ImageBackend, RustBackend, Size, SourceImage, plan_layout,
};
use expanse::output;
use expanse::session::{Session, SessionConfig};
use expanse::types::Resolution;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "expanse")]
#[command(about = "Extend photos to any resolution with generative outpainting")]
#[command(long_about = "\
Extend photos to any resolution with generative outpainting

The photo is centered on a canvas of the chosen resolution. The empty border
is filled with a blurred, darkened copy of the photo, and the composite is sent
to a generative image model that paints realistic surroundings in its place.

Canvas layers (bottom to top):
  1. Solid background    [canvas] background
  2. Blurred cover copy  scaled to cover the canvas, blurred and darkened
  3. Sharp contain copy  the untouched photo, scaled to fit and centered

The API key is read from the environment variable named by
[generation] api_key_env (GEMINI_API_KEY by default).

Run 'expanse gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Path to config.toml (missing file means defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the configured resolutions
    Resolutions,
    /// Composite a photo without calling the model
    Preview {
        /// Input photo (JPEG, PNG, WebP, GIF, BMP or TIFF)
        input: PathBuf,
        /// Target resolution, WIDTHxHEIGHT or a configured label
        #[arg(short, long)]
        resolution: Option<String>,
        /// Where to write the composite
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,
    },
    /// Composite a photo and outpaint it with the generative model
    Generate {
        /// Input photo (JPEG, PNG, WebP, GIF, BMP or TIFF)
        input: PathBuf,
        /// Target resolution, WIDTHxHEIGHT or a configured label
        #[arg(short, long)]
        resolution: Option<String>,
        /// Extra guidance for the model, e.g. "A snowy mountain range"
        #[arg(short, long, default_value = "")]
        prompt: String,
        /// Directory for the result (overrides [output] dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Resolutions => {
            let config = config::load_config(&cli.config)?;
            output::print_resolutions(&config.resolutions, config.default_resolution()?);
        }
        Command::Preview {
            input,
            resolution,
            output: out,
        } => {
            let config = config::load_config(&cli.config)?;
            let backend = RustBackend::new();
            let source = backend.decode(&std::fs::read(&input)?)?;
            let res = pick_resolution(&config, resolution.as_deref())?;
            let surface = backend.composite(&source, res, config.background()?)?;
            let payload = backend.encode(&surface, ExportFormat::Png)?;
            std::fs::write(&out, &payload.bytes)?;
            let canvas = Size::from(res.dimensions());
            let layout = plan_layout(source.size(), canvas, &FilterParams::REFERENCE);
            output::print_preview(&input, res, &layout, source.size(), &out);
        }
        Command::Generate {
            input,
            resolution,
            prompt,
            output: out,
        } => {
            let config = config::load_config(&cli.config)?;
            let mut session = open_session(&config, &input, resolution.as_deref())?;
            session.set_prompt(prompt);
            let result = session.generate()?.clone();
            let dir = out.unwrap_or_else(|| config.output.dir.clone());
            let saved = result.write_to(&dir, &config.output.prefix)?;
            tracing::info!(path = %saved.display(), "result saved");
            let (res, source) = describe(&session);
            output::print_result(&input, &res, source, &result, &saved);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "expanse=debug" } else { "expanse=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Build a generation session, load `input` into it and apply the requested resolution.
fn open_session(
    config: &AppConfig,
    input: &Path,
    resolution: Option<&str>,
) -> Result<Session<RustBackend, GeminiClient>, Box<dyn std::error::Error>> {
    let generator = GeminiClient::new(&config.generation.endpoint, &config.generation.model)?;
    let mut session = Session::new(
        RustBackend::new(),
        generator,
        SessionConfig::from_app_config(config)?,
    );
    let bytes = std::fs::read(input)?;
    session.load_image(&bytes)?;
    if resolution.is_some() {
        session.select_resolution(pick_resolution(config, resolution)?)?;
    }
    Ok(session)
}

/// The resolution named on the command line, or the configured default.
fn pick_resolution<'a>(
    config: &'a AppConfig,
    spec: Option<&str>,
) -> Result<&'a Resolution, config::ConfigError> {
    match spec {
        Some(spec) => config.find_resolution(spec),
        None => config.default_resolution(),
    }
}

fn describe(session: &Session<RustBackend, GeminiClient>) -> (Resolution, Size) {
    let res = session.settings().resolution.clone();
    let source = session
        .source()
        .map(SourceImage::size)
        .unwrap_or(Size::new(0.0, 0.0));
    (res, source)
}
