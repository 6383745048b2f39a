use clap::{Parser, Subcommand};
use radio_show::catalog::{SfxCatalog, SfxCategory};
use radio_show::codec::{AudioEngine, RodioEngine};
use radio_show::config::{
    ApplauseIntensity, ApplausePosition, BackgroundStyle, OutputFormat, Preset, ShowConfig,
    CONFIG_FILE,
};
use radio_show::library::SfxLibrary;
use radio_show::pipeline::StageOutcome;
use radio_show::segment::{SegmentFile, SegmentRole};
use radio_show::show::{ShowOutcome, ShowRunner};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "radioshow", about = "Radio show producer CLI")]
struct Cli {
    /// Config file (JSON)
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble segment files into a show and apply effects
    Produce {
        #[arg(long)]
        intro: Option<PathBuf>,
        #[arg(long)]
        top_songs: Option<PathBuf>,
        #[arg(long)]
        fan_mail: Option<PathBuf>,
        /// Extra segment as role=path (repeatable)
        #[arg(long = "segment")]
        segments: Vec<String>,
        /// Disable jingle, applause, background and intro music
        #[arg(long)]
        no_sfx: bool,
        /// full_production or minimal_production
        #[arg(long)]
        preset: Option<String>,
        /// wav or mp3 (overrides config)
        #[arg(long)]
        format: Option<String>,
        /// Background style: upbeat, chill, emotional
        #[arg(long)]
        bg_style: Option<String>,
        /// Applause intensity: light, medium, heavy
        #[arg(long)]
        intensity: Option<String>,
        /// Applause position: start, end, or at:<ms> to lay it over the show
        #[arg(long)]
        applause_at: Option<String>,
        /// Music to put in front of the show (faded in and out)
        #[arg(long)]
        intro_music: Option<PathBuf>,
        /// Silence between segments in milliseconds
        #[arg(long)]
        silence_ms: Option<u64>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Seed for the applause jitter
        #[arg(long)]
        seed: Option<u64>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Join segments without effects
    Stitch {
        /// Segments as role=path, in any order
        #[arg(required = true)]
        segments: Vec<String>,
    },
    /// Render a jingle into the sfx library
    Jingle {
        #[arg(short, long, default_value_t = 3000)]
        duration_ms: u64,
    },
    /// Render applause into the sfx library
    Applause {
        #[arg(short, long, default_value_t = 5000)]
        duration_ms: u64,
        #[arg(short, long, default_value = "medium")]
        intensity: String,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Render background music into the sfx library
    Music {
        #[arg(short, long, default_value_t = 30000)]
        duration_ms: u64,
        #[arg(short, long, default_value = "upbeat")]
        style: String,
    },
    /// Change the level of an audio file
    Gain {
        file: PathBuf,
        /// Offset in dB (negative is quieter)
        #[arg(allow_hyphen_values = true)]
        db: f32,
        /// Output path (default: <stem>_gain.wav next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List generated sound effects
    Catalog {
        #[arg(long)]
        json: bool,
    },
    /// Show configuration
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
}

#[derive(Subcommand)]
enum ConfigCmd {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn or_exit<T, E: Display>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// `role=path` → SegmentFile.
fn parse_segment(arg: &str) -> Result<SegmentFile, String> {
    let (role, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("Invalid segment '{}'. Use role=path", arg))?;
    Ok(SegmentFile::new(
        SegmentRole::from_str_loose(role)?,
        PathBuf::from(path.trim()),
    ))
}

fn require_engine(config: &ShowConfig) -> RodioEngine {
    or_exit(RodioEngine::from_config(config))
}

fn print_outcome(outcome: &ShowOutcome) {
    match outcome {
        ShowOutcome::Produced(show) => {
            println!("Show produced: {}", show.path.display());
            println!(
                "Duration: {:.1}s | Size: {:.2} MB | Format: {}",
                show.duration_ms as f64 / 1000.0,
                show.size_mb(),
                show.format
            );
            let placed: Vec<&str> = show.segments.iter().map(|r| r.title()).collect();
            println!("Segments: {}", placed.join(", "));
            if !show.missing.is_empty() {
                let missing: Vec<&str> = show.missing.iter().map(|r| r.title()).collect();
                println!("Missing: {}", missing.join(", "));
            }
            for report in &show.stages {
                let status = match &report.outcome {
                    StageOutcome::Applied => "applied".to_string(),
                    StageOutcome::Disabled => "off".to_string(),
                    StageOutcome::Failed(reason) => format!("FAILED ({})", reason),
                };
                println!("  {:<18} {}", report.stage.to_string(), status);
            }
        }
        ShowOutcome::Degraded { reason, fallback } => {
            println!("Degraded output ({}):", reason);
            for artifact in &fallback.artifacts {
                println!(
                    "  {:?}: {} ({} segment(s))",
                    artifact.kind,
                    artifact.path.display(),
                    artifact.entries
                );
            }
            for failure in &fallback.failures {
                println!("  failed: {}", failure);
            }
        }
    }
}

fn default_gain_output(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());
    file.with_file_name(format!("{}_gain.wav", stem))
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = ShowConfig::load(&cli.config);

    match cli.command {
        Commands::Produce {
            intro,
            top_songs,
            fan_mail,
            segments,
            no_sfx,
            preset,
            format,
            bg_style,
            intensity,
            applause_at,
            intro_music,
            silence_ms,
            output_dir,
            seed,
            json,
        } => {
            let mut files = Vec::new();
            for (role, path) in [
                (SegmentRole::Intro, intro),
                (SegmentRole::TopSongs, top_songs),
                (SegmentRole::FanMail, fan_mail),
            ] {
                if let Some(path) = path {
                    files.push(SegmentFile::new(role, path));
                }
            }
            for arg in &segments {
                files.push(or_exit(parse_segment(arg)));
            }
            if files.is_empty() {
                eprintln!("Error: no segments given. Use --intro/--top-songs/--fan-mail or --segment role=path");
                std::process::exit(1);
            }

            let mut config = config;
            if let Some(name) = preset {
                config = or_exit(Preset::from_str_loose(&name)).apply(&config);
            }
            if no_sfx {
                config = config.without_effects();
            }
            if let Some(f) = format {
                config = config.with_output_format(or_exit(OutputFormat::from_str_loose(&f)));
            }
            if let Some(s) = bg_style {
                let mut effects = config.effects.clone();
                effects.bg_style = or_exit(BackgroundStyle::from_str_loose(&s));
                config = config.with_effects(effects);
            }
            if let Some(i) = intensity {
                let mut effects = config.effects.clone();
                effects.applause_intensity = or_exit(ApplauseIntensity::from_str_loose(&i));
                config = config.with_effects(effects);
            }
            if let Some(p) = applause_at {
                let mut effects = config.effects.clone();
                effects.applause_position = or_exit(ApplausePosition::from_str_loose(&p));
                config = config.with_effects(effects);
            }
            if let Some(path) = intro_music {
                let mut effects = config.effects.clone();
                effects.intro_music_file = Some(path);
                config = config.with_effects(effects);
            }
            if let Some(ms) = silence_ms {
                config = config.with_silence_ms(ms);
            }
            if let Some(dir) = output_dir {
                config = config.with_output_dir(dir);
            }

            let engine = match RodioEngine::from_config(&config) {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            };
            let mut runner = ShowRunner::new(&config).with_seed(seed);
            if let Some(engine) = engine.as_ref() {
                runner = runner.with_engine(engine);
            }
            let outcome = or_exit(runner.run(&files));
            if json {
                println!("{}", or_exit(serde_json::to_string_pretty(&outcome)));
            } else {
                print_outcome(&outcome);
            }
        }
        Commands::Stitch { segments } => {
            let files: Vec<SegmentFile> = segments
                .iter()
                .map(|s| or_exit(parse_segment(s)))
                .collect();
            let config = config
                .without_effects()
                .with_final_filename("radio_show");
            let engine = match RodioEngine::from_config(&config) {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            };
            let mut runner = ShowRunner::new(&config);
            if let Some(engine) = engine.as_ref() {
                runner = runner.with_engine(engine);
            }
            print_outcome(&or_exit(runner.run(&files)));
        }
        Commands::Jingle { duration_ms } => {
            let engine = require_engine(&config);
            let path = or_exit(SfxLibrary::new(&config, &engine).create_radio_jingle(duration_ms));
            println!("Jingle created: {}", path.display());
        }
        Commands::Applause {
            duration_ms,
            intensity,
            seed,
        } => {
            let intensity = or_exit(ApplauseIntensity::from_str_loose(&intensity));
            let mut rng = match seed {
                Some(s) => fastrand::Rng::with_seed(s),
                None => fastrand::Rng::new(),
            };
            let engine = require_engine(&config);
            let path = or_exit(
                SfxLibrary::new(&config, &engine).create_applause_effect(
                    duration_ms,
                    intensity,
                    &mut rng,
                ),
            );
            println!("Applause ({}) created: {}", intensity, path.display());
        }
        Commands::Music { duration_ms, style } => {
            let style = or_exit(BackgroundStyle::from_str_loose(&style));
            let engine = require_engine(&config);
            let path = or_exit(
                SfxLibrary::new(&config, &engine).create_background_music(duration_ms, style),
            );
            println!("Background music ({}) created: {}", style, path.display());
        }
        Commands::Gain { file, db, output } => {
            let engine = require_engine(&config);
            let output = output.unwrap_or_else(|| default_gain_output(&file));
            let format = output
                .extension()
                .and_then(|e| OutputFormat::from_str_loose(&e.to_string_lossy()).ok())
                .unwrap_or(OutputFormat::Wav);
            let audio = or_exit(engine.decode(&file));
            or_exit(engine.export(&audio.gain(db), &output, format));
            println!("{} ({:+.1} dB) -> {}", file.display(), db, output.display());
        }
        Commands::Catalog { json } => {
            let catalog = or_exit(SfxCatalog::scan(&config.sfx_dir()));
            if json {
                println!("{}", or_exit(serde_json::to_string_pretty(&catalog)));
            } else if catalog.is_empty() {
                println!("No sound effects in {}", catalog.dir.display());
            } else {
                for category in SfxCategory::ALL {
                    let entries = catalog.in_category(category);
                    if entries.is_empty() {
                        continue;
                    }
                    println!("{} ({}):", category, entries.len());
                    for entry in entries {
                        println!(
                            "  {:<40} {:>6} {:>9.1} KB",
                            entry.name,
                            entry.duration_display(),
                            entry.size_kb()
                        );
                    }
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigCmd::Show => {
                println!("# {}", cli.config.display());
                println!("{}", or_exit(serde_json::to_string_pretty(&config)));
            }
            ConfigCmd::Init { force } => {
                if cli.config.exists() && !force {
                    eprintln!(
                        "Error: {} already exists (use --force to overwrite)",
                        cli.config.display()
                    );
                    std::process::exit(1);
                }
                or_exit(ShowConfig::default().save(&cli.config));
                println!("Wrote default config to {}", cli.config.display());
            }
        },
    }
}
