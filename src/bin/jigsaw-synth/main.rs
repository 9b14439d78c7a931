//! jigsaw-synth CLI - synthetic jigsaw-piece data generator.
//!
//! Usage: jigsaw-synth <COMMAND> [OPTIONS]
//!
//! Run `jigsaw-synth --help` for available commands.

mod prompt;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::{Builder, Env};
use log::info;

use jigsaw_synth::backend::{BackendOptions, MeshBackend};
use jigsaw_synth::batch::{BatchMode, BatchOptions, BatchOrchestrator, BatchProgress};
use jigsaw_synth::config::GeneratorConfig;
use jigsaw_synth::generator::PieceGenerator;
use jigsaw_synth::io::{self, Format};
use jigsaw_synth::render::{NullRenderer, Renderer, SceneExporter};
use jigsaw_synth::sampler::ParameterSampler;
use jigsaw_synth::scene::{SceneRandomizer, SceneState};
use jigsaw_synth::template::{TemplateOptions, TemplateSection};
use jigsaw_synth::textures::{discover_base_images, BaseImage, FloorLibrary};
use jigsaw_synth::uv::{ImageSize, PlanarUnwrap};

#[derive(Parser)]
#[command(name = "jigsaw-synth")]
#[command(author, version, about = "Synthetic jigsaw-piece data generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a labelled batch
    Generate(GenerateArgs),

    /// Write the built-in template section to a PLY file
    Template {
        /// Output PLY file
        output: PathBuf,

        /// Samples along each side
        #[arg(long, default_value = "24")]
        side_samples: usize,

        /// Rings between the center and the side
        #[arg(long, default_value = "6")]
        rings: usize,
    },

    /// Generate a single piece and save the evaluated mesh
    Preview {
        /// Output mesh file (.obj, .ply or .stl)
        output: PathBuf,

        /// Image width used for aspect correction
        #[arg(long, default_value = "1024")]
        width: u32,

        /// Image height used for aspect correction
        #[arg(long, default_value = "1024")]
        height: u32,

        /// Save the flat piece instead of the finished one
        #[arg(long)]
        flat: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the default configuration as JSON
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Random seed (default: from entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON configuration file with sampling ranges
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Template section PLY (default: built-in)
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Use single-threaded execution (for benchmarking)
    #[arg(long)]
    sequential: bool,
}

#[derive(Args)]
struct GenerateArgs {
    /// Directory of base images
    #[arg(long, default_value = "Materials/Base")]
    base_dir: PathBuf,

    /// Directory of floor texture sets
    #[arg(long, default_value = "Materials/Floor")]
    floor_dir: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "Output")]
    output: PathBuf,

    /// Samples per base image
    #[arg(long, conflicts_with = "total", default_value = "1")]
    per_base: usize,

    /// Total samples on randomly drawn base images
    #[arg(long)]
    total: Option<usize>,

    /// Keep the sun at its baseline
    #[arg(long)]
    no_lighting: bool,

    /// Keep the camera at its baseline
    #[arg(long)]
    no_camera: bool,

    /// Do not copy base images into the output
    #[arg(long)]
    no_copy_base: bool,

    /// What to hand each sample to
    #[arg(long, value_enum, default_value = "obj")]
    export: ExportFormat,

    /// Ask for mode, counts and switches on the console
    #[arg(short, long)]
    interactive: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    /// Labels only
    None,
    /// OBJ + MTL + scene JSON
    Obj,
    /// PLY + scene JSON
    Ply,
    /// STL + scene JSON
    Stl,
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Generate(args) => cmd_generate(args)?,
        Commands::Template {
            output,
            side_samples,
            rings,
        } => cmd_template(&output, side_samples, rings)?,
        Commands::Preview {
            output,
            width,
            height,
            flat,
            common,
        } => cmd_preview(&output, ImageSize::new(width, height), flat, &common)?,
        Commands::Config { output } => cmd_config(output.as_deref())?,
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> BatchProgress {
    BatchProgress::new(|event| {
        let percent = event.percent();
        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);
        let message = format!("base {} sample {}", event.base_index, event.sample);

        eprint!("\r[{}{}] {:3}% {:<32}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if event.done >= event.total {
            eprintln!();
        }
    })
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(p) => GeneratorConfig::load(p)?,
        None => GeneratorConfig::default(),
    })
}

fn load_section(path: Option<&Path>) -> Result<TemplateSection, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(p) => TemplateSection::load(p)?,
        None => TemplateSection::build(&TemplateOptions::default())?,
    })
}

fn make_backend(sequential: bool) -> MeshBackend {
    MeshBackend::new(BackendOptions::default().with_parallel(!sequential))
}

fn cmd_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.common.config.as_deref())?;
    let section = load_section(args.common.template.as_deref())?;
    let backend = make_backend(args.common.sequential);

    let bases = discover_base_images(&args.base_dir)?;
    let floors = FloorLibrary::discover(&args.floor_dir)?;
    println!(
        "Found {} base images and {} floor sets",
        bases.len(),
        floors.len()
    );

    let (mode, lighting, camera, copy_base) = if args.interactive {
        let answers = prompt::ask(bases.len())?;
        (answers.mode, answers.lighting, answers.camera, answers.copy_base)
    } else {
        let mode = match args.total {
            Some(total) => BatchMode::TotalRandom { total },
            None => BatchMode::PerBase {
                per_base: args.per_base,
            },
        };
        (mode, !args.no_lighting, !args.no_camera, !args.no_copy_base)
    };

    let randomizer = SceneRandomizer::new(config.scene.clone())
        .with_lighting(lighting)
        .with_camera(camera);
    let options = BatchOptions::new(mode, &args.output).with_copy_base(copy_base);
    let generator = PieceGenerator::new(&section, &config.piece, &backend, &PlanarUnwrap);
    let mut sampler = ParameterSampler::from_seed_or_entropy(args.common.seed);

    let start = Instant::now();
    let samples = match args.export {
        ExportFormat::None => run_batch(
            generator,
            randomizer,
            &floors,
            NullRenderer,
            &bases,
            &options,
            &mut sampler,
        )?,
        ExportFormat::Obj => run_batch(
            generator,
            randomizer,
            &floors,
            SceneExporter::new(backend.clone()),
            &bases,
            &options,
            &mut sampler,
        )?,
        ExportFormat::Ply => run_batch(
            generator,
            randomizer,
            &floors,
            SceneExporter::new(backend.clone()).with_format(Format::Ply),
            &bases,
            &options,
            &mut sampler,
        )?,
        ExportFormat::Stl => run_batch(
            generator,
            randomizer,
            &floors,
            SceneExporter::new(backend.clone()).with_format(Format::Stl),
            &bases,
            &options,
            &mut sampler,
        )?,
    };

    println!(
        "Generated {} samples in {:.2?} into {}",
        samples,
        start.elapsed(),
        args.output.display()
    );
    Ok(())
}

fn run_batch<R: Renderer>(
    generator: PieceGenerator<'_>,
    randomizer: SceneRandomizer,
    floors: &FloorLibrary,
    renderer: R,
    bases: &[BaseImage],
    options: &BatchOptions,
    sampler: &mut ParameterSampler,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut batch = BatchOrchestrator::new(generator, randomizer, floors, renderer);
    let summary = batch.run(bases, options, sampler, &create_progress())?;
    for file in &summary.label_files {
        info!("Wrote {}", file.display());
    }
    Ok(summary.samples)
}

fn cmd_template(
    output: &Path,
    side_samples: usize,
    rings: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = TemplateOptions::default()
        .with_side_samples(side_samples)
        .with_rings(rings);
    let section = TemplateSection::build(&options)?;
    section.save(output)?;
    println!(
        "Saved template section: {} vertices, {} faces -> {}",
        section.mesh().num_vertices(),
        section.mesh().num_faces(),
        output.display()
    );
    Ok(())
}

fn cmd_preview(
    output: &Path,
    image: ImageSize,
    flat: bool,
    common: &CommonArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(common.config.as_deref())?;
    let section = load_section(common.template.as_deref())?;
    let backend = make_backend(common.sequential);
    let generator = PieceGenerator::new(&section, &config.piece, &backend, &PlanarUnwrap);
    let mut sampler = ParameterSampler::from_seed_or_entropy(common.seed);
    let mut scene = SceneState::default();

    let start = Instant::now();
    let piece = generator.generate(&mut sampler, image, &mut scene.material)?;
    let mesh = if flat {
        piece.piece.mesh.clone()
    } else {
        piece.piece.evaluate(&backend)?
    };
    io::save(&mesh, output)?;

    println!("Sides: {:?}", piece.params.sides);
    for (i, c) in piece.labels.corners.iter().enumerate() {
        println!("Corner {}: ({}, {})", i + 1, c.x, c.y);
    }
    println!(
        "Saved {} vertices, {} faces in {:.2?} -> {}",
        mesh.num_vertices(),
        mesh.num_faces(),
        start.elapsed(),
        output.display()
    );
    Ok(())
}

fn cmd_config(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = GeneratorConfig::default();
    match output {
        Some(path) => {
            config.save(path)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", config.to_json()?),
    }
    Ok(())
}
