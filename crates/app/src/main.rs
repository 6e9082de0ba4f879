use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use mashup_studio_core::{
    generate_beats, load_block, AppConfig, BlockLibrary, BlockPlacement, Clip, Exporter,
    MashupError, ProjectBeatContext, ProjectFile,
};
use tracing_subscriber::EnvFilter;

fn main() -> mashup_studio_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Scan { root, query, bpm } => {
            run_scan(&root, query.as_deref(), bpm.unwrap_or(config.project.bpm))
        }
        Commands::Inspect { block } => run_inspect(&block),
        Commands::Beats { bpm, length_ms } => run_beats(bpm, length_ms),
        Commands::Export {
            project,
            blocks,
            out,
            block_flow,
        } => run_export(config, &project, &blocks, &out, block_flow),
    }
}

fn run_scan(root: &Path, query: Option<&str>, project_bpm: u32) -> mashup_studio_core::Result<()> {
    let library = BlockLibrary::load_dir(root)?;
    let matches = library.search(query.unwrap_or_default());

    for summary in BlockLibrary::summarize(matches, project_bpm) {
        println!("{:<32} {:>4} BPM  {}", summary.name, summary.bpm, summary.tempo);
    }
    Ok(())
}

fn run_inspect(dir: &Path) -> mashup_studio_core::Result<()> {
    let block = load_block(dir)?;
    let clips = &block.dance_tape.clips;
    let count = |predicate: fn(&Clip) -> bool| clips.iter().filter(|clip| predicate(clip)).count();

    println!("block:       {}", block.name);
    println!("source map:  {}", block.source_map_name());
    println!("bpm:         {}", block.bpm);
    println!("markers:     {}", block.music_track.markers().len());
    println!("clips:       {}", clips.len());
    println!("  motion:    {}", count(|clip| matches!(clip, Clip::Motion(_))));
    println!("  pictogram: {}", count(|clip| matches!(clip, Clip::Pictogram(_))));
    println!("  tape ref:  {}", count(|clip| matches!(clip, Clip::TapeReference(_))));
    println!("  other:     {}", count(|clip| matches!(clip, Clip::Other(_))));
    Ok(())
}

fn run_beats(bpm: f64, length_ms: f64) -> mashup_studio_core::Result<()> {
    let sequence = generate_beats(bpm, length_ms)?;
    println!("{}", serde_json::to_string_pretty(&sequence)?);
    Ok(())
}

fn run_export(
    mut config: AppConfig,
    project_path: &Path,
    blocks_root: &Path,
    out_dir: &Path,
    block_flow: bool,
) -> mashup_studio_core::Result<()> {
    let project = ProjectFile::from_path(project_path)?;
    let mut context = ProjectBeatContext::new(
        project.map_name(&config.project),
        project.bpm(&config.project),
    )?;
    context.attach_audio(project.audio_length_ms)?;
    tracing::info!(map = %context.map_name, bpm = context.bpm, "exporting project");

    let library = BlockLibrary::load_dir(blocks_root)?;
    let placements = project
        .placements
        .iter()
        .map(|entry| {
            library
                .block(&entry.block)
                .map(|block| BlockPlacement::new(block, entry.start_ms, entry.end_ms))
                .ok_or_else(|| {
                    MashupError::msg(format!(
                        "placement references unknown or unusable block `{}`",
                        entry.block
                    ))
                })
        })
        .collect::<mashup_studio_core::Result<Vec<_>>>()?;

    config.export.write_block_flow |= block_flow;
    let exporter = Exporter::new(config.export);
    let bundle = exporter.build(&placements, &context)?;
    for path in exporter.write(&bundle, out_dir)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Dance mashup assembler and UAF exporter", long_about = None)]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the usable blocks found under a folder.
    Scan {
        /// Folder containing one subfolder per block.
        root: PathBuf,
        /// Filter on block name or BPM.
        #[arg(short, long)]
        query: Option<String>,
        /// Project BPM used to rate tempo compatibility.
        #[arg(short, long)]
        bpm: Option<u32>,
    },
    /// Show what a single block folder contains.
    Inspect {
        /// Path to the block folder.
        block: PathBuf,
    },
    /// Print the beat markers generated for a tempo and song length.
    Beats {
        #[arg(long)]
        bpm: f64,
        /// Song length in milliseconds.
        #[arg(long)]
        length_ms: f64,
    },
    /// Assemble a project and write its game assets.
    Export {
        /// Project description (JSON).
        #[arg(short, long)]
        project: PathBuf,
        /// Folder containing one subfolder per block.
        #[arg(short, long)]
        blocks: PathBuf,
        /// Output folder for the generated files.
        #[arg(short, long)]
        out: PathBuf,
        /// Also write a block flow template.
        #[arg(long)]
        block_flow: bool,
    },
}
