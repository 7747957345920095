//! Placement Runner CLI

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use u_placement_cli::{PlacementRunner, RunConfig, SceneParser};
use u_placement_core::PlacementRecord;

#[derive(Parser)]
#[command(name = "place-runner")]
#[command(about = "Randomized object placement runner for U-Placement scenes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one placement pass over a scene
    Sample {
        /// Path to the JSON scene file
        scene: PathBuf,

        /// Seed of the random generator
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Override the retry budget of every sampler
        #[arg(short, long)]
        attempts: Option<usize>,

        /// Passes to rerun after an exhausted one
        #[arg(short, long, default_value = "0")]
        retries: usize,

        /// Output file for the placements (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the sampler tree without sampling
    Validate {
        /// Path to the JSON scene file
        scene: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sample {
            scene,
            seed,
            attempts,
            retries,
            output,
        } => {
            let scene = SceneParser::new()
                .with_attempts(attempts)
                .parse_file(&scene)?;

            let config = RunConfig::new().with_seed(seed).with_retries(retries);
            let placed = PlacementRunner::new(config).run(&scene)?;

            let records: Vec<PlacementRecord> = placed.records();
            let json = serde_json::to_string_pretty(&records)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Placements saved to: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Validate { scene: path } => {
            let scene = SceneParser::new().parse_file(&path)?;
            println!("Scene OK: {}", path.display());
            println!("  Root sampler: {}", scene.sampler.name());
            println!("  Objects: {}", scene.objects.len());
            println!("  Fixtures: {}", scene.fixtures.len());
            println!("  Sampled objects: {}", scene.sampler.object_names().len());
        }
    }

    Ok(())
}
