use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use aas_core::router::tables::{MAX_REACHABILITYPASSAREAS, MAX_REVERSED_PER_AREA};
use aas_core::router::RoutingTables;
use aas_core::{loader, world::AreaContents};

#[derive(Parser, Debug)]
#[command(name = "aas-builder", version, about = "Offline validator for compiled .aas area files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a compiled map, build its routing tables, and report a summary.
    Check {
        /// Path to a compiled `.aas` file.
        path: PathBuf,
        /// Expected checksum to validate against the file's own (hex or decimal).
        #[arg(long)]
        checksum: Option<u32>,
    },
}

fn run_check(path: &PathBuf, checksum: Option<u32>) -> Result<()> {
    let load_start = Instant::now();
    let world = loader::load_from_path(path, checksum)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let load_elapsed = load_start.elapsed();

    let build_start = Instant::now();
    let tables = RoutingTables::build(&world)
        .with_context(|| "failed to build routing tables")?;
    let build_elapsed = build_start.elapsed();

    let num_areas = world.area_settings.len();
    let num_reachable = world
        .area_settings
        .iter()
        .filter(|s| !s.contents.contains(AreaContents::DONOTENTER))
        .count();

    info!(
        path = %path.display(),
        load_ms = load_elapsed.as_millis(),
        build_ms = build_elapsed.as_millis(),
        vertices = world.vertices.len(),
        planes = world.planes.len(),
        faces = world.faces.len(),
        areas = num_areas,
        reachable_areas = num_reachable,
        nodes = world.nodes.len(),
        clusters = world.clusters.len(),
        portals = world.portals.len(),
        reachabilities = world.reachability.len(),
        "map checked"
    );

    for (area_idx, links) in tables.reversed_reachability_range.iter().enumerate() {
        if links.1 as usize >= MAX_REVERSED_PER_AREA {
            warn!(area = area_idx, count = links.1, "area at or above reversed-reachability cap");
        }
    }
    for (reach_idx, range) in tables.reachability_area_range.iter().enumerate() {
        if range.1 as usize >= MAX_REACHABILITYPASSAREAS {
            warn!(reach = reach_idx, count = range.1, "reachability at or above pass-area cap");
        }
    }

    if num_areas == 0 {
        warn!("map has no areas");
    }
    if world.clusters.is_empty() && num_areas > 0 {
        warn!("map has areas but no clusters; cross-cluster routing will never run");
    }

    Ok(())
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_ansi(false).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();
    match args.command {
        Command::Check { path, checksum } => run_check(&path, checksum),
    }
}
