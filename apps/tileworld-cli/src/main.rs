use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::IVec2;
use tracing_subscriber::EnvFilter;
use tileworld_assets::{CatalogManifest, TemplateCatalog};
use tileworld_author::{ClipboardPayload, Editor, copy_region};
use tileworld_common::Rect2I;
use tileworld_kernel::{Level, World};
use tileworld_persist::{
    CURRENT_VERSION, LoadedWorld, NoLocator, SUPPORTED_VERSIONS, SaveOptions, WorldFile,
};

#[derive(Parser)]
#[command(name = "tileworld-cli", about = "CLI tool for tileworld world files")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print tool version and supported formats
    Info,
    /// Create a world with one empty level
    New {
        out: PathBuf,
        #[arg(long, default_value = "world")]
        id: String,
        /// Level size in rooms, as `x,y`
        #[arg(long, default_value = "1,1", value_parser = parse_ivec2)]
        dimensions: IVec2,
        /// Room size in tiles, as `x,y`
        #[arg(long, default_value = "10,8", value_parser = parse_ivec2)]
        room_size: IVec2,
        #[arg(long, default_value = "3")]
        layers: usize,
    },
    /// Summarize a world file
    Inspect {
        file: PathBuf,
        /// Catalog manifest (JSON) to resolve templates against
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
    /// Re-save a world file at another format version
    Convert {
        input: PathBuf,
        output: PathBuf,
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        #[arg(long, default_value_t = CURRENT_VERSION)]
        version: i32,
    },
    /// Copy a tile region of a level into a clipboard file
    Copy {
        file: PathBuf,
        /// Clipboard output (CBOR)
        out: PathBuf,
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        #[arg(long, default_value = "0")]
        level: usize,
        /// Region origin in level coordinates, as `x,y`
        #[arg(long, value_parser = parse_ivec2)]
        at: IVec2,
        /// Region size in tiles, as `x,y`
        #[arg(long, value_parser = parse_ivec2)]
        size: IVec2,
        #[arg(long, default_value = "0")]
        start_layer: usize,
        #[arg(long, default_value = "1")]
        layer_count: usize,
    },
    /// Paste a clipboard file into a level and save the world
    Paste {
        file: PathBuf,
        clipboard: PathBuf,
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        #[arg(long, default_value = "0")]
        level: usize,
        /// Destination in level coordinates, as `x,y`
        #[arg(long, value_parser = parse_ivec2)]
        at: IVec2,
        /// Output path; defaults to overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_ivec2(s: &str) -> Result<IVec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let parse = |v: &str| v.trim().parse::<i32>().map_err(|e| format!("`{v}`: {e}"));
    Ok(IVec2::new(parse(x)?, parse(y)?))
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<TemplateCatalog> {
    match path {
        Some(path) => CatalogManifest::load_catalog(path)
            .with_context(|| format!("loading catalog {}", path.display())),
        None => Ok(TemplateCatalog::builder().build()?),
    }
}

fn load_world(path: &Path, catalog: &TemplateCatalog) -> anyhow::Result<LoadedWorld> {
    let loaded = WorldFile::load_from_path(path, catalog, &mut NoLocator)
        .with_context(|| format!("loading {}", path.display()))?;
    for missing in &loaded.report.unresolved {
        tracing::warn!(kind = %missing.kind, name = %missing.name, "unresolved resource");
    }
    if loaded.report.dropped_tiles > 0 {
        tracing::warn!(count = loaded.report.dropped_tiles, "tiles dropped");
    }
    Ok(loaded)
}

fn print_summary(loaded: &LoadedWorld) {
    let world = &loaded.world;
    println!("world '{}' (format v{})", world.id(), loaded.version);
    println!(
        "start: level {} room {} tile {}",
        world.start_level_index(),
        world.start_room(),
        world.start_tile()
    );
    println!("scripts: {}", world.scripts.len());
    println!("areas: {}", world.areas().len());
    for area in world.areas() {
        println!("  {} '{}' {:?}", area.id(), area.name(), area.map_type());
    }
    println!("levels: {}", world.level_count());
    for level in world.levels() {
        println!(
            "  {}: {} rooms of {}, {} layers, {} tiles, {} action tiles",
            level.id(),
            level.dimensions(),
            level.room_size(),
            level.layer_count(),
            level.tile_count(),
            level.action_tile_count()
        );
    }
    let report = &loaded.report;
    if !report.is_clean() || report.migrated_triggers > 0 {
        println!(
            "report: {} substituted, {} unresolved, {} tiles dropped, {} properties dropped, {} triggers migrated{}",
            report.substitutions.len(),
            report.unresolved.len(),
            report.dropped_tiles,
            report.dropped_properties,
            report.migrated_triggers,
            if report.start_repaired { ", start repaired" } else { "" }
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tileworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("world format: current v{CURRENT_VERSION}, reads {SUPPORTED_VERSIONS:?}");
        }
        Commands::New {
            out,
            id,
            dimensions,
            room_size,
            layers,
        } => {
            let catalog = load_catalog(None)?;
            let mut world = World::new(id);
            world.add_level(Level::new("level_0", dimensions, room_size, layers)?);
            WorldFile::save_to_path(&out, &world, &catalog, SaveOptions::default())?;
            println!("created {}", out.display());
        }
        Commands::Inspect { file, catalog } => {
            let catalog = load_catalog(catalog.as_deref())?;
            print_summary(&load_world(&file, &catalog)?);
        }
        Commands::Convert {
            input,
            output,
            catalog,
            version,
        } => {
            anyhow::ensure!(
                SUPPORTED_VERSIONS.contains(&version),
                "version {version} not supported (expected one of {SUPPORTED_VERSIONS:?})"
            );
            let catalog = load_catalog(catalog.as_deref())?;
            let loaded = load_world(&input, &catalog)?;
            WorldFile::save_to_path(&output, &loaded.world, &catalog, SaveOptions::version(version))?;
            println!(
                "converted {} v{} -> {} v{version}",
                input.display(),
                loaded.version,
                output.display()
            );
        }
        Commands::Copy {
            file,
            out,
            catalog,
            level,
            at,
            size,
            start_layer,
            layer_count,
        } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let loaded = load_world(&file, &catalog)?;
            let source = loaded
                .world
                .level(level)
                .with_context(|| format!("level {level} not found"))?;
            let grid = copy_region(source, Rect2I::new(at, size), start_layer, layer_count);
            let bytes = ClipboardPayload::from_tile_grid(&grid).encode()?;
            std::fs::write(&out, bytes).with_context(|| format!("writing {}", out.display()))?;
            println!(
                "copied {} tiles and {} action tiles to {}",
                grid.tile_count(),
                grid.event_tiles().len(),
                out.display()
            );
        }
        Commands::Paste {
            file,
            clipboard,
            catalog,
            level,
            at,
            output,
        } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let mut loaded = load_world(&file, &catalog)?;
            let data = std::fs::read(&clipboard)
                .with_context(|| format!("reading {}", clipboard.display()))?;
            let grid = ClipboardPayload::decode(&data)?.into_tile_grid(&catalog)?;
            let pasted = Editor::new().paste(&mut loaded.world, level, &grid, at)?;
            let output = output.unwrap_or(file);
            WorldFile::save_to_path(
                &output,
                &loaded.world,
                &catalog,
                SaveOptions::version(loaded.version),
            )?;
            println!("pasted {pasted} objects into {}", output.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ivec2_argument() {
        assert_eq!(parse_ivec2("3,-4"), Ok(IVec2::new(3, -4)));
        assert_eq!(parse_ivec2(" 1 , 2 "), Ok(IVec2::new(1, 2)));
        assert!(parse_ivec2("3").is_err());
        assert!(parse_ivec2("a,1").is_err());
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from([
            "tileworld-cli",
            "convert",
            "in.twld",
            "out.twld",
            "--version",
            "2",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Convert { version: 2, .. }));
    }
}
