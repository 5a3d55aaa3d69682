use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

use voxedit::config::{DEFAULT_CONFIG_PATH, EditorConfig};
use voxedit::export::export_map;
use voxedit::script::EditScript;
use voxedit_atlas::MaterialLibrary;
use voxedit_blocks::BlockCatalog;
use voxedit_collide::ColliderSynthesizer;
use voxedit_edit::{MapEditor, NullSink};
use voxedit_grid::VoxelGrid;
use voxedit_io::MapSaveData;
use voxedit_mesh_cpu::{MeshSynthesizer, UnitCubePrimitives};

#[derive(Parser, Debug)]
#[command(name = "voxedit", version, about = "Voxel map editor tools")]
struct Cli {
    /// Editor config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (error, warn, info, debug, trace); overrides the config
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty map
    New {
        /// Output map file
        map: PathBuf,
        /// Grid size (X Y Z); defaults come from the config
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        size: Option<Vec<i32>>,
    },
    /// Print grid dimensions and block counts
    Info { map: PathBuf },
    /// Drop stale (unplaced) records and save
    Compact { map: PathBuf },
    /// Shrink the grid to its blocks and save
    Trim { map: PathBuf },
    /// Apply a TOML edit script and save
    Edit {
        map: PathBuf,
        #[arg(long, short)]
        script: PathBuf,
        /// Block type templates; overrides the config
        #[arg(long)]
        blocks: Option<PathBuf>,
    },
    /// Build the map mesh and atlas and write OBJ/MTL/PNG files
    Mesh {
        map: PathBuf,
        /// Directory of material sheet PNGs; overrides the config
        #[arg(long)]
        sheets: Option<PathBuf>,
        /// Output directory
        #[arg(long, short, default_value = "out")]
        output: PathBuf,
    },
    /// Generate 2D colliders for one layer as JSON
    Colliders {
        map: PathBuf,
        /// Layer to generate; defaults to the config's collider layer
        #[arg(long)]
        layer: Option<i32>,
        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn map_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "map".to_owned())
}

fn load_catalog(path: Option<&Path>) -> Result<BlockCatalog, Box<dyn Error>> {
    match path {
        Some(p) => Ok(BlockCatalog::from_path(p)?),
        None => Ok(BlockCatalog::from_toml_str("")?),
    }
}

fn run(cli: Cli, cfg: EditorConfig) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::New { map, size } => {
            let d = cfg.map;
            let (w, h, z) = match size.as_deref() {
                Some([w, h, z]) => (*w, *h, *z),
                _ => (d.width, d.height, d.depth),
            };
            let grid = VoxelGrid::new(w, h, z);
            let layer = d.selected_layer.min(grid.depth() - 1);
            MapSaveData::from_grid(&grid, layer).save(&map)?;
        }
        Command::Info { map } => {
            let data = MapSaveData::load(&map)?;
            let (layer, origin) = (data.selected_layer, data.origin);
            let grid = data.into_grid();
            let (w, h, d) = grid.dims();
            let mut out = std::io::stdout().lock();
            writeln!(out, "{}: {}x{}x{} ({} cells)", map_name(&map), w, h, d, grid.len())?;
            writeln!(out, "blocks: {}", grid.count())?;
            writeln!(out, "selected layer: {}", layer)?;
            writeln!(out, "origin: {}", origin)?;
            for z in 0..d {
                let n = grid.iter_placed().filter(|(c, _)| c.z as usize == z).count();
                writeln!(out, "  layer {z}: {n}")?;
            }
        }
        Command::Compact { map } => {
            // into_grid drops the stale records
            let data = MapSaveData::load(&map)?;
            let before = data.blocks.iter().filter(|s| s.is_some()).count();
            let (layer, origin) = (data.selected_layer, data.origin);
            let grid = data.into_grid();
            log::info!("{} record(s) removed", before - grid.count());
            MapSaveData {
                origin,
                ..MapSaveData::from_grid(&grid, layer)
            }
            .save(&map)?;
        }
        Command::Trim { map } => {
            let mut editor: MapEditor<NullSink> = MapSaveData::load(&map)?.into_editor(NullSink);
            let offset = editor.trim();
            log::info!("trimmed by {}; origin now {}", offset, editor.origin());
            MapSaveData::from_editor(&editor).save(&map)?;
        }
        Command::Edit {
            map,
            script,
            blocks,
        } => {
            let catalog = load_catalog(blocks.as_deref().or(cfg.blocks_path.as_deref()))?;
            let script = EditScript::from_path(&script)?;
            let mut editor = MapSaveData::load_or_new(&map)?
                .into_editor(NullSink)
                .with_history_depth(cfg.history_depth)
                .with_catalog(catalog);
            let report = script.apply(&mut editor);
            log::info!(
                "{} op(s) applied, {} skipped; {} undo step(s) pending",
                report.applied,
                report.skipped,
                editor.history().undo_len()
            );
            MapSaveData::from_editor(&editor).save(&map)?;
        }
        Command::Mesh {
            map,
            sheets,
            output,
        } => {
            let grid = MapSaveData::load(&map)?.into_grid();
            let library = match sheets.as_deref().or(cfg.sheets_dir.as_deref()) {
                Some(dir) => MaterialLibrary::load_dir(dir)?,
                None => {
                    log::warn!("no sheets directory; every face uses the default material");
                    MaterialLibrary::new()
                }
            };
            let catalog = load_catalog(cfg.blocks_path.as_deref())?;
            let primitives = UnitCubePrimitives::from_catalog(&catalog);
            let name = map_name(&map);
            let synth = MeshSynthesizer::new(name.clone(), cfg.atlas.into());
            let result = synth.synthesize(&grid, &library, &primitives)?;
            export_map(&result, &output, &name)?;
        }
        Command::Colliders {
            map,
            layer,
            output,
        } => {
            let grid = MapSaveData::load(&map)?.into_grid();
            let z = layer.unwrap_or(cfg.collider_layer);
            let set = ColliderSynthesizer::new(map_name(&map)).synthesize(&grid, z)?;
            let json = serde_json::to_string_pretty(&set)?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let cfg = match EditorConfig::load_or_default(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let level = cli
        .log_level
        .as_deref()
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .unwrap_or_else(|| cfg.level_filter());
    if let Err(e) = TermLogger::init(
        level,
        ConfigBuilder::new().build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("logging disabled: {e}");
    }

    if let Err(e) = run(cli, cfg) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
