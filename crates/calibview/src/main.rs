//! calibview CLI: load a model's calibration and viewing zones and report the scene.

use std::path::PathBuf;

use calibview::{
    available_models, init_logging, load_scene, write_scene_json, CalibviewError, Result,
    SceneGraph, SceneRequest, ZoneId, DEFAULT_MODEL,
};
use clap::Parser;

/// Camera calibration viewer.
#[derive(Debug, Parser)]
#[command(name = "calibview")]
#[command(version, about = "Compose a camera calibration scene from a models directory")]
struct Args {
    /// Directory holding carmodels.json and one folder per model.
    #[arg(long, default_value = "carmodels")]
    models_dir: PathBuf,

    /// Model name in the registry.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Display only this zone (1-20).
    #[arg(long)]
    zone: Option<i64>,

    /// Write the composed scene as JSON to this file.
    #[arg(long)]
    dump_scene: Option<PathBuf>,
}

fn main() {
    init_logging();
    if let Err(err) = try_main() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let zone = args.zone.map(ZoneId::new).transpose()?;

    let request = SceneRequest::new(&args.models_dir, args.model).with_zone(zone);
    let scene = match load_scene(&request) {
        Ok(scene) => scene,
        Err(err @ CalibviewError::ModelNotFound { .. }) => {
            if let Ok(names) = available_models(&request.paths().registry) {
                log::info!("Available models: {}", names.join(", "));
            }
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    let graph = SceneGraph::from_scene(&scene);
    graph.log_structure();
    if let Some(id) = zone {
        match scene.zone(id) {
            Some(z) => log::info!(
                "Zone {id} corner 1: {:.6}, {:.6}, {:.6}",
                z.local_corners[0].x,
                z.local_corners[0].y,
                z.local_corners[0].z
            ),
            None => log::warn!("Zone {id} is not part of the scene"),
        }
    }

    if let Some(path) = &args.dump_scene {
        write_scene_json(&scene, path)?;
    }
    Ok(())
}
