//! Loading a complete scene from a models directory.
//!
//! The conventional layout is:
//!
//! ```text
//! <models_dir>/carmodels.json              registry of all models
//! <models_dir>/<model>/calibration.json    camera calibration
//! <models_dir>/<model>/viewing_zones.json  viewing zone tables
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use calibview_core::{
    compose, CalibrationData, CalibviewError, CarModelConfig, ComposedScene, Result,
    ViewingZoneSet, ZoneId,
};

/// Model shown when none is requested.
pub const DEFAULT_MODEL: &str = "Sharan";
/// Registry file name inside the models directory.
pub const REGISTRY_FILE: &str = "carmodels.json";
/// Calibration file name inside a model directory.
pub const CALIBRATION_FILE: &str = "calibration.json";
/// Zones file name inside a model directory.
pub const ZONES_FILE: &str = "viewing_zones.json";

/// Locations of the three configuration sources for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub registry: PathBuf,
    pub calibration: PathBuf,
    pub zones: PathBuf,
}

impl ModelPaths {
    /// Resolves the conventional layout for `model` under `models_dir`.
    pub fn new(models_dir: impl AsRef<Path>, model: &str) -> Self {
        let dir = models_dir.as_ref();
        Self {
            registry: dir.join(REGISTRY_FILE),
            calibration: dir.join(model).join(CALIBRATION_FILE),
            zones: dir.join(model).join(ZONES_FILE),
        }
    }
}

/// What to load and how to filter it.
#[derive(Debug, Clone)]
pub struct SceneRequest {
    model: String,
    paths: ModelPaths,
    zone: Option<ZoneId>,
}

impl SceneRequest {
    /// Requests `model` from the conventional layout under `models_dir`.
    pub fn new(models_dir: impl AsRef<Path>, model: impl Into<String>) -> Self {
        let model = model.into();
        let paths = ModelPaths::new(models_dir, &model);
        Self::from_paths(model, paths)
    }

    /// Requests `model` from explicit file locations.
    pub fn from_paths(model: impl Into<String>, paths: ModelPaths) -> Self {
        Self {
            model: model.into(),
            paths,
            zone: None,
        }
    }

    /// Restricts the scene to a single zone.
    #[must_use]
    pub fn with_zone(mut self, zone: Option<ZoneId>) -> Self {
        self.zone = zone;
        self
    }

    /// Returns the requested model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the resolved file locations.
    pub fn paths(&self) -> &ModelPaths {
        &self.paths
    }

    /// Returns the zone filter, if any.
    pub fn zone(&self) -> Option<ZoneId> {
        self.zone
    }
}

/// Loads every source for the request and composes the scene.
///
/// # Errors
///
/// Returns the first loading error. No scene is produced in that case.
pub fn load_scene(request: &SceneRequest) -> Result<ComposedScene> {
    let paths = request.paths();
    log::info!("Loading model '{}'", request.model());

    let model = CarModelConfig::load(&paths.registry, request.model())?;
    let calibration = CalibrationData::load(&paths.calibration)?;
    let zones = ViewingZoneSet::load(&paths.zones)?;

    Ok(compose(&model, &calibration, &zones, request.zone()))
}

/// Writes a composed scene as pretty-printed JSON.
///
/// The file is flushed before returning, so a failed final write is reported.
pub fn write_scene_json(scene: &ComposedScene, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, scene).map_err(|source| CalibviewError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush()?;
    log::info!("Wrote composed scene to {}", path.display());
    Ok(())
}
