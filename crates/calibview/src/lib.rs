//! calibview: visual check of a vehicle camera's calibration.
//!
//! Loads a car model, its camera calibration and a table of viewing zones,
//! then composes the world-space scene a 3-D viewer displays: the vehicle mesh
//! under its placement chain, the camera center and frustum, the zone polygons
//! and a set of world axes.
//!
//! # Quick Start
//!
//! ```no_run
//! use calibview::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let request = SceneRequest::new("carmodels", DEFAULT_MODEL)
//!         .with_zone(Some(ZoneId::new(9)?));
//!     let scene = load_scene(&request)?;
//!
//!     let graph = SceneGraph::from_scene(&scene);
//!     graph.log_structure();
//!     Ok(())
//! }
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

mod init;
pub mod scene_graph;
pub mod session;

pub use init::init_logging;
pub use scene_graph::{SceneGraph, SceneNode};
pub use session::{
    load_scene, write_scene_json, ModelPaths, SceneRequest, DEFAULT_MODEL, REGISTRY_FILE,
};

// Re-export core types
pub use calibview_core::{
    available_models, compose, AxesGeometry, CalibrationData, CalibviewError, CameraIntrinsics,
    CameraPlacement, CarModelConfig, ComposedScene, ComposedZone, ExclusionReason, Result,
    TransformChain, TransformStep, ViewingZone, ViewingZoneSet, VisualizationOptions, ZoneId,
    ZONE_COUNT,
};

// Re-export glam types for convenience
pub use calibview_core::{DMat3, DMat4, DVec3, DVec4};
