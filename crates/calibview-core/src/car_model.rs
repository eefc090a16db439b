//! Car model registry entries.
//!
//! A registry file maps model names to their mesh path and placement chain:
//!
//! ```json
//! {
//!   "Sharan": {
//!     "path": "carmodels/Sharan/Sharan.osgb",
//!     "transformations": [ { "type": "rotate", "angle": -90, "x": 1 } ]
//!   }
//! }
//! ```
//!
//! The entries may also be nested under a top-level `"models"` object. An
//! object under `"models"` that has its own `"path"` is read as a model entry.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::config::{ConfigDocument, ConfigObject};
use crate::error::{CalibviewError, Result};
use crate::transform::{TransformChain, TransformStep};

/// A vehicle model: its mesh and how to place it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarModelConfig {
    /// Registry name of the model.
    pub name: String,
    /// Mesh file path, as written in the registry.
    pub mesh_path: PathBuf,
    /// Placement of the mesh in the scene.
    pub chain: TransformChain,
}

impl CarModelConfig {
    /// Creates a model configuration directly.
    pub fn new(name: impl Into<String>, mesh_path: impl Into<PathBuf>, chain: TransformChain) -> Self {
        Self {
            name: name.into(),
            mesh_path: mesh_path.into(),
            chain,
        }
    }

    /// Loads the model called `name` from the registry at `registry_path`.
    ///
    /// # Errors
    ///
    /// `ConfigNotFound` if the registry cannot be read, `ModelNotFound` if it has
    /// no entry for `name`, and `MalformedModelEntry` if the entry lacks a string
    /// `path` or a `transformations` array.
    pub fn load(registry_path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let doc = ConfigDocument::load(registry_path)?;
        Self::from_document(&doc, name)
    }

    /// Decodes the model called `name` from a parsed registry.
    pub fn from_document(doc: &ConfigDocument, name: &str) -> Result<Self> {
        let models = registry_root(doc)?;

        let entry = models.get(name).ok_or_else(|| CalibviewError::ModelNotFound {
            name: name.to_string(),
            path: doc.path().to_path_buf(),
        })?;
        let entry = ConfigObject::from_value(doc.path(), name, entry)
            .ok_or_else(|| malformed(name, "entry is not an object"))?;

        let mesh_path = match entry.get("path") {
            Some(Value::String(path)) => PathBuf::from(path.trim()),
            _ => return Err(malformed(name, "missing string field 'path'")),
        };

        let Some(Value::Array(items)) = entry.get("transformations") else {
            return Err(malformed(name, "missing array field 'transformations'"));
        };

        let mut chain = TransformChain::new();
        for (i, item) in items.iter().enumerate() {
            let scope = entry.qualified(&format!("transformations[{i}]"));
            let step_obj = ConfigObject::from_value(doc.path(), scope, item).ok_or_else(|| {
                malformed(name, &format!("transformation {i} is not an object"))
            })?;
            if let Some(step) = TransformStep::decode(&step_obj)? {
                chain.push(step);
            }
        }

        log::info!(
            "Loaded car model '{name}': mesh {}, {} transformation(s)",
            mesh_path.display(),
            chain.len()
        );
        for step in chain.steps() {
            log::debug!("  {step:?}");
        }

        Ok(Self::new(name, mesh_path, chain))
    }
}

/// Lists every model name in the registry at `registry_path`, sorted.
pub fn available_models(registry_path: impl AsRef<Path>) -> Result<Vec<String>> {
    let doc = ConfigDocument::load(registry_path)?;
    Ok(registry_root(&doc)?.keys().map(str::to_string).collect())
}

/// Returns the object holding the model entries.
///
/// A top-level `models` object is a wrapper only when it is not itself a model
/// entry, so a model literally named `models` still loads.
fn registry_root(doc: &ConfigDocument) -> Result<ConfigObject<'_>> {
    let root = doc.root()?;
    let wrapper = root
        .get("models")
        .and_then(|value| ConfigObject::from_value(doc.path(), "models", value))
        .filter(|models| !models.contains("path"));
    Ok(wrapper.unwrap_or(root))
}

fn malformed(name: &str, reason: &str) -> CalibviewError {
    CalibviewError::MalformedModelEntry {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
