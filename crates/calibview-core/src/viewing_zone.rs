//! Viewing zones: labelled quadrilaterals around the vehicle.
//!
//! A zones file holds a fixed table of [`ZONE_COUNT`] entries:
//!
//! ```json
//! {
//!   "zones":  [ [x1, y1, z1, x2, y2, z2, x3, y3, z3, x4, y4, z4], ... ],
//!   "colors": [ [r, g, b, a], ... ]
//! }
//! ```
//!
//! Ids and labels come from the table position. Entries whose corners are all
//! at the origin mark unused slots; they are kept in the set and dropped by the
//! scene composer.

use std::fmt;
use std::path::Path;

use glam::{DVec3, DVec4};
use serde::Serialize;

use crate::config::ConfigDocument;
use crate::error::{CalibviewError, Result};

/// Number of zone slots in a zones file.
pub const ZONE_COUNT: usize = 20;

/// Corners shorter than this count as "at the origin".
pub const UNUSED_EPSILON: f64 = 1e-6;

/// Color used when a zones file has no color table.
pub const DEFAULT_ZONE_COLOR: DVec4 = DVec4::new(1.0, 0.0, 1.0, 0.7);

/// Alpha used for colors given as RGB only.
pub const DEFAULT_ZONE_ALPHA: f64 = 0.7;

/// A 1-based zone number in `1..=ZONE_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ZoneId(u32);

impl ZoneId {
    /// Validates a zone number.
    ///
    /// # Errors
    ///
    /// Returns `InvalidZoneId` if `id` is outside `1..=ZONE_COUNT`.
    pub fn new(id: i64) -> Result<Self> {
        match u32::try_from(id) {
            Ok(n) if n >= 1 && n as usize <= ZONE_COUNT => Ok(Self(n)),
            _ => Err(CalibviewError::InvalidZoneId {
                id,
                max: ZONE_COUNT as u32,
            }),
        }
    }

    /// Returns the zone id for table position `index` (0-based).
    fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    /// Returns the 1-based number.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Returns the 0-based table position.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One viewing zone in the vehicle's local frame (meters).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewingZone {
    pub id: ZoneId,
    pub label: String,
    /// RGBA color.
    pub color: DVec4,
    pub corners: [DVec3; 4],
}

impl ViewingZone {
    /// Builds a zone from 12 corner values.
    pub fn from_values(id: ZoneId, values: &[f64; 12], color: DVec4) -> Self {
        let corner = |i: usize| DVec3::new(values[3 * i], values[3 * i + 1], values[3 * i + 2]);
        Self {
            id,
            label: format!("Zone {id}"),
            color,
            corners: [corner(0), corner(1), corner(2), corner(3)],
        }
    }

    /// Returns true if every corner is at the origin.
    ///
    /// This is a magnitude test on raw coordinates: a real zone lying exactly on
    /// the origin would also be reported as unused.
    pub fn is_unused(&self) -> bool {
        self.corners.iter().all(|c| c.length() < UNUSED_EPSILON)
    }

    /// Mean of the four corners, used as the label anchor.
    pub fn centroid(&self) -> DVec3 {
        self.corners.iter().copied().sum::<DVec3>() / 4.0
    }

    /// Axis-aligned bounds `(min, max)` of the corners.
    pub fn bounds(&self) -> (DVec3, DVec3) {
        self.corners.iter().fold(
            (DVec3::splat(f64::MAX), DVec3::splat(f64::MIN)),
            |(min, max), c| (min.min(*c), max.max(*c)),
        )
    }

    /// Center of the axis-aligned bounds.
    pub fn center(&self) -> DVec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }
}

/// The full table of zones from one zones file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewingZoneSet {
    zones: Vec<ViewingZone>,
}

impl ViewingZoneSet {
    /// Builds the zone set from in-memory tables.
    ///
    /// `colors`, when given, must be parallel to `corner_tables`.
    pub fn from_tables(corner_tables: &[[f64; 12]; ZONE_COUNT], colors: Option<&[DVec4; ZONE_COUNT]>) -> Self {
        let zones = corner_tables
            .iter()
            .enumerate()
            .map(|(i, values)| {
                let color = colors.map_or(DEFAULT_ZONE_COLOR, |c| c[i]);
                ViewingZone::from_values(ZoneId::from_index(i), values, color)
            })
            .collect();
        Self { zones }
    }

    /// Loads a zones file.
    ///
    /// # Errors
    ///
    /// `ConfigNotFound` if the file cannot be read, `MissingField` without a
    /// `zones` table, `MalformedArray` when the tables have the wrong shape and
    /// `MalformedNumber` for non-numeric entries.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let doc = ConfigDocument::load(path)?;
        Self::from_document(&doc)
    }

    /// Decodes a zone set from a parsed document.
    pub fn from_document(doc: &ConfigDocument) -> Result<Self> {
        let root = doc.root()?;

        let rows = root.array("zones")?;
        if rows.len() != ZONE_COUNT {
            return Err(CalibviewError::MalformedArray {
                path: doc.path().to_path_buf(),
                key: "zones".to_string(),
                expected: ZONE_COUNT,
                actual: rows.len(),
            });
        }
        let mut tables = [[0.0; 12]; ZONE_COUNT];
        for (i, row) in rows.iter().enumerate() {
            let values = root.numbers_from(&format!("zones[{i}]"), row, 12)?;
            tables[i].copy_from_slice(&values);
        }

        let colors = match root.get("colors") {
            None => None,
            Some(_) => {
                let rows = root.array("colors")?;
                if rows.len() != ZONE_COUNT {
                    return Err(CalibviewError::MalformedArray {
                        path: doc.path().to_path_buf(),
                        key: "colors".to_string(),
                        expected: ZONE_COUNT,
                        actual: rows.len(),
                    });
                }
                let mut colors = [DEFAULT_ZONE_COLOR; ZONE_COUNT];
                for (i, row) in rows.iter().enumerate() {
                    let key = format!("colors[{i}]");
                    let rgba = match root.numbers_from(&key, row, 4) {
                        Ok(v) => DVec4::new(v[0], v[1], v[2], v[3]),
                        Err(CalibviewError::MalformedArray { actual: 3, .. }) => {
                            let v = root.numbers_from(&key, row, 3)?;
                            DVec4::new(v[0], v[1], v[2], DEFAULT_ZONE_ALPHA)
                        }
                        Err(e) => return Err(e),
                    };
                    colors[i] = rgba;
                }
                Some(colors)
            }
        };

        let set = Self::from_tables(&tables, colors.as_ref());
        log::info!(
            "Loaded {} viewing zone slot(s) from {} ({} unused)",
            set.len(),
            doc.path().display(),
            set.iter().filter(|z| z.is_unused()).count()
        );
        Ok(set)
    }

    /// Returns the zone with the given id.
    pub fn get(&self, id: ZoneId) -> Option<&ViewingZone> {
        self.zones.get(id.index())
    }

    /// Iterates over all zones in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ViewingZone> {
        self.zones.iter()
    }

    /// Returns the number of zone slots.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns true if the set has no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
