//! Scene composition: turns loaded configuration into world-space entities.
//!
//! The composer is infallible. Everything that can fail happens while loading,
//! so a [`ComposedScene`] is either complete or never built.

use std::path::PathBuf;

use glam::{DMat4, DVec3, DVec4};
use serde::Serialize;

use crate::calibration::CalibrationData;
use crate::car_model::CarModelConfig;
use crate::viewing_zone::{ViewingZone, ViewingZoneSet, ZoneId};

/// Zone corners are pre-aligned to the vehicle's transformed frame.
///
/// Zones therefore receive only the meters-to-display-units scale. Applying the
/// vehicle's transform chain to them as well would place them twice.
pub const ZONE_FRAME_CONTRACT: &str = "zone corners are pre-aligned to the vehicle's transformed frame";

/// Frustum half-width at the base, in frustum-local units.
pub const FRUSTUM_HALF_WIDTH: f64 = 0.2;
/// Frustum half-height at the base, in frustum-local units.
pub const FRUSTUM_HALF_HEIGHT: f64 = 0.15;
/// Distance from apex to base, in frustum-local units.
pub const FRUSTUM_DEPTH: f64 = 0.3;

/// The camera frustum pyramid in its local frame.
///
/// The apex sits at the origin. The shape never changes; size comes from the
/// pose transform only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrustumShape {
    pub apex: DVec3,
    /// Base corners, counter-clockwise starting at bottom-left.
    pub base: [DVec3; 4],
}

impl Default for FrustumShape {
    fn default() -> Self {
        let (w, h, d) = (FRUSTUM_HALF_WIDTH, FRUSTUM_HALF_HEIGHT, FRUSTUM_DEPTH);
        Self {
            apex: DVec3::ZERO,
            base: [
                DVec3::new(-w, -h, d),
                DVec3::new(w, -h, d),
                DVec3::new(w, h, d),
                DVec3::new(-w, h, d),
            ],
        }
    }
}

impl FrustumShape {
    /// Wireframe edges: four apex-to-base edges, then the base rectangle.
    pub fn edges(&self) -> [(DVec3, DVec3); 8] {
        let b = self.base;
        [
            (self.apex, b[0]),
            (self.apex, b[1]),
            (self.apex, b[2]),
            (self.apex, b[3]),
            (b[0], b[1]),
            (b[1], b[2]),
            (b[2], b[3]),
            (b[3], b[0]),
        ]
    }
}

/// World axes with arrowheads, drawn at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxesGeometry {
    pub length: f64,
    pub arrow_size: f64,
}

/// One colored line segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineSegment {
    pub start: DVec3,
    pub end: DVec3,
    pub color: DVec4,
}

impl AxesGeometry {
    /// Red X, green Y and blue Z, each as a shaft plus two arrowhead wings.
    pub fn segments(&self) -> Vec<LineSegment> {
        let l = self.length;
        let a = self.arrow_size;
        let half = a * 0.5;

        let red = DVec4::new(1.0, 0.0, 0.0, 1.0);
        let green = DVec4::new(0.0, 1.0, 0.0, 1.0);
        let blue = DVec4::new(0.0, 0.0, 1.0, 1.0);

        let x_tip = DVec3::new(l, 0.0, 0.0);
        let y_tip = DVec3::new(0.0, l, 0.0);
        let z_tip = DVec3::new(0.0, 0.0, l);

        let seg = |start, end, color| LineSegment { start, end, color };
        vec![
            seg(DVec3::ZERO, x_tip, red),
            seg(x_tip, DVec3::new(l - a, half, 0.0), red),
            seg(x_tip, DVec3::new(l - a, -half, 0.0), red),
            seg(DVec3::ZERO, y_tip, green),
            seg(y_tip, DVec3::new(half, l - a, 0.0), green),
            seg(y_tip, DVec3::new(-half, l - a, 0.0), green),
            seg(DVec3::ZERO, z_tip, blue),
            seg(z_tip, DVec3::new(0.0, half, l - a), blue),
            seg(z_tip, DVec3::new(0.0, -half, l - a), blue),
        ]
    }
}

/// A zone ready for drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedZone {
    pub id: ZoneId,
    pub label: String,
    /// Corners in the vehicle frame, in meters. Drawn under `zone_transform`.
    pub local_corners: [DVec3; 4],
    /// Corners after `zone_transform`, in display units.
    pub world_corners: [DVec3; 4],
    /// Label position in the vehicle frame.
    pub label_anchor: DVec3,
    /// Outline color, always fully opaque.
    pub outline_color: DVec4,
    /// Fill color with the configured alpha.
    pub fill_color: DVec4,
}

/// Why a zone is absent from the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExclusionReason {
    /// A zone filter selected a different id.
    FilteredOut,
    /// All four corners are at the origin.
    Unused,
}

/// The camera marker and frustum placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPlacement {
    /// Camera center in meters, straight from the calibration.
    pub center_m: DVec3,
    /// Camera center in display units.
    pub center_world: DVec3,
    /// Radius of the world-space marker, in display units.
    pub marker_radius: f64,
    /// Uniform scale of the frustum node.
    pub frustum_scale: f64,
    /// Frustum node transform.
    pub frustum_pose: DMat4,
    /// Radius of the marker drawn inside the frustum node, in local units.
    pub frustum_marker_radius: f64,
    pub frustum: FrustumShape,
}

impl CameraPlacement {
    /// Radius of the frustum marker once the frustum pose is applied.
    pub fn rendered_frustum_marker_radius(&self) -> f64 {
        self.frustum_pose
            .transform_vector3(DVec3::new(self.frustum_marker_radius, 0.0, 0.0))
            .length()
    }
}

/// Everything the renderer needs, in world space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedScene {
    pub model_name: String,
    pub mesh_path: PathBuf,
    /// Placement of the vehicle mesh.
    pub vehicle_transform: DMat4,
    pub camera: CameraPlacement,
    /// Unit-scale transform shared by every zone node.
    pub zone_transform: DMat4,
    pub zones: Vec<ComposedZone>,
    pub excluded: Vec<(ZoneId, ExclusionReason)>,
    pub axes: AxesGeometry,
}

impl ComposedScene {
    /// Looks up a retained zone.
    pub fn zone(&self, id: ZoneId) -> Option<&ComposedZone> {
        self.zones.iter().find(|z| z.id == id)
    }
}

/// Composes the scene.
///
/// `filter` keeps only the given zone id; all other zones are dropped before
/// the unused-zone check runs. Zones are placed according to
/// [`ZONE_FRAME_CONTRACT`].
pub fn compose(
    model: &CarModelConfig,
    calibration: &CalibrationData,
    zones: &ViewingZoneSet,
    filter: Option<ZoneId>,
) -> ComposedScene {
    let vis = &calibration.visualization;
    let unit_scale = vis.unit_scale;

    let frustum_scale = vis.frustum_scale();
    let camera = CameraPlacement {
        center_m: calibration.camera_center(),
        center_world: calibration.camera_center() * unit_scale,
        marker_radius: vis.camera_marker_radius,
        frustum_scale,
        frustum_pose: DMat4::from_scale(DVec3::splat(frustum_scale)),
        frustum_marker_radius: vis.frustum_marker_radius(),
        frustum: FrustumShape::default(),
    };
    let c = camera.center_m;
    log::info!(
        "Camera center: ({:.3}, {:.3}, {:.3}) m, frustum scale {frustum_scale}",
        c.x,
        c.y,
        c.z
    );

    let zone_transform = DMat4::from_scale(DVec3::splat(unit_scale));

    match filter {
        Some(id) => log::info!("Creating only zone {id}"),
        None => log::info!("Creating all viewing zones"),
    }

    let mut retained = Vec::new();
    let mut excluded = Vec::new();
    for zone in zones.iter() {
        if filter.is_some_and(|id| id != zone.id) {
            excluded.push((zone.id, ExclusionReason::FilteredOut));
            continue;
        }
        if zone.is_unused() {
            log::info!("Skipping {} - all zero coordinates", zone.label);
            excluded.push((zone.id, ExclusionReason::Unused));
            continue;
        }
        let composed = compose_zone(zone, &zone_transform);
        let center = zone.center() * unit_scale;
        log::debug!(
            "Creating {} - center ({:.1}, {:.1}, {:.1})",
            zone.label,
            center.x,
            center.y,
            center.z
        );
        retained.push(composed);
    }
    log::info!("Created {} viewing zone(s)", retained.len());

    ComposedScene {
        model_name: model.name.clone(),
        mesh_path: model.mesh_path.clone(),
        vehicle_transform: model.chain.matrix(),
        camera,
        zone_transform,
        zones: retained,
        excluded,
        axes: AxesGeometry {
            length: vis.axis_length,
            arrow_size: vis.axis_arrow_size,
        },
    }
}

fn compose_zone(zone: &ViewingZone, zone_transform: &DMat4) -> ComposedZone {
    let rgb = zone.color.truncate();
    ComposedZone {
        id: zone.id,
        label: zone.label.clone(),
        local_corners: zone.corners,
        world_corners: zone.corners.map(|c| zone_transform.transform_point3(c)),
        label_anchor: zone.centroid(),
        outline_color: rgb.extend(1.0),
        fill_color: zone.color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CameraIntrinsics;
    use crate::options::VisualizationOptions;
    use crate::transform::TransformChain;
    use crate::viewing_zone::ZONE_COUNT;
    use glam::{DMat3, DVec2};
    use proptest::prelude::*;

    fn calibration(visualization: VisualizationOptions) -> CalibrationData {
        CalibrationData::new(
            DMat3::IDENTITY,
            DVec3::new(-0.39774068678243776, 0.023064699630140467, 0.5953452132457162),
            CameraIntrinsics {
                principal_point: DVec2::new(640.0, 360.0),
                focal_length: DVec2::new(900.0, 900.0),
                radial_distortion: [0.0; 6],
                tangential_distortion: [0.0; 2],
            },
            visualization,
        )
    }

    fn model() -> CarModelConfig {
        CarModelConfig::new(
            "Sharan",
            "carmodels/Sharan/Sharan.osgb",
            TransformChain::new().rotate(-90.0, DVec3::X),
        )
    }

    fn zones_with_unused(unused: &[usize]) -> ViewingZoneSet {
        let mut tables = [[0.0; 12]; ZONE_COUNT];
        for (i, t) in tables.iter_mut().enumerate() {
            if !unused.contains(&(i + 1)) {
                let o = i as f64 * 0.1 + 0.1;
                *t = [o, 0.1, 0.4, o + 0.1, 0.1, 0.4, o + 0.1, -0.2, 0.6, o, -0.2, 0.6];
            }
        }
        ViewingZoneSet::from_tables(&tables, None)
    }

    #[test]
    fn test_camera_center_world() {
        let cal = calibration(VisualizationOptions::default());
        let scene = compose(&model(), &cal, &zones_with_unused(&[]), None);
        assert_eq!(scene.camera.center_world, cal.translation * 1000.0);
        assert_eq!(scene.camera.center_m, cal.translation);
    }

    #[test]
    fn test_frustum_pose_and_marker() {
        let cal = calibration(VisualizationOptions::default());
        let scene = compose(&model(), &cal, &zones_with_unused(&[]), None);
        let camera = &scene.camera;
        assert!((camera.frustum_scale - 700.0).abs() < 1e-9);
        assert_eq!(camera.frustum_pose, DMat4::from_scale(DVec3::splat(camera.frustum_scale)));
        assert!((camera.rendered_frustum_marker_radius() - 20.0).abs() < 1e-9);

        // Geometry keeps fixed proportions regardless of scale.
        assert_eq!(camera.frustum.apex, DVec3::ZERO);
        assert_eq!(camera.frustum.base[2], DVec3::new(0.2, 0.15, 0.3));
        assert_eq!(camera.frustum.edges().len(), 8);
    }

    #[test]
    fn test_zones_are_not_vehicle_transformed() {
        let cal = calibration(VisualizationOptions::default());
        let zones = zones_with_unused(&[]);
        let scene = compose(&model(), &cal, &zones, None);

        assert_ne!(scene.vehicle_transform, DMat4::IDENTITY);
        assert_eq!(scene.zone_transform, DMat4::from_scale(DVec3::splat(1000.0)));

        let zone = scene.zone(ZoneId::new(1).unwrap()).unwrap();
        let source = zones.get(ZoneId::new(1).unwrap()).unwrap();
        for (world, local) in zone.world_corners.iter().zip(source.corners) {
            assert!((*world - local * 1000.0).length() < 1e-9);
        }
    }

    #[test]
    fn test_unused_zones_excluded() {
        let cal = calibration(VisualizationOptions::default());
        let scene = compose(&model(), &cal, &zones_with_unused(&[20, 7]), None);
        assert_eq!(scene.zones.len(), ZONE_COUNT - 2);
        assert!(scene.zone(ZoneId::new(7).unwrap()).is_none());
        assert!(scene
            .excluded
            .contains(&(ZoneId::new(20).unwrap(), ExclusionReason::Unused)));
    }

    #[test]
    fn test_every_slot_can_be_unused() {
        let cal = calibration(VisualizationOptions::default());
        for id in 1..=ZONE_COUNT {
            let scene = compose(&model(), &cal, &zones_with_unused(&[id]), None);
            let zone_id = ZoneId::new(id as i64).unwrap();
            assert!(scene.zone(zone_id).is_none(), "zone {id} should be excluded");
            assert_eq!(scene.zones.len(), ZONE_COUNT - 1);
        }
    }

    #[test]
    fn test_single_nonzero_coordinate_keeps_zone() {
        let cal = calibration(VisualizationOptions::default());
        for id in 1..=ZONE_COUNT {
            let mut tables = [[0.0; 12]; ZONE_COUNT];
            tables[id - 1][id % 12] = 0.5;
            let zones = ViewingZoneSet::from_tables(&tables, None);
            let scene = compose(&model(), &cal, &zones, None);
            assert_eq!(scene.zones.len(), 1);
            assert_eq!(scene.zones[0].id.get() as usize, id);
        }
    }

    #[test]
    fn test_zone_filter() {
        let cal = calibration(VisualizationOptions::default());
        let nine = ZoneId::new(9).unwrap();
        let scene = compose(&model(), &cal, &zones_with_unused(&[20]), Some(nine));
        assert_eq!(scene.zones.len(), 1);
        assert_eq!(scene.zones[0].label, "Zone 9");
        assert_eq!(scene.excluded.len(), ZONE_COUNT - 1);

        // Filtering to an unused slot leaves nothing.
        let twenty = ZoneId::new(20).unwrap();
        let scene = compose(&model(), &cal, &zones_with_unused(&[20]), Some(twenty));
        assert!(scene.zones.is_empty());
        assert!(scene.excluded.contains(&(twenty, ExclusionReason::Unused)));
    }

    #[test]
    fn test_zone_colors() {
        let cal = calibration(VisualizationOptions::default());
        let scene = compose(&model(), &cal, &zones_with_unused(&[]), None);
        let zone = &scene.zones[0];
        assert_eq!(zone.outline_color, DVec4::new(1.0, 0.0, 1.0, 1.0));
        assert_eq!(zone.fill_color, DVec4::new(1.0, 0.0, 1.0, 0.7));
    }

    #[test]
    fn test_axes_segments() {
        let axes = AxesGeometry {
            length: 1500.0,
            arrow_size: 300.0,
        };
        let segments = axes.segments();
        assert_eq!(segments.len(), 9);
        assert_eq!(segments[0].end, DVec3::new(1500.0, 0.0, 0.0));
        assert_eq!(segments[4].end, DVec3::new(150.0, 1200.0, 0.0));
        assert_eq!(segments[8].end, DVec3::new(0.0, -150.0, 1200.0));
        assert_eq!(segments[6].color, DVec4::new(0.0, 0.0, 1.0, 1.0));
    }

    proptest! {
        #[test]
        fn prop_marker_radius_round_trip(
            radius in 0.01f64..500.0,
            factor in 0.01f64..10.0,
            unit_scale in 0.1f64..10_000.0,
        ) {
            let options = VisualizationOptions {
                unit_scale,
                frustum_scale_factor: factor,
                camera_marker_radius: radius,
                ..Default::default()
            };
            let scene = compose(&model(), &calibration(options), &zones_with_unused(&[]), None);
            let rendered = scene.camera.rendered_frustum_marker_radius();
            prop_assert!((rendered - radius).abs() <= radius * 1e-12);
        }

        #[test]
        fn prop_camera_center_is_scaled_translation(
            x in -5.0f64..5.0,
            y in -5.0f64..5.0,
            z in -5.0f64..5.0,
            unit_scale in 0.1f64..10_000.0,
        ) {
            let mut cal = calibration(VisualizationOptions { unit_scale, ..Default::default() });
            cal.translation = DVec3::new(x, y, z);
            let scene = compose(&model(), &cal, &zones_with_unused(&[]), None);
            prop_assert_eq!(scene.camera.center_world, DVec3::new(x, y, z) * unit_scale);
        }
    }
}
