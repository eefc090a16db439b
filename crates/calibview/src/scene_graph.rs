//! Renderer-facing scene graph.
//!
//! [`SceneGraph::from_scene`] lays a [`ComposedScene`] out as a tree of plain
//! drawable nodes. A renderer walks the tree, multiplying `Transform` and
//! `Zone` matrices down to the leaves; nothing here depends on how the nodes
//! are drawn.

use std::path::PathBuf;

use calibview_core::{ComposedScene, ComposedZone, LineSegment, ZoneId};
use glam::{DMat4, DVec3, DVec4};
use serde::Serialize;

/// Frustum wireframe color.
pub const FRUSTUM_COLOR: DVec4 = DVec4::new(0.0, 1.0, 0.0, 1.0);
/// Color of the marker at the frustum apex.
pub const FRUSTUM_MARKER_COLOR: DVec4 = DVec4::new(0.0, 0.2, 1.0, 1.0);
/// Color of the world-space camera center marker.
pub const CAMERA_MARKER_COLOR: DVec4 = DVec4::new(1.0, 0.0, 0.0, 1.0);
/// Zone label color.
pub const LABEL_COLOR: DVec4 = DVec4::new(1.0, 1.0, 1.0, 1.0);
/// Color of the model name label.
pub const MODEL_LABEL_COLOR: DVec4 = DVec4::new(1.0, 1.0, 0.0, 1.0);
/// Model name label position, in the vehicle's local frame.
pub const MODEL_LABEL_OFFSET: DVec3 = DVec3::new(0.0, 0.0, 1.2);

/// A node in the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SceneNode {
    /// A named collection of children.
    Group {
        name: String,
        children: Vec<SceneNode>,
    },
    /// Children drawn under `matrix`.
    Transform {
        name: String,
        matrix: DMat4,
        children: Vec<SceneNode>,
    },
    /// A viewing zone: children drawn under `matrix`, tagged with the zone id.
    Zone {
        id: ZoneId,
        label: String,
        matrix: DMat4,
        children: Vec<SceneNode>,
    },
    /// An external mesh file.
    Mesh { path: PathBuf },
    /// A solid sphere.
    Sphere {
        center: DVec3,
        radius: f64,
        color: DVec4,
    },
    /// Independent colored line segments.
    Lines { segments: Vec<LineSegment> },
    /// A connected polyline.
    LineStrip { points: Vec<DVec3>, color: DVec4 },
    /// A filled planar polygon.
    Polygon { points: Vec<DVec3>, color: DVec4 },
    /// Screen-aligned text.
    Label {
        text: String,
        position: DVec3,
        color: DVec4,
    },
}

impl SceneNode {
    /// Returns the node's children (empty for leaves).
    pub fn children(&self) -> &[SceneNode] {
        match self {
            Self::Group { children, .. }
            | Self::Transform { children, .. }
            | Self::Zone { children, .. } => children,
            _ => &[],
        }
    }

    /// Counts this node and all its descendants.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(SceneNode::count).sum::<usize>()
    }

    /// Returns the node name, for named nodes.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Group { name, .. } | Self::Transform { name, .. } => Some(name),
            Self::Zone { label, .. } => Some(label),
            _ => None,
        }
    }
}

/// The complete scene graph handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneGraph {
    root: SceneNode,
}

impl SceneGraph {
    /// Builds the scene graph for a composed scene.
    pub fn from_scene(scene: &ComposedScene) -> Self {
        let vehicle = SceneNode::Transform {
            name: format!("{} transform", scene.model_name),
            matrix: scene.vehicle_transform,
            children: vec![
                SceneNode::Mesh {
                    path: scene.mesh_path.clone(),
                },
                SceneNode::Label {
                    text: scene.model_name.clone(),
                    position: MODEL_LABEL_OFFSET,
                    color: MODEL_LABEL_COLOR,
                },
            ],
        };

        let camera = &scene.camera;
        let frustum = SceneNode::Transform {
            name: "camera pose".to_string(),
            matrix: camera.frustum_pose,
            children: vec![
                SceneNode::Lines {
                    segments: camera
                        .frustum
                        .edges()
                        .iter()
                        .map(|&(start, end)| LineSegment {
                            start,
                            end,
                            color: FRUSTUM_COLOR,
                        })
                        .collect(),
                },
                SceneNode::Sphere {
                    center: camera.frustum.apex,
                    radius: camera.frustum_marker_radius,
                    color: FRUSTUM_MARKER_COLOR,
                },
            ],
        };
        let camera_marker = SceneNode::Sphere {
            center: camera.center_world,
            radius: camera.marker_radius,
            color: CAMERA_MARKER_COLOR,
        };

        let zones = SceneNode::Group {
            name: "viewing zones".to_string(),
            children: scene
                .zones
                .iter()
                .map(|zone| zone_node(zone, scene.zone_transform))
                .collect(),
        };

        let axes = SceneNode::Lines {
            segments: scene.axes.segments(),
        };

        Self {
            root: SceneNode::Group {
                name: "root".to_string(),
                children: vec![vehicle, frustum, camera_marker, axes, zones],
            },
        }
    }

    /// Returns the root node.
    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    /// Total number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.root.count()
    }

    /// Ids and labels of the zone nodes, in draw order.
    pub fn zone_nodes(&self) -> Vec<(ZoneId, &str)> {
        let mut out = Vec::new();
        collect_zones(&self.root, &mut out);
        out
    }

    /// One line per top-level child with its child count.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!("Root children: {}", self.root.children().len())];
        for child in self.root.children() {
            if let Some(name) = child.name() {
                lines.push(format!("  - {name}: {} child(ren)", child.children().len()));
            }
        }
        lines
    }

    /// Logs [`summary`](Self::summary) at info level.
    pub fn log_structure(&self) {
        log::info!("Scene graph structure:");
        for line in self.summary() {
            log::info!("{line}");
        }
    }
}

fn zone_node(zone: &ComposedZone, matrix: DMat4) -> SceneNode {
    let corners = zone.local_corners.to_vec();
    let mut outline = corners.clone();
    outline.push(corners[0]);

    SceneNode::Zone {
        id: zone.id,
        label: zone.label.clone(),
        matrix,
        children: vec![
            SceneNode::Polygon {
                points: corners,
                color: zone.fill_color,
            },
            SceneNode::LineStrip {
                points: outline,
                color: zone.outline_color,
            },
            SceneNode::Label {
                text: zone.label.clone(),
                position: zone.label_anchor,
                color: LABEL_COLOR,
            },
        ],
    }
}

fn collect_zones<'a>(node: &'a SceneNode, out: &mut Vec<(ZoneId, &'a str)>) {
    if let SceneNode::Zone { id, label, .. } = node {
        out.push((*id, label.as_str()));
    }
    for child in node.children() {
        collect_zones(child, out);
    }
}
