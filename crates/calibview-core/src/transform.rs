//! Transform chains built from rotate/scale/translate steps.
//!
//! Steps are composed by post-multiplication (`M = M * step`), the same order a
//! scene-graph transform stack uses: each later step acts in the local frame
//! left by the earlier ones.

use glam::{DMat4, DVec3};
use serde::Serialize;

use crate::config::ConfigObject;
use crate::error::Result;

/// One operation of a [`TransformChain`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TransformStep {
    /// Rotation by an angle in degrees about an axis (normalized on use).
    Rotate { angle_degrees: f64, axis: DVec3 },
    /// Uniform scale.
    Scale(f64),
    /// Translation.
    Translate(DVec3),
}

impl TransformStep {
    /// Decodes a step from a `{ "type": ..., ... }` object.
    ///
    /// Returns `Ok(None)` for an unknown `type`; those steps are skipped so that
    /// newer configuration files still load. Numeric fields are optional and
    /// default to zero, so a `scale` step can omit `x`/`y`/`z` and a `rotate`
    /// step can omit `value`.
    pub fn decode(obj: &ConfigObject<'_>) -> Result<Option<Self>> {
        let kind = obj.require_str("type")?;

        let angle = obj.optional_number("angle")?;
        let x = obj.optional_number("x")?;
        let y = obj.optional_number("y")?;
        let z = obj.optional_number("z")?;
        let value = obj.optional_number("value")?;

        let step = if kind.eq_ignore_ascii_case("rotate") {
            Self::Rotate {
                angle_degrees: angle,
                axis: DVec3::new(x, y, z),
            }
        } else if kind.eq_ignore_ascii_case("scale") {
            Self::Scale(value)
        } else if kind.eq_ignore_ascii_case("translate") {
            Self::Translate(DVec3::new(x, y, z))
        } else {
            log::warn!(
                "ignoring unknown transformation type '{kind}' at {}",
                obj.scope()
            );
            return Ok(None);
        };
        Ok(Some(step))
    }

    /// Returns the 4x4 matrix of this step.
    pub fn matrix(&self) -> DMat4 {
        match *self {
            Self::Rotate {
                angle_degrees,
                axis,
            } => match axis.try_normalize() {
                Some(axis) => DMat4::from_axis_angle(axis, angle_degrees.to_radians()),
                None => {
                    log::warn!("rotation with a zero-length axis treated as identity");
                    DMat4::IDENTITY
                }
            },
            Self::Scale(factor) => DMat4::from_scale(DVec3::splat(factor)),
            Self::Translate(offset) => DMat4::from_translation(offset),
        }
    }
}

/// An ordered sequence of [`TransformStep`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformChain {
    steps: Vec<TransformStep>,
}

impl TransformChain {
    /// Creates an empty (identity) chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain from existing steps.
    pub fn from_steps(steps: Vec<TransformStep>) -> Self {
        Self { steps }
    }

    /// Appends a step.
    pub fn push(&mut self, step: TransformStep) {
        self.steps.push(step);
    }

    /// Appends a rotation of `angle_degrees` about `axis`.
    #[must_use]
    pub fn rotate(mut self, angle_degrees: f64, axis: DVec3) -> Self {
        self.push(TransformStep::Rotate {
            angle_degrees,
            axis,
        });
        self
    }

    /// Appends a uniform scale.
    #[must_use]
    pub fn scale(mut self, factor: f64) -> Self {
        self.push(TransformStep::Scale(factor));
        self
    }

    /// Appends a translation.
    #[must_use]
    pub fn translate(mut self, offset: DVec3) -> Self {
        self.push(TransformStep::Translate(offset));
        self
    }

    /// Returns the steps in order.
    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the chain has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Composes all steps into one matrix.
    pub fn matrix(&self) -> DMat4 {
        self.steps
            .iter()
            .fold(DMat4::IDENTITY, |acc, step| acc * step.matrix())
    }

    /// Transforms a point by the composed matrix.
    pub fn apply_point(&self, point: DVec3) -> DVec3 {
        self.matrix().transform_point3(point)
    }
}
