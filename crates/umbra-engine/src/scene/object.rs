use core::fmt;

use glam::{Mat3, Vec2, Vec4};
use serde::{Deserialize, Serialize};

/// Stable identity of a scene object.
///
/// Assigned on first insertion, monotonically increasing, never reused.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed set of object kinds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShapeKind {
    Circle,
    Rect,
    Light,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Circle, ShapeKind::Rect, ShapeKind::Light];

    pub const fn name(self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Rect => "rect",
            ShapeKind::Light => "light",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind-specific payload.
///
/// Serialized with a `kind` tag next to the common fields of [`SceneObject`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Circle { radius: f32 },
    /// `size` is the full width/height, centred on the object position.
    Rect { size: Vec2 },
    /// RGBA intensity. RGB may exceed 1.0.
    Light { color: Vec4 },
}

impl Shape {
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Rect { .. } => ShapeKind::Rect,
            Shape::Light { .. } => ShapeKind::Light,
        }
    }
}

/// One object of the scene.
///
/// `position` is the object centre in physical pixels (top-left origin, +Y
/// down), `rotation` is in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    #[serde(flatten)]
    pub shape: Shape,
}

impl SceneObject {
    pub fn new(position: Vec2, shape: Shape) -> Self {
        Self { id: None, position, rotation: 0.0, scale: Vec2::ONE, shape }
    }

    #[inline]
    pub fn circle(position: Vec2, radius: f32) -> Self {
        Self::new(position, Shape::Circle { radius })
    }

    #[inline]
    pub fn rect(position: Vec2, size: Vec2) -> Self {
        Self::new(position, Shape::Rect { size })
    }

    #[inline]
    pub fn light(position: Vec2, color: Vec4) -> Self {
        Self::new(position, Shape::Light { color })
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = Some(id);
        self
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Local-to-world transform: translate · rotate · scale.
    pub fn transform(&self) -> Mat3 {
        Mat3::from_scale_angle_translation(self.scale, self.rotation.to_radians(), self.position)
    }

    /// World-to-local transform.
    ///
    /// A degenerate transform (zero scale) yields the zero matrix, which maps
    /// every pixel to the local origin.
    pub fn inverse_transform(&self) -> Mat3 {
        let m = self.transform();
        if m.determinant().is_normal() { m.inverse() } else { Mat3::ZERO }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_maps_position_to_origin() {
        let obj = SceneObject::rect(Vec2::new(100.0, 50.0), Vec2::new(20.0, 10.0))
            .with_rotation(30.0)
            .with_scale(Vec2::new(2.0, 0.5));
        let local = obj.inverse_transform().transform_point2(obj.position);
        assert!(local.length() < 1e-4, "{local:?}");
    }

    #[test]
    fn transform_applies_scale_before_rotation() {
        let obj = SceneObject::circle(Vec2::ZERO, 1.0).with_rotation(90.0).with_scale(Vec2::new(2.0, 1.0));
        let p = obj.transform().transform_point2(Vec2::X);
        assert!((p - Vec2::new(0.0, 2.0)).length() < 1e-5, "{p:?}");
    }

    #[test]
    fn zero_scale_inverse_is_zero() {
        let obj = SceneObject::circle(Vec2::new(3.0, 4.0), 1.0).with_scale(Vec2::ZERO);
        assert_eq!(obj.inverse_transform(), Mat3::ZERO);
    }

    #[test]
    fn kind_follows_shape() {
        assert_eq!(SceneObject::circle(Vec2::ZERO, 1.0).kind(), ShapeKind::Circle);
        assert_eq!(SceneObject::rect(Vec2::ZERO, Vec2::ONE).kind(), ShapeKind::Rect);
        assert_eq!(SceneObject::light(Vec2::ZERO, Vec4::ONE).kind(), ShapeKind::Light);
    }
}
