//! Immediate-mode overlay geometry.
//!
//! Segments are accumulated during a frame, handed to the line renderer once
//! by [`ImmediateGeometry::flush`] and then discarded. Storage is kept between
//! frames.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec2};

use crate::coords::ColorRgba;
use crate::scene::{SceneObject, Shape};

/// Segments used for a circle outline when the caller has no preference.
pub const DEFAULT_CIRCLE_RESOLUTION: usize = 100;

/// Outline colours used by the editing overlay.
pub const OUTLINE_IDLE: ColorRgba = ColorRgba::grey(0.7);
pub const OUTLINE_HOVERED: ColorRgba = ColorRgba::new(1.0, 0.5, 0.2, 1.0);
pub const OUTLINE_SELECTED: ColorRgba = ColorRgba::new(1.0, 0.85, 0.0, 1.0);

const EMBOSS_OFFSET: Vec2 = Vec2::ONE;
const LINE_SHADOW: ColorRgba = ColorRgba::grey(0.05);
const RECT_SHADOW: ColorRgba = ColorRgba::grey(0.1);

const LIGHT_BULB_RADIUS: f32 = 10.0;
const LIGHT_BASE_HALF_WIDTH: f32 = 3.0;
const LIGHT_BASE_HEIGHT: f32 = 7.0;

/// One screen-space segment as uploaded to the GPU (32 bytes).
///
///  offset  0  ends   [f32; 4]  loc 0  (.xy = start, .zw = end)
///  offset 16  color  [f32; 4]  loc 1
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineInstance {
    pub ends: [f32; 4],
    pub color: [f32; 4],
}

impl LineInstance {
    #[inline]
    pub fn new(start: Vec2, end: Vec2, color: ColorRgba) -> Self {
        Self {
            ends: [start.x, start.y, end.x, end.y],
            color: color.to_array(),
        }
    }

    #[inline]
    pub fn start(&self) -> Vec2 {
        Vec2::new(self.ends[0], self.ends[1])
    }

    #[inline]
    pub fn end(&self) -> Vec2 {
        Vec2::new(self.ends[2], self.ends[3])
    }
}

/// Per-frame line accumulator.
#[derive(Debug, Default)]
pub struct ImmediateGeometry {
    lines: Vec<LineInstance>,
}

impl ImmediateGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments accumulated this frame.
    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Retained storage, in segments.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.lines.capacity()
    }

    #[inline]
    pub fn lines(&self) -> &[LineInstance] {
        &self.lines
    }

    /// Appends one segment. When `embossed`, a dark copy offset by (+1, +1)
    /// goes first so it renders underneath.
    pub fn draw_line(&mut self, start: Vec2, end: Vec2, color: ColorRgba, embossed: bool) {
        if embossed {
            self.push(start + EMBOSS_OFFSET, end + EMBOSS_OFFSET, LINE_SHADOW);
        }
        self.push(start, end, color);
    }

    /// Outline of a circle of `radius` around the local origin, mapped through
    /// `transform`, as `resolution` segments.
    pub fn draw_circle_outline(
        &mut self,
        radius: f32,
        color: ColorRgba,
        embossed: bool,
        transform: Mat3,
        resolution: usize,
    ) {
        if embossed {
            self.circle_ring(radius, LINE_SHADOW, transform, resolution, EMBOSS_OFFSET);
        }
        self.circle_ring(radius, color, transform, resolution, Vec2::ZERO);
    }

    /// Outline of the local box spanning `start`..`end`, mapped through
    /// `transform`, as four segments.
    pub fn draw_rect_outline(
        &mut self,
        start: Vec2,
        end: Vec2,
        color: ColorRgba,
        embossed: bool,
        transform: Mat3,
    ) {
        if embossed {
            self.rect_edges(start + EMBOSS_OFFSET, end + EMBOSS_OFFSET, RECT_SHADOW, transform);
        }
        self.rect_edges(start, end, color, transform);
    }

    /// Light-bulb glyph: a bulb circle centred above `position` and a
    /// three-segment base below it.
    pub fn draw_light_marker(&mut self, position: Vec2, color: ColorRgba, embossed: bool) {
        let bulb = Mat3::from_translation(position - Vec2::new(0.0, LIGHT_BULB_RADIUS));
        self.draw_circle_outline(
            LIGHT_BULB_RADIUS,
            color,
            embossed,
            bulb,
            DEFAULT_CIRCLE_RESOLUTION,
        );

        let l = position - Vec2::new(LIGHT_BASE_HALF_WIDTH, 0.0);
        let r = position + Vec2::new(LIGHT_BASE_HALF_WIDTH, 0.0);
        let down = Vec2::new(0.0, LIGHT_BASE_HEIGHT);
        self.draw_line(l, l + down, color, embossed);
        self.draw_line(r, r + down, color, embossed);
        self.draw_line(l + down, r + down, color, embossed);
    }

    /// Editing outline of a scene object in its own transform.
    pub fn draw_object_outline(&mut self, obj: &SceneObject, color: ColorRgba) {
        match &obj.shape {
            Shape::Rect { size } => {
                let half = *size * 0.5;
                self.draw_rect_outline(-half, half, color, false, obj.transform());
            }
            Shape::Circle { radius } => {
                self.draw_circle_outline(
                    *radius,
                    color,
                    false,
                    obj.transform(),
                    DEFAULT_CIRCLE_RESOLUTION,
                );
            }
            Shape::Light { .. } => self.draw_light_marker(obj.position, color, true),
        }
    }

    /// Hands this frame's segments to `consume`, then resets the count.
    /// Storage is retained for the next frame.
    pub fn flush<F>(&mut self, consume: F)
    where
        F: FnOnce(&[LineInstance]),
    {
        consume(&self.lines);
        self.lines.clear();
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn push(&mut self, start: Vec2, end: Vec2, color: ColorRgba) {
        if self.lines.len() == self.lines.capacity() {
            self.lines.reserve_exact(1);
        }
        self.lines.push(LineInstance::new(start, end, color));
    }

    fn circle_ring(
        &mut self,
        radius: f32,
        color: ColorRgba,
        transform: Mat3,
        resolution: usize,
        offset: Vec2,
    ) {
        let delta = TAU / resolution as f32;
        let point = |i: usize| {
            let angle = i as f32 * delta;
            transform.transform_point2(Vec2::new(angle.cos(), angle.sin()) * radius) + offset
        };
        for i in 1..=resolution {
            self.push(point(i - 1), point(i), color);
        }
    }

    fn rect_edges(&mut self, start: Vec2, end: Vec2, color: ColorRgba, transform: Mat3) {
        let t = |p: Vec2| transform.transform_point2(p);
        let top_right = Vec2::new(end.x, start.y);
        let bottom_left = Vec2::new(start.x, end.y);

        self.push(t(start), t(top_right), color);
        self.push(t(start), t(bottom_left), color);
        self.push(t(top_right), t(end), color);
        self.push(t(bottom_left), t(end), color);
    }
}
