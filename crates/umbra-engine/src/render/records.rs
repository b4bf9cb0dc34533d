//! Byte layouts of the device records, taken from the shader declarations.

use glam::{Mat3, Vec2, Vec4};
use umbra_layout::{FieldLayout, LayoutError, StructLayout, StructRegistry, TypeExpr, parse_structs, resolve};

use super::error::RenderError;
use crate::scene::ShapeKind;

/// Struct declarations shared by all passes. Prepended to every shader module.
pub(crate) const RECORDS_WGSL: &str = include_str!("shaders/records.wgsl");

/// Joins the shared declarations with a pass body.
pub(crate) fn shader_source(body: &str) -> String {
    format!("{RECORDS_WGSL}\n{body}")
}

/// Placement of one field inside a record.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FieldSpan {
    pub offset: usize,
    pub size: usize,
    /// Distance between matrix columns; equals `size` for non-matrix fields.
    pub column_stride: usize,
}

impl FieldSpan {
    fn of(field: &FieldLayout, registry: &StructRegistry) -> Result<Self, RenderError> {
        let column_stride = match &field.ty {
            TypeExpr::Matrix { rows, elem, .. } => {
                let column = resolve(&TypeExpr::Vector { len: *rows, elem: *elem }, registry)?;
                column
                    .stride()
                    .ok_or_else(|| LayoutError::SizeOverflow { ty: field.ty.to_string() })?
                    as usize
            }
            _ => field.size as usize,
        };
        Ok(Self {
            offset: field.offset as usize,
            size: field.size as usize,
            column_stride,
        })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RectRecord {
    pub stride: usize,
    pub inv_transform: FieldSpan,
    pub size: FieldSpan,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CircleRecord {
    pub stride: usize,
    pub inv_transform: FieldSpan,
    pub radius: FieldSpan,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LightRecord {
    pub stride: usize,
    pub color: FieldSpan,
    pub position: FieldSpan,
}

/// Record layouts for every kind with a device slot.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayouts {
    pub rect: RectRecord,
    pub circle: CircleRecord,
    pub light: LightRecord,
    pub viewport: StructLayout,
    pub count: StructLayout,
}

impl RecordLayouts {
    /// Layouts of the records the renderer's shaders declare.
    pub fn builtin() -> Result<Self, RenderError> {
        Self::from_wgsl(RECORDS_WGSL)
    }

    /// Parses `RectData`, `CircleData`, `LightData`, `Viewport` and `Count`
    /// out of WGSL source and packs them.
    pub fn from_wgsl(src: &str) -> Result<Self, RenderError> {
        let registry = parse_structs(src)?;
        let pack = |name: &'static str| -> Result<StructLayout, RenderError> {
            if !registry.contains(name) {
                return Err(RenderError::MissingRecord(name));
            }
            Ok(registry.pack(name)?)
        };
        let span = |layout: &StructLayout, record: &'static str, field: &'static str| {
            let f = layout
                .field(field)
                .ok_or(RenderError::MissingField { record, field })?;
            FieldSpan::of(f, &registry)
        };

        let rect = pack("RectData")?;
        let circle = pack("CircleData")?;
        let light = pack("LightData")?;

        let layouts = Self {
            rect: RectRecord {
                stride: rect.stride() as usize,
                inv_transform: span(&rect, "RectData", "inv_transform")?,
                size: span(&rect, "RectData", "size")?,
            },
            circle: CircleRecord {
                stride: circle.stride() as usize,
                inv_transform: span(&circle, "CircleData", "inv_transform")?,
                radius: span(&circle, "CircleData", "radius")?,
            },
            light: LightRecord {
                stride: light.stride() as usize,
                color: span(&light, "LightData", "color")?,
                position: span(&light, "LightData", "position")?,
            },
            viewport: pack("Viewport")?,
            count: pack("Count")?,
        };
        layouts.check_spans()?;
        Ok(layouts)
    }

    #[inline]
    pub fn stride(&self, kind: ShapeKind) -> usize {
        match kind {
            ShapeKind::Rect => self.rect.stride,
            ShapeKind::Circle => self.circle.stride,
            ShapeKind::Light => self.light.stride,
        }
    }

    /// The writers below store fixed component counts; make sure every span
    /// has room for them.
    fn check_spans(&self) -> Result<(), RenderError> {
        let mat3 = |span: FieldSpan| span.column_stride * 2 + VEC3_BYTES <= span.size;
        let flat = |min: usize| move |span: FieldSpan| span.size >= min;

        let checks: [(&'static str, &'static str, FieldSpan, &dyn Fn(FieldSpan) -> bool); 6] = [
            ("RectData", "inv_transform", self.rect.inv_transform, &mat3),
            ("RectData", "size", self.rect.size, &flat(VEC2_BYTES)),
            ("CircleData", "inv_transform", self.circle.inv_transform, &mat3),
            ("CircleData", "radius", self.circle.radius, &flat(F32_BYTES)),
            ("LightData", "color", self.light.color, &flat(VEC4_BYTES)),
            ("LightData", "position", self.light.position, &flat(VEC2_BYTES)),
        ];
        for (record, field, span, fits) in checks {
            if !fits(span) {
                return Err(RenderError::FieldTooSmall { record, field, size: span.size });
            }
        }
        Ok(())
    }
}

const F32_BYTES: usize = 4;
const VEC2_BYTES: usize = 8;
const VEC4_BYTES: usize = 16;
const VEC3_BYTES: usize = 12;

// ── field writers ─────────────────────────────────────────────────────────

#[inline]
pub(crate) fn write_f32s(record: &mut [u8], span: FieldSpan, values: &[f32]) {
    let dst = &mut record[span.offset..span.offset + values.len() * F32_BYTES];
    dst.copy_from_slice(bytemuck::cast_slice(values));
}

#[inline]
pub(crate) fn write_vec2(record: &mut [u8], span: FieldSpan, v: Vec2) {
    write_f32s(record, span, &v.to_array());
}

#[inline]
pub(crate) fn write_vec4(record: &mut [u8], span: FieldSpan, v: Vec4) {
    write_f32s(record, span, &v.to_array());
}

/// Writes a 3x3 matrix column by column at the span's column stride.
pub(crate) fn write_mat3(record: &mut [u8], span: FieldSpan, m: Mat3) {
    for (i, col) in [m.x_axis, m.y_axis, m.z_axis].into_iter().enumerate() {
        let column = FieldSpan { offset: span.offset + i * span.column_stride, ..span };
        write_f32s(record, column, &col.to_array());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_f32s(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn builtin_layouts() {
        let l = RecordLayouts::builtin().unwrap();

        assert_eq!(l.rect.stride, 64);
        assert_eq!(l.rect.inv_transform, FieldSpan { offset: 0, size: 48, column_stride: 16 });
        assert_eq!(l.rect.size, FieldSpan { offset: 48, size: 8, column_stride: 8 });

        assert_eq!(l.circle.stride, 64);
        assert_eq!(l.circle.radius.offset, 48);

        assert_eq!(l.light.stride, 32);
        assert_eq!(l.light.color.offset, 0);
        assert_eq!(l.light.position.offset, 16);

        assert_eq!(l.viewport.size, 16);
        assert_eq!(l.count.size, 4);
    }

    #[test]
    fn missing_record_is_reported() {
        let err = RecordLayouts::from_wgsl("struct RectData { inv_transform: mat3x3<f32>, size: vec2<f32> }")
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingRecord("CircleData")));
    }

    #[test]
    fn narrow_matrix_is_rejected() {
        let src = RECORDS_WGSL.replace(
            "struct RectData {\n    inv_transform: mat3x3<f32>,",
            "struct RectData {\n    inv_transform: mat2x2<f32>,",
        );
        let err = RecordLayouts::from_wgsl(&src).unwrap_err();
        assert!(matches!(err, RenderError::FieldTooSmall { record: "RectData", field: "inv_transform", .. }));
    }

    #[test]
    fn mat3_columns_land_on_16_byte_stride() {
        let l = RecordLayouts::builtin().unwrap();
        let mut record = vec![0u8; l.rect.stride];
        let m = Mat3::from_cols_array(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        write_mat3(&mut record, l.rect.inv_transform, m);

        let floats = as_f32s(&record);
        assert_eq!(&floats[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(floats[3], 0.0);
        assert_eq!(&floats[4..7], &[4.0, 5.0, 6.0]);
        assert_eq!(&floats[8..11], &[7.0, 8.0, 9.0]);
        assert_eq!(floats[11], 0.0);
    }
}
