//! GPU types and resources shared by the scene passes.

use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;
use crate::render::error::RenderError;
use crate::render::marshal::ShapeSlot;
use crate::render::records::RecordLayouts;

// ── uniforms ──────────────────────────────────────────────────────────────

/// Host mirror of the WGSL `Viewport` struct.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct ViewportUniform {
    pub size: [u32; 2],
    pub size_f: [f32; 2],
}

impl From<Viewport> for ViewportUniform {
    fn from(vp: Viewport) -> Self {
        Self { size: [vp.width, vp.height], size_f: vp.size_f32() }
    }
}

/// Host mirror of the WGSL `Count` struct, padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct CountUniform {
    pub value: u32,
    pub _pad: [u32; 3],
}

impl CountUniform {
    pub fn new(value: usize) -> Self {
        Self { value: value as u32, _pad: [0; 3] }
    }
}

/// Checks the host uniform mirrors against the shader declarations.
pub(crate) fn check_uniforms(layouts: &RecordLayouts) -> Result<(), RenderError> {
    let host = std::mem::size_of::<ViewportUniform>();
    let size_f = layouts.viewport.field("size_f").map(|f| f.offset);
    if layouts.viewport.size as usize != host || size_f != Some(8) {
        return Err(RenderError::UniformMismatch {
            name: "Viewport",
            host,
            shader: layouts.viewport.size as usize,
        });
    }

    let host = std::mem::size_of::<CountUniform>();
    if layouts.count.size as usize > host || layouts.count.field("value").map(|f| f.offset) != Some(0) {
        return Err(RenderError::UniformMismatch {
            name: "Count",
            host,
            shader: layouts.count.size as usize,
        });
    }
    Ok(())
}

// ── bind group layout entries ─────────────────────────────────────────────

pub(crate) fn viewport_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    uniform_entry::<ViewportUniform>(binding, visibility)
}

pub(crate) fn count_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    uniform_entry::<CountUniform>(binding, wgpu::ShaderStages::COMPUTE)
}

fn uniform_entry<T: Pod>(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

pub(crate) fn storage_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    read_only: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn shader_module(device: &wgpu::Device, label: &str, body: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(crate::render::records::shader_source(body).into()),
    })
}

pub(crate) fn compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    entry_point: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::ComputePipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        immediate_size: 0,
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        module,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    })
}

/// Workgroups needed to cover `viewport` with `size × size` tiles.
#[inline]
pub(crate) fn workgroups(viewport: Viewport, size: u32) -> (u32, u32) {
    (viewport.width.div_ceil(size), viewport.height.div_ceil(size))
}

// ── viewport-sized targets ────────────────────────────────────────────────

const DISTANCE_BYTES_PER_PIXEL: u64 = 4;
const COLOR_BYTES_PER_PIXEL: u64 = 16;

/// Per-pixel buffers and the viewport uniform. Recreated on every resize;
/// bind groups referencing them must be rebuilt at the same time.
pub(crate) struct FrameTargets {
    pub viewport: Viewport,
    pub distance_field: wgpu::Buffer,
    pub color: wgpu::Buffer,
    pub viewport_ubo: wgpu::Buffer,
}

impl FrameTargets {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        viewport: Viewport,
    ) -> Result<Self, RenderError> {
        let color_bytes = viewport.area() * COLOR_BYTES_PER_PIXEL;
        let limit = device.limits().max_storage_buffer_binding_size as u64;
        if color_bytes > limit {
            return Err(RenderError::ViewportTooLarge {
                width: viewport.width,
                height: viewport.height,
                bytes: color_bytes,
                limit,
            });
        }

        let distance_field = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("umbra distance field"),
            size: viewport.area() * DISTANCE_BYTES_PER_PIXEL,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let color = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("umbra color buffer"),
            size: color_bytes,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("umbra viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&viewport_ubo, 0, bytemuck::bytes_of(&ViewportUniform::from(viewport)));

        log::debug!(
            "frame targets allocated for {}x{} ({} KiB)",
            viewport.width,
            viewport.height,
            (color_bytes + viewport.area() * DISTANCE_BYTES_PER_PIXEL) / 1024
        );

        Ok(Self { viewport, distance_field, color, viewport_ubo })
    }
}

// ── shape slots ───────────────────────────────────────────────────────────

/// Device side of one [`ShapeSlot`]: the record array and its live count.
pub(crate) struct SlotBuffers {
    pub records: wgpu::Buffer,
    pub count: wgpu::Buffer,
    capacity: usize,
}

impl SlotBuffers {
    pub fn new(device: &wgpu::Device, slot: &ShapeSlot) -> Self {
        let records = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("umbra {} records", slot.kind())),
            size: slot.byte_len() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let count = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("umbra {} count", slot.kind())),
            size: std::mem::size_of::<CountUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { records, count, capacity: slot.capacity() }
    }

    /// Whether the record buffer still matches the slot's capacity.
    #[inline]
    pub fn fits(&self, slot: &ShapeSlot) -> bool {
        self.capacity == slot.capacity()
    }

    /// Uploads the live prefix and the live count.
    pub fn upload(&self, queue: &wgpu::Queue, slot: &ShapeSlot) {
        let live = slot.live_bytes();
        if !live.is_empty() {
            queue.write_buffer(&self.records, 0, live);
        }
        queue.write_buffer(&self.count, 0, bytemuck::bytes_of(&CountUniform::new(slot.live())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_uniforms_match_shader() {
        let layouts = RecordLayouts::builtin().unwrap();
        check_uniforms(&layouts).unwrap();
        assert_eq!(std::mem::size_of::<ViewportUniform>(), 16);
        assert_eq!(std::mem::size_of::<CountUniform>(), 16);
    }

    #[test]
    fn workgroups_cover_partial_tiles() {
        assert_eq!(workgroups(Viewport::new(800, 600), 8), (100, 75));
        assert_eq!(workgroups(Viewport::new(801, 1), 16), (51, 1));
    }

    #[test]
    fn viewport_uniform_carries_both_forms() {
        let u = ViewportUniform::from(Viewport::new(1280, 720));
        assert_eq!(u.size, [1280, 720]);
        assert_eq!(u.size_f, [1280.0, 720.0]);
    }
}
