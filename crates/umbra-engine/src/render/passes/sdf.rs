use crate::render::bindings::{GROUP, sdf as b};

use super::common::{
    FrameTargets, SlotBuffers, compute_pipeline, count_entry, shader_module, storage_entry,
    viewport_entry, workgroups,
};

const WORKGROUP: u32 = 8;

/// Rasterizes rects and circles into the per-pixel distance field.
pub(crate) struct SdfPass {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
}

impl SdfPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let cs = wgpu::ShaderStages::COMPUTE;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("umbra sdf bgl"),
            entries: &[
                storage_entry(b::DISTANCE_FIELD, cs, false),
                viewport_entry(b::VIEWPORT, cs),
                storage_entry(b::RECTS, cs, true),
                count_entry(b::RECT_COUNT),
                storage_entry(b::CIRCLES, cs, true),
                count_entry(b::CIRCLE_COUNT),
            ],
        });

        let module = shader_module(device, "umbra sdf shader", include_str!("../shaders/sdf.wgsl"));
        let pipeline = compute_pipeline(device, "umbra sdf pipeline", &module, "draw_sdf", &bind_group_layout);

        Self { pipeline, bind_group_layout, bind_group: None }
    }

    /// Drops the bind group; it references buffers that are being replaced.
    pub fn invalidate(&mut self) {
        self.bind_group = None;
    }

    pub fn ensure_bindings(
        &mut self,
        device: &wgpu::Device,
        targets: &FrameTargets,
        rects: &SlotBuffers,
        circles: &SlotBuffers,
    ) {
        if self.bind_group.is_some() {
            return;
        }

        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("umbra sdf bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: b::DISTANCE_FIELD, resource: targets.distance_field.as_entire_binding() },
                wgpu::BindGroupEntry { binding: b::VIEWPORT, resource: targets.viewport_ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: b::RECTS, resource: rects.records.as_entire_binding() },
                wgpu::BindGroupEntry { binding: b::RECT_COUNT, resource: rects.count.as_entire_binding() },
                wgpu::BindGroupEntry { binding: b::CIRCLES, resource: circles.records.as_entire_binding() },
                wgpu::BindGroupEntry { binding: b::CIRCLE_COUNT, resource: circles.count.as_entire_binding() },
            ],
        }));
    }

    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, targets: &FrameTargets) {
        let Some(bind_group) = self.bind_group.as_ref() else {
            log::warn!("sdf pass skipped: bindings missing");
            return;
        };

        let (x, y) = workgroups(targets.viewport, WORKGROUP);
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("umbra sdf pass"),
            timestamp_writes: None,
        });
        cpass.set_pipeline(&self.pipeline);
        cpass.set_bind_group(GROUP, bind_group, &[]);
        cpass.dispatch_workgroups(x, y, 1);
    }
}
