use crate::render::bindings::{GROUP, lighting as b};

use super::common::{
    FrameTargets, SlotBuffers, compute_pipeline, count_entry, shader_module, storage_entry,
    viewport_entry, workgroups,
};

const WORKGROUP: u32 = 16;

/// Shades the distance field with every light into the colour buffer.
pub(crate) struct LightingPass {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
}

impl LightingPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let cs = wgpu::ShaderStages::COMPUTE;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("umbra lighting bgl"),
            entries: &[
                storage_entry(b::DISTANCE_FIELD, cs, true),
                storage_entry(b::COLOR, cs, false),
                viewport_entry(b::VIEWPORT, cs),
                storage_entry(b::LIGHTS, cs, true),
                count_entry(b::LIGHT_COUNT),
            ],
        });

        let module = shader_module(
            device,
            "umbra lighting shader",
            include_str!("../shaders/lighting.wgsl"),
        );
        let pipeline = compute_pipeline(
            device,
            "umbra lighting pipeline",
            &module,
            "lighting",
            &bind_group_layout,
        );

        Self { pipeline, bind_group_layout, bind_group: None }
    }

    pub fn invalidate(&mut self) {
        self.bind_group = None;
    }

    pub fn ensure_bindings(&mut self, device: &wgpu::Device, targets: &FrameTargets, lights: &SlotBuffers) {
        if self.bind_group.is_some() {
            return;
        }

        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("umbra lighting bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: b::DISTANCE_FIELD, resource: targets.distance_field.as_entire_binding() },
                wgpu::BindGroupEntry { binding: b::COLOR, resource: targets.color.as_entire_binding() },
                wgpu::BindGroupEntry { binding: b::VIEWPORT, resource: targets.viewport_ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: b::LIGHTS, resource: lights.records.as_entire_binding() },
                wgpu::BindGroupEntry { binding: b::LIGHT_COUNT, resource: lights.count.as_entire_binding() },
            ],
        }));
    }

    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, targets: &FrameTargets) {
        let Some(bind_group) = self.bind_group.as_ref() else {
            log::warn!("lighting pass skipped: bindings missing");
            return;
        };

        let (x, y) = workgroups(targets.viewport, WORKGROUP);
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("umbra lighting pass"),
            timestamp_writes: None,
        });
        cpass.set_pipeline(&self.pipeline);
        cpass.set_bind_group(GROUP, bind_group, &[]);
        cpass.dispatch_workgroups(x, y, 1);
    }
}
