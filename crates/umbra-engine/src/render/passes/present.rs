use crate::coords::ColorRgba;
use crate::render::bindings::{GROUP, present as b};
use crate::render::RenderTarget;

use super::common::{FrameTargets, shader_module, storage_entry, viewport_entry};

/// Tone-maps the colour buffer onto the swapchain image with a fullscreen quad.
pub(crate) struct PresentPass {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
}

impl PresentPass {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let fs = wgpu::ShaderStages::FRAGMENT;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("umbra present bgl"),
            entries: &[viewport_entry(b::VIEWPORT, fs), storage_entry(b::COLOR, fs, true)],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("umbra present pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let module = shader_module(
            device,
            "umbra present shader",
            include_str!("../shaders/present.wgsl"),
        );

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("umbra present pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self { format, pipeline, bind_group_layout, bind_group: None }
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn invalidate(&mut self) {
        self.bind_group = None;
    }

    pub fn ensure_bindings(&mut self, device: &wgpu::Device, targets: &FrameTargets) {
        if self.bind_group.is_some() {
            return;
        }

        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("umbra present bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: b::VIEWPORT, resource: targets.viewport_ubo.as_entire_binding() },
                wgpu::BindGroupEntry { binding: b::COLOR, resource: targets.color.as_entire_binding() },
            ],
        }));
    }

    pub fn record(&self, target: &mut RenderTarget<'_>, clear: ColorRgba) {
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("umbra present pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(bind_group) = self.bind_group.as_ref() else { return };
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(GROUP, bind_group, &[]);
        rpass.draw(0..6, 0..1);
    }
}
