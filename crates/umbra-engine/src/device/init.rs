/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior). FIFO is supported everywhere.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features. The renderer needs none.
    pub required_features: wgpu::Features,

    /// Baseline limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Raise the storage-buffer and buffer-size limits to whatever the adapter
    /// offers.
    ///
    /// The per-pixel distance and colour buffers exceed the portable 128 MiB
    /// binding limit on large high-DPI surfaces.
    pub adapter_buffer_limits: bool,

    /// Desired maximum frame latency for the surface (hint).
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            adapter_buffer_limits: true,
            desired_maximum_frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// Limits actually requested from `adapter`.
    pub(crate) fn limits_for(&self, adapter: &wgpu::Limits) -> wgpu::Limits {
        let mut limits = self.required_limits.clone();
        if self.adapter_buffer_limits {
            limits.max_storage_buffer_binding_size = limits
                .max_storage_buffer_binding_size
                .max(adapter.max_storage_buffer_binding_size);
            limits.max_buffer_size = limits.max_buffer_size.max(adapter.max_buffer_size);
        }
        limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_limits_follow_adapter_when_enabled() {
        let adapter = wgpu::Limits {
            max_storage_buffer_binding_size: 1 << 30,
            max_buffer_size: 1 << 31,
            ..wgpu::Limits::default()
        };

        let raised = GpuInit::default().limits_for(&adapter);
        assert_eq!(raised.max_storage_buffer_binding_size, 1 << 30);
        assert_eq!(raised.max_buffer_size, 1 << 31);

        let init = GpuInit { adapter_buffer_limits: false, ..GpuInit::default() };
        let kept = init.limits_for(&adapter);
        assert_eq!(
            kept.max_storage_buffer_binding_size,
            wgpu::Limits::default().max_storage_buffer_binding_size
        );
    }
}
