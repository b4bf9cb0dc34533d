/// A single acquired frame: the swapchain texture, its view and the one
/// encoder every pass of the frame is recorded into.
///
/// Short-lived. Holding the surface texture prevents acquisition of the next
/// frame.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
