use crate::pipelines::basic::{PrimitiveOptions, mk_render_pipeline};

/// Translucent full screen quad marking the window as a drop target.
///
/// Drawn without vertex buffers or depth: `draw(0..3, 0..1)` covers the viewport.
pub fn mk_overlay_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Drop Overlay Pipeline Layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Drop Overlay Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        None,
        &[],
        PrimitiveOptions {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
        },
        shader,
    )
}
