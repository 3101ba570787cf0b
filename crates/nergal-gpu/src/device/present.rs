use crate::error::{GpuError, GpuResult};

use super::FRAME_COUNT;

/// Fixed ring of backbuffer textures for surfaceless operation.
///
/// Keeps the explicit backbuffer-index semantics of a swapchain without a
/// window: presenting advances the index, and the previous frame's texture
/// stays sampleable/copyable for capture.
pub(super) struct HeadlessRing {
    buffers: Vec<(wgpu::Texture, wgpu::TextureView)>,
    format: wgpu::TextureFormat,
}

impl HeadlessRing {
    pub(super) fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let buffers = (0..FRAME_COUNT)
            .map(|i| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&format!("backbuffer {i}")),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                (texture, view)
            })
            .collect();
        Self { buffers, format }
    }

    pub(super) fn view(&self, index: usize) -> &wgpu::TextureView {
        &self.buffers[index].1
    }

    pub(super) fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub(super) fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        *self = Self::new(device, width, height, self.format);
    }
}

/// Where frames go: a window surface or the headless ring.
pub(super) enum PresentTarget<'w> {
    Window {
        surface: wgpu::Surface<'w>,
        config: wgpu::SurfaceConfiguration,
    },
    Headless(HeadlessRing),
}

impl<'w> PresentTarget<'w> {
    pub(super) fn format(&self) -> wgpu::TextureFormat {
        match self {
            PresentTarget::Window { config, .. } => config.format,
            PresentTarget::Headless(ring) => ring.format(),
        }
    }
}

/// Picks a surface format, preferring sRGB for correct output.
pub(super) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
) -> GpuResult<wgpu::TextureFormat> {
    let preferred = [
        wgpu::TextureFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rgba8UnormSrgb,
    ];
    for f in preferred {
        if caps.formats.contains(&f) {
            return Ok(f);
        }
    }
    caps.formats
        .first()
        .copied()
        .ok_or_else(|| GpuError::init("no supported surface formats"))
}
