use wgpu::util::DeviceExt;

use crate::device::DeviceContext;
use crate::error::{GpuError, GpuResult};
use crate::resource::{GpuResource, ResourceKind, UsageState};
use crate::sync::FenceCounter;

/// Align to the required bytes-per-row for buffer→texture copies.
#[inline]
pub fn align_copy_bytes_per_row(unpadded: u32) -> u32 {
    let a = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(a) * a
}

fn align_copy_size(unpadded: u64) -> u64 {
    let a = wgpu::COPY_BUFFER_ALIGNMENT;
    (unpadded.div_ceil(a) * a).max(a)
}

/// Pre-decoded pixel data for a texture upload. Image-file parsing happens
/// upstream; this engine only needs the raw layout.
#[derive(Debug, Clone)]
pub struct TextureUploadDesc {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl TextureUploadDesc {
    fn bytes_per_pixel(&self) -> GpuResult<u32> {
        match self.format {
            wgpu::TextureFormat::R8Unorm => Ok(1),
            wgpu::TextureFormat::Rg8Unorm => Ok(2),
            wgpu::TextureFormat::Rgba8Unorm
            | wgpu::TextureFormat::Rgba8UnormSrgb
            | wgpu::TextureFormat::Bgra8Unorm
            | wgpu::TextureFormat::Bgra8UnormSrgb => Ok(4),
            wgpu::TextureFormat::Rgba16Float => Ok(8),
            wgpu::TextureFormat::Rgba32Float => Ok(16),
            other => Err(GpuError::upload(format!(
                "unsupported texture upload format {other:?}"
            ))),
        }
    }
}

/// Stages CPU bytes into GPU-visible memory and copies them into a
/// device-local resource, blocking until the copy has drained.
///
/// Each upload submits through its own transient [`FenceCounter`], so uploads
/// never interleave with the frame controller's steady-state fence. The
/// staging allocation lives strictly until the wait returns and never
/// shorter.
pub struct UploadEngine {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl UploadEngine {
    pub fn new(ctx: &DeviceContext) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
        }
    }

    /// Uploads `bytes` into a new device-local buffer and leaves it in
    /// `target_state`.
    ///
    /// On success the returned resource is immediately usable in that state.
    /// On failure nothing partially initialized escapes.
    pub fn upload_buffer(
        &self,
        bytes: &[u8],
        target_state: UsageState,
        label: &str,
    ) -> GpuResult<GpuResource> {
        if bytes.is_empty() {
            return Err(GpuError::upload(format!("'{label}': empty upload")));
        }

        let usage = match target_state {
            UsageState::VertexBuffer => wgpu::BufferUsages::VERTEX,
            UsageState::IndexBuffer => wgpu::BufferUsages::INDEX,
            UsageState::ConstantBuffer => wgpu::BufferUsages::UNIFORM,
            UsageState::ShaderResource => wgpu::BufferUsages::STORAGE,
            other => {
                return Err(GpuError::contract(format!(
                    "'{label}': {other:?} is not a valid buffer upload target state"
                )));
            }
        };

        let padded = align_copy_size(bytes.len() as u64);

        // Device-local destination, created in the common state. COPY_SRC
        // supports later read-back.
        let destination = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: padded,
            usage: usage | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let mut resource =
            GpuResource::from_buffer(destination, UsageState::Common, bytes.len() as u64, label);

        // Host-visible staging, initialized from the source bytes.
        let staging = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("upload staging"),
                contents: bytes,
                usage: wgpu::BufferUsages::COPY_SRC,
            });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("upload encoder"),
            });

        resource.transition(UsageState::CopyDest)?;
        encoder.copy_buffer_to_buffer(&staging, 0, resource.buffer()?, 0, padded);
        resource.transition(target_state)?;

        self.submit_and_drain(encoder, label)?;
        // Staging must outlive the copy on the GPU timeline; it is released
        // here, after the wait, never before.
        drop(staging);

        log::debug!("'{label}': uploaded {} bytes -> {target_state:?}", bytes.len());
        Ok(resource)
    }

    /// Uploads pre-decoded pixels into a new sampleable texture.
    ///
    /// Rows are repacked to the required copy alignment in the staging
    /// buffer; the texture ends in the `ShaderResource` state.
    pub fn upload_texture(
        &self,
        desc: &TextureUploadDesc,
        bytes: &[u8],
        label: &str,
    ) -> GpuResult<GpuResource> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GpuError::upload(format!(
                "'{label}': zero-sized texture {}x{}",
                desc.width, desc.height
            )));
        }
        let bpp = desc.bytes_per_pixel()?;
        let unpadded_row = desc.width * bpp;
        let expected = unpadded_row as usize * desc.height as usize;
        if bytes.len() != expected {
            return Err(GpuError::upload(format!(
                "'{label}': {} bytes supplied, {}x{} {:?} needs {expected}",
                bytes.len(),
                desc.width,
                desc.height,
                desc.format
            )));
        }

        let extent = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let mut resource =
            GpuResource::from_texture(texture, UsageState::Common, bytes.len() as u64, label);

        let padded_row = align_copy_bytes_per_row(unpadded_row);
        let mut staged = vec![0u8; padded_row as usize * desc.height as usize];
        for row in 0..desc.height as usize {
            let src = row * unpadded_row as usize;
            let dst = row * padded_row as usize;
            staged[dst..dst + unpadded_row as usize]
                .copy_from_slice(&bytes[src..src + unpadded_row as usize]);
        }
        let staging = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("texture upload staging"),
                contents: &staged,
                usage: wgpu::BufferUsages::COPY_SRC,
            });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("texture upload encoder"),
            });

        resource.transition(UsageState::CopyDest)?;
        encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(desc.height),
                },
            },
            wgpu::TexelCopyTextureInfo {
                texture: resource.texture()?,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            extent,
        );
        resource.transition(UsageState::ShaderResource)?;

        self.submit_and_drain(encoder, label)?;
        drop(staging);

        log::debug!(
            "'{label}': uploaded {}x{} {:?} texture",
            desc.width,
            desc.height,
            desc.format
        );
        Ok(resource)
    }

    /// Copies a device-local buffer back to the CPU.
    ///
    /// Intended for tests and capture paths; the returned bytes are truncated
    /// to the resource's logical size.
    pub fn read_back_buffer(&self, resource: &GpuResource) -> GpuResult<Vec<u8>> {
        if resource.kind() != ResourceKind::Buffer {
            return Err(GpuError::contract(format!(
                "'{}': read-back of a non-buffer resource",
                resource.label()
            )));
        }
        let source = resource.buffer()?;
        let padded = source.size();

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback staging"),
            size: padded,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback encoder"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &readback, 0, padded);
        self.queue.submit(Some(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GpuError::readback(format!("poll failed: {e}")))?;
        rx.recv()
            .map_err(|_| GpuError::readback("map callback dropped"))?
            .map_err(|e| GpuError::readback(format!("map failed: {e}")))?;

        let data = slice.get_mapped_range();
        let bytes = data[..resource.size_bytes() as usize].to_vec();
        drop(data);
        readback.unmap();
        Ok(bytes)
    }

    /// Submits `encoder` and blocks on a transient fence until the GPU has
    /// drained it.
    fn submit_and_drain(&self, encoder: wgpu::CommandEncoder, label: &str) -> GpuResult<()> {
        let index = self.queue.submit(Some(encoder.finish()));
        let mut fence = FenceCounter::new(self.device.clone());
        fence.signal_submission(index, 1)?;
        fence
            .wait(1)
            .map_err(|e| GpuError::upload(format!("'{label}': {e}")))
    }
}
