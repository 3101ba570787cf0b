use std::marker::PhantomData;

use bytemuck::Pod;

use crate::error::{GpuError, GpuResult};

use super::{GpuResource, UsageState};

/// Typed constant-buffer wrapper for a plain-old-data struct `T`.
///
/// The buffer lives in the `ConstantBuffer` state for its entire life; updates
/// go through the queue's write path rather than a staged copy, which is
/// appropriate for small per-frame constants.
pub struct TypedBuffer<T: Pod> {
    resource: GpuResource,
    _marker: PhantomData<T>,
}

impl<T: Pod> TypedBuffer<T> {
    /// Creates a GPU-visible uniform buffer sized for one `T`.
    ///
    /// `T` must be non-empty and its size a multiple of the copy alignment
    /// (pad the struct explicitly, as the shader-side layout does anyway).
    pub fn new(device: &wgpu::Device, label: &str) -> GpuResult<Self> {
        let size = std::mem::size_of::<T>() as u64;
        if size == 0 {
            return Err(GpuError::contract(format!(
                "constant buffer '{label}' has zero-sized contents"
            )));
        }
        if size % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(GpuError::contract(format!(
                "constant buffer '{label}' size {size} is not {}-byte aligned",
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            resource: GpuResource::from_buffer(buffer, UsageState::ConstantBuffer, size, label),
            _marker: PhantomData,
        })
    }

    /// Writes a new value into the buffer.
    pub fn update(&self, queue: &wgpu::Queue, value: &T) -> GpuResult<()> {
        let buffer = self.resource.buffer()?;
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(value));
        Ok(())
    }

    pub fn resource(&self) -> &GpuResource {
        &self.resource
    }

    /// Entire-buffer binding for draw-time bind groups.
    pub fn binding(&self) -> GpuResult<wgpu::BindingResource<'_>> {
        Ok(self.resource.buffer()?.as_entire_binding())
    }
}
