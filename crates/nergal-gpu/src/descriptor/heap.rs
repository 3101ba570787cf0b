use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{GpuError, GpuResult};

/// View kinds a heap can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    ShaderResource,
    ConstantBuffer,
    Sampler,
    RenderTarget,
    DepthStencil,
}

impl DescriptorKind {
    /// Per-slot handle increment, mirroring a driver descriptor size.
    pub fn handle_increment(self) -> u64 {
        match self {
            DescriptorKind::ShaderResource | DescriptorKind::ConstantBuffer => 32,
            DescriptorKind::Sampler => 16,
            DescriptorKind::RenderTarget | DescriptorKind::DepthStencil => 64,
        }
    }

    /// Whether heaps of this kind may be made shader visible.
    pub fn bindable(self) -> bool {
        !matches!(
            self,
            DescriptorKind::RenderTarget | DescriptorKind::DepthStencil
        )
    }
}

/// A view written into one heap slot.
#[derive(Clone)]
pub enum DescriptorView {
    Texture(wgpu::TextureView),
    Buffer(wgpu::Buffer),
    Sampler(wgpu::Sampler),
}

impl DescriptorView {
    fn compatible_with(&self, kind: DescriptorKind) -> bool {
        match kind {
            DescriptorKind::ShaderResource
            | DescriptorKind::RenderTarget
            | DescriptorKind::DepthStencil => matches!(self, DescriptorView::Texture(_)),
            DescriptorKind::ConstantBuffer => matches!(self, DescriptorView::Buffer(_)),
            DescriptorKind::Sampler => matches!(self, DescriptorView::Sampler(_)),
        }
    }
}

/// Stable handle to one heap slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorHandle {
    /// Linear offset: heap base + slot * increment.
    pub offset: u64,
    pub slot: u32,
}

// Synthetic heap base addresses; each heap gets a disjoint range so handles
// from different heaps never collide.
static NEXT_HEAP_BASE: AtomicU64 = AtomicU64::new(0x1000);

/// Fixed-capacity array of shader-visible descriptor slots of one kind.
///
/// Capacity is fixed at allocation; there is no implicit growth. A full heap
/// means building a new, larger heap and re-writing all views.
pub struct DescriptorHeap {
    kind: DescriptorKind,
    shader_visible: bool,
    base: u64,
    slots: Vec<Option<DescriptorView>>,
}

impl DescriptorHeap {
    /// Allocates a heap of `count` slots.
    ///
    /// Render-target and depth-stencil heaps are CPU-side only; requesting
    /// them shader visible is a contract violation.
    pub fn allocate(count: u32, kind: DescriptorKind, shader_visible: bool) -> GpuResult<Self> {
        if count == 0 {
            return Err(GpuError::contract("descriptor heap with zero capacity"));
        }
        if shader_visible && !kind.bindable() {
            return Err(GpuError::contract(format!(
                "{kind:?} heaps cannot be shader visible"
            )));
        }

        let span = count as u64 * kind.handle_increment();
        let base = NEXT_HEAP_BASE.fetch_add(span, Ordering::Relaxed);

        log::debug!("allocated {kind:?} heap: {count} slots at base {base:#x}");
        Ok(Self {
            kind,
            shader_visible,
            base,
            slots: vec![None; count as usize],
        })
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    pub fn shader_visible(&self) -> bool {
        self.shader_visible
    }

    fn check_slot(&self, slot: u32) -> GpuResult<usize> {
        if slot >= self.capacity() {
            return Err(GpuError::contract(format!(
                "slot {slot} out of range for heap of {} slots",
                self.capacity()
            )));
        }
        Ok(slot as usize)
    }

    /// Writes a view into `slot`, replacing any previous view.
    pub fn write_view(&mut self, slot: u32, view: DescriptorView) -> GpuResult<()> {
        let index = self.check_slot(slot)?;
        if !view.compatible_with(self.kind) {
            return Err(GpuError::contract(format!(
                "view written to slot {slot} does not match heap kind {:?}",
                self.kind
            )));
        }
        if self.slots[index].is_some() {
            log::debug!("overwriting descriptor slot {slot}");
        }
        self.slots[index] = Some(view);
        Ok(())
    }

    /// Returns the stable handle for `slot`.
    pub fn handle_at(&self, slot: u32) -> GpuResult<DescriptorHandle> {
        self.check_slot(slot)?;
        Ok(DescriptorHandle {
            offset: self.base + slot as u64 * self.kind.handle_increment(),
            slot,
        })
    }

    pub fn is_written(&self, slot: u32) -> bool {
        self.check_slot(slot)
            .map(|i| self.slots[i].is_some())
            .unwrap_or(false)
    }

    pub fn view_at(&self, slot: u32) -> GpuResult<&DescriptorView> {
        let index = self.check_slot(slot)?;
        self.slots[index].as_ref().ok_or_else(|| {
            GpuError::contract(format!("descriptor slot {slot} was never written"))
        })
    }

    /// Realizes the whole heap as a bind group against a table layout.
    ///
    /// Every slot must have been written: binding an unwritten slot would be
    /// undefined GPU behavior, so it fails loudly instead.
    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> GpuResult<wgpu::BindGroup> {
        if !self.shader_visible {
            return Err(GpuError::contract(
                "bind_group on a heap that is not shader visible",
            ));
        }

        let mut entries = Vec::with_capacity(self.slots.len());
        for (slot, view) in self.slots.iter().enumerate() {
            let Some(view) = view else {
                return Err(GpuError::contract(format!(
                    "descriptor slot {slot} was never written"
                )));
            };
            entries.push(wgpu::BindGroupEntry {
                binding: slot as u32,
                resource: match view {
                    DescriptorView::Texture(v) => wgpu::BindingResource::TextureView(v),
                    DescriptorView::Buffer(b) => b.as_entire_binding(),
                    DescriptorView::Sampler(s) => wgpu::BindingResource::Sampler(s),
                },
            });
        }

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("descriptor heap table"),
            layout,
            entries: &entries,
        }))
    }
}
