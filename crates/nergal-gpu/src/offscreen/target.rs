use crate::error::{GpuError, GpuResult};
use crate::resource::{GpuResource, UsageState};

/// Opaque index into the manager's target table.
///
/// Valid only between successful creation and explicit destruction; a stale
/// handle is detected and reported as a contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle(u32);

impl RenderTargetHandle {
    /// Sentinel for "no target".
    pub const INVALID: Self = Self(u32::MAX);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

/// Per-handle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Created,
    Rendering,
}

struct OffscreenTarget {
    resource: GpuResource,
    render_view: wgpu::TextureView,
    shader_view: wgpu::TextureView,
    width: u32,
    height: u32,
    state: TargetState,
    clear_color: wgpu::Color,
}

/// Allocates renderable+sampleable textures and drives their begin/end
/// render transitions.
#[derive(Default)]
pub struct RenderTargetManager {
    targets: Vec<Option<OffscreenTarget>>,
}

impl RenderTargetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a target and returns its handle. Destroyed slots are reused.
    pub fn create(
        &mut self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> GpuResult<RenderTargetHandle> {
        if width == 0 || height == 0 {
            return Err(GpuError::contract(format!(
                "offscreen target with zero size {width}x{height}"
            )));
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let render_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let shader_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bytes = width as u64 * height as u64 * format.block_copy_size(None).unwrap_or(4) as u64;
        let target = OffscreenTarget {
            resource: GpuResource::from_texture(
                texture,
                UsageState::ShaderResource,
                bytes,
                "offscreen target",
            ),
            render_view,
            shader_view,
            width,
            height,
            state: TargetState::Created,
            clear_color: wgpu::Color::BLACK,
        };

        let index = match self.targets.iter().position(Option::is_none) {
            Some(free) => {
                self.targets[free] = Some(target);
                free
            }
            None => {
                self.targets.push(Some(target));
                self.targets.len() - 1
            }
        };

        log::debug!("created offscreen target {index}: {width}x{height} {format:?}");
        Ok(RenderTargetHandle(index as u32))
    }

    fn target(&self, handle: RenderTargetHandle) -> GpuResult<&OffscreenTarget> {
        self.targets
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| stale(handle))
    }

    fn target_mut(&mut self, handle: RenderTargetHandle) -> GpuResult<&mut OffscreenTarget> {
        self.targets
            .get_mut(handle.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| stale(handle))
    }

    /// Releases the backing resource and views. Only valid in `Created`.
    pub fn destroy(&mut self, handle: RenderTargetHandle) -> GpuResult<()> {
        let target = self.target(handle)?;
        if target.state != TargetState::Created {
            return Err(GpuError::contract(format!(
                "destroy on target {} while it is rendering",
                handle.0
            )));
        }
        self.targets[handle.0 as usize] = None;
        log::debug!("destroyed offscreen target {}", handle.0);
        Ok(())
    }

    /// Transitions the target render-target-writable and opens a cleared
    /// pass covering the whole target.
    ///
    /// The pass borrows `encoder`; drop it before calling
    /// [`end_render`](Self::end_render).
    pub fn begin_render<'e>(
        &mut self,
        handle: RenderTargetHandle,
        encoder: &'e mut wgpu::CommandEncoder,
    ) -> GpuResult<wgpu::RenderPass<'e>> {
        let target = self.target_mut(handle)?;
        if target.state == TargetState::Rendering {
            return Err(GpuError::contract(format!(
                "begin_render on target {} which is already rendering",
                handle.0
            )));
        }
        target.resource.transition(UsageState::RenderTarget)?;
        target.state = TargetState::Rendering;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("offscreen pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.render_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(target.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_viewport(
            0.0,
            0.0,
            target.width as f32,
            target.height as f32,
            0.0,
            1.0,
        );
        pass.set_scissor_rect(0, 0, target.width, target.height);
        Ok(pass)
    }

    /// Transitions the target back to shader-readable.
    pub fn end_render(&mut self, handle: RenderTargetHandle) -> GpuResult<()> {
        let target = self.target_mut(handle)?;
        if target.state != TargetState::Rendering {
            return Err(GpuError::contract(format!(
                "end_render on target {} without a begin_render",
                handle.0
            )));
        }
        target.resource.transition(UsageState::ShaderResource)?;
        target.state = TargetState::Created;
        Ok(())
    }

    /// Shader-visible view for sampling the target in a later draw.
    pub fn shader_view(&self, handle: RenderTargetHandle) -> GpuResult<&wgpu::TextureView> {
        Ok(&self.target(handle)?.shader_view)
    }

    /// The backing resource, for state inspection or explicit transitions.
    pub fn texture_resource(&self, handle: RenderTargetHandle) -> GpuResult<&GpuResource> {
        Ok(&self.target(handle)?.resource)
    }

    pub fn state_of(&self, handle: RenderTargetHandle) -> GpuResult<TargetState> {
        Ok(self.target(handle)?.state)
    }

    pub fn set_clear_color(
        &mut self,
        handle: RenderTargetHandle,
        color: wgpu::Color,
    ) -> GpuResult<()> {
        self.target_mut(handle)?.clear_color = color;
        Ok(())
    }

    /// Number of live targets.
    pub fn live_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_some()).count()
    }
}

fn stale(handle: RenderTargetHandle) -> GpuError {
    if handle.is_valid() {
        GpuError::contract(format!("stale render target handle {}", handle.0))
    } else {
        GpuError::contract("invalid render target handle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── handle validity ───────────────────────────────────────────────────

    #[test]
    fn invalid_sentinel_is_not_valid() {
        assert!(!RenderTargetHandle::INVALID.is_valid());
    }

    #[test]
    fn empty_manager_rejects_any_handle() {
        let mut manager = RenderTargetManager::new();
        assert!(manager.destroy(RenderTargetHandle::INVALID).is_err());
        assert!(manager.shader_view(RenderTargetHandle(0)).is_err());
        assert!(manager.state_of(RenderTargetHandle(3)).is_err());
        assert!(manager.end_render(RenderTargetHandle(0)).is_err());
        assert_eq!(manager.live_count(), 0);
    }
}
