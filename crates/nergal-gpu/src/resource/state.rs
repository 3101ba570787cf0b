use crate::error::{GpuError, GpuResult};

/// Usage states a resource moves through.
///
/// Exactly one state is active at a time. `Common` is the creation state for
/// device-local destinations before their first copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageState {
    Common,
    CopyDest,
    VertexBuffer,
    IndexBuffer,
    ConstantBuffer,
    ShaderResource,
    RenderTarget,
    DepthWrite,
    Present,
}

/// What kind of memory a [`GpuResource`] wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Buffer,
    Texture,
}

/// Validates a single state transition for a resource of `kind`.
///
/// A transition into the current state is rejected: it would record a
/// meaningless barrier and usually indicates a missing `end`/`transition`
/// call earlier in the frame.
pub fn validate_transition(kind: ResourceKind, from: UsageState, to: UsageState) -> GpuResult<()> {
    if from == to {
        return Err(GpuError::contract(format!(
            "transition into the current state {from:?}"
        )));
    }

    let allowed = match (kind, to) {
        (ResourceKind::Buffer, UsageState::RenderTarget)
        | (ResourceKind::Buffer, UsageState::DepthWrite)
        | (ResourceKind::Buffer, UsageState::Present) => false,
        (ResourceKind::Texture, UsageState::VertexBuffer)
        | (ResourceKind::Texture, UsageState::IndexBuffer)
        | (ResourceKind::Texture, UsageState::ConstantBuffer) => false,
        _ => true,
    };

    if !allowed {
        return Err(GpuError::contract(format!(
            "{kind:?} resource cannot enter state {to:?}"
        )));
    }
    Ok(())
}

#[derive(Debug)]
enum Payload {
    Buffer(wgpu::Buffer),
    Texture(wgpu::Texture),
}

/// Opaque owner of a block of GPU memory plus its current usage state.
///
/// Created at load/init time and destroyed by dropping its owner; dropping is
/// only safe once the GPU has finished with it, which callers guarantee by
/// waiting on the relevant [`FenceCounter`](crate::sync::FenceCounter) first.
#[derive(Debug)]
pub struct GpuResource {
    payload: Payload,
    state: UsageState,
    /// Logical size in bytes (unpadded; copy padding is not included).
    size_bytes: u64,
    label: String,
}

impl GpuResource {
    pub(crate) fn from_buffer(
        buffer: wgpu::Buffer,
        state: UsageState,
        size_bytes: u64,
        label: &str,
    ) -> Self {
        Self {
            payload: Payload::Buffer(buffer),
            state,
            size_bytes,
            label: label.to_owned(),
        }
    }

    pub(crate) fn from_texture(
        texture: wgpu::Texture,
        state: UsageState,
        size_bytes: u64,
        label: &str,
    ) -> Self {
        Self {
            payload: Payload::Texture(texture),
            state,
            size_bytes,
            label: label.to_owned(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self.payload {
            Payload::Buffer(_) => ResourceKind::Buffer,
            Payload::Texture(_) => ResourceKind::Texture,
        }
    }

    pub fn state(&self) -> UsageState {
        self.state
    }

    /// Logical payload size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Underlying buffer, or a contract violation for texture resources.
    pub fn buffer(&self) -> GpuResult<&wgpu::Buffer> {
        match &self.payload {
            Payload::Buffer(b) => Ok(b),
            Payload::Texture(_) => Err(GpuError::contract(format!(
                "resource '{}' is a texture, not a buffer",
                self.label
            ))),
        }
    }

    /// Underlying texture, or a contract violation for buffer resources.
    pub fn texture(&self) -> GpuResult<&wgpu::Texture> {
        match &self.payload {
            Payload::Texture(t) => Ok(t),
            Payload::Buffer(_) => Err(GpuError::contract(format!(
                "resource '{}' is a buffer, not a texture",
                self.label
            ))),
        }
    }

    /// Records a transition to `to`.
    ///
    /// Must be issued before each new usage; the actual barrier is inserted
    /// by wgpu when the recorded commands execute.
    pub fn transition(&mut self, to: UsageState) -> GpuResult<()> {
        validate_transition(self.kind(), self.state, to)?;
        log::trace!("'{}': {:?} -> {:?}", self.label, self.state, to);
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── legal transitions ─────────────────────────────────────────────────

    #[test]
    fn buffer_copy_dest_to_vertex() {
        assert!(
            validate_transition(
                ResourceKind::Buffer,
                UsageState::CopyDest,
                UsageState::VertexBuffer
            )
            .is_ok()
        );
    }

    #[test]
    fn texture_render_target_round_trip() {
        assert!(
            validate_transition(
                ResourceKind::Texture,
                UsageState::ShaderResource,
                UsageState::RenderTarget
            )
            .is_ok()
        );
        assert!(
            validate_transition(
                ResourceKind::Texture,
                UsageState::RenderTarget,
                UsageState::ShaderResource
            )
            .is_ok()
        );
    }

    // ── rejected transitions ──────────────────────────────────────────────

    #[test]
    fn same_state_is_rejected() {
        let err = validate_transition(
            ResourceKind::Buffer,
            UsageState::VertexBuffer,
            UsageState::VertexBuffer,
        )
        .unwrap_err();
        assert!(matches!(err, GpuError::Contract(_)));
    }

    #[test]
    fn buffer_cannot_become_render_target() {
        let err = validate_transition(
            ResourceKind::Buffer,
            UsageState::Common,
            UsageState::RenderTarget,
        )
        .unwrap_err();
        assert!(matches!(err, GpuError::Contract(_)));
    }

    #[test]
    fn texture_cannot_become_vertex_buffer() {
        let err = validate_transition(
            ResourceKind::Texture,
            UsageState::Common,
            UsageState::VertexBuffer,
        )
        .unwrap_err();
        assert!(matches!(err, GpuError::Contract(_)));
    }
}
