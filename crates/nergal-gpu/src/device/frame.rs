use crate::error::{GpuError, GpuResult};
use crate::resource::{GpuResource, UsageState};
use crate::sync::FenceCounter;

use super::present::{HeadlessRing, PresentTarget, choose_surface_format};
use super::{ContextInit, DeviceContext, DeviceInit};

/// Backbuffer ring depth. Fixed at compile time on purpose.
pub const FRAME_COUNT: usize = 2;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Idle,
    Recording,
}

/// A single frame being recorded.
///
/// Short-lived: obtained from [`FrameController::begin_frame`] and consumed
/// by [`FrameController::end_frame`]. Holding it keeps the acquired
/// backbuffer, so finalize promptly.
#[derive(Debug)]
pub struct Frame {
    encoder: wgpu::CommandEncoder,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    surface_texture: Option<wgpu::SurfaceTexture>,
    backbuffer_index: usize,
}

impl Frame {
    /// Command encoder for this frame's barriers, copies and passes.
    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        &mut self.encoder
    }

    pub fn backbuffer_index(&self) -> usize {
        self.backbuffer_index
    }

    /// Opens a pass onto the backbuffer, clearing color and depth.
    pub fn begin_pass(&mut self, clear_color: wgpu::Color) -> wgpu::RenderPass<'_> {
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// Owns the presentation target, depth buffer, per-frame fence and frame
/// index, and drives the frame cycle:
///
/// Idle → `begin_frame` → Recording → bind/draw → `end_frame`
/// (submit, present, signal fence, blocking wait, refresh index) → Idle.
///
/// Submission is fully serialized with GPU completion once per frame: the
/// fence wait in `end_frame` guarantees that no encoder is created while
/// commands recorded against the previous one may still be executing. This
/// costs CPU idle time while the GPU drains and is accepted deliberately.
pub struct FrameController<'w> {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: PresentTarget<'w>,
    depth: GpuResource,
    depth_view: wgpu::TextureView,
    fence: FenceCounter,
    frame_number: u64,
    backbuffer_index: usize,
    state: FrameState,
    init: DeviceInit,
}

impl<'w> FrameController<'w> {
    /// Initializes presentation onto a window surface.
    ///
    /// Any failure here aborts initialization entirely; no partially usable
    /// controller escapes.
    pub fn windowed(
        ctx: &DeviceContext,
        surface: wgpu::Surface<'w>,
        init: DeviceInit,
    ) -> GpuResult<Self> {
        init.validate()?;

        let caps = surface.get_capabilities(&ctx.adapter);
        let format = choose_surface_format(&caps)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: init.width,
            height: init.height,
            present_mode: init.present_mode(),
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: FRAME_COUNT as u32,
        };
        surface.configure(&ctx.device, &config);

        Self::finish_init(ctx, PresentTarget::Window { surface, config }, init)
    }

    /// Initializes presentation onto a headless backbuffer ring.
    pub fn headless(ctx: &DeviceContext, init: DeviceInit) -> GpuResult<Self> {
        init.validate()?;
        let ring = HeadlessRing::new(&ctx.device, init.width, init.height, HEADLESS_FORMAT);
        Self::finish_init(ctx, PresentTarget::Headless(ring), init)
    }

    /// Convenience: headless context + controller in one call.
    pub fn headless_with_context(init: DeviceInit) -> GpuResult<(DeviceContext, Self)> {
        let ctx = DeviceContext::headless(&ContextInit::default())?;
        let controller = Self::headless(&ctx, init)?;
        Ok((ctx, controller))
    }

    fn finish_init(
        ctx: &DeviceContext,
        target: PresentTarget<'w>,
        init: DeviceInit,
    ) -> GpuResult<Self> {
        let (depth, depth_view) = create_depth(&ctx.device, init.width, init.height);

        log::info!(
            "frame controller: {}x{} vsync={} fullscreen={} ring={FRAME_COUNT}",
            init.width,
            init.height,
            init.vsync,
            init.fullscreen
        );

        Ok(Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            target,
            depth,
            depth_view,
            fence: FenceCounter::new(ctx.device.clone()),
            frame_number: 0,
            backbuffer_index: 0,
            state: FrameState::Idle,
            init,
        })
    }

    /// Current backbuffer index, always within `0..FRAME_COUNT`.
    ///
    /// Refreshed only after a successful present + wait.
    pub fn current_backbuffer_index(&self) -> usize {
        self.backbuffer_index
    }

    /// Number of fully completed frames.
    pub fn completed_frames(&self) -> u64 {
        self.fence.completed_value()
    }

    pub fn backbuffer_format(&self) -> wgpu::TextureFormat {
        self.target.format()
    }

    pub fn depth_format(&self) -> wgpu::TextureFormat {
        DEPTH_FORMAT
    }

    pub fn init(&self) -> &DeviceInit {
        &self.init
    }

    /// Reconfigures the drawable size. Only legal between frames.
    pub fn resize(&mut self, width: u32, height: u32) -> GpuResult<()> {
        if self.state != FrameState::Idle {
            return Err(GpuError::contract("resize while a frame is recording"));
        }
        if width == 0 || height == 0 {
            // Minimized; keep the old configuration until a real size shows up.
            return Ok(());
        }
        self.init.width = width;
        self.init.height = height;

        match &mut self.target {
            PresentTarget::Window { surface, config } => {
                config.width = width;
                config.height = height;
                surface.configure(&self.device, config);
            }
            PresentTarget::Headless(ring) => ring.resize(&self.device, width, height),
        }
        let (depth, depth_view) = create_depth(&self.device, width, height);
        self.depth = depth;
        self.depth_view = depth_view;
        Ok(())
    }

    /// Starts recording a frame.
    ///
    /// This is the command allocator/list reset point; the previous frame's
    /// fence wait has already proven the GPU is done with the prior encoder.
    pub fn begin_frame(&mut self) -> GpuResult<Frame> {
        if self.state != FrameState::Idle {
            return Err(GpuError::contract(
                "begin_frame while a frame is already recording",
            ));
        }

        let (color_view, surface_texture) = match &self.target {
            PresentTarget::Window { surface, .. } => {
                let texture = surface.get_current_texture().map_err(|e| {
                    GpuError::frame(format!("failed to acquire backbuffer: {e}"))
                })?;
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                (view, Some(texture))
            }
            PresentTarget::Headless(ring) => (ring.view(self.backbuffer_index).clone(), None),
        };

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        self.state = FrameState::Recording;
        Ok(Frame {
            encoder,
            color_view,
            depth_view: self.depth_view.clone(),
            surface_texture,
            backbuffer_index: self.backbuffer_index,
        })
    }

    /// Closes and executes the frame, presents, then blocks until the GPU
    /// has drained it.
    pub fn end_frame(&mut self, frame: Frame) -> GpuResult<()> {
        if self.state != FrameState::Recording {
            return Err(GpuError::contract("end_frame without a begin_frame"));
        }
        let Frame {
            encoder,
            color_view,
            surface_texture,
            ..
        } = frame;

        let index = self.queue.submit(Some(encoder.finish()));
        drop(color_view);
        if let Some(texture) = surface_texture {
            texture.present();
        }

        self.frame_number += 1;
        self.fence.signal_submission(index, self.frame_number)?;
        self.fence.wait(self.frame_number)?;

        self.backbuffer_index = (self.backbuffer_index + 1) % FRAME_COUNT;
        self.state = FrameState::Idle;
        Ok(())
    }

    /// Discards a frame without submitting or presenting it.
    ///
    /// For mid-frame failures: the corrupt recording must not present, and
    /// rendering stops cleanly instead.
    pub fn abandon_frame(&mut self, frame: Frame) {
        log::warn!("abandoning frame {}", self.frame_number + 1);
        drop(frame);
        self.state = FrameState::Idle;
    }

    /// The depth resource, for explicit transitions in advanced passes.
    pub fn depth_resource(&self) -> &GpuResource {
        &self.depth
    }
}

fn create_depth(device: &wgpu::Device, width: u32, height: u32) -> (GpuResource, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth buffer"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bytes = width as u64 * height as u64 * 4;
    (
        GpuResource::from_texture(texture, UsageState::DepthWrite, bytes, "depth buffer"),
        view,
    )
}
