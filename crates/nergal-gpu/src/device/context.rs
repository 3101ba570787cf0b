use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use winit::window::Window;

use crate::error::{GpuError, GpuResult};

/// Adapter/device acquisition parameters.
#[derive(Debug, Clone)]
pub struct ContextInit {
    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features. Favor an empty set for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device. Downlevel defaults keep
    /// software rasterizers viable for headless and CI use.
    pub required_limits: wgpu::Limits,

    pub force_fallback_adapter: bool,
}

impl Default for ContextInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            force_fallback_adapter: false,
        }
    }
}

/// Owns the wgpu core objects.
///
/// Constructed explicitly and passed to every component that needs it; there
/// is deliberately no global device accessor. Any creation failure here
/// aborts initialization entirely — no partial context is ever returned.
pub struct DeviceContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl DeviceContext {
    /// Creates a context with no presentation surface.
    ///
    /// Suited to load-time work, offscreen rendering and tests.
    pub fn headless(init: &ContextInit) -> GpuResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        pollster::block_on(Self::acquire(instance, None, init))
    }

    /// Creates a context compatible with `window` plus the surface itself.
    ///
    /// The surface lifetime is tied to the window; the caller must keep the
    /// window alive for as long as the surface.
    pub fn for_window<'w>(
        window: &'w Window,
        init: &ContextInit,
    ) -> GpuResult<(Self, wgpu::Surface<'w>)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::init(format!("failed to create wgpu surface: {e}")))?;
        let ctx = pollster::block_on(Self::acquire(instance, Some(&surface), init))?;
        Ok((ctx, surface))
    }

    /// Creates a context for an application shell that manages its own
    /// windowing via raw handles.
    ///
    /// # Safety
    ///
    /// The window and display referenced by the handles must outlive the
    /// returned surface.
    pub unsafe fn for_raw_handles(
        display: RawDisplayHandle,
        window: RawWindowHandle,
        init: &ContextInit,
    ) -> GpuResult<(Self, wgpu::Surface<'static>)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display,
                raw_window_handle: window,
            })
        }
        .map_err(|e| GpuError::init(format!("failed to create wgpu surface: {e}")))?;
        let ctx = pollster::block_on(Self::acquire(instance, Some(&surface), init))?;
        Ok((ctx, surface))
    }

    async fn acquire(
        instance: wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
        init: &ContextInit,
    ) -> GpuResult<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .map_err(|e| GpuError::init(format!("failed to find a suitable GPU adapter: {e}")))?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("nergal-gpu device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| GpuError::init(format!("failed to create wgpu device/queue: {e}")))?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }
}
