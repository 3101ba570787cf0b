use crate::error::{GpuError, GpuResult};

/// Frame controller initialization parameters.
///
/// Keep this structure stable and minimal. The backbuffer count is the
/// compile-time constant [`FRAME_COUNT`](super::FRAME_COUNT), deliberately
/// not runtime-mutable.
#[derive(Debug, Clone)]
pub struct DeviceInit {
    /// Drawable size in physical pixels.
    pub width: u32,
    pub height: u32,

    /// Synchronize presentation with vertical blank.
    pub vsync: bool,

    /// Recorded for the application shell; window-mode switching itself is
    /// the shell's job.
    pub fullscreen: bool,

    /// Near/far depth planes consumed by projection math upstream.
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Default for DeviceInit {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            vsync: true,
            fullscreen: false,
            near_plane: 0.1,
            far_plane: 1000.0,
        }
    }
}

impl DeviceInit {
    pub(crate) fn validate(&self) -> GpuResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GpuError::init(format!(
                "zero drawable size {}x{}",
                self.width, self.height
            )));
        }
        if !(self.near_plane > 0.0 && self.far_plane > self.near_plane) {
            return Err(GpuError::init(format!(
                "invalid depth planes near={} far={}",
                self.near_plane, self.far_plane
            )));
        }
        Ok(())
    }

    pub(crate) fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_expected_surface() {
        let init = DeviceInit::default();
        assert_eq!((init.width, init.height), (800, 600));
        assert!(init.vsync);
        assert!(!init.fullscreen);
        assert!(init.validate().is_ok());
    }

    #[test]
    fn zero_size_is_rejected() {
        let init = DeviceInit {
            width: 0,
            ..Default::default()
        };
        assert!(init.validate().is_err());
    }

    #[test]
    fn inverted_depth_planes_are_rejected() {
        let init = DeviceInit {
            near_plane: 10.0,
            far_plane: 1.0,
            ..Default::default()
        };
        assert!(init.validate().is_err());
    }
}
