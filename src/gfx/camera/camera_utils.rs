use super::viewport_camera::{ViewTransform, ViewportCamera};

/// Camera data as laid out in the display shader's uniform block
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// Top-left of the visible region in texture coordinates
    pub position: [f32; 2],
    /// Texture coordinates spanned by the full viewport
    pub scale: [f32; 2],
    /// Current zoom factor, used to centre letterboxed output
    pub zoom: f32,
    /// Non-zero when sampling repeats past the texture edge
    pub wrap: u32,

    /// Pads the block to 16-byte alignment.
    pub _padding: [u32; 2],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::from_transform(
            ViewTransform {
                position: [0.0, 0.0],
                scale: [1.0, 1.0],
            },
            1.0,
            true,
        )
    }
}

impl CameraUniform {
    pub fn from_transform(transform: ViewTransform, zoom: f32, wrap: bool) -> Self {
        Self {
            position: transform.position,
            scale: transform.scale,
            zoom,
            wrap: wrap as u32,
            _padding: [0; 2],
        }
    }
}

impl From<&ViewportCamera> for CameraUniform {
    fn from(camera: &ViewportCamera) -> Self {
        Self::from_transform(camera.transform(), camera.zoom_factor(), camera.wrap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 32);
    }

    #[test]
    fn test_uniform_from_camera() {
        let camera = ViewportCamera::new(800, 400, (200, 100)).with_wrap(false);
        let uniform = CameraUniform::from(&camera);
        assert_eq!(uniform.position, [0.0, 0.0]);
        assert_eq!(uniform.scale, [1.0, 1.0]);
        assert_eq!(uniform.zoom, 1.0);
        assert_eq!(uniform.wrap, 0);
    }
}
