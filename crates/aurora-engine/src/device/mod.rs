//! Adapter, device and swapchain ownership.
//!
//! `Gpu` is bound to a window and owns its swapchain; `HeadlessGpu` opens
//! the same device/queue pair with no surface. Both are configured by
//! `GpuInit`. The render pipeline itself only sees a `RenderCtx`.

mod context;
mod frame;
mod headless;
mod init;
mod surface;

pub use context::Gpu;
pub use frame::GpuFrame;
pub use headless::HeadlessGpu;
pub use init::{GpuInit, SurfaceEncoding};
pub use surface::SurfaceErrorAction;

#[cfg(test)]
mod tests {
    use super::SurfaceEncoding;
    use super::surface::{choose_alpha_mode, choose_surface_format};
    use wgpu::TextureFormat as F;

    fn caps(formats: Vec<F>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            ..Default::default()
        }
    }

    #[test]
    fn encoding_picks_matching_bgra() {
        let c = caps(vec![F::Bgra8UnormSrgb, F::Bgra8Unorm]);
        assert_eq!(
            choose_surface_format(&c, SurfaceEncoding::Linear),
            Some(F::Bgra8Unorm)
        );
        assert_eq!(
            choose_surface_format(&c, SurfaceEncoding::Srgb),
            Some(F::Bgra8UnormSrgb)
        );
    }

    #[test]
    fn any_format_of_the_encoding_beats_the_first() {
        let c = caps(vec![F::Rgba8UnormSrgb, F::Rgb10a2Unorm]);
        assert_eq!(
            choose_surface_format(&c, SurfaceEncoding::Linear),
            Some(F::Rgb10a2Unorm)
        );
    }

    #[test]
    fn falls_back_to_first_format() {
        let c = caps(vec![F::Rgb10a2Unorm]);
        assert_eq!(
            choose_surface_format(&c, SurfaceEncoding::Srgb),
            Some(F::Rgb10a2Unorm)
        );
        assert_eq!(
            choose_surface_format(&caps(vec![]), SurfaceEncoding::Linear),
            None
        );
    }

    #[test]
    fn unsupported_alpha_request_is_replaced() {
        let c = caps(vec![F::Bgra8Unorm]);
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
    }
}
