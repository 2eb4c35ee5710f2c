use thiserror::Error;

/// Errors raised by the offscreen pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// A render target could not be created; no partial set is kept.
    #[error("cannot allocate render target `{label}` at {width}x{height}: {reason}")]
    TargetAllocation {
        label: &'static str,
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("texture `{label}` rejected: {reason}")]
    InvalidTexture { label: String, reason: String },

    /// A pipeline writes more color attachments than the binding has.
    #[error("pipeline `{pipeline}` writes {writes} color attachments, {bound} bound")]
    DrawBuffers {
        pipeline: &'static str,
        writes: u32,
        bound: u32,
    },

    #[error("readback failed: {0}")]
    Readback(String),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
