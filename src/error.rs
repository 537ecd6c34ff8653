use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to find an appropriate graphics adapter")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface has no supported format for the selected adapter")]
    NoSurfaceFormat,
    #[error("shader {0} is missing from the library")]
    MissingShader(usize),
    #[error("failed to read shader {}: {source}", path.display())]
    ShaderIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
