//! Driver failure classification
//!
//! These never unwind out of the crate: the object layer logs them with
//! the driver's info log attached and returns the null handle, so a bad
//! shader degrades the frame instead of ending the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GfxError {
    #[error("shader compilation failed:\n{0}")]
    ShaderCompile(String),

    #[error("program link failed:\n{0}")]
    ProgramLink(String),

    #[error("framebuffer incomplete: {0}")]
    TargetIncomplete(String),
}
