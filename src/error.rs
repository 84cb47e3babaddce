// Error taxonomy for every fallible GL operation
//
// None of these are transient: they describe programmer errors or broken
// assets, so they propagate to the caller and nothing is retried.

use std::path::PathBuf;

use crate::backend::ResourceKind;

pub type Result<T> = std::result::Result<T, GlazyError>;

#[derive(Debug, thiserror::Error)]
pub enum GlazyError {
    #[error("Failed to allocate id for {kind}: {message}")]
    Allocation { kind: ResourceKind, message: String },

    #[error("{stage} shader compilation failed. Error log:\n\n\"\"\"\n{log}\n\"\"\"")]
    Compile { stage: &'static str, log: String },

    #[error("GPU program linking failed. Error log:\n\n\"\"\"\n{log}\n\"\"\"")]
    Link { log: String },

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Invalid {what} name '{name}'")]
    InvalidName { what: &'static str, name: String },

    #[error("Bind stack for {0} is empty; more releases than bindings")]
    BindStackUnderflow(String),

    #[error("GL error 0x{code:04X} during {operation}")]
    Gl { code: u32, operation: String },

    #[error("{what} {value} does not fit a GL integer")]
    OutOfRange { what: &'static str, value: u64 },

    #[error("Failed to map buffer {id}")]
    MapFailed { id: u32 },

    #[error("Texture data has {actual} texels but {width}x{height} needs {expected}")]
    InvalidTextureSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path:?}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl GlazyError {
    /// Narrow a size or count to the `GLint`/`GLsizei` the entry points take.
    pub(crate) fn gl_int(what: &'static str, value: u64) -> Result<i32> {
        i32::try_from(value).map_err(|_| Self::OutOfRange { what, value })
    }

    pub(crate) fn invalid_attribute(name: &str) -> Self {
        Self::InvalidName {
            what: "attribute",
            name: name.to_string(),
        }
    }

    pub(crate) fn invalid_uniform(name: &str) -> Self {
        Self::InvalidName {
            what: "uniform",
            name: name.to_string(),
        }
    }
}
