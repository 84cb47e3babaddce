// Shader objects
//
// The pipeline stage is a type parameter, so handing a fragment shader to
// the vertex slot of a program is a compile error rather than a link error.

use std::marker::PhantomData;
use std::path::Path;

use crate::backend::ShaderStage;
use crate::context::Context;
use crate::error::{GlazyError, Result};
use crate::handle::GlHandle;

/// Type-level pipeline stage.
pub trait Stage {
    const STAGE: ShaderStage;
}

macro_rules! stages {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Stage for $name {
                const STAGE: ShaderStage = ShaderStage::$name;
            }
        )*
    };
}

stages!(Vertex, TessControl, TessEvaluation, Geometry, Fragment);

#[derive(Debug)]
pub struct Shader<S: Stage> {
    handle: GlHandle,
    _stage: PhantomData<S>,
}

pub type VertexShader = Shader<Vertex>;
pub type TessControlShader = Shader<TessControl>;
pub type TessEvaluationShader = Shader<TessEvaluation>;
pub type GeometryShader = Shader<Geometry>;
pub type FragmentShader = Shader<Fragment>;

impl<S: Stage> Shader<S> {
    /// Compile `source`. On failure the shader object is deleted and the
    /// compiler log is returned in [`GlazyError::Compile`].
    pub fn new(ctx: &Context, source: &str) -> Result<Self> {
        let handle = GlHandle::new_shader(ctx, S::STAGE)?;
        let compiled = ctx.checked("Shader::new", || {
            Ok(ctx.gl().compile_shader(handle.id(), source))
        })?;
        if !compiled {
            let log = ctx.gl().shader_info_log(handle.id());
            let log = if log.trim().is_empty() {
                "(driver returned an empty log)".to_string()
            } else {
                log.trim_end().to_string()
            };
            return Err(GlazyError::Compile {
                stage: S::STAGE.name(),
                log,
            });
        }
        Ok(Self {
            handle,
            _stage: PhantomData,
        })
    }

    pub fn from_file(ctx: &Context, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| GlazyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Compiling {} shader from {:?}", S::STAGE.name(), path);
        Self::new(ctx, &source)
    }

    pub fn id(&self) -> u32 {
        self.handle.id()
    }

    pub fn stage(&self) -> ShaderStage {
        S::STAGE
    }
}

/// Compile a shader whose source is embedded at build time.
///
/// ```ignore
/// let vs = load_shader!(&ctx, glazy::shader::Vertex, "../shaders/quad.vert")?;
/// ```
#[macro_export]
macro_rules! load_shader {
    ($ctx:expr, $stage:ty, $path:expr) => {{
        $crate::shader::Shader::<$stage>::new($ctx, include_str!($path))
    }};
}
