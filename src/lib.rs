//! glazy: RAII handles over OpenGL objects.
//!
//! Every GPU object (buffer, vertex array, shader, program, texture, sampler)
//! is owned by exactly one handle and deleted when that handle drops. Scoped
//! bindings go through per-target bind stacks held by a [`Context`], so a
//! nested bind always restores what the caller had bound. Vertex attributes
//! and uniforms pick the right GL entry point from the Rust element type.
//!
//! ```ignore
//! let vs = VertexShader::new(&ctx, VERTEX_SOURCE)?;
//! let fs = FragmentShader::new(&ctx, FRAGMENT_SOURCE)?;
//! let program = Program::new(&ctx, &vs, &fs)?;
//!
//! let points = Buffer::with_data(&ctx, &shape::quad(), BufferUsage::StaticDraw)?;
//! let vao = VertexArray::new(&ctx)?;
//! vao.attribute(program.attribute_index("point")?)
//!     .enable()?
//!     .set_buffer(&points)?;
//!
//! let _program = program.bind();
//! let _vao = vao.bind();
//! ctx.draw_arrays(Primitive::Triangles, 0, points.len())?;
//! ```

pub mod app;
pub mod attribute;
pub mod backend;
pub mod bind_stack;
pub mod buffer;
pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod program;
pub mod shader;
pub mod shape;
pub mod texture;
pub mod uniform;
pub mod vertex_array;

pub use attribute::{AttributeLayout, AttributeUpload, ScalarKind, VertexAttribute};
pub use backend::{BindTarget, GlBackend, NativeBackend, Primitive, RecordingBackend, ResourceKind};
pub use buffer::{Buffer, BufferMapping, BufferUsage, MapAccess, SharedBuffer};
pub use context::{BindGuard, Context};
pub use error::{GlazyError, Result};
pub use handle::{GlHandle, Shared};
pub use program::{Program, ProgramBuilder, SharedProgram, UniformLocation};
pub use shader::{
    FragmentShader, GeometryShader, Shader, TessControlShader, TessEvaluationShader, VertexShader,
};
pub use texture::{Filter, Rgb8, Rgba8, Sampler, SharedTexture, Texel, Texture, Wrap};
pub use uniform::{Uniform, UniformData, UniformKind};
pub use vertex_array::{Attribute, SharedVertexArray, VertexArray};
