// Backend module - raw OpenGL entry points
//
// Design: one narrow trait covering exactly the calls the handles issue.
// `native` forwards to glow; `recording` keeps a headless model of the GL
// state so the binding discipline can be tested without a driver.

pub mod native;
pub mod recording;

pub use native::NativeBackend;
pub use recording::RecordingBackend;

use std::fmt;

use crate::attribute::AttributeLayout;
use crate::buffer::{BufferUsage, MapAccess};
use crate::error::Result;
use crate::texture::{TexelFormat, TextureParameter};
use crate::uniform::{UniformData, UniformKind};

/// Kind of GPU object a handle owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Buffer,
    VertexArray,
    Shader,
    Program,
    Texture,
    Sampler,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::VertexArray => "vertex array",
            ResourceKind::Shader => "shader",
            ResourceKind::Program => "program",
            ResourceKind::Texture => "texture",
            ResourceKind::Sampler => "sampler",
        };
        f.write_str(name)
    }
}

/// A binding point. Each one gets its own bind stack in the [`Context`].
///
/// [`Context`]: crate::Context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindTarget {
    ArrayBuffer,
    ElementArrayBuffer,
    VertexArray,
    Program,
    /// `GL_TEXTURE_2D` on texture unit `unit`.
    Texture2D { unit: u32 },
}

impl BindTarget {
    pub fn kind(&self) -> ResourceKind {
        match self {
            BindTarget::ArrayBuffer | BindTarget::ElementArrayBuffer => ResourceKind::Buffer,
            BindTarget::VertexArray => ResourceKind::VertexArray,
            BindTarget::Program => ResourceKind::Program,
            BindTarget::Texture2D { .. } => ResourceKind::Texture,
        }
    }
}

impl fmt::Display for BindTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindTarget::ArrayBuffer => f.write_str("GL_ARRAY_BUFFER"),
            BindTarget::ElementArrayBuffer => f.write_str("GL_ELEMENT_ARRAY_BUFFER"),
            BindTarget::VertexArray => f.write_str("vertex array"),
            BindTarget::Program => f.write_str("program"),
            BindTarget::Texture2D { unit } => write!(f, "GL_TEXTURE_2D (unit {})", unit),
        }
    }
}

/// Programmable pipeline stage of a shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
}

impl ShaderStage {
    pub const fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
            ShaderStage::TessEvaluation => glow::TESS_EVALUATION_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "Vertex",
            ShaderStage::TessControl => "Tessellation control",
            ShaderStage::TessEvaluation => "Tessellation evaluation",
            ShaderStage::Geometry => "Geometry",
            ShaderStage::Fragment => "Fragment",
        }
    }
}

/// Primitive topology for draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Primitive {
    pub const fn gl_enum(self) -> u32 {
        match self {
            Primitive::Points => glow::POINTS,
            Primitive::Lines => glow::LINES,
            Primitive::LineStrip => glow::LINE_STRIP,
            Primitive::Triangles => glow::TRIANGLES,
            Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
            Primitive::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

/// Every raw GL call the library makes goes through this trait.
///
/// Ids are plain `u32` names where 0 means "no object". Implementations
/// only forward; bookkeeping (bind stacks, error checks) lives in
/// [`Context`](crate::Context).
pub trait GlBackend {
    // Object lifetime
    fn create_object(&self, kind: ResourceKind) -> std::result::Result<u32, String>;
    fn create_shader(&self, stage: ShaderStage) -> std::result::Result<u32, String>;
    fn delete_object(&self, kind: ResourceKind, id: u32);

    // Binding
    fn bind(&self, target: BindTarget, id: u32);
    fn active_texture(&self, unit: u32);

    // Buffers
    fn buffer_data(&self, target: BindTarget, data: &[u8], usage: BufferUsage);
    fn map_buffer(&self, target: BindTarget, length: usize, access: MapAccess) -> *mut u8;
    fn unmap_buffer(&self, target: BindTarget);

    // Vertex attributes (apply to the bound vertex array and array buffer)
    fn set_vertex_attrib_enabled(&self, index: u32, enabled: bool);
    fn vertex_attrib_pointer(&self, index: u32, layout: AttributeLayout);

    // Shaders and programs
    fn compile_shader(&self, shader: u32, source: &str) -> bool;
    fn shader_info_log(&self, shader: u32) -> String;
    fn attach_shader(&self, program: u32, shader: u32);
    fn detach_shader(&self, program: u32, shader: u32);
    fn link_program(&self, program: u32) -> bool;
    fn program_info_log(&self, program: u32) -> String;
    fn attrib_location(&self, program: u32, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: u32, name: &str) -> Option<u32>;

    /// Uploads `data` to `location` of the bound program.
    fn uniform(&self, location: u32, kind: UniformKind, data: &UniformData<'_>) -> Result<()>;

    // Textures (apply to GL_TEXTURE_2D on the active unit)
    fn tex_image_2d(&self, width: u32, height: u32, format: TexelFormat, pixels: &[u8]);
    fn generate_mipmap(&self);
    fn tex_parameter(&self, parameter: TextureParameter, value: u32);
    fn sampler_parameter(&self, sampler: u32, parameter: TextureParameter, value: u32);
    fn bind_sampler(&self, unit: u32, sampler: u32);

    fn get_error(&self) -> u32;

    // Frame-level state
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear(&self, color: [f32; 4]);
    fn set_depth_test(&self, enabled: bool);
    fn draw_arrays(&self, mode: Primitive, first: i32, count: i32);
    fn flush(&self);
}
