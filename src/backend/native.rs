// Native backend - forwards to a loaded glow context
//
// glow takes typed object names; the handles above us only see raw u32
// ids, so every call converts back through NonZeroU32 (0 maps to None).

use std::ffi::{c_void, CStr};
use std::num::NonZeroU32;

use glow::HasContext;

use super::{BindTarget, GlBackend, Primitive, ResourceKind, ShaderStage};
use crate::attribute::{AttributeLayout, AttributeUpload};
use crate::buffer::{BufferUsage, MapAccess};
use crate::error::{GlazyError, Result};
use crate::texture::{TexelFormat, TextureParameter};
use crate::uniform::{UniformData, UniformKind};

pub struct NativeBackend {
    gl: glow::Context,
}

impl NativeBackend {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// Load GL entry points through a platform proc-address function.
    ///
    /// # Safety
    /// A GL context must be current on this thread and `loader` must return
    /// valid function pointers for it.
    pub unsafe fn from_loader<F>(loader: F) -> Self
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        Self::new(glow::Context::from_loader_function_cstr(loader))
    }

    /// Driver-reported version string, for the startup log.
    pub fn version(&self) -> String {
        unsafe { self.gl.get_parameter_string(glow::VERSION) }
    }

    pub fn renderer(&self) -> String {
        unsafe { self.gl.get_parameter_string(glow::RENDERER) }
    }
}

fn name(id: u32) -> Option<NonZeroU32> {
    NonZeroU32::new(id)
}

fn buffer_target(target: BindTarget) -> u32 {
    match target {
        BindTarget::ElementArrayBuffer => glow::ELEMENT_ARRAY_BUFFER,
        _ => glow::ARRAY_BUFFER,
    }
}

impl GlBackend for NativeBackend {
    fn create_object(&self, kind: ResourceKind) -> std::result::Result<u32, String> {
        unsafe {
            match kind {
                ResourceKind::Buffer => self.gl.create_buffer().map(|b| b.0.get()),
                ResourceKind::VertexArray => self.gl.create_vertex_array().map(|v| v.0.get()),
                ResourceKind::Program => self.gl.create_program().map(|p| p.0.get()),
                ResourceKind::Texture => self.gl.create_texture().map(|t| t.0.get()),
                ResourceKind::Sampler => self.gl.create_sampler().map(|s| s.0.get()),
                ResourceKind::Shader => Err("shaders need a stage; use create_shader".to_string()),
            }
        }
    }

    fn create_shader(&self, stage: ShaderStage) -> std::result::Result<u32, String> {
        unsafe { self.gl.create_shader(stage.gl_enum()).map(|s| s.0.get()) }
    }

    fn delete_object(&self, kind: ResourceKind, id: u32) {
        let Some(id) = name(id) else { return };
        unsafe {
            match kind {
                ResourceKind::Buffer => self.gl.delete_buffer(glow::NativeBuffer(id)),
                ResourceKind::VertexArray => self.gl.delete_vertex_array(glow::NativeVertexArray(id)),
                ResourceKind::Shader => self.gl.delete_shader(glow::NativeShader(id)),
                ResourceKind::Program => self.gl.delete_program(glow::NativeProgram(id)),
                ResourceKind::Texture => self.gl.delete_texture(glow::NativeTexture(id)),
                ResourceKind::Sampler => self.gl.delete_sampler(glow::NativeSampler(id)),
            }
        }
    }

    fn bind(&self, target: BindTarget, id: u32) {
        let id = name(id);
        unsafe {
            match target {
                BindTarget::ArrayBuffer | BindTarget::ElementArrayBuffer => self
                    .gl
                    .bind_buffer(buffer_target(target), id.map(glow::NativeBuffer)),
                BindTarget::VertexArray => {
                    self.gl.bind_vertex_array(id.map(glow::NativeVertexArray))
                }
                BindTarget::Program => self.gl.use_program(id.map(glow::NativeProgram)),
                BindTarget::Texture2D { .. } => self
                    .gl
                    .bind_texture(glow::TEXTURE_2D, id.map(glow::NativeTexture)),
            }
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn buffer_data(&self, target: BindTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(buffer_target(target), data, usage.gl_enum())
        }
    }

    fn map_buffer(&self, target: BindTarget, length: usize, access: MapAccess) -> *mut u8 {
        unsafe {
            self.gl.map_buffer_range(
                buffer_target(target),
                0,
                length as i32,
                access.gl_range_bits(),
            )
        }
    }

    fn unmap_buffer(&self, target: BindTarget) {
        unsafe { self.gl.unmap_buffer(buffer_target(target)) }
    }

    fn set_vertex_attrib_enabled(&self, index: u32, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable_vertex_attrib_array(index)
            } else {
                self.gl.disable_vertex_attrib_array(index)
            }
        }
    }

    fn vertex_attrib_pointer(&self, index: u32, layout: AttributeLayout) {
        let data_type = layout.scalar.gl_enum();
        unsafe {
            match layout.upload {
                AttributeUpload::Integer => {
                    self.gl
                        .vertex_attrib_pointer_i32(index, layout.components, data_type, 0, 0)
                }
                AttributeUpload::Float => self.gl.vertex_attrib_pointer_f32(
                    index,
                    layout.components,
                    data_type,
                    false,
                    0,
                    0,
                ),
            }
        }
    }

    fn compile_shader(&self, shader: u32, source: &str) -> bool {
        let Some(id) = name(shader) else { return false };
        let shader = glow::NativeShader(id);
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            self.gl.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: u32) -> String {
        match name(shader) {
            Some(id) => unsafe { self.gl.get_shader_info_log(glow::NativeShader(id)) },
            None => String::new(),
        }
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let (Some(p), Some(s)) = (name(program), name(shader)) {
            unsafe {
                self.gl
                    .attach_shader(glow::NativeProgram(p), glow::NativeShader(s))
            }
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        if let (Some(p), Some(s)) = (name(program), name(shader)) {
            unsafe {
                self.gl
                    .detach_shader(glow::NativeProgram(p), glow::NativeShader(s))
            }
        }
    }

    fn link_program(&self, program: u32) -> bool {
        let Some(id) = name(program) else { return false };
        let program = glow::NativeProgram(id);
        unsafe {
            self.gl.link_program(program);
            self.gl.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: u32) -> String {
        match name(program) {
            Some(id) => unsafe { self.gl.get_program_info_log(glow::NativeProgram(id)) },
            None => String::new(),
        }
    }

    fn attrib_location(&self, program: u32, attribute: &str) -> Option<u32> {
        let id = name(program)?;
        unsafe { self.gl.get_attrib_location(glow::NativeProgram(id), attribute) }
    }

    fn uniform_location(&self, program: u32, uniform: &str) -> Option<u32> {
        let id = name(program)?;
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(id), uniform)
                .map(|location| location.0)
        }
    }

    fn uniform(&self, location: u32, kind: UniformKind, data: &UniformData<'_>) -> Result<()> {
        let loc = glow::NativeUniformLocation(location);
        let loc = Some(&loc);
        unsafe {
            match (kind, data) {
                (UniformKind::Float(1), UniformData::Float(v)) => self.gl.uniform_1_f32_slice(loc, v),
                (UniformKind::Float(2), UniformData::Float(v)) => self.gl.uniform_2_f32_slice(loc, v),
                (UniformKind::Float(3), UniformData::Float(v)) => self.gl.uniform_3_f32_slice(loc, v),
                (UniformKind::Float(4), UniformData::Float(v)) => self.gl.uniform_4_f32_slice(loc, v),
                (UniformKind::Int(1), UniformData::Int(v)) => self.gl.uniform_1_i32_slice(loc, v),
                (UniformKind::Int(2), UniformData::Int(v)) => self.gl.uniform_2_i32_slice(loc, v),
                (UniformKind::Int(3), UniformData::Int(v)) => self.gl.uniform_3_i32_slice(loc, v),
                (UniformKind::Int(4), UniformData::Int(v)) => self.gl.uniform_4_i32_slice(loc, v),
                (UniformKind::UInt(1), UniformData::UInt(v)) => self.gl.uniform_1_u32_slice(loc, v),
                (UniformKind::UInt(2), UniformData::UInt(v)) => self.gl.uniform_2_u32_slice(loc, v),
                (UniformKind::UInt(3), UniformData::UInt(v)) => self.gl.uniform_3_u32_slice(loc, v),
                (UniformKind::UInt(4), UniformData::UInt(v)) => self.gl.uniform_4_u32_slice(loc, v),
                (UniformKind::Matrix { columns, rows }, UniformData::Float(v)) => {
                    match (columns, rows) {
                        (2, 2) => self.gl.uniform_matrix_2_f32_slice(loc, false, v),
                        (3, 3) => self.gl.uniform_matrix_3_f32_slice(loc, false, v),
                        (4, 4) => self.gl.uniform_matrix_4_f32_slice(loc, false, v),
                        (2, 3) => self.gl.uniform_matrix_2x3_f32_slice(loc, false, v),
                        (3, 2) => self.gl.uniform_matrix_3x2_f32_slice(loc, false, v),
                        (2, 4) => self.gl.uniform_matrix_2x4_f32_slice(loc, false, v),
                        (4, 2) => self.gl.uniform_matrix_4x2_f32_slice(loc, false, v),
                        (3, 4) => self.gl.uniform_matrix_3x4_f32_slice(loc, false, v),
                        (4, 3) => self.gl.uniform_matrix_4x3_f32_slice(loc, false, v),
                        _ => return Err(GlazyError::UnsupportedType(kind.to_string())),
                    }
                }
                _ => return Err(GlazyError::UnsupportedType(kind.to_string())),
            }
        }
        Ok(())
    }

    fn tex_image_2d(&self, width: u32, height: u32, format: TexelFormat, pixels: &[u8]) {
        unsafe {
            // Rows of RGB8 data are not 4-byte aligned
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format.internal_format() as i32,
                width as i32,
                height as i32,
                0,
                format.gl_format(),
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    fn generate_mipmap(&self) {
        unsafe { self.gl.generate_mipmap(glow::TEXTURE_2D) }
    }

    fn tex_parameter(&self, parameter: TextureParameter, value: u32) {
        unsafe {
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, parameter.gl_enum(), value as i32)
        }
    }

    fn sampler_parameter(&self, sampler: u32, parameter: TextureParameter, value: u32) {
        if let Some(id) = name(sampler) {
            unsafe {
                self.gl.sampler_parameter_i32(
                    glow::NativeSampler(id),
                    parameter.gl_enum(),
                    value as i32,
                )
            }
        }
    }

    fn bind_sampler(&self, unit: u32, sampler: u32) {
        unsafe { self.gl.bind_sampler(unit, name(sampler).map(glow::NativeSampler)) }
    }

    fn get_error(&self) -> u32 {
        unsafe { self.gl.get_error() }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn clear(&self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn set_depth_test(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST)
            } else {
                self.gl.disable(glow::DEPTH_TEST)
            }
        }
    }

    fn draw_arrays(&self, mode: Primitive, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(mode.gl_enum(), first, count) }
    }

    fn flush(&self) {
        unsafe { self.gl.flush() }
    }
}
