// Recording backend - a headless stand-in for a GL driver
//
// Keeps just enough state to behave like a driver from the handles' point
// of view: lowest-free id allocation per kind (so freed names get reused the
// way real drivers reuse them), the actual binding of every target, buffer
// storage for mapping, and a tiny shader "compiler" that rejects unbalanced
// source and collects attribute/uniform names for linking. Every call is
// appended to a log that tests can inspect.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;

use super::{BindTarget, GlBackend, Primitive, ResourceKind, ShaderStage};
use crate::attribute::AttributeLayout;
use crate::buffer::{BufferUsage, MapAccess};
use crate::error::Result;
use crate::texture::{TexelFormat, TextureParameter};
use crate::uniform::{UniformData, UniformKind};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { kind: ResourceKind, id: u32 },
    Delete { kind: ResourceKind, id: u32 },
    Bind { target: BindTarget, id: u32 },
    ActiveTexture { unit: u32 },
    BufferData { buffer: u32, bytes: usize, usage: BufferUsage },
    MapBuffer { buffer: u32, access: MapAccess },
    UnmapBuffer { buffer: u32 },
    VertexAttribEnabled { vertex_array: u32, index: u32, enabled: bool },
    VertexAttribPointer { vertex_array: u32, buffer: u32, index: u32, layout: AttributeLayout },
    CompileShader { shader: u32, ok: bool },
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram { program: u32, ok: bool },
    Uniform { program: u32, location: u32, kind: UniformKind, data: UniformData<'static> },
    TexImage2D { texture: u32, width: u32, height: u32, format: TexelFormat },
    GenerateMipmap { texture: u32 },
    TexParameter { texture: u32, parameter: TextureParameter, value: u32 },
    SamplerParameter { sampler: u32, parameter: TextureParameter, value: u32 },
    BindSampler { unit: u32, sampler: u32 },
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    Clear { color: [f32; 4] },
    DepthTest { enabled: bool },
    DrawArrays { mode: Primitive, first: i32, count: i32 },
    Flush,
}

// 16-byte aligned storage so mapped ranges can be viewed as any Pod type
#[derive(Clone, Copy)]
#[repr(C, align(16))]
struct Block([u8; 16]);

#[derive(Default)]
struct Storage {
    blocks: Vec<Block>,
    len: usize,
}

struct ShaderRecord {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramRecord {
    attached: Vec<u32>,
    log: String,
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    live: BTreeMap<ResourceKind, BTreeSet<u32>>,
    bound: HashMap<BindTarget, u32>,
    active_unit: u32,
    buffers: HashMap<u32, Storage>,
    mapped: HashSet<u32>,
    shaders: HashMap<u32, ShaderRecord>,
    programs: HashMap<u32, ProgramRecord>,
    pending_errors: VecDeque<u32>,
    fail_allocations: bool,
}

impl State {
    fn allocate(&mut self, kind: ResourceKind) -> std::result::Result<u32, String> {
        if self.fail_allocations {
            return Err("out of memory".to_string());
        }
        let live = self.live.entry(kind).or_default();
        let id = (1..).find(|id| !live.contains(id)).unwrap_or(0);
        live.insert(id);
        self.calls.push(Call::Create { kind, id });
        Ok(id)
    }

    fn resolve(&self, target: BindTarget) -> BindTarget {
        match target {
            BindTarget::Texture2D { .. } => BindTarget::Texture2D {
                unit: self.active_unit,
            },
            other => other,
        }
    }

    fn bound(&self, target: BindTarget) -> u32 {
        self.bound.get(&self.resolve(target)).copied().unwrap_or(0)
    }

    fn raise(&mut self, code: u32) {
        self.pending_errors.push_back(code);
    }
}

/// Headless [`GlBackend`] that records every call.
///
/// Cloning shares the same state, so a test can hand one clone to a
/// [`Context`](crate::Context) and inspect the log through another.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    state: Rc<RefCell<State>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Ids bound to `target`, in call order. 0 is an unbind.
    pub fn binds(&self, target: BindTarget) -> Vec<u32> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Bind { target: t, id } if *t == target => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// What the "driver" currently has bound to `target`.
    pub fn bound(&self, target: BindTarget) -> u32 {
        let state = self.state.borrow();
        state.bound.get(&target).copied().unwrap_or(0)
    }

    pub fn live(&self, kind: ResourceKind) -> Vec<u32> {
        self.state
            .borrow()
            .live
            .get(&kind)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn buffer_contents(&self, buffer: u32) -> Vec<u8> {
        let state = self.state.borrow();
        match state.buffers.get(&buffer) {
            Some(storage) => storage
                .blocks
                .iter()
                .flat_map(|block| block.0)
                .take(storage.len)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn fail_allocations(&self, fail: bool) {
        self.state.borrow_mut().fail_allocations = fail;
    }

    /// Queue a GL error code to be returned by the next `get_error`.
    pub fn push_error(&self, code: u32) {
        self.state.borrow_mut().raise(code);
    }
}

/// Rejects sources without a `main` or with unbalanced brackets, the way a
/// real front end would reject a syntax error.
fn check_source(source: &str) -> std::result::Result<(), String> {
    if source.trim().is_empty() {
        return Err("0:1: error: empty shader source".to_string());
    }
    let mut stack = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        for c in line.chars() {
            match c {
                '{' | '(' | '[' => stack.push(c),
                '}' | ')' | ']' => {
                    let open = match c {
                        '}' => '{',
                        ')' => '(',
                        _ => '[',
                    };
                    if stack.pop() != Some(open) {
                        return Err(format!(
                            "0:{}: error: syntax error, unexpected '{}'",
                            line_no + 1,
                            c
                        ));
                    }
                }
                _ => {}
            }
        }
    }
    if !stack.is_empty() {
        return Err("0:0: error: syntax error, unexpected end of file".to_string());
    }
    if !source.contains("main") {
        return Err("0:0: error: function 'main' is not defined".to_string());
    }
    Ok(())
}

fn declared_name(line: &str, qualifier: &str) -> Option<String> {
    let line = line.split("//").next()?.trim();
    let line = line.strip_suffix(';')?;
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if !tokens.contains(&qualifier) {
        return None;
    }
    let last = tokens.last()?;
    let name = last.split('[').next()?;
    Some(name.to_string())
}

impl GlBackend for RecordingBackend {
    fn create_object(&self, kind: ResourceKind) -> std::result::Result<u32, String> {
        if kind == ResourceKind::Shader {
            return Err("shaders need a stage; use create_shader".to_string());
        }
        let mut state = self.state.borrow_mut();
        let id = state.allocate(kind)?;
        match kind {
            ResourceKind::Buffer => {
                state.buffers.insert(id, Storage::default());
            }
            ResourceKind::Program => {
                state.programs.insert(id, ProgramRecord::default());
            }
            _ => {}
        }
        Ok(id)
    }

    fn create_shader(&self, stage: ShaderStage) -> std::result::Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate(ResourceKind::Shader)?;
        state.shaders.insert(
            id,
            ShaderRecord {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Ok(id)
    }

    fn delete_object(&self, kind: ResourceKind, id: u32) {
        if id == 0 {
            return;
        }
        let mut state = self.state.borrow_mut();
        let was_live = state
            .live
            .get_mut(&kind)
            .is_some_and(|ids| ids.remove(&id));
        if !was_live {
            return;
        }
        state.calls.push(Call::Delete { kind, id });
        // Deleting a bound object reverts the binding to 0
        for (target, bound) in state.bound.iter_mut() {
            if target.kind() == kind && *bound == id {
                *bound = 0;
            }
        }
        match kind {
            ResourceKind::Buffer => {
                state.buffers.remove(&id);
                state.mapped.remove(&id);
            }
            ResourceKind::Shader => {
                state.shaders.remove(&id);
            }
            ResourceKind::Program => {
                state.programs.remove(&id);
            }
            _ => {}
        }
    }

    fn bind(&self, target: BindTarget, id: u32) {
        let mut state = self.state.borrow_mut();
        let resolved = state.resolve(target);
        state.calls.push(Call::Bind {
            target: resolved,
            id,
        });
        let exists = id == 0
            || state
                .live
                .get(&target.kind())
                .is_some_and(|ids| ids.contains(&id));
        if exists {
            state.bound.insert(resolved, id);
        } else {
            state.raise(glow::INVALID_OPERATION);
        }
    }

    fn active_texture(&self, unit: u32) {
        let mut state = self.state.borrow_mut();
        state.active_unit = unit;
        state.calls.push(Call::ActiveTexture { unit });
    }

    fn buffer_data(&self, target: BindTarget, data: &[u8], usage: BufferUsage) {
        let mut state = self.state.borrow_mut();
        let buffer = state.bound(target);
        state.calls.push(Call::BufferData {
            buffer,
            bytes: data.len(),
            usage,
        });
        let Some(storage) = state.buffers.get_mut(&buffer) else {
            state.raise(glow::INVALID_OPERATION);
            return;
        };
        let mut blocks = vec![Block([0; 16]); data.len().div_ceil(16)];
        for (block, chunk) in blocks.iter_mut().zip(data.chunks(16)) {
            block.0[..chunk.len()].copy_from_slice(chunk);
        }
        storage.blocks = blocks;
        storage.len = data.len();
    }

    fn map_buffer(&self, target: BindTarget, length: usize, access: MapAccess) -> *mut u8 {
        let mut state = self.state.borrow_mut();
        let buffer = state.bound(target);
        state.calls.push(Call::MapBuffer { buffer, access });
        if buffer == 0 || state.mapped.contains(&buffer) {
            state.raise(glow::INVALID_OPERATION);
            return std::ptr::null_mut();
        }
        let in_range = state
            .buffers
            .get(&buffer)
            .is_some_and(|storage| length > 0 && length <= storage.len);
        if !in_range {
            state.raise(glow::INVALID_VALUE);
            return std::ptr::null_mut();
        }
        let Some(storage) = state.buffers.get_mut(&buffer) else {
            return std::ptr::null_mut();
        };
        let ptr = storage.blocks.as_mut_ptr() as *mut u8;
        state.mapped.insert(buffer);
        ptr
    }

    fn unmap_buffer(&self, target: BindTarget) {
        let mut state = self.state.borrow_mut();
        let buffer = state.bound(target);
        state.calls.push(Call::UnmapBuffer { buffer });
        if !state.mapped.remove(&buffer) {
            state.raise(glow::INVALID_OPERATION);
        }
    }

    fn set_vertex_attrib_enabled(&self, index: u32, enabled: bool) {
        let mut state = self.state.borrow_mut();
        let vertex_array = state.bound(BindTarget::VertexArray);
        state.calls.push(Call::VertexAttribEnabled {
            vertex_array,
            index,
            enabled,
        });
    }

    fn vertex_attrib_pointer(&self, index: u32, layout: AttributeLayout) {
        let mut state = self.state.borrow_mut();
        let vertex_array = state.bound(BindTarget::VertexArray);
        let buffer = state.bound(BindTarget::ArrayBuffer);
        state.calls.push(Call::VertexAttribPointer {
            vertex_array,
            buffer,
            index,
            layout,
        });
        if vertex_array == 0 || buffer == 0 {
            state.raise(glow::INVALID_OPERATION);
        }
    }

    fn compile_shader(&self, shader: u32, source: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let result = check_source(source);
        let ok = result.is_ok();
        state.calls.push(Call::CompileShader { shader, ok });
        let Some(record) = state.shaders.get_mut(&shader) else {
            state.raise(glow::INVALID_VALUE);
            return false;
        };
        record.source = source.to_string();
        record.compiled = ok;
        record.log = result.err().unwrap_or_default();
        ok
    }

    fn shader_info_log(&self, shader: u32) -> String {
        let state = self.state.borrow();
        state
            .shaders
            .get(&shader)
            .map(|record| record.log.clone())
            .unwrap_or_default()
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::AttachShader { program, shader });
        if let Some(record) = state.programs.get_mut(&program) {
            record.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::DetachShader { program, shader });
        if let Some(record) = state.programs.get_mut(&program) {
            record.attached.retain(|&s| s != shader);
        }
    }

    fn link_program(&self, program: u32) -> bool {
        let mut state = self.state.borrow_mut();
        let attached = match state.programs.get(&program) {
            Some(record) => record.attached.clone(),
            None => {
                state.calls.push(Call::LinkProgram { program, ok: false });
                return false;
            }
        };

        let mut log = String::new();
        let mut attributes = Vec::new();
        let mut uniforms = Vec::new();
        let mut stages = Vec::new();
        for shader in &attached {
            let Some(record) = state.shaders.get(shader) else {
                continue;
            };
            if !record.compiled {
                log.push_str(&format!("error: shader {} is not compiled\n", shader));
            }
            stages.push(record.stage);
            for line in record.source.lines() {
                if record.stage == ShaderStage::Vertex {
                    if let Some(name) = declared_name(line, "in") {
                        attributes.push(name);
                    }
                }
                if let Some(name) = declared_name(line, "uniform") {
                    if !uniforms.contains(&name) {
                        uniforms.push(name);
                    }
                }
            }
        }
        if !stages.contains(&ShaderStage::Vertex) {
            log.push_str("error: program has no vertex shader attached\n");
        }
        if !stages.contains(&ShaderStage::Fragment) {
            log.push_str("error: program has no fragment shader attached\n");
        }

        let ok = log.is_empty();
        state.calls.push(Call::LinkProgram { program, ok });
        if let Some(record) = state.programs.get_mut(&program) {
            record.log = log;
            if ok {
                record.attributes = attributes;
                record.uniforms = uniforms;
            }
        }
        ok
    }

    fn program_info_log(&self, program: u32) -> String {
        let state = self.state.borrow();
        state
            .programs
            .get(&program)
            .map(|record| record.log.clone())
            .unwrap_or_default()
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let record = state.programs.get(&program)?;
        record
            .attributes
            .iter()
            .position(|a| a == name)
            .map(|i| i as u32)
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let record = state.programs.get(&program)?;
        record
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| i as u32)
    }

    fn uniform(&self, location: u32, kind: UniformKind, data: &UniformData<'_>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let program = state.bound(BindTarget::Program);
        state.calls.push(Call::Uniform {
            program,
            location,
            kind,
            data: data.to_owned_data(),
        });
        if program == 0 {
            state.raise(glow::INVALID_OPERATION);
        }
        Ok(())
    }

    fn tex_image_2d(&self, width: u32, height: u32, format: TexelFormat, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        let texture = state.bound(BindTarget::Texture2D { unit: 0 });
        state.calls.push(Call::TexImage2D {
            texture,
            width,
            height,
            format,
        });
        let expected = width as usize * height as usize * format.bytes_per_texel();
        if texture == 0 || pixels.len() < expected {
            state.raise(glow::INVALID_OPERATION);
        }
    }

    fn generate_mipmap(&self) {
        let mut state = self.state.borrow_mut();
        let texture = state.bound(BindTarget::Texture2D { unit: 0 });
        state.calls.push(Call::GenerateMipmap { texture });
    }

    fn tex_parameter(&self, parameter: TextureParameter, value: u32) {
        let mut state = self.state.borrow_mut();
        let texture = state.bound(BindTarget::Texture2D { unit: 0 });
        state.calls.push(Call::TexParameter {
            texture,
            parameter,
            value,
        });
    }

    fn sampler_parameter(&self, sampler: u32, parameter: TextureParameter, value: u32) {
        self.state.borrow_mut().calls.push(Call::SamplerParameter {
            sampler,
            parameter,
            value,
        });
    }

    fn bind_sampler(&self, unit: u32, sampler: u32) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::BindSampler { unit, sampler });
    }

    fn get_error(&self) -> u32 {
        self.state
            .borrow_mut()
            .pending_errors
            .pop_front()
            .unwrap_or(glow::NO_ERROR)
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().calls.push(Call::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn clear(&self, color: [f32; 4]) {
        self.state.borrow_mut().calls.push(Call::Clear { color });
    }

    fn set_depth_test(&self, enabled: bool) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::DepthTest { enabled });
    }

    fn draw_arrays(&self, mode: Primitive, first: i32, count: i32) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::DrawArrays { mode, first, count });
    }

    fn flush(&self) {
        self.state.borrow_mut().calls.push(Call::Flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_ids_are_reused_lowest_first() {
        let gl = RecordingBackend::new();
        let a = gl.create_object(ResourceKind::Buffer).unwrap();
        let b = gl.create_object(ResourceKind::Buffer).unwrap();
        assert_eq!((a, b), (1, 2));
        gl.delete_object(ResourceKind::Buffer, a);
        assert_eq!(gl.create_object(ResourceKind::Buffer).unwrap(), 1);
        assert_eq!(gl.create_object(ResourceKind::Buffer).unwrap(), 3);
    }

    #[test]
    fn ids_are_counted_per_kind() {
        let gl = RecordingBackend::new();
        assert_eq!(gl.create_object(ResourceKind::Buffer).unwrap(), 1);
        assert_eq!(gl.create_object(ResourceKind::Texture).unwrap(), 1);
        assert_eq!(gl.create_shader(ShaderStage::Vertex).unwrap(), 1);
    }

    #[test]
    fn deleting_twice_is_recorded_once() {
        let gl = RecordingBackend::new();
        let id = gl.create_object(ResourceKind::VertexArray).unwrap();
        gl.delete_object(ResourceKind::VertexArray, id);
        gl.delete_object(ResourceKind::VertexArray, id);
        let deletes = gl
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Delete { .. }))
            .count();
        assert_eq!(deletes, 1);
    }

    #[test]
    fn deleting_a_bound_object_unbinds_it() {
        let gl = RecordingBackend::new();
        let id = gl.create_object(ResourceKind::Buffer).unwrap();
        gl.bind(BindTarget::ArrayBuffer, id);
        assert_eq!(gl.bound(BindTarget::ArrayBuffer), id);
        gl.delete_object(ResourceKind::Buffer, id);
        assert_eq!(gl.bound(BindTarget::ArrayBuffer), 0);
    }

    #[test]
    fn source_checker_reports_location() {
        // Reported where the parse breaks, like a real compiler
        let err = check_source("void main() {\n  gl_Position = vec4(1.0;\n}").unwrap_err();
        assert!(err.contains("0:3"), "{}", err);
        let err = check_source("void main() {\n  gl_Position = vec4(1.0));\n}").unwrap_err();
        assert!(err.starts_with("0:2:"), "{}", err);
        assert!(check_source("void main() { }").is_ok());
        assert!(check_source("void mian() { }").is_err());
    }

    #[test]
    fn declarations_are_parsed() {
        assert_eq!(declared_name("in vec3 pos;", "in").as_deref(), Some("pos"));
        assert_eq!(
            declared_name("layout(location = 1) in vec2 uv; // uvs", "in").as_deref(),
            Some("uv")
        );
        assert_eq!(
            declared_name("uniform vec4 lights[4];", "uniform").as_deref(),
            Some("lights")
        );
        assert_eq!(declared_name("out vec4 color;", "in"), None);
    }
}
