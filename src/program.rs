// Linked shader programs
//
// Uniform uploads bind the program through its bind stack, so setting a
// uniform never disturbs whichever program the caller is drawing with.

use std::borrow::Cow;

use crate::backend::{BindTarget, ResourceKind};
use crate::context::{BindGuard, Context};
use crate::error::{GlazyError, Result};
use crate::handle::{GlHandle, Shared};
use crate::shader::{
    FragmentShader, GeometryShader, TessControlShader, TessEvaluationShader, VertexShader,
};
use crate::uniform::{Uniform, UniformData, UniformKind};

/// Location of an active uniform in one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(u32);

impl UniformLocation {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
pub struct Program {
    handle: GlHandle,
}

pub type SharedProgram = Shared<Program>;

impl Program {
    /// Link the common vertex + fragment pipeline.
    pub fn new(ctx: &Context, vertex: &VertexShader, fragment: &FragmentShader) -> Result<Self> {
        Self::builder(ctx).vertex(vertex).fragment(fragment).link()
    }

    pub fn builder(ctx: &Context) -> ProgramBuilder<'_> {
        ProgramBuilder {
            ctx,
            vertex: None,
            tess_control: None,
            tess_evaluation: None,
            geometry: None,
            fragment: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.handle.id()
    }

    pub fn context(&self) -> &Context {
        self.handle.context()
    }

    /// Make this the current program for the guard's lifetime.
    pub fn bind(&self) -> BindGuard<'_> {
        self.context().bind(BindTarget::Program, self.id())
    }

    /// Location of the vertex input `name`, for
    /// [`VertexArray::attribute`](crate::VertexArray::attribute).
    pub fn attribute_index(&self, name: &str) -> Result<u32> {
        self.context()
            .gl()
            .attrib_location(self.id(), name)
            .ok_or_else(|| GlazyError::invalid_attribute(name))
    }

    pub fn uniform_location(&self, name: &str) -> Result<UniformLocation> {
        self.context()
            .gl()
            .uniform_location(self.id(), name)
            .map(UniformLocation)
            .ok_or_else(|| GlazyError::invalid_uniform(name))
    }

    pub fn set_uniform<U: Uniform>(&self, name: &str, value: &U) -> Result<()> {
        let location = self.uniform_location(name)?;
        self.upload(location, std::slice::from_ref(value))
    }

    /// Upload a whole uniform array in one call. The name must still
    /// resolve when the slice is empty; only the upload is skipped.
    pub fn set_uniform_array<U: Uniform>(&self, name: &str, values: &[U]) -> Result<()> {
        let location = self.uniform_location(name)?;
        if values.is_empty() {
            return Ok(());
        }
        self.upload(location, values)
    }

    /// Upload column-major `columns`x`rows` matrices whose shape is only
    /// known at runtime, e.g. read from a material file.
    pub fn set_matrix_array(&self, name: &str, columns: u8, rows: u8, values: &[f32]) -> Result<()> {
        let location = self.uniform_location(name)?;
        let kind = UniformKind::matrix(columns, rows)?;
        if values.len() % kind.scalars() != 0 {
            return Err(GlazyError::UnsupportedType(format!(
                "{} floats for {}x{} matrices",
                values.len(),
                columns,
                rows
            )));
        }
        if values.is_empty() {
            return Ok(());
        }
        let ctx = self.context();
        ctx.checked(kind, || {
            let _bound = self.bind();
            ctx.gl()
                .uniform(location.0, kind, &UniformData::Float(Cow::Borrowed(values)))
        })
    }

    /// Upload through a location looked up earlier, skipping the name lookup.
    pub fn set_uniform_at<U: Uniform>(&self, location: UniformLocation, value: &U) -> Result<()> {
        self.upload(location, std::slice::from_ref(value))
    }

    fn upload<U: Uniform>(&self, location: UniformLocation, values: &[U]) -> Result<()> {
        let ctx = self.context();
        ctx.checked(U::KIND, || {
            let _bound = self.bind();
            ctx.gl().uniform(location.0, U::KIND, &U::data(values))
        })
    }

    pub fn release(&mut self) {
        self.handle.release();
    }
}

/// Collects the stages of a program before linking. Vertex and fragment
/// stages are required by GL; the others are optional.
pub struct ProgramBuilder<'a> {
    ctx: &'a Context,
    vertex: Option<&'a VertexShader>,
    tess_control: Option<&'a TessControlShader>,
    tess_evaluation: Option<&'a TessEvaluationShader>,
    geometry: Option<&'a GeometryShader>,
    fragment: Option<&'a FragmentShader>,
}

impl<'a> ProgramBuilder<'a> {
    pub fn vertex(mut self, shader: &'a VertexShader) -> Self {
        self.vertex = Some(shader);
        self
    }

    pub fn tess_control(mut self, shader: &'a TessControlShader) -> Self {
        self.tess_control = Some(shader);
        self
    }

    pub fn tess_evaluation(mut self, shader: &'a TessEvaluationShader) -> Self {
        self.tess_evaluation = Some(shader);
        self
    }

    pub fn geometry(mut self, shader: &'a GeometryShader) -> Self {
        self.geometry = Some(shader);
        self
    }

    pub fn fragment(mut self, shader: &'a FragmentShader) -> Self {
        self.fragment = Some(shader);
        self
    }

    /// Attach every stage, link, and detach again. The shaders stay owned
    /// by the caller and can be dropped once this returns.
    pub fn link(self) -> Result<Program> {
        let ctx = self.ctx;
        let handle = GlHandle::new(ctx, ResourceKind::Program)?;
        let shaders: Vec<u32> = [
            self.vertex.map(|s| s.id()),
            self.tess_control.map(|s| s.id()),
            self.tess_evaluation.map(|s| s.id()),
            self.geometry.map(|s| s.id()),
            self.fragment.map(|s| s.id()),
        ]
        .into_iter()
        .flatten()
        .collect();

        let linked = ctx.checked("Program::link", || {
            let gl = ctx.gl();
            for &shader in &shaders {
                gl.attach_shader(handle.id(), shader);
            }
            let linked = gl.link_program(handle.id());
            for &shader in &shaders {
                gl.detach_shader(handle.id(), shader);
            }
            Ok(linked)
        })?;

        if !linked {
            let log = ctx.gl().program_info_log(handle.id());
            return Err(GlazyError::Link {
                log: log.trim_end().to_string(),
            });
        }
        log::debug!("Linked program {} from {} stages", handle.id(), shaders.len());
        Ok(Program { handle })
    }
}
