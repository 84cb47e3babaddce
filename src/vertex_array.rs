// Vertex array objects and their attribute slots

use bytemuck::Pod;

use crate::attribute::{AttributeLayout, VertexAttribute};
use crate::backend::{BindTarget, ResourceKind};
use crate::buffer::Buffer;
use crate::context::{BindGuard, Context};
use crate::error::{GlazyError, Result};
use crate::handle::{GlHandle, Shared};

#[derive(Debug)]
pub struct VertexArray {
    handle: GlHandle,
}

pub type SharedVertexArray = Shared<VertexArray>;

impl VertexArray {
    pub fn new(ctx: &Context) -> Result<Self> {
        Ok(Self {
            handle: GlHandle::new(ctx, ResourceKind::VertexArray)?,
        })
    }

    pub fn id(&self) -> u32 {
        self.handle.id()
    }

    pub fn context(&self) -> &Context {
        self.handle.context()
    }

    pub fn bind(&self) -> BindGuard<'_> {
        self.context().bind(BindTarget::VertexArray, self.id())
    }

    /// Accessor for attribute slot `index`, usually from
    /// [`Program::attribute_index`](crate::Program::attribute_index).
    pub fn attribute(&self, index: u32) -> Attribute<'_> {
        Attribute { vao: self, index }
    }

    pub fn release(&mut self) {
        self.handle.release();
    }
}

/// One attribute slot of a vertex array. Every call binds the vertex
/// array for its own duration only.
#[derive(Debug)]
pub struct Attribute<'a> {
    vao: &'a VertexArray,
    index: u32,
}

impl Attribute<'_> {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn enable(&self) -> Result<&Self> {
        self.set_enabled(true, "Attribute::enable")
    }

    pub fn disable(&self) -> Result<&Self> {
        self.set_enabled(false, "Attribute::disable")
    }

    fn set_enabled(&self, enabled: bool, operation: &str) -> Result<&Self> {
        let ctx = self.vao.context();
        ctx.checked(operation, || {
            let _vao = self.vao.bind();
            ctx.gl().set_vertex_attrib_enabled(self.index, enabled);
            Ok(())
        })?;
        Ok(self)
    }

    /// Source this attribute from `buffer`, with the layout implied by `T`.
    pub fn set_buffer<T: VertexAttribute>(&self, buffer: &Buffer<T>) -> Result<&Self> {
        self.point_at(buffer, AttributeLayout::of::<T>())
    }

    /// Source this attribute from `buffer` with a layout built at runtime,
    /// e.g. half floats or a type enum read from a mesh file. The layout
    /// must describe exactly one `T` per vertex.
    pub fn set_buffer_with_layout<T: Pod>(
        &self,
        buffer: &Buffer<T>,
        layout: AttributeLayout,
    ) -> Result<&Self> {
        let size = std::mem::size_of::<T>();
        if layout.element_size() != size {
            return Err(GlazyError::UnsupportedType(format!(
                "{} x {:?} attribute over {}-byte elements",
                layout.components, layout.scalar, size
            )));
        }
        self.point_at(buffer, layout)
    }

    fn point_at<T: Pod>(&self, buffer: &Buffer<T>, layout: AttributeLayout) -> Result<&Self> {
        let ctx = self.vao.context();
        ctx.checked("Attribute::set_buffer", || {
            let _vao = self.vao.bind();
            let _buffer = buffer.bind();
            ctx.gl().vertex_attrib_pointer(self.index, layout);
            Ok(())
        })?;
        log::debug!(
            "Attribute {} of vertex array {} <- buffer {} ({:?})",
            self.index,
            self.vao.id(),
            buffer.id(),
            layout
        );
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeUpload, ScalarKind};
    use crate::backend::recording::Call;
    use crate::backend::RecordingBackend;
    use crate::buffer::BufferUsage;
    use glam::{IVec2, Vec3};

    #[test]
    fn set_buffer_records_typed_layout_with_both_bound() {
        let gl = RecordingBackend::new();
        let ctx = Context::new(gl.clone());
        let vao = VertexArray::new(&ctx).unwrap();
        let positions = Buffer::with_data(&ctx, &[Vec3::ZERO; 3], BufferUsage::StaticDraw).unwrap();

        vao.attribute(0).enable().unwrap().set_buffer(&positions).unwrap();

        assert!(gl.calls().contains(&Call::VertexAttribPointer {
            vertex_array: vao.id(),
            buffer: positions.id(),
            index: 0,
            layout: AttributeLayout {
                components: 3,
                scalar: ScalarKind::Float,
                upload: AttributeUpload::Float,
            },
        }));
        assert_eq!(gl.bound(BindTarget::VertexArray), 0);
        assert_eq!(gl.bound(BindTarget::ArrayBuffer), 0);
    }

    #[test]
    fn outer_vao_binding_is_not_rebound() {
        let gl = RecordingBackend::new();
        let ctx = Context::new(gl.clone());
        let vao = VertexArray::new(&ctx).unwrap();
        let cells = Buffer::with_data(&ctx, &[IVec2::ONE; 2], BufferUsage::StaticDraw).unwrap();
        gl.clear_calls();

        let _outer = vao.bind();
        vao.attribute(2).enable().unwrap();
        vao.attribute(2).set_buffer(&cells).unwrap();

        // Only the outer guard binds; the inner pushes hit the same id
        assert_eq!(gl.binds(BindTarget::VertexArray), vec![vao.id()]);
        assert!(gl.calls().contains(&Call::VertexAttribEnabled {
            vertex_array: vao.id(),
            index: 2,
            enabled: true,
        }));
    }

    #[test]
    fn runtime_layouts_must_match_the_element_size() {
        let gl = RecordingBackend::new();
        let ctx = Context::new(gl.clone());
        let vao = VertexArray::new(&ctx).unwrap();
        // Half-float uvs stored as raw bits
        let uvs = Buffer::with_data(&ctx, &[[0x3C00u16; 2]; 4], BufferUsage::StaticDraw).unwrap();

        let scalar = ScalarKind::from_gl_enum(glow::HALF_FLOAT).unwrap();
        let half2 = AttributeLayout::new(2, scalar).unwrap();
        vao.attribute(1).set_buffer_with_layout(&uvs, half2).unwrap();
        assert!(gl.calls().iter().any(|c| matches!(
            c,
            Call::VertexAttribPointer { index: 1, layout, .. } if *layout == half2
        )));

        let float2 = AttributeLayout::new(2, ScalarKind::Float).unwrap();
        let err = vao.attribute(1).set_buffer_with_layout(&uvs, float2).unwrap_err();
        assert!(matches!(err, GlazyError::UnsupportedType(_)));
    }
}
