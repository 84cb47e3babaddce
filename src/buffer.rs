// Buffer objects for vertex data
//
// Uploads go through the array-buffer bind stack, so whatever the caller
// had bound to GL_ARRAY_BUFFER is back in place afterwards. This replaces
// named (DSA) buffer calls, which macOS's GL 4.1 lacks.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use bytemuck::Pod;

use crate::backend::{BindTarget, ResourceKind};
use crate::context::{BindGuard, Context};
use crate::error::{GlazyError, Result};
use crate::handle::{GlHandle, Shared};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    #[default]
    StaticDraw,
    DynamicDraw,
    StreamDraw,
    StaticRead,
    DynamicRead,
    StreamRead,
}

impl BufferUsage {
    pub const fn gl_enum(self) -> u32 {
        match self {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => glow::STREAM_DRAW,
            BufferUsage::StaticRead => glow::STATIC_READ,
            BufferUsage::DynamicRead => glow::DYNAMIC_READ,
            BufferUsage::StreamRead => glow::STREAM_READ,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl MapAccess {
    /// Access bits for glMapBufferRange.
    pub const fn gl_range_bits(self) -> u32 {
        match self {
            MapAccess::ReadOnly => glow::MAP_READ_BIT,
            MapAccess::WriteOnly => glow::MAP_WRITE_BIT,
            MapAccess::ReadWrite => glow::MAP_READ_BIT | glow::MAP_WRITE_BIT,
        }
    }
}

/// A GL buffer holding tightly packed elements of `T`.
pub struct Buffer<T> {
    handle: GlHandle,
    len: usize,
    _marker: PhantomData<T>,
}

pub type SharedBuffer<T> = Shared<Buffer<T>>;

impl<T: Pod> Buffer<T> {
    pub fn new(ctx: &Context) -> Result<Self> {
        Ok(Self {
            handle: GlHandle::new(ctx, ResourceKind::Buffer)?,
            len: 0,
            _marker: PhantomData,
        })
    }

    pub fn with_data(ctx: &Context, data: &[T], usage: BufferUsage) -> Result<Self> {
        let mut buffer = Self::new(ctx)?;
        buffer.set_data(data, usage)?;
        Ok(buffer)
    }

    pub fn id(&self) -> u32 {
        self.handle.id()
    }

    pub fn context(&self) -> &Context {
        self.handle.context()
    }

    /// Number of elements in the last upload.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bind as GL_ARRAY_BUFFER for the guard's lifetime.
    pub fn bind(&self) -> BindGuard<'_> {
        self.bind_as(BindTarget::ArrayBuffer)
    }

    pub fn bind_as(&self, target: BindTarget) -> BindGuard<'_> {
        self.context().bind(target, self.id())
    }

    /// Replace the buffer's storage with `data`.
    pub fn set_data(&mut self, data: &[T], usage: BufferUsage) -> Result<()> {
        let ctx = self.context().clone();
        ctx.checked("Buffer::set_data", || {
            let _bound = ctx.bind(BindTarget::ArrayBuffer, self.id());
            ctx.gl()
                .buffer_data(BindTarget::ArrayBuffer, bytemuck::cast_slice(data), usage);
            Ok(())
        })?;
        self.len = data.len();
        Ok(())
    }

    /// Replace the buffer's storage with a single element.
    pub fn set_value(&mut self, value: &T, usage: BufferUsage) -> Result<()> {
        self.set_data(std::slice::from_ref(value), usage)
    }

    /// Map the whole buffer into host memory. The mapping is released when
    /// the returned guard drops.
    pub fn map(&mut self, access: MapAccess) -> Result<BufferMapping<'_, T>> {
        let id = self.id();
        if self.len == 0 || std::mem::size_of::<T>() == 0 {
            return Err(GlazyError::MapFailed { id });
        }
        let ctx = self.context().clone();
        let len = self.len;
        let bytes = len * std::mem::size_of::<T>();
        GlazyError::gl_int("mapped length", bytes as u64)?;
        let ptr = ctx.checked("Buffer::map", || {
            let _bound = ctx.bind(BindTarget::ArrayBuffer, id);
            Ok(ctx.gl().map_buffer(BindTarget::ArrayBuffer, bytes, access))
        })?;
        if ptr.is_null() {
            return Err(GlazyError::MapFailed { id });
        }
        if ptr.align_offset(std::mem::align_of::<T>()) != 0 {
            let _bound = ctx.bind(BindTarget::ArrayBuffer, id);
            ctx.gl().unmap_buffer(BindTarget::ArrayBuffer);
            return Err(GlazyError::MapFailed { id });
        }
        Ok(BufferMapping {
            buffer: self,
            ptr: ptr as *mut T,
            len,
        })
    }

    /// Delete the GL buffer now instead of at drop.
    pub fn release(&mut self) {
        self.handle.release();
        self.len = 0;
    }
}

impl<T> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("handle", &self.handle)
            .field("len", &self.len)
            .finish()
    }
}

/// Host view of a mapped buffer; indexes like a `[T]`.
pub struct BufferMapping<'a, T: Pod> {
    buffer: &'a Buffer<T>,
    ptr: *mut T,
    len: usize,
}

impl<T: Pod> Deref for BufferMapping<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: map() checked the pointer is non-null and aligned for T and
        // covers len elements; T is Pod so any bytes are a valid T. The
        // mapping stays valid until unmap in drop, and the &mut borrow of the
        // buffer prevents re-specifying its storage meanwhile.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl<T: Pod> DerefMut for BufferMapping<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: see deref
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl<T: Pod> Drop for BufferMapping<'_, T> {
    fn drop(&mut self) {
        let ctx = self.buffer.context();
        let _bound = ctx.bind(BindTarget::ArrayBuffer, self.buffer.id());
        ctx.gl().unmap_buffer(BindTarget::ArrayBuffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::Call;
    use crate::backend::RecordingBackend;
    use glam::Vec3;

    fn setup() -> (RecordingBackend, Context) {
        let gl = RecordingBackend::new();
        let ctx = Context::new(gl.clone());
        (gl, ctx)
    }

    #[test]
    fn upload_restores_callers_binding() {
        let (gl, ctx) = setup();
        let outer = Buffer::<f32>::new(&ctx).unwrap();
        let mut inner = Buffer::<f32>::new(&ctx).unwrap();
        let _bound = outer.bind();
        inner.set_data(&[1.0, 2.0], BufferUsage::StaticDraw).unwrap();
        assert_eq!(gl.bound(BindTarget::ArrayBuffer), outer.id());
        assert_eq!(inner.len(), 2);
        assert_eq!(gl.buffer_contents(inner.id()).len(), 8);
    }

    #[test]
    fn set_value_uploads_one_element() {
        let (gl, ctx) = setup();
        let mut buffer = Buffer::<Vec3>::new(&ctx).unwrap();
        buffer
            .set_value(&Vec3::new(1.0, 2.0, 3.0), BufferUsage::DynamicDraw)
            .unwrap();
        assert_eq!(buffer.len(), 1);
        assert!(gl.calls().contains(&Call::BufferData {
            buffer: buffer.id(),
            bytes: 12,
            usage: BufferUsage::DynamicDraw,
        }));
    }

    #[test]
    fn mapping_reads_and_writes_storage() {
        let (gl, ctx) = setup();
        let mut buffer = Buffer::with_data(&ctx, &[1u32, 2, 3], BufferUsage::DynamicDraw).unwrap();
        {
            let mut mapping = buffer.map(MapAccess::ReadWrite).unwrap();
            assert_eq!(&mapping[..], &[1, 2, 3]);
            mapping[1] = 20;
        }
        let values: Vec<u32> = gl
            .buffer_contents(buffer.id())
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(values, vec![1, 20, 3]);
        assert!(gl.calls().contains(&Call::UnmapBuffer { buffer: buffer.id() }));
        assert_eq!(gl.bound(BindTarget::ArrayBuffer), 0);
    }

    #[test]
    fn mapping_an_empty_buffer_fails() {
        let (_gl, ctx) = setup();
        let mut buffer = Buffer::<f32>::new(&ctx).unwrap();
        assert!(matches!(
            buffer.map(MapAccess::ReadOnly),
            Err(GlazyError::MapFailed { .. })
        ));
    }

    #[test]
    fn shared_buffer_outlives_first_owner() {
        let (gl, ctx) = setup();
        let shared: SharedBuffer<f32> =
            Shared::new(Buffer::with_data(&ctx, &[0.5], BufferUsage::StaticDraw).unwrap());
        let other = shared.clone();
        drop(shared);
        assert_eq!(gl.live(ResourceKind::Buffer), vec![other.id()]);
        assert_eq!(other.len(), 1);
    }
}
