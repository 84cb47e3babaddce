// Resource handles - one owned GPU object id each
//
// A GlHandle allocates on construction and deletes on drop. It is not
// Clone, so two owners can never delete the same id; moving it moves the
// ownership. Shared<R> is the reference-counted escape hatch for resources
// with several logical owners.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::backend::{ResourceKind, ShaderStage};
use crate::context::Context;
use crate::error::{GlazyError, Result};

pub struct GlHandle {
    ctx: Context,
    id: u32,
    kind: ResourceKind,
}

impl GlHandle {
    /// Allocate a fresh object of `kind`. Shaders go through
    /// [`GlHandle::new_shader`] because they need a stage.
    pub fn new(ctx: &Context, kind: ResourceKind) -> Result<Self> {
        let id = ctx.gl().create_object(kind);
        Self::from_allocation(ctx, kind, id)
    }

    pub fn new_shader(ctx: &Context, stage: ShaderStage) -> Result<Self> {
        let id = ctx.gl().create_shader(stage);
        Self::from_allocation(ctx, ResourceKind::Shader, id)
    }

    fn from_allocation(
        ctx: &Context,
        kind: ResourceKind,
        id: std::result::Result<u32, String>,
    ) -> Result<Self> {
        let id = match id {
            Ok(0) => {
                return Err(GlazyError::Allocation {
                    kind,
                    message: "driver returned id 0".to_string(),
                })
            }
            Ok(id) => id,
            Err(message) => return Err(GlazyError::Allocation { kind, message }),
        };
        log::debug!("Created {} {}", kind, id);
        Ok(Self {
            ctx: ctx.clone(),
            id,
            kind,
        })
    }

    /// The GL name, or 0 once released.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn is_released(&self) -> bool {
        self.id == 0
    }

    /// Delete the object now. Later calls, and the eventual drop, do nothing.
    pub fn release(&mut self) {
        if self.id == 0 {
            return;
        }
        log::debug!("Deleting {} {}", self.kind, self.id);
        self.ctx.gl().delete_object(self.kind, self.id);
        self.id = 0;
    }
}

impl Drop for GlHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for GlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlHandle({} {})", self.kind, self.id)
    }
}

/// Reference-counted owner of a resource; the GPU object is deleted when
/// the last clone drops.
pub struct Shared<R> {
    inner: Rc<R>,
}

impl<R> Shared<R> {
    pub fn new(resource: R) -> Self {
        Self {
            inner: Rc::new(resource),
        }
    }

    /// Number of live owners.
    pub fn owners(this: &Self) -> usize {
        Rc::strong_count(&this.inner)
    }

    /// Take the resource back if this is the only owner.
    pub fn try_unwrap(this: Self) -> std::result::Result<R, Self> {
        Rc::try_unwrap(this.inner).map_err(|inner| Self { inner })
    }
}

impl<R> Clone for Shared<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R> Deref for Shared<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.inner
    }
}

impl<R> AsRef<R> for Shared<R> {
    fn as_ref(&self) -> &R {
        &self.inner
    }
}

impl<R> From<R> for Shared<R> {
    fn from(resource: R) -> Self {
        Self::new(resource)
    }
}

impl<R: fmt::Debug> fmt::Debug for Shared<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&*self.inner).finish()
    }
}
