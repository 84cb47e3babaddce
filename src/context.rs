// Context - the explicit home of all per-GL-context state
//
// Owns the backend, one bind stack per bind target, and the debug flag that
// turns on glGetError checks around every wrapped operation. Cloning is an
// Rc clone; handles keep one so they can release themselves on drop. The
// Rc also makes the type !Send, so a context can't leak onto another thread.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::backend::{BindTarget, GlBackend, Primitive};
use crate::bind_stack::{BindAction, BindStack};
use crate::error::{GlazyError, Result};

struct ContextInner {
    gl: Box<dyn GlBackend>,
    stacks: RefCell<HashMap<BindTarget, BindStack>>,
    debug: Cell<bool>,
    // Texture unit last selected with glActiveTexture, if any.
    active_unit: Cell<Option<u32>>,
}

#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("debug", &self.inner.debug.get())
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(gl: impl GlBackend + 'static) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                gl: Box::new(gl),
                stacks: RefCell::new(HashMap::new()),
                debug: Cell::new(false),
                active_unit: Cell::new(None),
            }),
        }
    }

    /// Direct access to the backend, for calls the handles don't wrap.
    pub fn gl(&self) -> &dyn GlBackend {
        self.inner.gl.as_ref()
    }

    /// Enable glGetError checks before and after every wrapped operation.
    pub fn set_debug(&self, enabled: bool) {
        self.inner.debug.set(enabled);
    }

    pub fn is_debug(&self) -> bool {
        self.inner.debug.get()
    }

    pub fn same_context(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // BIND STACKS
    // =========================================================================

    /// Bind `id` to `target` for as long as the returned guard lives.
    pub fn bind(&self, target: BindTarget, id: u32) -> BindGuard<'_> {
        self.push_binding(target, id);
        BindGuard {
            ctx: self,
            target,
            id,
        }
    }

    /// Push `id` on the stack for `target`. Prefer [`Context::bind`].
    pub fn push_binding(&self, target: BindTarget, id: u32) {
        let action = self
            .inner
            .stacks
            .borrow_mut()
            .entry(target)
            .or_default()
            .push(id);
        self.apply(target, action);
    }

    /// Pop the stack for `target`, restoring the previous binding.
    pub fn pop_binding(&self, target: BindTarget) -> Result<()> {
        let action = self
            .inner
            .stacks
            .borrow_mut()
            .get_mut(&target)
            .and_then(BindStack::pop);
        match action {
            Some(action) => {
                self.apply(target, action);
                Ok(())
            }
            None => Err(GlazyError::BindStackUnderflow(target.to_string())),
        }
    }

    /// The id on top of the stack for `target`, if anything is pushed.
    pub fn bound(&self, target: BindTarget) -> Option<u32> {
        self.inner
            .stacks
            .borrow()
            .get(&target)
            .and_then(BindStack::top)
    }

    pub fn binding_depth(&self, target: BindTarget) -> usize {
        self.inner
            .stacks
            .borrow()
            .get(&target)
            .map_or(0, BindStack::depth)
    }

    fn apply(&self, target: BindTarget, action: BindAction) {
        // A kept texture binding still leaves its unit active.
        if let BindTarget::Texture2D { unit } = target {
            if action != BindAction::Keep || self.inner.active_unit.get() != Some(unit) {
                self.gl().active_texture(unit);
                self.inner.active_unit.set(Some(unit));
            }
        }
        let id = match action {
            BindAction::Keep => return,
            BindAction::Bind(id) => id,
            BindAction::Unbind => 0,
        };
        self.gl().bind(target, id);
    }

    // =========================================================================
    // ERROR CHECKING
    // =========================================================================

    /// Drain the GL error queue, reporting the first error against
    /// `operation`. A no-op unless debug checks are on.
    pub fn check_errors(&self, operation: &str) -> Result<()> {
        if !self.is_debug() {
            return Ok(());
        }
        let mut first = None;
        loop {
            let code = self.gl().get_error();
            if code == glow::NO_ERROR {
                break;
            }
            if first.is_some() {
                log::debug!("Additional GL error 0x{:04X} during {}", code, operation);
            } else {
                first = Some(code);
            }
        }
        match first {
            Some(code) => Err(GlazyError::Gl {
                code,
                operation: operation.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Run `f` between an entry and an exit error check, so an error left
    /// behind by earlier code isn't blamed on `operation`.
    pub fn checked<T>(
        &self,
        operation: impl fmt::Display,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        if !self.is_debug() {
            return f();
        }
        self.check_errors(&format!("before {}", operation))?;
        let value = f()?;
        self.check_errors(&operation.to_string())?;
        Ok(value)
    }

    // =========================================================================
    // FRAME STATE
    // =========================================================================

    pub fn viewport(&self, width: u32, height: u32) -> Result<()> {
        let width = GlazyError::gl_int("viewport width", u64::from(width))?;
        let height = GlazyError::gl_int("viewport height", u64::from(height))?;
        self.gl().viewport(0, 0, width, height);
        Ok(())
    }

    pub fn clear(&self, color: [f32; 4]) {
        self.gl().clear(color);
    }

    pub fn set_depth_test(&self, enabled: bool) {
        self.gl().set_depth_test(enabled);
    }

    /// Draw with whatever vertex array and program are currently bound.
    pub fn draw_arrays(&self, mode: Primitive, first: usize, count: usize) -> Result<()> {
        let first = GlazyError::gl_int("draw_arrays first", first as u64)?;
        let count = GlazyError::gl_int("draw_arrays count", count as u64)?;
        self.checked("draw_arrays", || {
            self.gl().draw_arrays(mode, first, count);
            Ok(())
        })
    }

    pub fn flush(&self) {
        self.gl().flush();
    }
}

/// Scoped binding; pops its bind stack on drop.
#[must_use = "the binding is released as soon as the guard is dropped"]
pub struct BindGuard<'a> {
    ctx: &'a Context,
    target: BindTarget,
    id: u32,
}

impl BindGuard<'_> {
    pub fn target(&self) -> BindTarget {
        self.target
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for BindGuard<'_> {
    fn drop(&mut self) {
        if self.ctx.bound(self.target) != Some(self.id) {
            log::warn!(
                "Bind guard for {} {} released out of order",
                self.target,
                self.id
            );
        }
        if let Err(e) = self.ctx.pop_binding(self.target) {
            log::error!("{}", e);
        }
    }
}
