// Bind stack - nested scoped bindings for one bind target
//
// The stack only decides which GL call a push or pop needs; the Context
// issues it. The top always mirrors what the driver has bound.

/// What the driver must do after a push or pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindAction {
    /// The requested id is already bound.
    Keep,
    Bind(u32),
    /// The stack emptied; bind 0.
    Unbind,
}

#[derive(Debug, Default, Clone)]
pub struct BindStack {
    ids: Vec<u32>,
}

impl BindStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `id`, binding it only if it isn't already on top.
    pub fn push(&mut self, id: u32) -> BindAction {
        let action = match self.ids.last() {
            Some(&top) if top == id => BindAction::Keep,
            _ => BindAction::Bind(id),
        };
        self.ids.push(id);
        action
    }

    /// Pop the top and restore the one below it. `None` if the stack is
    /// already empty.
    pub fn pop(&mut self) -> Option<BindAction> {
        let popped = self.ids.pop()?;
        Some(match self.ids.last() {
            Some(&top) if top == popped => BindAction::Keep,
            Some(&top) => BindAction::Bind(top),
            None => BindAction::Unbind,
        })
    }

    pub fn top(&self) -> Option<u32> {
        self.ids.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
