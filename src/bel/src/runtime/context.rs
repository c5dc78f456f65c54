use crate::runtime::{Runtime, RuntimeError, Value};
use crate::types::{Span, Type};
use dashmap::DashMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Non-local exit raised by `break`, `continue` or `return`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Break,
    Continue,
    Return(Value),
}

impl Signal {
    pub fn keyword(&self) -> &'static str {
        match self {
            Signal::Break => "break",
            Signal::Continue => "continue",
            Signal::Return(_) => "return",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub ty: Type,
    pub value: Option<Value>,
    pub mutable: bool,
}

/// One lexical scope. Blocks and loop iterations chain to their parent;
/// function frames are scope boundaries that stop variable lookup and
/// collect the frame's pending signal.
pub struct Context {
    pub parent: Option<Arc<Context>>,
    variables: DashMap<String, Slot>,
    pub is_scope_boundary: bool,
    signal: RefCell<Option<Signal>>,
    depth: usize,
    runtime: Rc<Runtime>,
}

impl Context {
    pub fn with_runtime(runtime: Rc<Runtime>) -> Self {
        Self {
            parent: None,
            variables: DashMap::new(),
            is_scope_boundary: true,
            signal: RefCell::new(None),
            depth: 0,
            runtime,
        }
    }

    pub fn create_child(parent: Arc<Context>, is_scope_boundary: bool) -> Self {
        let depth = if is_scope_boundary {
            parent.depth + 1
        } else {
            parent.depth
        };
        let runtime = parent.runtime.clone();
        Self {
            parent: Some(parent),
            variables: DashMap::new(),
            is_scope_boundary,
            signal: RefCell::new(None),
            depth,
            runtime,
        }
    }

    /// Number of function frames between this scope and the program root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_rc(&self) -> Rc<Runtime> {
        self.runtime.clone()
    }

    pub fn declare(&self, name: String, slot: Slot) {
        self.variables.insert(name, slot);
    }

    pub fn declare_variable(&self, name: String, value: Value) {
        self.declare(
            name,
            Slot {
                ty: value.ty(),
                value: Some(value),
                mutable: true,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<Slot> {
        if let Some(slot) = self.variables.get(name) {
            Some(slot.clone())
        } else if self.is_scope_boundary {
            None
        } else {
            self.parent.as_ref().and_then(|p| p.lookup(name))
        }
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.lookup(name).and_then(|slot| slot.value)
    }

    pub fn read_variable(&self, name: &str, span: Span) -> Result<Value, RuntimeError> {
        let slot = self
            .lookup(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: name.to_string(),
                span,
            })?;
        slot.value.ok_or_else(|| RuntimeError::UninitializedVariable {
            name: name.to_string(),
            span,
        })
    }

    pub fn assign_variable(&self, name: &str, value: Value, span: Span) -> Result<(), RuntimeError> {
        if let Some(mut slot) = self.variables.get_mut(name) {
            if !slot.mutable {
                return Err(RuntimeError::ImmutableAssignment {
                    name: name.to_string(),
                    span,
                });
            }
            if slot.ty != value.ty() {
                return Err(RuntimeError::TypeMismatch {
                    expected: slot.ty.to_string(),
                    found: value.ty(),
                    span,
                });
            }
            slot.value = Some(value);
            Ok(())
        } else if self.is_scope_boundary {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                span,
            })
        } else if let Some(parent) = &self.parent {
            parent.assign_variable(name, value, span)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                span,
            })
        }
    }

    fn frame(&self) -> &Context {
        let mut current = self;
        while !current.is_scope_boundary {
            match current.parent.as_deref() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    pub fn set_signal(&self, signal: Signal) {
        *self.frame().signal.borrow_mut() = Some(signal);
    }

    pub fn signal(&self) -> Option<Signal> {
        *self.frame().signal.borrow()
    }

    pub fn has_signal(&self) -> bool {
        self.frame().signal.borrow().is_some()
    }

    pub fn take_signal(&self) -> Option<Signal> {
        self.frame().signal.borrow_mut().take()
    }
}
