mod context;
mod engine;
mod error;
mod value;

#[cfg(test)]
mod control_flow_test;

#[cfg(test)]
mod engine_test;


#[cfg(test)]
mod scoping_test;

pub use context::{Context, Signal, Slot};
pub use engine::{CheckedProgram, DEFAULT_MAX_CALL_DEPTH, Output, Runtime, RuntimeBuilder};
pub use error::{ProgramError, RuntimeError};
pub use value::{Value, apply_binary, apply_cast, apply_unary};
