pub mod analysis;
pub mod ast;
pub mod cli;
pub mod compiler;
pub mod diagnostics;
pub mod expressions;
pub mod functions;
pub mod runtime;
pub mod typecheck;
pub mod types;
