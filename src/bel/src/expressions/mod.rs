pub mod assignment;
pub mod binary;
pub mod block;
pub mod call;
pub mod cast;
pub mod declaration;
pub mod for_stmt;
pub mod function;
pub mod if_stmt;
pub mod literal;
pub mod loop_control;
pub mod return_stmt;
pub mod unary;
pub mod variable;
pub mod while_stmt;

pub use assignment::AssignmentExpr;
pub use binary::BinaryExpr;
pub use block::{BlockExpr, run_statements};
pub use call::CallExpr;
pub use cast::CastExpr;
pub use declaration::LetExpr;
pub use for_stmt::ForExpr;
pub use function::FunctionExpr;
pub use if_stmt::IfExpr;
pub use literal::LiteralExpr;
pub use loop_control::{BreakExpr, ContinueExpr};
pub use return_stmt::ReturnExpr;
pub use unary::UnaryExpr;
pub use variable::VariableExpr;
pub use while_stmt::WhileExpr;

pub use crate::types::Expression;
