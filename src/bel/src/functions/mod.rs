pub mod assert;
pub mod print;

pub use assert::AssertFunction;
pub use print::PrintFunction;

use crate::types::NativeFunction;
use std::rc::Rc;

/// The built-ins every runtime starts with.
pub fn default_functions() -> Vec<Rc<dyn NativeFunction>> {
    vec![
        Rc::new(PrintFunction::new()),
        Rc::new(AssertFunction::new()),
    ]
}
