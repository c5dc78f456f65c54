//! Functions and modules by qualified name, with path resolution.
//!
//! A module path is the list of module names from the file root, so the
//! root itself is `[]`. An item declared in module `m` is visible from `m`
//! and every module nested inside it; `pub` makes it visible everywhere.

use crate::ast::{CallPath, PathAnchor, qualified_name};
use crate::typecheck::TypeError;
use crate::types::Span;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Entry<T> {
    public: bool,
    module: Vec<String>,
    value: T,
}

#[derive(Debug, Clone)]
pub(crate) struct ItemTable<T> {
    functions: HashMap<String, Entry<T>>,
    modules: HashMap<String, Entry<()>>,
}

impl<T> Default for ItemTable<T> {
    fn default() -> Self {
        Self {
            functions: HashMap::new(),
            modules: HashMap::new(),
        }
    }
}

fn visible(public: bool, declared_in: &[String], from: &[String]) -> bool {
    public || from.starts_with(declared_in)
}

impl<T> ItemTable<T> {
    pub(crate) fn has_function(&self, module: &[String], name: &str) -> bool {
        self.functions.contains_key(&qualified_name(module, name))
    }

    /// Returns false when `module` already declares a function `name`.
    pub(crate) fn declare_function(&mut self, module: &[String], name: &str, public: bool, value: T) -> bool {
        let key = qualified_name(module, name);
        if self.functions.contains_key(&key) {
            return false;
        }
        self.functions.insert(
            key,
            Entry {
                public,
                module: module.to_vec(),
                value,
            },
        );
        true
    }

    /// Returns false when `parent` already declares a module `name`.
    pub(crate) fn declare_module(&mut self, parent: &[String], name: &str, public: bool) -> bool {
        let key = qualified_name(parent, name);
        if self.modules.contains_key(&key) {
            return false;
        }
        self.modules.insert(
            key,
            Entry {
                public,
                module: parent.to_vec(),
                value: (),
            },
        );
        true
    }

    /// Resolves `path` as written inside module `from` to the qualified
    /// name of a function and its entry.
    pub(crate) fn resolve(&self, from: &[String], path: &CallPath, span: Span) -> Result<(String, &T), TypeError> {
        let mut base = match path.anchor {
            PathAnchor::Local => from.to_vec(),
            PathAnchor::Crate => Vec::new(),
            PathAnchor::Super(count) if count <= from.len() => from[..from.len() - count].to_vec(),
            PathAnchor::Super(_) => {
                return Err(TypeError::PathBeyondRoot {
                    path: path.to_string(),
                    span,
                });
            }
        };

        for module in path.modules() {
            let key = qualified_name(&base, module);
            let Some(entry) = self.modules.get(&key) else {
                return Err(TypeError::UnknownModule { name: key, span });
            };
            if !visible(entry.public, &entry.module, from) {
                return Err(TypeError::PrivateItem {
                    kind: "module",
                    name: key,
                    span,
                });
            }
            base.push(module.clone());
        }

        let key = qualified_name(&base, path.name());
        let Some(entry) = self.functions.get(&key) else {
            return Err(TypeError::UnknownFunction {
                name: path.to_string(),
                span,
            });
        };
        if !visible(entry.public, &entry.module, from) {
            return Err(TypeError::PrivateItem {
                kind: "function",
                name: key,
                span,
            });
        }
        Ok((key, &entry.value))
    }
}
