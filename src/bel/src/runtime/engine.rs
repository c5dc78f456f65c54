use crate::ast::Module;
use crate::cli::Config;
use crate::compiler::{CompilationUnit, Compiler};
use crate::expressions::{CallExpr, FunctionExpr, run_statements};
use crate::functions;
use crate::runtime::{Context, ProgramError, RuntimeError, Signal, Value};
use crate::typecheck::{TypeChecker, TypeInfo};
use crate::types::{Expression, NativeFunction, Type};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

pub type Output = Rc<RefCell<dyn Write>>;

/// A parsed and type checked program, ready to lint or execute.
#[derive(Debug, Clone)]
pub struct CheckedProgram {
    pub module: Module,
    pub types: TypeInfo,
}

pub struct Runtime {
    function_registry: HashMap<String, Rc<FunctionExpr>>,
    native_functions: HashMap<String, Rc<dyn NativeFunction>>,
    compiler: Compiler,
    output: Output,
    max_call_depth: usize,
    max_steps: Option<u64>,
    steps: Cell<u64>,
}

pub struct RuntimeBuilder {
    native_functions: Vec<Rc<dyn NativeFunction>>,
    with_default_functions: bool,
    output: Option<Output>,
    max_call_depth: usize,
    max_steps: Option<u64>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            native_functions: Vec::new(),
            with_default_functions: true,
            output: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_steps: None,
        }
    }

    pub fn from_config(mut self, config: &Config) -> Self {
        self.max_call_depth = config.max_call_depth;
        self.max_steps = config.max_steps;
        self
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn max_steps(mut self, steps: Option<u64>) -> Self {
        self.max_steps = steps;
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_native_function(mut self, function: Rc<dyn NativeFunction>) -> Self {
        self.native_functions.push(function);
        self
    }

    pub fn without_default_functions(mut self) -> Self {
        self.with_default_functions = false;
        self
    }

    pub fn build(self) -> Runtime {
        let mut native_functions: HashMap<String, Rc<dyn NativeFunction>> = HashMap::new();
        if self.with_default_functions {
            for function in functions::default_functions() {
                native_functions.insert(function.name().to_string(), function);
            }
        }
        for function in self.native_functions {
            native_functions.insert(function.name().to_string(), function);
        }

        let output = self
            .output
            .unwrap_or_else(|| Rc::new(RefCell::new(std::io::stdout())));

        Runtime {
            function_registry: HashMap::new(),
            native_functions,
            compiler: Compiler::new(),
            output,
            max_call_depth: self.max_call_depth,
            max_steps: self.max_steps,
            steps: Cell::new(0),
        }
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn register_function(&mut self, function: FunctionExpr) {
        self.function_registry
            .insert(function.name.clone(), Rc::new(function));
    }

    pub fn get_function(&self, name: &str) -> Option<Rc<FunctionExpr>> {
        self.function_registry.get(name).cloned()
    }

    pub fn get_native_function(&self, name: &str) -> Option<Rc<dyn NativeFunction>> {
        self.native_functions.get(name).cloned()
    }

    pub fn list_functions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .function_registry
            .keys()
            .chain(self.native_functions.keys())
            .map(|s| s.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Counts one unit of work against the configured step budget.
    pub fn tick(&self) -> Result<(), RuntimeError> {
        let steps = self.steps.get() + 1;
        self.steps.set(steps);
        match self.max_steps {
            Some(limit) if steps > limit => Err(RuntimeError::StepLimitExceeded { limit }),
            _ => Ok(()),
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps.get()
    }

    /// Parses and type checks `program` without running it.
    pub fn check(&self, program: &CompilationUnit) -> Result<CheckedProgram, ProgramError> {
        let module = self.compiler.parse(program)?;
        let types = TypeChecker::new()
            .with_native_functions(self.native_functions.values().cloned())
            .check_module(&module)?;
        Ok(CheckedProgram { module, types })
    }

    pub async fn run(&self, program: &CompilationUnit) -> Result<Value, ProgramError> {
        let checked = self.check(program)?;
        self.execute(&checked).await
    }

    /// Runs the top-level statements in order, then `main` when it is
    /// defined and the top level never calls it.
    pub async fn execute(&self, checked: &CheckedProgram) -> Result<Value, ProgramError> {
        let compiled = self.compiler.lower(&checked.module, &checked.types)?;

        let mut runtime = self.clone();
        for function in compiled.functions {
            runtime.register_function(function);
        }
        let runtime = Rc::new(runtime);

        info!(
            functions = runtime.function_registry.len(),
            statements = compiled.statements.len(),
            "program_start"
        );

        let context = Arc::new(Context::with_runtime(runtime.clone()));
        run_statements(&compiled.statements, &context).await?;

        if let Some(signal) = context.take_signal() {
            if !matches!(signal, Signal::Return(_)) {
                return Err(RuntimeError::MisplacedControlFlow {
                    keyword: signal.keyword(),
                }
                .into());
            }
        }

        let result = match compiled.entry_point {
            Some(span) => {
                debug!("calling main");
                let call = CallExpr {
                    function: "main".to_string(),
                    arguments: vec![],
                    ty: runtime
                        .get_function("main")
                        .map_or(Type::Unit, |main| main.return_type),
                    span,
                };
                call.evaluate(context.clone()).await?
            }
            None => Value::Unit,
        };

        info!(steps = runtime.steps(), "program_finished");
        Ok(result)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Runtime {
    fn clone(&self) -> Self {
        Self {
            function_registry: self.function_registry.clone(),
            native_functions: self.native_functions.clone(),
            compiler: self.compiler.clone(),
            output: self.output.clone(),
            max_call_depth: self.max_call_depth,
            max_steps: self.max_steps,
            steps: Cell::new(0),
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("functions", &self.list_functions())
            .field("max_call_depth", &self.max_call_depth)
            .field("max_steps", &self.max_steps)
            .finish()
    }
}
