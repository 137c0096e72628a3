//! `Generator` — the TAC generator's state, carried by mutable reference
//! across a recursive lowering walk over the AST. Name resolution, loop
//! contexts, and constant folding live in `expr.rs`/`stmt.rs`/`const_eval.rs`
//! as further `impl Generator` blocks; this file owns the state and the
//! top-level per-function/per-global orchestration.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use nanoc_par::ast;
use nanoc_util::Symbol;

use crate::error::{TacError, TacResult};
use crate::ir::{truncate_to_type, Function, Global, Instruction, Program, Type, Value};

#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopContext {
    pub continue_label: Symbol,
    pub break_label: Symbol,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FunctionSig {
    pub param_count: usize,
    pub ret_type: Type,
}

pub struct Generator {
    label_counter: u32,
    temp_counter: u32,
    static_counter: u32,

    pub(crate) loop_stack: Vec<LoopContext>,
    functions: FxHashMap<Symbol, FunctionSig>,
    globals: FxHashMap<Symbol, Type>,

    /// Source name -> (resolved TAC/global name, type), for every name
    /// declared so far in the function currently being lowered. Ordinary
    /// locals resolve to themselves; static locals resolve to a synthetic
    /// global name. Reset at the start of each function.
    pub(crate) locals: FxHashMap<Symbol, (Symbol, Type)>,

    current_var_types: IndexMap<Symbol, Type>,
    current_instructions: Vec<Instruction>,

    collected_globals: Vec<Global>,
    collected_functions: Vec<Function>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Self {
            label_counter: 0,
            temp_counter: 0,
            static_counter: 0,
            loop_stack: Vec::new(),
            functions: FxHashMap::default(),
            globals: FxHashMap::default(),
            locals: FxHashMap::default(),
            current_var_types: IndexMap::new(),
            current_instructions: Vec::new(),
            collected_globals: Vec::new(),
            collected_functions: Vec::new(),
        }
    }

    pub fn generate(mut self, program: &ast::Program) -> TacResult<Program> {
        for item in program {
            match item {
                ast::Item::Function(f) => self.lower_function(f)?,
                ast::Item::Declaration(d) => self.lower_file_scope_declaration(d)?,
            }
        }
        Ok(Program {
            globals: self.collected_globals,
            functions: self.collected_functions,
        })
    }

    fn lower_file_scope_declaration(&mut self, decl: &ast::Declaration) -> TacResult<()> {
        if self.globals.contains_key(&decl.name) {
            return Err(TacError::VariableRedefinition { name: decl.name });
        }
        let init = match &decl.init {
            Some(expr) => Some(truncate_to_type(self.const_eval(expr, decl.name)?, decl.ty)),
            None => None,
        };
        self.globals.insert(decl.name, decl.ty);
        self.collected_globals.push(Global {
            name: decl.name,
            ty: decl.ty,
            init,
            is_static: decl.is_static,
        });
        Ok(())
    }

    fn lower_function(&mut self, f: &ast::Function) -> TacResult<()> {
        if self.functions.contains_key(&f.name) {
            return Err(TacError::FunctionRedefinition { name: f.name });
        }
        self.functions.insert(
            f.name,
            FunctionSig {
                param_count: f.params.len(),
                ret_type: f.ret_type,
            },
        );

        self.loop_stack.clear();
        self.locals.clear();
        self.current_var_types = IndexMap::new();
        self.current_instructions = Vec::new();

        let mut params = Vec::with_capacity(f.params.len());
        for param in &f.params {
            self.declare_local(param.name, param.ty)?;
            params.push(param.name);
        }

        self.lower_block(&f.body)?;

        // Every function body ends in `return`, defensively, regardless of
        // whether control flow already guarantees one.
        self.emit(Instruction::Return(Value::Constant(0, Type::Int)));

        self.collected_functions.push(Function {
            name: f.name,
            params,
            var_types: std::mem::take(&mut self.current_var_types),
            instructions: std::mem::take(&mut self.current_instructions),
            is_static: f.is_static,
        });
        Ok(())
    }

    /// Declare an ordinary (non-static) local or parameter. Registers it in
    /// both the name-resolution map and the function's var-type table.
    pub(crate) fn declare_local(&mut self, name: Symbol, ty: Type) -> TacResult<()> {
        if self.locals.contains_key(&name) {
            return Err(TacError::VariableRedefinition { name });
        }
        self.locals.insert(name, (name, ty));
        self.current_var_types.insert(name, ty);
        Ok(())
    }

    /// Declare a `static` local: its storage is a synthesized global, not a
    /// stack slot, so it is folded as a constant initializer and never
    /// enters the function's var-type table.
    pub(crate) fn declare_static_local(
        &mut self,
        name: Symbol,
        ty: Type,
        init: &Option<ast::Expr>,
    ) -> TacResult<()> {
        if self.locals.contains_key(&name) {
            return Err(TacError::VariableRedefinition { name });
        }
        let synthetic = Symbol::intern(&format!("{}.static.{}", name, self.static_counter));
        self.static_counter += 1;

        let folded = match init {
            Some(expr) => Some(truncate_to_type(self.const_eval(expr, name)?, ty)),
            None => None,
        };

        self.locals.insert(name, (synthetic, ty));
        self.collected_globals.push(Global {
            name: synthetic,
            ty,
            init: folded,
            is_static: true,
        });
        Ok(())
    }

    pub(crate) fn resolve(&self, name: Symbol) -> TacResult<Value> {
        if let Some(&(resolved, ty)) = self.locals.get(&name) {
            return Ok(Value::Var(resolved, ty));
        }
        if let Some(&ty) = self.globals.get(&name) {
            return Ok(Value::Var(name, ty));
        }
        Err(TacError::UndeclaredVariable { name })
    }

    pub(crate) fn function_sig(&self, name: Symbol) -> TacResult<FunctionSig> {
        self.functions
            .get(&name)
            .copied()
            .ok_or(TacError::UndeclaredFunction { name })
    }

    pub(crate) fn new_temp(&mut self, ty: Type) -> Value {
        let sym = Symbol::intern(&format!("tmp.{}", self.temp_counter));
        self.temp_counter += 1;
        self.current_var_types.insert(sym, ty);
        Value::Var(sym, ty)
    }

    pub(crate) fn new_label(&mut self, suffix: &str) -> Symbol {
        let sym = Symbol::intern(&format!("L.{}_{}", self.label_counter, suffix));
        self.label_counter += 1;
        sym
    }

    pub(crate) fn emit(&mut self, instr: Instruction) {
        self.current_instructions.push(instr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir;

    fn generate(src: &str) -> TacResult<Program> {
        let tokens = nanoc_lex::Lexer::tokenize(src).expect("lex should succeed");
        let program = nanoc_par::parse(tokens).expect("parse should succeed");
        Generator::new().generate(&program)
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        let err = generate("int main(void) { break; return 0; }").unwrap_err();
        assert_eq!(err, TacError::BreakOutsideLoop);
    }

    #[test]
    fn continue_outside_loop_is_rejected() {
        let err = generate("int main(void) { continue; return 0; }").unwrap_err();
        assert_eq!(err, TacError::ContinueOutsideLoop);
    }

    #[test]
    fn undeclared_variable_is_rejected() {
        let err = generate("int main(void) { return x; }").unwrap_err();
        assert!(matches!(err, TacError::UndeclaredVariable { .. }));
    }

    #[test]
    fn undeclared_function_is_rejected() {
        let err = generate("int main(void) { return foo(); }").unwrap_err();
        assert!(matches!(err, TacError::UndeclaredFunction { .. }));
    }

    #[test]
    fn calling_with_wrong_arity_is_rejected() {
        let src = "int foo(int a) { return a; } int main(void) { return foo(1, 2); }";
        let err = generate(src).unwrap_err();
        assert!(matches!(err, TacError::WrongArgumentCount { expected: 1, found: 2, .. }));
    }

    #[test]
    fn redeclaring_a_local_is_rejected() {
        let src = "int main(void) { int a = 1; int a = 2; return a; }";
        let err = generate(src).unwrap_err();
        assert!(matches!(err, TacError::VariableRedefinition { .. }));
    }

    #[test]
    fn redefining_a_function_is_rejected() {
        let src = "int foo(void) { return 0; } int foo(void) { return 1; }";
        let err = generate(src).unwrap_err();
        assert!(matches!(err, TacError::FunctionRedefinition { .. }));
    }

    #[test]
    fn every_function_ends_in_a_defensive_return() {
        let program = generate("int main(void) { return 1; }").unwrap();
        let last = program.functions[0].instructions.last().unwrap();
        assert!(matches!(last, ir::Instruction::Return(_)));
    }

    #[test]
    fn mixed_width_binary_op_promotes_to_the_common_type() {
        let program = generate("int main(void) { long x = 1; int y = 2; return x + y; }").unwrap();
        let has_widening_copy = program.functions[0].instructions.iter().any(|instr| {
            matches!(instr, ir::Instruction::Copy { src, dest }
                if src.ty() == ir::Type::Int && dest.ty() == ir::Type::Long)
        });
        assert!(has_widening_copy, "expected int operand to be widened to long");
    }

    #[test]
    fn static_local_becomes_a_global_not_a_stack_slot() {
        let src = "int foo(void) { static int x = 5; x = x + 1; return x; }";
        let program = generate(src).unwrap();
        assert_eq!(program.globals.len(), 1);
        assert!(program.globals[0].is_static);
        assert_eq!(program.globals[0].init, Some(5));
        assert!(!program.functions[0].var_types.contains_key(&Symbol::intern("x")));
    }

    #[test]
    fn file_scope_initializer_is_constant_folded() {
        let program = generate("int x = 2 + 3 * 4;").unwrap();
        assert_eq!(program.globals[0].init, Some(14));
    }

    #[test]
    fn non_constant_file_scope_initializer_is_rejected() {
        let err = generate("int x = 1; int y = x;").unwrap_err();
        assert!(matches!(err, TacError::NonConstantInitializer { .. }));
    }
}
