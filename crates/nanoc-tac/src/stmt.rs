//! Statement and block lowering: control-flow templates, loop contexts,
//! and local declarations.

use nanoc_par::ast;

use crate::error::{TacError, TacResult};
use crate::generator::{Generator, LoopContext};
use crate::ir::Instruction;

impl Generator {
    pub(crate) fn lower_block(&mut self, block: &ast::Block) -> TacResult<()> {
        for item in block {
            match item {
                ast::BlockItem::Statement(stmt) => self.lower_stmt(stmt)?,
                ast::BlockItem::Declaration(decl) => self.lower_local_declaration(decl)?,
            }
        }
        Ok(())
    }

    fn lower_local_declaration(&mut self, decl: &ast::Declaration) -> TacResult<()> {
        if decl.is_static {
            return self.declare_static_local(decl.name, decl.ty, &decl.init);
        }
        self.declare_local(decl.name, decl.ty)?;
        if let Some(init) = &decl.init {
            let value = self.lower_expr(init)?;
            let converted = self.convert(value, decl.ty);
            let dest = self.resolve(decl.name)?;
            self.emit(Instruction::Copy {
                src: converted,
                dest,
            });
        }
        Ok(())
    }

    pub(crate) fn lower_stmt(&mut self, stmt: &ast::Stmt) -> TacResult<()> {
        match stmt {
            ast::Stmt::Return(expr) => {
                let value = self.lower_expr(expr)?;
                self.emit(Instruction::Return(value));
                Ok(())
            }

            ast::Stmt::Expression(expr) => {
                self.lower_expr(expr)?;
                Ok(())
            }

            ast::Stmt::Compound(block) => self.lower_block(block),

            ast::Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => self.lower_if(cond, then_branch, else_branch.as_deref()),

            ast::Stmt::While { cond, body } => self.lower_while(cond, body),

            ast::Stmt::DoWhile { body, cond } => self.lower_do_while(body, cond),

            ast::Stmt::For {
                init,
                cond,
                post,
                body,
            } => self.lower_for(init, cond.as_ref(), post.as_ref(), body),

            ast::Stmt::Break => {
                let ctx = self.loop_stack.last().copied().ok_or(TacError::BreakOutsideLoop)?;
                self.emit(Instruction::Jump(ctx.break_label));
                Ok(())
            }

            ast::Stmt::Continue => {
                let ctx = self
                    .loop_stack
                    .last()
                    .copied()
                    .ok_or(TacError::ContinueOutsideLoop)?;
                self.emit(Instruction::Jump(ctx.continue_label));
                Ok(())
            }
        }
    }

    fn lower_if(
        &mut self,
        cond: &ast::Expr,
        then_branch: &ast::Stmt,
        else_branch: Option<&ast::Stmt>,
    ) -> TacResult<()> {
        let cv = self.lower_expr(cond)?;
        match else_branch {
            None => {
                let end_label = self.new_label("if_end");
                self.emit(Instruction::JumpIfZero(cv, end_label));
                self.lower_stmt(then_branch)?;
                self.emit(Instruction::Label(end_label));
            }
            Some(else_branch) => {
                let else_label = self.new_label("if_else");
                let end_label = self.new_label("if_end");
                self.emit(Instruction::JumpIfZero(cv, else_label));
                self.lower_stmt(then_branch)?;
                self.emit(Instruction::Jump(end_label));
                self.emit(Instruction::Label(else_label));
                self.lower_stmt(else_branch)?;
                self.emit(Instruction::Label(end_label));
            }
        }
        Ok(())
    }

    fn lower_while(&mut self, cond: &ast::Expr, body: &ast::Stmt) -> TacResult<()> {
        let continue_label = self.new_label("while_cont");
        let break_label = self.new_label("while_brk");

        self.emit(Instruction::Label(continue_label));
        let cv = self.lower_expr(cond)?;
        self.emit(Instruction::JumpIfZero(cv, break_label));

        self.loop_stack.push(LoopContext {
            continue_label,
            break_label,
        });
        self.lower_stmt(body)?;
        self.loop_stack.pop();

        self.emit(Instruction::Jump(continue_label));
        self.emit(Instruction::Label(break_label));
        Ok(())
    }

    fn lower_do_while(&mut self, body: &ast::Stmt, cond: &ast::Expr) -> TacResult<()> {
        let start_label = self.new_label("do_start");
        let continue_label = self.new_label("do_cont");
        let break_label = self.new_label("do_brk");

        self.emit(Instruction::Label(start_label));

        self.loop_stack.push(LoopContext {
            continue_label,
            break_label,
        });
        self.lower_stmt(body)?;
        self.loop_stack.pop();

        self.emit(Instruction::Label(continue_label));
        let cv = self.lower_expr(cond)?;
        self.emit(Instruction::JumpIfNotZero(cv, start_label));
        self.emit(Instruction::Label(break_label));
        Ok(())
    }

    fn lower_for(
        &mut self,
        init: &ast::ForInit,
        cond: Option<&ast::Expr>,
        post: Option<&ast::Expr>,
        body: &ast::Stmt,
    ) -> TacResult<()> {
        match init {
            ast::ForInit::Declaration(decl) => self.lower_local_declaration(decl)?,
            ast::ForInit::Expression(Some(expr)) => {
                self.lower_expr(expr)?;
            }
            ast::ForInit::Expression(None) => {}
        }

        let start_label = self.new_label("for_start");
        let continue_label = self.new_label("for_cont");
        let break_label = self.new_label("for_brk");

        self.emit(Instruction::Label(start_label));
        if let Some(cond) = cond {
            let cv = self.lower_expr(cond)?;
            self.emit(Instruction::JumpIfZero(cv, break_label));
        }

        self.loop_stack.push(LoopContext {
            continue_label,
            break_label,
        });
        self.lower_stmt(body)?;
        self.loop_stack.pop();

        self.emit(Instruction::Label(continue_label));
        if let Some(post) = post {
            self.lower_expr(post)?;
        }
        self.emit(Instruction::Jump(start_label));
        self.emit(Instruction::Label(break_label));
        Ok(())
    }
}
