//! Expression lowering: AST expressions to TAC values, including the usual
//! arithmetic conversions, short-circuit boolean operators, and the
//! ternary/assignment control-flow templates.

use nanoc_par::ast::{self, BinaryOp as AstBinaryOp, UnaryOp as AstUnaryOp};

use crate::error::{TacError, TacResult};
use crate::generator::Generator;
use crate::ir::{BinaryOp, Instruction, Type, UnaryOp, Value};

/// `ulong > long > uint > int` — the common type of a binary operation.
fn common_type(a: Type, b: Type) -> Type {
    if a.rank() >= b.rank() {
        a
    } else {
        b
    }
}

fn literal_type(value: i64) -> Type {
    if value >= i32::MIN as i64 && value <= i32::MAX as i64 {
        Type::Int
    } else {
        Type::Long
    }
}

fn is_comparison(op: AstBinaryOp) -> bool {
    matches!(
        op,
        AstBinaryOp::Equal
            | AstBinaryOp::NotEqual
            | AstBinaryOp::LessThan
            | AstBinaryOp::LessThanOrEqual
            | AstBinaryOp::GreaterThan
            | AstBinaryOp::GreaterThanOrEqual
    )
}

fn to_tac_binary_op(op: AstBinaryOp, signed: bool) -> BinaryOp {
    match op {
        AstBinaryOp::Add => BinaryOp::Add,
        AstBinaryOp::Subtract => BinaryOp::Subtract,
        AstBinaryOp::Multiply => BinaryOp::Multiply,
        AstBinaryOp::Divide => {
            if signed {
                BinaryOp::Divide
            } else {
                BinaryOp::DivideU
            }
        }
        AstBinaryOp::Remainder => {
            if signed {
                BinaryOp::Remainder
            } else {
                BinaryOp::RemainderU
            }
        }
        AstBinaryOp::BitwiseAnd => BinaryOp::BitwiseAnd,
        AstBinaryOp::BitwiseOr => BinaryOp::BitwiseOr,
        AstBinaryOp::BitwiseXor => BinaryOp::BitwiseXor,
        AstBinaryOp::Equal => BinaryOp::Equal,
        AstBinaryOp::NotEqual => BinaryOp::NotEqual,
        AstBinaryOp::LessThan => {
            if signed {
                BinaryOp::LessThan
            } else {
                BinaryOp::LessThanU
            }
        }
        AstBinaryOp::LessThanOrEqual => {
            if signed {
                BinaryOp::LessThanOrEqual
            } else {
                BinaryOp::LessThanOrEqualU
            }
        }
        AstBinaryOp::GreaterThan => {
            if signed {
                BinaryOp::GreaterThan
            } else {
                BinaryOp::GreaterThanU
            }
        }
        AstBinaryOp::GreaterThanOrEqual => {
            if signed {
                BinaryOp::GreaterThanOrEqual
            } else {
                BinaryOp::GreaterThanOrEqualU
            }
        }
        AstBinaryOp::ShiftLeft | AstBinaryOp::ShiftRight | AstBinaryOp::LogicalAnd | AstBinaryOp::LogicalOr => {
            unreachable!("shifts and logical connectives are lowered separately")
        }
    }
}

impl Generator {
    /// Static type of an expression, computed without emitting any
    /// instructions. Needed ahead of lowering a ternary's branches, since
    /// only one branch actually executes but both must agree on one result
    /// temporary's type.
    fn expr_type(&self, expr: &ast::Expr) -> TacResult<Type> {
        match expr {
            ast::Expr::Constant(v) => Ok(literal_type(*v)),
            ast::Expr::Variable(name) => Ok(self.resolve(*name)?.ty()),
            ast::Expr::Unary(AstUnaryOp::LogicalNot, _) => Ok(Type::Int),
            ast::Expr::Unary(_, inner) => self.expr_type(inner),
            ast::Expr::Binary(op, lhs, rhs) => {
                if matches!(op, AstBinaryOp::ShiftLeft | AstBinaryOp::ShiftRight) {
                    self.expr_type(lhs)
                } else if is_comparison(*op)
                    || matches!(op, AstBinaryOp::LogicalAnd | AstBinaryOp::LogicalOr)
                {
                    Ok(Type::Int)
                } else {
                    Ok(common_type(self.expr_type(lhs)?, self.expr_type(rhs)?))
                }
            }
            ast::Expr::Assignment(lhs, _) => self.expr_type(lhs),
            ast::Expr::Conditional(_, then_expr, else_expr) => Ok(common_type(
                self.expr_type(then_expr)?,
                self.expr_type(else_expr)?,
            )),
            ast::Expr::Call(name, _) => Ok(self.function_sig(*name)?.ret_type),
        }
    }

    /// Emit a `copy` widening/narrowing `value` to `target`, or return it
    /// unchanged if it is already that type.
    pub(crate) fn convert(&mut self, value: Value, target: Type) -> Value {
        if value.ty() == target {
            return value;
        }
        let dest = self.new_temp(target);
        self.emit(Instruction::Copy { src: value, dest });
        dest
    }

    pub(crate) fn lower_expr(&mut self, expr: &ast::Expr) -> TacResult<Value> {
        match expr {
            ast::Expr::Constant(v) => Ok(Value::Constant(*v, literal_type(*v))),

            ast::Expr::Variable(name) => self.resolve(*name),

            ast::Expr::Unary(AstUnaryOp::PostIncrement, operand)
            | ast::Expr::Unary(AstUnaryOp::PostDecrement, operand) => {
                self.lower_postfix(expr, operand)
            }

            ast::Expr::Unary(op, operand) => {
                let src = self.lower_expr(operand)?;
                let (tac_op, result_ty) = match op {
                    AstUnaryOp::Negate => (UnaryOp::Negate, src.ty()),
                    AstUnaryOp::Complement => (UnaryOp::Complement, src.ty()),
                    AstUnaryOp::LogicalNot => (UnaryOp::LogicalNot, Type::Int),
                    AstUnaryOp::PostIncrement | AstUnaryOp::PostDecrement => unreachable!(),
                };
                let dest = self.new_temp(result_ty);
                self.emit(Instruction::Unary {
                    op: tac_op,
                    src,
                    dest,
                });
                Ok(dest)
            }

            ast::Expr::Binary(AstBinaryOp::LogicalAnd, lhs, rhs) => self.lower_logical_and(lhs, rhs),
            ast::Expr::Binary(AstBinaryOp::LogicalOr, lhs, rhs) => self.lower_logical_or(lhs, rhs),

            ast::Expr::Binary(op, lhs, rhs) if matches!(op, AstBinaryOp::ShiftLeft | AstBinaryOp::ShiftRight) => {
                let lv = self.lower_expr(lhs)?;
                let rv = self.lower_expr(rhs)?;
                let result_ty = lv.ty();
                let tac_op = match (op, result_ty.is_signed()) {
                    (AstBinaryOp::ShiftLeft, _) => BinaryOp::ShiftLeft,
                    (AstBinaryOp::ShiftRight, true) => BinaryOp::ShiftRight,
                    (AstBinaryOp::ShiftRight, false) => BinaryOp::ShiftRightU,
                    _ => unreachable!(),
                };
                let dest = self.new_temp(result_ty);
                self.emit(Instruction::Binary {
                    op: tac_op,
                    lhs: lv,
                    rhs: rv,
                    dest,
                });
                Ok(dest)
            }

            ast::Expr::Binary(op, lhs, rhs) => {
                let lv = self.lower_expr(lhs)?;
                let rv = self.lower_expr(rhs)?;
                let common = common_type(lv.ty(), rv.ty());
                let lv = self.convert(lv, common);
                let rv = self.convert(rv, common);
                let result_ty = if is_comparison(*op) { Type::Int } else { common };
                let tac_op = to_tac_binary_op(*op, common.is_signed());
                let dest = self.new_temp(result_ty);
                self.emit(Instruction::Binary {
                    op: tac_op,
                    lhs: lv,
                    rhs: rv,
                    dest,
                });
                Ok(dest)
            }

            ast::Expr::Assignment(lhs, rhs) => {
                let location = self.lower_lvalue(lhs)?;
                let rv = self.lower_expr(rhs)?;
                let converted = self.convert(rv, location.ty());
                self.emit(Instruction::Copy {
                    src: converted,
                    dest: location,
                });
                Ok(location)
            }

            ast::Expr::Conditional(cond, then_expr, else_expr) => {
                self.lower_conditional(cond, then_expr, else_expr)
            }

            ast::Expr::Call(name, args) => self.lower_call(*name, args),
        }
    }

    /// Resolve an assignment/increment target to the TAC location it
    /// writes through. The parser only ever builds these nodes over
    /// `variable` expressions.
    fn lower_lvalue(&mut self, expr: &ast::Expr) -> TacResult<Value> {
        match expr {
            ast::Expr::Variable(name) => self.resolve(*name),
            _ => unreachable!("assignment target must be a variable"),
        }
    }

    fn lower_postfix(&mut self, full: &ast::Expr, operand: &ast::Expr) -> TacResult<Value> {
        let is_increment = matches!(full, ast::Expr::Unary(AstUnaryOp::PostIncrement, _));
        let location = self.lower_lvalue(operand)?;
        let old = self.new_temp(location.ty());
        self.emit(Instruction::Copy {
            src: location,
            dest: old,
        });
        let one = Value::Constant(1, location.ty());
        let op = if is_increment {
            BinaryOp::Add
        } else {
            BinaryOp::Subtract
        };
        let updated = self.new_temp(location.ty());
        self.emit(Instruction::Binary {
            op,
            lhs: location,
            rhs: one,
            dest: updated,
        });
        self.emit(Instruction::Copy {
            src: updated,
            dest: location,
        });
        Ok(old)
    }

    fn lower_logical_and(&mut self, lhs: &ast::Expr, rhs: &ast::Expr) -> TacResult<Value> {
        let false_label = self.new_label("and_false");
        let end_label = self.new_label("and_end");
        let dest = self.new_temp(Type::Int);

        let lv = self.lower_expr(lhs)?;
        self.emit(Instruction::JumpIfZero(lv, false_label));
        let rv = self.lower_expr(rhs)?;
        self.emit(Instruction::JumpIfZero(rv, false_label));
        self.emit(Instruction::Copy {
            src: Value::Constant(1, Type::Int),
            dest,
        });
        self.emit(Instruction::Jump(end_label));
        self.emit(Instruction::Label(false_label));
        self.emit(Instruction::Copy {
            src: Value::Constant(0, Type::Int),
            dest,
        });
        self.emit(Instruction::Label(end_label));
        Ok(dest)
    }

    fn lower_logical_or(&mut self, lhs: &ast::Expr, rhs: &ast::Expr) -> TacResult<Value> {
        let true_label = self.new_label("or_true");
        let end_label = self.new_label("or_end");
        let dest = self.new_temp(Type::Int);

        let lv = self.lower_expr(lhs)?;
        self.emit(Instruction::JumpIfNotZero(lv, true_label));
        let rv = self.lower_expr(rhs)?;
        self.emit(Instruction::JumpIfNotZero(rv, true_label));
        self.emit(Instruction::Copy {
            src: Value::Constant(0, Type::Int),
            dest,
        });
        self.emit(Instruction::Jump(end_label));
        self.emit(Instruction::Label(true_label));
        self.emit(Instruction::Copy {
            src: Value::Constant(1, Type::Int),
            dest,
        });
        self.emit(Instruction::Label(end_label));
        Ok(dest)
    }

    fn lower_conditional(
        &mut self,
        cond: &ast::Expr,
        then_expr: &ast::Expr,
        else_expr: &ast::Expr,
    ) -> TacResult<Value> {
        let result_ty = common_type(self.expr_type(then_expr)?, self.expr_type(else_expr)?);
        let dest = self.new_temp(result_ty);
        let else_label = self.new_label("cond_else");
        let end_label = self.new_label("cond_end");

        let cv = self.lower_expr(cond)?;
        self.emit(Instruction::JumpIfZero(cv, else_label));
        let tv = self.lower_expr(then_expr)?;
        let tv = self.convert(tv, result_ty);
        self.emit(Instruction::Copy { src: tv, dest });
        self.emit(Instruction::Jump(end_label));
        self.emit(Instruction::Label(else_label));
        let ev = self.lower_expr(else_expr)?;
        let ev = self.convert(ev, result_ty);
        self.emit(Instruction::Copy { src: ev, dest });
        self.emit(Instruction::Label(end_label));
        Ok(dest)
    }

    fn lower_call(&mut self, name: nanoc_util::Symbol, args: &[ast::Expr]) -> TacResult<Value> {
        let sig = self.function_sig(name)?;
        if sig.param_count != args.len() {
            return Err(TacError::WrongArgumentCount {
                name,
                expected: sig.param_count,
                found: args.len(),
            });
        }
        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            lowered.push(self.lower_expr(arg)?);
        }
        let dest = self.new_temp(sig.ret_type);
        self.emit(Instruction::Call {
            name,
            args: lowered,
            dest,
        });
        Ok(dest)
    }
}
