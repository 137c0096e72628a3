//! Constant folding for static initializers (file-scope globals and
//! function-local `static`s alike). A purely AST-level evaluator; it never
//! touches the generator's name-resolution or instruction-emission state.

use nanoc_par::ast::{BinaryOp, Expr, UnaryOp};
use nanoc_util::Symbol;

use crate::error::{TacError, TacResult};
use crate::generator::Generator;

impl Generator {
    /// Evaluate `expr` at compile time. `owner` is the name of the
    /// declaration being initialized, used only to label a failure.
    pub(crate) fn const_eval(&self, expr: &Expr, owner: Symbol) -> TacResult<i64> {
        match expr {
            Expr::Constant(v) => Ok(*v),

            Expr::Unary(op, inner) => {
                let v = self.const_eval(inner, owner)?;
                match op {
                    UnaryOp::Negate => Ok(v.wrapping_neg()),
                    UnaryOp::Complement => Ok(!v),
                    UnaryOp::LogicalNot => Ok((v == 0) as i64),
                    UnaryOp::PostIncrement | UnaryOp::PostDecrement => {
                        Err(TacError::NonConstantInitializer { name: owner })
                    }
                }
            }

            // Both operands are evaluated unconditionally — `&&`/`||` fold
            // strictly here rather than short-circuiting, since a constant
            // initializer can never have an observable side effect to skip.
            Expr::Binary(op, lhs, rhs) => {
                let l = self.const_eval(lhs, owner)?;
                let r = self.const_eval(rhs, owner)?;
                Ok(match op {
                    BinaryOp::Add => l.wrapping_add(r),
                    BinaryOp::Subtract => l.wrapping_sub(r),
                    BinaryOp::Multiply => l.wrapping_mul(r),
                    BinaryOp::Divide => {
                        if r == 0 {
                            0
                        } else {
                            l.wrapping_div(r)
                        }
                    }
                    BinaryOp::Remainder => {
                        if r == 0 {
                            0
                        } else {
                            l.wrapping_rem(r)
                        }
                    }
                    BinaryOp::ShiftLeft => l.wrapping_shl(r as u32),
                    BinaryOp::ShiftRight => l.wrapping_shr(r as u32),
                    BinaryOp::BitwiseAnd => l & r,
                    BinaryOp::BitwiseOr => l | r,
                    BinaryOp::BitwiseXor => l ^ r,
                    BinaryOp::Equal => (l == r) as i64,
                    BinaryOp::NotEqual => (l != r) as i64,
                    BinaryOp::LessThan => (l < r) as i64,
                    BinaryOp::LessThanOrEqual => (l <= r) as i64,
                    BinaryOp::GreaterThan => (l > r) as i64,
                    BinaryOp::GreaterThanOrEqual => (l >= r) as i64,
                    BinaryOp::LogicalAnd => ((l != 0) && (r != 0)) as i64,
                    BinaryOp::LogicalOr => ((l != 0) || (r != 0)) as i64,
                })
            }

            Expr::Conditional(cond, then_expr, else_expr) => {
                if self.const_eval(cond, owner)? != 0 {
                    self.const_eval(then_expr, owner)
                } else {
                    self.const_eval(else_expr, owner)
                }
            }

            Expr::Variable(_) | Expr::Assignment(_, _) | Expr::Call(_, _) => {
                Err(TacError::NonConstantInitializer { name: owner })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_arithmetic_and_bitwise_expressions() {
        let gen = Generator::new();
        let expr = Expr::Binary(
            BinaryOp::Add,
            Box::new(Expr::Constant(1)),
            Box::new(Expr::Binary(
                BinaryOp::Multiply,
                Box::new(Expr::Constant(2)),
                Box::new(Expr::Constant(3)),
            )),
        );
        assert_eq!(gen.const_eval(&expr, Symbol::intern("x")).unwrap(), 7);
    }

    #[test]
    fn division_by_zero_folds_to_zero() {
        let gen = Generator::new();
        let expr = Expr::Binary(
            BinaryOp::Divide,
            Box::new(Expr::Constant(10)),
            Box::new(Expr::Constant(0)),
        );
        assert_eq!(gen.const_eval(&expr, Symbol::intern("x")).unwrap(), 0);
    }

    #[test]
    fn variable_reference_is_not_constant() {
        let gen = Generator::new();
        let expr = Expr::Variable(Symbol::intern("y"));
        assert!(matches!(
            gen.const_eval(&expr, Symbol::intern("x")),
            Err(TacError::NonConstantInitializer { .. })
        ));
    }

    #[test]
    fn ternary_picks_the_taken_branch() {
        let gen = Generator::new();
        let expr = Expr::Conditional(
            Box::new(Expr::Constant(0)),
            Box::new(Expr::Constant(100)),
            Box::new(Expr::Constant(200)),
        );
        assert_eq!(gen.const_eval(&expr, Symbol::intern("x")).unwrap(), 200);
    }
}
