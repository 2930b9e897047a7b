//! Compiled statement forms (spec §4.7) and their control-flow signals.

use sl_data::RuntimeError;

use crate::context::RuntimeContext;
use crate::evaluator::Evaluator;

/// What finishing a statement hands back to its enclosing statement.
/// `Break`/`Continue` carry the break level still to unwind; loops and
/// switches consume a `Break` that has reached level 1, decrement and
/// re-propagate anything higher, and (loops only) consume `Continue`
/// directly rather than letting it escape further up.
pub enum ExecSignal {
    Normal,
    Break(u32),
    Continue,
    Return,
}

/// Either an expression evaluated once for its initial value (`for (i = 0;
/// ...)`), or a fresh local declared and scoped to the loop (`for (number i
/// = 0; ...)`).
pub enum ForInit {
    Expr(Evaluator),
    Decl(Box<Statement>),
}

pub enum Statement {
    Expr(Evaluator),
    Block(Vec<Statement>),
    /// One evaluator per declared name, in declaration order; executing
    /// pushes each onto the stack, so the order here must match the local
    /// offsets the compiler assigned.
    LocalDecl(Vec<Evaluator>),
    Break(u32),
    Continue,
    Return,
    ReturnValue(Evaluator),
    If { branches: Vec<(Evaluator, Statement)>, otherwise: Option<Box<Statement>> },
    /// `labels` maps a case value (`None` for `default`) to the index in
    /// `body` where that case's statements start; `body` is the flattened,
    /// label-free statement sequence so fallthrough is just "keep
    /// executing the next statement in `body`".
    Switch { subject: Evaluator, labels: Vec<(Option<i64>, usize)>, body: Vec<Statement> },
    While { condition: Evaluator, body: Box<Statement> },
    DoWhile { condition: Evaluator, body: Box<Statement> },
    For { init: Option<ForInit>, condition: Evaluator, step: Option<Evaluator>, body: Box<Statement> },
}

impl Statement {
    pub fn execute(&self, ctx: &mut RuntimeContext) -> Result<ExecSignal, RuntimeError> {
        return match self {
            Statement::Expr(expr) => {
                expr.eval(ctx)?;
                Ok(ExecSignal::Normal)
            }
            Statement::Block(statements) => {
                let guard = ctx.enter_scope();
                let signal = execute_sequence(statements, ctx);
                ctx.leave_scope(guard);
                signal
            }
            Statement::LocalDecl(initializers) => {
                for init in initializers {
                    let value = init.eval(ctx)?;
                    ctx.push_local(value);
                }
                Ok(ExecSignal::Normal)
            }
            Statement::Break(n) => Ok(ExecSignal::Break(*n)),
            Statement::Continue => Ok(ExecSignal::Continue),
            Statement::Return => Ok(ExecSignal::Return),
            Statement::ReturnValue(expr) => {
                let value = expr.eval(ctx)?.borrow().clone_value();
                ctx.set_retval(value);
                Ok(ExecSignal::Return)
            }
            Statement::If { branches, otherwise } => {
                for (condition, body) in branches {
                    if condition.eval(ctx)?.borrow().truthy() {
                        return body.execute(ctx);
                    }
                }
                match otherwise {
                    Some(body) => body.execute(ctx),
                    None => Ok(ExecSignal::Normal),
                }
            }
            Statement::Switch { subject, labels, body } => execute_switch(subject, labels, body, ctx),
            Statement::While { condition, body } => execute_while(condition, body, ctx),
            Statement::DoWhile { condition, body } => execute_do_while(condition, body, ctx),
            Statement::For { init, condition, step, body } => execute_for(init.as_ref(), condition, step.as_ref(), body, ctx),
        };
    }
}

fn execute_sequence(statements: &[Statement], ctx: &mut RuntimeContext) -> Result<ExecSignal, RuntimeError> {
    for statement in statements {
        match statement.execute(ctx)? {
            ExecSignal::Normal => continue,
            other => return Ok(other),
        }
    }
    return Ok(ExecSignal::Normal);
}

/// Unwinds one level of break nesting: a `Break(1)` is fully consumed here
/// (becomes `Normal`), a higher level is decremented and re-propagated to
/// the next enclosing loop/switch.
fn consume_one_break_level(n: u32) -> ExecSignal {
    return if n <= 1 { ExecSignal::Normal } else { ExecSignal::Break(n - 1) };
}

fn execute_switch(subject: &Evaluator, labels: &[(Option<i64>, usize)], body: &[Statement], ctx: &mut RuntimeContext) -> Result<ExecSignal, RuntimeError> {
    let discriminant = subject.eval(ctx)?.borrow().as_number() as i64;
    let start = labels
        .iter()
        .find(|(value, _)| *value == Some(discriminant))
        .or_else(|| labels.iter().find(|(value, _)| value.is_none()))
        .map(|(_, index)| *index);

    let Some(start) = start else {
        return Ok(ExecSignal::Normal);
    };

    for statement in &body[start..] {
        match statement.execute(ctx)? {
            ExecSignal::Normal => continue,
            ExecSignal::Break(n) => {
                return Ok(consume_one_break_level(n));
            }
            other => return Ok(other),
        }
    }
    return Ok(ExecSignal::Normal);
}

fn execute_while(condition: &Evaluator, body: &Statement, ctx: &mut RuntimeContext) -> Result<ExecSignal, RuntimeError> {
    while condition.eval(ctx)?.borrow().truthy() {
        match body.execute(ctx)? {
            ExecSignal::Normal | ExecSignal::Continue => continue,
            ExecSignal::Break(n) => {
                return Ok(consume_one_break_level(n));
            }
            ExecSignal::Return => return Ok(ExecSignal::Return),
        }
    }
    return Ok(ExecSignal::Normal);
}

fn execute_do_while(condition: &Evaluator, body: &Statement, ctx: &mut RuntimeContext) -> Result<ExecSignal, RuntimeError> {
    loop {
        match body.execute(ctx)? {
            ExecSignal::Normal | ExecSignal::Continue => {}
            ExecSignal::Break(n) => {
                return Ok(consume_one_break_level(n));
            }
            ExecSignal::Return => return Ok(ExecSignal::Return),
        }
        if !condition.eval(ctx)?.borrow().truthy() {
            return Ok(ExecSignal::Normal);
        }
    }
}

fn execute_for(init: Option<&ForInit>, condition: &Evaluator, step: Option<&Evaluator>, body: &Statement, ctx: &mut RuntimeContext) -> Result<ExecSignal, RuntimeError> {
    let guard = if matches!(init, Some(ForInit::Decl(_))) { Some(ctx.enter_scope()) } else { None };

    // Runs the declaration initializer (if any), then the loop itself, as
    // one fallible block so the scope guard below always fires - on a
    // declaration error, a loop-condition error, or a normal finish alike.
    let result = (|| -> Result<ExecSignal, RuntimeError> {
        match init {
            Some(ForInit::Decl(decl)) => {
                decl.execute(ctx)?;
            }
            Some(ForInit::Expr(expr)) => {
                expr.eval(ctx)?;
            }
            None => {}
        }

        while condition.eval(ctx)?.borrow().truthy() {
            match body.execute(ctx)? {
                ExecSignal::Normal | ExecSignal::Continue => {}
                ExecSignal::Break(n) => {
                    return Ok(consume_one_break_level(n));
                }
                ExecSignal::Return => return Ok(ExecSignal::Return),
            }
            if let Some(step) = step {
                step.eval(ctx)?;
            }
        }
        Ok(ExecSignal::Normal)
    })();

    if let Some(guard) = guard {
        ctx.leave_scope(guard);
    }
    return result;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::variable::Variable;

    #[test]
    fn while_loop_sums_until_condition_false() {
        let mut ctx = RuntimeContext::new();
        ctx.reserve_globals(2);
        ctx.set_global(0, Variable::Number(0.0));
        ctx.set_global(1, Variable::Number(3.0));

        use crate::evaluator::{ArithOp, CompareOp, Evaluator};
        let condition = Evaluator::Compare(CompareOp::Gt, Box::new(Evaluator::GlobalRef(1)), Box::new(Evaluator::NumberLiteral(0.0)));
        let body = Statement::Block(vec![
            Statement::Expr(Evaluator::ArithAssign(ArithOp::Add, Box::new(Evaluator::GlobalRef(0)), Box::new(Evaluator::GlobalRef(1)))),
            Statement::Expr(Evaluator::ArithAssign(ArithOp::Sub, Box::new(Evaluator::GlobalRef(1)), Box::new(Evaluator::NumberLiteral(1.0)))),
        ]);
        let stmt = Statement::While { condition, body: Box::new(body) };
        stmt.execute(&mut ctx).unwrap();

        assert_eq!(ctx.global(0).unwrap().borrow().as_number(), 6.0);
        assert_eq!(ctx.global(1).unwrap().borrow().as_number(), 0.0);
    }

    #[test]
    fn break_unwinds_only_its_own_level() {
        let mut ctx = RuntimeContext::new();
        ctx.reserve_globals(1);
        ctx.set_global(0, Variable::Number(0.0));

        use crate::evaluator::{ArithOp, Evaluator};
        let inner = Statement::While {
            condition: Evaluator::NumberLiteral(1.0),
            body: Box::new(Statement::Block(vec![Statement::Break(2)])),
        };
        let outer = Statement::While {
            condition: Evaluator::NumberLiteral(1.0),
            body: Box::new(Statement::Block(vec![
                Statement::Expr(Evaluator::ArithAssign(ArithOp::Add, Box::new(Evaluator::GlobalRef(0)), Box::new(Evaluator::NumberLiteral(1.0)))),
                inner,
            ])),
        };
        outer.execute(&mut ctx).unwrap();
        assert_eq!(ctx.global(0).unwrap().borrow().as_number(), 1.0);
    }

    #[test]
    fn for_loop_runs_step_even_after_continue() {
        let mut ctx = RuntimeContext::new();
        ctx.reserve_globals(1);
        ctx.set_global(0, Variable::Number(0.0));

        use crate::evaluator::{ArithOp, CompareOp, Evaluator, IncDec};
        let for_stmt = Statement::For {
            init: Some(ForInit::Expr(Evaluator::Assign(Box::new(Evaluator::GlobalRef(0)), Box::new(Evaluator::NumberLiteral(0.0))))),
            condition: Evaluator::Compare(CompareOp::Lt, Box::new(Evaluator::GlobalRef(0)), Box::new(Evaluator::NumberLiteral(3.0))),
            step: Some(Evaluator::IncDec(IncDec::PreInc, Box::new(Evaluator::GlobalRef(0)))),
            body: Box::new(Statement::Block(vec![Statement::Continue])),
        };
        for_stmt.execute(&mut ctx).unwrap();
        assert_eq!(ctx.global(0).unwrap().borrow().as_number(), 3.0);
    }

    #[test]
    fn switch_falls_through_until_break() {
        let mut ctx = RuntimeContext::new();
        ctx.reserve_globals(1);
        ctx.set_global(0, Variable::Number(0.0));

        use crate::evaluator::{ArithOp, Evaluator};
        let body = vec![
            Statement::Expr(Evaluator::ArithAssign(ArithOp::Add, Box::new(Evaluator::GlobalRef(0)), Box::new(Evaluator::NumberLiteral(1.0)))),
            Statement::Expr(Evaluator::ArithAssign(ArithOp::Add, Box::new(Evaluator::GlobalRef(0)), Box::new(Evaluator::NumberLiteral(10.0)))),
            Statement::Break(1),
        ];
        let switch = Statement::Switch { subject: Evaluator::NumberLiteral(0.0), labels: vec![(Some(0), 0), (Some(1), 1)], body };
        switch.execute(&mut ctx).unwrap();
        assert_eq!(ctx.global(0).unwrap().borrow().as_number(), 11.0);
    }
}
