use crate::ast::*;
use std::collections::HashSet;

/// Hard cap on whole-pipeline passes; guarantees termination even if a
/// rewrite keeps reporting changes.
const MAX_PASSES: usize = 10;

/// Tolerance for comparing parsed literals against 0 and 1, and the
/// threshold below which a division is not folded.
const LITERAL_EPSILON: f32 = 1e-4;

/// Writes to these are always live, like writes to declared outputs.
const BUILTIN_SINKS: [&str; 3] = ["gl_Position", "gl_FragColor", "gl_FragDepth"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerStats {
    pub constants_folded: usize,
    pub algebraic_simplifications: usize,
    pub dead_code_removed: usize,
    pub total_passes: usize,
}

/// Rewrites the AST in place to an equivalent but smaller form: constant
/// folding, algebraic simplification, and dead-code elimination, repeated
/// to a fixed point.
#[derive(Default)]
pub struct Optimizer {
    stats: OptimizerStats,
}

impl Optimizer {
    pub fn new() -> Self {
        Optimizer::default()
    }

    pub fn stats(&self) -> OptimizerStats {
        self.stats
    }

    pub fn optimize(&mut self, program: &mut Program) {
        let mut changed = true;

        while changed && self.stats.total_passes < MAX_PASSES {
            changed = false;
            self.stats.total_passes += 1;

            for shader in &mut program.declarations {
                for statement in &mut shader.statements {
                    changed |= self.fold_constants(&mut statement.value);
                    changed |= self.simplify(&mut statement.value);
                }
                changed |= self.eliminate_dead_code(shader);
            }
        }
    }

    /// Bottom-up constant folding: children first, so literal chains
    /// collapse within a single pass.
    fn fold_constants(&mut self, expr: &mut Expression) -> bool {
        let mut changed = false;

        match expr {
            Expression::BinaryOp(_, left, right) => {
                changed |= self.fold_constants(left);
                changed |= self.fold_constants(right);
            }
            Expression::FunctionCall(_, args) => {
                for arg in args.iter_mut() {
                    changed |= self.fold_constants(arg);
                }
            }
            Expression::MemberAccess(object, _) => {
                changed |= self.fold_constants(object);
            }
            Expression::Literal(_) | Expression::Identifier(_) => {}
        }

        if let Expression::BinaryOp(op, left, right) = expr {
            if let (Some(lhs), Some(rhs)) = (literal_value(left), literal_value(right)) {
                if let Some(value) = fold_binary(*op, lhs, rhs) {
                    *expr = Expression::Literal(format_float(value));
                    self.stats.constants_folded += 1;
                    changed = true;
                }
            }
        }

        changed
    }

    fn simplify(&mut self, expr: &mut Expression) -> bool {
        let mut changed = false;

        match expr {
            Expression::BinaryOp(_, left, right) => {
                changed |= self.simplify(left);
                changed |= self.simplify(right);
            }
            Expression::FunctionCall(_, args) => {
                for arg in args.iter_mut() {
                    changed |= self.simplify(arg);
                }
            }
            Expression::MemberAccess(object, _) => {
                changed |= self.simplify(object);
            }
            Expression::Literal(_) | Expression::Identifier(_) => {}
        }

        changed | self.try_simplify_binary(expr)
    }

    fn try_simplify_binary(&mut self, expr: &mut Expression) -> bool {
        let Expression::BinaryOp(op, left, right) = expr else {
            return false;
        };
        let op = *op;

        // Reassociating a literal tail combines the two literals on the
        // spot, so it counts as both a simplification and a fold.
        let (replacement, folded) = match reassociate(op, left, right) {
            Some(reassociated) => (Some(reassociated), true),
            None => (simplify_identity(op, left, right), false),
        };

        match replacement {
            Some(new_expr) => {
                *expr = new_expr;
                self.stats.algebraic_simplifications += 1;
                if folded {
                    self.stats.constants_folded += 1;
                }
                true
            }
            None => false,
        }
    }

    /// Single-pass kill of assignments to variables nothing reads.
    /// Cascading removal happens through the outer fixed-point loop.
    fn eliminate_dead_code(&mut self, shader: &mut ShaderDecl) -> bool {
        let mut used: HashSet<String> = HashSet::new();
        for statement in &shader.statements {
            collect_used(&statement.value, &mut used);
        }
        for output in &shader.outputs {
            used.insert(output.name.clone());
        }
        for sink in BUILTIN_SINKS {
            used.insert(sink.to_string());
        }

        let before = shader.statements.len();
        shader.statements.retain(|statement| match statement.target_name() {
            Some(name) => used.contains(name),
            None => true,
        });

        let removed = before - shader.statements.len();
        self.stats.dead_code_removed += removed;
        removed > 0
    }
}

fn literal_value(expr: &Expression) -> Option<f32> {
    match expr {
        Expression::Literal(text) => text.parse().ok(),
        _ => None,
    }
}

fn is_literal_value(expr: &Expression, value: f32) -> bool {
    literal_value(expr).map_or(false, |v| (v - value).abs() < LITERAL_EPSILON)
}

fn format_float(value: f32) -> String {
    format!("{}", value)
}

fn fold_binary(op: BinaryOp, left: f32, right: f32) -> Option<f32> {
    match op {
        BinaryOp::Add => Some(left + right),
        BinaryOp::Subtract => Some(left - right),
        BinaryOp::Multiply => Some(left * right),
        // Never fold division by a (near-)zero literal.
        BinaryOp::Divide => {
            if right.abs() < LITERAL_EPSILON {
                None
            } else {
                Some(left / right)
            }
        }
    }
}

/// `(X op c1) op c2` and `c1 op (X op c2)` become `X op (c1 op c2)` for the
/// associative operators `*` and `+`, so folding can fire on the combined
/// tail. Subtraction and division are never reassociated.
fn reassociate(op: BinaryOp, left: &Expression, right: &Expression) -> Option<Expression> {
    if !matches!(op, BinaryOp::Multiply | BinaryOp::Add) {
        return None;
    }

    let rebuild = |base: &Expression, combined: f32| {
        Expression::BinaryOp(
            op,
            Box::new(base.clone()),
            Box::new(Expression::Literal(format_float(combined))),
        )
    };

    // (X op c1) op c2
    if let (Expression::BinaryOp(inner_op, base, tail), Some(c2)) = (left, literal_value(right)) {
        if *inner_op == op {
            if let Some(c1) = literal_value(tail) {
                return Some(rebuild(base, fold_binary(op, c1, c2)?));
            }
        }
    }

    // c1 op (X op c2)
    if let (Some(c1), Expression::BinaryOp(inner_op, base, tail)) = (literal_value(left), right) {
        if *inner_op == op {
            if let Some(c2) = literal_value(tail) {
                return Some(rebuild(base, fold_binary(op, c1, c2)?));
            }
        }
    }

    None
}

fn simplify_identity(op: BinaryOp, left: &Expression, right: &Expression) -> Option<Expression> {
    match op {
        BinaryOp::Multiply => {
            if is_literal_value(right, 1.0) {
                Some(left.clone())
            } else if is_literal_value(left, 1.0) {
                Some(right.clone())
            } else if is_literal_value(right, 0.0) || is_literal_value(left, 0.0) {
                Some(Expression::Literal("0.0".to_string()))
            } else {
                None
            }
        }
        BinaryOp::Add => {
            if is_literal_value(right, 0.0) {
                Some(left.clone())
            } else if is_literal_value(left, 0.0) {
                Some(right.clone())
            } else {
                None
            }
        }
        BinaryOp::Subtract => {
            if is_literal_value(right, 0.0) {
                Some(left.clone())
            } else {
                None
            }
        }
        BinaryOp::Divide => {
            if is_literal_value(right, 1.0) {
                Some(left.clone())
            } else {
                None
            }
        }
    }
}

fn collect_used(expr: &Expression, used: &mut HashSet<String>) {
    match expr {
        Expression::Identifier(name) => {
            used.insert(name.clone());
        }
        Expression::BinaryOp(_, left, right) => {
            collect_used(left, used);
            collect_used(right, used);
        }
        Expression::MemberAccess(object, _) => {
            collect_used(object, used);
        }
        Expression::FunctionCall(_, args) => {
            for arg in args {
                collect_used(arg, used);
            }
        }
        Expression::Literal(_) => {}
    }
}
