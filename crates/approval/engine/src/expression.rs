//! Routing condition evaluator.
//!
//! Conditions are single-clause expressions over the typed routing
//! context — named predicates, comparisons, and bare boolean fields.
//! Evaluation is fail-closed: any parse failure, unknown identifier, or
//! type mismatch logs a warning and reads as "not satisfied", so a
//! broken rule blocks a route rather than silently approving it.

use approval_types::RoutingContext;

/// Stateless condition evaluator, safe for concurrent use.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a routing condition. `None` and blank expressions are
    /// always satisfied.
    pub fn evaluate(&self, expression: Option<&str>, ctx: &RoutingContext) -> bool {
        let Some(expression) = expression else {
            return true;
        };
        let expression = expression.trim();
        if expression.is_empty() {
            return true;
        }

        match eval(expression, ctx) {
            Ok(satisfied) => satisfied,
            Err(reason) => {
                tracing::warn!(
                    expression,
                    reason,
                    "routing condition failed to evaluate, treating as not satisfied"
                );
                false
            }
        }
    }
}

fn eval(expression: &str, ctx: &RoutingContext) -> Result<bool, String> {
    if let Some(rest) = expression.strip_prefix('!') {
        return eval(rest.trim(), ctx).map(|v| !v);
    }

    if let Some(call) = parse_call(expression) {
        return eval_predicate(call, ctx);
    }

    for op in ["==", "!=", ">=", "<=", ">", "<"] {
        if let Some((lhs, rhs)) = expression.split_once(op) {
            return eval_comparison(lhs.trim(), op, rhs.trim(), ctx);
        }
    }

    // Bare identifier — must name a boolean context field.
    match expression {
        "quota_exceeded" => Ok(ctx.quota_exceeded),
        other => Err(format!("unknown identifier `{other}`")),
    }
}

struct Call<'a> {
    name: &'a str,
    args: Vec<&'a str>,
}

fn parse_call(expression: &str) -> Option<Call<'_>> {
    let open = expression.find('(')?;
    let close = expression.rfind(')')?;
    if close != expression.len() - 1 || close < open {
        return None;
    }
    let name = expression[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let inner = expression[open + 1..close].trim();
    let args = if inner.is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(str::trim).collect()
    };
    Some(Call { name, args })
}

fn eval_predicate(call: Call<'_>, ctx: &RoutingContext) -> Result<bool, String> {
    match (call.name, call.args.as_slice()) {
        ("amount_between", [min, max]) => {
            let min = parse_number(min)?;
            let max = parse_number(max)?;
            Ok(min <= ctx.order_amount && ctx.order_amount < max)
        }
        ("has_role", [role]) => Ok(ctx.has_role(unquote(role))),
        ("quota_exceeded", []) => Ok(ctx.quota_exceeded),
        (name, args) => Err(format!(
            "unknown predicate `{name}` with {} argument(s)",
            args.len()
        )),
    }
}

fn eval_comparison(lhs: &str, op: &str, rhs: &str, ctx: &RoutingContext) -> Result<bool, String> {
    match lhs {
        "order_amount" => {
            let rhs = parse_number(rhs)?;
            let lhs = ctx.order_amount;
            Ok(match op {
                "==" => lhs == rhs,
                "!=" => lhs != rhs,
                ">=" => lhs >= rhs,
                "<=" => lhs <= rhs,
                ">" => lhs > rhs,
                "<" => lhs < rhs,
                _ => unreachable!(),
            })
        }
        "quota_exceeded" => {
            let rhs = parse_bool(rhs)?;
            match op {
                "==" => Ok(ctx.quota_exceeded == rhs),
                "!=" => Ok(ctx.quota_exceeded != rhs),
                _ => Err(format!("operator `{op}` is not defined for booleans")),
            }
        }
        other => Err(format!("unknown identifier `{other}`")),
    }
}

fn parse_number(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("`{raw}` is not a number"))
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("`{raw}` is not a boolean")),
    }
}

fn unquote(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RoutingContext {
        RoutingContext::new(50_000.0)
            .with_role("sales")
            .with_quota_exceeded(false)
    }

    #[test]
    fn test_absent_condition_is_satisfied() {
        let evaluator = ConditionEvaluator::new();
        assert!(evaluator.evaluate(None, &ctx()));
        assert!(evaluator.evaluate(Some(""), &ctx()));
        assert!(evaluator.evaluate(Some("   "), &ctx()));
    }

    #[test]
    fn test_amount_between_is_half_open() {
        let evaluator = ConditionEvaluator::new();
        assert!(evaluator.evaluate(Some("amount_between(0, 100000)"), &ctx()));
        assert!(evaluator.evaluate(Some("amount_between(50000, 100000)"), &ctx()));
        assert!(!evaluator.evaluate(Some("amount_between(0, 50000)"), &ctx()));
    }

    #[test]
    fn test_has_role() {
        let evaluator = ConditionEvaluator::new();
        assert!(evaluator.evaluate(Some("has_role(\"sales\")"), &ctx()));
        assert!(evaluator.evaluate(Some("has_role('sales')"), &ctx()));
        assert!(!evaluator.evaluate(Some("has_role(\"finance\")"), &ctx()));
    }

    #[test]
    fn test_quota_exceeded_forms() {
        let evaluator = ConditionEvaluator::new();
        let exceeded = RoutingContext::new(1.0).with_quota_exceeded(true);

        assert!(evaluator.evaluate(Some("quota_exceeded()"), &exceeded));
        assert!(evaluator.evaluate(Some("quota_exceeded"), &exceeded));
        assert!(evaluator.evaluate(Some("quota_exceeded == true"), &exceeded));
        assert!(!evaluator.evaluate(Some("quota_exceeded()"), &ctx()));
        assert!(evaluator.evaluate(Some("!quota_exceeded()"), &ctx()));
    }

    #[test]
    fn test_amount_comparisons() {
        let evaluator = ConditionEvaluator::new();
        assert!(evaluator.evaluate(Some("order_amount >= 50000"), &ctx()));
        assert!(evaluator.evaluate(Some("order_amount <= 50000"), &ctx()));
        assert!(!evaluator.evaluate(Some("order_amount > 50000"), &ctx()));
        assert!(evaluator.evaluate(Some("order_amount < 50001"), &ctx()));
        assert!(evaluator.evaluate(Some("order_amount == 50000"), &ctx()));
        assert!(!evaluator.evaluate(Some("order_amount != 50000"), &ctx()));
    }

    #[test]
    fn test_unknown_identifier_fails_closed() {
        let evaluator = ConditionEvaluator::new();
        assert!(!evaluator.evaluate(Some("discount >= 10"), &ctx()));
        assert!(!evaluator.evaluate(Some("approved"), &ctx()));
    }

    #[test]
    fn test_garbage_fails_closed() {
        let evaluator = ConditionEvaluator::new();
        assert!(!evaluator.evaluate(Some("order_amount >= ten"), &ctx()));
        assert!(!evaluator.evaluate(Some("amount_between(1)"), &ctx()));
        assert!(!evaluator.evaluate(Some("frobnicate(1, 2)"), &ctx()));
        assert!(!evaluator.evaluate(Some("((("), &ctx()));
        assert!(!evaluator.evaluate(Some("quota_exceeded >= true"), &ctx()));
    }

    #[test]
    fn test_negation_of_unknown_still_fails_closed() {
        // `!broken` must not read as satisfied just because `broken` fails.
        let evaluator = ConditionEvaluator::new();
        assert!(!evaluator.evaluate(Some("!frobnicate()"), &ctx()));
    }
}
