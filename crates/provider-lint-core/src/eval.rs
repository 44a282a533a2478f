//! Static expression evaluation over a module.
//!
//! The evaluator resolves what can be known without running the
//! configuration: input variables, variable defaults and local values.
//! Anything else (resource attributes, `each`, `count`, module outputs, ...)
//! evaluates to [`Value::Unknown`].

use crate::expr::{ExprKind, Expression};
use crate::schema::{BlockSchema, BodySchema, SchemaError};
use crate::tree::Module;
use crate::types::SourceRange;
use crate::value::Value;
use std::collections::HashMap;
use thiserror::Error;

/// The shape a caller expects from an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WantType {
    /// A string. Numbers and bools are converted.
    String,
    /// Any value, returned as evaluated.
    Any,
}

/// Errors raised while evaluating an expression.
///
/// Unknown values are not errors; only expressions that can never produce
/// a value are.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    /// Call to a function the evaluator does not provide.
    #[error("{range}: call to unknown function \"{name}\"")]
    UnknownFunction {
        /// Function name.
        name: String,
        /// Range of the call.
        range: SourceRange,
    },

    /// A function received an argument it cannot handle.
    #[error("{range}: invalid argument for {function}(): {message}")]
    InvalidArgument {
        /// Function name.
        function: String,
        /// What was wrong.
        message: String,
        /// Range of the call.
        range: SourceRange,
    },

    /// Reference to a variable or local that is not declared.
    #[error("{range}: reference to undeclared {kind} \"{name}\"")]
    Undeclared {
        /// "input variable" or "local value".
        kind: &'static str,
        /// Referenced name.
        name: String,
        /// Range of the reference.
        range: SourceRange,
    },

    /// A traversal step does not exist on the value.
    #[error("{range}: unsupported attribute \"{name}\"")]
    UnsupportedAttribute {
        /// Attribute or key name.
        name: String,
        /// Range of the reference.
        range: SourceRange,
    },

    /// Local values refer to each other in a cycle.
    #[error("{range}: cycle in local values: {chain}")]
    Cycle {
        /// Names on the cycle, joined with " -> ".
        chain: String,
        /// Range of the reference closing the cycle.
        range: SourceRange,
    },

    /// The value does not have the requested shape.
    #[error("{range}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected kind.
        expected: &'static str,
        /// Actual kind.
        found: &'static str,
        /// Range of the expression.
        range: SourceRange,
    },
}

#[derive(Debug, Clone)]
struct Variable {
    default: Option<Expression>,
    sensitive: bool,
}

/// Evaluates expressions against a module's variables and locals.
#[derive(Debug, Clone, Default)]
pub struct ModuleEvaluator {
    variables: HashMap<String, Variable>,
    locals: HashMap<String, Expression>,
    inputs: HashMap<String, Value>,
}

fn variable_schema() -> BodySchema {
    BodySchema::new().block(
        BlockSchema::new("variable").labels(&["name"]).body(
            BodySchema::new()
                .attribute("default")
                .attribute("sensitive"),
        ),
    )
}

impl ModuleEvaluator {
    /// Collects `variable` and `locals` declarations from `module`.
    ///
    /// `inputs` override variable defaults, as values passed on the command
    /// line would.
    ///
    /// # Errors
    ///
    /// Returns an error if a `variable` block is malformed.
    pub fn new(module: &Module, inputs: HashMap<String, Value>) -> Result<Self, SchemaError> {
        let schema = variable_schema();
        let mut variables = HashMap::new();
        let mut locals = HashMap::new();

        for file in module.files() {
            let content = file.body.content(&schema)?;
            for block in content.blocks_of_type("variable") {
                let sensitive = block.body.attributes.get("sensitive").is_some_and(|a| {
                    a.expr.kind == ExprKind::Literal(serde_json::Value::Bool(true))
                });
                variables.insert(
                    block.labels[0].clone(),
                    Variable {
                        default: block.body.attributes.get("default").map(|a| a.expr.clone()),
                        sensitive,
                    },
                );
            }
            for block in file.body.blocks_of_type("locals") {
                for attr in &block.body.attributes {
                    locals.insert(attr.name.clone(), attr.expr.clone());
                }
            }
        }

        Ok(Self {
            variables,
            locals,
            inputs,
        })
    }

    /// Evaluates `expr` and converts the result to `want`.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression cannot be evaluated or a known
    /// result does not fit `want`.
    pub fn evaluate(&self, expr: &Expression, want: WantType) -> Result<Value, EvalError> {
        let value = self.eval(expr, &mut Vec::new())?;
        match want {
            WantType::Any => Ok(value),
            WantType::String => match value {
                Value::String(_) | Value::Unknown | Value::Null | Value::Sensitive(_) => Ok(value),
                Value::Bool(_) | Value::Number(_) => {
                    Ok(Value::String(value.to_primitive_string().unwrap_or_default()))
                }
                Value::List(_) | Value::Map(_) => Err(EvalError::TypeMismatch {
                    expected: "string",
                    found: value.kind(),
                    range: expr.range.clone(),
                }),
            },
        }
    }

    fn eval(&self, expr: &Expression, stack: &mut Vec<String>) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Literal(json) => Ok(Value::from(json.clone())),
            ExprKind::Reference(path) => self.eval_reference(path, &expr.range, stack),
            ExprKind::Object(items) => {
                let mut entries = Vec::with_capacity(items.len());
                for item in items {
                    let key = object_key(self.eval(&item.key, stack)?, &item.key.range)?;
                    let value = self.eval(&item.value, stack)?;
                    entries.push((key, value));
                }
                Ok(Value::Map(entries))
            }
            ExprKind::Tuple(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.eval(item, stack))
                    .collect::<Result<_, _>>()?,
            )),
            ExprKind::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, stack))
                    .collect::<Result<Vec<_>, _>>()?;
                call_function(name, args, &expr.range)
            }
        }
    }

    fn eval_reference(
        &self,
        path: &[String],
        range: &SourceRange,
        stack: &mut Vec<String>,
    ) -> Result<Value, EvalError> {
        let (root, name, rest) = match path {
            [root, name, rest @ ..] => (root.as_str(), name, rest),
            _ => return Ok(Value::Unknown),
        };

        let value = match root {
            "var" => {
                let declared = self.variables.get(name);
                if declared.is_none() && !self.inputs.contains_key(name) {
                    return Err(EvalError::Undeclared {
                        kind: "input variable",
                        name: name.clone(),
                        range: range.clone(),
                    });
                }
                let value = match (self.inputs.get(name), declared.and_then(|v| v.default.as_ref())) {
                    (Some(input), _) => input.clone(),
                    (None, Some(default)) => {
                        self.eval_guarded(format!("var.{name}"), default, range, stack)?
                    }
                    (None, None) => Value::Unknown,
                };
                if declared.is_some_and(|v| v.sensitive) {
                    value.mark_sensitive()
                } else {
                    value
                }
            }
            "local" => {
                let Some(local) = self.locals.get(name) else {
                    return Err(EvalError::Undeclared {
                        kind: "local value",
                        name: name.clone(),
                        range: range.clone(),
                    });
                };
                self.eval_guarded(format!("local.{name}"), local, range, stack)?
            }
            _ => return Ok(Value::Unknown),
        };

        traverse(value, rest, range)
    }

    /// Evaluates the expression behind the named reference `key`, failing if
    /// `key` is already being evaluated.
    fn eval_guarded(
        &self,
        key: String,
        expr: &Expression,
        range: &SourceRange,
        stack: &mut Vec<String>,
    ) -> Result<Value, EvalError> {
        if stack.contains(&key) {
            let mut chain = stack.clone();
            chain.push(key);
            return Err(EvalError::Cycle {
                chain: chain.join(" -> "),
                range: range.clone(),
            });
        }
        stack.push(key);
        let value = self.eval(expr, stack);
        stack.pop();
        value
    }
}

fn object_key(key: Value, range: &SourceRange) -> Result<Value, EvalError> {
    match key {
        Value::String(_) | Value::Unknown | Value::Null | Value::Sensitive(_) => Ok(key),
        Value::Bool(_) | Value::Number(_) => {
            Ok(Value::String(key.to_primitive_string().unwrap_or_default()))
        }
        Value::List(_) | Value::Map(_) => Err(EvalError::TypeMismatch {
            expected: "string",
            found: key.kind(),
            range: range.clone(),
        }),
    }
}

fn traverse(value: Value, steps: &[String], range: &SourceRange) -> Result<Value, EvalError> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(value);
    };

    let unsupported = || EvalError::UnsupportedAttribute {
        name: step.clone(),
        range: range.clone(),
    };

    match value {
        Value::Unknown => Ok(Value::Unknown),
        Value::Sensitive(inner) => Ok(traverse(*inner, steps, range)?.mark_sensitive()),
        Value::Map(ref entries) => match value.get(step) {
            Some(found) => traverse(found.clone(), rest, range),
            // An opaque key could be the one we are looking for.
            None if entries.iter().any(|(k, _)| !k.is_known() || k.is_sensitive()) => {
                Ok(Value::Unknown)
            }
            None => Err(unsupported()),
        },
        Value::List(items) => {
            let item = step
                .parse::<usize>()
                .ok()
                .and_then(|i| items.into_iter().nth(i))
                .ok_or_else(unsupported)?;
            traverse(item, rest, range)
        }
        _ => Err(unsupported()),
    }
}

fn call_function(name: &str, args: Vec<Value>, range: &SourceRange) -> Result<Value, EvalError> {
    let invalid = |message: String| EvalError::InvalidArgument {
        function: name.to_string(),
        message,
        range: range.clone(),
    };

    match name {
        "sensitive" | "nonsensitive" | "tomap" => {
            let [arg]: [Value; 1] = args
                .try_into()
                .map_err(|a: Vec<Value>| invalid(format!("expected 1 argument, got {}", a.len())))?;
            match name {
                "sensitive" => Ok(arg.mark_sensitive()),
                "nonsensitive" => Ok(arg.unmark()),
                _ => match &arg {
                    Value::Map(_) | Value::Null | Value::Unknown => Ok(arg),
                    Value::Sensitive(inner) if matches!(**inner, Value::Map(_)) => Ok(arg),
                    other => Err(invalid(format!("cannot convert {} to map", other.kind()))),
                },
            }
        }
        "merge" => merge(args).map_err(invalid),
        _ => Err(EvalError::UnknownFunction {
            name: name.to_string(),
            range: range.clone(),
        }),
    }
}

fn merge(args: Vec<Value>) -> Result<Value, String> {
    let mut sensitive = false;
    let mut entries: Vec<(Value, Value)> = Vec::new();

    for arg in args {
        if arg.is_sensitive() {
            sensitive = true;
        }
        match arg.unmark() {
            Value::Null => {}
            Value::Unknown => return Ok(Value::Unknown),
            Value::Map(items) => {
                for (key, value) in items {
                    if let Some(name) = key.as_str() {
                        entries.retain(|(k, _)| k.as_str() != Some(name));
                    }
                    entries.push((key, value));
                }
            }
            other => return Err(format!("arguments must be maps, got {}", other.kind())),
        }
    }

    let merged = Value::Map(entries);
    Ok(if sensitive {
        merged.mark_sensitive()
    } else {
        merged
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Attribute, Block, Body, File};
    use serde_json::json;

    fn module(blocks: Vec<Block>) -> Module {
        Module::new(vec![File::new(
            "main.tf",
            Body {
                attributes: Vec::new(),
                blocks,
            },
        )])
    }

    fn variable(name: &str, default: Option<Expression>, sensitive: bool) -> Block {
        let mut block = Block::new("variable").label(name);
        if let Some(default) = default {
            block = block.attribute(Attribute::new("default", default));
        }
        if sensitive {
            block = block.attribute(Attribute::new("sensitive", Expression::literal(true)));
        }
        block
    }

    fn evaluator(blocks: Vec<Block>) -> ModuleEvaluator {
        ModuleEvaluator::new(&module(blocks), HashMap::new()).expect("valid module")
    }

    fn eval(ev: &ModuleEvaluator, expr: &Expression) -> Value {
        ev.evaluate(expr, WantType::Any).expect("evaluates")
    }

    #[test]
    fn variable_default_is_resolved() {
        let ev = evaluator(vec![variable(
            "default_tags",
            Some(Expression::literal(json!({"Managed By": "test"}))),
            false,
        )]);

        let value = eval(&ev, &Expression::reference("var.default_tags"));
        assert_eq!(value.get("Managed By"), Some(&Value::from("test")));
    }

    #[test]
    fn variable_without_default_is_unknown() {
        let ev = evaluator(vec![variable("tags", None, false)]);
        assert_eq!(eval(&ev, &Expression::reference("var.tags")), Value::Unknown);
    }

    #[test]
    fn input_overrides_default() {
        let m = module(vec![variable("env", Some(Expression::literal("dev")), false)]);
        let inputs = HashMap::from([("env".to_string(), Value::from("prod"))]);
        let ev = ModuleEvaluator::new(&m, inputs).expect("valid module");

        assert_eq!(eval(&ev, &Expression::reference("var.env")), Value::from("prod"));
    }

    #[test]
    fn sensitive_variable_is_marked() {
        let ev = evaluator(vec![variable("secret", Some(Expression::literal("x")), true)]);
        assert!(eval(&ev, &Expression::reference("var.secret")).is_sensitive());
    }

    #[test]
    fn undeclared_variable_is_an_error() {
        let ev = evaluator(Vec::new());
        let err = ev
            .evaluate(&Expression::reference("var.missing"), WantType::Any)
            .expect_err("undeclared");
        assert!(matches!(err, EvalError::Undeclared { kind: "input variable", .. }));
    }

    #[test]
    fn locals_resolve_through_traversal() {
        let ev = evaluator(vec![Block::new("locals").attribute(Attribute::new(
            "tags",
            Expression::string_map([("Owner", "team-a")]),
        ))]);

        assert_eq!(
            eval(&ev, &Expression::reference("local.tags.Owner")),
            Value::from("team-a")
        );
    }

    #[test]
    fn local_cycle_is_detected() {
        let ev = evaluator(vec![Block::new("locals")
            .attribute(Attribute::new("a", Expression::reference("local.b")))
            .attribute(Attribute::new("b", Expression::reference("local.a")))]);

        let err = ev
            .evaluate(&Expression::reference("local.a"), WantType::Any)
            .expect_err("cycle");
        assert!(matches!(
            err,
            EvalError::Cycle { ref chain, .. } if chain == "local.a -> local.b -> local.a"
        ));
    }

    #[test]
    fn variable_default_cycle_is_detected() {
        let ev = evaluator(vec![variable("t", Some(Expression::reference("var.t")), false)]);

        let err = ev
            .evaluate(&Expression::reference("var.t"), WantType::Any)
            .expect_err("cycle");
        assert!(matches!(err, EvalError::Cycle { ref chain, .. } if chain == "var.t -> var.t"));
    }

    #[test]
    fn cycle_through_variables_and_locals_is_detected() {
        let ev = evaluator(vec![
            variable("a", Some(Expression::reference("var.b")), false),
            variable("b", Some(Expression::reference("local.c")), false),
            Block::new("locals").attribute(Attribute::new("c", Expression::reference("var.a"))),
        ]);

        let err = ev
            .evaluate(&Expression::reference("var.a"), WantType::Any)
            .expect_err("cycle");
        assert!(matches!(
            err,
            EvalError::Cycle { ref chain, .. } if chain == "var.a -> var.b -> local.c -> var.a"
        ));
    }

    #[test]
    fn shared_variable_default_is_not_a_cycle() {
        let ev = evaluator(vec![
            variable("base", Some(Expression::literal(json!({"Owner": "me"}))), false),
            Block::new("locals")
                .attribute(Attribute::new("a", Expression::reference("var.base")))
                .attribute(Attribute::new(
                    "b",
                    Expression::call(
                        "merge",
                        vec![Expression::reference("local.a"), Expression::reference("var.base")],
                    ),
                )),
        ]);

        assert_eq!(
            eval(&ev, &Expression::reference("local.b.Owner")),
            Value::from("me")
        );
    }

    #[test]
    fn resource_references_are_unknown() {
        let ev = evaluator(Vec::new());
        assert_eq!(
            eval(&ev, &Expression::reference("aws_s3_bucket.a.id")),
            Value::Unknown
        );
        assert_eq!(eval(&ev, &Expression::reference("each.key")), Value::Unknown);
    }

    #[test]
    fn object_keys_keep_opaque_states() {
        let ev = evaluator(Vec::new());
        let expr = Expression::object([
            (Expression::literal("Name"), Expression::literal("x")),
            (Expression::reference("each.key"), Expression::literal("y")),
            (Expression::literal(7), Expression::literal("z")),
        ]);

        let Value::Map(entries) = eval(&ev, &expr) else {
            panic!("expected map");
        };
        let keys: Vec<Value> = entries.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, [Value::from("Name"), Value::Unknown, Value::from("7")]);
    }

    #[test]
    fn merge_combines_and_overrides() {
        let ev = evaluator(Vec::new());
        let expr = Expression::call(
            "merge",
            vec![
                Expression::string_map([("A", "1"), ("B", "2")]),
                Expression::literal(serde_json::Value::Null),
                Expression::string_map([("B", "3")]),
            ],
        );

        let merged = eval(&ev, &expr);
        assert_eq!(merged.get("A"), Some(&Value::from("1")));
        assert_eq!(merged.get("B"), Some(&Value::from("3")));
        let Value::Map(entries) = merged else {
            panic!("expected map");
        };
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn merge_with_unknown_is_unknown() {
        let ev = evaluator(vec![variable("extra", None, false)]);
        let expr = Expression::call(
            "merge",
            vec![
                Expression::string_map([("A", "1")]),
                Expression::reference("var.extra"),
            ],
        );
        assert_eq!(eval(&ev, &expr), Value::Unknown);
    }

    #[test]
    fn merge_propagates_sensitivity() {
        let ev = evaluator(Vec::new());
        let expr = Expression::call(
            "merge",
            vec![Expression::call(
                "sensitive",
                vec![Expression::string_map([("A", "1")])],
            )],
        );
        assert!(eval(&ev, &expr).is_sensitive());
    }

    #[test]
    fn unknown_function_is_an_error() {
        let ev = evaluator(Vec::new());
        let err = ev
            .evaluate(&Expression::call("lookup", Vec::new()), WantType::Any)
            .expect_err("unknown function");
        assert!(matches!(err, EvalError::UnknownFunction { ref name, .. } if name == "lookup"));
    }

    #[test]
    fn want_string_converts_primitives_and_rejects_maps() {
        let ev = evaluator(Vec::new());
        assert_eq!(
            ev.evaluate(&Expression::literal(12), WantType::String),
            Ok(Value::from("12"))
        );
        assert!(matches!(
            ev.evaluate(&Expression::string_map([("A", "1")]), WantType::String),
            Err(EvalError::TypeMismatch { expected: "string", found: "map", .. })
        ));
    }
}
