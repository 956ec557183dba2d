use crate::monkey::ast::{BlockStmt, Expr, Ident, Program, Stmt};
use crate::monkey::builtins;
use crate::monkey::environment::Environment;
use crate::monkey::lexer::Lexer;
use crate::monkey::object::{HashPair, Object, ObjectType};
use crate::monkey::parser::Parser;
use crate::monkey::token::{Position, Token};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

fn new_error(position: Position, message: String) -> Object {
    Object::Error { position, message }
}

// Top-level evaluation: a ReturnValue escaping the statement list is
// unwrapped here, an Error aborts the rest of the program.
pub fn eval_program(program: &Program, env: &Rc<RefCell<Environment>>) -> Object {
    let mut result = Object::Null;
    for stmt in &program.statements {
        match eval_statement(stmt, env) {
            Object::ReturnValue(value) => return *value,
            err @ Object::Error { .. } => return err,
            other => result = other,
        }
    }
    result
}

// Inside a block a ReturnValue stays wrapped so it can unwind through
// nested blocks before the enclosing call unwraps it.
fn eval_block_statement(block: &BlockStmt, env: &Rc<RefCell<Environment>>) -> Object {
    let mut result = Object::Null;
    for stmt in &block.statements {
        match eval_statement(stmt, env) {
            stop @ (Object::ReturnValue(_) | Object::Error { .. }) => return stop,
            other => result = other,
        }
    }
    result
}

fn eval_statement(stmt: &Stmt, env: &Rc<RefCell<Environment>>) -> Object {
    match stmt {
        Stmt::Expression { expression, .. } => eval_expression(expression, env),
        Stmt::Let { name, value, .. } => {
            let evaluated = eval_expression(value, env);
            if evaluated.is_error() {
                return evaluated;
            }
            env.borrow_mut().set(name.value.clone(), evaluated);
            Object::Null
        }
        Stmt::Return { value, .. } => {
            let evaluated = match value {
                Some(expr) => eval_expression(expr, env),
                None => Object::Null,
            };
            if evaluated.is_error() {
                return evaluated;
            }
            Object::ReturnValue(Box::new(evaluated))
        }
        Stmt::Import { module, .. } => eval_import_statement(stmt.position(), module, env),
    }
}

fn eval_expression(expr: &Expr, env: &Rc<RefCell<Environment>>) -> Object {
    match expr {
        Expr::Integer { value, .. } => Object::Integer(*value),
        Expr::Boolean { value, .. } => Object::Boolean(*value),
        Expr::Null { .. } => Object::Null,
        Expr::Str { value, .. } => Object::Str(value.clone()),
        Expr::Identifier(ident) => eval_identifier(ident, env),
        Expr::Prefix {
            token,
            operator,
            right,
        } => {
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_prefix_expression(operator, right, token.position)
        }
        Expr::Infix {
            token,
            operator,
            left,
            right,
        } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_infix_expression(left, operator, right, token.position)
        }
        Expr::If {
            condition,
            consequence,
            alternative,
            ..
        } => {
            let condition = eval_expression(condition, env);
            if condition.is_error() {
                return condition;
            }
            if condition.is_truthy() {
                eval_block_statement(consequence, env)
            } else {
                match alternative {
                    Some(alt) => eval_block_statement(alt, env),
                    None => Object::Null,
                }
            }
        }
        // Capturing the current environment is what makes closures work;
        // this step itself can never fail.
        Expr::Function {
            parameters, body, ..
        } => Object::Function {
            parameters: parameters.clone(),
            body: body.clone(),
            env: Rc::clone(env),
        },
        Expr::Call {
            token,
            function,
            arguments,
        } => eval_call_expression(token, function, arguments, env),
        Expr::Array { elements, .. } => match eval_expressions(elements, env) {
            Ok(elements) => Object::Array(elements),
            Err(err) => err,
        },
        Expr::Index { token, left, index } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let index = eval_expression(index, env);
            if index.is_error() {
                return index;
            }
            eval_index_expression(left, index, token.position)
        }
        Expr::Hash { pairs, .. } => {
            let mut map = BTreeMap::new();
            for pair in pairs {
                let key = eval_expression(&pair.key, env);
                if key.is_error() {
                    return key;
                }
                let hash_key = match key.hash_key() {
                    Some(hash_key) => hash_key,
                    None => {
                        return new_error(
                            pair.token.position,
                            format!("{} is not hashable", key.object_type()),
                        )
                    }
                };
                let value = eval_expression(&pair.value, env);
                if value.is_error() {
                    return value;
                }
                // Last write wins for duplicate keys.
                map.insert(hash_key, HashPair { key, value });
            }
            Object::Hash(map)
        }
        Expr::Visit { left, right, .. } => {
            let left = eval_expression(left, env);
            match left {
                err @ Object::Error { .. } => err,
                Object::Module { name, env } => match env.borrow().get(&right.value) {
                    Some(value) => value,
                    None => new_error(
                        expr.position(),
                        format!("identifier not found at {}: {}", name, right.value),
                    ),
                },
                other => new_error(
                    expr.position(),
                    format!("visit operator not supported: {}", other.object_type()),
                ),
            }
        }
    }
}

fn eval_identifier(ident: &Ident, env: &Rc<RefCell<Environment>>) -> Object {
    if let Some(value) = env.borrow().get(&ident.value) {
        return value;
    }
    match builtins::lookup(&ident.value) {
        Some(value) => value,
        None => new_error(
            ident.token.position,
            format!("identifier not found: {}", ident.value),
        ),
    }
}

fn eval_prefix_expression(operator: &str, right: Object, position: Position) -> Object {
    match operator {
        "!" => Object::Boolean(!right.is_truthy()),
        "-" => match right {
            Object::Integer(value) => Object::Integer(-value),
            other => new_error(
                position,
                format!("unknown operator: -{}", other.object_type()),
            ),
        },
        _ => new_error(
            position,
            format!("unknown operator: {}{}", operator, right.object_type()),
        ),
    }
}

// Dispatch on the pair of operand types; mismatched pairs are type errors,
// matched pairs with an unsupported operator are operator errors.
fn eval_infix_expression(left: Object, operator: &str, right: Object, position: Position) -> Object {
    match (left, right) {
        (Object::Integer(l), Object::Integer(r)) => {
            eval_integer_infix_expression(l, operator, r, position)
        }
        (Object::Boolean(l), Object::Boolean(r)) => {
            eval_boolean_infix_expression(l, operator, r, position)
        }
        (Object::Str(l), Object::Str(r)) => eval_string_infix_expression(&l, operator, &r, position),
        (l, r) => new_error(
            position,
            format!(
                "type mismatch: {} {} {}",
                l.object_type(),
                operator,
                r.object_type()
            ),
        ),
    }
}

fn eval_integer_infix_expression(
    left: i64,
    operator: &str,
    right: i64,
    position: Position,
) -> Object {
    match operator {
        "+" => Object::Integer(left + right),
        "-" => Object::Integer(left - right),
        "*" => Object::Integer(left * right),
        "/" => {
            if right == 0 {
                new_error(position, "division by zero".to_owned())
            } else {
                // Truncates toward zero.
                Object::Integer(left / right)
            }
        }
        ">" => Object::Boolean(left > right),
        "<" => Object::Boolean(left < right),
        "==" => Object::Boolean(left == right),
        "!=" => Object::Boolean(left != right),
        _ => new_error(
            position,
            format!(
                "unknown operator: {} {} {}",
                ObjectType::Integer,
                operator,
                ObjectType::Integer
            ),
        ),
    }
}

fn eval_boolean_infix_expression(
    left: bool,
    operator: &str,
    right: bool,
    position: Position,
) -> Object {
    match operator {
        "==" => Object::Boolean(left == right),
        "!=" => Object::Boolean(left != right),
        _ => new_error(
            position,
            format!(
                "unknown operator: {} {} {}",
                ObjectType::Boolean,
                operator,
                ObjectType::Boolean
            ),
        ),
    }
}

fn eval_string_infix_expression(
    left: &str,
    operator: &str,
    right: &str,
    position: Position,
) -> Object {
    match operator {
        "+" => Object::Str(format!("{}{}", left, right)),
        _ => new_error(
            position,
            format!(
                "unknown operator: {} {} {}",
                ObjectType::Str,
                operator,
                ObjectType::Str
            ),
        ),
    }
}

fn eval_call_expression(
    token: &Token,
    function: &Expr,
    arguments: &[Expr],
    env: &Rc<RefCell<Environment>>,
) -> Object {
    let callee = eval_expression(function, env);
    if callee.is_error() {
        return callee;
    }
    match callee {
        Object::Function {
            parameters,
            body,
            env: fn_env,
        } => {
            let args = match eval_expressions(arguments, env) {
                Ok(args) => args,
                Err(err) => return err,
            };
            apply_function(&parameters, &body, &fn_env, args)
        }
        Object::Builtin(builtin) => {
            let args = match eval_expressions(arguments, env) {
                Ok(args) => args,
                Err(err) => return err,
            };
            builtin.call(token.position, args)
        }
        other => new_error(
            token.position,
            format!("not a function: {} is not callable", other.object_type()),
        ),
    }
}

// Left-to-right, stopping at the first error.
fn eval_expressions(
    exprs: &[Expr],
    env: &Rc<RefCell<Environment>>,
) -> Result<Vec<Object>, Object> {
    let mut result = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let evaluated = eval_expression(expr, env);
        if evaluated.is_error() {
            return Err(evaluated);
        }
        result.push(evaluated);
    }
    Ok(result)
}

// Parameters bind positionally into a child of the captured environment.
// Arity is deliberately lenient: extra arguments are dropped and missing
// ones leave the parameter unbound, surfacing later as a lookup failure.
fn apply_function(
    parameters: &[Ident],
    body: &BlockStmt,
    fn_env: &Rc<RefCell<Environment>>,
    args: Vec<Object>,
) -> Object {
    let call_env = Environment::new_enclosed(Rc::clone(fn_env));
    for (param, arg) in parameters.iter().zip(args) {
        call_env.borrow_mut().set(param.value.clone(), arg);
    }
    unwrap_return_value(eval_block_statement(body, &call_env))
}

fn unwrap_return_value(obj: Object) -> Object {
    match obj {
        Object::ReturnValue(value) => *value,
        other => other,
    }
}

fn eval_index_expression(left: Object, index: Object, position: Position) -> Object {
    match left {
        Object::Array(elements) => match index {
            Object::Integer(i) => {
                // Negative or past-the-end reads are "not found", not faults.
                match usize::try_from(i).ok().and_then(|i| elements.get(i)) {
                    Some(element) => element.clone(),
                    None => Object::Null,
                }
            }
            other => new_error(
                position,
                format!(
                    "array index must be {}, got {}",
                    ObjectType::Integer,
                    other.object_type()
                ),
            ),
        },
        Object::Hash(pairs) => match index.hash_key() {
            Some(key) => match pairs.get(&key) {
                Some(pair) => pair.value.clone(),
                None => Object::Null,
            },
            None => new_error(
                position,
                format!("{} is not hashable", index.object_type()),
            ),
        },
        other => new_error(
            position,
            format!("index operator not supported: {}", other.object_type()),
        ),
    }
}

// Modules evaluate into a fresh, outer-less environment: nothing from the
// importing scope leaks in, nothing leaks out except through `->`.
fn eval_import_statement(position: Position, module: &str, env: &Rc<RefCell<Environment>>) -> Object {
    let path = format!("{}.monkey", module);
    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(_) => {
            return new_error(
                position,
                format!("import error: cannot load '{}'", module),
            )
        }
    };
    debug!(module, path = path.as_str(), "loading module");

    let mut parser = Parser::new(Lexer::new(&source));
    let (program, errors) = parser.parse_program();
    if !errors.is_empty() {
        return new_error(
            position,
            format!("module '{}' has {} parse errors", module, errors.len()),
        );
    }

    let module_env = Environment::new();
    if let Object::Error { message, .. } = eval_program(&program, &module_env) {
        return new_error(
            position,
            format!("error evaluating module '{}': {}", module, message),
        );
    }

    env.borrow_mut().set(
        module.to_owned(),
        Object::Module {
            name: module.to_owned(),
            env: module_env,
        },
    );
    Object::Null
}
