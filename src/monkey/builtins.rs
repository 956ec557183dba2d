use crate::monkey::object::{Object, ObjectType};
use crate::monkey::token::Position;

// Builtins receive the position of the call site so their failures carry a
// source location like every other evaluation error.
pub type BuiltinFn = fn(Position, Vec<Object>) -> Object;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    func: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, position: Position, args: Vec<Object>) -> Object {
        (self.func)(position, args)
    }
}

pub fn lookup(name: &str) -> Option<Object> {
    let builtin = match name {
        "len" => Builtin {
            name: "len",
            func: len,
        },
        "first" => Builtin {
            name: "first",
            func: first,
        },
        "last" => Builtin {
            name: "last",
            func: last,
        },
        "rest" => Builtin {
            name: "rest",
            func: rest,
        },
        "push" => Builtin {
            name: "push",
            func: push,
        },
        "puts" => Builtin {
            name: "puts",
            func: puts,
        },
        "exit" => Builtin {
            name: "exit",
            func: exit,
        },
        _ => return None,
    };
    Some(Object::Builtin(builtin))
}

fn new_error(position: Position, message: String) -> Object {
    Object::Error { position, message }
}

fn wrong_arity(position: Position, got: usize, want: usize) -> Object {
    new_error(
        position,
        format!("wrong number of arguments. got={}, want={}", got, want),
    )
}

fn len(position: Position, args: Vec<Object>) -> Object {
    if args.len() != 1 {
        return wrong_arity(position, args.len(), 1);
    }
    match &args[0] {
        // Character count, not byte length.
        Object::Str(v) => Object::Integer(v.chars().count() as i64),
        Object::Array(elements) => Object::Integer(elements.len() as i64),
        other => new_error(
            position,
            format!("argument to `len` not supported, got {}", other.object_type()),
        ),
    }
}

fn first(position: Position, args: Vec<Object>) -> Object {
    if args.len() != 1 {
        return wrong_arity(position, args.len(), 1);
    }
    match &args[0] {
        Object::Array(elements) => match elements.first() {
            Some(element) => element.clone(),
            None => Object::Null,
        },
        other => new_error(
            position,
            format!(
                "argument to `first` must be {}, got {}",
                ObjectType::Array,
                other.object_type()
            ),
        ),
    }
}

fn last(position: Position, args: Vec<Object>) -> Object {
    if args.len() != 1 {
        return wrong_arity(position, args.len(), 1);
    }
    match &args[0] {
        Object::Array(elements) => match elements.last() {
            Some(element) => element.clone(),
            None => Object::Null,
        },
        other => new_error(
            position,
            format!(
                "argument to `last` must be {}, got {}",
                ObjectType::Array,
                other.object_type()
            ),
        ),
    }
}

fn rest(position: Position, args: Vec<Object>) -> Object {
    if args.len() != 1 {
        return wrong_arity(position, args.len(), 1);
    }
    match &args[0] {
        Object::Array(elements) => {
            if elements.is_empty() {
                Object::Null
            } else {
                Object::Array(elements[1..].to_vec())
            }
        }
        other => new_error(
            position,
            format!(
                "argument to `rest` must be {}, got {}",
                ObjectType::Array,
                other.object_type()
            ),
        ),
    }
}

fn push(position: Position, args: Vec<Object>) -> Object {
    if args.len() != 2 {
        return wrong_arity(position, args.len(), 2);
    }
    match &args[0] {
        Object::Array(elements) => {
            // Pure append: the result is a fresh array, the argument keeps
            // its elements.
            let mut appended = elements.clone();
            appended.push(args[1].clone());
            Object::Array(appended)
        }
        other => new_error(
            position,
            format!(
                "argument to `push` must be {}, got {}",
                ObjectType::Array,
                other.object_type()
            ),
        ),
    }
}

fn puts(_position: Position, args: Vec<Object>) -> Object {
    let line = args
        .iter()
        .map(Object::inspect)
        .collect::<Vec<String>>()
        .join(" ");
    println!("{}", line);
    Object::Null
}

fn exit(_position: Position, _args: Vec<Object>) -> Object {
    std::process::exit(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Object>) -> Object {
        match lookup(name) {
            Some(Object::Builtin(builtin)) => builtin.call(Position::default(), args),
            other => panic!("expected builtin `{}`, got {:?}", name, other),
        }
    }

    #[test]
    fn test_registry_contents() {
        for name in ["len", "first", "last", "rest", "push", "puts", "exit"] {
            assert!(lookup(name).is_some(), "missing builtin `{}`", name);
        }
        assert!(lookup("copyright").is_none());
        assert!(lookup("missing").is_none());
    }

    #[test]
    fn test_len_counts_characters_and_elements() {
        assert_eq!(
            call("len", vec![Object::Str("hello".to_owned())]),
            Object::Integer(5)
        );
        // 5 characters even though the accent makes it 6 bytes.
        assert_eq!(
            call("len", vec![Object::Str("héllo".to_owned())]),
            Object::Integer(5)
        );
        assert_eq!(
            call("len", vec![Object::Array(vec![Object::Integer(1)])]),
            Object::Integer(1)
        );
    }

    #[test]
    fn test_len_rejects_bad_arguments() {
        let result = call("len", vec![Object::Integer(1)]);
        assert_eq!(
            result,
            Object::Error {
                position: Position::default(),
                message: "argument to `len` not supported, got INTEGER".to_owned(),
            }
        );
        let result = call("len", vec![]);
        assert_eq!(
            result,
            Object::Error {
                position: Position::default(),
                message: "wrong number of arguments. got=0, want=1".to_owned(),
            }
        );
    }

    #[test]
    fn test_first_last_rest_on_empty_array_yield_null() {
        for name in ["first", "last", "rest"] {
            assert_eq!(call(name, vec![Object::Array(vec![])]), Object::Null);
        }
    }

    #[test]
    fn test_first_and_last_pick_the_ends() {
        let array = Object::Array(vec![Object::Integer(1), Object::Integer(2)]);
        assert_eq!(call("first", vec![array.clone()]), Object::Integer(1));
        assert_eq!(call("last", vec![array]), Object::Integer(2));
    }

    #[test]
    fn test_rest_drops_the_first_element() {
        let array = Object::Array(vec![Object::Integer(1), Object::Integer(2)]);
        assert_eq!(
            call("rest", vec![array]),
            Object::Array(vec![Object::Integer(2)])
        );
    }

    #[test]
    fn test_push_allocates_instead_of_mutating() {
        let original = Object::Array(vec![Object::Integer(1), Object::Integer(2)]);
        let pushed = call("push", vec![original.clone(), Object::Integer(3)]);
        assert_eq!(
            pushed,
            Object::Array(vec![
                Object::Integer(1),
                Object::Integer(2),
                Object::Integer(3)
            ])
        );
        assert_eq!(
            original,
            Object::Array(vec![Object::Integer(1), Object::Integer(2)])
        );
    }

    #[test]
    fn test_puts_returns_null() {
        assert_eq!(call("puts", vec![Object::Integer(1)]), Object::Null);
    }
}
