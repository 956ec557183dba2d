use crate::monkey::ast::{BlockStmt, Ident};
use crate::monkey::builtins::Builtin;
use crate::monkey::environment::Environment;
use crate::monkey::token::Position;
use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectType {
    Integer,
    Boolean,
    Null,
    Str,
    Array,
    Hash,
    Function,
    Builtin,
    Module,
    ReturnValue,
    Error,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Integer => "INTEGER",
            ObjectType::Boolean => "BOOLEAN",
            ObjectType::Null => "NULL",
            ObjectType::Str => "STRING",
            ObjectType::Array => "ARRAY",
            ObjectType::Hash => "HASH",
            ObjectType::Function => "FUNCTION",
            ObjectType::Builtin => "BUILTIN",
            ObjectType::Module => "MODULE",
            ObjectType::ReturnValue => "RETURN_VALUE",
            ObjectType::Error => "ERROR",
        };
        write!(f, "{}", name)
    }
}

// The (type, integer) pair a hashable value derives for map lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashKey {
    pub object_type: ObjectType,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

#[derive(Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Null,
    Str(String),
    Array(Vec<Object>),
    Hash(BTreeMap<HashKey, HashPair>),
    Function {
        parameters: Vec<Ident>,
        body: BlockStmt,
        env: Rc<RefCell<Environment>>,
    },
    Builtin(Builtin),
    Module {
        name: String,
        env: Rc<RefCell<Environment>>,
    },
    ReturnValue(Box<Object>),
    Error {
        position: Position,
        message: String,
    },
}

impl Object {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Object::Integer(_) => ObjectType::Integer,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::Null => ObjectType::Null,
            Object::Str(_) => ObjectType::Str,
            Object::Array(_) => ObjectType::Array,
            Object::Hash(_) => ObjectType::Hash,
            Object::Function { .. } => ObjectType::Function,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::Module { .. } => ObjectType::Module,
            Object::ReturnValue(_) => ObjectType::ReturnValue,
            Object::Error { .. } => ObjectType::Error,
        }
    }

    pub fn inspect(&self) -> String {
        match self {
            Object::Integer(v) => format!("{}", v),
            Object::Boolean(v) => format!("{}", v),
            Object::Null => "null".to_owned(),
            Object::Str(v) => format!("\"{}\"", v),
            Object::Array(elements) => {
                let rendered = elements
                    .iter()
                    .map(Object::inspect)
                    .collect::<Vec<String>>()
                    .join(", ");
                format!("[{}]", rendered)
            }
            Object::Hash(pairs) => {
                let rendered = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()))
                    .collect::<Vec<String>>()
                    .join(", ");
                format!("{{{}}}", rendered)
            }
            Object::Function { parameters, .. } => {
                let params = parameters
                    .iter()
                    .map(|p| p.value.clone())
                    .collect::<Vec<String>>()
                    .join(", ");
                format!("fn({}) {{ ... }}", params)
            }
            Object::Builtin(builtin) => format!("builtin function {}", builtin.name),
            Object::Module { name, .. } => format!("module {}", name),
            Object::ReturnValue(v) => v.inspect(),
            Object::Error { position, message } => {
                format!("RUNTIME ERROR: {}\n  {}", position, message)
            }
        }
    }

    // Only false and null are falsy; 0 and "" count as truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error { .. })
    }

    // The Hashable capability: Integer, Boolean and Str values derive a
    // stable key, everything else is rejected as a map key.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(v) => Some(HashKey {
                object_type: ObjectType::Integer,
                value: *v as u64,
            }),
            Object::Boolean(v) => Some(HashKey {
                object_type: ObjectType::Boolean,
                value: u64::from(*v),
            }),
            Object::Str(v) => {
                let mut hasher = DefaultHasher::new();
                v.hash(&mut hasher);
                Some(HashKey {
                    object_type: ObjectType::Str,
                    value: hasher.finish(),
                })
            }
            _ => None,
        }
    }
}

// Hand-written so closure environments stay out of the output; a function
// held by the environment it captured would otherwise recurse forever.
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(v) => f.debug_tuple("Integer").field(v).finish(),
            Object::Boolean(v) => f.debug_tuple("Boolean").field(v).finish(),
            Object::Null => write!(f, "Null"),
            Object::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Object::Array(elements) => f.debug_tuple("Array").field(elements).finish(),
            Object::Hash(pairs) => f.debug_tuple("Hash").field(pairs).finish(),
            Object::Function { parameters, .. } => f
                .debug_struct("Function")
                .field("parameters", parameters)
                .finish_non_exhaustive(),
            Object::Builtin(builtin) => f.debug_tuple("Builtin").field(&builtin.name).finish(),
            Object::Module { name, .. } => f
                .debug_struct("Module")
                .field("name", name)
                .finish_non_exhaustive(),
            Object::ReturnValue(v) => f.debug_tuple("ReturnValue").field(v).finish(),
            Object::Error { position, message } => f
                .debug_struct("Error")
                .field("position", position)
                .field("message", message)
                .finish(),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(l), Object::Integer(r)) => l == r,
            (Object::Boolean(l), Object::Boolean(r)) => l == r,
            (Object::Null, Object::Null) => true,
            (Object::Str(l), Object::Str(r)) => l == r,
            (Object::Array(l), Object::Array(r)) => l == r,
            (Object::Hash(l), Object::Hash(r)) => l == r,
            (
                Object::Function {
                    parameters: lp,
                    body: lb,
                    env: le,
                },
                Object::Function {
                    parameters: rp,
                    body: rb,
                    env: re,
                },
            ) => Rc::ptr_eq(le, re) && lp == rp && lb == rb,
            (Object::Builtin(l), Object::Builtin(r)) => l.name == r.name,
            (
                Object::Module { name: ln, env: le },
                Object::Module { name: rn, env: re },
            ) => ln == rn && Rc::ptr_eq(le, re),
            (Object::ReturnValue(l), Object::ReturnValue(r)) => l == r,
            (
                Object::Error {
                    position: lp,
                    message: lm,
                },
                Object::Error {
                    position: rp,
                    message: rm,
                },
            ) => lp == rp && lm == rm,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_and_boolean_keys_never_collide() {
        let one = Object::Integer(1).hash_key().unwrap();
        let yes = Object::Boolean(true).hash_key().unwrap();
        assert_eq!(one.value, yes.value);
        assert_ne!(one, yes);
    }

    #[test]
    fn test_equal_strings_share_a_hash_key() {
        let a = Object::Str("Hello World".to_owned()).hash_key().unwrap();
        let b = Object::Str("Hello World".to_owned()).hash_key().unwrap();
        let c = Object::Str("My name is johnny".to_owned())
            .hash_key()
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_only_scalars_are_hashable() {
        assert!(Object::Integer(7).hash_key().is_some());
        assert!(Object::Boolean(false).hash_key().is_some());
        assert!(Object::Str("k".to_owned()).hash_key().is_some());
        assert!(Object::Null.hash_key().is_none());
        assert!(Object::Array(vec![]).hash_key().is_none());
        assert!(Object::Hash(BTreeMap::new()).hash_key().is_none());
    }

    #[test]
    fn test_truthiness() {
        assert!(Object::Integer(0).is_truthy());
        assert!(Object::Str(String::new()).is_truthy());
        assert!(Object::Boolean(true).is_truthy());
        assert!(!Object::Boolean(false).is_truthy());
        assert!(!Object::Null.is_truthy());
    }

    #[test]
    fn test_inspect_rendering() {
        assert_eq!(Object::Integer(-3).inspect(), "-3");
        assert_eq!(Object::Boolean(true).inspect(), "true");
        assert_eq!(Object::Null.inspect(), "null");
        assert_eq!(Object::Str("hi".to_owned()).inspect(), "\"hi\"");
        let array = Object::Array(vec![Object::Integer(1), Object::Integer(2)]);
        assert_eq!(array.inspect(), "[1, 2]");
    }

    #[test]
    fn test_error_inspect_format() {
        let error = Object::Error {
            position: crate::monkey::token::Position::new(3, 14),
            message: "identifier not found: x".to_owned(),
        };
        assert_eq!(
            error.inspect(),
            "RUNTIME ERROR: line 3, column 14\n  identifier not found: x"
        );
    }

    #[test]
    fn test_hash_inspect_is_deterministic() {
        let mut pairs = BTreeMap::new();
        for (key, value) in [("b", 2), ("a", 1)] {
            let key_obj = Object::Str(key.to_owned());
            pairs.insert(
                key_obj.hash_key().unwrap(),
                HashPair {
                    key: key_obj,
                    value: Object::Integer(value),
                },
            );
        }
        let rendered = Object::Hash(pairs).inspect();
        assert!(rendered.starts_with('{') && rendered.ends_with('}'));
        assert!(rendered.contains("\"a\": 1"));
        assert!(rendered.contains("\"b\": 2"));
    }
}
