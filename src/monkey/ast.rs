use crate::monkey::token::{Position, Token};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn token_literal(&self) -> &str {
        match self.statements.first() {
            Some(stmt) => stmt.token_literal(),
            None => "",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub token: Token,
    pub value: String,
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStmt {
    pub token: Token,
    pub statements: Vec<Stmt>,
}

impl fmt::Display for BlockStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for stmt in &self.statements {
            write!(f, "{} ", stmt)?;
        }
        write!(f, "}}")
    }
}

// One hash-literal entry, `key : value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub token: Token,
    pub key: Expr,
    pub value: Expr,
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Let {
        token: Token,
        name: Ident,
        value: Expr,
    },
    Return {
        token: Token,
        value: Option<Expr>,
    },
    Expression {
        token: Token,
        expression: Expr,
    },
    Import {
        token: Token,
        module: String,
    },
}

impl Stmt {
    pub fn token(&self) -> &Token {
        match self {
            Stmt::Let { token, .. }
            | Stmt::Return { token, .. }
            | Stmt::Expression { token, .. }
            | Stmt::Import { token, .. } => token,
        }
    }

    pub fn token_literal(&self) -> &str {
        &self.token().literal
    }

    pub fn position(&self) -> Position {
        self.token().position
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, value, .. } => write!(f, "let {} = {};", name, value),
            Stmt::Return { value: Some(v), .. } => write!(f, "return {};", v),
            Stmt::Return { value: None, .. } => write!(f, "return;"),
            Stmt::Expression { expression, .. } => write!(f, "{}", expression),
            Stmt::Import { module, .. } => write!(f, "import {};", module),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Identifier(Ident),
    Integer {
        token: Token,
        value: i64,
    },
    Boolean {
        token: Token,
        value: bool,
    },
    Null {
        token: Token,
    },
    Str {
        token: Token,
        value: String,
    },
    Array {
        token: Token,
        elements: Vec<Expr>,
    },
    Hash {
        token: Token,
        pairs: Vec<Pair>,
    },
    Prefix {
        token: Token,
        operator: String,
        right: Box<Expr>,
    },
    Infix {
        token: Token,
        operator: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        token: Token,
        condition: Box<Expr>,
        consequence: BlockStmt,
        alternative: Option<BlockStmt>,
    },
    Function {
        token: Token,
        parameters: Vec<Ident>,
        body: BlockStmt,
    },
    Call {
        token: Token,
        function: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Index {
        token: Token,
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Visit {
        token: Token,
        left: Box<Expr>,
        right: Ident,
    },
}

impl Expr {
    pub fn token(&self) -> &Token {
        match self {
            Expr::Identifier(ident) => &ident.token,
            Expr::Integer { token, .. }
            | Expr::Boolean { token, .. }
            | Expr::Null { token }
            | Expr::Str { token, .. }
            | Expr::Array { token, .. }
            | Expr::Hash { token, .. }
            | Expr::Prefix { token, .. }
            | Expr::Infix { token, .. }
            | Expr::If { token, .. }
            | Expr::Function { token, .. }
            | Expr::Call { token, .. }
            | Expr::Index { token, .. }
            | Expr::Visit { token, .. } => token,
        }
    }

    pub fn token_literal(&self) -> &str {
        &self.token().literal
    }

    pub fn position(&self) -> Position {
        self.token().position
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(ident) => write!(f, "{}", ident),
            Expr::Integer { value, .. } => write!(f, "{}", value),
            Expr::Boolean { value, .. } => write!(f, "{}", value),
            Expr::Null { .. } => write!(f, "null"),
            Expr::Str { value, .. } => write!(f, "\"{}\"", value),
            Expr::Array { elements, .. } => write!(f, "[{}]", join(elements, ", ")),
            Expr::Hash { pairs, .. } => write!(f, "{{{}}}", join(pairs, ", ")),
            Expr::Prefix {
                operator, right, ..
            } => write!(f, "({}{})", operator, right),
            Expr::Infix {
                operator,
                left,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expr::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " else {}", alt)?;
                }
                Ok(())
            }
            Expr::Function {
                parameters, body, ..
            } => write!(f, "fn({}) {}", join(parameters, ", "), body),
            Expr::Call {
                function,
                arguments,
                ..
            } => write!(f, "{}({})", function, join(arguments, ", ")),
            Expr::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
            Expr::Visit { left, right, .. } => write!(f, "({}->{})", left, right),
        }
    }
}

fn join(items: &[impl fmt::Display], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<String>>()
        .join(separator)
}
