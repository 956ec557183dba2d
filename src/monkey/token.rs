use phf::phf_map;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Illegal,
    Eof,

    // Literals
    Identifier,
    Integer,
    Str,

    // Operators
    Equal,
    Plus,
    Minus,
    Bang,
    Star,
    Slash,
    Less,
    Greater,
    EqualEqual,
    BangEqual,
    Colon,
    Arrow,

    // Delimiters
    Comma,
    Semicolon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    // Keywords
    Function,
    Let,
    If,
    Else,
    Return,
    True,
    False,
    Null,
    Import,
}

pub static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "fn" => TokenType::Function,
    "let" => TokenType::Let,
    "if" => TokenType::If,
    "else" => TokenType::Else,
    "return" => TokenType::Return,
    "true" => TokenType::True,
    "false" => TokenType::False,
    "null" => TokenType::Null,
    "import" => TokenType::Import,
};

pub fn lookup_ident(literal: &str) -> TokenType {
    match KEYWORDS.get(literal).copied() {
        Some(t) => t,
        None => TokenType::Identifier,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub position: Position,
}

impl Token {
    pub fn new(token_type: TokenType, literal: impl Into<String>, position: Position) -> Self {
        Token {
            token_type,
            literal: literal.into(),
            position,
        }
    }
}

impl Default for Token {
    fn default() -> Self {
        Token {
            token_type: TokenType::Eof,
            literal: String::new(),
            position: Position::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_resolve_to_keyword_tokens() {
        for (literal, expected) in KEYWORDS.entries() {
            assert_eq!(&lookup_ident(literal), expected);
        }
    }

    #[test]
    fn test_non_keywords_resolve_to_identifiers() {
        for literal in ["foobar", "x", "lets", "functions", "_private"] {
            assert_eq!(lookup_ident(literal), TokenType::Identifier);
        }
    }
}
