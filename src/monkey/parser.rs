use crate::monkey::ast::{BlockStmt, Expr, Ident, Pair, Program, Stmt};
use crate::monkey::lexer::Lexer;
use crate::monkey::token::{Position, Token, TokenType};
use std::mem;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{position}: {message}")]
pub struct ParserError {
    pub position: Position,
    pub message: String,
}

// Infix binding strength, loosest first. Deriving Ord makes the ladder the
// comparison used by parse_expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(token_type: TokenType) -> Precedence {
    match token_type {
        TokenType::EqualEqual | TokenType::BangEqual => Precedence::Equals,
        TokenType::Less | TokenType::Greater => Precedence::LessGreater,
        TokenType::Plus | TokenType::Minus => Precedence::Sum,
        TokenType::Star | TokenType::Slash => Precedence::Product,
        TokenType::LeftParen => Precedence::Call,
        TokenType::LeftBracket | TokenType::Arrow => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParserError>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        let mut parser = Parser {
            lexer,
            cur_token: Token::default(),
            peek_token: Token::default(),
            errors: Vec::new(),
        };
        // Fill the two-token window.
        parser.next_token();
        parser.next_token();
        parser
    }

    // Never fails; syntax problems are accumulated as diagnostics and the
    // parser resumes at the next statement boundary.
    pub fn parse_program(&mut self) -> (Program, Vec<ParserError>) {
        let mut program = Program::default();
        while self.cur_token.token_type != TokenType::Eof {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }
        (program, mem::take(&mut self.errors))
    }

    fn next_token(&mut self) {
        self.cur_token = mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    fn record_error(&mut self, message: String) {
        self.errors.push(ParserError {
            position: self.cur_token.position,
            message,
        });
    }

    fn expect_peek(&mut self, expected: TokenType) -> bool {
        if self.peek_token.token_type == expected {
            self.next_token();
            true
        } else {
            self.record_error(format!(
                "expected next token to be {:?}, got {:?} instead",
                expected, self.peek_token.token_type
            ));
            false
        }
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur_token.token_type {
            TokenType::Let => self.parse_let_statement(),
            TokenType::Return => self.parse_return_statement(),
            TokenType::Import => self.parse_import_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::Identifier) {
            return None;
        }
        let name = self.parse_identifier();
        if !self.expect_peek(TokenType::Equal) {
            return None;
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.consume_optional_semicolon();
        Some(Stmt::Let { token, name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        let value = match self.peek_token.token_type {
            // A bare `return` yields null.
            TokenType::Semicolon | TokenType::RightBrace | TokenType::Eof => None,
            _ => {
                self.next_token();
                Some(self.parse_expression(Precedence::Lowest)?)
            }
        };
        self.consume_optional_semicolon();
        Some(Stmt::Return { token, value })
    }

    fn parse_import_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::Identifier) {
            return None;
        }
        let module = self.cur_token.literal.clone();
        self.consume_optional_semicolon();
        Some(Stmt::Import { token, module })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let token = self.cur_token.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.consume_optional_semicolon();
        Some(Stmt::Expression { token, expression })
    }

    fn consume_optional_semicolon(&mut self) {
        if self.peek_token.token_type == TokenType::Semicolon {
            self.next_token();
        }
    }

    // Pratt core: a prefix rule produces the seed expression, then infix
    // rules fold onto it while the upcoming operator binds tighter than the
    // caller's threshold.
    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while self.peek_token.token_type != TokenType::Semicolon
            && precedence < precedence_of(self.peek_token.token_type)
        {
            left = match self.peek_token.token_type {
                TokenType::Plus
                | TokenType::Minus
                | TokenType::Star
                | TokenType::Slash
                | TokenType::EqualEqual
                | TokenType::BangEqual
                | TokenType::Less
                | TokenType::Greater => {
                    self.next_token();
                    self.parse_infix_expression(left)?
                }
                TokenType::LeftParen => {
                    self.next_token();
                    self.parse_call_expression(left)?
                }
                TokenType::LeftBracket => {
                    self.next_token();
                    self.parse_index_expression(left)?
                }
                TokenType::Arrow => {
                    self.next_token();
                    self.parse_visit_expression(left)?
                }
                _ => return Some(left),
            };
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur_token.token_type {
            TokenType::Identifier => Some(Expr::Identifier(self.parse_identifier())),
            TokenType::Integer => self.parse_integer_literal(),
            TokenType::Str => Some(Expr::Str {
                token: self.cur_token.clone(),
                value: self.cur_token.literal.clone(),
            }),
            TokenType::True | TokenType::False => Some(Expr::Boolean {
                token: self.cur_token.clone(),
                value: self.cur_token.token_type == TokenType::True,
            }),
            TokenType::Null => Some(Expr::Null {
                token: self.cur_token.clone(),
            }),
            TokenType::Bang | TokenType::Minus => self.parse_prefix_expression(),
            TokenType::LeftParen => self.parse_grouped_expression(),
            TokenType::If => self.parse_if_expression(),
            TokenType::Function => self.parse_function_literal(),
            TokenType::LeftBracket => self.parse_array_literal(),
            TokenType::LeftBrace => self.parse_hash_literal(),
            other => {
                self.record_error(format!("no prefix parse rule for {:?}", other));
                None
            }
        }
    }

    fn parse_identifier(&mut self) -> Ident {
        Ident {
            token: self.cur_token.clone(),
            value: self.cur_token.literal.clone(),
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        match token.literal.parse::<i64>() {
            Ok(value) => Some(Expr::Integer { token, value }),
            Err(_) => {
                self.record_error(format!("could not parse {} as integer", token.literal));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let operator = token.literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix {
            token,
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        let operator = token.literal.clone();
        let precedence = precedence_of(token.token_type);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix {
            token,
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::RightParen) {
            return None;
        }
        Some(expression)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::LeftParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::RightParen) {
            return None;
        }
        if !self.expect_peek(TokenType::LeftBrace) {
            return None;
        }
        let consequence = self.parse_block_statement();

        let alternative = if self.peek_token.token_type == TokenType::Else {
            self.next_token();
            if !self.expect_peek(TokenType::LeftBrace) {
                return None;
            }
            Some(self.parse_block_statement())
        } else {
            None
        };

        Some(Expr::If {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_block_statement(&mut self) -> BlockStmt {
        let token = self.cur_token.clone();
        let mut statements = Vec::new();
        self.next_token();
        while self.cur_token.token_type != TokenType::RightBrace
            && self.cur_token.token_type != TokenType::Eof
        {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        BlockStmt { token, statements }
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        if !self.expect_peek(TokenType::LeftParen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;
        if !self.expect_peek(TokenType::LeftBrace) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Expr::Function {
            token,
            parameters,
            body,
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Ident>> {
        let list = self.parse_expression_list(TokenType::Comma, TokenType::RightParen)?;
        let mut parameters = Vec::with_capacity(list.len());
        for expr in list {
            match expr {
                Expr::Identifier(ident) => parameters.push(ident),
                other => {
                    self.record_error(format!(
                        "function parameters must be identifiers, got {}",
                        other
                    ));
                    return None;
                }
            }
        }
        Some(parameters)
    }

    // Shared by grouping, arrays, call arguments and parameter lists.
    fn parse_expression_list(
        &mut self,
        separator: TokenType,
        end: TokenType,
    ) -> Option<Vec<Expr>> {
        self.next_token();
        let mut list = Vec::new();

        if self.cur_token.token_type == end {
            return Some(list);
        }
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_token.token_type == separator {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn parse_call_expression(&mut self, function: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        let arguments = self.parse_expression_list(TokenType::Comma, TokenType::RightParen)?;
        Some(Expr::Call {
            token,
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let elements = self.parse_expression_list(TokenType::Comma, TokenType::RightBracket)?;
        Some(Expr::Array { token, elements })
    }

    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::RightBracket) {
            return None;
        }
        Some(Expr::Index {
            token,
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let token = self.cur_token.clone();
        let mut pairs = Vec::new();

        while self.peek_token.token_type != TokenType::RightBrace {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            if self.peek_token.token_type != TokenType::Colon {
                // Abort this literal only; the statement loop resumes.
                self.record_error("expected ':' after hash key".to_owned());
                break;
            }
            self.next_token();
            pairs.push(self.parse_pair(key)?);
            if self.peek_token.token_type != TokenType::RightBrace
                && !self.expect_peek(TokenType::Comma)
            {
                break;
            }
        }

        if !self.expect_peek(TokenType::RightBrace) {
            return None;
        }
        Some(Expr::Hash { token, pairs })
    }

    fn parse_pair(&mut self, key: Expr) -> Option<Pair> {
        let token = self.cur_token.clone();
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Pair { token, key, value })
    }

    fn parse_visit_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur_token.clone();
        let precedence = precedence_of(token.token_type);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        match right {
            Expr::Identifier(ident) => Some(Expr::Visit {
                token,
                left: Box::new(left),
                right: ident,
            }),
            other => {
                self.record_error(format!(
                    "member access expects an identifier, got {}",
                    other
                ));
                None
            }
        }
    }
}
