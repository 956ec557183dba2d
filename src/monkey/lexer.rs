use crate::monkey::token::{lookup_ident, Position, Token, TokenType};
use std::iter::Peekable;
use std::str::Chars;
use tracing::{debug, error, instrument};

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
            column: 0,
        }
    }

    fn advance(&mut self) -> Option<char> {
        match self.chars.next() {
            Some(c) => {
                if c == '\n' {
                    self.line += 1;
                    self.column = 0;
                } else {
                    self.column += 1;
                }
                Some(c)
            }
            None => None,
        }
    }

    fn peek_match(&mut self, val: char) -> bool {
        match self.chars.peek() {
            Some(c) => val == *c,
            None => false,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    // Pull interface: one token per call, Eof forever once the source is consumed.
    #[instrument(skip(self))]
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            let c = match self.advance() {
                Some(c) => c,
                None => {
                    return Token::new(
                        TokenType::Eof,
                        "",
                        Position::new(self.line, self.column),
                    )
                }
            };
            let position = Position::new(self.line, self.column);

            let token = match c {
                '=' => {
                    if self.peek_match('=') {
                        Token::new(TokenType::EqualEqual, self.advance_pair(c), position)
                    } else {
                        Token::new(TokenType::Equal, c, position)
                    }
                }
                '+' => Token::new(TokenType::Plus, c, position),
                '-' => {
                    if self.peek_match('>') {
                        Token::new(TokenType::Arrow, self.advance_pair(c), position)
                    } else {
                        Token::new(TokenType::Minus, c, position)
                    }
                }
                '!' => {
                    if self.peek_match('=') {
                        Token::new(TokenType::BangEqual, self.advance_pair(c), position)
                    } else {
                        Token::new(TokenType::Bang, c, position)
                    }
                }
                '*' => Token::new(TokenType::Star, c, position),
                '/' => {
                    if self.peek_match('/') {
                        self.consume_until('\n');
                        continue;
                    }
                    Token::new(TokenType::Slash, c, position)
                }
                '<' => Token::new(TokenType::Less, c, position),
                '>' => Token::new(TokenType::Greater, c, position),
                ':' => Token::new(TokenType::Colon, c, position),
                ',' => Token::new(TokenType::Comma, c, position),
                ';' => Token::new(TokenType::Semicolon, c, position),
                '(' => Token::new(TokenType::LeftParen, c, position),
                ')' => Token::new(TokenType::RightParen, c, position),
                '{' => Token::new(TokenType::LeftBrace, c, position),
                '}' => Token::new(TokenType::RightBrace, c, position),
                '[' => Token::new(TokenType::LeftBracket, c, position),
                ']' => Token::new(TokenType::RightBracket, c, position),
                '"' => Token::new(TokenType::Str, self.consume_string(), position),
                c if is_numeric(c) => {
                    Token::new(TokenType::Integer, self.consume_numeric(c), position)
                }
                c if is_alpha(c) => {
                    let literal = self.consume_identifier(c);
                    Token::new(lookup_ident(&literal), literal, position)
                }
                c => {
                    error!(character = %c, %position, "unknown character");
                    Token::new(TokenType::Illegal, c, position)
                }
            };
            debug!(?token.token_type, token.literal = token.literal.as_str());
            return token;
        }
    }

    fn advance_pair(&mut self, first: char) -> String {
        // Guarded by peek_match at every call site.
        match self.advance() {
            Some(second) => String::from_iter([first, second]),
            None => String::from(first),
        }
    }

    fn consume_until(&mut self, breaker: char) -> String {
        let mut content: Vec<char> = Vec::new();
        while let Some(c) = self.chars.peek() {
            if *c == breaker {
                break;
            }
            // Should not fail, guarded by peek().
            content.push(self.advance().unwrap());
        }
        String::from_iter(content)
    }

    fn consume_string(&mut self) -> String {
        let content = self.consume_until('"');
        // Also consume the closing double-quote.
        let _ = self.advance();
        content
    }

    fn consume_numeric(&mut self, first_char: char) -> String {
        let mut content: Vec<char> = vec![first_char];
        while let Some(c) = self.chars.peek() {
            if !is_numeric(*c) {
                break;
            }
            content.push(self.advance().unwrap());
        }
        String::from_iter(content)
    }

    fn consume_identifier(&mut self, first_char: char) -> String {
        let mut content: Vec<char> = vec![first_char];
        while let Some(c) = self.chars.peek() {
            if !is_alpha_numeric(*c) {
                break;
            }
            content.push(self.advance().unwrap());
        }
        String::from_iter(content)
    }
}

fn is_numeric(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alpha_numeric(c: char) -> bool {
    is_alpha(c) || is_numeric(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monkey::token::KEYWORDS;

    fn collect_tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.token_type == TokenType::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    #[test]
    fn test_single_and_double_char_tokens() {
        let token_types = [
            ("=", TokenType::Equal),
            ("==", TokenType::EqualEqual),
            ("+", TokenType::Plus),
            ("-", TokenType::Minus),
            ("->", TokenType::Arrow),
            ("!", TokenType::Bang),
            ("!=", TokenType::BangEqual),
            ("*", TokenType::Star),
            ("/", TokenType::Slash),
            ("<", TokenType::Less),
            (">", TokenType::Greater),
            (":", TokenType::Colon),
            (",", TokenType::Comma),
            (";", TokenType::Semicolon),
            ("(", TokenType::LeftParen),
            (")", TokenType::RightParen),
            ("{", TokenType::LeftBrace),
            ("}", TokenType::RightBrace),
            ("[", TokenType::LeftBracket),
            ("]", TokenType::RightBracket),
        ];
        let token_soup = token_types
            .iter()
            .map(|(l, _)| *l)
            .collect::<Vec<&str>>()
            .join(" ");

        let tokens = collect_tokens(&token_soup);
        for (i, (lexeme, ttype)) in token_types.iter().enumerate() {
            assert_eq!(*lexeme, tokens[i].literal);
            assert_eq!(*ttype, tokens[i].token_type);
        }
        assert_eq!(tokens[token_types.len()].token_type, TokenType::Eof);
    }

    #[test]
    fn test_keywords_are_identified() {
        let keyword_soup = KEYWORDS
            .keys()
            .map(|k| &**k)
            .collect::<Vec<&str>>()
            .join(" ");

        let tokens = collect_tokens(&keyword_soup);
        for token in tokens.iter().take(KEYWORDS.len()) {
            let expected = KEYWORDS.get(token.literal.as_str()).copied();
            assert_eq!(Some(token.token_type), expected);
        }
    }

    #[test]
    fn test_identifiers_and_integers() {
        let tokens = collect_tokens("let answer = 42;");
        let expected = [
            (TokenType::Let, "let"),
            (TokenType::Identifier, "answer"),
            (TokenType::Equal, "="),
            (TokenType::Integer, "42"),
            (TokenType::Semicolon, ";"),
            (TokenType::Eof, ""),
        ];
        for (token, (ttype, literal)) in tokens.iter().zip(expected) {
            assert_eq!(token.token_type, ttype);
            assert_eq!(token.literal, literal);
        }
    }

    #[test]
    fn test_string_literal() {
        let tokens = collect_tokens("\"This is a string.\"");
        assert_eq!(tokens[0].token_type, TokenType::Str);
        assert_eq!(tokens[0].literal, "This is a string.");
    }

    #[test]
    fn test_unterminated_string_stops_at_end_of_input() {
        let tokens = collect_tokens("\"dangling");
        assert_eq!(tokens[0].token_type, TokenType::Str);
        assert_eq!(tokens[0].literal, "dangling");
        assert_eq!(tokens[1].token_type, TokenType::Eof);
    }

    #[test]
    fn test_positions_track_lines_and_columns() {
        let tokens = collect_tokens("let x = 5;\nx");
        assert_eq!(tokens[0].position, Position::new(1, 1)); // let
        assert_eq!(tokens[1].position, Position::new(1, 5)); // x
        assert_eq!(tokens[2].position, Position::new(1, 7)); // =
        assert_eq!(tokens[3].position, Position::new(1, 9)); // 5
        assert_eq!(tokens[4].position, Position::new(1, 10)); // ;
        assert_eq!(tokens[5].position, Position::new(2, 1)); // x
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = collect_tokens("1 // trailing words\n// a full line\n2");
        assert_eq!(tokens[0].literal, "1");
        assert_eq!(tokens[1].literal, "2");
        assert_eq!(tokens[2].token_type, TokenType::Eof);
    }

    #[test]
    fn test_unknown_character_is_illegal() {
        let tokens = collect_tokens("@");
        assert_eq!(tokens[0].token_type, TokenType::Illegal);
        assert_eq!(tokens[0].literal, "@");
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut lexer = Lexer::new("1");
        assert_eq!(lexer.next_token().token_type, TokenType::Integer);
        assert_eq!(lexer.next_token().token_type, TokenType::Eof);
        assert_eq!(lexer.next_token().token_type, TokenType::Eof);
    }
}
