//! Filter expression lexer - tokenizes input strings
//!
//! Converts filter expression strings into a stream of tokens. Backquoted
//! identifiers are scanned in their own mode so that property names may carry
//! characters (colons, spaces, dots) that plain identifiers cannot.

use crate::token::{Token, TokenType};

/// Number of characters shown in error fragments
const FRAGMENT_LEN: usize = 16;

/// The filter expression lexer
pub struct Lexer {
    position: usize,
    chars: Vec<char>,
    current_char: Option<char>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            position: 0,
            chars,
            current_char,
        }
    }

    /// Source text starting at `position`, truncated for diagnostics
    pub fn fragment_at(&self, position: usize) -> String {
        self.chars
            .iter()
            .skip(position)
            .take(FRAGMENT_LEN)
            .collect()
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.chars.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an unquoted identifier: `[A-Za-z_][A-Za-z0-9_]*`
    fn read_identifier(&mut self) -> String {
        let start_pos = self.position;

        while let Some(c) = self.current_char {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        self.chars[start_pos..self.position].iter().collect()
    }

    /// Read a backquoted identifier. Everything up to the closing backquote is
    /// taken verbatim; there are no escape sequences.
    fn read_delimited_identifier(&mut self) -> Result<String, String> {
        self.advance(); // Skip opening backquote

        let mut value = String::new();
        while let Some(c) = self.current_char {
            if c == '`' {
                self.advance();
                if value.is_empty() {
                    return Err("Empty backquoted identifier".into());
                }
                return Ok(value);
            }
            value.push(c);
            self.advance();
        }

        Err("Unterminated backquoted identifier".into())
    }

    /// Read a string literal delimited by `quote`. No escape processing.
    fn read_string(&mut self, quote: char) -> Result<String, String> {
        self.advance(); // Skip opening quote

        let mut value = String::new();
        while let Some(c) = self.current_char {
            if c == quote {
                self.advance();
                return Ok(value);
            }
            value.push(c);
            self.advance();
        }

        Err("Unterminated string literal".into())
    }

    /// Read an integer or a float with digits on both sides of the point.
    fn read_number(&mut self) -> Result<(String, TokenType), String> {
        let start_pos = self.position;
        if self.current_char == Some('-') {
            self.advance();
        }

        while matches!(self.current_char, Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        let mut token_type = TokenType::IntegerLiteral;
        if self.current_char == Some('.') {
            if !matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                return Err("Malformed numeric literal: expected a digit after '.'".into());
            }
            self.advance(); // Skip '.'
            while matches!(self.current_char, Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            token_type = TokenType::FloatLiteral;
        }

        Ok((
            self.chars[start_pos..self.position].iter().collect(),
            token_type,
        ))
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let position = self.position;
        let Some(c) = self.current_char else {
            return Token::eof(position);
        };

        let single = |lexer: &mut Lexer, token_type: TokenType| {
            lexer.advance();
            Token::new(token_type, c.to_string(), position)
        };

        match c {
            '(' => single(self, TokenType::OpenParen),
            ')' => single(self, TokenType::CloseParen),
            '=' => single(self, TokenType::Equal),
            '.' => {
                if matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                    Token::error(
                        "Malformed numeric literal: expected a digit before '.'".into(),
                        position,
                    )
                } else {
                    single(self, TokenType::Dot)
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.advance();
                    Token::new(TokenType::NotEqual, "!=".into(), position)
                } else {
                    Token::error("Unexpected '!' character".into(), position)
                }
            }
            '<' => match self.peek() {
                Some('=') => {
                    self.advance();
                    self.advance();
                    Token::new(TokenType::LessThanOrEqual, "<=".into(), position)
                }
                Some('>') => {
                    self.advance();
                    self.advance();
                    Token::new(TokenType::NotEqual, "<>".into(), position)
                }
                _ => single(self, TokenType::LessThan),
            },
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.advance();
                    Token::new(TokenType::GreaterThanOrEqual, ">=".into(), position)
                } else {
                    single(self, TokenType::GreaterThan)
                }
            }
            '\'' | '"' => match self.read_string(c) {
                Ok(value) => Token::new(TokenType::StringLiteral, value, position),
                Err(message) => Token::error(message, position),
            },
            '`' => match self.read_delimited_identifier() {
                Ok(value) => Token::new(TokenType::DelimitedIdentifier, value, position),
                Err(message) => Token::error(message, position),
            },
            _ if c.is_ascii_digit()
                || (c == '-' && matches!(self.peek(), Some(d) if d.is_ascii_digit())) =>
            {
                match self.read_number() {
                    Ok((value, token_type)) => Token::new(token_type, value, position),
                    Err(message) => Token::error(message, position),
                }
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let ident = self.read_identifier();
                let token_type = match ident.to_ascii_uppercase().as_str() {
                    "AND" => TokenType::And,
                    "OR" => TokenType::Or,
                    "NOT" => TokenType::Not,
                    "LIKE" => TokenType::Like,
                    _ => TokenType::Identifier,
                };
                Token::new(token_type, ident, position)
            }
            _ => Token::error(format!("Unexpected character: {}", c), position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = matches!(token.token_type, TokenType::Eof | TokenType::Error);
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn types(input: &str) -> Vec<TokenType> {
        tokenize(input).into_iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn test_identifiers() {
        let tokens = tokenize("type_id contexts_0 _x");
        assert_eq!(tokens[0].token_type, TokenType::Identifier);
        assert_eq!(tokens[0].value, "type_id");
        assert_eq!(tokens[1].value, "contexts_0");
        assert_eq!(tokens[2].value, "_x");
        assert_eq!(tokens[2].position, 19);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            types("and OR Not like"),
            vec![
                TokenType::And,
                TokenType::Or,
                TokenType::Not,
                TokenType::Like,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_delimited_identifier_keeps_interior_characters() {
        let tokens = tokenize("properties.`0:b c.d`.int_value");
        assert_eq!(tokens[2].token_type, TokenType::DelimitedIdentifier);
        assert_eq!(tokens[2].value, "0:b c.d");
        assert_eq!(tokens[4].value, "int_value");
    }

    #[test]
    fn test_delimited_identifier_errors() {
        assert_eq!(types("`abc").last(), Some(&TokenType::Error));
        assert_eq!(types("``").last(), Some(&TokenType::Error));
    }

    #[test]
    fn test_string_literals() {
        let tokens = tokenize("'foo%' \"bar\" 'it\\s'");
        assert_eq!(tokens[0].token_type, TokenType::StringLiteral);
        assert_eq!(tokens[0].value, "foo%");
        assert_eq!(tokens[1].value, "bar");
        assert_eq!(tokens[2].value, "it\\s");
        assert_eq!(types("'open").last(), Some(&TokenType::Error));
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("1 0.95 -3 -2.5");
        assert_eq!(tokens[0].token_type, TokenType::IntegerLiteral);
        assert_eq!(tokens[1].token_type, TokenType::FloatLiteral);
        assert_eq!(tokens[1].value, "0.95");
        assert_eq!(tokens[2].token_type, TokenType::IntegerLiteral);
        assert_eq!(tokens[2].value, "-3");
        assert_eq!(tokens[3].token_type, TokenType::FloatLiteral);
        assert_eq!(tokens[3].value, "-2.5");
    }

    #[test]
    fn test_malformed_numbers() {
        assert_eq!(types("1."), vec![TokenType::Error]);
        assert_eq!(types(".5"), vec![TokenType::Error]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            types("= != <> < <= > >= ( ) ."),
            vec![
                TokenType::Equal,
                TokenType::NotEqual,
                TokenType::NotEqual,
                TokenType::LessThan,
                TokenType::LessThanOrEqual,
                TokenType::GreaterThan,
                TokenType::GreaterThanOrEqual,
                TokenType::OpenParen,
                TokenType::CloseParen,
                TokenType::Dot,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_unexpected_characters() {
        assert_eq!(types("!"), vec![TokenType::Error]);
        assert_eq!(types("a ~ b").last(), Some(&TokenType::Error));
        assert_eq!(types("-x"), vec![TokenType::Error]);
    }

    #[test]
    fn test_fragment_at() {
        let lexer = Lexer::new("type_id = 1 AND uri LIKE 'abc'");
        assert_eq!(lexer.fragment_at(12), "AND uri LIKE 'ab");
        assert_eq!(lexer.fragment_at(100), "");
    }
}
