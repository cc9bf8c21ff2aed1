//! Filter expression parser - converts string expressions to AST
//!
//! Recursive descent parser. Precedence (lowest to highest):
//! 1. OR
//! 2. AND
//! 3. NOT
//! 4. comparison (`field op literal`)
//! 5. parenthesized expression
//!
//! The parser knows nothing about entity schemas; `contexts_0.id` and
//! `no_such.thing` are equally valid field references here.

use crate::ast::{AstNode, ComparisonOperator, FieldRef, Literal};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenType};

/// Default bound on NOT/parenthesis nesting
pub const DEFAULT_MAX_DEPTH: usize = 200;

/// Parse a filter expression using default limits.
pub fn parse(input: &str) -> Result<AstNode, ParseError> {
    Parser::new(input).parse()
}

/// Parser for filter expressions
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    recursion_depth: usize,
    max_depth: usize,
}

impl Parser {
    /// Create a new parser for the given input string
    pub fn new(input: &str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Self {
            lexer,
            current_token,
            recursion_depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    fn current_token_is(&self, token_type: TokenType) -> bool {
        self.current_token.token_type == token_type
    }

    fn error_at(&self, position: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(position, self.lexer.fragment_at(position), message)
    }

    /// Error for the current token when it is not what the grammar expects.
    /// Lexical errors take precedence since they explain the real problem.
    fn unexpected(&self, expected: &str) -> ParseError {
        let token = &self.current_token;
        match token.token_type {
            TokenType::Error => self.error_at(token.position, token.value.clone()),
            TokenType::Eof => self.error_at(
                token.position,
                format!("Unexpected end of input, expected {}", expected),
            ),
            _ => self.error_at(
                token.position,
                format!("Unexpected token '{}', expected {}", token.value, expected),
            ),
        }
    }

    /// Parse the entire expression (top-level entry point)
    pub fn parse(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_or_expression()?;

        if !self.current_token_is(TokenType::Eof) {
            if self.current_token_is(TokenType::CloseParen) {
                return Err(self.error_at(
                    self.current_token.position,
                    "Unbalanced parentheses: unexpected ')'",
                ));
            }
            return Err(self.unexpected("AND, OR or end of input"));
        }

        Ok(expr)
    }

    fn check_recursion_depth(&mut self) -> Result<(), ParseError> {
        self.recursion_depth += 1;
        if self.recursion_depth > self.max_depth {
            return Err(self.error_at(
                self.current_token.position,
                format!(
                    "Expression too deeply nested (max depth: {})",
                    self.max_depth
                ),
            ));
        }
        Ok(())
    }

    fn decrement_recursion_depth(&mut self) {
        self.recursion_depth -= 1;
    }

    /// Parse or expression: and_expr ('OR' and_expr)*
    fn parse_or_expression(&mut self) -> Result<AstNode, ParseError> {
        let mut operands = vec![self.parse_and_expression()?];

        while self.current_token_is(TokenType::Or) {
            self.advance(); // Skip 'OR'
            operands.push(self.parse_and_expression()?);
        }

        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            AstNode::Or(operands)
        })
    }

    /// Parse and expression: not_expr ('AND' not_expr)*
    fn parse_and_expression(&mut self) -> Result<AstNode, ParseError> {
        let mut operands = vec![self.parse_not_expression()?];

        while self.current_token_is(TokenType::And) {
            self.advance(); // Skip 'AND'
            operands.push(self.parse_not_expression()?);
        }

        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            AstNode::And(operands)
        })
    }

    /// Parse not expression: 'NOT' not_expr | primary
    fn parse_not_expression(&mut self) -> Result<AstNode, ParseError> {
        self.check_recursion_depth()?;
        let expr = if self.current_token_is(TokenType::Not) {
            self.advance(); // Skip 'NOT'
            AstNode::Not(Box::new(self.parse_not_expression()?))
        } else {
            self.parse_primary()?
        };
        self.decrement_recursion_depth();
        Ok(expr)
    }

    /// Parse primary: '(' expression ')' | comparison
    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        match self.current_token.token_type {
            TokenType::OpenParen => {
                let open_position = self.current_token.position;
                self.advance(); // Skip '('
                let expr = self.parse_or_expression()?;
                if !self.current_token_is(TokenType::CloseParen) {
                    if self.current_token_is(TokenType::Eof) {
                        return Err(self.error_at(
                            open_position,
                            "Unbalanced parentheses: missing ')'",
                        ));
                    }
                    return Err(self.unexpected("')'"));
                }
                self.advance(); // Skip ')'
                Ok(expr)
            }
            TokenType::Identifier | TokenType::DelimitedIdentifier => self.parse_comparison(),
            _ => Err(self.unexpected("a field reference, NOT or '('")),
        }
    }

    /// Parse comparison: field_ref operator literal
    fn parse_comparison(&mut self) -> Result<AstNode, ParseError> {
        let field = self.parse_field_ref()?;
        let operator = self.parse_operator()?;
        let literal = self.parse_literal()?;
        Ok(AstNode::Comparison {
            field,
            operator,
            literal,
        })
    }

    /// Parse field reference: segment ('.' segment)*
    fn parse_field_ref(&mut self) -> Result<FieldRef, ParseError> {
        let position = self.current_token.position;
        let mut segments = vec![std::mem::take(&mut self.current_token.value)];
        self.advance();

        while self.current_token_is(TokenType::Dot) {
            self.advance(); // Skip '.'
            let token_type = self.current_token.token_type;
            if token_type == TokenType::Identifier
                || token_type == TokenType::DelimitedIdentifier
                || token_type.is_keyword()
            {
                segments.push(std::mem::take(&mut self.current_token.value));
                self.advance();
            } else {
                return Err(self.unexpected("an identifier after '.'"));
            }
        }

        Ok(FieldRef::new(segments, position))
    }

    fn parse_operator(&mut self) -> Result<ComparisonOperator, ParseError> {
        let operator = match self.current_token.token_type {
            TokenType::Equal => ComparisonOperator::Equal,
            TokenType::NotEqual => ComparisonOperator::NotEqual,
            TokenType::LessThan => ComparisonOperator::LessThan,
            TokenType::LessThanOrEqual => ComparisonOperator::LessThanOrEqual,
            TokenType::GreaterThan => ComparisonOperator::GreaterThan,
            TokenType::GreaterThanOrEqual => ComparisonOperator::GreaterThanOrEqual,
            TokenType::Like => ComparisonOperator::Like,
            _ => return Err(self.unexpected("a comparison operator")),
        };
        self.advance();
        Ok(operator)
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let position = self.current_token.position;
        let literal = match self.current_token.token_type {
            TokenType::IntegerLiteral => {
                let value = self.current_token.value.parse::<i64>().map_err(|_| {
                    self.error_at(position, "Integer literal out of range")
                })?;
                Literal::Integer(value)
            }
            TokenType::FloatLiteral => {
                let value = self
                    .current_token
                    .value
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| self.error_at(position, "Float literal out of range"))?;
                Literal::Float(value)
            }
            TokenType::StringLiteral => {
                Literal::String(std::mem::take(&mut self.current_token.value))
            }
            _ => return Err(self.unexpected("a literal operand")),
        };
        self.advance();
        Ok(literal)
    }
}
