use crate::ast::*;
use crate::error::{CompilerError, Result};
use crate::lexer::{Token, TokenKind};
use log::trace;

#[cfg(test)]
mod tests;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        // The grammar relies on a trailing Eof sentinel.
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                line: 1,
                column: 1,
            });
        }
        Parser { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program> {
        let mut declarations = Vec::new();

        while !self.check(TokenKind::Eof) {
            if self.check(TokenKind::Shader) {
                declarations.push(self.parse_shader_decl()?);
            } else {
                return Err(self.error("Expected 'shader' declaration"));
            }
        }

        Ok(Program { declarations })
    }

    fn parse_shader_decl(&mut self) -> Result<ShaderDecl> {
        trace!("parse_shader_decl: next token = {:?}", self.current());
        self.expect(TokenKind::Shader, "Expected 'shader' keyword")?;

        let stage = if self.check(TokenKind::Vertex) {
            self.advance();
            ShaderStage::Vertex
        } else if self.check(TokenKind::Fragment) {
            self.advance();
            ShaderStage::Fragment
        } else {
            return Err(self.error("Expected 'vertex' or 'fragment' after 'shader'"));
        };

        self.expect(TokenKind::LeftBrace, "Expected '{' after shader type")?;

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            if self.check(TokenKind::Input) {
                self.advance();
                inputs.push(self.parse_variable_decl()?);
            } else if self.check(TokenKind::Output) {
                self.advance();
                outputs.push(self.parse_variable_decl()?);
            } else if self.check(TokenKind::Main) {
                self.advance();
                self.expect(TokenKind::LeftBrace, "Expected '{' after 'main'")?;

                while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
                    statements.push(self.parse_statement()?);
                }

                self.expect(TokenKind::RightBrace, "Expected '}' after main block")?;
            } else {
                return Err(self.error("Unexpected token in shader body"));
            }
        }

        self.expect(TokenKind::RightBrace, "Expected '}' at end of shader declaration")?;

        Ok(ShaderDecl {
            stage,
            inputs,
            outputs,
            statements,
        })
    }

    fn parse_variable_decl(&mut self) -> Result<VariableDecl> {
        let ty = self.parse_type()?;
        let name = self.expect_identifier("Expected identifier after type")?;
        self.expect(TokenKind::Semicolon, "Expected ';' after variable declaration")?;
        Ok(VariableDecl { ty, name })
    }

    fn parse_type(&mut self) -> Result<TypeName> {
        let ty = match self.current().kind {
            TokenKind::Vec2 => TypeName::Vec2,
            TokenKind::Vec3 => TypeName::Vec3,
            TokenKind::Vec4 => TypeName::Vec4,
            TokenKind::Mat4 => TypeName::Mat4,
            TokenKind::Float => TypeName::Float,
            TokenKind::Int => TypeName::Int,
            _ => return Err(self.error("Expected type specifier")),
        };
        self.advance();
        Ok(ty)
    }

    /// Statement := Primary '=' Expression ';'
    ///
    /// The target must be an l-value: a plain identifier, or a member access
    /// on one. Anything else (a literal, a call, a parenthesized expression)
    /// is rejected here rather than surfacing as malformed GLSL later.
    fn parse_statement(&mut self) -> Result<Assignment> {
        trace!("parse_statement: next token = {:?}", self.current());
        let start = self.current().clone();
        let target = self.parse_primary()?;

        let valid_target = match &target {
            Expression::Identifier(_) => true,
            Expression::MemberAccess(object, _) => {
                matches!(**object, Expression::Identifier(_))
            }
            _ => false,
        };
        if !valid_target {
            return Err(CompilerError::ParseError {
                line: start.line,
                message: "Assignment target must be a variable or a member of one".to_string(),
                found: start.lexeme,
            });
        }

        self.expect(TokenKind::Assign, "Expected '=' in assignment")?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "Expected ';' after statement")?;

        Ok(Assignment { target, value })
    }

    /// Expression := Term (('+' | '-') Term)*
    fn parse_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expression::BinaryOp(op, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    /// Term := Factor (('*' | '/') Factor)*
    fn parse_term(&mut self) -> Result<Expression> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = Expression::BinaryOp(op, Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    // No unary operators in the grammar, so a factor is just a primary.
    fn parse_factor(&mut self) -> Result<Expression> {
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        trace!("parse_primary: next token = {:?}", self.current());

        if self.check(TokenKind::Number) {
            let text = self.advance().lexeme.clone();
            return Ok(Expression::Literal(text));
        }

        // Type keywords in expression position name constructors and must
        // be followed by an argument list.
        if self.current().kind.is_type() {
            let name = self.advance().lexeme.clone();
            if self.check(TokenKind::LeftParen) {
                return self.parse_function_call(name);
            }
            return Err(self.error(format!("Expected '(' after type constructor '{}'", name)));
        }

        if self.check(TokenKind::Identifier) {
            let name = self.advance().lexeme.clone();

            // One-token lookahead: '.' is member access, '(' a call,
            // anything else leaves a plain identifier.
            if self.check(TokenKind::Dot) {
                self.advance();
                let member = self.expect_identifier("Expected member name after '.'")?;
                return Ok(Expression::MemberAccess(
                    Box::new(Expression::Identifier(name)),
                    member,
                ));
            }
            if self.check(TokenKind::LeftParen) {
                return self.parse_function_call(name);
            }
            return Ok(Expression::Identifier(name));
        }

        if self.check(TokenKind::LeftParen) {
            self.advance();
            let expr = self.parse_expression()?;
            self.expect(TokenKind::RightParen, "Expected ')' after expression")?;
            return Ok(expr);
        }

        Err(self.error("Unexpected token in expression"))
    }

    /// ArgList := Expression (',' Expression)*
    fn parse_function_call(&mut self, name: String) -> Result<Expression> {
        self.expect(TokenKind::LeftParen, "Expected '(' after function name")?;

        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            arguments.push(self.parse_expression()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                arguments.push(self.parse_expression()?);
            }
        }

        self.expect(TokenKind::RightParen, "Expected ')' after function arguments")?;
        Ok(Expression::FunctionCall(name, arguments))
    }

    // Helper methods

    fn current(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn advance(&mut self) -> &Token {
        let index = self.current;
        if !self.check(TokenKind::Eof) {
            self.current += 1;
        }
        &self.tokens[index]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Result<String> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance().lexeme.clone())
        } else {
            Err(self.error(message))
        }
    }

    fn error(&self, message: impl Into<String>) -> CompilerError {
        let token = self.current();
        let found = if token.kind == TokenKind::Eof {
            "<eof>".to_string()
        } else {
            token.lexeme.clone()
        };
        CompilerError::ParseError {
            line: token.line,
            message: message.into(),
            found,
        }
    }
}
