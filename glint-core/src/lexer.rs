use crate::error::{CompilerError, Result};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::pair,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Shader,
    Vertex,
    Fragment,
    Input,
    Output,
    Uniform,
    Main,

    // Type keywords
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Float,
    Int,

    // Categories
    Identifier,
    Number,

    // Punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,
    Dot,

    Eof,
}

impl TokenKind {
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            TokenKind::Vec2
                | TokenKind::Vec3
                | TokenKind::Vec4
                | TokenKind::Mat4
                | TokenKind::Float
                | TokenKind::Int
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

/// Keywords take precedence over identifiers on exact match.
fn keyword_kind(word: &str) -> Option<TokenKind> {
    match word {
        "shader" => Some(TokenKind::Shader),
        "vertex" => Some(TokenKind::Vertex),
        "fragment" => Some(TokenKind::Fragment),
        "input" => Some(TokenKind::Input),
        "output" => Some(TokenKind::Output),
        "uniform" => Some(TokenKind::Uniform),
        "main" => Some(TokenKind::Main),
        "vec2" => Some(TokenKind::Vec2),
        "vec3" => Some(TokenKind::Vec3),
        "vec4" => Some(TokenKind::Vec4),
        "mat4" => Some(TokenKind::Mat4),
        "float" => Some(TokenKind::Float),
        "int" => Some(TokenKind::Int),
        _ => None,
    }
}

/// Digits with at most one decimal point; a leading `.` needs a digit after
/// it, so a bare `.` still lexes as member access.
fn lex_number(input: &str) -> IResult<&str, (TokenKind, &str)> {
    map(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        |s: &str| (TokenKind::Number, s),
    )(input)
}

fn lex_word(input: &str) -> IResult<&str, (TokenKind, &str)> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |s: &str| (keyword_kind(s).unwrap_or(TokenKind::Identifier), s),
    )(input)
}

fn lex_punctuation(input: &str) -> IResult<&str, (TokenKind, &str)> {
    alt((
        map(tag("+"), |s: &str| (TokenKind::Plus, s)),
        map(tag("-"), |s: &str| (TokenKind::Minus, s)),
        map(tag("*"), |s: &str| (TokenKind::Star, s)),
        map(tag("/"), |s: &str| (TokenKind::Slash, s)),
        map(tag("="), |s: &str| (TokenKind::Assign, s)),
        map(tag("("), |s: &str| (TokenKind::LeftParen, s)),
        map(tag(")"), |s: &str| (TokenKind::RightParen, s)),
        map(tag("{"), |s: &str| (TokenKind::LeftBrace, s)),
        map(tag("}"), |s: &str| (TokenKind::RightBrace, s)),
        map(tag(";"), |s: &str| (TokenKind::Semicolon, s)),
        map(tag(","), |s: &str| (TokenKind::Comma, s)),
        map(tag("."), |s: &str| (TokenKind::Dot, s)),
    ))(input)
}

// Numbers first so `.5` lexes as a literal rather than Dot.
fn lex_token(input: &str) -> IResult<&str, (TokenKind, &str)> {
    alt((lex_number, lex_word, lex_punctuation))(input)
}

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line: u32 = 1;
    let mut column: u32 = 1;

    loop {
        // Skip whitespace and `//` line comments, keeping line/column current.
        loop {
            if rest.starts_with("//") {
                let end = rest.find('\n').unwrap_or(rest.len());
                column += end as u32;
                rest = &rest[end..];
                continue;
            }
            let mut chars = rest.chars();
            match chars.next() {
                Some('\n') => {
                    line += 1;
                    column = 1;
                    rest = chars.as_str();
                }
                Some(c) if c.is_ascii_whitespace() => {
                    column += 1;
                    rest = chars.as_str();
                }
                _ => break,
            }
        }

        if rest.is_empty() {
            break;
        }

        match lex_token(rest) {
            Ok((after, (kind, lexeme))) => {
                tokens.push(Token {
                    kind,
                    lexeme: lexeme.to_string(),
                    line,
                    column,
                });
                column += lexeme.len() as u32;
                rest = after;
            }
            Err(_) => {
                let c = rest.chars().next().unwrap_or('\0');
                return Err(CompilerError::LexError {
                    line,
                    column,
                    message: format!("unexpected character '{}'", c),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        line,
        column,
    });

    Ok(tokens)
}
