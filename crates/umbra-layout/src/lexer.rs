use crate::error::LayoutError;

// ── Token ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    /// Numeric literal kept as written (`16`, `4u`, `1.5`); the parser decides
    /// whether it needs an integer.
    Number(String),
    // Punctuation
    LAngle,
    RAngle,
    Comma,
    Colon,
    Semicolon,
    LBrace,
    RBrace,
    LParen,
    RParen,
    At,
    /// Any other character. Only meaningful inside code the parser skips.
    Other(char),
    // Sentinel
    Eof,
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub col: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────

/// Tokenizer for WGSL type expressions and struct declarations.
///
/// Handles `//` line comments and nested `/* */` block comments so whole
/// shader files can be fed in.
pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0, line: 1, col: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LayoutError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments()?;
            let (line, col) = (self.line, self.col);
            let token = self.next_token()?;
            let eof = token == Token::Eof;
            tokens.push(Spanned { token, line, col });
            if eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.rest().chars().next()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LayoutError> {
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.advance();
            }
            if self.rest().starts_with("//") {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
            } else if self.rest().starts_with("/*") {
                let (line, col) = (self.line, self.col);
                self.advance();
                self.advance();
                let mut depth = 1usize;
                while depth > 0 {
                    if self.rest().starts_with("/*") {
                        self.advance();
                        self.advance();
                        depth += 1;
                    } else if self.rest().starts_with("*/") {
                        self.advance();
                        self.advance();
                        depth -= 1;
                    } else if self.advance().is_none() {
                        return Err(LayoutError::syntax("unterminated block comment", line, col));
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LayoutError> {
        let Some(ch) = self.peek() else {
            return Ok(Token::Eof);
        };

        let simple = match ch {
            '<' => Some(Token::LAngle),
            '>' => Some(Token::RAngle),
            ',' => Some(Token::Comma),
            ':' => Some(Token::Colon),
            ';' => Some(Token::Semicolon),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '@' => Some(Token::At),
            _ => None,
        };
        if let Some(tok) = simple {
            self.advance();
            return Ok(tok);
        }

        match ch {
            c if c.is_ascii_digit() => Ok(self.lex_number()),
            c if c.is_alphabetic() || c == '_' => Ok(self.lex_ident()),
            other => {
                self.advance();
                Ok(Token::Other(other))
            }
        }
    }

    fn lex_number(&mut self) -> Token {
        let start = self.pos;
        // Digits, hex digits, a fractional part, exponents and type suffixes
        // (`u`, `i`, `f`, `h`) all stay inside one literal.
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '.') {
            self.advance();
        }
        Token::Number(self.src[start..self.pos].to_string())
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        Token::Ident(self.src[start..self.pos].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn template_type() {
        assert_eq!(
            kinds("array<vec3<f32>, 4u>"),
            vec![
                Token::Ident("array".into()),
                Token::LAngle,
                Token::Ident("vec3".into()),
                Token::LAngle,
                Token::Ident("f32".into()),
                Token::RAngle,
                Token::Comma,
                Token::Number("4u".into()),
                Token::RAngle,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("// line\n/* block /* nested */ */ f32"),
            vec![Token::Ident("f32".into()), Token::Eof]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let toks = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!((toks[0].line, toks[0].col), (1, 1));
        assert_eq!((toks[1].line, toks[1].col), (2, 3));
    }

    #[test]
    fn unterminated_block_comment() {
        let err = Lexer::new("f32 /* oops").tokenize().unwrap_err();
        assert!(matches!(err, LayoutError::Syntax { line: 1, col: 5, .. }));
    }
}
