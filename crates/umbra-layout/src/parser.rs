use crate::error::LayoutError;
use crate::lexer::{Lexer, Spanned, Token};
use crate::packer::{FieldDef, StructDef, StructRegistry};
use crate::types::{TemplateParam, TypeExpr};

// ── Parser ────────────────────────────────────────────────────────────────

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current_pos(&self) -> (usize, usize) {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| (t.line, t.col))
            .unwrap_or((1, 1))
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).map(|t| t.token.clone()).unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, msg: impl Into<String>) -> LayoutError {
        let (line, col) = self.current_pos();
        LayoutError::syntax(msg, line, col)
    }

    fn expect_ident(&mut self) -> Result<String, LayoutError> {
        match self.peek().clone() {
            Token::Ident(s) => {
                self.advance();
                Ok(s)
            }
            tok => Err(self.err(format!("expected identifier, got {:?}", tok))),
        }
    }

    fn expect_token(&mut self, expected: &Token) -> Result<(), LayoutError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {:?}, got {:?}", expected, self.peek())))
        }
    }

    fn expect_eof(&self) -> Result<(), LayoutError> {
        match self.peek() {
            Token::Eof => Ok(()),
            tok => Err(self.err(format!("unexpected trailing {:?}", tok))),
        }
    }

    // ── Types ─────────────────────────────────────────────────────────────

    /// `ident [ '<' param (',' param)* ','? '>' ]`
    pub fn parse_type(&mut self) -> Result<TypeExpr, LayoutError> {
        let (line, col) = self.current_pos();
        let name = self.expect_ident()?;

        let result = if self.peek() == &Token::LAngle {
            self.advance();
            let mut params = Vec::new();
            loop {
                if self.peek() == &Token::RAngle && !params.is_empty() {
                    self.advance();
                    break;
                }
                params.push(self.parse_template_param()?);
                match self.advance() {
                    Token::Comma => continue,
                    Token::RAngle => break,
                    tok => return Err(self.err(format!("expected ',' or '>' in template list, got {:?}", tok))),
                }
            }
            TypeExpr::from_template(&name, params)
        } else {
            TypeExpr::from_ident(&name)
        };

        // Template errors carry no position of their own; attach where the type
        // began. Errors already placed by a nested type keep their position.
        result.map_err(|e| match e {
            LayoutError::InvalidType { ty, reason, line: 0, .. } => {
                LayoutError::InvalidType { ty, reason, line, col }
            }
            other => other,
        })
    }

    fn parse_template_param(&mut self) -> Result<TemplateParam, LayoutError> {
        match self.peek().clone() {
            Token::Number(text) => {
                self.advance();
                Ok(TemplateParam::Count(text))
            }
            Token::Ident(_) => Ok(TemplateParam::Type(self.parse_type()?)),
            tok => Err(self.err(format!("expected a type or an element count, got {:?}", tok))),
        }
    }

    // ── Struct declarations ───────────────────────────────────────────────

    /// Collects every `struct` declaration, skipping all other tokens.
    pub fn parse_struct_decls(&mut self) -> Result<Vec<StructDef>, LayoutError> {
        let mut structs = Vec::new();
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::Ident(kw) if kw == "struct" => structs.push(self.parse_struct()?),
                _ => {
                    self.advance();
                }
            }
        }
        Ok(structs)
    }

    fn parse_struct(&mut self) -> Result<StructDef, LayoutError> {
        self.advance(); // consume `struct`
        let name = self.expect_ident()?;
        self.expect_token(&Token::LBrace)?;

        let mut def = StructDef::new(name);
        loop {
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(self.err(format!("unclosed struct `{}`", def.name))),
                _ => {
                    let field = self.parse_field()?;
                    def.fields.push(field);
                    // Older WGSL separates members with `;`.
                    if matches!(self.peek(), Token::Comma | Token::Semicolon) {
                        self.advance();
                    } else if self.peek() != &Token::RBrace {
                        return Err(self.err(format!("expected ',' or '}}' after field, got {:?}", self.peek())));
                    }
                }
            }
        }
        if self.peek() == &Token::Semicolon {
            self.advance();
        }
        Ok(def)
    }

    fn parse_field(&mut self) -> Result<FieldDef, LayoutError> {
        let mut size = None;
        let mut align = None;

        while self.peek() == &Token::At {
            self.advance();
            let attr = self.expect_ident()?;
            match attr.as_str() {
                "size" => size = Some(self.parse_attr_int()?),
                "align" => align = Some(self.parse_attr_int()?),
                // @location(0), @builtin(position), @interpolate(flat), ...
                _ => self.skip_attr_args()?,
            }
        }

        let name = self.expect_ident()?;
        self.expect_token(&Token::Colon)?;
        let ty = self.parse_type()?;

        Ok(FieldDef { name, ty, size, align })
    }

    fn parse_attr_int(&mut self) -> Result<u32, LayoutError> {
        self.expect_token(&Token::LParen)?;
        let value = match self.advance() {
            Token::Number(text) => text
                .trim_end_matches(['u', 'i'])
                .parse::<u32>()
                .map_err(|_| self.err(format!("expected an integer literal, got {text:?}")))?,
            tok => return Err(self.err(format!("expected an integer literal, got {:?}", tok))),
        };
        self.expect_token(&Token::RParen)?;
        Ok(value)
    }

    fn skip_attr_args(&mut self) -> Result<(), LayoutError> {
        if self.peek() != &Token::LParen {
            return Ok(());
        }
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Token::Eof => return Err(self.err("unclosed attribute arguments")),
                _ => {}
            }
        }
    }
}

// ── Public parse entry points ─────────────────────────────────────────────

/// Parses a single type expression.
pub fn parse_type(src: &str) -> Result<TypeExpr, LayoutError> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser::new(tokens);
    let ty = parser.parse_type()?;
    parser.expect_eof()?;
    Ok(ty)
}

/// Extracts every struct declaration from WGSL source into a registry.
///
/// Everything that is not a `struct` declaration is skipped, so a complete
/// shader module can be passed in. Field types are parsed here; layouts are
/// only computed when a struct is packed.
pub fn parse_structs(src: &str) -> Result<StructRegistry, LayoutError> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut registry = StructRegistry::new();
    for def in Parser::new(tokens).parse_struct_decls()? {
        registry.insert(def)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scalar;

    #[test]
    fn nested_template() {
        let ty = parse_type(" array< mat3x3<f32> , 2 > ").unwrap();
        assert_eq!(ty, TypeExpr::array(TypeExpr::mat(3, 3, Scalar::F32), 2));
    }

    #[test]
    fn trailing_comma_in_template() {
        assert_eq!(parse_type("vec2<f32,>").unwrap(), TypeExpr::vec(2, Scalar::F32));
    }

    #[test]
    fn trailing_garbage_rejected() {
        assert!(matches!(parse_type("f32 f32"), Err(LayoutError::Syntax { .. })));
    }

    #[test]
    fn unclosed_template_rejected() {
        assert!(matches!(parse_type("vec2<f32"), Err(LayoutError::Syntax { .. })));
    }

    #[test]
    fn invalid_type_reports_position() {
        let err = parse_type("array<vec3<bool>, 2>").unwrap_err();
        assert!(matches!(err, LayoutError::InvalidType { line: 1, col: 7, .. }), "{err:?}");
    }

    #[test]
    fn structs_from_shader_source() {
        let src = r#"
            // Shape records.
            struct RectData {
                inv_transform: mat3x3<f32>,
                size: vec2<f32>,
            };

            struct VsOut {
                @builtin(position) pos: vec4<f32>,
                @location(0) @interpolate(flat) color: vec4f,
            }

            @group(0) @binding(2) var<storage, read> rects: array<RectData>;

            fn f(x: f32) -> f32 { return x * 2.0; }

            struct Padded { @align(16) a: f32; @size(32) b: vec2<f32>; }
        "#;
        let reg = parse_structs(src).unwrap();
        assert_eq!(reg.len(), 3);

        let rect = reg.get("RectData").unwrap();
        assert_eq!(rect.fields.len(), 2);
        assert_eq!(rect.fields[0].name, "inv_transform");
        assert_eq!(rect.fields[1].ty, TypeExpr::vec(2, Scalar::F32));

        let padded = reg.get("Padded").unwrap();
        assert_eq!(padded.fields[0].align, Some(16));
        assert_eq!(padded.fields[1].size, Some(32));

        let vs = reg.get("VsOut").unwrap();
        assert_eq!(vs.fields[1].name, "color");
    }

    #[test]
    fn duplicate_struct_rejected() {
        let err = parse_structs("struct A { x: f32 } struct A { y: f32 }").unwrap_err();
        assert_eq!(err, LayoutError::DuplicateStruct { name: "A".into() });
    }

    #[test]
    fn missing_separator_rejected() {
        assert!(matches!(
            parse_structs("struct A { x: f32 y: f32 }"),
            Err(LayoutError::Syntax { .. })
        ));
    }
}
