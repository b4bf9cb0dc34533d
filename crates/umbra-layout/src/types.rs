use std::fmt;
use std::str::FromStr;

use crate::error::LayoutError;

/// Host-shareable scalar types.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Scalar {
    F32,
    I32,
    U32,
    /// Narrow 2-byte float.
    F16,
}

impl Scalar {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "f32" => Some(Self::F32),
            "i32" => Some(Self::I32),
            "u32" => Some(Self::U32),
            "f16" => Some(Self::F16),
            _ => None,
        }
    }

    /// Single-letter suffix used by the shorthand aliases (`vec4f`, `vec2h`, ...).
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "f" => Some(Self::F32),
            "i" => Some(Self::I32),
            "u" => Some(Self::U32),
            "h" => Some(Self::F16),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::F16 => "f16",
        }
    }

    #[inline]
    pub const fn is_narrow(self) -> bool {
        matches!(self, Self::F16)
    }
}

/// Number of elements of an array type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ArrayLen {
    Fixed(u32),
    /// `array<T>`; only valid as the last member of a storage buffer.
    Runtime,
}

/// Typed AST of a type description.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum TypeExpr {
    Scalar(Scalar),
    Atomic(Scalar),
    Vector { len: u8, elem: Scalar },
    /// `matCxR<T>`: `cols` column vectors of `rows` components.
    Matrix { cols: u8, rows: u8, elem: Scalar },
    Array { elem: Box<TypeExpr>, len: ArrayLen },
    /// Reference into a struct registry.
    Struct(String),
}

/// Parameter of a template type as it appears in source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TemplateParam {
    Type(TypeExpr),
    Count(String),
}

impl TypeExpr {
    /// Parses a single type expression (`"mat3x3<f32>"`, `"array<Light, 16>"`, ...).
    pub fn parse(src: &str) -> Result<Self, LayoutError> {
        crate::parser::parse_type(src)
    }

    pub fn vec(len: u8, elem: Scalar) -> Self {
        Self::Vector { len, elem }
    }

    pub fn mat(cols: u8, rows: u8, elem: Scalar) -> Self {
        Self::Matrix { cols, rows, elem }
    }

    pub fn array(elem: TypeExpr, len: u32) -> Self {
        Self::Array { elem: Box::new(elem), len: ArrayLen::Fixed(len) }
    }

    /// Builds a type from an identifier without template parameters.
    ///
    /// Recognizes scalars and the shorthand aliases; anything else is taken to
    /// be a struct name and resolved later against a registry.
    pub(crate) fn from_ident(name: &str) -> Result<Self, LayoutError> {
        if let Some(s) = Scalar::from_name(name) {
            return Ok(Self::Scalar(s));
        }
        if let Some(alias) = Self::from_alias(name) {
            return Ok(alias);
        }
        if matches!(name, "vec2" | "vec3" | "vec4" | "atomic" | "array") || parse_mat_dims(name).is_some() {
            return Err(LayoutError::invalid_type(name, "missing template parameters"));
        }
        Ok(Self::Struct(name.to_string()))
    }

    /// `vec3f`, `vec2i`, `vec4u`, `vec4h`, `mat3x3f`, `mat4x2h`, ...
    fn from_alias(name: &str) -> Option<Self> {
        if let Some(rest) = name.strip_prefix("vec") {
            let (len, suffix) = rest.split_at_checked(1)?;
            let len = parse_vec_len(len)?;
            let elem = Scalar::from_suffix(suffix)?;
            return Some(Self::vec(len, elem));
        }
        if name.starts_with("mat") && name.len() == 7 {
            let (dims, suffix) = name.split_at(6);
            let (cols, rows) = parse_mat_dims(dims)?;
            let elem = Scalar::from_suffix(suffix)?;
            return Some(Self::mat(cols, rows, elem));
        }
        None
    }

    /// Builds a template type (`name<params>`), validating the parameters.
    pub(crate) fn from_template(name: &str, params: Vec<TemplateParam>) -> Result<Self, LayoutError> {
        let shown = || format!("{name}<..>");

        let scalar_param = |params: &[TemplateParam]| -> Result<Scalar, LayoutError> {
            match params {
                [TemplateParam::Type(TypeExpr::Scalar(s))] => Ok(*s),
                _ => Err(LayoutError::invalid_type(shown(), "expected exactly one scalar parameter")),
            }
        };

        if let Some(len) = name.strip_prefix("vec").and_then(parse_vec_len) {
            return Ok(Self::vec(len, scalar_param(&params)?));
        }
        if let Some((cols, rows)) = parse_mat_dims(name) {
            let elem = scalar_param(&params)?;
            if !matches!(elem, Scalar::F32 | Scalar::F16) {
                return Err(LayoutError::invalid_type(shown(), "matrix elements must be f32 or f16"));
            }
            return Ok(Self::mat(cols, rows, elem));
        }

        match name {
            "atomic" => match scalar_param(&params)? {
                s @ (Scalar::I32 | Scalar::U32) => Ok(Self::Atomic(s)),
                _ => Err(LayoutError::invalid_type(shown(), "atomics hold i32 or u32")),
            },
            "array" => {
                let mut params = params.into_iter();
                let elem = match params.next() {
                    Some(TemplateParam::Type(t)) => t,
                    _ => return Err(LayoutError::invalid_type(shown(), "missing element type")),
                };
                let len = match params.next() {
                    None => ArrayLen::Runtime,
                    Some(TemplateParam::Count(text)) => ArrayLen::Fixed(parse_count(&text)?),
                    Some(TemplateParam::Type(t)) => {
                        return Err(LayoutError::invalid_type(
                            format!("array<{elem}, {t}>"),
                            "element count must be an integer literal",
                        ));
                    }
                };
                if params.next().is_some() {
                    return Err(LayoutError::invalid_type(shown(), "too many parameters"));
                }
                Ok(Self::Array { elem: Box::new(elem), len })
            }
            _ => Err(LayoutError::invalid_type(shown(), "not a template type")),
        }
    }
}

impl FromStr for TypeExpr {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => f.write_str(s.name()),
            Self::Atomic(s) => write!(f, "atomic<{}>", s.name()),
            Self::Vector { len, elem } => write!(f, "vec{len}<{}>", elem.name()),
            Self::Matrix { cols, rows, elem } => write!(f, "mat{cols}x{rows}<{}>", elem.name()),
            Self::Array { elem, len: ArrayLen::Fixed(n) } => write!(f, "array<{elem}, {n}>"),
            Self::Array { elem, len: ArrayLen::Runtime } => write!(f, "array<{elem}>"),
            Self::Struct(name) => f.write_str(name),
        }
    }
}

fn parse_vec_len(s: &str) -> Option<u8> {
    match s {
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}

/// `"mat3x2"` -> `(3, 2)`.
fn parse_mat_dims(name: &str) -> Option<(u8, u8)> {
    let dims = name.strip_prefix("mat")?;
    let (cols, rows) = dims.split_once('x')?;
    Some((parse_vec_len(cols)?, parse_vec_len(rows)?))
}

/// Integer literal with an optional `u` / `i` suffix, strictly positive.
fn parse_count(text: &str) -> Result<u32, LayoutError> {
    let digits = text.trim_end_matches(['u', 'i']);
    let n: u32 = digits
        .parse()
        .map_err(|_| LayoutError::invalid_type(format!("array<.., {text}>"), "element count must be an integer literal"))?;
    if n == 0 {
        return Err(LayoutError::invalid_type(format!("array<.., {text}>"), "element count must be positive"));
    }
    Ok(n)
}

/// Resolved byte size and alignment of a type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TypeLayout {
    pub size: u32,
    pub align: u32,
}

impl TypeLayout {
    #[inline]
    pub const fn new(size: u32, align: u32) -> Self {
        Self { size, align }
    }

    /// Distance between consecutive elements when this type is stored in an
    /// array, or `None` if it does not fit in 32 bits.
    #[inline]
    pub const fn stride(self) -> Option<u32> {
        round_up(self.size, self.align)
    }
}

/// Rounds `value` up to the next multiple of `align` (`align` > 0).
///
/// `None` when the result does not fit in a `u32`.
#[inline]
pub const fn round_up(value: u32, align: u32) -> Option<u32> {
    value.div_ceil(align).checked_mul(align)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_expand() {
        assert_eq!(TypeExpr::parse("vec4f").unwrap(), TypeExpr::vec(4, Scalar::F32));
        assert_eq!(TypeExpr::parse("vec2h").unwrap(), TypeExpr::vec(2, Scalar::F16));
        assert_eq!(TypeExpr::parse("mat3x3f").unwrap(), TypeExpr::mat(3, 3, Scalar::F32));
        assert_eq!(TypeExpr::parse("mat4x2h").unwrap(), TypeExpr::mat(4, 2, Scalar::F16));
    }

    #[test]
    fn display_matches_source_form() {
        for src in ["f32", "atomic<u32>", "vec3<f16>", "mat2x4<f32>", "array<vec2<f32>, 8>", "array<Light>", "Light"] {
            assert_eq!(TypeExpr::parse(src).unwrap().to_string(), src);
        }
    }

    #[test]
    fn unknown_ident_is_struct_ref() {
        assert_eq!(TypeExpr::parse("RectData").unwrap(), TypeExpr::Struct("RectData".into()));
    }

    #[test]
    fn bare_template_name_rejected() {
        assert!(matches!(TypeExpr::parse("vec3"), Err(LayoutError::InvalidType { line: 1, col: 1, .. })));
        assert!(matches!(TypeExpr::parse("mat3x3"), Err(LayoutError::InvalidType { .. })));
    }

    #[test]
    fn bad_template_params_rejected() {
        for src in ["vec3<Foo>", "vec5<f32>", "mat3x3<i32>", "atomic<f32>", "array<f32, 0>", "array<f32, N>", "array<f32, 2, 3>"] {
            assert!(TypeExpr::parse(src).is_err(), "{src} should fail");
        }
    }

    #[test]
    fn suffixed_count() {
        assert_eq!(TypeExpr::parse("array<u32, 16u>").unwrap(), TypeExpr::array(TypeExpr::Scalar(Scalar::U32), 16));
    }

    #[test]
    fn round_up_rule() {
        assert_eq!(round_up(0, 16), Some(0));
        assert_eq!(round_up(12, 16), Some(16));
        assert_eq!(round_up(52, 16), Some(64));
        assert_eq!(round_up(u32::MAX - 3, 16), None);
        assert_eq!(TypeLayout::new(12, 16).stride(), Some(16));
    }
}
