//! Type Layout Resolver: type description -> (size, alignment).
//!
//! Rules follow WGSL's host-shareable layout:
//!
//! | Type | size | align |
//! |------|------|-------|
//! | `f32` / `i32` / `u32` / `atomic<T>` | 4 | 4 |
//! | `f16` | 2 | 2 |
//! | `vec2<T>` | 2·s | 2·s |
//! | `vec3<T>` | 3·s | 4·s |
//! | `vec4<T>` | 4·s | 4·s |
//! | `matCxR<T>` | as `array<vecR<T>, C>` | |
//! | `array<E, N>` | N · roundUp(size(E), align(E)) | align(E) |
//! | struct | packed size | max field align |

use crate::error::LayoutError;
use crate::packer::{self, StructRegistry};
use crate::types::{ArrayLen, Scalar, TypeExpr, TypeLayout};

/// Resolves the size and alignment of `ty`.
///
/// Struct references are looked up in `registry` and packed recursively.
pub fn resolve(ty: &TypeExpr, registry: &StructRegistry) -> Result<TypeLayout, LayoutError> {
    let mut path = Vec::new();
    resolve_in(ty, registry, &mut path)
}

/// Parses `src` as a type expression and resolves it.
pub fn resolve_str(src: &str, registry: &StructRegistry) -> Result<TypeLayout, LayoutError> {
    resolve(&TypeExpr::parse(src)?, registry)
}

/// `path` holds the names of the structs currently being packed; seeing one of
/// them again means the definitions are cyclic.
pub(crate) fn resolve_in(
    ty: &TypeExpr,
    registry: &StructRegistry,
    path: &mut Vec<String>,
) -> Result<TypeLayout, LayoutError> {
    match ty {
        TypeExpr::Scalar(s) | TypeExpr::Atomic(s) => Ok(scalar(*s)),
        TypeExpr::Vector { len, elem } => Ok(vector(*len, *elem)),
        TypeExpr::Matrix { cols, rows, elem } => {
            let column = vector(*rows, *elem);
            array_of(column, u32::from(*cols), ty)
        }
        TypeExpr::Array { elem, len } => match len {
            ArrayLen::Fixed(n) => array_of(resolve_in(elem, registry, path)?, *n, ty),
            ArrayLen::Runtime => Err(LayoutError::RuntimeSizedArray { ty: ty.to_string() }),
        },
        TypeExpr::Struct(name) => {
            if path.iter().any(|p| p == name) {
                let mut cycle = path.clone();
                cycle.push(name.clone());
                return Err(LayoutError::RecursiveStruct { name: name.clone(), path: cycle.join(" -> ") });
            }
            let def = registry
                .get(name)
                .ok_or_else(|| LayoutError::UnknownStruct { name: name.clone() })?;

            path.push(name.clone());
            let layout = packer::pack_in(def, registry, path);
            path.pop();

            let layout = layout?;
            Ok(TypeLayout::new(layout.size, layout.align))
        }
    }
}

#[inline]
fn scalar(s: Scalar) -> TypeLayout {
    if s.is_narrow() { TypeLayout::new(2, 2) } else { TypeLayout::new(4, 4) }
}

fn vector(len: u8, elem: Scalar) -> TypeLayout {
    let (size, align) = match len {
        2 => (8, 8),
        3 => (12, 16),
        _ => (16, 16),
    };
    if elem.is_narrow() {
        TypeLayout::new(size / 2, align / 2)
    } else {
        TypeLayout::new(size, align)
    }
}

fn array_of(elem: TypeLayout, count: u32, ty: &TypeExpr) -> Result<TypeLayout, LayoutError> {
    elem.stride()
        .and_then(|stride| stride.checked_mul(count))
        .map(|size| TypeLayout::new(size, elem.align))
        .ok_or_else(|| LayoutError::SizeOverflow { ty: ty.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::StructDef;

    fn layout(src: &str) -> (u32, u32) {
        let l = resolve_str(src, &StructRegistry::new()).unwrap();
        (l.size, l.align)
    }

    #[test]
    fn scalars() {
        assert_eq!(layout("f32"), (4, 4));
        assert_eq!(layout("i32"), (4, 4));
        assert_eq!(layout("u32"), (4, 4));
        assert_eq!(layout("f16"), (2, 2));
        assert_eq!(layout("atomic<u32>"), (4, 4));
    }

    #[test]
    fn vectors() {
        assert_eq!(layout("vec2<f32>"), (8, 8));
        assert_eq!(layout("vec3<f32>"), (12, 16));
        assert_eq!(layout("vec4<u32>"), (16, 16));
        assert_eq!(layout("vec2<f16>"), (4, 4));
        assert_eq!(layout("vec3<f16>"), (6, 8));
        assert_eq!(layout("vec4h"), (8, 8));
    }

    #[test]
    fn matrices() {
        assert_eq!(layout("mat3x3<f32>"), (48, 16));
        assert_eq!(layout("mat4x4<f32>"), (64, 16));
        assert_eq!(layout("mat2x2<f32>"), (16, 8));
        assert_eq!(layout("mat4x3<f32>"), (64, 16));
        assert_eq!(layout("mat3x2<f32>"), (24, 8));
        assert_eq!(layout("mat3x3<f16>"), (24, 8));
    }

    #[test]
    fn arrays() {
        assert_eq!(layout("array<f32, 4>"), (16, 4));
        assert_eq!(layout("array<vec3<f32>, 4>"), (64, 16));
        assert_eq!(layout("array<array<vec2<f32>, 3>, 2>"), (48, 8));
    }

    #[test]
    fn runtime_array_has_no_layout() {
        let err = resolve_str("array<f32>", &StructRegistry::new()).unwrap_err();
        assert!(matches!(err, LayoutError::RuntimeSizedArray { .. }));
    }

    #[test]
    fn struct_reference() {
        let mut reg = StructRegistry::new();
        reg.insert(StructDef::new("Light").field("color", "vec4<f32>").unwrap().field("position", "vec2<f32>").unwrap())
            .unwrap();
        assert_eq!(resolve_str("Light", &reg).unwrap(), TypeLayout::new(32, 16));
        assert_eq!(resolve_str("array<Light, 3>", &reg).unwrap(), TypeLayout::new(96, 16));
    }

    #[test]
    fn unknown_struct() {
        let err = resolve_str("Missing", &StructRegistry::new()).unwrap_err();
        assert_eq!(err, LayoutError::UnknownStruct { name: "Missing".into() });
    }

    #[test]
    fn cycles_fail_fast() {
        let reg = crate::parse_structs("struct A { b: B } struct B { a: array<A, 2> }").unwrap();
        let err = resolve_str("A", &reg).unwrap_err();
        match err {
            LayoutError::RecursiveStruct { name, path } => {
                assert_eq!(name, "A");
                assert_eq!(path, "A -> B -> A");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn self_reference_fails_fast() {
        let reg = crate::parse_structs("struct Node { next: Node }").unwrap();
        assert!(matches!(resolve_str("Node", &reg), Err(LayoutError::RecursiveStruct { .. })));
    }

    #[test]
    fn oversized_array_is_an_error() {
        let err = resolve_str("array<vec4<f32>, 300000000>", &StructRegistry::new()).unwrap_err();
        assert_eq!(err, LayoutError::SizeOverflow { ty: "array<vec4<f32>, 300000000>".into() });

        let err = resolve_str("array<array<f32, 65536>, 65536>", &StructRegistry::new()).unwrap_err();
        assert!(matches!(err, LayoutError::SizeOverflow { .. }));
    }

    #[test]
    fn largest_fitting_array_resolves() {
        assert_eq!(layout("array<f32, 1073741823>"), (4 * 1_073_741_823, 4));
    }

    #[test]
    fn deterministic() {
        let reg = crate::parse_structs("struct S { a: vec3<f32>, b: f16, c: mat2x3<f32> }").unwrap();
        let first = resolve_str("array<S, 5>", &reg).unwrap();
        for _ in 0..8 {
            assert_eq!(resolve_str("array<S, 5>", &reg).unwrap(), first);
        }
    }
}
