//! Memory layout of WGSL host-shareable types.
//!
//! Computes byte size and alignment for scalar / vector / matrix / array /
//! struct types and packs structs into field offsets, so host code can write
//! records into device buffers at exactly the offsets a shader expects.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`types`] | `TypeExpr`, `Scalar`, `TypeLayout` |
//! | [`resolve`] | `resolve`, `resolve_str` |
//! | [`packer`] | `StructDef`, `FieldDef`, `StructRegistry`, `StructLayout`, `pack_struct` |
//! | [`lexer`] / [`parser`] | type expressions and `struct` declarations from WGSL source |
//! | [`error`] | `LayoutError` |
//!
//! # Quick start
//!
//! ```rust
//! use umbra_layout::parse_structs;
//!
//! let shader = r#"
//!     struct RectData {
//!         inv_transform: mat3x3<f32>,
//!         size: vec2<f32>,
//!     }
//! "#;
//!
//! let layout = parse_structs(shader).unwrap().pack("RectData").unwrap();
//! assert_eq!(layout.field("size").unwrap().offset, 48);
//! assert_eq!(layout.size, 64);
//! ```

pub mod error;
pub mod lexer;
pub mod packer;
pub mod parser;
pub mod resolve;
pub mod types;

pub use error::LayoutError;
pub use packer::{pack_struct, FieldDef, FieldLayout, StructDef, StructLayout, StructRegistry};
pub use parser::{parse_structs, parse_type};
pub use resolve::{resolve, resolve_str};
pub use types::{round_up, ArrayLen, Scalar, TypeExpr, TypeLayout};
