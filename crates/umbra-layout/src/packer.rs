use std::collections::HashMap;

use crate::error::LayoutError;
use crate::resolve::resolve_in;
use crate::types::{round_up, TypeExpr, TypeLayout};

// ── Definitions ───────────────────────────────────────────────────────────

/// One struct member as declared.
///
/// `size` / `align` are explicit overrides (`@size(N)` / `@align(N)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeExpr,
    pub size: Option<u32>,
    pub align: Option<u32>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self { name: name.into(), ty, size: None, align: None }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_align(mut self, align: u32) -> Self {
        self.align = Some(align);
        self
    }
}

/// A named struct: fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    /// Appends a field whose type is given in source form.
    pub fn field(mut self, name: impl Into<String>, ty: &str) -> Result<Self, LayoutError> {
        self.fields.push(FieldDef::new(name, TypeExpr::parse(ty)?));
        Ok(self)
    }

    /// Appends an already-built field (overrides included).
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
}

/// Named struct definitions that type expressions may refer to.
///
/// Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct StructRegistry {
    structs: Vec<StructDef>,
    index: HashMap<String, usize>,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition. Names must be unique, and so must the field names
    /// within the struct.
    pub fn insert(&mut self, def: StructDef) -> Result<(), LayoutError> {
        if self.index.contains_key(&def.name) {
            return Err(LayoutError::DuplicateStruct { name: def.name });
        }
        for (i, field) in def.fields.iter().enumerate() {
            if def.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(LayoutError::DuplicateField { name: def.name.clone(), field: field.name.clone() });
            }
        }
        self.index.insert(def.name.clone(), self.structs.len());
        self.structs.push(def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StructDef> {
        self.index.get(name).map(|&i| &self.structs[i])
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.structs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.iter()
    }

    /// Packs the registered struct `name`.
    pub fn pack(&self, name: &str) -> Result<StructLayout, LayoutError> {
        let def = self
            .get(name)
            .ok_or_else(|| LayoutError::UnknownStruct { name: name.to_string() })?;
        pack_struct(def, self)
    }
}

// ── Layouts ───────────────────────────────────────────────────────────────

/// Placement of one field inside a packed struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    pub ty: TypeExpr,
    pub offset: u32,
    pub size: u32,
    pub align: u32,
}

/// Packed struct: field placements plus overall size and alignment.
///
/// Invariants: offsets never decrease, `offset % align == 0` for every field,
/// `size % align == 0` for the struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<FieldLayout>,
    pub size: u32,
    pub align: u32,
}

impl StructLayout {
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Array stride of this struct. `size` is already a multiple of `align`.
    #[inline]
    pub fn stride(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn as_type_layout(&self) -> TypeLayout {
        TypeLayout::new(self.size, self.align)
    }
}

// ── Packing ───────────────────────────────────────────────────────────────

/// Lays out `def` with the WGSL struct rules.
///
/// Fields are placed in declaration order; each offset is the running offset
/// rounded up to the field's alignment. The final size is rounded up to the
/// largest field alignment. No reordering is done: the layout is externally
/// mandated, not size-minimized.
pub fn pack_struct(def: &StructDef, registry: &StructRegistry) -> Result<StructLayout, LayoutError> {
    let mut path = vec![def.name.clone()];
    pack_in(def, registry, &mut path)
}

pub(crate) fn pack_in(
    def: &StructDef,
    registry: &StructRegistry,
    path: &mut Vec<String>,
) -> Result<StructLayout, LayoutError> {
    if def.fields.is_empty() {
        return Err(LayoutError::EmptyStruct { name: def.name.clone() });
    }

    let overflow = || LayoutError::SizeOverflow { ty: def.name.clone() };
    let mut fields = Vec::with_capacity(def.fields.len());
    let mut offset = 0u32;
    let mut max_align = 1u32;

    for field in &def.fields {
        let qualified = || format!("{}::{}", def.name, field.name);

        if let Some(align) = field.align
            && !align.is_power_of_two()
        {
            return Err(LayoutError::InvalidOverride {
                field: qualified(),
                reason: format!("@align({align}) is not a positive power of two"),
            });
        }

        let (size, align) = match (field.size, field.align) {
            (Some(size), Some(align)) => (size, align),
            (size, align) => {
                let natural = resolve_in(&field.ty, registry, path)?;
                if let Some(size) = size
                    && size < natural.size
                {
                    return Err(LayoutError::InvalidOverride {
                        field: qualified(),
                        reason: format!("@size({size}) is smaller than the natural size {}", natural.size),
                    });
                }
                (size.unwrap_or(natural.size), align.unwrap_or(natural.align))
            }
        };

        if fields.iter().any(|f: &FieldLayout| f.name == field.name) {
            return Err(LayoutError::DuplicateField { name: def.name.clone(), field: field.name.clone() });
        }

        offset = round_up(offset, align).ok_or_else(overflow)?;
        max_align = max_align.max(align);
        fields.push(FieldLayout { name: field.name.clone(), ty: field.ty.clone(), offset, size, align });
        offset = offset.checked_add(size).ok_or_else(overflow)?;
    }

    Ok(StructLayout {
        name: def.name.clone(),
        fields,
        size: round_up(offset, max_align).ok_or_else(overflow)?,
        align: max_align,
    })
}
