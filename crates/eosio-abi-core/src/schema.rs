//! Resolved struct schema.
//!
//! The output of [`crate::resolver::resolve`]: one flattened, ordered field
//! list per struct name. Structs live in an arena (`Vec`) and are looked up
//! through a name index; nothing in this module mutates a schema once built,
//! so a `ResolvedSchema` can be shared across threads behind an `Arc`.

use crate::error::{AbiError, Result};
use crate::grammar::ParsedType;
use crate::primitives::PrimitiveType;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedField {
    pub name: String,
    pub base_type: String,
    /// `base_type` names a struct or variant rather than a primitive
    pub is_object: bool,
    pub is_list: bool,
    pub is_optional: bool,
    pub is_extension: bool,
    pub is_variant_member: bool,
}

impl ResolvedField {
    pub(crate) fn from_parsed(name: impl Into<String>, parsed: ParsedType) -> Self {
        let is_object = !PrimitiveType::is_primitive(&parsed.base);
        Self {
            name: name.into(),
            base_type: parsed.base,
            is_object,
            is_list: parsed.is_list,
            is_optional: parsed.is_optional,
            is_extension: parsed.is_extension,
            is_variant_member: parsed.is_variant_member,
        }
    }

    /// The field's type with its markers, in canonical order
    pub fn type_string(&self) -> String {
        ParsedType {
            base: self.base_type.clone(),
            is_list: self.is_list,
            is_optional: self.is_optional,
            is_extension: self.is_extension,
            is_variant_member: self.is_variant_member,
        }
        .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructKind {
    Struct,
    /// Synthesized from a variant; one extension slot per member type
    Variant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStruct {
    pub name: String,
    pub kind: StructKind,
    pub fields: Vec<ResolvedField>,
}

impl ResolvedStruct {
    pub fn is_variant(&self) -> bool {
        self.kind == StructKind::Variant
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedSchema {
    structs: Vec<ResolvedStruct>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    /// Aliases that expand to a type expression rather than a struct copy:
    /// primitive targets (`account_name -> name`) and targets carrying
    /// markers (`names -> name[]`)
    type_aliases: BTreeMap<String, ParsedType>,
}

impl ResolvedSchema {
    pub(crate) fn new(
        structs: Vec<ResolvedStruct>,
        type_aliases: BTreeMap<String, ParsedType>,
    ) -> Self {
        let index = structs
            .iter()
            .enumerate()
            .map(|(pos, s)| (s.name.clone(), pos))
            .collect();
        Self {
            structs,
            index,
            type_aliases,
        }
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedStruct> {
        self.index.get(name).map(|&pos| &self.structs[pos])
    }

    pub fn get_or_err(&self, name: &str) -> Result<&ResolvedStruct> {
        self.get(name)
            .ok_or_else(|| AbiError::UnknownStruct(name.to_string()))
    }

    pub fn fields(&self, name: &str) -> Option<&[ResolvedField]> {
        self.get(name).map(|s| s.fields.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Structs in resolution order: declared structs, then variants, then aliases
    pub fn structs(&self) -> impl Iterator<Item = &ResolvedStruct> {
        self.structs.iter()
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    pub fn type_alias(&self, name: &str) -> Option<&ParsedType> {
        self.type_aliases.get(name)
    }
}
