//! ABI resolution.
//!
//! Turns an [`AbiDefinition`] into a [`ResolvedSchema`]: variants become
//! synthesized structs, aliases are expanded, base structs are flattened
//! into their children and every field type is parsed and checked.

use crate::error::{AbiError, Result};
use crate::grammar::{parse_type, ParsedType};
use crate::primitives::PrimitiveType;
use crate::schema::{ResolvedField, ResolvedSchema, ResolvedStruct, StructKind};
use crate::types::{AbiDefinition, FieldDef};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// A struct or variant waiting to be flattened
struct Declaration {
    name: String,
    base: Option<String>,
    fields: Vec<FieldDef>,
    kind: StructKind,
}

enum AliasTarget {
    /// Plain struct target: the alias gets its own copy of the struct
    Struct(String),
    /// Primitive target, or any target carrying markers
    Type(ParsedType),
}

struct Resolver {
    declarations: Vec<Declaration>,
    by_name: HashMap<String, usize>,
    /// alias name -> struct name, in ABI order
    struct_aliases: Vec<(String, String)>,
    type_aliases: BTreeMap<String, ParsedType>,
}

/// Resolve an ABI document into a flattened schema
pub fn resolve(abi: &AbiDefinition) -> Result<ResolvedSchema> {
    let mut resolver = Resolver::new(abi)?;
    resolver.expand_aliases(abi)?;

    let mut flattened: HashMap<String, Vec<ResolvedField>> = HashMap::new();
    let mut structs = Vec::with_capacity(resolver.declarations.len() + resolver.struct_aliases.len());

    for decl in &resolver.declarations {
        let fields = resolver.flatten(&decl.name, &mut Vec::new(), &mut flattened)?;
        if decl.kind == StructKind::Struct {
            warn_on_misplaced_extension(&decl.name, &fields);
        }
        debug!(
            name = %decl.name,
            kind = ?decl.kind,
            fields = fields.len(),
            "Resolved struct"
        );
        structs.push(ResolvedStruct {
            name: decl.name.clone(),
            kind: decl.kind,
            fields,
        });
    }

    for (alias, target) in &resolver.struct_aliases {
        let source = resolver.declaration(target)?;
        let fields = flattened
            .get(target)
            .cloned()
            .ok_or_else(|| AbiError::UnknownStruct(target.clone()))?;
        debug!(alias = %alias, target = %target, "Copied struct under alias");
        structs.push(ResolvedStruct {
            name: alias.clone(),
            kind: source.kind,
            fields,
        });
    }

    info!(
        version = %abi.version,
        structs = structs.len(),
        type_aliases = resolver.type_aliases.len(),
        "ABI resolved"
    );

    Ok(ResolvedSchema::new(structs, resolver.type_aliases))
}

impl Resolver {
    fn new(abi: &AbiDefinition) -> Result<Self> {
        let mut resolver = Resolver {
            declarations: Vec::with_capacity(abi.structs.len() + abi.variants.len()),
            by_name: HashMap::new(),
            struct_aliases: Vec::new(),
            type_aliases: BTreeMap::new(),
        };

        for s in &abi.structs {
            resolver.declare(Declaration {
                name: s.name.clone(),
                base: s.base.clone(),
                fields: s.fields.clone(),
                kind: StructKind::Struct,
            })?;
        }

        // One extension slot per member type, in declaration order, so the
        // member index doubles as the wire tag.
        for v in &abi.variants {
            let fields = v
                .types
                .iter()
                .map(|member| FieldDef::new(member.clone(), format!("{}$@", member)))
                .collect();
            resolver.declare(Declaration {
                name: v.name.clone(),
                base: None,
                fields,
                kind: StructKind::Variant,
            })?;
        }

        Ok(resolver)
    }

    fn declare(&mut self, decl: Declaration) -> Result<()> {
        if PrimitiveType::is_primitive(&decl.name) || self.by_name.contains_key(&decl.name) {
            return Err(AbiError::DuplicateType(decl.name));
        }
        self.by_name.insert(decl.name.clone(), self.declarations.len());
        self.declarations.push(decl);
        Ok(())
    }

    fn declaration(&self, name: &str) -> Result<&Declaration> {
        self.by_name
            .get(name)
            .map(|&pos| &self.declarations[pos])
            .ok_or_else(|| AbiError::UnknownStruct(name.to_string()))
    }

    fn expand_aliases(&mut self, abi: &AbiDefinition) -> Result<()> {
        let mut raw: HashMap<&str, &str> = HashMap::new();
        for t in &abi.types {
            let name = t.new_type_name.as_str();
            if PrimitiveType::is_primitive(name)
                || self.by_name.contains_key(name)
                || raw.insert(name, t.type_name.as_str()).is_some()
            {
                return Err(AbiError::DuplicateType(name.to_string()));
            }
        }

        for t in &abi.types {
            match self.expand_alias(&t.new_type_name, &raw)? {
                AliasTarget::Struct(target) => {
                    self.struct_aliases.push((t.new_type_name.clone(), target));
                }
                AliasTarget::Type(parsed) => {
                    debug!(alias = %t.new_type_name, target = %parsed, "Registered type alias");
                    self.type_aliases.insert(t.new_type_name.clone(), parsed);
                }
            }
        }
        Ok(())
    }

    /// Follow an alias chain to a primitive or struct, merging markers on the way
    fn expand_alias(&self, alias: &str, raw: &HashMap<&str, &str>) -> Result<AliasTarget> {
        let target_raw = raw.get(alias).copied().unwrap_or_default();
        let mut parsed = parse_type(target_raw)?;
        let mut chain = vec![alias.to_string()];

        while let Some(next_raw) = raw.get(parsed.base.as_str()).copied() {
            if chain.contains(&parsed.base) {
                chain.push(parsed.base.clone());
                return Err(AbiError::CyclicAlias(chain.join(" -> ")));
            }
            chain.push(parsed.base.clone());
            let next = parse_type(next_raw)?;
            parsed = parsed.merge_alias(&next, next_raw)?;
        }

        if PrimitiveType::is_primitive(&parsed.base) {
            Ok(AliasTarget::Type(parsed))
        } else if self.by_name.contains_key(&parsed.base) {
            if parsed.has_markers() {
                Ok(AliasTarget::Type(parsed))
            } else {
                Ok(AliasTarget::Struct(parsed.base))
            }
        } else {
            Err(AbiError::UnresolvedAliasTarget {
                alias: alias.to_string(),
                target: target_raw.to_string(),
            })
        }
    }

    /// Map a base or field type name to the struct it denotes, looking
    /// through struct aliases
    fn struct_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.by_name.contains_key(name) {
            return Some(name);
        }
        self.struct_aliases
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(_, target)| target.as_str())
    }

    fn flatten(
        &self,
        name: &str,
        stack: &mut Vec<String>,
        done: &mut HashMap<String, Vec<ResolvedField>>,
    ) -> Result<Vec<ResolvedField>> {
        if let Some(fields) = done.get(name) {
            return Ok(fields.clone());
        }
        if stack.iter().any(|s| s == name) {
            stack.push(name.to_string());
            return Err(AbiError::CyclicInheritance(stack.join(" -> ")));
        }

        let decl = self.declaration(name)?;
        stack.push(name.to_string());

        let mut fields = match decl.base.as_deref() {
            Some(base) => {
                let base_struct = self.struct_name(base).ok_or_else(|| AbiError::UnresolvedBase {
                    name: name.to_string(),
                    base: base.to_string(),
                })?;
                self.flatten(base_struct, stack, done)?
            }
            None => Vec::new(),
        };

        for field in &decl.fields {
            fields.push(self.resolve_field(field)?);
        }
        stack.pop();

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(AbiError::DuplicateField {
                    name: name.to_string(),
                    field: field.name.clone(),
                });
            }
        }

        done.insert(name.to_string(), fields.clone());
        Ok(fields)
    }

    fn resolve_field(&self, field: &FieldDef) -> Result<ResolvedField> {
        let mut parsed = parse_type(&field.type_name)?;
        if let Some(target) = self.type_aliases.get(&parsed.base) {
            parsed = parsed.merge_alias(target, &field.type_name)?;
        }
        if !PrimitiveType::is_primitive(&parsed.base) && self.struct_name(&parsed.base).is_none() {
            return Err(AbiError::UnknownPrimitiveType(parsed.base));
        }
        Ok(ResolvedField::from_parsed(field.name.clone(), parsed))
    }
}

fn warn_on_misplaced_extension(name: &str, fields: &[ResolvedField]) {
    if let Some(first) = fields.iter().position(|f| f.is_extension) {
        if let Some(field) = fields[first..].iter().find(|f| !f.is_extension) {
            warn!(
                name = %name,
                field = %field.name,
                "Non-extension field follows a binary extension"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StructDef, TypeDef, VariantDef};

    fn st(name: &str, base: Option<&str>, fields: &[(&str, &str)]) -> StructDef {
        StructDef {
            name: name.to_string(),
            base: base.map(str::to_string),
            fields: fields.iter().map(|(n, t)| FieldDef::new(*n, *t)).collect(),
        }
    }

    fn alias(new_type_name: &str, type_name: &str) -> TypeDef {
        TypeDef {
            new_type_name: new_type_name.to_string(),
            type_name: type_name.to_string(),
        }
    }

    fn field_names(schema: &ResolvedSchema, name: &str) -> Vec<String> {
        schema
            .fields(name)
            .unwrap()
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    #[test]
    fn test_base_fields_come_first() {
        let abi = AbiDefinition {
            structs: vec![
                st("child", Some("parent"), &[("b", "uint8")]),
                st("parent", Some("grandparent"), &[("a", "uint8")]),
                st("grandparent", None, &[("root", "name")]),
            ],
            ..Default::default()
        };
        let schema = resolve(&abi).unwrap();
        assert_eq!(field_names(&schema, "child"), ["root", "a", "b"]);
        assert_eq!(field_names(&schema, "parent"), ["root", "a"]);
    }

    #[test]
    fn test_cyclic_inheritance() {
        let abi = AbiDefinition {
            structs: vec![st("a", Some("b"), &[]), st("b", Some("a"), &[])],
            ..Default::default()
        };
        assert!(matches!(resolve(&abi), Err(AbiError::CyclicInheritance(_))));

        let abi = AbiDefinition {
            structs: vec![st("self_ref", Some("self_ref"), &[])],
            ..Default::default()
        };
        let err = resolve(&abi).unwrap_err();
        assert_eq!(err, AbiError::CyclicInheritance("self_ref -> self_ref".to_string()));
    }

    #[test]
    fn test_unresolved_base() {
        let abi = AbiDefinition {
            structs: vec![st("s", Some("ghost"), &[("x", "uint8")])],
            ..Default::default()
        };
        assert_eq!(
            resolve(&abi).unwrap_err(),
            AbiError::UnresolvedBase {
                name: "s".to_string(),
                base: "ghost".to_string()
            }
        );
    }

    #[test]
    fn test_primitive_alias_is_transparent() {
        let abi = AbiDefinition {
            types: vec![alias("account_name", "name"), alias("names", "account_name[]")],
            structs: vec![st("s", None, &[("owner", "account_name"), ("others", "names?")])],
            ..Default::default()
        };
        let schema = resolve(&abi).unwrap();
        let fields = schema.fields("s").unwrap();
        assert_eq!(fields[0].base_type, "name");
        assert!(!fields[0].is_object);
        assert_eq!(fields[1].type_string(), "name[]?");
        assert_eq!(schema.type_alias("names").unwrap().to_string(), "name[]");
    }

    #[test]
    fn test_struct_alias_gets_a_copy() {
        let abi = AbiDefinition {
            types: vec![alias("permission", "permission_level")],
            structs: vec![st(
                "permission_level",
                None,
                &[("actor", "name"), ("permission", "name")],
            )],
            ..Default::default()
        };
        let schema = resolve(&abi).unwrap();
        assert_eq!(schema.fields("permission"), schema.fields("permission_level"));
        // aliases come after declared structs
        let order: Vec<_> = schema.structs().map(|s| s.name.as_str()).collect();
        assert_eq!(order, ["permission_level", "permission"]);
    }

    #[test]
    fn test_alias_errors() {
        let abi = AbiDefinition {
            types: vec![alias("thing", "nothing")],
            ..Default::default()
        };
        assert!(matches!(
            resolve(&abi),
            Err(AbiError::UnresolvedAliasTarget { .. })
        ));

        let abi = AbiDefinition {
            types: vec![alias("a", "b"), alias("b", "a")],
            ..Default::default()
        };
        assert!(matches!(resolve(&abi), Err(AbiError::CyclicAlias(_))));

        let abi = AbiDefinition {
            types: vec![alias("a", "name[]"), alias("b", "a[]")],
            ..Default::default()
        };
        assert!(matches!(resolve(&abi), Err(AbiError::MalformedTypeString(_))));
    }

    #[test]
    fn test_variant_becomes_struct() {
        let abi = AbiDefinition {
            structs: vec![st("transfer", None, &[("to", "name")])],
            variants: vec![VariantDef {
                name: "op".to_string(),
                types: vec!["uint8".to_string(), "string".to_string(), "transfer".to_string()],
            }],
            ..Default::default()
        };
        let schema = resolve(&abi).unwrap();
        let op = schema.get("op").unwrap();
        assert!(op.is_variant());
        assert_eq!(op.fields.len(), 3);
        assert_eq!(op.fields[1].name, "string");
        assert!(op.fields.iter().all(|f| f.is_extension && f.is_variant_member));
        assert!(op.fields[2].is_object);
    }

    #[test]
    fn test_unknown_field_type() {
        let abi = AbiDefinition {
            structs: vec![st("s", None, &[("x", "uint256")])],
            ..Default::default()
        };
        assert_eq!(
            resolve(&abi).unwrap_err(),
            AbiError::UnknownPrimitiveType("uint256".to_string())
        );
    }

    #[test]
    fn test_duplicates() {
        let abi = AbiDefinition {
            structs: vec![
                st("base", None, &[("x", "uint8")]),
                st("s", Some("base"), &[("x", "uint16")]),
            ],
            ..Default::default()
        };
        assert!(matches!(resolve(&abi), Err(AbiError::DuplicateField { .. })));

        let abi = AbiDefinition {
            structs: vec![st("s", None, &[]), st("s", None, &[])],
            ..Default::default()
        };
        assert_eq!(resolve(&abi).unwrap_err(), AbiError::DuplicateType("s".to_string()));
    }

    #[test]
    fn test_malformed_field_type() {
        let abi = AbiDefinition {
            structs: vec![st("s", None, &[("x", "uint8[")])],
            ..Default::default()
        };
        assert!(matches!(resolve(&abi), Err(AbiError::MalformedTypeString(_))));
    }

    #[test]
    fn test_empty_abi() {
        let schema = resolve(&AbiDefinition::default()).unwrap();
        assert!(schema.is_empty());
    }
}
