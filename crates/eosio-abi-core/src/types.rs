//! Type definitions for the EOSIO ABI JSON document.

use crate::error::{AbiError, Result};
use serde::{Deserialize, Serialize};

/// A type alias declaration: `new_type_name` is another name for `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub base: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// Tagged union: the wire form is a varuint32 index into `types`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDef {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub ricardian_contract: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub index_type: String,
    #[serde(default)]
    pub key_names: Vec<String>,
    #[serde(default)]
    pub key_types: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Contract ABI as published on chain (`get_abi`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiDefinition {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub structs: Vec<StructDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub variants: Vec<VariantDef>,
}

impl AbiDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AbiError::InvalidJson(e.to_string()))
    }

    pub fn find_action(&self, name: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn find_table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }
}

// nodeos publishes `"base": ""` for structs without a base
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let base: Option<String> = Option::deserialize(deserializer)?;
    Ok(base.filter(|b| !b.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_abi_json() {
        let json = r#"{
            "version": "eosio::abi/1.1",
            "types": [{"new_type_name": "account_name", "type": "name"}],
            "structs": [
                {"name": "transfer", "base": "", "fields": [
                    {"name": "from", "type": "account_name"},
                    {"name": "memo", "type": "string"}
                ]}
            ],
            "actions": [{"name": "transfer", "type": "transfer", "ricardian_contract": ""}],
            "tables": [],
            "ricardian_clauses": [],
            "abi_extensions": []
        }"#;
        let abi = AbiDefinition::from_json(json).unwrap();
        assert_eq!(abi.version, "eosio::abi/1.1");
        assert_eq!(abi.types[0].type_name, "name");
        let transfer = &abi.structs[0];
        assert_eq!(transfer.name, "transfer");
        assert_eq!(transfer.base, None);
        assert_eq!(transfer.fields.len(), 2);
        assert!(abi.find_action("transfer").is_some());
        assert!(abi.variants.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let err = AbiDefinition::from_json("{ not json").unwrap_err();
        assert!(matches!(err, AbiError::InvalidJson(_)));
    }
}
