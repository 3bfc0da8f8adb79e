//! A contract ABI paired with its resolved schema, with helpers keyed by
//! action and table name.

use crate::codec;
use crate::error::{AbiError, Result};
use crate::resolver::resolve;
use crate::schema::ResolvedSchema;
use crate::types::AbiDefinition;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Contract {
    abi: AbiDefinition,
    schema: ResolvedSchema,
}

impl Contract {
    pub fn new(abi: AbiDefinition) -> Result<Self> {
        let schema = resolve(&abi)?;
        Ok(Self { abi, schema })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(AbiDefinition::from_json(json)?)
    }

    pub fn schema(&self) -> &ResolvedSchema {
        &self.schema
    }

    /// Struct type carried as data by `action`
    pub fn action_type(&self, action: &str) -> Result<&str> {
        self.abi
            .find_action(action)
            .map(|a| a.type_name.as_str())
            .ok_or_else(|| AbiError::UnknownAction(action.to_string()))
    }

    /// Row type stored in `table`
    pub fn table_type(&self, table: &str) -> Result<&str> {
        self.abi
            .find_table(table)
            .map(|t| t.type_name.as_str())
            .ok_or_else(|| AbiError::UnknownTable(table.to_string()))
    }

    pub fn encode(&self, type_name: &str, value: &Value) -> Result<Vec<u8>> {
        codec::encode(type_name, value, &self.schema)
    }

    pub fn decode(&self, type_name: &str, bytes: &[u8]) -> Result<Value> {
        codec::decode(type_name, bytes, &self.schema)
    }

    pub fn encode_action_data(&self, action: &str, value: &Value) -> Result<Vec<u8>> {
        let type_name = self.action_type(action)?;
        debug!(action = action, type_name = type_name, "Encoding action data");
        codec::encode(type_name, value, &self.schema)
    }

    pub fn encode_action_data_hex(&self, action: &str, value: &Value) -> Result<String> {
        Ok(hex::encode(self.encode_action_data(action, value)?))
    }

    pub fn decode_action_data(&self, action: &str, bytes: &[u8]) -> Result<Value> {
        let type_name = self.action_type(action)?;
        debug!(action = action, bytes = bytes.len(), "Decoding action data");
        codec::decode(type_name, bytes, &self.schema)
    }

    pub fn decode_action_data_hex(&self, action: &str, data: &str) -> Result<Value> {
        self.decode_action_data(action, &hex::decode(data.trim())?)
    }

    pub fn decode_table_row(&self, table: &str, bytes: &[u8]) -> Result<Value> {
        let type_name = self.table_type(table)?;
        debug!(table = table, bytes = bytes.len(), "Decoding table row");
        codec::decode(type_name, bytes, &self.schema)
    }
}
