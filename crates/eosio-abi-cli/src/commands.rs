use crate::config::{CliConfig, OutputFormat};
use anyhow::{Context, Result};
use eosio_abi::Contract;
use serde_json::Value;
use std::fs;
use tracing::info;

pub fn load_contract(path: &str) -> Result<Contract> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read ABI file: {}", path))?;
    let contract = Contract::from_json(&text).with_context(|| format!("Failed to load ABI: {}", path))?;
    info!(
        path = path,
        structs = contract.schema().len(),
        "Loaded ABI"
    );
    Ok(contract)
}

fn parse_value(text: &str) -> Result<Value> {
    serde_json::from_str(text).context("Value is not valid JSON")
}

pub fn format_bytes(config: &CliConfig, bytes: &[u8]) -> Result<String> {
    match config.output {
        OutputFormat::Hex => Ok(hex::encode(bytes)),
        OutputFormat::Json => config.render(&bytes),
    }
}

pub fn schema(config: &CliConfig, abi: &str, struct_name: Option<&str>) -> Result<()> {
    let contract = load_contract(abi)?;
    let text = match struct_name {
        Some(name) => config.render(contract.schema().get_or_err(name)?)?,
        None => config.render(contract.schema())?,
    };
    println!("{}", text);
    Ok(())
}

pub fn encode(config: &CliConfig, abi: &str, type_name: &str, value: &str) -> Result<()> {
    let contract = load_contract(abi)?;
    let bytes = contract
        .encode(type_name, &parse_value(value)?)
        .with_context(|| format!("Failed to encode '{}'", type_name))?;
    println!("{}", format_bytes(config, &bytes)?);
    Ok(())
}

pub fn decode(config: &CliConfig, abi: &str, type_name: &str, data: &str) -> Result<()> {
    let contract = load_contract(abi)?;
    let data = data.trim();
    let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data)).context("Data is not valid hex")?;
    let value = contract
        .decode(type_name, &bytes)
        .with_context(|| format!("Failed to decode '{}'", type_name))?;
    println!("{}", config.render(&value)?);
    Ok(())
}

pub fn action(config: &CliConfig, abi: &str, action: &str, value: &str) -> Result<()> {
    let contract = load_contract(abi)?;
    let bytes = contract
        .encode_action_data(action, &parse_value(value)?)
        .with_context(|| format!("Failed to encode data for action '{}'", action))?;
    println!("{}", format_bytes(config, &bytes)?);
    Ok(())
}
