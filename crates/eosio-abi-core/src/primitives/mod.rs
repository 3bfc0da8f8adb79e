//! Built-in ABI primitive types and their wire codecs.
//!
//! Every primitive has a fixed binary layout defined by the chain; the JSON
//! forms follow what nodeos returns from `get_table_rows` and accepts in
//! `abi_json_to_bin`.

mod keys;
mod name;
mod time;

pub use keys::{PublicKey, Signature, KeyType};
pub use name::{Asset, Name, Symbol, SymbolCode};

use crate::error::{AbiError, Result};
use crate::stream::{write_len, write_varint32, write_varuint32, ByteReader};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Int128,
    Uint128,
    VarInt32,
    VarUint32,
    Float32,
    Float64,
    Float128,
    TimePoint,
    TimePointSec,
    BlockTimestamp,
    Name,
    Bytes,
    String,
    Checksum160,
    Checksum256,
    Checksum512,
    PublicKey,
    Signature,
    Symbol,
    SymbolCode,
    Asset,
    ExtendedAsset,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 31] = [
        PrimitiveType::Bool,
        PrimitiveType::Int8,
        PrimitiveType::Uint8,
        PrimitiveType::Int16,
        PrimitiveType::Uint16,
        PrimitiveType::Int32,
        PrimitiveType::Uint32,
        PrimitiveType::Int64,
        PrimitiveType::Uint64,
        PrimitiveType::Int128,
        PrimitiveType::Uint128,
        PrimitiveType::VarInt32,
        PrimitiveType::VarUint32,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::Float128,
        PrimitiveType::TimePoint,
        PrimitiveType::TimePointSec,
        PrimitiveType::BlockTimestamp,
        PrimitiveType::Name,
        PrimitiveType::Bytes,
        PrimitiveType::String,
        PrimitiveType::Checksum160,
        PrimitiveType::Checksum256,
        PrimitiveType::Checksum512,
        PrimitiveType::PublicKey,
        PrimitiveType::Signature,
        PrimitiveType::Symbol,
        PrimitiveType::SymbolCode,
        PrimitiveType::Asset,
        PrimitiveType::ExtendedAsset,
    ];

    /// Look up a primitive by its ABI name
    pub fn lookup(name: &str) -> Result<Self> {
        let ty = match name {
            "bool" => PrimitiveType::Bool,
            "int8" => PrimitiveType::Int8,
            "uint8" => PrimitiveType::Uint8,
            "int16" => PrimitiveType::Int16,
            "uint16" => PrimitiveType::Uint16,
            "int32" => PrimitiveType::Int32,
            "uint32" => PrimitiveType::Uint32,
            "int64" => PrimitiveType::Int64,
            "uint64" => PrimitiveType::Uint64,
            "int128" => PrimitiveType::Int128,
            "uint128" => PrimitiveType::Uint128,
            "varint32" => PrimitiveType::VarInt32,
            "varuint32" => PrimitiveType::VarUint32,
            "float32" => PrimitiveType::Float32,
            "float64" => PrimitiveType::Float64,
            "float128" => PrimitiveType::Float128,
            "time_point" => PrimitiveType::TimePoint,
            "time_point_sec" => PrimitiveType::TimePointSec,
            "block_timestamp_type" => PrimitiveType::BlockTimestamp,
            "name" => PrimitiveType::Name,
            "bytes" => PrimitiveType::Bytes,
            "string" => PrimitiveType::String,
            "checksum160" => PrimitiveType::Checksum160,
            "checksum256" => PrimitiveType::Checksum256,
            "checksum512" => PrimitiveType::Checksum512,
            "public_key" => PrimitiveType::PublicKey,
            "signature" => PrimitiveType::Signature,
            "symbol" => PrimitiveType::Symbol,
            "symbol_code" => PrimitiveType::SymbolCode,
            "asset" => PrimitiveType::Asset,
            "extended_asset" => PrimitiveType::ExtendedAsset,
            _ => return Err(AbiError::UnknownPrimitiveType(name.to_string())),
        };
        Ok(ty)
    }

    pub fn is_primitive(name: &str) -> bool {
        Self::lookup(name).is_ok()
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Uint8 => "uint8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Uint16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Uint32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Uint64 => "uint64",
            PrimitiveType::Int128 => "int128",
            PrimitiveType::Uint128 => "uint128",
            PrimitiveType::VarInt32 => "varint32",
            PrimitiveType::VarUint32 => "varuint32",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
            PrimitiveType::Float128 => "float128",
            PrimitiveType::TimePoint => "time_point",
            PrimitiveType::TimePointSec => "time_point_sec",
            PrimitiveType::BlockTimestamp => "block_timestamp_type",
            PrimitiveType::Name => "name",
            PrimitiveType::Bytes => "bytes",
            PrimitiveType::String => "string",
            PrimitiveType::Checksum160 => "checksum160",
            PrimitiveType::Checksum256 => "checksum256",
            PrimitiveType::Checksum512 => "checksum512",
            PrimitiveType::PublicKey => "public_key",
            PrimitiveType::Signature => "signature",
            PrimitiveType::Symbol => "symbol",
            PrimitiveType::SymbolCode => "symbol_code",
            PrimitiveType::Asset => "asset",
            PrimitiveType::ExtendedAsset => "extended_asset",
        }
    }

    /// Encoded size in bytes, `None` for self-delimiting layouts
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            PrimitiveType::Bool | PrimitiveType::Int8 | PrimitiveType::Uint8 => Some(1),
            PrimitiveType::Int16 | PrimitiveType::Uint16 => Some(2),
            PrimitiveType::Int32
            | PrimitiveType::Uint32
            | PrimitiveType::Float32
            | PrimitiveType::TimePointSec
            | PrimitiveType::BlockTimestamp => Some(4),
            PrimitiveType::Int64
            | PrimitiveType::Uint64
            | PrimitiveType::Float64
            | PrimitiveType::TimePoint
            | PrimitiveType::Name
            | PrimitiveType::Symbol
            | PrimitiveType::SymbolCode => Some(8),
            PrimitiveType::Int128 | PrimitiveType::Uint128 | PrimitiveType::Float128 => Some(16),
            PrimitiveType::Asset => Some(16),
            PrimitiveType::ExtendedAsset => Some(24),
            PrimitiveType::Checksum160 => Some(20),
            PrimitiveType::Checksum256 => Some(32),
            PrimitiveType::Checksum512 => Some(64),
            PrimitiveType::PublicKey => Some(34),
            PrimitiveType::Signature => Some(66),
            PrimitiveType::VarInt32
            | PrimitiveType::VarUint32
            | PrimitiveType::Bytes
            | PrimitiveType::String => None,
        }
    }

    /// Append the wire form of `value` to `out`
    pub fn encode(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        let ty = self.name();
        match self {
            PrimitiveType::Bool => {
                let b = match value {
                    Value::Bool(b) => *b,
                    Value::Number(n) if n.as_u64() == Some(0) => false,
                    Value::Number(n) if n.as_u64() == Some(1) => true,
                    _ => return Err(expected(ty, "a boolean", value)),
                };
                out.push(u8::from(b));
            }
            PrimitiveType::Int8 => out.extend_from_slice(&narrow::<i8, _>(as_i64(value, ty)?, ty)?.to_le_bytes()),
            PrimitiveType::Uint8 => out.extend_from_slice(&narrow::<u8, _>(as_u64(value, ty)?, ty)?.to_le_bytes()),
            PrimitiveType::Int16 => out.extend_from_slice(&narrow::<i16, _>(as_i64(value, ty)?, ty)?.to_le_bytes()),
            PrimitiveType::Uint16 => out.extend_from_slice(&narrow::<u16, _>(as_u64(value, ty)?, ty)?.to_le_bytes()),
            PrimitiveType::Int32 => out.extend_from_slice(&narrow::<i32, _>(as_i64(value, ty)?, ty)?.to_le_bytes()),
            PrimitiveType::Uint32 => out.extend_from_slice(&narrow::<u32, _>(as_u64(value, ty)?, ty)?.to_le_bytes()),
            PrimitiveType::Int64 => out.extend_from_slice(&as_i64(value, ty)?.to_le_bytes()),
            PrimitiveType::Uint64 => out.extend_from_slice(&as_u64(value, ty)?.to_le_bytes()),
            PrimitiveType::Int128 => out.extend_from_slice(&as_i128(value, ty)?.to_le_bytes()),
            PrimitiveType::Uint128 => out.extend_from_slice(&as_u128(value, ty)?.to_le_bytes()),
            PrimitiveType::VarInt32 => write_varint32(out, narrow::<i32, _>(as_i64(value, ty)?, ty)?),
            PrimitiveType::VarUint32 => write_varuint32(out, narrow::<u32, _>(as_u64(value, ty)?, ty)?),
            PrimitiveType::Float32 => out.extend_from_slice(&(as_f64(value, ty)? as f32).to_le_bytes()),
            PrimitiveType::Float64 => out.extend_from_slice(&as_f64(value, ty)?.to_le_bytes()),
            PrimitiveType::Float128 => out.extend_from_slice(&fixed_hex::<16>(value, ty)?),
            PrimitiveType::TimePoint => out.extend_from_slice(&time::parse_time_point(as_str(value, ty)?)?.to_le_bytes()),
            PrimitiveType::TimePointSec => out.extend_from_slice(&time::parse_time_point_sec(as_str(value, ty)?)?.to_le_bytes()),
            PrimitiveType::BlockTimestamp => out.extend_from_slice(&time::parse_block_timestamp(as_str(value, ty)?)?.to_le_bytes()),
            PrimitiveType::Name => out.extend_from_slice(&as_str(value, ty)?.parse::<Name>()?.value().to_le_bytes()),
            PrimitiveType::Bytes => {
                let bytes = hex::decode(as_str(value, ty)?)?;
                write_len(out, bytes.len(), ty)?;
                out.extend_from_slice(&bytes);
            }
            PrimitiveType::String => {
                let s = as_str(value, ty)?;
                write_len(out, s.len(), ty)?;
                out.extend_from_slice(s.as_bytes());
            }
            PrimitiveType::Checksum160 => out.extend_from_slice(&fixed_hex::<20>(value, ty)?),
            PrimitiveType::Checksum256 => out.extend_from_slice(&fixed_hex::<32>(value, ty)?),
            PrimitiveType::Checksum512 => out.extend_from_slice(&fixed_hex::<64>(value, ty)?),
            PrimitiveType::PublicKey => as_str(value, ty)?.parse::<PublicKey>()?.write(out),
            PrimitiveType::Signature => as_str(value, ty)?.parse::<Signature>()?.write(out),
            PrimitiveType::Symbol => out.extend_from_slice(&as_str(value, ty)?.parse::<Symbol>()?.value().to_le_bytes()),
            PrimitiveType::SymbolCode => out.extend_from_slice(&as_str(value, ty)?.parse::<SymbolCode>()?.value().to_le_bytes()),
            PrimitiveType::Asset => as_str(value, ty)?.parse::<Asset>()?.write(out),
            PrimitiveType::ExtendedAsset => {
                let quantity = value
                    .get("quantity")
                    .ok_or_else(|| expected(ty, "an object with 'quantity'", value))?;
                let contract = value
                    .get("contract")
                    .ok_or_else(|| expected(ty, "an object with 'contract'", value))?;
                PrimitiveType::Asset.encode(quantity, out)?;
                PrimitiveType::Name.encode(contract, out)?;
            }
        }
        Ok(())
    }

    /// Read one value of this type from the cursor
    pub fn decode(&self, reader: &mut ByteReader<'_>) -> Result<Value> {
        let value = match self {
            PrimitiveType::Bool => match reader.read_u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                b => return Err(AbiError::invalid("bool", format!("byte {:#04x}", b))),
            },
            PrimitiveType::Int8 => json!(i8::from_le_bytes(reader.read_array()?)),
            PrimitiveType::Uint8 => json!(reader.read_u8()?),
            PrimitiveType::Int16 => json!(i16::from_le_bytes(reader.read_array()?)),
            PrimitiveType::Uint16 => json!(u16::from_le_bytes(reader.read_array()?)),
            PrimitiveType::Int32 => json!(i32::from_le_bytes(reader.read_array()?)),
            PrimitiveType::Uint32 => json!(u32::from_le_bytes(reader.read_array()?)),
            PrimitiveType::Int64 => json!(i64::from_le_bytes(reader.read_array()?)),
            PrimitiveType::Uint64 => json!(u64::from_le_bytes(reader.read_array()?)),
            PrimitiveType::Int128 => Value::String(i128::from_le_bytes(reader.read_array()?).to_string()),
            PrimitiveType::Uint128 => Value::String(u128::from_le_bytes(reader.read_array()?).to_string()),
            PrimitiveType::VarInt32 => json!(reader.read_varint32()?),
            PrimitiveType::VarUint32 => json!(reader.read_varuint32()?),
            PrimitiveType::Float32 => float_value(f64::from(f32::from_le_bytes(reader.read_array()?))),
            PrimitiveType::Float64 => float_value(f64::from_le_bytes(reader.read_array()?)),
            PrimitiveType::Float128 => Value::String(hex::encode(reader.read_bytes(16)?)),
            PrimitiveType::TimePoint => Value::String(time::format_time_point(i64::from_le_bytes(reader.read_array()?))?),
            PrimitiveType::TimePointSec => Value::String(time::format_time_point_sec(u32::from_le_bytes(reader.read_array()?))?),
            PrimitiveType::BlockTimestamp => Value::String(time::format_block_timestamp(u32::from_le_bytes(reader.read_array()?))?),
            PrimitiveType::Name => Value::String(Name::new(u64::from_le_bytes(reader.read_array()?)).to_string()),
            PrimitiveType::Bytes => {
                let len = reader.read_varuint32()? as usize;
                Value::String(hex::encode(reader.read_bytes(len)?))
            }
            PrimitiveType::String => {
                let len = reader.read_varuint32()? as usize;
                let bytes = reader.read_bytes(len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|e| AbiError::invalid("string", e.to_string()))?;
                Value::String(s.to_string())
            }
            PrimitiveType::Checksum160 => Value::String(hex::encode(reader.read_bytes(20)?)),
            PrimitiveType::Checksum256 => Value::String(hex::encode(reader.read_bytes(32)?)),
            PrimitiveType::Checksum512 => Value::String(hex::encode(reader.read_bytes(64)?)),
            PrimitiveType::PublicKey => Value::String(PublicKey::read(reader)?.to_string()),
            PrimitiveType::Signature => Value::String(Signature::read(reader)?.to_string()),
            PrimitiveType::Symbol => Value::String(Symbol::from_value(u64::from_le_bytes(reader.read_array()?))?.to_string()),
            PrimitiveType::SymbolCode => Value::String(SymbolCode::from_value(u64::from_le_bytes(reader.read_array()?))?.to_string()),
            PrimitiveType::Asset => Value::String(Asset::read(reader)?.to_string()),
            PrimitiveType::ExtendedAsset => {
                let quantity = Asset::read(reader)?;
                let contract = Name::new(u64::from_le_bytes(reader.read_array()?));
                json!({
                    "quantity": quantity.to_string(),
                    "contract": contract.to_string(),
                })
            }
        };
        Ok(value)
    }
}

fn expected(type_name: &str, what: &str, got: &Value) -> AbiError {
    AbiError::mismatch(type_name, format!("expected {}, got {}", what, got))
}

fn as_str<'v>(value: &'v Value, type_name: &str) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| expected(type_name, "a string", value))
}

// 64-bit and wider integers are accepted as JSON numbers or decimal strings
fn as_u64(value: &Value, type_name: &str) -> Result<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| expected(type_name, "an unsigned integer", value)),
        Value::String(s) => s
            .parse()
            .map_err(|_| expected(type_name, "an unsigned integer", value)),
        _ => Err(expected(type_name, "an unsigned integer", value)),
    }
}

fn as_i64(value: &Value, type_name: &str) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| expected(type_name, "an integer", value)),
        Value::String(s) => s
            .parse()
            .map_err(|_| expected(type_name, "an integer", value)),
        _ => Err(expected(type_name, "an integer", value)),
    }
}

fn as_u128(value: &Value, type_name: &str) -> Result<u128> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| expected(type_name, "an unsigned integer", value)),
        Value::String(s) => s
            .parse()
            .map_err(|_| expected(type_name, "an unsigned integer", value)),
        _ => Err(expected(type_name, "an unsigned integer", value)),
    }
}

fn as_i128(value: &Value, type_name: &str) -> Result<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .ok_or_else(|| expected(type_name, "an integer", value)),
        Value::String(s) => s
            .parse()
            .map_err(|_| expected(type_name, "an integer", value)),
        _ => Err(expected(type_name, "an integer", value)),
    }
}

fn as_f64(value: &Value, type_name: &str) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| expected(type_name, "a number", value)),
        Value::String(s) => match s.as_str() {
            "nan" => Ok(f64::NAN),
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            other => other
                .parse()
                .map_err(|_| expected(type_name, "a number", value)),
        },
        _ => Err(expected(type_name, "a number", value)),
    }
}

// JSON has no representation for non-finite floats
fn float_value(f: f64) -> Value {
    if f.is_nan() {
        Value::String("nan".to_string())
    } else if f.is_infinite() {
        Value::String(if f > 0.0 { "inf" } else { "-inf" }.to_string())
    } else {
        json!(f)
    }
}

fn narrow<T: TryFrom<W>, W: Copy + std::fmt::Display>(wide: W, type_name: &str) -> Result<T> {
    T::try_from(wide).map_err(|_| AbiError::invalid(type_name, format!("{} out of range", wide)))
}

fn fixed_hex<const N: usize>(value: &Value, type_name: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(as_str(value, type_name)?)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
        AbiError::invalid(
            type_name,
            format!("expected {} bytes, got {}", N, bytes.len()),
        )
    })
}
