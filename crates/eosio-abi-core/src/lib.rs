//! eosio-abi — EOSIO/Antelope ABI resolution and binary serialization
//!
//! Resolves a contract ABI (type aliases, base structs, variants) into a flat
//! per-struct field schema, then encodes and decodes JSON values against it in
//! the chain's binary wire format.

pub mod codec;
pub mod contract;
pub mod error;
pub mod grammar;
pub mod primitives;
pub mod resolver;
pub mod schema;
pub mod stream;
pub mod types;

pub use codec::{decode, decode_from, encode};
pub use contract::Contract;
pub use error::{AbiError, Result};
pub use grammar::{parse_type, ParsedType};
pub use primitives::{Asset, KeyType, Name, PrimitiveType, PublicKey, Signature, Symbol, SymbolCode};
pub use resolver::resolve;
pub use schema::{ResolvedField, ResolvedSchema, ResolvedStruct, StructKind};
pub use stream::ByteReader;
pub use types::*;
