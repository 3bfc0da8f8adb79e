/// Public keys and signatures in their binary and base58 text forms
use crate::error::{AbiError, Result};
use crate::stream::ByteReader;
use ripemd::{Digest, Ripemd160};
use std::fmt;
use std::str::FromStr;

const PUBLIC_KEY_LEN: usize = 33;
const SIGNATURE_LEN: usize = 65;
const CHECKSUM_LEN: usize = 4;
const LEGACY_KEY_PREFIX: &str = "EOS";

/// Curve discriminant, the first byte of the wire form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    K1,
    R1,
}

impl KeyType {
    fn from_byte(b: u8, what: &str) -> Result<Self> {
        match b {
            0 => Ok(KeyType::K1),
            1 => Ok(KeyType::R1),
            other => Err(AbiError::invalid(what, format!("unsupported key type {}", other))),
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            KeyType::K1 => 0,
            KeyType::R1 => 1,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            KeyType::K1 => "K1",
            KeyType::R1 => "R1",
        }
    }
}

fn checksum(data: &[u8], suffix: &str) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.update(suffix.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

fn to_base58(data: &[u8], suffix: &str) -> String {
    let mut raw = data.to_vec();
    raw.extend_from_slice(&checksum(data, suffix));
    bs58::encode(raw).into_string()
}

fn from_base58<const N: usize>(text: &str, suffix: &str, what: &str) -> Result<[u8; N]> {
    let raw = bs58::decode(text)
        .into_vec()
        .map_err(|e| AbiError::invalid(what, format!("base58: {}", e)))?;
    if raw.len() != N + CHECKSUM_LEN {
        return Err(AbiError::invalid(
            what,
            format!("expected {} bytes, got {}", N + CHECKSUM_LEN, raw.len()),
        ));
    }
    let (data, check) = raw.split_at(N);
    if checksum(data, suffix).as_slice() != check {
        return Err(AbiError::invalid(what, "checksum mismatch"));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(data);
    Ok(out)
}

fn split_prefixed<'a>(text: &'a str, prefix: &str, what: &str) -> Result<Option<(KeyType, &'a str)>> {
    let Some(rest) = text.strip_prefix(prefix) else {
        return Ok(None);
    };
    let (curve, data) = rest
        .split_once('_')
        .ok_or_else(|| AbiError::invalid(what, format!("'{}' has no curve tag", text)))?;
    let key_type = match curve {
        "K1" => KeyType::K1,
        "R1" => KeyType::R1,
        other => return Err(AbiError::invalid(what, format!("unsupported curve '{}'", other))),
    };
    Ok(Some((key_type, data)))
}

/// Compressed public key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    pub key_type: KeyType,
    pub data: [u8; PUBLIC_KEY_LEN],
}

impl PublicKey {
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.key_type.to_byte());
        out.extend_from_slice(&self.data);
    }

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let key_type = KeyType::from_byte(reader.read_u8()?, "public_key")?;
        Ok(PublicKey {
            key_type,
            data: reader.read_array()?,
        })
    }
}

impl FromStr for PublicKey {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some((key_type, data)) = split_prefixed(s, "PUB_", "public_key")? {
            return Ok(PublicKey {
                key_type,
                data: from_base58(data, key_type.suffix(), "public_key")?,
            });
        }
        if let Some(data) = s.strip_prefix(LEGACY_KEY_PREFIX) {
            return Ok(PublicKey {
                key_type: KeyType::K1,
                data: from_base58(data, "", "public_key")?,
            });
        }
        Err(AbiError::invalid("public_key", format!("unrecognized key format '{}'", s)))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = self.key_type.suffix();
        write!(f, "PUB_{}_{}", suffix, to_base58(&self.data, suffix))
    }
}

/// Recoverable signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub key_type: KeyType,
    pub data: [u8; SIGNATURE_LEN],
}

impl Signature {
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.key_type.to_byte());
        out.extend_from_slice(&self.data);
    }

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let key_type = KeyType::from_byte(reader.read_u8()?, "signature")?;
        Ok(Signature {
            key_type,
            data: reader.read_array()?,
        })
    }
}

impl FromStr for Signature {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self> {
        match split_prefixed(s, "SIG_", "signature")? {
            Some((key_type, data)) => Ok(Signature {
                key_type,
                data: from_base58(data, key_type.suffix(), "signature")?,
            }),
            None => Err(AbiError::invalid("signature", format!("unrecognized signature format '{}'", s))),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = self.key_type.suffix();
        write!(f, "SIG_{}_{}", suffix, to_base58(&self.data, suffix))
    }
}
