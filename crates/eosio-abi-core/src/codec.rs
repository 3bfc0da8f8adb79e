//! Schema-driven binary codec.
//!
//! Values are `serde_json::Value` trees shaped like the JSON nodeos returns:
//! structs are objects keyed by field name, lists are arrays, optionals are
//! `null` or the value and variants are `["member_type", value]`.

use crate::error::{AbiError, Result};
use crate::grammar::parse_type;
use crate::primitives::PrimitiveType;
use crate::schema::{ResolvedField, ResolvedSchema, ResolvedStruct};
use crate::stream::{write_len, write_varuint32, ByteReader};
use serde_json::{Map, Value};

/// Nesting limit for structs, guards against self-referential schemas
const MAX_DEPTH: usize = 64;

/// The parts of a field type that drive the wire layout
#[derive(Debug, Clone, Copy)]
struct Shape<'a> {
    base: &'a str,
    is_object: bool,
    is_list: bool,
    is_optional: bool,
}

impl<'a> From<&'a ResolvedField> for Shape<'a> {
    fn from(field: &'a ResolvedField) -> Self {
        Shape {
            base: &field.base_type,
            is_object: field.is_object,
            is_list: field.is_list,
            is_optional: field.is_optional,
        }
    }
}

/// Encode `value` as `type_name`. The type may be a struct or variant name, a
/// primitive, a type alias or a raw type string such as `"name[]"`.
pub fn encode(type_name: &str, value: &Value, schema: &ResolvedSchema) -> Result<Vec<u8>> {
    let (base, list, optional) = top_level(type_name, schema)?;
    let shape = Shape {
        base: &base,
        is_object: !PrimitiveType::is_primitive(&base),
        is_list: list,
        is_optional: optional,
    };
    let mut out = Vec::new();
    Codec { schema }.encode_shape(shape, value, &base, &mut out, Frame::top())?;
    Ok(out)
}

/// Decode one complete value of `type_name`; leftover bytes are an error
pub fn decode(type_name: &str, bytes: &[u8], schema: &ResolvedSchema) -> Result<Value> {
    let mut reader = ByteReader::new(bytes);
    let value = decode_from(type_name, &mut reader, schema)?;
    if !reader.is_empty() {
        return Err(AbiError::TrailingBytes(reader.remaining()));
    }
    Ok(value)
}

/// Decode one value of `type_name`, leaving the cursor just past it
pub fn decode_from(
    type_name: &str,
    reader: &mut ByteReader<'_>,
    schema: &ResolvedSchema,
) -> Result<Value> {
    let (base, list, optional) = top_level(type_name, schema)?;
    let shape = Shape {
        base: &base,
        is_object: !PrimitiveType::is_primitive(&base),
        is_list: list,
        is_optional: optional,
    };
    Codec { schema }.decode_shape(shape, reader, &base, Frame::top())
}

/// Resolve a caller-supplied type name to (base, is_list, is_optional).
/// Extension and variant-member markers only mean something inside a struct.
fn top_level(type_name: &str, schema: &ResolvedSchema) -> Result<(String, bool, bool)> {
    let mut parsed = parse_type(type_name)?;
    if let Some(target) = schema.type_alias(&parsed.base) {
        parsed = parsed.merge_alias(target, type_name)?;
    }
    if !PrimitiveType::is_primitive(&parsed.base) && !schema.contains(&parsed.base) {
        return Err(AbiError::UnknownStruct(parsed.base));
    }
    Ok((parsed.base, parsed.is_list, parsed.is_optional))
}

fn join(path: &str, name: &str) -> String {
    format!("{}.{}", path, name)
}

/// Per-value codec state: struct nesting and whether trailing binary
/// extensions may be left out at this position
#[derive(Debug, Clone, Copy)]
struct Frame {
    depth: usize,
    extensions: bool,
}

impl Frame {
    fn top() -> Self {
        Frame {
            depth: 0,
            extensions: true,
        }
    }

    fn deeper(self) -> Self {
        Frame {
            depth: self.depth + 1,
            ..self
        }
    }

    /// Extensions stay allowed only for the last field of a struct that
    /// allows them; anything followed by more bytes must be complete
    fn extensions_unless(self, allowed: bool) -> Self {
        Frame {
            extensions: self.extensions && allowed,
            ..self
        }
    }
}

struct Codec<'s> {
    schema: &'s ResolvedSchema,
}

impl<'s> Codec<'s> {
    fn encode_shape(
        &self,
        shape: Shape<'_>,
        value: &Value,
        path: &str,
        out: &mut Vec<u8>,
        frame: Frame,
    ) -> Result<()> {
        // `T[]?` is an optional list; the presence byte comes first
        if shape.is_optional {
            if value.is_null() {
                out.push(0);
                return Ok(());
            }
            out.push(1);
            let inner = Shape { is_optional: false, ..shape };
            return self.encode_shape(inner, value, path, out, frame.extensions_unless(false));
        }

        if shape.is_list {
            let items = value
                .as_array()
                .ok_or_else(|| AbiError::mismatch(path, format!("expected an array, got {}", value)))?;
            write_len(out, items.len(), path)?;
            let element = Shape { is_list: false, ..shape };
            let frame = frame.extensions_unless(false);
            for (i, item) in items.iter().enumerate() {
                self.encode_shape(element, item, &format!("{}[{}]", path, i), out, frame)?;
            }
            return Ok(());
        }

        if shape.is_object {
            let st = self.schema.get_or_err(shape.base)?;
            self.encode_struct(st, value, path, out, frame.deeper())
        } else {
            PrimitiveType::lookup(shape.base)?
                .encode(value, out)
                .map_err(|e| e.at(path))
        }
    }

    fn encode_struct(
        &self,
        st: &ResolvedStruct,
        value: &Value,
        path: &str,
        out: &mut Vec<u8>,
        frame: Frame,
    ) -> Result<()> {
        if frame.depth > MAX_DEPTH {
            return Err(AbiError::mismatch(path, "nesting too deep"));
        }
        if st.is_variant() {
            return self.encode_variant(st, value, path, out, frame);
        }

        let obj = value
            .as_object()
            .ok_or_else(|| AbiError::mismatch(path, format!("expected an object for '{}', got {}", st.name, value)))?;

        // first binary extension left out; everything after it must be absent too
        let mut omitted: Option<&str> = None;
        let last = st.fields.len().saturating_sub(1);
        for (i, field) in st.fields.iter().enumerate() {
            let field_path = join(path, &field.name);
            match obj.get(&field.name) {
                None if field.is_extension && frame.extensions => {
                    if omitted.is_none() {
                        omitted = Some(field.name.as_str());
                    }
                }
                Some(v) => {
                    if let Some(gap) = omitted {
                        return Err(AbiError::mismatch(
                            &field_path,
                            format!("present after omitted extension field '{}'", gap),
                        ));
                    }
                    let field_frame = frame.extensions_unless(i == last);
                    self.encode_shape(Shape::from(field), v, &field_path, out, field_frame)?;
                }
                None if field.is_optional && omitted.is_none() => out.push(0),
                None if field.is_extension => {
                    return Err(AbiError::mismatch(
                        &field_path,
                        "binary extension can only be omitted at the end of the encoded value",
                    ))
                }
                None => return Err(AbiError::mismatch(&field_path, "missing required field")),
            }
        }
        Ok(())
    }

    fn encode_variant(
        &self,
        st: &ResolvedStruct,
        value: &Value,
        path: &str,
        out: &mut Vec<u8>,
        frame: Frame,
    ) -> Result<()> {
        let malformed = || {
            AbiError::mismatch(
                path,
                format!("expected [\"type\", value] for variant '{}', got {}", st.name, value),
            )
        };

        let (selector, inner) = match value {
            Value::Array(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
            Value::Object(obj) if obj.len() == 1 => match obj.iter().next() {
                Some((member, inner)) => return self.encode_member(st, member, inner, path, out, frame),
                None => return Err(malformed()),
            },
            _ => return Err(malformed()),
        };

        match selector {
            Value::String(member) => self.encode_member(st, member, inner, path, out, frame),
            Value::Number(n) => {
                let tag = n
                    .as_u64()
                    .and_then(|t| u32::try_from(t).ok())
                    .ok_or_else(malformed)?;
                let slot = st.fields.get(tag as usize).ok_or_else(|| AbiError::InvalidVariantTag {
                    variant: st.name.clone(),
                    tag,
                })?;
                write_varuint32(out, tag);
                self.encode_shape(Shape::from(slot), inner, &join(path, &slot.name), out, frame)
            }
            _ => Err(malformed()),
        }
    }

    fn encode_member(
        &self,
        st: &ResolvedStruct,
        member: &str,
        inner: &Value,
        path: &str,
        out: &mut Vec<u8>,
        frame: Frame,
    ) -> Result<()> {
        let tag = st
            .fields
            .iter()
            .position(|f| f.name == member)
            .ok_or_else(|| AbiError::mismatch(path, format!("'{}' is not a member of variant '{}'", member, st.name)))?;
        let slot = &st.fields[tag];
        let tag = u32::try_from(tag).map_err(|_| AbiError::mismatch(path, "too many variant members"))?;
        write_varuint32(out, tag);
        self.encode_shape(Shape::from(slot), inner, &join(path, member), out, frame)
    }

    fn decode_shape(
        &self,
        shape: Shape<'_>,
        reader: &mut ByteReader<'_>,
        path: &str,
        frame: Frame,
    ) -> Result<Value> {
        if shape.is_optional {
            let inner = Shape { is_optional: false, ..shape };
            return match reader.read_u8()? {
                0 => Ok(Value::Null),
                1 => self.decode_shape(inner, reader, path, frame.extensions_unless(false)),
                b => Err(AbiError::mismatch(path, format!("invalid presence byte {:#04x}", b))),
            };
        }

        if shape.is_list {
            let count = reader.read_varuint32()? as usize;
            let mut items = Vec::with_capacity(count.min(reader.remaining()));
            let element = Shape { is_list: false, ..shape };
            let frame = frame.extensions_unless(false);
            let start = reader.position();
            for i in 0..count {
                items.push(self.decode_shape(element, reader, &format!("{}[{}]", path, i), frame)?);
                // zero-width elements cannot be bounded by the bytes behind them
                if i == 0 && reader.position() == start && count > reader.remaining() {
                    return Err(AbiError::mismatch(
                        path,
                        format!(
                            "count {} of zero-length elements exceeds the {} bytes remaining",
                            count,
                            reader.remaining()
                        ),
                    ));
                }
            }
            return Ok(Value::Array(items));
        }

        if shape.is_object {
            let st = self.schema.get_or_err(shape.base)?;
            self.decode_struct(st, reader, path, frame.deeper())
        } else {
            PrimitiveType::lookup(shape.base)?
                .decode(reader)
                .map_err(|e| e.at(path))
        }
    }

    fn decode_struct(
        &self,
        st: &ResolvedStruct,
        reader: &mut ByteReader<'_>,
        path: &str,
        frame: Frame,
    ) -> Result<Value> {
        if frame.depth > MAX_DEPTH {
            return Err(AbiError::mismatch(path, "nesting too deep"));
        }

        if st.is_variant() {
            let tag = reader.read_varuint32()?;
            let slot = st.fields.get(tag as usize).ok_or_else(|| AbiError::InvalidVariantTag {
                variant: st.name.clone(),
                tag,
            })?;
            let inner = self.decode_shape(Shape::from(slot), reader, &join(path, &slot.name), frame)?;
            return Ok(Value::Array(vec![Value::String(slot.name.clone()), inner]));
        }

        let mut obj = Map::with_capacity(st.fields.len());
        let last = st.fields.len().saturating_sub(1);
        for (i, field) in st.fields.iter().enumerate() {
            if field.is_extension && frame.extensions && reader.is_empty() {
                break;
            }
            let field_frame = frame.extensions_unless(i == last);
            let value = self.decode_shape(Shape::from(field), reader, &join(path, &field.name), field_frame)?;
            obj.insert(field.name.clone(), value);
        }
        Ok(Value::Object(obj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::types::AbiDefinition;
    use serde_json::json;

    fn schema(abi: Value) -> ResolvedSchema {
        let abi: AbiDefinition = serde_json::from_value(abi).unwrap();
        resolve(&abi).unwrap()
    }

    fn sample() -> ResolvedSchema {
        schema(json!({
            "version": "eosio::abi/1.1",
            "types": [{"new_type_name": "account_name", "type": "name"}],
            "structs": [
                {"name": "point", "base": "", "fields": [
                    {"name": "x", "type": "int16"},
                    {"name": "y", "type": "int16"}
                ]},
                {"name": "shape", "base": "", "fields": [
                    {"name": "owner", "type": "account_name"},
                    {"name": "points", "type": "point[]"},
                    {"name": "label", "type": "string?"},
                    {"name": "color", "type": "uint32$"},
                    {"name": "tags", "type": "string[]$"}
                ]},
                {"name": "node", "base": "", "fields": [
                    {"name": "next", "type": "node"}
                ]}
            ],
            "variants": [
                {"name": "value", "types": ["uint8", "string", "point"]}
            ]
        }))
    }

    #[test]
    fn test_struct_layout() {
        let schema = sample();
        let value = json!({
            "owner": "eosio",
            "points": [{"x": 1, "y": -1}],
            "label": null,
            "color": 7,
            "tags": []
        });
        let bytes = encode("shape", &value, &schema).unwrap();
        let mut expected = vec![0x00, 0x00, 0x00, 0x00, 0x00, 0xea, 0x30, 0x55];
        expected.extend_from_slice(&[0x01, 0x01, 0x00, 0xff, 0xff]);
        expected.push(0x00);
        expected.extend_from_slice(&[0x07, 0x00, 0x00, 0x00]);
        expected.push(0x00);
        assert_eq!(bytes, expected);
        assert_eq!(decode("shape", &bytes, &schema).unwrap(), value);
    }

    #[test]
    fn test_missing_extensions_are_omitted() {
        let schema = sample();
        let value = json!({"owner": "alice", "points": [], "label": "hi"});
        let bytes = encode("shape", &value, &schema).unwrap();
        assert_eq!(bytes.len(), 8 + 1 + 1 + 3);
        let decoded = decode("shape", &bytes, &schema).unwrap();
        assert_eq!(decoded, value);
        assert!(decoded.get("color").is_none());
    }

    #[test]
    fn test_extension_gap_rejected() {
        let schema = sample();
        let value = json!({"owner": "alice", "points": [], "label": null, "tags": ["x"]});
        let err = encode("shape", &value, &schema).unwrap_err();
        assert_eq!(
            err,
            AbiError::SchemaFieldMismatch {
                path: "shape.tags".to_string(),
                reason: "present after omitted extension field 'color'".to_string()
            }
        );
    }

    #[test]
    fn test_missing_optional_encodes_absent() {
        let schema = sample();
        let bytes = encode("shape", &json!({"owner": "alice", "points": []}), &schema).unwrap();
        assert_eq!(bytes.last(), Some(&0x00));
        let decoded = decode("shape", &bytes, &schema).unwrap();
        assert_eq!(decoded["label"], Value::Null);
    }

    #[test]
    fn test_missing_required_field() {
        let schema = sample();
        let err = encode("point", &json!({"x": 1}), &schema).unwrap_err();
        assert_eq!(
            err,
            AbiError::SchemaFieldMismatch {
                path: "point.y".to_string(),
                reason: "missing required field".to_string()
            }
        );
    }

    #[test]
    fn test_wrong_json_shape_carries_path() {
        let schema = sample();
        let err = encode("shape", &json!({"owner": 5, "points": []}), &schema).unwrap_err();
        assert!(matches!(err, AbiError::SchemaFieldMismatch { ref path, .. } if path == "shape.owner"));

        let err = encode("shape", &json!({"owner": "alice", "points": {}}), &schema).unwrap_err();
        assert!(matches!(err, AbiError::SchemaFieldMismatch { ref path, .. } if path == "shape.points"));

        let err = encode("shape", &json!({"owner": "Alice!", "points": []}), &schema).unwrap_err();
        assert!(matches!(err, AbiError::InvalidValue { ref reason, .. } if reason.contains("shape.owner")));
    }

    #[test]
    fn test_variant_forms() {
        let schema = sample();
        let by_name = encode("value", &json!(["string", "hi"]), &schema).unwrap();
        assert_eq!(by_name, vec![0x01, 0x02, b'h', b'i']);
        assert_eq!(encode("value", &json!([1, "hi"]), &schema).unwrap(), by_name);
        assert_eq!(encode("value", &json!({"string": "hi"}), &schema).unwrap(), by_name);
        assert_eq!(decode("value", &by_name, &schema).unwrap(), json!(["string", "hi"]));

        let point = encode("value", &json!(["point", {"x": 2, "y": 3}]), &schema).unwrap();
        assert_eq!(point[0], 0x02);
        assert_eq!(
            decode("value", &point, &schema).unwrap(),
            json!(["point", {"x": 2, "y": 3}])
        );
    }

    #[test]
    fn test_variant_errors() {
        let schema = sample();
        assert_eq!(
            decode("value", &[0x03, 0x00], &schema).unwrap_err(),
            AbiError::InvalidVariantTag {
                variant: "value".to_string(),
                tag: 3
            }
        );
        assert!(matches!(
            encode("value", &json!([5, 1]), &schema),
            Err(AbiError::InvalidVariantTag { tag: 5, .. })
        ));
        assert!(matches!(
            encode("value", &json!(["int64", 1]), &schema),
            Err(AbiError::SchemaFieldMismatch { .. })
        ));
        assert!(encode("value", &json!("uint8"), &schema).is_err());
    }

    #[test]
    fn test_raw_type_strings() {
        let schema = sample();
        let bytes = encode("account_name[]", &json!(["eosio", "alice"]), &schema).unwrap();
        assert_eq!(bytes[0], 0x02);
        assert_eq!(bytes.len(), 17);
        assert_eq!(
            decode("name[]", &bytes, &schema).unwrap(),
            json!(["eosio", "alice"])
        );
        assert_eq!(encode("uint8?", &Value::Null, &schema).unwrap(), vec![0x00]);
        assert_eq!(encode("uint8?", &json!(9), &schema).unwrap(), vec![0x01, 0x09]);
        assert!(matches!(
            encode("ghost", &json!({}), &schema),
            Err(AbiError::UnknownStruct(_))
        ));
    }

    #[test]
    fn test_truncated_and_trailing() {
        let schema = sample();
        assert!(matches!(
            decode("point", &[0x01, 0x00, 0x02], &schema),
            Err(AbiError::TruncatedBuffer { .. })
        ));
        assert_eq!(
            decode("point", &[0x01, 0x00, 0x02, 0x00, 0xff], &schema).unwrap_err(),
            AbiError::TrailingBytes(1)
        );

        let bytes = [0x01, 0x00, 0x02, 0x00, 0xff];
        let mut reader = ByteReader::new(&bytes);
        let value = decode_from("point", &mut reader, &schema).unwrap();
        assert_eq!(value, json!({"x": 1, "y": 2}));
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_invalid_presence_byte() {
        let schema = sample();
        assert!(matches!(
            decode("uint8?", &[0x02, 0x00], &schema),
            Err(AbiError::SchemaFieldMismatch { .. })
        ));
    }

    #[test]
    fn test_self_referential_struct_is_bounded() {
        let schema = sample();
        let err = decode("node", &[], &schema).unwrap_err();
        assert!(matches!(err, AbiError::SchemaFieldMismatch { .. }));
    }

    #[test]
    fn test_huge_list_count_does_not_preallocate() {
        let schema = sample();
        // count = u32::MAX with no elements behind it
        let bytes = [0xff, 0xff, 0xff, 0xff, 0x0f];
        assert!(matches!(
            decode("uint8[]", &bytes, &schema),
            Err(AbiError::TruncatedBuffer { .. })
        ));
    }

    fn nested() -> ResolvedSchema {
        schema(json!({
            "version": "eosio::abi/1.1",
            "structs": [
                {"name": "inner", "base": "", "fields": [
                    {"name": "x", "type": "uint8"},
                    {"name": "y", "type": "uint8$"}
                ]},
                {"name": "outer", "base": "", "fields": [
                    {"name": "a", "type": "inner"},
                    {"name": "b", "type": "uint16"}
                ]},
                {"name": "tail", "base": "", "fields": [
                    {"name": "b", "type": "uint16"},
                    {"name": "a", "type": "inner"}
                ]},
                {"name": "empty", "base": "", "fields": []}
            ]
        }))
    }

    #[test]
    fn test_extension_in_non_final_field_must_be_present() {
        let schema = nested();
        let err = encode("outer", &json!({"a": {"x": 1}, "b": 515}), &schema).unwrap_err();
        match err {
            AbiError::SchemaFieldMismatch { path, .. } => assert_eq!(path, "outer.a.y"),
            other => panic!("unexpected error {:?}", other),
        }

        let bytes = encode("outer", &json!({"a": {"x": 1, "y": 3}, "b": 515}), &schema).unwrap();
        assert_eq!(bytes, vec![1, 3, 3, 2]);
        // a missing `y` would leave `b` one byte short
        assert!(matches!(
            decode("outer", &[1, 3, 2], &schema),
            Err(AbiError::TruncatedBuffer { .. })
        ));
    }

    #[test]
    fn test_extension_in_final_field_may_be_omitted() {
        let schema = nested();
        let value = json!({"b": 515, "a": {"x": 1}});
        let bytes = encode("tail", &value, &schema).unwrap();
        assert_eq!(bytes, vec![3, 2, 1]);
        assert_eq!(decode("tail", &bytes, &schema).unwrap(), value);
    }

    #[test]
    fn test_extension_inside_list_element_must_be_present() {
        let schema = nested();
        let err = encode("inner[]", &json!([{"x": 1, "y": 2}, {"x": 3}]), &schema).unwrap_err();
        match err {
            AbiError::SchemaFieldMismatch { path, .. } => assert_eq!(path, "inner[1].y"),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(encode("inner?", &json!({"x": 1}), &schema).is_err());

        let bytes = encode("inner[]", &json!([{"x": 1, "y": 2}]), &schema).unwrap();
        assert_eq!(bytes, vec![1, 1, 2]);
        assert!(decode("inner[]", &[1, 1], &schema).is_err());
    }

    #[test]
    fn test_zero_length_elements_bounded_by_input() {
        let schema = nested();
        let mut bytes = Vec::new();
        write_varuint32(&mut bytes, 5_000_000);
        assert!(matches!(
            decode("empty[]", &bytes, &schema),
            Err(AbiError::SchemaFieldMismatch { .. })
        ));

        let bytes = [0x02, 0xaa, 0xbb];
        let mut reader = ByteReader::new(&bytes);
        let value = decode_from("empty[]", &mut reader, &schema).unwrap();
        assert_eq!(value, json!([{}, {}]));
        assert_eq!(reader.position(), 1);
    }
}
