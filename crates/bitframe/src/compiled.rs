//! Compiled fields and their codecs: validation, encoding and decoding per field kind.

use crate::{
    bits::{BitReader, BitWriter, bytes_for_bits},
    errors::{FieldValueError, ReadError},
    field::{FieldKind, Unit},
    value::Value,
};

/// A field after schema compilation: name plus a resolved codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledField {
    pub name: String,
    pub description: String,
    pub(crate) kind: CompiledFieldKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledFieldKind {
    Unsigned { bits: usize },
    Signed { bits: usize },
    Variable(VariableWidth),
}

/// How a variable field's width is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableWidth {
    /// Always exactly this many bytes.
    Fixed { bytes: usize },
    /// Length taken from the value of the field at `index`.
    LengthRef { index: usize, unit: Unit },
    /// Length of the supplied value on encode; every remaining whole byte on decode.
    Remaining,
}

impl CompiledFieldKind {
    pub fn field_kind(&self) -> FieldKind {
        match self {
            CompiledFieldKind::Unsigned { .. } => FieldKind::Unsigned,
            CompiledFieldKind::Signed { .. } => FieldKind::Signed,
            CompiledFieldKind::Variable(_) => FieldKind::Variable,
        }
    }

    /// Value a field holds before anything is assigned to it.
    pub fn default_value(&self) -> Value {
        match self {
            CompiledFieldKind::Unsigned { .. } => Value::U64(0),
            CompiledFieldKind::Signed { .. } => Value::I64(0),
            CompiledFieldKind::Variable(_) => Value::Bytes(Vec::new()),
        }
    }
}

impl CompiledField {
    /// Resolved codec. Integer widths are always within 1..=64.
    pub fn kind(&self) -> &CompiledFieldKind {
        &self.kind
    }

    fn reject(&self, value: Value) -> FieldValueError {
        FieldValueError {
            kind: self.kind.field_kind(),
            field: self.name.clone(),
            value,
        }
    }

    /// Checks `value` against this field's range and returns it in the field's native variant.
    pub fn validate(&self, value: Value) -> Result<Value, FieldValueError> {
        match self.kind {
            CompiledFieldKind::Unsigned { bits } => match value.as_int() {
                Some(v) if (0..1i128 << bits).contains(&v) => Ok(Value::U64(v as u64)),
                _ => Err(self.reject(value)),
            },
            CompiledFieldKind::Signed { bits } => {
                let half = 1i128 << (bits - 1);
                match value.as_int() {
                    Some(v) if (-half..half).contains(&v) => Ok(Value::I64(v as i64)),
                    _ => Err(self.reject(value)),
                }
            }
            CompiledFieldKind::Variable(_) => match value {
                Value::Bytes(_) => Ok(value),
                _ => Err(self.reject(value)),
            },
        }
    }

    /// Appends `value` to `writer`. `siblings` holds the values of every field, in schema order.
    ///
    /// `value` must already have passed [CompiledField::validate].
    pub fn encode(&self, value: &Value, siblings: &[Value], writer: &mut BitWriter) {
        match &self.kind {
            CompiledFieldKind::Unsigned { bits } => {
                writer.append(value.as_u64().unwrap_or_default(), *bits);
            }
            CompiledFieldKind::Signed { bits } => {
                let v = value.as_int().unwrap_or_default();
                writer.append(v.rem_euclid(1i128 << bits) as u64, *bits);
            }
            CompiledFieldKind::Variable(width) => {
                let data = value.as_bytes().unwrap_or_default();
                // A length too large for usize can never be decoded; write the value as supplied.
                let bits = width
                    .referenced_bits(siblings)
                    .unwrap_or(data.len() * 8);

                let mut padded = data.to_vec();
                padded.resize(bytes_for_bits(bits), 0);

                if bits % 8 == 0 {
                    writer.append_bytes(&padded);
                } else {
                    writer.append_bits_from(&padded, bits);
                }
            }
        }
    }

    /// Reads this field's value. `decoded` holds the values of every earlier field.
    pub fn decode(&self, reader: &mut BitReader<'_>, decoded: &[Value]) -> Result<Value, ReadError> {
        match &self.kind {
            CompiledFieldKind::Unsigned { bits } => Ok(Value::U64(reader.read(*bits)?)),
            CompiledFieldKind::Signed { bits } => {
                let raw = reader.read(*bits)?;
                let value = if (raw >> (bits - 1)) & 1 == 1 {
                    raw as i128 - (1i128 << bits)
                } else {
                    raw as i128
                };

                Ok(Value::I64(value as i64))
            }
            CompiledFieldKind::Variable(width) => {
                let bits = match width {
                    VariableWidth::Remaining => reader.remaining_bits() / 8 * 8,
                    _ => width
                        .referenced_bits(decoded)
                        .ok_or(ReadError::BufferUnderrun {
                            requested: usize::MAX,
                            remaining: reader.remaining_bits(),
                        })?,
                };

                Ok(Value::Bytes(reader.read_bits_as_bytes(bits)?))
            }
        }
    }
}

impl VariableWidth {
    /// Width in bits for fixed and referenced widths. `None` if the length does not fit in `usize`.
    fn referenced_bits(&self, values: &[Value]) -> Option<usize> {
        match *self {
            VariableWidth::Fixed { bytes } => bytes.checked_mul(8),
            VariableWidth::LengthRef { index, unit } => {
                let len = values.get(index)?.as_u64()?;
                usize::try_from(len).ok()?.checked_mul(unit.bits())
            }
            VariableWidth::Remaining => None,
        }
    }
}
