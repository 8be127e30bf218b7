//! Field values of one message, with validated mutation and a cached checksum.

use std::{cell::OnceCell, collections::BTreeMap, fmt};

use crate::{
    bits::BitWriter,
    errors::FieldError,
    schema::Schema,
    value::Value,
};

/// One message laid out by a [Schema].
///
/// The checksum field, if any, is computed on first read and cached until any
/// other field changes. Instances are not `Sync`: the cache is filled through a
/// shared reference.
#[derive(Clone)]
pub struct Instance<'s> {
    schema: &'s Schema,
    values: Vec<Value>,
    checksum: OnceCell<Value>,
}

impl<'s> Instance<'s> {
    /// Every field at its default: zero for integers, empty for byte runs.
    pub fn empty(schema: &'s Schema) -> Self {
        Instance {
            schema,
            values: schema.fields().iter().map(|f| f.kind.default_value()).collect(),
            checksum: OnceCell::new(),
        }
    }

    /// Starts from [Instance::empty] and sets each of `values` in order.
    pub fn new<I, K, V>(schema: &'s Schema, values: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut instance = Self::empty(schema);
        for (name, value) in values {
            instance.set(name.as_ref(), value)?;
        }

        Ok(instance)
    }

    /// Wraps decoded values. The checksum cache starts out empty.
    pub(crate) fn from_decoded(schema: &'s Schema, values: Vec<Value>) -> Self {
        Instance {
            schema,
            values,
            checksum: OnceCell::new(),
        }
    }

    /// Marks `checksum` as the up-to-date checksum value.
    pub(crate) fn cache_checksum(&self, checksum: u64) {
        let _ = self.checksum.set(Value::U64(checksum));
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Current value of `name`. Reading the checksum field computes it if stale.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let position = self.schema.position(name)?;
        Some(self.value_at(position))
    }

    fn value_at(&self, position: usize) -> &Value {
        match self.schema.compiled_checksum() {
            Some(c) if c.index == position => self
                .checksum
                .get_or_init(|| Value::U64(self.compute_checksum())),
            _ => &self.values[position],
        }
    }

    /// Validates and stores `value`. On error the previous value is kept.
    ///
    /// Setting any field other than the checksum field invalidates the cached checksum.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let position = self
            .schema
            .position(name)
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))?;
        let value = self.schema.fields()[position].validate(value.into())?;

        let is_checksum = self
            .schema
            .compiled_checksum()
            .is_some_and(|c| c.index == position);
        if is_checksum {
            if self.checksum.get().is_some() {
                self.checksum = OnceCell::from(value.clone());
            }
        } else {
            self.checksum.take();
        }

        self.values[position] = value;
        Ok(())
    }

    /// Whether the cached checksum matches the current field values.
    pub fn checksum_cached(&self) -> bool {
        self.checksum.get().is_some()
    }

    /// Packs every field in wire order. Computes the checksum first if it is stale.
    pub fn serialize(&self) -> Vec<u8> {
        let checksum = self
            .schema
            .compiled_checksum()
            .map(|c| (c.index, self.value_at(c.index)));

        self.encode(checksum)
    }

    /// Checksum of the current values, computed with the checksum field zeroed.
    pub(crate) fn compute_checksum(&self) -> u64 {
        match self.schema.compiled_checksum() {
            Some(c) => {
                let zero = Value::U64(0);
                c.checksum.compute(&self.encode(Some((c.index, &zero))), c.bits)
            }
            None => 0,
        }
    }

    /// Encodes all fields, substituting `checksum.1` at position `checksum.0`.
    fn encode(&self, checksum: Option<(usize, &Value)>) -> Vec<u8> {
        let mut writer = BitWriter::new();

        for (position, field) in self.schema.fields().iter().enumerate() {
            let value = match checksum {
                Some((index, value)) if index == position => value,
                _ => &self.values[position],
            };
            field.encode(value, &self.values, &mut writer);
        }

        writer.into_bytes()
    }

    /// `(name, value)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.schema
            .fields()
            .iter()
            .enumerate()
            .map(|(position, field)| (field.name.as_str(), self.value_at(position)))
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

impl PartialEq for Instance<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
