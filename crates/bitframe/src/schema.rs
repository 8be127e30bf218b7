//! Schema: compiled, immutable message layout. Build one with [SchemaBuilder] or
//! [Schema::compile], then create [Instance]s from it or decode buffers with it.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    checksum::{Checksum, ChecksumAlgorithm},
    compiled::{CompiledField, CompiledFieldKind, VariableWidth},
    errors::{CompileError, FieldError},
    field::{Field, FieldKind, Unit},
    instance::Instance,
    value::Value,
};

/// A compiled message layout: fields in wire order plus an optional checksum.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<CompiledField>,
    index: HashMap<String, usize>,
    checksum: Option<CompiledChecksum>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledChecksum {
    pub(crate) checksum: Checksum,
    pub(crate) index: usize,
    pub(crate) bits: usize,
}

impl Schema {
    /// Compiles a slice of [Field]s into a schema without a checksum.
    pub fn compile(fields: &[Field]) -> Result<Self, CompileError> {
        Self::compile_with_checksum(fields, None)
    }

    /// Compiles `fields` and binds `checksum` to one of them.
    pub fn compile_with_checksum(
        fields: &[Field],
        checksum: Option<Checksum>,
    ) -> Result<Self, CompileError> {
        let mut compiled_fields: Vec<CompiledField> = Vec::with_capacity(fields.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(fields.len());

        for (position, field) in fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(CompileError::EmptyFieldName);
            }
            if index.contains_key(&field.name) {
                return Err(CompileError::DuplicateField(field.name.clone()));
            }

            let kind = compile_kind(field, &index, &compiled_fields)?;
            if kind == CompiledFieldKind::Variable(VariableWidth::Remaining)
                && position + 1 != fields.len()
            {
                return Err(CompileError::UnboundedFieldNotLast(field.name.clone()));
            }

            index.insert(field.name.clone(), position);
            compiled_fields.push(CompiledField {
                name: field.name.clone(),
                description: field.description.clone(),
                kind,
            });
        }

        let checksum = match checksum {
            Some(checksum) => {
                let position = *index
                    .get(&checksum.field)
                    .ok_or_else(|| CompileError::UnknownChecksumField(checksum.field.clone()))?;
                let CompiledFieldKind::Unsigned { bits } = compiled_fields[position].kind else {
                    return Err(CompileError::InvalidChecksumField(checksum.field));
                };

                // The checksum is written after every length is resolved, so it cannot size a field.
                if let Some(field) = compiled_fields.iter().find(|f| {
                    matches!(
                        f.kind,
                        CompiledFieldKind::Variable(VariableWidth::LengthRef { index, .. }) if index == position
                    )
                }) {
                    return Err(CompileError::ChecksumUsedAsLength {
                        field: field.name.clone(),
                        checksum: checksum.field,
                    });
                }

                Some(CompiledChecksum {
                    checksum,
                    index: position,
                    bits,
                })
            }
            None => None,
        };

        debug!(
            fields = compiled_fields.len(),
            checksum = checksum.as_ref().map(|c| c.checksum.field.as_str()),
            "compiled schema"
        );

        Ok(Self {
            fields: compiled_fields,
            index,
            checksum,
        })
    }

    /// Compiled fields in definition order.
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Position of the field called `name` in wire order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.position(name).map(|i| &self.fields[i])
    }

    /// Name of the checksum field, if the schema declares one.
    pub fn checksum_field(&self) -> Option<&str> {
        self.checksum.as_ref().map(|c| c.checksum.field.as_str())
    }

    pub(crate) fn compiled_checksum(&self) -> Option<&CompiledChecksum> {
        self.checksum.as_ref()
    }

    /// Creates an instance with every field at its default, then applies `values` in order.
    pub fn new_instance<I, K, V>(&self, values: I) -> Result<Instance<'_>, FieldError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Instance::new(self, values)
    }

    /// Creates an instance with every field at its default value.
    pub fn default_instance(&self) -> Instance<'_> {
        Instance::empty(self)
    }
}

fn compile_kind(
    field: &Field,
    index: &HashMap<String, usize>,
    earlier: &[CompiledField],
) -> Result<CompiledFieldKind, CompileError> {
    let integer_bits = || match field.size {
        Some(bits @ 1..=64) => Ok(bits),
        size => Err(CompileError::InvalidFieldSize {
            field: field.name.clone(),
            size,
        }),
    };

    match field.kind {
        FieldKind::Unsigned => Ok(CompiledFieldKind::Unsigned {
            bits: integer_bits()?,
        }),
        FieldKind::Signed => Ok(CompiledFieldKind::Signed {
            bits: integer_bits()?,
        }),
        FieldKind::Variable => {
            if let Some(bytes) = field.size {
                return Ok(CompiledFieldKind::Variable(VariableWidth::Fixed { bytes }));
            }

            let Some(length_ref) = &field.options.length_ref else {
                return Ok(CompiledFieldKind::Variable(VariableWidth::Remaining));
            };

            let position = *index
                .get(length_ref)
                .ok_or_else(|| CompileError::UnknownLengthRef {
                    field: field.name.clone(),
                    length_ref: length_ref.clone(),
                })?;
            if !matches!(earlier[position].kind, CompiledFieldKind::Unsigned { .. }) {
                return Err(CompileError::InvalidLengthRef {
                    field: field.name.clone(),
                    length_ref: length_ref.clone(),
                });
            }

            Ok(CompiledFieldKind::Variable(VariableWidth::LengthRef {
                index: position,
                unit: field.options.unit,
            }))
        }
    }
}

/// Collects field definitions and an optional checksum, then compiles them into a [Schema].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
    checksum: Option<Checksum>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn unsigned(self, name: &str, bits: usize, description: &str) -> Self {
        self.define_field(Field::unsigned(name, bits).with_description(description))
    }

    pub fn signed(self, name: &str, bits: usize, description: &str) -> Self {
        self.define_field(Field::signed(name, bits).with_description(description))
    }

    /// Variable field of `bytes` bytes, or sized by its own value when `None`.
    pub fn variable(self, name: &str, bytes: Option<usize>, description: &str) -> Self {
        self.define_field(Field::variable(name, bytes).with_description(description))
    }

    pub fn variable_with_length(
        self,
        name: &str,
        length_ref: &str,
        unit: Unit,
        description: &str,
    ) -> Self {
        self.define_field(
            Field::variable_with_length(name, length_ref, unit).with_description(description),
        )
    }

    /// Stores the result of `function` in the unsigned field `field`.
    pub fn define_checksum<F>(mut self, field: &str, function: F) -> Self
    where
        F: Fn(&[u8]) -> u64 + Send + Sync + 'static,
    {
        self.checksum = Some(Checksum::new(field, function));
        self
    }

    pub fn checksum_algorithm(mut self, field: &str, algorithm: ChecksumAlgorithm) -> Self {
        self.checksum = Some(Checksum::with_algorithm(field, algorithm));
        self
    }

    pub fn build(self) -> Result<Schema, CompileError> {
        Schema::compile_with_checksum(&self.fields, self.checksum)
    }
}
