//! Definition of logical fields used to build a [crate::schema::Schema].

use std::fmt;

/// A single named field in a message layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Name used to get and set the field's value.
    pub name: String,
    /// Value type and codec used on the wire.
    pub kind: FieldKind,
    /// Bit width for integer fields; fixed byte count (if any) for variable fields.
    pub size: Option<usize>,
    /// Free-form documentation. Has no effect on encoding.
    pub description: String,
    pub options: FieldOptions,
}

impl Field {
    pub fn new(kind: FieldKind, name: impl Into<String>, size: Option<usize>) -> Self {
        Field {
            name: name.into(),
            kind,
            size,
            description: String::new(),
            options: FieldOptions::default(),
        }
    }

    /// Unsigned integer of `bits` bits.
    pub fn unsigned(name: impl Into<String>, bits: usize) -> Self {
        Self::new(FieldKind::Unsigned, name, Some(bits))
    }

    /// Two's-complement signed integer of `bits` bits.
    pub fn signed(name: impl Into<String>, bits: usize) -> Self {
        Self::new(FieldKind::Signed, name, Some(bits))
    }

    /// Byte run sized by its own value, or by `bytes` when given.
    pub fn variable(name: impl Into<String>, bytes: Option<usize>) -> Self {
        Self::new(FieldKind::Variable, name, bytes)
    }

    /// Byte run whose length is the value of the earlier field `length_ref`.
    pub fn variable_with_length(
        name: impl Into<String>,
        length_ref: impl Into<String>,
        unit: Unit,
    ) -> Self {
        Field {
            options: FieldOptions {
                length_ref: Some(length_ref.into()),
                unit,
            },
            ..Self::new(FieldKind::Variable, name, None)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// The value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Unsigned,
    Signed,
    Variable,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Unsigned => "unsigned",
            FieldKind::Signed => "signed",
            FieldKind::Variable => "variable",
        })
    }
}

/// Extra sizing options for variable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Name of an earlier unsigned field holding this field's length.
    pub length_ref: Option<String>,
    /// Unit the referenced length is counted in.
    pub unit: Unit,
}

/// Unit of a referenced length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Unit {
    Bit,
    #[default]
    Byte,
}

impl Unit {
    pub fn bits(self) -> usize {
        match self {
            Unit::Bit => 1,
            Unit::Byte => 8,
        }
    }
}
