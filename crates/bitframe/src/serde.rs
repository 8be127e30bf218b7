//! Serde-deserializable schema description.
//!
//! These types describe a message layout as data, e.g. a JSON schema file shipped
//! with your application, and compile into a [crate::schema::Schema]. Checksums
//! refer to one of the built-in [crate::checksum::ChecksumAlgorithm]s.

use serde::{Deserialize, Serialize};

use crate::{
    checksum::{Checksum, ChecksumAlgorithm},
    errors::CompileError,
    field::{Field, FieldKind, FieldOptions, Unit},
    schema::Schema,
};

/// Top-level schema definition.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaDef {
    /// Fields in wire order.
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub checksum: Option<ChecksumDef>,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKindDef,
    /// Bits for integer fields, bytes for fixed-size variable fields.
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub description: String,
    /// Earlier field holding this variable field's length.
    #[serde(default)]
    pub length_ref: Option<String>,
    #[serde(default)]
    pub unit: UnitDef,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FieldKindDef {
    Unsigned,
    Signed,
    Variable,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum UnitDef {
    Bit,
    #[default]
    Byte,
}

/// Checksum stored in `field`, computed with `algorithm`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChecksumDef {
    pub field: String,
    pub algorithm: ChecksumAlgorithmDef,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumAlgorithmDef {
    Sum,
    Xor,
    TwosComplementSum,
}

impl From<FieldKindDef> for FieldKind {
    fn from(value: FieldKindDef) -> Self {
        match value {
            FieldKindDef::Unsigned => FieldKind::Unsigned,
            FieldKindDef::Signed => FieldKind::Signed,
            FieldKindDef::Variable => FieldKind::Variable,
        }
    }
}

impl From<UnitDef> for Unit {
    fn from(value: UnitDef) -> Self {
        match value {
            UnitDef::Bit => Unit::Bit,
            UnitDef::Byte => Unit::Byte,
        }
    }
}

impl From<ChecksumAlgorithmDef> for ChecksumAlgorithm {
    fn from(value: ChecksumAlgorithmDef) -> Self {
        match value {
            ChecksumAlgorithmDef::Sum => ChecksumAlgorithm::Sum,
            ChecksumAlgorithmDef::Xor => ChecksumAlgorithm::Xor,
            ChecksumAlgorithmDef::TwosComplementSum => ChecksumAlgorithm::TwosComplementSum,
        }
    }
}

impl From<FieldDef> for Field {
    fn from(value: FieldDef) -> Self {
        Field {
            name: value.name,
            kind: value.kind.into(),
            size: value.size,
            description: value.description,
            options: FieldOptions {
                length_ref: value.length_ref,
                unit: value.unit.into(),
            },
        }
    }
}

impl TryFrom<SchemaDef> for Schema {
    type Error = CompileError;

    fn try_from(value: SchemaDef) -> Result<Self, Self::Error> {
        let fields: Vec<Field> = value.fields.into_iter().map(Into::into).collect();
        let checksum = value
            .checksum
            .map(|c| Checksum::with_algorithm(c.field, c.algorithm.into()));

        Schema::compile_with_checksum(&fields, checksum)
    }
}
