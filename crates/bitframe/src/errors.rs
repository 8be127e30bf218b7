//! Error types for schema compilation, bit reading and field access.

use thiserror::Error;

use crate::{field::FieldKind, value::Value};

/// Errors produced when compiling [crate::field::Field]s into a [crate::schema::Schema].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Field name is empty.
    #[error("field name must not be empty")]
    EmptyFieldName,
    /// Two fields share a name.
    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),
    /// Integer field size is missing, 0 or greater than 64 bits.
    #[error("field '{field}' has invalid size {size:?}: integer fields need 1..=64 bits")]
    InvalidFieldSize { field: String, size: Option<usize> },
    /// `length_ref` names a field that is not declared before this one.
    #[error("field '{field}' takes its length from '{length_ref}', which is not declared before it")]
    UnknownLengthRef { field: String, length_ref: String },
    /// `length_ref` names a field that cannot carry a length.
    #[error("field '{field}' takes its length from '{length_ref}', which is not an unsigned field")]
    InvalidLengthRef { field: String, length_ref: String },
    /// A variable field sized by its own value is followed by other fields.
    #[error("variable field '{0}' has no width and must be the last field")]
    UnboundedFieldNotLast(String),
    /// The checksum names a field that does not exist.
    #[error("checksum field '{0}' is not declared")]
    UnknownChecksumField(String),
    /// A variable field takes its length from the checksum field.
    #[error("field '{field}' takes its length from checksum field '{checksum}'")]
    ChecksumUsedAsLength { field: String, checksum: String },
    /// The checksum field is not an unsigned field.
    #[error("checksum field '{0}' must be an unsigned field")]
    InvalidChecksumField(String),
}

/// Errors produced when reading bits from a byte slice.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// Fewer bits remain than were requested.
    #[error("buffer underrun: requested {requested} bits, {remaining} remaining")]
    BufferUnderrun { requested: usize, remaining: usize },
    /// More than 64 bits were requested in a single integer read.
    #[error("cannot read {0} bits into a 64-bit integer")]
    TooManyBitsRead(usize),
}

/// A value was offered to a field whose codec rejects it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value {value:?} for {kind} field '{field}'")]
pub struct FieldValueError {
    pub kind: FieldKind,
    pub field: String,
    pub value: Value,
}

/// Errors returned by [crate::instance::Instance] setters and constructors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("no field named '{0}'")]
    UnknownField(String),
    #[error(transparent)]
    InvalidValue(#[from] FieldValueError),
}

/// Reasons a buffer does not hold a message. Folded into an absent result by the parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum DecodeError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Value(#[from] FieldValueError),
    #[error("checksum mismatch: decoded {decoded:#x}, computed {computed:#x}")]
    ChecksumMismatch { decoded: u64, computed: u64 },
}
