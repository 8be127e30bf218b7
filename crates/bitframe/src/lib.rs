//! # bitframe
//!
//! A declarative codec for bit-packed binary messages.
//!
//! Describe a message as an ordered list of unsigned, signed (two's complement)
//! and variable-length byte fields of arbitrary bit width, optionally with one
//! field holding a checksum over the rest of the message. Instances serialize
//! to tightly packed MSB-first bytes, and buffers decode back into instances,
//! including splitting a buffer into back-to-back messages.
//!
//! ## Example
//!
//! ```
//! use bitframe::{checksum::ChecksumAlgorithm, field::Unit, schema::Schema, value::Value};
//!
//! let schema = Schema::builder()
//!     .unsigned("kind", 8, "Message kind")
//!     .unsigned("len", 8, "Payload length in bytes")
//!     .variable_with_length("payload", "len", Unit::Byte, "Payload")
//!     .unsigned("sum", 8, "Sum of all other bytes")
//!     .checksum_algorithm("sum", ChecksumAlgorithm::Sum)
//!     .build()
//!     .unwrap();
//!
//! let message = schema
//!     .new_instance([
//!         ("kind", Value::from(1)),
//!         ("len", Value::from(2)),
//!         ("payload", Value::from("hi")),
//!     ])
//!     .unwrap();
//! let bytes = message.serialize();
//! assert_eq!(bytes, [0x01, 0x02, b'h', b'i', 0xD4]);
//!
//! let (decoded, rest) = schema.decode_one(&bytes);
//! assert_eq!(decoded.unwrap(), message);
//! assert!(rest.is_empty());
//! ```

pub mod bits;
pub mod checksum;
pub mod compiled;
pub mod errors;
pub mod field;
pub mod instance;
pub mod parser;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod value;

pub use errors::{CompileError, FieldError, FieldValueError, ReadError};
pub use field::{Field, FieldKind, Unit};
pub use instance::Instance;
pub use schema::{Schema, SchemaBuilder};
pub use value::Value;
