//! Message framing: decoding one message, a run of back-to-back messages, or
//! just checking whether a buffer starts with a valid message.
//!
//! Any decode failure (short buffer, bad checksum) yields no message and
//! leaves the input untouched.

use tracing::{debug, trace};

use crate::{
    bits::BitReader,
    errors::DecodeError,
    instance::Instance,
    schema::Schema,
    value::Value,
};

/// Decodes the message at the start of `data`.
///
/// Returns the message (if valid) and the bytes after it. Without a valid
/// message the leftover is the whole of `data`.
pub fn decode_one<'s, 'd>(schema: &'s Schema, data: &'d [u8]) -> (Option<Instance<'s>>, &'d [u8]) {
    match try_decode(schema, data) {
        Ok((instance, consumed)) => (Some(instance), &data[consumed..]),
        Err(err) => {
            trace!(error = %err, len = data.len(), "no message at start of buffer");
            (None, data)
        }
    }
}

/// Decodes consecutive messages until one fails or the data runs out.
///
/// Stops early if a message occupies no bytes, since decoding it again would never progress.
pub fn decode_many<'s, 'd>(schema: &'s Schema, data: &'d [u8]) -> (Vec<Instance<'s>>, &'d [u8]) {
    let mut messages = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        let (Some(message), next) = decode_one(schema, rest) else {
            break;
        };
        if next.len() == rest.len() {
            break;
        }

        messages.push(message);
        rest = next;
    }

    debug!(
        messages = messages.len(),
        consumed = data.len() - rest.len(),
        leftover = rest.len(),
        "split message sequence"
    );

    (messages, rest)
}

/// Whether `data` starts with a valid message.
pub fn is_valid(schema: &Schema, data: &[u8]) -> bool {
    decode_one(schema, data).0.is_some()
}

/// Decodes one message, returning it with the number of whole bytes it spans.
pub(crate) fn try_decode<'s>(
    schema: &'s Schema,
    data: &[u8],
) -> Result<(Instance<'s>, usize), DecodeError> {
    let mut reader = BitReader::new(data);
    let mut values: Vec<Value> = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let raw = field.decode(&mut reader, &values).inspect_err(|err| {
            trace!(field = %field.name, error = %err, "field decode failed");
        })?;
        values.push(field.validate(raw)?);
    }

    let checksum = schema
        .compiled_checksum()
        .map(|c| values[c.index].as_u64().unwrap_or_default());
    let instance = Instance::from_decoded(schema, values);

    if let Some(decoded) = checksum {
        let computed = instance.compute_checksum();
        if computed != decoded {
            trace!(decoded, computed, "checksum mismatch");
            return Err(DecodeError::ChecksumMismatch { decoded, computed });
        }
        instance.cache_checksum(decoded);
    }

    Ok((instance, reader.consumed_bytes()))
}

impl Schema {
    /// See [decode_one].
    pub fn decode_one<'s, 'd>(&'s self, data: &'d [u8]) -> (Option<Instance<'s>>, &'d [u8]) {
        decode_one(self, data)
    }

    /// See [decode_many].
    pub fn decode_many<'s, 'd>(&'s self, data: &'d [u8]) -> (Vec<Instance<'s>>, &'d [u8]) {
        decode_many(self, data)
    }

    /// See [is_valid].
    pub fn is_valid(&self, data: &[u8]) -> bool {
        is_valid(self, data)
    }
}
