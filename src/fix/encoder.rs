//! Tag-value message encoder
//!
//! Produces complete wire messages of the form
//!
//! ```text
//! 8=FIX.4.2|9=<len>|35=<type>|49=..|56=..|34=..|52=..|<body>|10=<ccc>|\n
//! ```
//!
//! BodyLength covers everything after the `9=` field up to and including the
//! delimiter before `10=`. The checksum is the byte sum, mod 256, of everything
//! before `10=`.

use chrono::{DateTime, Utc};

use super::message::{FixBody, FixField, Header, MessageKind};
use super::tags;
use crate::error::EncodingError;

/// SendingTime format, UTC with second precision
pub const SENDING_TIME_FORMAT: &str = "%Y%m%d-%H:%M:%S";

pub fn format_sending_time(time: DateTime<Utc>) -> String {
    time.format(SENDING_TIME_FORMAT).to_string()
}

/// Byte sum modulo 256
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Encode a message of `kind` from its header and body fields.
///
/// Body fields may be supplied in any order. Every tag required by `kind`
/// must appear exactly once, and no other tag may appear.
pub fn encode(
    kind: MessageKind,
    header: &Header<'_>,
    fields: &[FixField],
) -> Result<Vec<u8>, EncodingError> {
    let ordered = canonical_body(kind, fields)?;

    let mut body = Vec::with_capacity(64 + ordered.len() * 12);
    push_field(&mut body, tags::MSG_TYPE, kind.msg_type())?;
    push_field(&mut body, tags::SENDER_COMP_ID, header.sender_comp_id)?;
    push_field(&mut body, tags::TARGET_COMP_ID, header.target_comp_id)?;
    push_field(&mut body, tags::MSG_SEQ_NUM, &header.msg_seq_num.to_string())?;
    push_field(
        &mut body,
        tags::SENDING_TIME,
        &format_sending_time(header.sending_time),
    )?;
    for field in ordered {
        push_field(&mut body, field.tag, &field.value)?;
    }

    let mut message = Vec::with_capacity(body.len() + 32);
    push_field(&mut message, tags::BEGIN_STRING, tags::BEGIN_STRING_VALUE)?;
    push_field(&mut message, tags::BODY_LENGTH, &body.len().to_string())?;
    message.extend_from_slice(&body);

    let sum = checksum(&message);
    push_field(&mut message, tags::CHECKSUM, &format!("{:03}", sum))?;
    message.push(tags::MESSAGE_TERMINATOR);

    Ok(message)
}

/// Encode a typed body
pub fn encode_message<B: FixBody + ?Sized>(
    header: &Header<'_>,
    body: &B,
) -> Result<Vec<u8>, EncodingError> {
    encode(body.kind(), header, &body.fields()?)
}

fn canonical_body(kind: MessageKind, fields: &[FixField]) -> Result<Vec<&FixField>, EncodingError> {
    let required = kind.body_tags();

    if let Some(extra) = fields.iter().find(|f| !required.contains(&f.tag)) {
        return Err(EncodingError::UnexpectedField {
            kind,
            tag: extra.tag,
        });
    }

    let mut ordered = Vec::with_capacity(required.len());
    for &tag in required {
        let mut matches = fields.iter().filter(|f| f.tag == tag);
        let field = matches
            .next()
            .ok_or(EncodingError::MissingField { kind, tag })?;
        if matches.next().is_some() {
            return Err(EncodingError::DuplicateField { kind, tag });
        }
        ordered.push(field);
    }
    Ok(ordered)
}

fn push_field(buf: &mut Vec<u8>, tag: u32, value: &str) -> Result<(), EncodingError> {
    if value.is_empty()
        || value
            .bytes()
            .any(|b| b == tags::FIELD_DELIMITER || b == tags::MESSAGE_TERMINATOR)
    {
        return Err(EncodingError::InvalidValue {
            tag,
            value: value.to_string(),
        });
    }
    buf.extend_from_slice(tag.to_string().as_bytes());
    buf.push(b'=');
    buf.extend_from_slice(value.as_bytes());
    buf.push(tags::FIELD_DELIMITER);
    Ok(())
}
