//! Receipt event lookup.
//!
//! Finds the first log in a receipt that decodes as a named ABI event and
//! whose field renders equal to a given string, ignoring ASCII case.

use alloy::dyn_abi::{DynSolValue, EventExt};
use alloy::hex;
use alloy::json_abi::{Event, JsonAbi};
use alloy::primitives::Address;
use thiserror::Error;

use crate::blockchain::types::Receipt;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("ABI has no event named {0}")]
    UnknownEvent(String),

    #[error("Event {event} has no input named {field}")]
    UnknownField { event: String, field: String },
}

/// A receipt log decoded against its event, inputs in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    pub name: String,
    pub address: Address,
    pub fields: Vec<(String, DynSolValue)>,
}

impl DecodedLog {
    pub fn field(&self, name: &str) -> Option<&DynSolValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Field names with their rendered values.
    pub fn rendered(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), render_value(value)))
            .collect()
    }
}

/// String form used for matching: numbers in decimal, addresses and bytes
/// as lower-case `0x` hex.
pub fn render_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(address) => hex::encode_prefixed(address),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Bytes(bytes) => hex::encode_prefixed(bytes),
        DynSolValue::FixedBytes(word, size) => hex::encode_prefixed(&word[..*size]),
        other => format!("{other:?}"),
    }
}

/// First log in `receipt` emitted as `event_name` whose `field` equals `value`.
///
/// No match is `Ok(None)`. Logs that carry the event topic but fail to
/// decode are skipped.
pub fn find_event(
    event_name: &str,
    abi: &JsonAbi,
    field: &str,
    value: &str,
    receipt: &Receipt,
) -> Result<Option<DecodedLog>, EventError> {
    let overloads: Vec<&Event> = abi
        .event(event_name)
        .map(|events| events.iter().filter(|event| !event.anonymous).collect())
        .unwrap_or_default();
    if overloads.is_empty() {
        return Err(EventError::UnknownEvent(event_name.to_string()));
    }
    if !overloads
        .iter()
        .any(|event| event.inputs.iter().any(|input| input.name == field))
    {
        return Err(EventError::UnknownField {
            event: event_name.to_string(),
            field: field.to_string(),
        });
    }

    for log in &receipt.logs {
        let Some(topic) = log.topics().first() else {
            continue;
        };
        let Some(event) = overloads.iter().find(|event| event.selector() == *topic) else {
            continue;
        };
        tracing::trace!(event = event_name, address = %log.address, "Candidate log");

        let decoded = match decode(event, log) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::trace!(event = event_name, error = %e, "Log did not decode, skipping");
                continue;
            }
        };
        tracing::debug!(event = event_name, fields = ?decoded.rendered(), "Decoded event");

        if decoded
            .field(field)
            .is_some_and(|found| render_value(found).eq_ignore_ascii_case(value))
        {
            return Ok(Some(decoded));
        }
    }

    Ok(None)
}

fn decode(
    event: &Event,
    log: &alloy::primitives::Log,
) -> Result<DecodedLog, alloy::dyn_abi::Error> {
    let decoded = event.decode_log(&log.data)?;
    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();

    let fields = event
        .inputs
        .iter()
        .filter_map(|input| {
            let value = if input.indexed {
                indexed.next()
            } else {
                body.next()
            };
            value.map(|value| (input.name.clone(), value))
        })
        .collect();

    Ok(DecodedLog {
        name: event.name.clone(),
        address: log.address,
        fields,
    })
}
