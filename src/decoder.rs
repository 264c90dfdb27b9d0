use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_json_abi::{Event, EventParam};
use alloy_primitives::{Bytes, B256};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

use crate::error::{BenchError, Result};
use crate::types::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedParam {
    pub name: String,
    pub param_type: String,
    pub value: DynSolValue,
    pub indexed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    pub event: String,
    pub signature: B256,
    pub params: Vec<DecodedParam>,
}

/// Topics and data of a raw log record
#[derive(Debug, Clone)]
struct RawLog {
    topics: Vec<B256>,
    data: Bytes,
}

/// Decodes log records against a fixed set of human-readable event
/// signatures such as `Transfer(address indexed from, address indexed to, uint256 value)`.
///
/// Several events may share a selector (ERC-20 and ERC-721 `Transfer`); the
/// one whose indexed argument count matches the log's topic count wins.
pub struct Decoder {
    events: HashMap<B256, Vec<Event>>,
    columns: Vec<String>,
}

impl Decoder {
    pub fn from_signatures<S: AsRef<str>>(signatures: &[S]) -> Result<Self> {
        let mut events: HashMap<B256, Vec<Event>> = HashMap::new();
        let mut columns = vec!["event".to_string()];

        for signature in signatures {
            let signature = signature.as_ref();
            let event = Event::parse(signature).map_err(|e| {
                BenchError::Decode(format!("Invalid event signature '{}': {}", signature, e))
            })?;
            if event.anonymous {
                return Err(BenchError::Decode(format!(
                    "Anonymous event '{}' cannot be matched by selector",
                    event.name
                )));
            }

            for (index, param) in event.inputs.iter().enumerate() {
                let name = param_name(param, index);
                if !columns.contains(&name) {
                    columns.push(name);
                }
            }

            debug!("Registered event {} with selector {:#x}", event.signature(), event.selector());
            events.entry(event.selector()).or_default().push(event);
        }

        if events.is_empty() {
            return Err(BenchError::Decode("No event signatures given".to_string()));
        }

        Ok(Self { events, columns })
    }

    /// Column names of `DecodedLog::to_record` output, `event` first
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Decode every record or fail on the first one that does not match
    pub fn decode_logs(&self, logs: &[Record]) -> Result<Vec<DecodedLog>> {
        logs.iter().map(|log| self.decode_record(log)).collect()
    }

    pub fn decode_record(&self, record: &Record) -> Result<DecodedLog> {
        let log = raw_log(record)?;

        let selector = log
            .topics
            .first()
            .ok_or_else(|| BenchError::Decode("Log has no topics".to_string()))?;

        let candidates = self.events.get(selector).ok_or_else(|| {
            BenchError::Decode(format!("No event registered for topic0 {:#x}", selector))
        })?;

        let event = candidates
            .iter()
            .find(|event| indexed_count(event) + 1 == log.topics.len())
            .ok_or_else(|| {
                BenchError::Decode(format!(
                    "Log with {} topics does not match any signature of {}",
                    log.topics.len(),
                    candidates[0].name
                ))
            })?;

        decode_with_event(&log, event)
    }
}

fn indexed_count(event: &Event) -> usize {
    event.inputs.iter().filter(|p| p.indexed).count()
}

/// Column name of an input; unnamed inputs are called `arg<index>`
fn param_name(param: &EventParam, index: usize) -> String {
    if param.name.is_empty() {
        format!("arg{}", index)
    } else {
        param.name.clone()
    }
}

fn decode_with_event(log: &RawLog, event: &Event) -> Result<DecodedLog> {
    let body_params: Vec<&EventParam> = event.inputs.iter().filter(|p| !p.indexed).collect();
    let mut body_values = if body_params.is_empty() {
        Vec::new().into_iter()
    } else {
        decode_body(&body_params, &log.data)?.into_iter()
    };

    // topic0 is the selector
    let mut topics = log.topics.iter().skip(1);
    let mut params = Vec::with_capacity(event.inputs.len());

    for (index, param) in event.inputs.iter().enumerate() {
        let name = param_name(param, index);
        let value = if param.indexed {
            let topic = topics
                .next()
                .ok_or_else(|| BenchError::Decode(format!("Missing topic for indexed parameter {}", name)))?;
            decode_indexed_param(param, *topic)?
        } else {
            body_values
                .next()
                .ok_or_else(|| BenchError::Decode(format!("Missing data for parameter {}", name)))?
        };

        params.push(DecodedParam {
            name,
            param_type: param.ty.clone(),
            value,
            indexed: param.indexed,
        });
    }

    Ok(DecodedLog {
        event: event.name.clone(),
        signature: event.selector(),
        params,
    })
}

fn decode_indexed_param(param: &EventParam, topic: B256) -> Result<DynSolValue> {
    let sol_type = DynSolType::parse(&param.ty)
        .map_err(|e| BenchError::Decode(format!("Unsupported type {}: {}", param.ty, e)))?;

    match sol_type {
        // Dynamic values are stored as their keccak256 hash
        DynSolType::String | DynSolType::Bytes | DynSolType::Array(_) | DynSolType::Tuple(_) => {
            Ok(DynSolValue::FixedBytes(topic, 32))
        }
        _ => sol_type.abi_decode(topic.as_slice()).map_err(|e| {
            BenchError::Decode(format!("Failed to decode indexed parameter {}: {}", param.name, e))
        }),
    }
}

fn decode_body(params: &[&EventParam], data: &Bytes) -> Result<Vec<DynSolValue>> {
    let types = params
        .iter()
        .map(|p| {
            DynSolType::parse(&p.ty).map_err(|e| {
                BenchError::Decode(format!("Unsupported type {} of {}: {}", p.ty, p.name, e))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(data)
        .map_err(|e| BenchError::Decode(format!("Failed to decode log data: {}", e)))?;

    match decoded {
        DynSolValue::Tuple(values) => Ok(values),
        _ => Err(BenchError::Decode("Expected tuple from log data decoding".to_string())),
    }
}

fn raw_log(record: &Record) -> Result<RawLog> {
    let mut topics = Vec::with_capacity(4);
    for key in ["topic0", "topic1", "topic2", "topic3"] {
        match record.get(key) {
            Some(Value::String(topic)) => {
                let topic = B256::from_str(topic)
                    .map_err(|e| BenchError::Decode(format!("Malformed {} '{}': {}", key, topic, e)))?;
                topics.push(topic);
            }
            Some(Value::Null) | None => break,
            Some(other) => {
                return Err(BenchError::Decode(format!("Malformed {}: {}", key, other)));
            }
        }
    }

    let data = match record.get("data") {
        Some(Value::String(data)) => {
            let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data))
                .map_err(|e| BenchError::Decode(format!("Malformed log data: {}", e)))?;
            Bytes::from(bytes)
        }
        Some(Value::Null) | None => Bytes::new(),
        Some(other) => return Err(BenchError::Decode(format!("Malformed log data: {}", other))),
    };

    Ok(RawLog { topics, data })
}

impl DecodedLog {
    /// Flat record: `event` plus one string column per parameter
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("event".to_string(), Value::String(self.event.clone()));
        for param in &self.params {
            record.insert(param.name.clone(), Value::String(format_value(&param.value)));
        }
        record
    }

    pub fn format_params(&self) -> String {
        self.params
            .iter()
            .map(|p| format!("{}: {} = {}", p.name, p.param_type, format_value(&p.value)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Format DynSolValue for human-readable display
fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(bytes, size) => format!("0x{}", hex::encode(&bytes[..*size])),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::Address(addr) => format!("{:#x}", addr),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(arr) | DynSolValue::FixedArray(arr) => {
            let formatted: Vec<String> = arr.iter().map(format_value).collect();
            format!("[{}]", formatted.join(", "))
        }
        DynSolValue::Tuple(tuple) => {
            let formatted: Vec<String> = tuple.iter().map(format_value).collect();
            format!("({})", formatted.join(", "))
        }
        _ => format!("{:?}", value),
    }
}
