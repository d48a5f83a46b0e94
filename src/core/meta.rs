//! Registered ticket meta fields
//!
//! Each field declares its JSON type, default and the set of accepted values.
//! REST input is validated here before it reaches [`TicketMeta`], so stored
//! tickets can only ever hold values from the enumerated sets.

use super::ids::UserId;
use super::ticket::{Priority, Status, TicketMeta};
use crate::error::{Result, TickeficError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Prefix shared by every meta key this service owns
pub const META_PREFIX: &str = "tickefic_";
pub const PRIORITY_KEY: &str = "tickefic_priority";
pub const STATUS_KEY: &str = "tickefic_status";
pub const AGENT_KEY: &str = "tickefic_assigned_agent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaKind {
    String,
    Integer,
}

/// Declaration of a single-valued meta field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaField {
    pub key: String,
    pub kind: MetaKind,
    pub default: Value,
    /// Accepted string values; empty means any value of `kind`
    pub allowed: Vec<String>,
    pub single: bool,
    pub show_in_rest: bool,
}

impl MetaField {
    /// Validate a raw REST value, returning the normalized value
    ///
    /// `null` resets the field to its default.
    pub fn validate(&self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(self.default.clone());
        }
        match self.kind {
            MetaKind::String => {
                let s = value.as_str().ok_or_else(|| {
                    TickeficError::invalid_param(&self.key, "is not of type string")
                })?;
                let s = s.trim();
                if !self.allowed.is_empty() && !self.allowed.iter().any(|a| a == s) {
                    return Err(TickeficError::invalid_param(
                        &self.key,
                        format!("is not one of {}", self.allowed.join(", ")),
                    ));
                }
                Ok(Value::String(s.to_string()))
            },
            MetaKind::Integer => {
                // The host coerces numeric strings for integer meta
                let n = match value {
                    Value::Number(n) => n.as_u64(),
                    Value::String(s) => s.trim().parse::<u64>().ok(),
                    _ => None,
                };
                n.map(Value::from).ok_or_else(|| {
                    TickeficError::invalid_param(&self.key, "is not a non-negative integer")
                })
            },
        }
    }
}

/// The three fields registered for tickets
#[must_use]
pub fn ticket_meta_fields() -> Vec<MetaField> {
    let string_field = |key: &str, default: &str, allowed: &[&str]| MetaField {
        key: key.to_string(),
        kind: MetaKind::String,
        default: json!(default),
        allowed: allowed.iter().map(|s| (*s).to_string()).collect(),
        single: true,
        show_in_rest: true,
    };

    vec![
        string_field(PRIORITY_KEY, "normal", &["low", "normal", "high"]),
        string_field(STATUS_KEY, "open", &["open", "in_progress", "closed"]),
        MetaField {
            key: AGENT_KEY.to_string(),
            kind: MetaKind::Integer,
            default: json!(0),
            allowed: Vec::new(),
            single: true,
            show_in_rest: true,
        },
    ]
}

impl TicketMeta {
    /// Apply REST meta input against the registered `fields`
    ///
    /// Keys that are not registered are ignored. Returns the keys that were
    /// written, in input order.
    pub fn apply_input(&mut self, fields: &[MetaField], input: &Map<String, Value>) -> Result<Vec<String>> {
        // Validate everything before touching self so a bad key leaves it unchanged
        let mut validated = Vec::with_capacity(input.len());
        for (key, raw) in input {
            let Some(field) = fields.iter().find(|f| &f.key == key && f.show_in_rest) else {
                tracing::debug!(key = %key, "ignoring unregistered meta key");
                continue;
            };
            validated.push((key.clone(), field.validate(raw)?));
        }

        let mut next = *self;
        for (key, value) in &validated {
            match key.as_str() {
                PRIORITY_KEY => next.priority = value.as_str().unwrap_or_default().parse()?,
                STATUS_KEY => next.status = value.as_str().unwrap_or_default().parse()?,
                AGENT_KEY => {
                    next.assigned_agent = match value.as_u64() {
                        Some(0) | None => None,
                        Some(id) => Some(UserId(id)),
                    };
                },
                _ => {},
            }
        }
        *self = next;
        Ok(validated.into_iter().map(|(k, _)| k).collect())
    }

    /// REST representation keyed by meta key
    #[must_use]
    pub fn to_rest(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(PRIORITY_KEY.to_string(), json!(self.priority.as_str()));
        map.insert(STATUS_KEY.to_string(), json!(self.status.as_str()));
        map.insert(
            AGENT_KEY.to_string(),
            json!(self.assigned_agent.map_or(0, UserId::get)),
        );
        map
    }
}

/// A raw priority/status pair from the edit path, parsed into typed meta
pub fn parse_details(priority: Option<&str>, status: Option<&str>) -> Result<(Option<Priority>, Option<Status>)> {
    let priority = priority.map(|p| p.trim().parse()).transpose()?;
    let status = status.map(|s| s.trim().parse()).transpose()?;
    Ok((priority, status))
}
