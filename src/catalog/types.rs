use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Leading decimal number, the part of `"4.1/5"` before the slash
static RATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+))").expect("valid rate regex"));

/// Leading integer, after thousands separators are stripped
static VOTES_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid votes regex"));

/// A restaurant record as exported by the catalog store.
///
/// Field names follow the store's export format (`rateNum`, `votesNum`,
/// `online_order`, ...). Every field is optional on the wire: missing or null
/// values fall back to empty strings, zero and `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogRecord {
    /// Stable identifier (`id`, `_id`, a number, or `{"$oid": "..."}`)
    #[serde(
        alias = "_id",
        deserialize_with = "de_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub name: String,
    #[serde(deserialize_with = "de_text")]
    pub location: String,
    #[serde(deserialize_with = "de_text")]
    pub address: String,
    /// Comma-joined cuisine names, e.g. `"North Indian, Chinese"`
    #[serde(deserialize_with = "de_text")]
    pub cuisines: String,
    /// Display rating, e.g. `"4.1/5"` or `"NEW"`
    #[serde(deserialize_with = "de_text")]
    pub rate: String,
    #[serde(rename = "rateNum", deserialize_with = "de_f64")]
    pub rate_num: f64,
    /// Display vote count, e.g. `"1,234"`
    #[serde(deserialize_with = "de_text")]
    pub votes: String,
    #[serde(rename = "votesNum", deserialize_with = "de_u64")]
    pub votes_num: u64,
    #[serde(deserialize_with = "de_flag")]
    pub online_order: bool,
    #[serde(deserialize_with = "de_flag")]
    pub book_table: bool,
    #[serde(deserialize_with = "de_text")]
    pub rest_type: String,
}

impl CatalogRecord {
    /// Whether the record can be indexed at all; only an empty name disqualifies it
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    /// Fill numeric fields that the store left empty from their display strings
    pub fn normalize(&mut self) {
        if self.rate_num == 0.0 {
            self.rate_num = parse_rate(&self.rate);
        }
        if self.votes_num == 0 {
            self.votes_num = parse_votes(&self.votes);
        }
    }

    /// Identifier used for deduplication; falls back to the snapshot position
    pub fn id_or_position(&self, position: usize) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("row-{}", position),
        }
    }
}

/// Parse a display rating such as `"4.1/5"` into its numeric value.
///
/// Anything without a leading number (`"NEW"`, `"-"`, `""`) is zero.
pub fn parse_rate(rate: &str) -> f64 {
    let head = rate.split('/').next().unwrap_or("");
    RATE_PREFIX
        .captures(head)
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse a display vote count such as `"1,234"` into its numeric value
pub fn parse_votes(votes: &str) -> u64 {
    let digits = votes.replace(',', "");
    VOTES_PREFIX
        .captures(&digits)
        .and_then(|c| c[1].parse::<i64>().ok())
        .map(|v| v.max(0) as u64)
        .unwrap_or(0)
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Object(map)) => match map.get("$oid") {
            Some(Value::String(oid)) => Some(oid.clone()),
            _ => None,
        },
        _ => None,
    })
}

fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "yes" | "y" | "true" | "1"
        ),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    })
}

fn de_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let value = match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if value.is_finite() { value } else { 0.0 })
}

fn de_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| *v > 0.0).map(|v| v.round() as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => parse_votes(&s),
        _ => 0,
    })
}
