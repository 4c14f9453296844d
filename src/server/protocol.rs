//! Protocol messages for client-server communication
//!
//! Uses a simple length-prefixed JSON protocol:
//! - 4 bytes (little-endian u32): message length
//! - N bytes: JSON-encoded message

use crate::catalog::{CuisinePage, FilterOptions, ListFilters, ListQuery, ListSort, RestaurantPage};
use crate::query::AutocompleteResponse;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Largest message either side will accept
pub const MAX_MESSAGE_BYTES: usize = 100 * 1024 * 1024;

/// Request from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Prefix suggestions for a partial query
    Autocomplete {
        query: String,
        /// Maximum number of suggestions; negative values count as zero
        #[serde(deserialize_with = "de_count")]
        limit: usize,
    },

    /// Filtered, sorted restaurant listing
    List {
        #[serde(default)]
        filters: ListFilters,
        #[serde(default)]
        sort: Option<ListSort>,
        #[serde(deserialize_with = "de_count")]
        page: usize,
        #[serde(deserialize_with = "de_count")]
        limit: usize,
    },

    /// Restaurants serving a cuisine, one page at a time
    ByCuisine {
        name: String,
        #[serde(deserialize_with = "de_count")]
        page: usize,
        #[serde(deserialize_with = "de_count")]
        limit: usize,
    },

    /// Distinct filter values across the catalog
    Filters,

    /// Check server health and get stats
    Status,

    /// Rebuild the index, optionally from a different catalog file
    Reload {
        #[serde(default)]
        catalog_path: Option<PathBuf>,
    },

    /// Graceful shutdown request
    Shutdown,

    /// Ping for connection testing
    Ping,
}

impl Request {
    pub fn list(query: ListQuery) -> Self {
        Request::List {
            filters: query.filters,
            sort: query.sort,
            page: query.page,
            limit: query.limit,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireCount {
    Unsigned(u64),
    Signed(i64),
}

/// Counts arrive as arbitrary JSON integers; negatives clamp to zero
fn de_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    Ok(match WireCount::deserialize(deserializer)? {
        WireCount::Unsigned(n) => usize::try_from(n).unwrap_or(usize::MAX),
        WireCount::Signed(n) => usize::try_from(n.max(0)).unwrap_or(usize::MAX),
    })
}

/// Response from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Autocomplete(AutocompleteReply),

    RestaurantPage(RestaurantPage),

    CuisinePage(CuisinePage),

    Filters(FilterOptions),

    /// Server status
    Status(StatusResponse),

    /// Reload finished; on failure the previous index keeps serving
    Reloaded {
        success: bool,
        message: String,
        generation: u64,
    },

    /// Shutdown acknowledged
    ShuttingDown,

    /// Pong response
    Pong,

    /// Error response
    Error { message: String },
}

/// Autocomplete results with serving metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteReply {
    pub result: AutocompleteResponse,
    /// Time taken in milliseconds
    pub duration_ms: f64,
    /// Whether results came from cache
    pub cached: bool,
    /// Index generation that answered
    pub generation: u64,
}

/// Server status response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server uptime in seconds
    pub uptime_secs: u64,
    pub catalog_path: Option<PathBuf>,
    /// Records in the loaded snapshot
    pub records: usize,
    pub indexed: usize,
    pub skipped: usize,
    /// Accepted key insertions
    pub keys: usize,
    pub nodes: usize,
    /// Total queries served
    pub queries_served: u64,
    /// Cache hit rate (0.0 - 1.0)
    pub cache_hit_rate: f32,
    /// Bumped on every successful reload
    pub generation: u64,
}

/// Write a message to a stream with length prefix
pub fn write_message<W: Write>(writer: &mut W, msg: &impl Serialize) -> std::io::Result<()> {
    let json = serde_json::to_vec(msg).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })?;

    if json.len() > MAX_MESSAGE_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Message too large",
        ));
    }

    let len = json.len() as u32;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}

/// Read a message from a stream with length prefix
pub fn read_message<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> std::io::Result<T> {
    let frame = read_frame(reader)?;
    decode_message(&frame)
}

/// Read one length-prefixed frame without decoding it.
///
/// An oversized length fails before any payload is read, leaving the
/// stream positioned mid-frame; callers must not read from it again.
pub fn read_frame<R: Read>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Message too large",
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Decode a frame payload read by [`read_frame`]
pub fn decode_message<T: for<'de> Deserialize<'de>>(frame: &[u8]) -> std::io::Result<T> {
    serde_json::from_slice(frame).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })
}
