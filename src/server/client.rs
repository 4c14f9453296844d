//! Client for connecting to the index server daemon

use crate::catalog::{CuisinePage, FilterOptions, ListQuery, RestaurantPage};
use crate::server::get_socket_path;
use crate::server::protocol::{
    read_message, write_message, AutocompleteReply, Request, Response, StatusResponse,
};
use std::io::{BufReader, BufWriter};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Read/write timeout
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in client operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Index server is not running")]
    NotRunning,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Invalid response from server")]
    InvalidResponse,
}

/// Client for the index server
pub struct IndexClient {
    reader: BufReader<UnixStream>,
    writer: BufWriter<UnixStream>,
}

impl IndexClient {
    /// Try to connect to the running daemon
    /// Returns None if daemon is not running (allowing fallback to direct mode)
    pub fn connect() -> Option<Self> {
        Self::connect_to(&get_socket_path())
    }

    /// Connect to a daemon listening on `socket_path`
    pub fn connect_to(socket_path: &Path) -> Option<Self> {
        // Quick check if socket exists
        if !socket_path.exists() {
            return None;
        }

        let stream = UnixStream::connect(socket_path).ok()?;

        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
        let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

        let reader = BufReader::new(stream.try_clone().ok()?);
        let writer = BufWriter::new(stream);

        Some(Self { reader, writer })
    }

    /// Connect or return an error (for when daemon is required)
    pub fn connect_required() -> ClientResult<Self> {
        Self::connect().ok_or(ClientError::NotRunning)
    }

    fn call(&mut self, request: &Request) -> ClientResult<Response> {
        write_message(&mut self.writer, request)?;
        match read_message(&mut self.reader)? {
            Response::Error { message } => Err(ClientError::Server(message)),
            response => Ok(response),
        }
    }

    /// Prefix suggestions for `query`
    pub fn autocomplete(&mut self, query: &str, limit: usize) -> ClientResult<AutocompleteReply> {
        let request = Request::Autocomplete {
            query: query.to_string(),
            limit,
        };

        match self.call(&request)? {
            Response::Autocomplete(reply) => Ok(reply),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// One page of the filtered, sorted restaurant listing
    pub fn list(&mut self, query: &ListQuery) -> ClientResult<RestaurantPage> {
        match self.call(&Request::list(query.clone()))? {
            Response::RestaurantPage(page) => Ok(page),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// One page of restaurants serving `name`
    pub fn by_cuisine(&mut self, name: &str, page: usize, limit: usize) -> ClientResult<CuisinePage> {
        let request = Request::ByCuisine {
            name: name.to_string(),
            page,
            limit,
        };

        match self.call(&request)? {
            Response::CuisinePage(page) => Ok(page),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    pub fn filters(&mut self) -> ClientResult<FilterOptions> {
        match self.call(&Request::Filters)? {
            Response::Filters(options) => Ok(options),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Get server status
    pub fn status(&mut self) -> ClientResult<StatusResponse> {
        match self.call(&Request::Status)? {
            Response::Status(status) => Ok(status),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request an index rebuild.
    ///
    /// Returns `(success, message, generation)`.
    pub fn reload(&mut self, catalog_path: Option<PathBuf>) -> ClientResult<(bool, String, u64)> {
        match self.call(&Request::Reload { catalog_path })? {
            Response::Reloaded {
                success,
                message,
                generation,
            } => Ok((success, message, generation)),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request graceful shutdown
    pub fn shutdown(&mut self) -> ClientResult<()> {
        match self.call(&Request::Shutdown)? {
            Response::ShuttingDown => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Ping the server
    pub fn ping(&mut self) -> ClientResult<()> {
        match self.call(&Request::Ping)? {
            Response::Pong => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_missing_socket() {
        let dir = tempfile::tempdir().unwrap();
        assert!(IndexClient::connect_to(&dir.path().join("absent.sock")).is_none());
    }

    #[test]
    fn test_client_error_messages() {
        assert_eq!(ClientError::NotRunning.to_string(), "Index server is not running");
        assert_eq!(
            ClientError::Server("boom".to_string()).to_string(),
            "Server error: boom"
        );
    }
}
