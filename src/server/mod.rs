//! Persistent index server for warm autocomplete
//!
//! Keeps the catalog index built in memory so each keystroke is answered
//! without re-reading and re-indexing the catalog.
//!
//! Architecture:
//! - `savor daemon`: builds the index, listens on a Unix socket, serves requests
//! - Client: connects to the socket, sends requests, receives results
//! - Fallback: if the daemon is unavailable, callers build the index locally

mod client;
pub mod daemon;
pub mod protocol;

pub use client::{ClientError, ClientResult, IndexClient};

use std::path::PathBuf;

/// Get the socket path for the index server
/// Uses a per-user runtime directory for security
pub fn get_socket_path() -> PathBuf {
    runtime_path("sock")
}

/// Get the PID file path for the daemon
pub fn get_pid_path() -> PathBuf {
    runtime_path("pid")
}

fn runtime_path(ext: &str) -> PathBuf {
    // Try XDG_RUNTIME_DIR first (most secure, tmpfs-backed)
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR")
        && !runtime_dir.is_empty()
    {
        return PathBuf::from(runtime_dir).join(format!("savor.{}", ext));
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".local").join("run").join(format!("savor.{}", ext));
    }

    // Last resort: /tmp with user ID
    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/tmp/savor-{}.{}", uid, ext))
}

/// Check if the daemon is running
pub fn is_daemon_running() -> bool {
    let pid_path = get_pid_path();
    if !pid_path.exists() {
        return false;
    }

    if let Ok(pid_str) = std::fs::read_to_string(&pid_path)
        && let Ok(pid) = pid_str.trim().parse::<i32>()
    {
        // Signal 0 only checks that the process exists
        return unsafe { libc::kill(pid, 0) == 0 };
    }

    false
}
