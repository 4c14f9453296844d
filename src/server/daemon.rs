//! Unix index server daemon
//!
//! Keeps one catalog index built in memory and serves autocomplete and
//! browse requests over a Unix socket. Reloads build a fresh index off to
//! the side and swap it in; requests already running finish on the index
//! they started with.

use crate::catalog::{by_cuisine, filter_options, list, ListQuery};
use crate::index::{IndexHandle, LoadedCatalog};
use crate::server::protocol::{
    decode_message, read_frame, write_message, AutocompleteReply, Request, Response,
    StatusResponse,
};
use crate::server::{get_pid_path, get_socket_path};
use crate::utils::AppConfig;
use anyhow::{Context, Result};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Connection timeout
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a detached daemon reports startup failures
pub const ERROR_LOG_PATH: &str = "/tmp/savord-error.log";

/// Statistics for the server
struct ServerStats {
    start_time: Instant,
    queries_served: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl ServerStats {
    fn new() -> Self {
        Self {
            start_time: Instant::now(),
            queries_served: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    fn record_query(&self, cached: bool) {
        self.queries_served.fetch_add(1, Ordering::Relaxed);
        if cached {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn cache_hit_rate(&self) -> f32 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f32 / total as f32
        }
    }
}

/// The index server daemon
pub struct IndexServer {
    handle: IndexHandle,
    config: AppConfig,
    stats: ServerStats,
    shutdown: AtomicBool,
}

impl IndexServer {
    /// Wrap an already built catalog
    pub fn with_catalog(catalog: LoadedCatalog, config: AppConfig) -> Arc<Self> {
        Arc::new(Self {
            handle: IndexHandle::new(catalog),
            config,
            stats: ServerStats::new(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Load `catalog_path` and build its index before accepting any request
    pub fn warm(catalog_path: &Path, config: AppConfig) -> Result<Arc<Self>> {
        tracing::info!(catalog = %catalog_path.display(), "building index");
        let catalog = LoadedCatalog::load(
            catalog_path,
            &config.index_config(),
            config.cache_size,
            true,
        )?;
        tracing::info!(
            records = catalog.report.records,
            skipped = catalog.report.skipped,
            keys = catalog.report.keys,
            elapsed_ms = catalog.report.elapsed_ms,
            "index ready"
        );
        Ok(Self::with_catalog(catalog, config))
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Start the server (blocking)
    pub fn run(self: &Arc<Self>) -> Result<()> {
        let socket_path = get_socket_path();
        let pid_path = get_pid_path();

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Remove stale socket file
        if socket_path.exists() {
            fs::remove_file(&socket_path)?;
        }

        fs::write(&pid_path, format!("{}", std::process::id()))?;

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind to {}", socket_path.display()))?;

        // Set socket permissions (user only)
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&socket_path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!(socket = %socket_path.display(), "listening");

        for stream in listener.incoming() {
            if self.is_shutting_down() {
                break;
            }

            match stream {
                Ok(stream) => {
                    let _ = stream.set_read_timeout(Some(CONNECTION_TIMEOUT));
                    let _ = stream.set_write_timeout(Some(CONNECTION_TIMEOUT));

                    let server = Arc::clone(self);
                    let wake_path = socket_path.clone();
                    thread::spawn(move || {
                        if let Err(e) = server.handle_connection(stream) {
                            tracing::debug!(error = %e, "connection closed with error");
                        }
                        if server.is_shutting_down() {
                            // Unblock accept() so the loop sees the flag
                            let _ = UnixStream::connect(&wake_path);
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }

        let _ = fs::remove_file(&socket_path);
        let _ = fs::remove_file(&pid_path);
        tracing::info!("daemon stopped");

        Ok(())
    }

    /// Handle a single client connection
    ///
    /// A frame that decodes to no known request gets an error reply and the
    /// connection stays open. A broken frame (oversized length or short
    /// read) leaves the stream out of sync, so the connection is dropped.
    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream);

        loop {
            let frame = match read_frame(&mut reader) {
                Ok(frame) => frame,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // Client disconnected
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let request: Request = match decode_message(&frame) {
                Ok(req) => req,
                Err(e) => {
                    let resp = Response::Error {
                        message: format!("Invalid request: {}", e),
                    };
                    write_message(&mut writer, &resp)?;
                    continue;
                }
            };

            let response = self.handle_request(request);
            write_message(&mut writer, &response)?;

            if matches!(response, Response::ShuttingDown) {
                break;
            }
        }

        Ok(())
    }

    /// Answer one request against the currently published index
    pub fn handle_request(&self, request: Request) -> Response {
        tracing::debug!(?request, "request");
        match request {
            Request::Autocomplete { query, limit } => self.handle_autocomplete(&query, limit),
            Request::List { filters, sort, page, limit } => {
                let query = ListQuery { filters, sort, page, limit };
                match list(&self.handle.current().records, &query) {
                    Ok(page) => Response::RestaurantPage(page),
                    Err(e) => Response::Error {
                        message: e.to_string(),
                    },
                }
            }
            Request::ByCuisine { name, page, limit } => {
                let catalog = self.handle.current();
                match by_cuisine(&catalog.records, &name, page, limit) {
                    Ok(page) => Response::CuisinePage(page),
                    Err(e) => Response::Error {
                        message: e.to_string(),
                    },
                }
            }
            Request::Filters => Response::Filters(filter_options(&self.handle.current().records)),
            Request::Status => self.handle_status(),
            Request::Reload { catalog_path } => self.handle_reload(catalog_path),
            Request::Shutdown => {
                tracing::info!("shutdown requested");
                self.shutdown.store(true, Ordering::Relaxed);
                Response::ShuttingDown
            }
            Request::Ping => Response::Pong,
        }
    }

    fn handle_autocomplete(&self, query: &str, limit: usize) -> Response {
        let start = Instant::now();
        let catalog = self.handle.current();

        let (result, cached) = catalog.autocomplete(query, limit);
        self.stats.record_query(cached);

        Response::Autocomplete(AutocompleteReply {
            result,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            cached,
            generation: catalog.generation,
        })
    }

    fn handle_status(&self) -> Response {
        let catalog = self.handle.current();
        let report = &catalog.report;

        Response::Status(StatusResponse {
            uptime_secs: self.stats.start_time.elapsed().as_secs(),
            catalog_path: catalog.source.clone(),
            records: report.records,
            indexed: report.indexed,
            skipped: report.skipped,
            keys: report.keys,
            nodes: report.nodes,
            queries_served: self.stats.queries_served.load(Ordering::Relaxed),
            cache_hit_rate: self.stats.cache_hit_rate(),
            generation: catalog.generation,
        })
    }

    fn handle_reload(&self, catalog_path: Option<PathBuf>) -> Response {
        let index_config = self.config.index_config();
        let cache_size = self.config.cache_size;

        let rebuilt = self.handle.rebuild_with(|current| {
            let path = catalog_path
                .or_else(|| current.source.clone())
                .context("No catalog path to reload from")?;
            LoadedCatalog::load(&path, &index_config, cache_size, true)
        });

        match rebuilt {
            Ok(catalog) => Response::Reloaded {
                success: true,
                message: format!(
                    "Indexed {} of {} restaurants",
                    catalog.report.indexed, catalog.report.records
                ),
                generation: catalog.generation,
            },
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::warn!(error = %reason, "reload failed, keeping current index");
                Response::Reloaded {
                    success: false,
                    message: format!("Failed to reload: {}", reason),
                    generation: self.handle.current().generation,
                }
            }
        }
    }
}

/// Daemonize the current process and serve `catalog_path` from the daemon
pub fn daemonize(catalog_path: PathBuf, config: AppConfig) -> Result<()> {
    // Double fork so the daemon is reparented and has no controlling terminal
    match unsafe { libc::fork() } {
        -1 => anyhow::bail!("First fork failed"),
        0 => {
            if unsafe { libc::setsid() } == -1 {
                anyhow::bail!("setsid failed");
            }

            match unsafe { libc::fork() } {
                -1 => anyhow::bail!("Second fork failed"),
                0 => {
                    // Grandchild - this becomes the daemon
                    unsafe {
                        libc::close(0);
                        libc::close(1);
                        libc::close(2);

                        let null = libc::open(c"/dev/null".as_ptr(), libc::O_RDWR);
                        if null != -1 {
                            libc::dup2(null, 0);
                            libc::dup2(null, 1);
                            libc::dup2(null, 2);
                            if null > 2 {
                                libc::close(null);
                            }
                        }
                    }

                    // Change to root directory to avoid holding mounts
                    let _ = std::env::set_current_dir("/");

                    let result = IndexServer::warm(&catalog_path, config).and_then(|server| server.run());
                    if let Err(e) = result {
                        // stderr is gone; leave the failure where `daemon start` can point to it
                        let _ = fs::write(ERROR_LOG_PATH, format!("{:#}\n", e));
                    }
                    std::process::exit(0);
                }
                _ => {
                    std::process::exit(0);
                }
            }
        }
        _ => {
            // Parent process - reap the first child
            unsafe {
                let mut status: libc::c_int = 0;
                libc::wait(&mut status);
            }
            Ok(())
        }
    }
}

/// Start the daemon in foreground (for debugging)
pub fn run_foreground(catalog_path: &Path, config: AppConfig) -> Result<()> {
    let server = IndexServer::warm(catalog_path, config)?;
    server.run()
}

/// Stop the running daemon
pub fn stop_daemon() -> Result<bool> {
    let pid_path = get_pid_path();
    if !pid_path.exists() {
        return Ok(false);
    }

    let pid_str = fs::read_to_string(&pid_path)?;
    let pid: i32 = pid_str.trim().parse().context("Corrupt PID file")?;

    unsafe {
        if libc::kill(pid, libc::SIGTERM) == 0 {
            thread::sleep(Duration::from_millis(500));

            if libc::kill(pid, 0) == 0 {
                thread::sleep(Duration::from_secs(1));
                if libc::kill(pid, 0) == 0 {
                    libc::kill(pid, libc::SIGKILL);
                }
            }
        }
    }

    let _ = fs::remove_file(get_socket_path());
    let _ = fs::remove_file(&pid_path);

    Ok(true)
}
