use crate::catalog::{by_cuisine, CuisinePage};
use crate::index::LoadedCatalog;
use crate::query::ResultItem;
use crate::server::IndexClient;
use crate::utils::AppConfig;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Search,
    Help,
}

/// Catalog loading state for background loading
pub enum LoadState {
    /// Catalog is being read and indexed in background
    Loading(Receiver<Result<LoadedCatalog, String>>),
    Ready,
    /// Nothing to load (error message stored in status_message)
    Unavailable,
}

/// Where suggestions come from
enum Source {
    Daemon(IndexClient),
    Local(Option<Arc<LoadedCatalog>>),
}

/// Restaurants shown per page when a cuisine is opened
const CUISINE_PAGE_SIZE: usize = 20;

/// LRU cache size for suggestion lists
const SUGGESTION_CACHE_SIZE: usize = 64;

/// Application state
pub struct App {
    source: Source,
    catalog_path: Option<PathBuf>,
    config: AppConfig,
    pub query: String,
    pub results: Vec<ResultItem>,
    pub selected: usize,
    pub mode: Mode,
    pub status_message: String,
    /// Restaurants for the cuisine opened with Enter
    pub cuisine_page: Option<CuisinePage>,
    load_state: LoadState,
    /// Recent suggestion lists keyed by query
    suggestion_cache: LruCache<String, Vec<ResultItem>>,
}

impl App {
    /// Create the app without blocking on the index.
    ///
    /// Uses the daemon when one answers, otherwise builds the catalog index
    /// in a background thread.
    pub fn new(catalog_path: Option<PathBuf>, config: AppConfig) -> Self {
        if let Some(mut client) = IndexClient::connect()
            && client.ping().is_ok()
        {
            let mut app = Self::empty(Source::Daemon(client), catalog_path, config);
            app.status_message = "Connected to daemon".to_string();
            app.load_state = LoadState::Ready;
            return app;
        }

        let mut app = Self::empty(Source::Local(None), catalog_path, config);
        app.start_local_load();
        app
    }

    /// App over an already built catalog
    pub fn with_catalog(catalog: LoadedCatalog, config: AppConfig) -> Self {
        let records = catalog.report.records;
        let source = catalog.source.clone();
        let mut app = Self::empty(Source::Local(Some(Arc::new(catalog))), source, config);
        app.status_message = format!("{} restaurants indexed", records);
        app.load_state = LoadState::Ready;
        app
    }

    fn empty(source: Source, catalog_path: Option<PathBuf>, config: AppConfig) -> Self {
        Self {
            source,
            catalog_path,
            config,
            query: String::new(),
            results: Vec::new(),
            selected: 0,
            mode: Mode::Search,
            status_message: String::new(),
            cuisine_page: None,
            load_state: LoadState::Unavailable,
            suggestion_cache: LruCache::new(
                NonZeroUsize::new(SUGGESTION_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            ),
        }
    }

    fn start_local_load(&mut self) {
        let Some(path) = self.catalog_path.clone() else {
            self.status_message =
                "No catalog configured. Use --catalog or 'savor config --catalog <FILE> --save'".to_string();
            self.load_state = LoadState::Unavailable;
            return;
        };

        let (tx, rx) = mpsc::channel();
        let index_config = self.config.index_config();
        let cache_size = self.config.cache_size;

        thread::spawn(move || {
            let result = LoadedCatalog::load(&path, &index_config, cache_size, true)
                .map_err(|e| format!("{:#}", e));
            let _ = tx.send(result);
        });

        self.status_message = "Indexing catalog...".to_string();
        self.load_state = LoadState::Loading(rx);
    }

    /// Check for background load completion (call this in event loop)
    pub fn poll_load(&mut self) {
        let current_state = std::mem::replace(&mut self.load_state, LoadState::Ready);

        match current_state {
            LoadState::Loading(rx) => match rx.try_recv() {
                Ok(Ok(catalog)) => {
                    self.status_message = format!(
                        "{} restaurants indexed ({} skipped, {:.0}ms)",
                        catalog.report.indexed, catalog.report.skipped, catalog.report.elapsed_ms
                    );
                    self.source = Source::Local(Some(Arc::new(catalog)));
                    self.suggestion_cache.clear();
                    // Run whatever was typed while loading
                    if !self.query.is_empty() {
                        self.execute_search();
                    }
                }
                Ok(Err(e)) => {
                    self.status_message = format!("Index build failed: {}", e);
                    self.load_state = LoadState::Unavailable;
                }
                Err(TryRecvError::Empty) => {
                    self.load_state = LoadState::Loading(rx);
                }
                Err(TryRecvError::Disconnected) => {
                    self.status_message = "Index thread terminated unexpectedly".to_string();
                    self.load_state = LoadState::Unavailable;
                }
            },
            other => {
                self.load_state = other;
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load_state, LoadState::Loading(_))
    }

    pub fn using_daemon(&self) -> bool {
        matches!(self.source, Source::Daemon(_))
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.execute_search();
    }

    pub fn backspace(&mut self) {
        self.query.pop();
        self.execute_search();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.results.clear();
        self.selected = 0;
        self.cuisine_page = None;
    }

    /// Delete word backward (Ctrl+W)
    pub fn delete_word(&mut self) {
        let trimmed = self.query.trim_end_matches(' ');
        let cut = trimmed.rfind(' ').map(|i| i + 1).unwrap_or(0);
        self.query.truncate(cut);
        self.execute_search();
    }

    /// Refresh suggestions for the current query
    pub fn execute_search(&mut self) {
        self.cuisine_page = None;

        if self.query.is_empty() {
            self.results.clear();
            self.selected = 0;
            return;
        }

        if let Some(cached) = self.suggestion_cache.get(&self.query) {
            self.results = cached.clone();
            self.selected = 0;
            self.status_message = format!("{} suggestions (cached)", self.results.len());
            return;
        }

        let start = Instant::now();
        let limit = self.config.default_limit;

        let fetched = match &mut self.source {
            Source::Daemon(client) => client
                .autocomplete(&self.query, limit)
                .map(|reply| reply.result.data)
                .map_err(|e| e.to_string()),
            Source::Local(Some(catalog)) => Ok(catalog.autocomplete(&self.query, limit).0.data),
            Source::Local(None) => {
                // Still loading; poll_load reruns the query
                return;
            }
        };

        match fetched {
            Ok(items) => {
                self.status_message = format!(
                    "{} suggestions ({:.1}ms)",
                    items.len(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                self.suggestion_cache.put(self.query.clone(), items.clone());
                self.results = items;
            }
            Err(e) => {
                self.status_message = format!("Error: {}", e);
                self.results.clear();
            }
        }
        self.selected = 0;
    }

    /// Open the selected cuisine as a list of restaurants serving it
    pub fn open_selected(&mut self) {
        let Some(ResultItem::Cuisine { name }) = self.results.get(self.selected) else {
            return;
        };
        let name = name.clone();

        let page = match &mut self.source {
            Source::Daemon(client) => client
                .by_cuisine(&name, 1, CUISINE_PAGE_SIZE)
                .map_err(|e| e.to_string()),
            Source::Local(Some(catalog)) => {
                by_cuisine(&catalog.records, &name, 1, CUISINE_PAGE_SIZE).map_err(|e| e.to_string())
            }
            Source::Local(None) => return,
        };

        match page {
            Ok(page) => {
                self.status_message = format!("{} restaurants serve {}", page.total_records, name);
                self.cuisine_page = Some(page);
            }
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    pub fn get_selected_result(&self) -> Option<&ResultItem> {
        self.results.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.results.is_empty() {
            self.selected = (self.selected + 1).min(self.results.len() - 1);
            self.cuisine_page = None;
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.cuisine_page = None;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.cuisine_page = None;
    }

    pub fn select_last(&mut self) {
        self.selected = self.results.len().saturating_sub(1);
        self.cuisine_page = None;
    }

    pub fn show_help(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn hide_help(&mut self) {
        self.mode = Mode::Search;
    }

    /// Rebuild the index from the catalog (F5)
    pub fn reindex(&mut self) {
        self.suggestion_cache.clear();

        if let Source::Daemon(client) = &mut self.source {
            match client.reload(None) {
                Ok((true, message, generation)) => {
                    self.status_message = format!("{} (generation {})", message, generation);
                    self.execute_search();
                }
                Ok((false, message, _)) => self.status_message = message,
                Err(e) => self.status_message = format!("Reload failed: {}", e),
            }
            return;
        }

        if self.is_loading() {
            return;
        }
        // Keep serving the current index until the new one arrives
        self.start_local_load();
    }
}
