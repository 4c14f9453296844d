use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use savor::catalog::{self, CuisinePage, FilterOptions, ListQuery, RestaurantPage};
use savor::index::{stats, LoadedCatalog};
use savor::output;
use savor::query::AutocompleteResponse;
use savor::server::{self, daemon, get_socket_path, is_daemon_running, IndexClient};
use savor::utils::{get_config_path, AppConfig};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "SAVOR_LOG";

/// How long `daemon start` waits for the index to be built and served
const DAEMON_START_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "savor")]
#[command(about = "Terminal-first restaurant and cuisine autocomplete")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Initial query for the interactive UI (when no subcommand is given)
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,

    /// Catalog file (JSON array or JSON Lines); overrides SAVOR_CATALOG and config
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive type-ahead search
    Search {
        /// Initial query
        query: Option<String>,
    },
    /// Print suggestions for a partial query
    Complete {
        /// Partial restaurant or cuisine name
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        query: Vec<String>,

        /// Maximum number of suggestions (negative means none)
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
    /// List restaurants, filtered and sorted
    List {
        /// Sort order: <field>_<asc|desc>, e.g. rate_desc, votes_asc, name_asc
        #[arg(short, long)]
        sort: Option<String>,

        /// Filter as FIELD=V1,V2 (cuisines, rest_type, location, online_order, book_table); repeatable
        #[arg(short, long = "filter", value_name = "FIELD=VALUES")]
        filter: Vec<String>,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Restaurants per page (1-50)
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },
    /// List restaurants serving a cuisine
    Cuisine {
        /// Cuisine name (case-insensitive substring)
        name: String,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Restaurants per page (1-50)
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },
    /// Show the distinct values available for filtering
    Filters {
        #[arg(long)]
        json: bool,
    },
    /// Build the index and show its statistics
    Stats,
    /// Build the index once to validate the catalog
    Index,
    /// Show or update the configuration
    Config {
        /// Default number of suggestions
        #[arg(long)]
        limit: Option<usize>,

        /// Query cache entries per loaded index (0 disables)
        #[arg(long)]
        cache_size: Option<usize>,

        /// Write the given settings (and --catalog) to the config file
        #[arg(long)]
        save: bool,
    },
    /// Manage the index server daemon (keeps the index warm between queries)
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon in background
    Start,
    /// Stop the running daemon
    Stop,
    /// Check daemon status
    Status,
    /// Run daemon in foreground (for debugging)
    Foreground,
    /// Rebuild the daemon's index (from --catalog if given)
    Reload,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Some(Commands::Daemon {
            action: DaemonAction::Foreground,
        }) => "info",
        _ => "warn",
    };
    init_logging(default_level);

    let config = AppConfig::load()?;

    match cli.command {
        Some(Commands::Search { query }) => {
            run_interactive(cli.catalog, config, query)?;
        }
        Some(Commands::Complete { query, limit, json }) => {
            let query = query.join(" ");
            let limit = limit
                .map(|n| usize::try_from(n).unwrap_or(0))
                .unwrap_or(config.default_limit);
            complete(&query, limit, json, cli.catalog.as_deref(), &config)?;
        }
        Some(Commands::List {
            sort,
            filter,
            page,
            limit,
            json,
        }) => {
            let query = list_query(sort.as_deref(), &filter, page, limit)?;
            let result = list(&query, cli.catalog.as_deref(), &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::print_restaurant_page(&result, true)?;
            }
        }
        Some(Commands::Cuisine {
            name,
            page,
            limit,
            json,
        }) => {
            let result = cuisine_page(&name, page, limit, cli.catalog.as_deref(), &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::print_cuisine_page(&result, &name, true)?;
            }
        }
        Some(Commands::Filters { json }) => {
            let options = filters(cli.catalog.as_deref(), &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&options)?);
            } else {
                output::print_filter_options(&options, true)?;
            }
        }
        Some(Commands::Stats) => {
            let catalog = load_local(cli.catalog.as_deref(), &config, false)?;
            stats::show_stats(&catalog);
        }
        Some(Commands::Index) => {
            let catalog = load_local(cli.catalog.as_deref(), &config, false)?;
            let report = &catalog.report;
            println!(
                "Indexed {} of {} restaurants ({} skipped): {} keys, {} nodes in {:.1} ms",
                report.indexed,
                report.records,
                report.skipped,
                report.keys,
                report.nodes,
                report.elapsed_ms
            );
        }
        Some(Commands::Config {
            limit,
            cache_size,
            save,
        }) => {
            handle_config(config, cli.catalog, limit, cache_size, save)?;
        }
        Some(Commands::Daemon { action }) => {
            handle_daemon_command(action, cli.catalog, config)?;
        }
        None => {
            let query = (!cli.query.is_empty()).then(|| cli.query.join(" "));
            run_interactive(cli.catalog, config, query)?;
        }
    }

    Ok(())
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(feature = "interactive")]
fn run_interactive(catalog: Option<PathBuf>, config: AppConfig, query: Option<String>) -> Result<()> {
    // A running daemon needs no catalog, so resolution failures are not fatal here
    let catalog_path = config.resolve_catalog(catalog.as_deref()).ok();
    savor::tui::run(catalog_path, config, query)
}

#[cfg(not(feature = "interactive"))]
fn run_interactive(_catalog: Option<PathBuf>, _config: AppConfig, _query: Option<String>) -> Result<()> {
    anyhow::bail!("Interactive mode is not available. Rebuild with --features interactive or use 'savor complete'")
}

/// Read the catalog and build its index in this process
fn load_local(flag: Option<&Path>, config: &AppConfig, silent: bool) -> Result<LoadedCatalog> {
    let path = config.resolve_catalog(flag)?;
    // One-shot commands never repeat a query, so they skip the cache
    LoadedCatalog::load(&path, &config.index_config(), 0, silent)
}

/// Connected daemon client, unless an explicit catalog asks for a local build
fn daemon_client(flag: Option<&Path>) -> Option<IndexClient> {
    if flag.is_some() {
        return None;
    }
    IndexClient::connect()
}

fn complete(query: &str, limit: usize, json: bool, flag: Option<&Path>, config: &AppConfig) -> Result<()> {
    let daemon_result = daemon_client(flag).and_then(|mut client| match client.autocomplete(query, limit) {
        Ok(reply) => Some(reply.result),
        Err(e) => {
            tracing::warn!(error = %e, "daemon query failed, building index locally");
            None
        }
    });

    let response: AutocompleteResponse = match daemon_result {
        Some(response) => response,
        None => load_local(flag, config, true)?.engine().autocomplete(query, limit),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        output::print_suggestions(&response, query, true)?;
    }

    Ok(())
}

fn list_query(sort: Option<&str>, filters: &[String], page: usize, limit: usize) -> Result<ListQuery> {
    let mut query = ListQuery {
        page,
        limit,
        ..Default::default()
    };
    if let Some(sort) = sort {
        query.sort = Some(sort.parse()?);
    }
    for filter in filters {
        let (field, values) = filter
            .split_once('=')
            .with_context(|| format!("Invalid filter '{}', expected FIELD=VALUES", filter))?;
        query.filters.add(field, values)?;
    }
    Ok(query)
}

fn list(query: &ListQuery, flag: Option<&Path>, config: &AppConfig) -> Result<RestaurantPage> {
    if let Some(mut client) = daemon_client(flag) {
        match client.list(query) {
            Ok(result) => return Ok(result),
            Err(server::ClientError::Server(message)) => anyhow::bail!(message),
            Err(e) => tracing::warn!(error = %e, "daemon request failed, reading catalog locally"),
        }
    }

    let path = config.resolve_catalog(flag)?;
    let records = catalog::load_catalog(&path)
        .with_context(|| format!("Failed to load catalog {}", path.display()))?;
    Ok(catalog::list(&records, query)?)
}

fn cuisine_page(name: &str, page: usize, limit: usize, flag: Option<&Path>, config: &AppConfig) -> Result<CuisinePage> {
    if let Some(mut client) = daemon_client(flag) {
        match client.by_cuisine(name, page, limit) {
            Ok(result) => return Ok(result),
            // Validation errors are the same locally; report them as-is
            Err(server::ClientError::Server(message)) => anyhow::bail!(message),
            Err(e) => tracing::warn!(error = %e, "daemon request failed, reading catalog locally"),
        }
    }

    let path = config.resolve_catalog(flag)?;
    let records = catalog::load_catalog(&path)
        .with_context(|| format!("Failed to load catalog {}", path.display()))?;
    Ok(catalog::by_cuisine(&records, name, page, limit)?)
}

fn filters(flag: Option<&Path>, config: &AppConfig) -> Result<FilterOptions> {
    if let Some(mut client) = daemon_client(flag) {
        match client.filters() {
            Ok(options) => return Ok(options),
            Err(e) => tracing::warn!(error = %e, "daemon request failed, reading catalog locally"),
        }
    }

    let path = config.resolve_catalog(flag)?;
    let records = catalog::load_catalog(&path)
        .with_context(|| format!("Failed to load catalog {}", path.display()))?;
    Ok(catalog::filter_options(&records))
}

fn handle_config(
    mut config: AppConfig,
    catalog: Option<PathBuf>,
    limit: Option<usize>,
    cache_size: Option<usize>,
    save: bool,
) -> Result<()> {
    if let Some(path) = catalog {
        let path = path
            .canonicalize()
            .with_context(|| format!("Catalog not found: {}", path.display()))?;
        config.catalog_path = Some(path);
    }
    if let Some(limit) = limit {
        config.default_limit = limit;
    }
    if let Some(cache_size) = cache_size {
        config.cache_size = cache_size;
    }

    if save {
        let path = config.save()?;
        println!("Saved {}", path.display());
    } else {
        println!("Config file: {}", get_config_path()?.display());
    }
    println!("{}", serde_json::to_string_pretty(&config)?);

    match config.resolve_catalog(None) {
        Ok(path) => println!("Catalog in effect: {}", path.display()),
        Err(e) => println!("{}", e),
    }

    Ok(())
}

fn handle_daemon_command(action: DaemonAction, catalog: Option<PathBuf>, config: AppConfig) -> Result<()> {
    match action {
        DaemonAction::Start => {
            if is_daemon_running() {
                println!("Daemon is already running");
                return Ok(());
            }

            let catalog_path = config.resolve_catalog(catalog.as_deref())?;
            let catalog_path = catalog_path
                .canonicalize()
                .with_context(|| format!("Catalog not found: {}", catalog_path.display()))?;

            let _ = std::fs::remove_file(daemon::ERROR_LOG_PATH);
            println!("Starting savor daemon for {}...", catalog_path.display());
            daemon::daemonize(catalog_path, config)?;

            // The socket only appears once the index is built
            let start = Instant::now();
            while start.elapsed() < DAEMON_START_TIMEOUT {
                if is_daemon_running() && IndexClient::connect().is_some() {
                    println!("Daemon started (socket: {})", get_socket_path().display());
                    return Ok(());
                }
                if let Ok(error) = std::fs::read_to_string(daemon::ERROR_LOG_PATH) {
                    anyhow::bail!("Daemon failed to start: {}", error.trim());
                }
                std::thread::sleep(Duration::from_millis(100));
            }

            println!(
                "Daemon is still starting or failed to start. Check {}",
                daemon::ERROR_LOG_PATH
            );
        }

        DaemonAction::Stop => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            println!("Stopping daemon...");

            // Try graceful shutdown via client first
            if let Some(mut client) = IndexClient::connect() {
                let _ = client.shutdown();
                std::thread::sleep(Duration::from_millis(500));
            }

            if is_daemon_running() {
                daemon::stop_daemon()?;
            }

            println!("Daemon stopped");
        }

        DaemonAction::Status => {
            if !is_daemon_running() {
                println!("Daemon is not running");
                return Ok(());
            }

            let Some(mut client) = IndexClient::connect() else {
                println!("Daemon is running but not responding");
                return Ok(());
            };

            match client.status() {
                Ok(status) => {
                    println!("savor daemon status:");
                    println!("  Uptime: {}s", status.uptime_secs);
                    if let Some(path) = &status.catalog_path {
                        println!("  Catalog: {}", path.display());
                    }
                    println!(
                        "  Restaurants: {} indexed, {} skipped",
                        status.indexed, status.skipped
                    );
                    println!("  Keys: {} ({} trie nodes)", status.keys, status.nodes);
                    println!("  Generation: {}", status.generation);
                    println!("  Queries served: {}", status.queries_served);
                    println!("  Cache hit rate: {:.1}%", status.cache_hit_rate * 100.0);
                }
                Err(e) => {
                    println!("Failed to get status: {}", e);
                }
            }
        }

        DaemonAction::Foreground => {
            if is_daemon_running() {
                println!("Daemon is already running in background. Stop it first with 'savor daemon stop'");
                return Ok(());
            }

            let catalog_path = config.resolve_catalog(catalog.as_deref())?;
            println!("Running daemon in foreground (Ctrl+C to stop)...");
            daemon::run_foreground(&catalog_path, config)?;
        }

        DaemonAction::Reload => {
            if !is_daemon_running() {
                println!("Daemon is not running. Start it with 'savor daemon start'");
                return Ok(());
            }

            let catalog_path = match catalog {
                Some(path) => Some(
                    path.canonicalize()
                        .with_context(|| format!("Catalog not found: {}", path.display()))?,
                ),
                None => None,
            };

            let mut client = IndexClient::connect_required()?;
            match client.reload(catalog_path) {
                Ok((true, message, generation)) => {
                    println!("Reloaded: {} (generation {})", message, generation);
                }
                Ok((false, message, _)) => {
                    println!("Reload failed: {}", message);
                }
                Err(e) => {
                    println!("Failed to reload: {}", e);
                }
            }
        }
    }

    Ok(())
}
