use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scholar_lens::client::{Backend, HttpBackend};
use scholar_lens::config::{find_config_file, load_config, write_default_config, Config};
use scholar_lens::models::SearchQuery;
use scholar_lens::session::{Session, SessionSettings, Update};
use scholar_lens::ui::{self, Renderer, Spinner, Status};
use scholar_lens::utils::{validate_text, with_retry, PageInfo, Pager, RetryConfig};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scholar Lens - Search publications and classify text from the terminal
#[derive(Parser, Debug)]
#[command(name = "scholar-lens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search publications and classify text from the terminal", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API base URL (overrides configuration)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds (overrides configuration)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Pretty on a terminal, JSON otherwise
    Auto,
    /// Human-readable
    Pretty,
    /// JSON (machine-readable)
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search publications
    Search {
        /// Search query
        query: String,

        /// Page of results
        #[arg(long, short, default_value_t = 1)]
        page: u32,
    },

    /// Classify a piece of text
    Classify {
        /// Text to classify
        text: String,
    },

    /// Print sample text for a category
    Sample {
        /// Category (e.g. business, health, politics)
        category: String,
    },

    /// Interactive session with live search and auto-classification (default)
    Interactive,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Destination (defaults to the per-user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.api.timeout_seconds = timeout;
    }
    config.validate().context("Invalid command-line override")?;

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    runtime.block_on(run(cli, config))
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("scholar_lens={}", level)),
    );

    // stdout belongs to rendered output
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let json = match cli.output {
        OutputFormat::Json => true,
        OutputFormat::Pretty => false,
        OutputFormat::Auto => !ui::is_terminal(),
    };
    let renderer = Renderer::for_terminal();
    let spinner_enabled = !json && !cli.quiet;

    let command = cli.command.unwrap_or(Commands::Interactive);
    if let Commands::Config { action } = &command {
        return config_command(action, &config);
    }

    let backend: Arc<dyn Backend> =
        Arc::new(HttpBackend::from_config(&config.api).context("Failed to create HTTP client")?);
    let retry = config.retry_config();
    tracing::debug!("Using backend {}", backend.name());

    match command {
        Commands::Search { query, page } => {
            search_once(backend.as_ref(), retry, &query, page, json, spinner_enabled, &renderer, &config).await
        }
        Commands::Classify { text } => {
            classify_once(backend.as_ref(), retry, &text, json, spinner_enabled, &renderer).await
        }
        Commands::Sample { category } => {
            let sample = with_retry(retry, || backend.sample(&category))
                .await
                .with_context(|| format!("Failed to fetch sample for {}", category))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sample)?);
            } else {
                println!("{}", sample.sample);
            }
            Ok(())
        }
        Commands::Interactive => {
            let mut session = Session::new(backend, SessionSettings::from_config(&config));
            interactive(&mut session, &renderer, &config.classifier.sample_categories).await
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn config_command(action: &ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Init { path, force } => {
            let written = write_default_config(path.as_deref(), *force)?;
            println!("Wrote default configuration to {}", written.display());
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml().context("Failed to render configuration")?);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn search_once(
    backend: &dyn Backend,
    retry: RetryConfig,
    query: &str,
    page: u32,
    json: bool,
    spinner_enabled: bool,
    renderer: &Renderer,
    config: &Config,
) -> Result<()> {
    let query = SearchQuery::parse(query)?;
    let spinner = Spinner::when_terminal(spinner_enabled, &format!("Searching for \"{}\"...", query));

    let result = with_retry(retry, || backend.search(&query, page)).await;
    let response = match result {
        Ok(response) => {
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }
            response
        }
        Err(e) => {
            if let Some(spinner) = &spinner {
                spinner.finish_with_error("Search failed");
            }
            return Err(e).context(scholar_lens::session::SEARCH_FAILURE_MESSAGE);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let info = PageInfo::from_response(response.page, response.total_pages);
    if response.is_empty() {
        println!("{}", renderer.status(Status::Warning, &format!("No results found for \"{}\".", query)));
        return Ok(());
    }

    println!(
        "{}",
        renderer.status(
            Status::Search,
            &format!("Results for \"{}\" (page {} of {})", query, info.current(), info.total())
        )
    );
    let highlighter = scholar_lens::utils::Highlighter::new(query.as_str());
    for (i, result) in response.results.iter().enumerate() {
        println!();
        println!("{}", renderer.result_card(i + 1, result, &highlighter));
    }

    let pager = Pager::new(info, config.search.page_radius);
    if pager.is_visible() {
        println!();
        println!("{}", renderer.pager(&pager));
    }
    Ok(())
}

async fn classify_once(
    backend: &dyn Backend,
    retry: RetryConfig,
    text: &str,
    json: bool,
    spinner_enabled: bool,
    renderer: &Renderer,
) -> Result<()> {
    let text = validate_text(text)?;
    let spinner = Spinner::when_terminal(spinner_enabled, "Classifying...");

    let result = with_retry(retry, || backend.classify(text)).await;
    let result = match result {
        Ok(result) => {
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }
            result
        }
        Err(e) => {
            if let Some(spinner) = &spinner {
                spinner.finish_with_error("Classification failed");
            }
            return Err(e).context(scholar_lens::session::CLASSIFY_FAILURE_MESSAGE);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", ui::stats_line(scholar_lens::models::TextStats::of(text)));
        println!("{}", renderer.classification(&result));
    }
    Ok(())
}

/// One line of interactive input
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Search(String),
    Next,
    Previous,
    Page(u32),
    Text(String),
    Classify,
    Sample(String),
    Clear,
    Reset,
    Show,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head.to_ascii_lowercase().as_str() {
            "" => ReplCommand::Empty,
            "s" | "search" => ReplCommand::Search(rest.to_string()),
            "n" | "next" => ReplCommand::Next,
            "p" | "prev" | "previous" => ReplCommand::Previous,
            "page" | "g" => match rest.parse() {
                Ok(page) => ReplCommand::Page(page),
                Err(_) => ReplCommand::Unknown(line.to_string()),
            },
            "t" | "text" => ReplCommand::Text(rest.to_string()),
            "c" | "classify" => ReplCommand::Classify,
            "sample" => ReplCommand::Sample(rest.to_string()),
            "clear" => ReplCommand::Clear,
            "reset" => ReplCommand::Reset,
            "show" => ReplCommand::Show,
            "h" | "help" | "?" => ReplCommand::Help,
            "q" | "quit" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}

fn print_help(categories: &[String]) {
    println!("Commands:");
    println!("  search <query>    search publications (page 1)");
    println!("  next | prev       move between result pages");
    println!("  page <n>          jump to a result page");
    println!("  text <text>       set classifier input (classified after a pause)");
    println!("  classify          classify the current input now");
    println!("  sample <category> load sample text ({})", categories.join(", "));
    println!("  clear             clear the classifier");
    println!("  reset             clear everything");
    println!("  show              redraw the current state");
    println!("  help | quit");
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn render_search(session: &Session, renderer: &Renderer) {
    println!("{}", renderer.section("Search"));
    println!("{}", renderer.search_view(session.state().search(), &session.pager()));
}

fn render_classifier(session: &Session, renderer: &Renderer) {
    println!("{}", renderer.section("Classifier"));
    println!("{}", renderer.classifier_view(session.state().classifier()));
}

async fn interactive(session: &mut Session, renderer: &Renderer, categories: &[String]) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help(categories);
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                if !handle_command(session, renderer, categories, ReplCommand::parse(&line)).await {
                    break;
                }
                prompt();
            }
            Some(update) = session.next_update() => {
                if update.is_visible() {
                    println!();
                    match update {
                        Update::Search => render_search(session, renderer),
                        _ => render_classifier(session, renderer),
                    }
                    prompt();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }
    Ok(())
}

/// Apply one command; false means quit
async fn handle_command(
    session: &mut Session,
    renderer: &Renderer,
    categories: &[String],
    command: ReplCommand,
) -> bool {
    match command {
        ReplCommand::Search(query) => {
            session.set_query(query);
            match session.submit() {
                Ok(()) => render_search(session, renderer),
                Err(e) => println!("{}", renderer.status(Status::Warning, &e.to_string())),
            }
        }
        ReplCommand::Next | ReplCommand::Previous | ReplCommand::Page(_) => {
            let moved = match command {
                ReplCommand::Next => session.next_page(),
                ReplCommand::Previous => session.previous_page(),
                ReplCommand::Page(page) => session.go_to_page(page),
                _ => false,
            };
            if moved {
                render_search(session, renderer);
            } else {
                println!("{}", renderer.status(Status::Info, "No such page."));
            }
        }
        ReplCommand::Text(text) => {
            session.set_text(text);
            println!("{}", ui::stats_line(session.state().classifier().stats()));
        }
        ReplCommand::Classify => match session.classify_now() {
            Ok(()) => render_classifier(session, renderer),
            Err(e) => println!("{}", renderer.status(Status::Warning, &e.to_string())),
        },
        ReplCommand::Sample(category) => match session.load_sample(&category).await {
            Ok(()) => {
                println!("{}", session.state().classifier().text());
                println!("{}", ui::stats_line(session.state().classifier().stats()));
            }
            Err(e) => println!("{}", renderer.status(Status::Error, &format!("Error fetching sample: {}", e))),
        },
        ReplCommand::Clear => {
            session.clear_classifier();
            render_classifier(session, renderer);
        }
        ReplCommand::Reset => {
            session.reset();
            println!("{}", renderer.status(Status::Success, "Session reset."));
        }
        ReplCommand::Show => {
            render_search(session, renderer);
            render_classifier(session, renderer);
        }
        ReplCommand::Help => print_help(categories),
        ReplCommand::Quit => return false,
        ReplCommand::Empty => {}
        ReplCommand::Unknown(line) => {
            println!("{}", renderer.status(Status::Warning, &format!("Unknown command: {}", line)));
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        assert!(!version.is_empty());
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_default_command_is_interactive() {
        let cli = Cli::try_parse_from(["scholar-lens"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.output, OutputFormat::Auto);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_search_args() {
        let cli = Cli::try_parse_from([
            "scholar-lens",
            "search",
            "climate policy",
            "--page",
            "2",
            "-o",
            "json",
            "--api-url",
            "http://localhost:9000",
        ])
        .unwrap();

        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000"));
        match cli.command {
            Some(Commands::Search { query, page }) => {
                assert_eq!(query, "climate policy");
                assert_eq!(page, 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["scholar-lens", "classify", "Stocks fell", "-vv", "--timeout", "5"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.timeout, Some(5));
        assert!(matches!(cli.command, Some(Commands::Classify { .. })));
    }

    #[test]
    fn test_config_init_args() {
        let cli = Cli::try_parse_from(["scholar-lens", "config", "init", "./lens.toml", "--force"]).unwrap();
        match cli.command {
            Some(Commands::Config {
                action: ConfigAction::Init { path, force },
            }) => {
                assert_eq!(path, Some(PathBuf::from("./lens.toml")));
                assert!(force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_page_is_parse_error() {
        assert!(Cli::try_parse_from(["scholar-lens", "search", "q", "--page", "-1"]).is_err());
    }

    #[test]
    fn test_repl_command_parsing() {
        assert_eq!(
            ReplCommand::parse("search  climate policy "),
            ReplCommand::Search("climate policy".to_string())
        );
        assert_eq!(ReplCommand::parse("n"), ReplCommand::Next);
        assert_eq!(ReplCommand::parse("PREV"), ReplCommand::Previous);
        assert_eq!(ReplCommand::parse("page 3"), ReplCommand::Page(3));
        assert_eq!(
            ReplCommand::parse("page three"),
            ReplCommand::Unknown("page three".to_string())
        );
        assert_eq!(
            ReplCommand::parse("text Stocks fell"),
            ReplCommand::Text("Stocks fell".to_string())
        );
        assert_eq!(ReplCommand::parse("sample health"), ReplCommand::Sample("health".to_string()));
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Empty);
        assert_eq!(ReplCommand::parse("quit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("search"), ReplCommand::Search(String::new()));
    }
}
