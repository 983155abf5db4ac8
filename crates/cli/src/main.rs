mod config;
mod error;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use runtime::{
    GeminiBackend, LoopEvent, LoopObserver, McpToolInvoker, QueryResolver, ScriptedBackend,
    TextBackend, ToolInvoker, ToolRegistry,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

const SEPARATOR_WIDTH: usize = 50;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Answer questions with a language model and MCP tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, default_value_os_t = config::default_path())]
    config: PathBuf,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive query session
    Chat,
    /// List the tools offered by the configured server
    Tools,
    /// Host a tool set over stdio
    Serve {
        #[command(subcommand)]
        service: Service,
    },
}

#[derive(Subcommand)]
enum Service {
    /// arXiv paper search and lookup
    Research {
        /// Directory papers are saved under
        #[arg(long, default_value = research::DEFAULT_PAPER_DIR)]
        paper_dir: PathBuf,
    },
    /// Hourly weather from AccuWeather
    Weather {
        /// Location-key cache file
        #[arg(long)]
        cache_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Chat) | None => cmd_chat(&cli.config).await,
        Some(Commands::Tools) => cmd_tools(&cli.config).await,
        Some(Commands::Serve { service }) => cmd_serve(service).await,
    }
}

/// Logs go to stderr; stdout belongs to the chat or the protocol.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn connect_tools(config: &Config) -> Result<McpToolInvoker> {
    let exe = std::env::current_exe()?;
    Ok(McpToolInvoker::spawn(config.server_config(&exe)).await?)
}

async fn cmd_chat(config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let tools = connect_tools(&config).await?;

    if config.backend.mock {
        info!("using scripted backend");
        chat(&config, ScriptedBackend::default(), tools).await
    } else {
        let backend = GeminiBackend::builder(config.api_key()?, config.model()).build();
        info!(backend = %backend, "using Gemini backend");
        chat(&config, backend, tools).await
    }
}

async fn chat<B: TextBackend>(config: &Config, backend: B, tools: McpToolInvoker) -> Result<()> {
    let resolver = QueryResolver::connect(backend, tools)
        .await?
        .with_options(config.resolver_options());
    println!(
        "\nConnected to server with tools: {:?}",
        resolver.registry().names()
    );
    println!("\nMCP Chatbot Started!");
    println!("Type your queries or 'quit' to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();
    let mut printer = Printer;

    loop {
        print!("\nQuery: ");
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            // EOF
            break;
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("quit") {
            break;
        }

        match resolver.resolve_with(query, &mut printer).await {
            Ok(_) => println!("\n{}\n", "=".repeat(SEPARATOR_WIDTH)),
            Err(e) => println!("\nError: {e}"),
        }
    }

    let (_, tools) = resolver.into_parts();
    tools.shutdown().await;
    Ok(())
}

/// Echoes loop progress to stdout.
struct Printer;

impl LoopObserver for Printer {
    fn on_event(&mut self, event: &LoopEvent<'_>) {
        match event {
            LoopEvent::ToolCall { name, args } => {
                let args = serde_json::to_string(args).unwrap_or_default();
                println!("Calling tool {name} with args {args}");
            }
            LoopEvent::ToolResult { content, .. } => println!("Tool result: {content}"),
            LoopEvent::ToolError { message, .. } => println!("{message}"),
            LoopEvent::Answer { content } => println!("{content}"),
        }
    }
}

async fn cmd_tools(config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let tools = connect_tools(&config).await?;
    let registry = ToolRegistry::from_tools(tools.list_tools().await?);

    if registry.is_empty() {
        println!("Server {} offers no tools.", tools.server_name());
    }
    for tool in &registry {
        println!("{}", tool.name);
        if !tool.description.is_empty() {
            println!("    {}", tool.description);
        }
    }

    tools.shutdown().await;
    Ok(())
}

async fn cmd_serve(service: Service) -> Result<()> {
    match service {
        Service::Research { paper_dir } => {
            let tools = research::ResearchTools::new(
                research::ArxivClient::new()?,
                research::PaperStore::new(paper_dir),
            );
            info!(paper_dir = %tools.store().root().display(), "serving research tools");
            mcp::serve_stdio(&tools).await?;
        }
        Service::Weather { cache_file } => {
            let cache = cache_file
                .map(weather::LocationCache::new)
                .unwrap_or_default();
            let service =
                weather::WeatherService::new(weather::AccuWeatherClient::from_env()?, cache);
            info!(cache = %service.cache().path().display(), "serving weather tools");
            mcp::serve_stdio(&weather::WeatherTools::new(service)).await?;
        }
    }
    Ok(())
}
