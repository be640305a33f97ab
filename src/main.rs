use docdex::cli::{Cli, Commands, ConfigAction};
use docdex::config::Config;
use docdex::error::{DocdexError, Result};
use docdex::retrieval::Engine;

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Index => {
            cmd_index(cli.config)?;
        }
        Commands::Query {
            query,
            k,
            no_preprocess,
            json,
        } => {
            cmd_query(cli.config, &query, k, no_preprocess, json)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docdex=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_index(config_path: Option<std::path::PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::from_config(config)?;

    if let Some(stats) = engine.load_stats() {
        println!("✓ Collection built");
        println!("  Documents: {}", stats.total_documents);
        println!("  Cleaned:   {}", stats.cleaned_documents);
        println!("  Chunks:    {}", engine.chunk_count());
    } else {
        println!("✓ Collection already built ({} chunks)", engine.chunk_count());
    }

    engine.close();
    Ok(())
}

fn cmd_query(
    config_path: Option<std::path::PathBuf>,
    query: &str,
    k: Option<usize>,
    no_preprocess: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let k = k.unwrap_or(config.retrieval.top_k_docs);

    let engine = Engine::from_config(config)?;
    let (results, diagnostics) = engine.retrieve(query, k, !no_preprocess)?;

    if json {
        let payload = serde_json::json!({
            "results": results,
            "diagnostics": diagnostics,
        });
        let rendered = serde_json::to_string_pretty(&payload).map_err(|e| DocdexError::Json {
            source: e,
            context: "Failed to serialize query results".to_string(),
        })?;
        println!("{rendered}");
    } else {
        if let Some(improved) = &diagnostics.improved_query {
            if improved != &diagnostics.original_query {
                println!("Query rewritten: {improved}");
            }
        }
        if results.is_empty() {
            println!("No results");
        }
        for (i, scored) in results.iter().enumerate() {
            println!(
                "{}. [{:.4}] {} ({})",
                i + 1,
                scored.score,
                scored.chunk.metadata.title,
                scored.chunk.metadata.source_url
            );
            println!("   {}", preview(&scored.chunk.content, 200));
        }
    }

    engine.close();
    Ok(())
}

fn cmd_config(config_path: Option<std::path::PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| DocdexError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {}", parent.display()),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let rendered =
                serde_json::to_string_pretty(&config).map_err(|e| DocdexError::Json {
                    source: e,
                    context: "Failed to serialize config".to_string(),
                })?;
            println!("{rendered}");
        }
    }

    Ok(())
}

fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'docdex config init' to create one."
        );
        return Ok(Config::default());
    }

    Config::load(&path)
}

fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
