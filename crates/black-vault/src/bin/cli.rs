//! Black Vault CLI: ingest, search, list, show, export, consolidate.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use black_vault::config::Config;
use black_vault::BlackVault;

#[derive(Parser)]
#[command(name = "blackvault", about = "Personal content repository with hybrid retrieval")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a file from disk.
    Ingest {
        path: PathBuf,
    },
    /// Run a hybrid search query.
    Search {
        query: String,
        #[arg(short, long, default_value_t = 10)]
        k: usize,
    },
    /// List stored items.
    List {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
        #[arg(short, long, default_value_t = 0)]
        offset: usize,
    },
    /// Show one item's detail, including its chunks.
    Show {
        id: i64,
    },
    /// Export the vault's item metadata.
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
    /// Merge clusters of short, similar notes.
    Consolidate,
    /// Toggle the log level between `info` and `debug` for this invocation.
    Logtoggle,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::from_env_and_file().map_err(|e| format!("config error: {}", e))?;
    if matches!(cli.command, Command::Logtoggle) {
        config.log_level = if config.log_level == "debug" {
            "info".to_string()
        } else {
            "debug".to_string()
        };
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_level))
        .init();

    let vault = BlackVault::open(config)?;

    match cli.command {
        Command::Ingest { path } => {
            let text = std::fs::read_to_string(&path)?;
            let outcome = vault.ingest_file(&path, &text).await;
            if outcome.success {
                println!("ingested {} as item {}", path.display(), outcome.item_id.unwrap());
            } else if outcome.is_duplicate {
                println!(
                    "{} is a duplicate of existing item {}",
                    path.display(),
                    outcome.duplicate_id.unwrap()
                );
            } else {
                eprintln!("failed to ingest {}: {}", path.display(), outcome.error.unwrap_or_default());
                std::process::exit(1);
            }
        }
        Command::Search { query, k } => {
            let results = vault.search(&query, k).await?;
            if results.is_empty() {
                println!("no results");
            }
            for result in results {
                println!(
                    "[{:.3}] #{} {} ({})\n    {}\n",
                    result.score, result.item_id, result.title, result.source_type, result.snippet
                );
            }
        }
        Command::List { limit, offset } => {
            let items = vault.store.list_items(limit, offset).await?;
            for item in items {
                println!("#{:<6} {:<10} {}", item.id, item.source_type, item.title);
            }
        }
        Command::Show { id } => {
            let item = vault
                .store
                .get_item(id)
                .await?
                .ok_or_else(|| format!("no item with id {}", id))?;
            println!("id:       {}", item.id);
            println!("title:    {}", item.title);
            println!("source:   {} ({})", item.source_path, item.source_type);
            println!("tags:     {}", item.tags);
            println!("summary:  {}", item.summary);
            println!("created:  {}", item.created_at);

            let chunks = vault.store.get_chunks(item.id).await?;
            println!("\n{} chunks:", chunks.len());
            for (chunk_id, index, body) in chunks {
                let preview: String = body.chars().take(80).collect();
                println!("  [{}] #{} {}", index, chunk_id, preview);
            }
        }
        Command::Export { format } => {
            let items = vault.store.list_items(usize::MAX / 2, 0).await?;
            match format {
                ExportFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&items)?);
                }
                ExportFormat::Csv => {
                    println!("id,source_path,source_type,title,tags,created_at");
                    for item in items {
                        println!(
                            "{},{},{},{},{},{}",
                            item.id,
                            csv_escape(&item.source_path),
                            item.source_type,
                            csv_escape(&item.title),
                            csv_escape(&item.tags),
                            item.created_at
                        );
                    }
                }
            }
        }
        Command::Consolidate => {
            let merged = vault.consolidate().await?;
            println!("merged {} cluster(s) of short notes", merged);
        }
        Command::Logtoggle => {
            println!("log level set to {}", vault.config().log_level);
        }
    }

    Ok(())
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
