//! Folio command-line interface.
//!
//! One-shot commands around the library: tokenize or render an assistant
//! response, screen a chat message or an analytics visitor, personalize a
//! Markdown post and inspect the personalization cache.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use folio::analytics;
use folio::chat::guard::validate_input;
use folio::chat::render::{render_response, Locale};
use folio::chat::tokenizer::tokenize;
use folio::config::{self, Config};
use folio::logging;
use folio::p13n::{CacheKey, Persona, PersonaRequest, PersonalizationCache, Personalizer};
use folio::providers::openai::OpenAiRewriter;
use folio::storage::SqliteStore;

/// Folio: chat response tokenizer and persona-rewrite cache.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Path to config.toml (default: ~/.folio/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write JSON logs to this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the segments of an assistant response as JSON.
    Tokenize {
        /// Assistant response text.
        text: String,
    },
    /// Render an assistant response as an HTML fragment.
    Render {
        /// Button label language.
        #[arg(long, default_value = "pl")]
        locale: Locale,
        /// Assistant response text.
        text: String,
    },
    /// Screen a chat message and print the findings as JSON.
    Guard {
        /// User message.
        text: String,
    },
    /// Screen an analytics visitor and print its bot verdict and fingerprint.
    Visitor {
        /// Client address (already extracted from proxy headers).
        #[arg(long, default_value = folio::analytics::UNKNOWN_IP)]
        ip: String,
        /// `User-Agent` header.
        #[arg(long)]
        user_agent: Option<String>,
        /// `Sec-CH-UA` header.
        #[arg(long)]
        sec_ch_ua: Option<String>,
        /// Fingerprint salt; defaults to today's date.
        #[arg(long)]
        salt: Option<String>,
    },
    /// Rewrite a Markdown post for a persona, using the cache when possible.
    Personalize {
        /// Post identifier used in the cache key.
        #[arg(long)]
        post_id: String,
        /// Persona (HR, NonIT, Child10, Poet, Developer, Custom).
        #[arg(long)]
        persona: Persona,
        /// Custom instruction, used with the Custom persona.
        #[arg(long)]
        prompt: Option<String>,
        /// Markdown file to rewrite.
        file: PathBuf,
    },
    /// Inspect or clear cached rewrites.
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Print the cached rewrite for a post and persona.
    Get {
        /// Post identifier.
        #[arg(long)]
        post_id: String,
        /// Persona.
        #[arg(long)]
        persona: Persona,
    },
    /// Remove the cached rewrite for a post and persona.
    Invalidate {
        /// Post identifier.
        #[arg(long)]
        post_id: String,
        /// Persona.
        #[arg(long)]
        persona: Persona,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let _log_guard = match &cli.log_dir {
        Some(dir) => Some(logging::init_file(dir, "warn")?),
        None => {
            logging::init_cli("warn");
            None
        }
    };

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_dir()?.join("config.toml"),
    };
    let config = config::load_or_default(&config_path)?;

    match cli.command {
        Command::Tokenize { text } => {
            let segments = tokenize(&text);
            println!("{}", serde_json::to_string_pretty(&segments)?);
        }
        Command::Render { locale, text } => {
            println!("{}", render_response(&text, locale));
        }
        Command::Guard { text } => {
            let check = validate_input(&text);
            println!("{}", serde_json::to_string_pretty(&check)?);
        }
        Command::Visitor {
            ip,
            user_agent,
            sec_ch_ua,
            salt,
        } => {
            let salt = salt.unwrap_or_else(|| analytics::day_key(chrono::Utc::now()));
            let report = serde_json::json!({
                "bot": analytics::is_likely_bot(user_agent.as_deref(), sec_ch_ua.as_deref()),
                "fingerprint": analytics::fingerprint(&ip, user_agent.as_deref(), &salt),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Personalize {
            post_id,
            persona,
            prompt,
            file,
        } => {
            let markdown = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let request = match prompt {
                Some(prompt) if persona == Persona::Custom => PersonaRequest::custom(prompt),
                _ => PersonaRequest::new(persona),
            };
            let cache = open_cache(&config).await;
            let rewriter = OpenAiRewriter::from_config(&config.openai);
            let personalizer =
                Personalizer::new(cache, Arc::new(rewriter)).enabled(config.p13n.enabled);

            let result = personalizer
                .personalize(&post_id, &request, &markdown)
                .await?;
            info!(source = ?result.source, "personalization finished");
            println!("{}", result.markdown);
        }
        Command::Cache { action } => {
            let cache = open_cache(&config).await;
            match action {
                CacheCommand::Get { post_id, persona } => {
                    let key = CacheKey::new(post_id, persona).to_string();
                    match cache.get(&key).await {
                        Some(markdown) => println!("{markdown}"),
                        None => anyhow::bail!("no cached rewrite for {key}"),
                    }
                }
                CacheCommand::Invalidate { post_id, persona } => {
                    let key = CacheKey::new(post_id, persona).to_string();
                    cache.invalidate(&key).await;
                    println!("invalidated {key}");
                }
            }
        }
    }

    Ok(())
}

/// Cache over the configured SQLite file, or a detached cache if it cannot be opened.
async fn open_cache(config: &Config) -> PersonalizationCache {
    let path = match config.p13n.database_path() {
        Ok(path) => path,
        Err(err) => {
            warn!(error = %err, "no cache database path, caching disabled");
            return PersonalizationCache::detached();
        }
    };
    if let Some(parent) = path.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            warn!(path = %parent.display(), error = %err, "cannot create cache directory");
        }
    }
    match SqliteStore::open(&path).await {
        Ok(store) => PersonalizationCache::with_prefix(Arc::new(store), &config.p13n.cache_prefix),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cache database unavailable, caching disabled");
            PersonalizationCache::detached()
        }
    }
}
