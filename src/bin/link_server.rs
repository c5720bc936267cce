use std::sync::Arc;
use anyhow::{Context, Result};
use sqlx::mysql::MySqlPoolOptions;
use hwlink::config::LinkConfig;
use hwlink::servers::link::{client, parse_lang_file, LinkMessages, LinkService};
use hwlink::store::{LinkStore, MemoryStore, MySqlLinkStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut conf_file = "conf/link.yaml".to_string();
    let mut lang_file = "conf/lang.yaml".to_string();

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "--h" | "--?" | "/?" => {
                println!("Usage: link_server [--conf FILE] [--lang FILE]");
                return Ok(());
            }
            "--conf" => {
                if i + 1 < args.len() {
                    i += 1;
                    conf_file = args[i].clone();
                } else {
                    eprintln!("Error: --conf requires a FILE argument");
                    return Ok(());
                }
            }
            "--lang" => {
                if i + 1 < args.len() {
                    i += 1;
                    lang_file = args[i].clone();
                } else {
                    eprintln!("Error: --lang requires a FILE argument");
                    return Ok(());
                }
            }
            _ => {}
        }
        i += 1;
    }

    let config: LinkConfig = {
        let content = std::fs::read_to_string(&conf_file)
            .with_context(|| format!("Cannot read config: {}", conf_file))?;
        LinkConfig::from_str(&content)
            .with_context(|| format!("Cannot parse config: {}", conf_file))?
    };

    let messages = match std::fs::read_to_string(&lang_file) {
        Ok(content) => parse_lang_file(&content)?,
        Err(_) => LinkMessages::default(),
    };

    tracing::info!("[link] [started] Link Server Started");

    if config.has_sql() {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(&config.db_url())
            .await
            .with_context(|| format!("Cannot connect to DB: {}", config.sql_ip))?;
        serve(config, messages, MySqlLinkStore::new(pool)).await
    } else {
        tracing::warn!("[link] [no_sql] running on the in-memory store; replay protection is local to this process");
        serve(config, messages, MemoryStore::new()).await
    }
}

async fn serve<S: LinkStore + 'static>(
    config: LinkConfig,
    messages: LinkMessages,
    store: S,
) -> Result<()> {
    let bind = format!("{}:{}", config.link_ip, config.link_port);
    let service = Arc::new(LinkService::start(config, messages, store));

    if let Some(state) = service.authority() {
        state.preload_ledger().await;
        tracing::info!("[link] [ready] used_codes={}", state.used_code_count().await);
    }

    client::run(service, &bind).await
}
