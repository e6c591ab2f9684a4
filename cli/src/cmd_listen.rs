//! `ssefetch listen`

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;

use ssefetch_core::{listener, ClientConfig, Event};

pub struct ListenArgs {
    pub url: String,
    pub method: Option<String>,
    pub headers: Vec<String>,
    pub body: Option<String>,
    pub no_body: bool,
    pub retry_ms: Option<u64>,
    pub config: Option<PathBuf>,
    pub flush_trailing: bool,
    pub json: bool,
    pub max_events: Option<u64>,
}

/// Split a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("header must look like `Name: value`, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("header name is empty in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Config file first, then command-line overrides.
pub fn build_config(args: &ListenArgs) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ClientConfig::from_json(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => ClientConfig::default(),
    };

    if let Some(method) = &args.method {
        config = config.with_method(method.to_uppercase());
    }
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        config = config.with_header(name, value);
    }
    if let Some(body) = &args.body {
        config = config.with_body(body.clone());
    }
    if args.no_body {
        config = config.without_body();
    }
    if let Some(ms) = args.retry_ms {
        config = config.with_retry_interval(Duration::from_millis(ms));
    }
    if args.flush_trailing {
        config = config.with_flush_trailing_line(true);
    }
    Ok(config)
}

pub async fn run(args: ListenArgs) -> Result<()> {
    let config = build_config(&args)?;
    let client = ssefetch_http::client(args.url.clone(), config)?;

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();
    let seen = Arc::new(AtomicU64::new(0));
    let as_json = args.json;
    let max_events = args.max_events;

    client.add_event_listener(
        "message",
        listener(move |event| {
            let Some(record) = event.as_message() else {
                return Ok(());
            };
            if as_json {
                println!("{}", serde_json::to_string(record)?);
            } else {
                println!("{}", record.data);
            }
            let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
            if max_events.is_some_and(|max| n >= max) {
                let _ = done_tx.send(());
            }
            Ok(())
        }),
    );
    client.add_event_listener(
        "open",
        listener(|_| {
            tracing::info!("stream open");
            Ok(())
        }),
    );
    client.add_event_listener(
        "error",
        listener(|event| {
            if let Event::Error(err) = event {
                tracing::warn!(error = %err, "stream error");
            }
            Ok(())
        }),
    );
    client.add_event_listener(
        "close",
        listener(|_| {
            tracing::info!("stream closed");
            Ok(())
        }),
    );

    let attempt = {
        let client = client.clone();
        tokio::spawn(async move { client.connect().await })
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
        _ = done_rx.recv() => tracing::info!("message limit reached"),
    }
    client.close();

    match attempt.await {
        Ok(result) => result.map_err(Into::into),
        Err(e) => Err(anyhow!("listener task failed: {e}")),
    }
}
