//! casino-host: development parent app for casino mini-games
//!
//! Modes:
//! - `serve [addr] [balance]` runs an in-memory host over TCP. Each stdin
//!   line `settle <game-id> <payout> [pocket]` settles the newest open bet of
//!   that game and pushes the result to every connected game
//! - `play [addr] [game-id] [stake] [pocket] [wait]` connects a demo roulette
//!   game to a running host and places a single straight-up bet; with `wait`
//!   it blocks until the host pushes the outcome

use anyhow::{Context, Result, bail};
use game_manager::{BetItem, BetRequest, BetResult, FnProcessor, GameManager};
use game_manager_bridge::{StreamConfig, StreamTransport};
use game_manager_host::{HostConfig, MemoryHost, serve_tcp};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Game specific payload sent by a roulette game service
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RouletteOutcome {
    winning_pocket: Option<u8>,
}

fn describe_spin(result: &BetResult, outcome: Option<RouletteOutcome>) -> game_manager::Result<String> {
    let pocket = outcome
        .and_then(|o| o.winning_pocket)
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".into());
    Ok(format!(
        "{}: ball landed on {}, payout {}",
        result.game_id, pocket, result.payout
    ))
}

async fn serve(args: &[String]) -> Result<()> {
    let mut config = HostConfig::default();
    if let Some(addr) = args.first() {
        config.addr = addr.clone();
    }
    if let Some(balance) = args.get(1) {
        config.balance = balance
            .parse()
            .with_context(|| format!("Invalid balance: {}", balance))?;
    }

    let listener = TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    info!(
        "Starting casino host, balance {} {}",
        config.balance, config.asset_code
    );

    let host = Arc::new(MemoryHost::new(config));
    let (bet_results, _) = broadcast::channel(64);
    tokio::spawn(settle_from_stdin(host.clone(), bet_results.clone()));
    serve_tcp(listener, host, bet_results).await?;
    Ok(())
}

/// Parse `settle <game-id> <payout> [pocket]`
fn parse_settle(line: &str) -> Result<BetResult> {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("settle") => {}
        Some(other) => bail!("Unknown command {}, expected settle", other),
        None => bail!("Empty command"),
    }
    let game_id = words.next().context("Missing game id")?;
    let payout: f64 = words
        .next()
        .context("Missing payout")?
        .parse()
        .context("Invalid payout")?;

    let mut result = BetResult::new(game_id, serde_json::Value::Null, payout);
    if let Some(pocket) = words.next() {
        let pocket: u8 = pocket
            .parse()
            .with_context(|| format!("Invalid pocket: {}", pocket))?;
        result.outcome = json!([pocket]);
        result.game_specific = json!({"winningPocket": pocket});
    }
    Ok(result)
}

/// Settle bets typed on stdin and push each outcome to the connected games
async fn settle_from_stdin(host: Arc<MemoryHost>, bet_results: broadcast::Sender<BetResult>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let result = match parse_settle(&line) {
            Ok(result) => result,
            Err(e) => {
                warn!("{:#}", e);
                continue;
            }
        };
        if !host.settle(&result).await {
            warn!("No open bet for {}", result.game_id);
            continue;
        }
        // No connected games is fine
        let _ = bet_results.send(result);
    }
}

async fn play(args: &[String]) -> Result<()> {
    let mut config = StreamConfig::default();
    if let Some(addr) = args.first() {
        let (host, port) = addr
            .rsplit_once(':')
            .with_context(|| format!("Expected host:port, got {}", addr))?;
        config.host = host.to_string();
        config.port = port.parse().with_context(|| format!("Invalid port: {}", port))?;
    }
    let game_id = args.get(1).cloned().unwrap_or_else(|| "roulette-demo".into());
    let stake: f64 = match args.get(2) {
        Some(s) => s.parse().with_context(|| format!("Invalid stake: {}", s))?,
        None => 1.0,
    };
    let pocket: i64 = match args.get(3) {
        Some(s) => s.parse().with_context(|| format!("Invalid pocket: {}", s))?,
        None => 17,
    };

    let transport = StreamTransport::connect_tcp(&config).await?;
    let gm = GameManager::new(transport, FnProcessor::new(describe_spin));

    let balance = gm.get_balance().await?;
    info!("Balance: {} {}", balance.balance, balance.asset_code);

    let bet_config = gm.get_bet_configuration().await?;
    if !bet_config.limits_for("straight").allows(stake) {
        bail!(
            "Stake {} outside [{}, {}]",
            stake,
            bet_config.minbet,
            bet_config.maxbet
        );
    }

    let wait = args.get(4).is_some_and(|a| a == "wait");
    let mut listener = gm.bet_results();

    let request = BetRequest::new(game_id).with_item(BetItem::new(stake, vec![pocket]));
    let confirmed = gm.place_bet(&request).await?;
    info!("Bet on {} confirmed: {}", pocket, confirmed);

    if let (true, true, Some(listener)) = (wait, confirmed, listener.as_mut()) {
        info!("Waiting for the host to settle {}", request.game_id);
        match listener.next().await {
            Some(summary) => info!("{}", summary?),
            None => warn!("Host stopped pushing results"),
        }
    }

    for entry in gm.get_history(true).await?.iter() {
        let summary = entry
            .bet_result
            .as_ref()
            .map(|r| gm.process_bet_results(r))
            .transpose()?
            .unwrap_or_else(|| "pending".into());
        info!(
            "{} at {:?}: {}",
            entry.txid,
            entry.bet_time_utc(),
            summary
        );
    }

    gm.exit_game().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("serve") | None => serve(args.get(1..).unwrap_or_default()).await,
        Some("play") => play(&args[1..]).await,
        Some(other) => bail!("Unknown mode {}, expected serve or play", other),
    }
}
