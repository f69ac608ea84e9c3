//! nrc-cli: command-line driver for the Number Runner Club ledger.
//!
//! Prints the king auction price table, runs a staking scenario against an
//! in-memory ledger, and dumps the resulting share accumulator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use nrc_core::constants::{ETHER, SECONDS_PER_DAY};
use nrc_core::fixed;
use nrc_core::pool::MemoryRewardPool;
use nrc_core::traits::PriceCalculator;
use nrc_core::types::{Address, Color, Hash256, Identifier, PieceType, TokenId};
use nrc_ledger::{Ledger, LedgerConfig};

/// Number Runner Club ledger driver.
#[derive(Parser)]
#[command(name = "nrc-cli")]
#[command(version, about = "Staking ledger and king auction driver")]
struct Cli {
    /// Config file (TOML). Defaults to <config dir>/nrc/nrc.toml when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the king auction price for each day since opening.
    Price(PriceArgs),
    /// Run a mint/stake/kill/reveal scenario and print the outcome.
    Simulate(SimulateArgs),
    /// Print the effective configuration as JSON.
    Config,
}

#[derive(Args)]
struct PriceArgs {
    /// Number of days to tabulate.
    #[arg(short, long, default_value_t = 14)]
    days: u64,
}

#[derive(Args)]
struct SimulateArgs {
    /// Epochs to advance after staking.
    #[arg(short, long, default_value_t = 7)]
    epochs: u64,

    /// Seed for the reveal randomness.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print every ledger event as a JSON line.
    #[arg(long)]
    events: bool,

    /// Print the full share accumulator table.
    #[arg(long)]
    accumulator: bool,

    /// Print the staked share total of every type per epoch.
    #[arg(long)]
    shares: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Price(args) => price_table(&config, args),
        Commands::Simulate(args) => simulate(config, args),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<LedgerConfig> {
    let default_path = dirs::config_dir().map(|d| d.join("nrc").join("nrc.toml"));
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => default_path.filter(|p| p.exists()),
    };
    let config = LedgerConfig::load(path.as_deref()).with_context(|| match &path {
        Some(p) => format!("Failed to load config from {}", p.display()),
        None => "Failed to load config from environment".to_string(),
    })?;
    info!(path = ?path, "configuration loaded");
    Ok(config)
}

/// Daily price table. The factor column uses four decimal places
/// (`factor * 10000 / 2^64`).
fn price_table(config: &LedgerConfig, args: PriceArgs) -> Result<()> {
    let curve = config.price_curve().context("Invalid auction curve")?;
    println!("{:>5}  {:>8}  {:>24}  {:>12}", "day", "factor", "price (wei)", "price (ETH)");
    for day in 0..=args.days {
        let elapsed = day.saturating_mul(SECONDS_PER_DAY);
        let factor = curve.factor(elapsed)?;
        let price = curve.price(elapsed)?;
        println!(
            "{:>5}  {:>8}  {:>24}  {:>12.6}",
            day,
            fixed::to_human(factor, 10_000)?,
            price,
            price as f64 / ETHER as f64
        );
    }
    Ok(())
}

fn identifier(name: &str) -> Result<Identifier> {
    let hash = Hash256(*blake3::hash(name.as_bytes()).as_bytes());
    Identifier::new(hash, name).with_context(|| format!("Invalid identifier {name}"))
}

fn simulate(config: LedgerConfig, args: SimulateArgs) -> Result<()> {
    let player_a = Address([0xA1; 20]);
    let player_b = Address([0xB2; 20]);
    let mint_cost = config.mint_price as u128 * 5;
    let kill_cost = config.kill_price as u128;
    let reveal_cost = config.reveal_price as u128;
    let opening = config.auction_start;

    let pool = Arc::new(MemoryRewardPool::new());
    let ledger = Ledger::new(config, pool.clone()).context("Failed to build ledger")?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let a_tokens = ledger.mint(player_a, 5, Color::White, mint_cost)?;
    let b_tokens = ledger.mint(player_b, 5, Color::Black, mint_cost)?;
    let king_price = ledger.current_price(opening)?;
    let king = ledger.buy_king(player_a, Color::White, king_price, opening)?;
    println!("player A minted {a_tokens:?} and bought king {king} for {king_price} wei");
    println!("player B minted {b_tokens:?}");

    let staked: Vec<TokenId> = a_tokens.iter().take(2).copied().chain([king]).collect();
    for (i, &token) in staked.iter().enumerate() {
        ledger.stake(player_a, identifier(&format!("{}{}.eth", token, i))?, token)?;
    }
    ledger.stake(player_b, identifier("runner.eth")?, b_tokens[0])?;

    for _ in 0..args.epochs {
        ledger.advance_epoch()?;
    }

    let victim = b_tokens[0];
    let forfeited = ledger.multi_kill(player_a, &[victim], kill_cost)?;
    println!("player A killed {victim}, forfeiting {forfeited} wei of rewards");
    ledger.advance_epoch()?;

    let revealer = a_tokens[4];
    let request = ledger.reveal_king_hand(player_a, revealer, reveal_cost)?;
    let won = ledger.fulfill_reveal(request, rng.r#gen::<u64>())?;
    println!("reveal of {revealer}: {}", if won { "king hand" } else { "no luck" });
    if won {
        let prize = ledger.claim_king_hand(player_a, revealer)?;
        println!("king hand prize: {prize} wei");
    }

    for &token in &staked {
        let unclaimed = ledger.unclaimed_rewards(token)?;
        let claimed = ledger.get_reward(player_a, token)?;
        println!(
            "token {token:>4} ({}): unclaimed {unclaimed} wei, claimed {claimed} wei",
            ledger.piece_type(token)
        );
    }
    if let Err(e) = ledger.get_reward(player_b, victim) {
        warn!(token = victim, error = %e, "claim on killed token rejected");
    }

    println!("{}", serde_json::to_string_pretty(&ledger.summary())?);
    println!("paid to player A: {} wei", pool.paid_to(&player_a));

    if args.accumulator {
        let table = ledger.with_state(|s| s.accumulator_table());
        for (piece, row) in PieceType::ALL.iter().zip(table) {
            println!("{piece:>6}: {row:?}");
        }
    }
    if args.shares {
        let table = ledger.with_state(|s| s.share_totals_table());
        for (piece, row) in PieceType::ALL.iter().zip(table) {
            println!("{piece:>6}: {row:?}");
        }
    }
    if args.events {
        for event in ledger.drain_events() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
