use clap::{Args, Parser, Subcommand};
use momentumbot::api::{AlpacaClient, Credentials, MarketData, SyntheticSource};
use momentumbot::journal::TradeJournal;
use momentumbot::models::CandidateResult;
use momentumbot::scanner::{metadata, Scanner, Watchlist};
use momentumbot::strategy::StrategyConfig;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "momentumbot", about = "Momentum watchlist scanner with an adaptive trade journal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a fixed list of symbols over historical data
    Historical {
        /// Symbols to evaluate
        #[arg(long, required = true, num_args = 1..)]
        symbols: Vec<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Pre-scan a universe for today's fast movers, then evaluate them
    Live {
        /// Universe to seed the fast-mover scan
        #[arg(long, required = true, num_args = 1..)]
        universe: Vec<String>,

        /// Minimum price for fast movers
        #[arg(long, default_value_t = 5.0)]
        min_price: f64,

        /// Minimum daily volume for fast movers
        #[arg(long, default_value_t = 200_000.0)]
        min_volume: f64,

        /// Number of fast movers to carry into evaluation
        #[arg(long, default_value_t = 25)]
        scan_top_n: usize,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Historical lookback window in sessions
    #[arg(long, default_value_t = 365)]
    lookback_days: usize,

    /// Relative strength lookback window in sessions
    #[arg(long, default_value_t = 125)]
    rs_window: usize,

    /// Window for base length estimation in sessions
    #[arg(long, default_value_t = 90)]
    base_lookback: usize,

    /// Path to the trade journal file
    #[arg(long, default_value = "journal.json")]
    journal: PathBuf,

    /// Account equity for position sizing
    #[arg(long, default_value_t = 100_000.0)]
    account_equity: f64,

    /// Fraction of equity risked per trade
    #[arg(long, default_value_t = 0.01)]
    risk_fraction: f64,

    /// Watchlist entries to print
    #[arg(long, default_value_t = 10)]
    top_n: usize,

    /// Optional JSON file for the full evaluation payload
    #[arg(long)]
    output: Option<PathBuf>,

    /// Run against deterministic synthetic data instead of Alpaca
    #[arg(long)]
    synthetic: bool,
}

#[tokio::main]
async fn main() -> momentumbot::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Historical { symbols, common } => {
            if common.synthetic {
                evaluate(&SyntheticSource::new(42), symbols, &common).await
            } else {
                let client = AlpacaClient::new(Credentials::from_env()?);
                evaluate(&client, symbols, &common).await
            }
        }
        Commands::Live {
            universe,
            min_price,
            min_volume,
            scan_top_n,
            common,
        } => {
            if common.synthetic {
                let source = SyntheticSource::new(42);
                let symbols =
                    fast_movers(&source, &universe, min_price, min_volume, scan_top_n).await?;
                evaluate(&source, symbols, &common).await
            } else {
                let client = AlpacaClient::new(Credentials::from_env()?);
                let symbols =
                    fast_movers(&client, &universe, min_price, min_volume, scan_top_n).await?;
                evaluate(&client, symbols, &common).await
            }
        }
    }
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "momentumbot=info".into()),
        )
        .init();
}

async fn fast_movers<M: MarketData>(
    source: &M,
    universe: &[String],
    min_price: f64,
    min_volume: f64,
    top_n: usize,
) -> momentumbot::Result<Vec<String>> {
    let movers = source
        .scan_fast_movers(universe, min_price, min_volume, top_n)
        .await?;
    if movers.is_empty() {
        tracing::warn!("No fast movers met the scan criteria today");
    }
    Ok(movers.into_iter().map(|snapshot| snapshot.symbol).collect())
}

async fn evaluate<M: MarketData>(
    source: &M,
    symbols: Vec<String>,
    args: &CommonArgs,
) -> momentumbot::Result<()> {
    let mut series_by_symbol = HashMap::new();
    for symbol in symbols {
        match source.fetch_series(&symbol, args.lookback_days).await {
            Ok(bars) if !bars.is_empty() => {
                series_by_symbol.insert(symbol, bars);
            }
            Ok(_) => tracing::warn!("No bars returned for {symbol}, skipping"),
            Err(err) => tracing::warn!("Failed to fetch {symbol}: {err}"),
        }
    }

    let (candidates, unscored) = metadata::assemble_candidates(
        series_by_symbol,
        args.rs_window,
        args.base_lookback,
        args.account_equity,
    );
    for skip in &unscored {
        tracing::warn!("Skipping {}: {}", skip.symbol, skip.reason);
    }

    let journal = TradeJournal::load_or_create(&args.journal)?;
    let config = StrategyConfig {
        risk_fraction: args.risk_fraction,
        ..Default::default()
    };
    let mut scanner = Scanner::new(config, journal)?;

    let watchlist = scanner.build_watchlist(candidates);
    print_summary(watchlist.top(args.top_n));

    if let Some(path) = &args.output {
        export_watchlist(&watchlist, path)?;
    }
    Ok(())
}

fn print_summary(results: &[CandidateResult]) {
    if results.is_empty() {
        println!("No qualifying candidates found.");
        return;
    }

    println!("{:<8} {:>7} {:>10} {:>10} {:>8}", "Symbol", "Score", "Entry", "Stop", "Shares");
    println!("{}", "-".repeat(47));
    for result in results {
        // Qualifying entries always carry a plan; guard anyway
        let (entry, stop, shares) = result
            .position_plan
            .as_ref()
            .map(|plan| (plan.entry_price, plan.stop_price, plan.shares))
            .unwrap_or((result.snapshot.close, f64::NAN, 0));
        println!(
            "{:<8} {:>7.3} {:>10.2} {:>10.2} {:>8}",
            result.symbol, result.rank_score, entry, stop, shares
        );
    }
}

fn export_watchlist(watchlist: &Watchlist, path: &PathBuf) -> momentumbot::Result<()> {
    let payload = serde_json::to_string_pretty(watchlist)?;
    std::fs::write(path, payload)?;
    tracing::info!("Saved detailed results to {}", path.display());
    Ok(())
}
