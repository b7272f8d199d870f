use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;

use crypto_backtest::{
    best_by, generate_synthetic_bars, logging, run_sweep, BacktestConfig, BacktestEngine,
    BacktestResult, BarCleaner, BarSource, CleanerConfig, CleaningReport, FileBarSource,
    MovingAverageCrossStrategy, ParamGrid, PerformanceAnalyzer, PerformanceMetrics, RsiConfig,
    RsiReversionStrategy, SignalSource, StrategyConfig, SweepOutcome, Timeframe,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyKind {
    MaCross,
    RsiReversion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "crypto-backtest")]
#[command(version = "0.1.0")]
#[command(about = "Bar-by-bar crypto strategy backtester", long_about = None)]
struct Args {
    /// Data file path (CSV/JSON). If not provided, uses synthetic data.
    #[arg(short = 'f', long)]
    data_file: Option<PathBuf>,

    /// Number of synthetic bars to generate
    #[arg(short, long, default_value = "1000")]
    bars: usize,

    /// Seed for synthetic data
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Initial price for synthetic data
    #[arg(long, default_value = "30000.0")]
    initial_price: f64,

    /// Bar interval (1s, 1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w)
    #[arg(short, long, default_value = "1h")]
    timeframe: Timeframe,

    #[arg(long, value_enum, default_value = "ma-cross")]
    strategy: StrategyKind,

    /// Fast moving average period
    #[arg(long, default_value = "5")]
    fast: usize,

    /// Slow moving average period
    #[arg(long, default_value = "20")]
    slow: usize,

    /// RSI period
    #[arg(long, default_value = "14")]
    rsi_period: usize,

    /// RSI oversold threshold
    #[arg(long, default_value = "30")]
    rsi_oversold: f64,

    /// RSI overbought threshold
    #[arg(long, default_value = "70")]
    rsi_overbought: f64,

    /// Fraction of cash committed per entry (0.5 = 50%)
    #[arg(long, default_value = "0.5")]
    position_size: f64,

    /// Initial capital
    #[arg(short, long, default_value = "10000")]
    capital: f64,

    /// Commission rate per fill (0.001 = 0.1%)
    #[arg(long, default_value = "0.001")]
    commission: f64,

    /// Slippage rate per fill
    #[arg(long, default_value = "0.001")]
    slippage: f64,

    /// Fast periods to sweep, comma separated; enables sweep mode
    #[arg(long, value_delimiter = ',')]
    sweep_fast: Vec<usize>,

    /// Slow periods to sweep, comma separated
    #[arg(long, value_delimiter = ',')]
    sweep_slow: Vec<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Log filter, overridden by CRYPTO_BACKTEST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (text, json)
    #[arg(long, default_value = "text")]
    log_format: String,
}

#[derive(Serialize)]
struct Report<'a> {
    strategy: &'a str,
    cleaning: &'a CleaningReport,
    result: &'a BacktestResult,
    metrics: &'a PerformanceMetrics,
}

#[derive(Serialize)]
struct SweepReport<'a> {
    cleaning: &'a CleaningReport,
    best_by_sharpe: Option<&'a SweepOutcome>,
    outcomes: &'a [SweepOutcome],
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(&args.log_level, &args.log_format).map_err(anyhow::Error::msg)?;

    let backtest_config = BacktestConfig::default()
        .with_capital(args.capital)
        .with_commission(args.commission)
        .with_slippage(args.slippage);

    // Load or generate data
    let raw = if let Some(path) = &args.data_file {
        info!(path = %path.display(), "loading bars");
        FileBarSource::new(path)
            .fetch_bars()
            .with_context(|| format!("failed to load bars from {}", path.display()))?
    } else {
        info!(
            bars = args.bars,
            seed = args.seed,
            timeframe = %args.timeframe,
            "generating synthetic bars"
        );
        generate_synthetic_bars(
            args.bars,
            args.initial_price,
            args.seed,
            args.timeframe.as_millis(),
        )
    };

    let cleaner = BarCleaner::new(CleanerConfig::for_timeframe(args.timeframe));
    let (bars, cleaning) = cleaner
        .clean_with_report(&raw)
        .context("bar cleaning failed")?;

    if !args.sweep_fast.is_empty() || !args.sweep_slow.is_empty() {
        let fast = if args.sweep_fast.is_empty() {
            vec![args.fast]
        } else {
            args.sweep_fast.clone()
        };
        let slow = if args.sweep_slow.is_empty() {
            vec![args.slow]
        } else {
            args.sweep_slow.clone()
        };
        let grid = ParamGrid::new(fast, slow).with_position_sizes(vec![args.position_size]);
        let outcomes = run_sweep(&bars, &grid, &backtest_config).context("sweep failed")?;
        let report = SweepReport {
            cleaning: &cleaning,
            best_by_sharpe: best_by(&outcomes, |m| m.sharpe_ratio),
            outcomes: &outcomes,
        };
        return match args.output {
            OutputFormat::Json => print_json(&report, args.pretty),
            OutputFormat::Text => {
                print_sweep_report(&report);
                Ok(())
            }
        };
    }

    let mut strategy: Box<dyn SignalSource> = match args.strategy {
        StrategyKind::MaCross => Box::new(MovingAverageCrossStrategy::new(StrategyConfig::new(
            args.fast,
            args.slow,
            args.position_size,
        ))?),
        StrategyKind::RsiReversion => Box::new(RsiReversionStrategy::new(
            RsiConfig::default()
                .with_period(args.rsi_period)
                .with_thresholds(args.rsi_oversold, args.rsi_overbought)
                .with_position_size(args.position_size),
        )?),
    };

    // Run backtest
    let engine = BacktestEngine::new(backtest_config)?;
    let result = engine
        .run(&bars, &mut strategy)
        .context("backtest failed")?;
    let metrics = PerformanceAnalyzer::analyze_result(&result);

    let report = Report {
        strategy: strategy.name(),
        cleaning: &cleaning,
        result: &result,
        metrics: &metrics,
    };
    match args.output {
        OutputFormat::Json => print_json(&report, args.pretty)?,
        OutputFormat::Text => print_text_report(&report),
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn print_text_report(report: &Report) {
    let result = report.result;
    let metrics = report.metrics;

    println!();
    println!("================================================================");
    println!("  BACKTEST REPORT - {}", report.strategy);
    println!("================================================================");
    println!();
    if let (Some(first), Some(last)) = (result.timestamps.first(), result.timestamps.last()) {
        println!("  Period: {} to {}", format_ts(*first), format_ts(*last));
    }
    println!("  Bars: {}", result.bars_processed);
    println!(
        "  Cleaning: {} in, {} dropped, {} gaps, {} suspicious",
        report.cleaning.input_bars,
        report.cleaning.dropped(),
        report.cleaning.gaps,
        report.cleaning.suspicious
    );
    println!();
    println!("----------------------------------------------------------------");
    println!("  CAPITAL");
    println!("----------------------------------------------------------------");
    println!("  Initial Capital:  ${:>12.2}", result.initial_capital);
    println!("  Final Cash:       ${:>12.2}", result.final_capital);
    println!("  Final Equity:     ${:>12.2}", result.final_equity);
    println!("  Total Return:     {:>12.2}%", result.total_return * 100.0);
    println!(
        "  Annualized:       {:>12.2}%",
        metrics.annualized_return * 100.0
    );
    println!();
    println!("----------------------------------------------------------------");
    println!("  RISK METRICS");
    println!("----------------------------------------------------------------");
    println!("  Volatility (Ann): {:>12.2}%", metrics.volatility * 100.0);
    println!("  Sharpe Ratio:     {:>12.3}", metrics.sharpe_ratio);
    println!("  Sortino Ratio:    {:>12.3}", metrics.sortino_ratio);
    println!("  Max Drawdown:     {:>12.2}%", metrics.max_drawdown * 100.0);
    println!("  Calmar Ratio:     {:>12.3}", metrics.calmar_ratio);
    println!();
    println!("----------------------------------------------------------------");
    println!("  TRADE STATISTICS");
    println!("----------------------------------------------------------------");
    println!("  Total Trades:     {:>12}", metrics.total_trades);
    println!("  Winning Trades:   {:>12}", metrics.winning_trades);
    println!("  Losing Trades:    {:>12}", metrics.losing_trades);
    println!("  Win Rate:         {:>12.1}%", metrics.win_rate * 100.0);
    println!("  P/L Ratio:        {:>12.3}", metrics.profit_loss_ratio);
    println!("  Max Win Streak:   {:>12}", metrics.max_consecutive_wins);
    println!("  Max Loss Streak:  {:>12}", metrics.max_consecutive_losses);
    println!(
        "  Avg Holding:      {:>12.2} days",
        metrics.avg_holding_period_days()
    );
    println!(
        "  Trades / Year:    {:>12.1}",
        metrics.trade_frequency_per_year
    );
    println!();
    println!("================================================================");

    // Print recent trades if any
    if !result.trades.is_empty() {
        println!();
        println!("  RECENT TRADES (last 5)");
        println!("----------------------------------------------------------------");
        for trade in result.trades.iter().rev().take(5) {
            let exit = trade
                .exit_timestamp
                .map(format_ts)
                .unwrap_or_else(|| "open".to_string());
            println!(
                "  {} -> {} | {:.6} @ {:.2} | P&L: ${:+.2}",
                format_ts(trade.entry_timestamp),
                exit,
                trade.quantity,
                trade.entry_price,
                trade.realized_pnl
            );
        }
        println!();
    }
}

fn print_sweep_report(report: &SweepReport) {
    println!();
    println!("================================================================");
    println!("  PARAMETER SWEEP - {} combinations", report.outcomes.len());
    println!("================================================================");
    println!("  fast  slow   return%    sharpe    max dd%  trades");
    for outcome in report.outcomes {
        println!(
            "  {:>4}  {:>4}  {:>8.2}  {:>8.3}  {:>9.2}  {:>6}",
            outcome.strategy.fast_period,
            outcome.strategy.slow_period,
            outcome.total_return * 100.0,
            outcome.metrics.sharpe_ratio,
            outcome.metrics.max_drawdown * 100.0,
            outcome.total_trades
        );
    }
    if let Some(best) = report.best_by_sharpe {
        println!();
        println!(
            "  Best by Sharpe: fast={} slow={} ({:.3})",
            best.strategy.fast_period, best.strategy.slow_period, best.metrics.sharpe_ratio
        );
    }
    println!();
}
