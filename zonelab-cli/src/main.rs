//! ZoneLab CLI — zone analysis, structure and screening commands.
//!
//! Commands:
//! - `analyze`: best fresh order block, aging, latest FVG and confluence at one bar
//! - `zones`: every order block and FVG up to one bar, with freshness
//! - `structure`: swings, breaks of structure and trend bias
//! - `screen`: rank a set of symbols by forecast EMA cross
//! - `config`: print the default config or validate a config file
//!
//! Results go to stdout; logs go to stderr (`RUST_LOG` overrides the level).

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use zonelab_core::domain::{Bos, Swing, SwingKind};
use zonelab_core::screener::ScreenerRow;
use zonelab_runner::{
    analyze_symbol, generate_synthetic, load_csv, load_dir, rows_to_csv, rows_to_json,
    structure_report, to_json, write_output, zone_history, AnalysisReport, BarSelector, Screener,
    SymbolSeries, ZoneHistory, ZonelabConfig,
};

#[derive(Parser)]
#[command(
    name = "zonelab",
    about = "ZoneLab CLI — order blocks, fair value gaps and market structure"
)]
struct Cli {
    /// Debug-level logging.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where a single series comes from.
#[derive(Args)]
struct InputArgs {
    /// CSV file with header date,open,high,low,close[,volume].
    #[arg(long, conflicts_with = "synthetic")]
    csv: Option<PathBuf>,

    /// Generate a deterministic synthetic series for this symbol (development only).
    #[arg(long)]
    synthetic: Option<String>,

    /// Number of bars to generate with --synthetic.
    #[arg(long, default_value_t = 500)]
    bars: usize,

    /// First date of the synthetic series (YYYY-MM-DD).
    #[arg(long, default_value = "2020-01-01")]
    start: String,
}

/// Which bar to evaluate at. Defaults to the last bar.
#[derive(Args)]
struct BarArgs {
    /// Bar index (0-based).
    #[arg(long, conflicts_with = "date")]
    at: Option<usize>,

    /// Last bar on or before this date (YYYY-MM-DD).
    #[arg(long)]
    date: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one symbol at one bar.
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        bar: BarArgs,

        /// Path to a TOML config file. Defaults are used otherwise.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write the JSON report to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List order blocks and fair value gaps up to one bar.
    Zones {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        bar: BarArgs,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Include zones that price has already revisited.
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Print JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show swings, breaks of structure and the current bias.
    Structure {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        bar: BarArgs,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Rank symbols by forecast EMA cross.
    Screen {
        /// Directory of <SYMBOL>.csv files.
        #[arg(long, conflicts_with = "synthetic")]
        dir: Option<PathBuf>,

        /// Synthetic symbols to screen (development only).
        #[arg(long, num_args = 1..)]
        synthetic: Vec<String>,

        /// Number of bars per synthetic symbol.
        #[arg(long, default_value_t = 500)]
        bars: usize,

        /// First date of the synthetic series (YYYY-MM-DD).
        #[arg(long, default_value = "2020-01-01")]
        start: String,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rows to keep. Overrides screener.top from the config.
        #[arg(long)]
        top: Option<usize>,

        /// Output format.
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Write the output to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Screen symbols one at a time instead of in parallel.
        #[arg(long, default_value_t = false)]
        serial: bool,
    },
    /// Print the default config or validate a config file.
    Config {
        /// Print the default config as TOML.
        #[arg(long, conflicts_with = "check", default_value_t = false)]
        print_default: bool,

        /// Validate this config file.
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Analyze {
            input,
            bar,
            config,
            json,
            output,
        } => run_analyze(&input, &bar, config.as_deref(), json, output.as_deref()),
        Commands::Zones {
            input,
            bar,
            config,
            all,
            json,
        } => run_zones(&input, &bar, config.as_deref(), all, json),
        Commands::Structure {
            input,
            bar,
            config,
            json,
        } => run_structure(&input, &bar, config.as_deref(), json),
        Commands::Screen {
            dir,
            synthetic,
            bars,
            start,
            config,
            top,
            format,
            output,
            serial,
        } => run_screen(ScreenArgs {
            dir,
            synthetic,
            bars,
            start,
            config,
            top,
            format,
            output,
            serial,
        }),
        Commands::Config {
            print_default,
            check,
        } => run_config(print_default, check.as_deref()),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ─── Shared argument handling ───────────────────────────────────────

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

fn load_config(path: Option<&Path>) -> Result<ZonelabConfig> {
    match path {
        Some(path) => Ok(ZonelabConfig::from_file(path)?),
        None => Ok(ZonelabConfig::default()),
    }
}

fn load_input(input: &InputArgs) -> Result<SymbolSeries> {
    match (&input.csv, &input.synthetic) {
        (Some(path), None) => Ok(load_csv(path)?),
        (None, Some(symbol)) => {
            if input.bars == 0 {
                bail!("--bars must be at least 1");
            }
            Ok(generate_synthetic(symbol, parse_date(&input.start)?, input.bars))
        }
        (Some(_), Some(_)) => bail!("--csv and --synthetic are mutually exclusive"),
        (None, None) => bail!("one of --csv or --synthetic is required"),
    }
}

fn bar_selector(bar: &BarArgs) -> Result<BarSelector> {
    match (bar.at, &bar.date) {
        (Some(_), Some(_)) => bail!("--at and --date are mutually exclusive"),
        (Some(i), None) => Ok(BarSelector::Index(i)),
        (None, Some(d)) => Ok(BarSelector::Date(parse_date(d)?)),
        (None, None) => Ok(BarSelector::Last),
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.precision$}"),
        _ => "-".into(),
    }
}

// ─── analyze ────────────────────────────────────────────────────────

fn run_analyze(
    input: &InputArgs,
    bar: &BarArgs,
    config_path: Option<&Path>,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let series = load_input(input)?;
    let report = analyze_symbol(&series, &config, bar_selector(bar)?)?;

    let report_json = to_json(&report)?;
    if json {
        println!("{report_json}");
    } else {
        print_report(&report);
    }
    if let Some(path) = output {
        write_output(path, &report_json)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let a = &report.analysis;
    let tag = if report.is_synthetic() { " (SYNTHETIC)" } else { "" };

    println!("Symbol:       {}{tag}", report.symbol);
    println!(
        "Bar:          {} (#{} of {})",
        report.bar_date, a.bar_index, report.bar_count
    );
    println!("Last close:   {:.4}", a.last_close);
    println!(
        "Bias:         {}",
        a.bias.map(|b| b.to_string()).unwrap_or_else(|| "none".into())
    );
    println!(
        "Structure:    {} swings, {} breaks",
        a.swings.len(),
        a.bos.len()
    );

    match (&a.orderblock, &a.aging) {
        (Some(ob), Some(aging)) => {
            println!(
                "Order block:  {} [{:.4}, {:.4}] at #{} (displacement #{}){}",
                ob.direction,
                ob.zone_bottom,
                ob.zone_top,
                ob.index,
                ob.displacement_index,
                if ob.has_fvg { " + FVG" } else { "" }
            );
            println!(
                "Aging:        {} (age {}), volume ratio {:.2}, score {}",
                aging.age_status, aging.age_candles, aging.volume_ratio, aging.volumatic_score
            );
        }
        _ => println!("Order block:  no valid zone"),
    }

    match &a.latest_fvg {
        Some(g) => println!(
            "Latest FVG:   {} [{:.4}, {:.4}] at #{} ({})",
            g.direction,
            g.gap_low,
            g.gap_high,
            g.index,
            if a.fvg_fresh { "fresh" } else { "mitigated" }
        ),
        None => println!("Latest FVG:   none"),
    }

    println!("ATR:          {}", fmt_opt(a.atr, 4));
    println!(
        "Confluence:   {}/100{} ({})",
        a.confluence.score,
        if a.confluence.has_confluence { " CONFLUENT" } else { "" },
        a.confluence.reason
    );

    let s = &report.screener;
    println!(
        "EMA cross:    {} days={} score={:.2}",
        s.reason,
        s.days_to_cross
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into()),
        s.score
    );
    println!("Dataset:      {}", report.dataset_hash);
}

// ─── zones ──────────────────────────────────────────────────────────

fn run_zones(
    input: &InputArgs,
    bar: &BarArgs,
    config_path: Option<&Path>,
    all: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let series = load_input(input)?;
    let mut history = zone_history(&series, &config, bar_selector(bar)?)?;
    if !all {
        history.orderblocks.retain(|e| e.fresh);
        history.fvgs.retain(|e| e.fresh);
    }

    if json {
        println!("{}", to_json(&history)?);
    } else {
        print_zones(&history);
    }
    Ok(())
}

fn print_zones(history: &ZoneHistory) {
    println!(
        "{} as of {} (#{})",
        history.symbol, history.bar_date, history.bar_index
    );
    println!();

    println!("Order blocks: {}", history.orderblocks.len());
    if !history.orderblocks.is_empty() {
        println!(
            "{:<6} {:<5} {:<11} {:>10} {:>10} {:<4} {:<6} {:<7} {:>5}",
            "Index", "Side", "Formed", "Bottom", "Top", "FVG", "Fresh", "Age", "Score"
        );
        println!("{}", "-".repeat(72));
        for e in &history.orderblocks {
            let ob = &e.orderblock;
            println!(
                "{:<6} {:<5} {:<11} {:>10.4} {:>10.4} {:<4} {:<6} {:<7} {:>5}",
                ob.index,
                ob.direction.to_string(),
                e.formed.to_string(),
                ob.zone_bottom,
                ob.zone_top,
                if ob.has_fvg { "yes" } else { "no" },
                if e.fresh { "yes" } else { "no" },
                e.aging.age_status.to_string(),
                e.aging.volumatic_score
            );
        }
    }
    println!();

    println!("Fair value gaps: {}", history.fvgs.len());
    if !history.fvgs.is_empty() {
        println!(
            "{:<6} {:<5} {:<11} {:>10} {:>10} {:<6}",
            "Index", "Side", "Formed", "Low", "High", "Fresh"
        );
        println!("{}", "-".repeat(52));
        for e in &history.fvgs {
            println!(
                "{:<6} {:<5} {:<11} {:>10.4} {:>10.4} {:<6}",
                e.fvg.index,
                e.fvg.direction.to_string(),
                e.formed.to_string(),
                e.fvg.gap_low,
                e.fvg.gap_high,
                if e.fresh { "yes" } else { "no" }
            );
        }
    }
}

// ─── structure ──────────────────────────────────────────────────────

fn run_structure(
    input: &InputArgs,
    bar: &BarArgs,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let series = load_input(input)?;
    let report = structure_report(&series, &config, bar_selector(bar)?)?;

    if json {
        println!("{}", to_json(&report)?);
        return Ok(());
    }

    println!(
        "{} as of {} (#{}), bias: {}",
        report.symbol,
        report.bar_date,
        report.bar_index,
        report
            .bias
            .map(|b| b.to_string())
            .unwrap_or_else(|| "none".into())
    );
    println!();
    print_swings(&report.swings, &series);
    println!();
    print_bos(&report.bos, &series);
    Ok(())
}

fn print_swings(swings: &[Swing], series: &SymbolSeries) {
    println!("Swings: {}", swings.len());
    if swings.is_empty() {
        return;
    }
    println!("{:<6} {:<11} {:<5} {:>10}", "Index", "Date", "Kind", "Price");
    println!("{}", "-".repeat(35));
    for s in swings {
        let kind = match s.kind {
            SwingKind::High => "High",
            SwingKind::Low => "Low",
        };
        println!(
            "{:<6} {:<11} {:<5} {:>10.4}",
            s.index,
            series.dates[s.index].to_string(),
            kind,
            s.price
        );
    }
}

fn print_bos(events: &[Bos], series: &SymbolSeries) {
    println!("Breaks of structure: {}", events.len());
    if events.is_empty() {
        return;
    }
    println!(
        "{:<6} {:<11} {:<8} {:>10} {:>12}",
        "Index", "Date", "Dir", "Close", "Broken at"
    );
    println!("{}", "-".repeat(51));
    for b in events {
        println!(
            "{:<6} {:<11} {:<8} {:>10.4} {:>12.4}",
            b.index,
            series.dates[b.index].to_string(),
            b.direction.to_string(),
            b.close_price,
            b.broken_swing.price
        );
    }
}

// ─── screen ─────────────────────────────────────────────────────────

struct ScreenArgs {
    dir: Option<PathBuf>,
    synthetic: Vec<String>,
    bars: usize,
    start: String,
    config: Option<PathBuf>,
    top: Option<usize>,
    format: OutputFormat,
    output: Option<PathBuf>,
    serial: bool,
}

fn run_screen(args: ScreenArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let universe: Vec<SymbolSeries> = match (&args.dir, args.synthetic.is_empty()) {
        (Some(dir), true) => load_dir(dir)?,
        (None, false) => {
            if args.bars == 0 {
                bail!("--bars must be at least 1");
            }
            let start = parse_date(&args.start)?;
            args.synthetic
                .iter()
                .map(|s| generate_synthetic(s, start, args.bars))
                .collect()
        }
        (Some(_), false) => bail!("--dir and --synthetic are mutually exclusive"),
        (None, true) => bail!("one of --dir or --synthetic is required"),
    };
    if universe.is_empty() {
        bail!("no symbols to screen");
    }

    let mut screener = Screener::new(config.screener).with_parallelism(!args.serial);
    if let Some(top) = args.top {
        if top == 0 {
            bail!("--top must be at least 1");
        }
        screener = screener.with_top(top);
    }
    let results = screener.run(&universe);

    let content = match args.format {
        OutputFormat::Table => format_rows_table(&results.rows, results.screened),
        OutputFormat::Json => rows_to_json(&results.rows)?,
        OutputFormat::Csv => rows_to_csv(&results.rows)?,
    };

    match &args.output {
        Some(path) => {
            write_output(path, &content)?;
            info!(path = %path.display(), rows = results.rows.len(), "screen written");
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn format_rows_table(rows: &[ScreenerRow], screened: usize) -> String {
    let mut out = format!("Screened {screened} symbols, showing {}\n\n", rows.len());
    out.push_str(&format!(
        "{:<4} {:<8} {:>10} {:>10} {:>10} {:>5} {:>7} {:<18}\n",
        "#", "Symbol", "Close", "EMA fast", "EMA slow", "Days", "Score", "Reason"
    ));
    out.push_str(&"-".repeat(78));
    out.push('\n');
    for (i, r) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{:<4} {:<8} {:>10} {:>10} {:>10} {:>5} {:>7.2} {:<18}\n",
            i + 1,
            r.symbol,
            fmt_opt(Some(r.last_close), 2),
            fmt_opt(Some(r.ema_fast), 2),
            fmt_opt(Some(r.ema_slow), 2),
            r.days_to_cross
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into()),
            r.score,
            r.reason.as_str()
        ));
    }
    out
}

// ─── config ─────────────────────────────────────────────────────────

fn run_config(print_default: bool, check: Option<&Path>) -> Result<()> {
    match (print_default, check) {
        (true, None) => {
            print!("{}", ZonelabConfig::default().to_toml()?);
            Ok(())
        }
        (false, Some(path)) => {
            let config = ZonelabConfig::from_file(path)?;
            println!("{}: OK", path.display());
            println!(
                "  swing {}/{}, displacement x{}, screener EMA {}/{}",
                config.swing.left_bars,
                config.swing.right_bars,
                config.orderblock.displacement_threshold,
                config.screener.fast_period,
                config.screener.slow_period
            );
            Ok(())
        }
        (true, Some(_)) => bail!("--print-default and --check are mutually exclusive"),
        (false, None) => bail!("one of --print-default or --check is required"),
    }
}
