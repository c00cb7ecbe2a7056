//! CLI definition and dispatch.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_data::CsvMarketData;
use crate::adapters::file_config::FileConfigAdapter;
use crate::adapters::paper_broker::PaperBroker;
use crate::adapters::stderr_log::StderrLog;
use crate::domain::error::HeattraderError;
use crate::domain::params::SessionParams;
use crate::domain::session::Session;
use crate::ports::broker::BrokerPort;
use crate::ports::log::LogPort;

#[derive(Parser, Debug)]
#[command(name = "heattrader", about = "Sector-heat driven trading decision engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a session over CSV market data
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding the CSV bar and metadata files
        #[arg(short, long)]
        data: PathBuf,
        /// First session date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Number of daily ticks to run
        #[arg(long, default_value_t = 1)]
        ticks: u32,
        /// Starting paper cash
        #[arg(long, default_value_t = 1_000_000.0)]
        cash: f64,
        /// Seed for the randomized holding window
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            data,
            start,
            ticks,
            cash,
            seed,
        } => run_session(&config, &data, &start, ticks, cash, seed),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data } => run_list_symbols(&data),
    }
}

fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = HeattraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_session(
    config_path: &PathBuf,
    data_path: &PathBuf,
    start: &str,
    ticks: u32,
    cash: f64,
    seed: Option<u64>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let params = match SessionParams::from_config(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let start_date = match NaiveDate::parse_from_str(start, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            eprintln!("error: invalid start date (expected YYYY-MM-DD)");
            return ExitCode::from(2);
        }
    };

    let market = match CsvMarketData::open(data_path.clone()) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let broker = PaperBroker::new(cash);
    let log = StderrLog;
    let mut session = Session::new(params, seed);

    let mut date = start_date;
    for _ in 0..ticks {
        // weekends carry no bars; skip to the next weekday
        while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Duration::days(1);
        }
        if let Some(now) = date.and_hms_opt(15, 0, 0) {
            market.set_now(now);
        }
        broker.set_today(date);
        session.run_tick(&market, &broker, date, &log);
        date += Duration::days(1);
    }

    let held = match broker.holdings() {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    log.log(&format!(
        "session done: {} fills, cash {:.2}, {} open positions",
        broker.fill_count(),
        broker.cash(),
        held.len()
    ));
    for (code, qty) in held {
        log.log(&format!("  holding {} x{}", code, qty));
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match SessionParams::from_config(&adapter) {
        Ok(params) => {
            println!(
                "config OK: {} sectors, portfolio size {}, benchmark {}",
                params.sectors.len(),
                params.portfolio_size,
                params.benchmark
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_list_symbols(data_path: &PathBuf) -> ExitCode {
    let market = match CsvMarketData::open(data_path.clone()) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    match market.list_symbols() {
        Ok(symbols) => {
            for code in symbols {
                println!("{}", code);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
