use chrono::NaiveDate;
use clap::{ArgAction, Parser, ValueEnum};
use log::{debug, error};
use repayment::error::LoanError;
use repayment::loan::{LoanTerms, Method, Schedule, ScheduleOptions, Settlement};
use repayment::report::{self, DEFAULT_REPORT_INTERVAL};
use simple_logger::SimpleLogger;
use std::process;

/// Monthly repayment schedules for equal-payment and equal-principal loans
#[derive(Parser, Debug)]
#[command(name = "repayment", version)]
struct Cli {
    /// Amount borrowed, in whole currency units
    #[arg(short, long, default_value_t = 50_000_000, allow_negative_numbers = true)]
    principal: i64,

    /// Loan term in years
    #[arg(short = 'y', long, alias = "ny", default_value_t = 35, allow_negative_numbers = true)]
    years: i64,

    /// Annual interest rate in percent
    #[arg(short, long, default_value_t = 0.525, allow_negative_numbers = true)]
    rate: f64,

    /// Print one month out of every N
    #[arg(long, default_value_t = DEFAULT_REPORT_INTERVAL)]
    every: u32,

    /// Date of the first payment; adds due dates to each printed month
    #[arg(long, value_name = "YYYY-MM-DD")]
    first_payment: Option<NaiveDate>,

    /// Let the final month pay off the balance left by truncation
    #[arg(long)]
    settle_remainder: bool,

    #[arg(short, long, value_enum, default_value_t = MethodArg::Both)]
    method: MethodArg,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MethodArg {
    EqualPayment,
    EqualPrincipal,
    Both,
}

impl MethodArg {
    fn methods(self) -> &'static [Method] {
        match self {
            MethodArg::EqualPayment => &[Method::EqualPayment],
            MethodArg::EqualPrincipal => &[Method::EqualPrincipal],
            MethodArg::Both => &[Method::EqualPayment, Method::EqualPrincipal],
        }
    }
}

fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn run(cli: &Cli) -> Result<(), LoanError> {
    let terms = LoanTerms::from_percent(cli.principal, cli.years, cli.rate)?;
    let interval = report::check_interval(cli.every)?;
    let options = ScheduleOptions {
        settlement: if cli.settle_remainder {
            Settlement::FinalPayment
        } else {
            Settlement::Truncate
        },
        first_pmt_date: cli.first_payment,
    };
    debug!("computing schedules with {:?}", options.settlement);

    println!("{}", report::header(&terms));
    for &method in cli.method.methods() {
        let schedule = Schedule::new(method, &terms, &options)?;
        for line in report::render(&schedule, interval) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = SimpleLogger::new()
        .with_level(log_level(cli.verbose))
        .init()
    {
        eprintln!("logger: {}", e);
    }

    if let Err(e) = run(&cli) {
        error!("{}", e);
        process::exit(1);
    }
}

// verifies that types can implement the gated traits below
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<Schedule>();
    is_normal::<LoanError>();
}

#[test]
fn cli_defaults() {
    let cli = Cli::parse_from(["repayment"]);
    assert_eq!(cli.principal, 50_000_000);
    assert_eq!(cli.years, 35);
    assert_eq!(cli.rate, 0.525);
    assert_eq!(cli.every, 60);
    assert!(cli.first_payment.is_none());
    assert!(!cli.settle_remainder);
    assert!(run(&cli).is_ok());
}

#[test]
fn cli_rejects_bad_input() {
    let cli = Cli::parse_from(["repayment", "--ny", "0"]);
    assert_eq!(run(&cli), Err(LoanError::InvalidTerm(0)));

    let cli = Cli::parse_from(["repayment", "-p", "-10"]);
    assert_eq!(run(&cli), Err(LoanError::InvalidPrincipal(-10)));

    let cli = Cli::parse_from(["repayment", "-r", "1e30"]);
    assert!(matches!(run(&cli), Err(LoanError::OutOfRange { .. })));

    let cli = Cli::parse_from(["repayment", "--every", "0"]);
    assert_eq!(run(&cli), Err(LoanError::InvalidReportInterval(0)));
}

#[test]
fn cli_options() {
    let cli = Cli::parse_from([
        "repayment",
        "-y",
        "1",
        "-r",
        "12",
        "--first-payment",
        "2024-04-01",
        "--settle-remainder",
        "-m",
        "equal-principal",
        "-vv",
    ]);
    assert_eq!(cli.first_payment, NaiveDate::from_ymd_opt(2024, 4, 1));
    assert!(cli.settle_remainder);
    assert_eq!(cli.method.methods(), &[Method::EqualPrincipal]);
    assert_eq!(log_level(cli.verbose), log::LevelFilter::Trace);
    assert!(run(&cli).is_ok());
}
