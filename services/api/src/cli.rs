use crate::infra::{build_service, parse_basis, parse_date};
use crate::report::{render_benchmarks, render_metrics, render_ranking, render_rating};
use crate::server;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use fleet_score::config::AppConfig;
use fleet_score::error::AppError;
use fleet_score::scoring::{MonetaryBasis, OperativeIdentity};
use fleet_score::telemetry::{self, LogSink};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fleet-score",
    about = "Score, rate and rank field operatives from record exports",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run a single scoring computation and print the result
    Score {
        #[command(subcommand)]
        command: ScoreCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ScoreCommand {
    /// Five sub-scores and the composite performance score
    Metrics(OperativeArgs),
    /// Weighted rating, stars and label
    Rating(OperativeArgs),
    /// Fleet ranking table, optionally highlighting one operative
    Ranking(RankingArgs),
    /// Unit economics against qualifying peers
    Benchmarks(BenchmarkArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

/// Record sources; each flag overrides its environment variable.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct DataArgs {
    /// JSON snapshot of every record collection
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
    /// CSV export of executions to merge into the snapshot
    #[arg(long)]
    pub(crate) executions_csv: Option<PathBuf>,
    /// JSON scoring policy override
    #[arg(long)]
    pub(crate) policy: Option<PathBuf>,
}

impl DataArgs {
    pub(crate) fn apply(self, config: &mut AppConfig) {
        if let Some(path) = self.snapshot {
            config.data.snapshot_path = Some(path);
        }
        if let Some(path) = self.executions_csv {
            config.data.executions_csv = Some(path);
        }
        if let Some(path) = self.policy {
            config.data.policy_path = Some(path);
        }
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Evaluation date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
    /// Print JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct OperativeArgs {
    /// Operative id in the record store
    #[arg(long)]
    id: String,
    /// Operative name as it appears on execution records
    #[arg(long)]
    name: String,
    /// Operative phone, used to find checklists and documents
    #[arg(long)]
    phone: String,
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct RankingArgs {
    /// Operative to highlight in the table
    #[arg(long)]
    name: Option<String>,
    /// Monetary column to rank on (operative-cost or sale-price)
    #[arg(long, value_parser = parse_basis, default_value = "operative-cost")]
    basis: MonetaryBasis,
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct BenchmarkArgs {
    /// Operative name to place within the pool
    #[arg(long)]
    name: String,
    #[command(flatten)]
    data: DataArgs,
    #[command(flatten)]
    output: OutputArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score { command } => run_score(command).await,
    }
}

impl ScoreCommand {
    fn data(&self) -> &DataArgs {
        match self {
            ScoreCommand::Metrics(args) | ScoreCommand::Rating(args) => &args.data,
            ScoreCommand::Ranking(args) => &args.data,
            ScoreCommand::Benchmarks(args) => &args.data,
        }
    }
}

fn emit<T: Serialize>(
    value: &T,
    json: bool,
    text: impl FnOnce(&T) -> String,
) -> Result<(), AppError> {
    if json {
        let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        print!("{}", text(value));
    }
    Ok(())
}

async fn run_score(command: ScoreCommand) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    command.data().clone().apply(&mut config);

    telemetry::init(&config.telemetry, LogSink::Stderr)?;
    let service = build_service(&config.data)?;
    let today = || Utc::now().date_naive();

    match command {
        ScoreCommand::Metrics(args) => {
            let identity = OperativeIdentity::new(args.id, args.name, args.phone);
            let as_of = args.output.as_of.unwrap_or_else(today);
            let snapshot = service.performance_metrics(&identity, as_of).await?;
            emit(&snapshot, args.output.json, render_metrics)
        }
        ScoreCommand::Rating(args) => {
            let identity = OperativeIdentity::new(args.id, args.name, args.phone);
            let as_of = args.output.as_of.unwrap_or_else(today);
            let snapshot = service.operative_rating(&identity, as_of).await?;
            emit(&snapshot, args.output.json, render_rating)
        }
        ScoreCommand::Ranking(args) => {
            let as_of = args.output.as_of.unwrap_or_else(today);
            let ranking = service.fleet_ranking_table(args.basis, as_of).await?;
            let lookup = args.name.as_deref().map(|name| ranking.lookup(name));
            if args.output.json {
                match lookup {
                    Some(lookup) => emit(&lookup, true, |_| String::new()),
                    None => emit(&ranking, true, |_| String::new()),
                }
            } else {
                print!("{}", render_ranking(&ranking, lookup.as_ref()));
                Ok(())
            }
        }
        ScoreCommand::Benchmarks(args) => {
            let as_of = args.output.as_of.unwrap_or_else(today);
            let snapshot = service.pool_benchmarks(&args.name, as_of).await?;
            emit(&snapshot, args.output.json, render_benchmarks)
        }
    }
}
