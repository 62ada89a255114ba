use clap::Parser;
use finny::args::{Args, Command, GoalCommand};
use finny::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().finny_home().path();

    // When FINNY_IN_TEST_MODE is set and non-empty the statistics commands read seeded in-memory
    // expenses instead of the database.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Add(add_args) => commands::add_expense(Config::load(home).await?, add_args)
            .await?
            .print(),

        Command::Import(import_args) => {
            commands::import_expenses(Config::load(home).await?, import_args.file())
                .await?
                .print()
        }

        Command::List => commands::list_expenses(Config::load(home).await?)
            .await?
            .print_stdout(),

        Command::Delete(delete_args) => {
            commands::delete_expense(Config::load(home).await?, delete_args)
                .await?
                .print()
        }

        Command::Stats(stats_args) => {
            commands::stats(Config::load(home).await?, mode, stats_args)
                .await?
                .print_stdout()
        }

        Command::Watch(watch_args) => {
            commands::watch(Config::load(home).await?, mode, watch_args)
                .await?
                .print()
        }

        Command::Goal(goal_args) => {
            let config = Config::load(home).await?;
            match goal_args.action() {
                GoalCommand::Add(args) => commands::goal_add(config, args).await?.print(),
                GoalCommand::List => commands::goal_list(config).await?.print_stdout(),
                GoalCommand::Contribute(args) => {
                    commands::goal_contribute(config, args).await?.print()
                }
            }
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        // RUST_LOG wins when it is set.
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!(
            "{}={},{}={}",
            env!("CARGO_CRATE_NAME"),
            level,
            env!("CARGO_BIN_NAME"),
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
