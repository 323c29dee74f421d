pub mod output;
pub mod report;

use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use output::Output;
use report::{process_report_command, ReportCommand};
use tracing::info;

use crate::{
    storage::{sqlite::SqliteStore, store::Store},
    tracker::{error::TrackerError, session::SessionController},
    utils::{
        clock::{Clock, DefaultClock},
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

const DATABASE_FILE: &str = "timedb.sqlite3";

#[derive(Parser, Debug)]
#[command(name = "tt", version, long_about = None)]
#[command(about = "Track the time you spend working on projects", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(
        short,
        long,
        global = true,
        env = "TIMETRACKER_DB",
        help = "Database file. By default stored in $XDG_STATE_HOME or $HOME/.local/state"
    )]
    db: Option<PathBuf>,
    #[arg(long, global = true, help = "Show debug logs on stderr")]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Start working on a project. Continues the last project when left out")]
    Start {
        project: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        comment: Vec<String>,
    },
    #[command(about = "Stop the current work")]
    Stop,
    #[command(about = "Discard the current work")]
    Cancel,
    #[command(about = "Record finished work between two times of today, given as HH:MM")]
    Log {
        project: Option<String>,
        start: Option<String>,
        stop: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        comment: Vec<String>,
    },
    #[command(about = "List all projects")]
    List,
    #[command(about = "Remove a project together with its work")]
    Drop { project: Option<String> },
    #[command(about = "Show the current and the last work")]
    Status,
    #[command(about = "Sum up the time worked per project")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
}

/// Inserts `start` in front of the first positional argument when it isn't a command name, so
/// `tt alpha review` means `tt start alpha review`.
pub fn normalize_args(mut args: Vec<String>) -> Vec<String> {
    let command = Args::command();
    let mut names = vec!["help".to_string()];
    for subcommand in command.get_subcommands() {
        names.push(subcommand.get_name().to_string());
        names.extend(subcommand.get_all_aliases().map(String::from));
    }
    let with_value = command
        .get_arguments()
        .filter(|arg| !arg.is_positional() && arg.get_action().takes_values())
        .flat_map(|arg| {
            let long = arg.get_long().map(|v| format!("--{v}"));
            let short = arg.get_short().map(|v| format!("-{v}"));
            long.into_iter().chain(short)
        })
        .collect::<Vec<_>>();

    let mut index = 1;
    while index < args.len() {
        let arg = &args[index];
        if arg == "--" {
            break;
        }
        if arg.starts_with('-') && arg.len() > 1 {
            if with_value.contains(arg) {
                index += 1;
            }
            index += 1;
            continue;
        }
        if !names.contains(arg) {
            args.insert(index, "start".to_string());
        }
        break;
    }
    args
}

fn comment(words: Vec<String>) -> String {
    words.join(" ")
}

/// Parses the command line. Usage errors are returned so they end the process like any other
/// failure, only help and version output exit right away.
fn parse_args(raw: Vec<String>) -> Result<Args> {
    match Args::try_parse_from(normalize_args(raw)) {
        Ok(args) => Ok(args),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => Err(e.into()),
    }
}

pub fn run_cli() -> Result<()> {
    let args = parse_args(env::args().collect())?;

    let app_dir = create_application_default_path()?;
    enable_logging(CLI_PREFIX, &app_dir.join("logs"), args.debug)?;

    let db = args.db.unwrap_or_else(|| app_dir.join(DATABASE_FILE));
    let mut store = SqliteStore::open(&db)?;
    let clock = DefaultClock::new();
    let output = Output::new(clock.offset());

    execute(
        args.commands.unwrap_or(Commands::Status),
        &mut store,
        &clock,
        &output,
    )
}

fn execute(
    command: Commands,
    store: &mut impl Store,
    clock: &dyn Clock,
    output: &Output,
) -> Result<()> {
    let print = |lines: Vec<String>| lines.iter().for_each(|line| println!("{line}"));

    match command {
        Commands::Start { project, comment: words } => {
            let started = SessionController::new(store, clock)
                .start(project.as_deref(), &comment(words))?;
            info!(
                "Started work {} on {}",
                started.started.id, started.started.project.name
            );
            print(output.started(&started));
        }
        Commands::Stop => {
            let work = SessionController::new(store, clock).stop()?;
            info!("Stopped work {} on {}", work.id, work.project.name);
            println!("{}", output.stopped(&work));
        }
        Commands::Cancel => {
            let work = SessionController::new(store, clock).cancel()?;
            info!("Canceled work {} on {}", work.id, work.project.name);
            println!("{}", output.canceled(&work));
        }
        Commands::Log {
            project,
            start,
            stop,
            comment: words,
        } => {
            let (Some(project), Some(start), Some(stop)) = (project, start, stop) else {
                return Err(TrackerError::invalid_log(
                    "Expected a project, a start time and a stop time.",
                )
                .into());
            };
            let logged =
                SessionController::new(store, clock).log(&project, &start, &stop, &comment(words))?;
            info!("Logged work {} on {}", logged.work.id, logged.work.project.name);
            print(output.logged(&logged));
        }
        Commands::List => {
            let projects = SessionController::new(store, clock).projects()?;
            print(output.projects(&projects));
        }
        Commands::Drop { project } => {
            let project = project.ok_or(TrackerError::MissingProjectName)?;
            let dropped = SessionController::new(store, clock).drop_project(&project)?;
            info!(
                "Dropped project {} with {} work entries",
                dropped.project.name, dropped.removed_work
            );
            println!("{}", output.dropped(&dropped));
        }
        Commands::Status => {
            let session = SessionController::new(store, clock);
            let current = session.current()?;
            let last = session.last_closed()?;
            print(output.status(current.as_ref(), last.as_ref(), clock.time()));
        }
        Commands::Report { command } => {
            process_report_command(command, &*store, clock, output)?;
        }
    }
    Ok(())
}
