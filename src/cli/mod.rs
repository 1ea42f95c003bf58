pub mod notes;
pub mod output;
pub mod project;
pub mod report;
pub mod timer;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    storage::{
        note_store::NoteStore, project_store::ProjectStore, record_store::FsRecordStore,
        timer_store::TimerStore,
    },
    utils::{
        clock::{Clock, SystemClock},
        dir::{create_application_default_path, AppPaths},
        logging::enable_logging,
    },
};

use notes::NoteCommand;
use project::ProjectCommand;
use report::ReportCommand;

#[derive(Parser, Debug)]
#[command(name = "Punchcard", version, long_about = None)]
#[command(about = "Task timer, project tracker and notes for the terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries $PUNCHCARD_DIR, then $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start a timer, optionally namespaced as category:task")]
    Start { task_spec: String },
    #[command(about = "Stop the running timer and record it")]
    Stop {},
    #[command(about = "Show the running timer")]
    Status {},
    #[command(about = "Show the most recent records")]
    History {
        #[arg(
            short = 'n',
            long,
            default_value_t = 10,
            help = "How many records to show"
        )]
        count: usize,
    },
    #[command(about = "Show today's records")]
    List {},
    #[command(about = "Show known categories with their recorded time")]
    Categories {},
    #[command(about = "Summarize recorded time over a trailing window")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "Prune old records, keeping a backup copy")]
    Clean {
        #[arg(
            long,
            default_value_t = 30,
            help = "Keep records started within this many days"
        )]
        days: u32,
    },
    #[command(subcommand, about = "Track projects with ordered task lists")]
    Project(ProjectCommand),
    #[command(subcommand, about = "Keep plain-text notes")]
    Note(NoteCommand),
}

/// Every store, opened against one application directory. Commands receive
/// this instead of constructing storage themselves.
pub struct Stores {
    pub records: FsRecordStore,
    pub timers: TimerStore,
    pub projects: ProjectStore,
    pub notes: NoteStore,
    pub clock: Arc<dyn Clock>,
}

impl Stores {
    pub fn open(paths: &AppPaths, clock: Arc<dyn Clock>) -> Result<Stores> {
        Ok(Stores {
            records: FsRecordStore::new(
                paths.records_file.clone(),
                paths.backups_dir.clone(),
                clock.clone(),
            )?,
            timers: TimerStore::new(paths.timer_file.clone(), clock.clone()),
            projects: ProjectStore::new(
                paths.projects_dir.clone(),
                paths.backups_dir.clone(),
                clock.clone(),
            )?,
            notes: NoteStore::new(
                paths.notes_dir.clone(),
                paths.backups_dir.clone(),
                clock.clone(),
            )?,
            clock,
        })
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };

    let root = match &args.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => create_application_default_path()?,
    };
    enable_logging(&root, logging_level, args.log)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let stores = Stores::open(&AppPaths::new(&root), clock)?;

    match args.commands {
        Commands::Start { task_spec } => timer::process_start(&stores, &task_spec).await,
        Commands::Stop {} => timer::process_stop(&stores).await,
        Commands::Status {} => timer::process_status(&stores).await,
        Commands::History { count } => timer::process_history(&stores, count).await,
        Commands::List {} => timer::process_list(&stores).await,
        Commands::Categories {} => timer::process_categories(&stores).await,
        Commands::Report { command } => report::process_report_command(&stores, command).await,
        Commands::Clean { days } => timer::process_clean(&stores, days).await,
        Commands::Project(command) => project::process_project_command(&stores, command).await,
        Commands::Note(command) => notes::process_note_command(&stores, command).await,
    }
}

/// Asks a yes/no question on the controlling terminal. Anything but an
/// explicit yes declines.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;

    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
}
