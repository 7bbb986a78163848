#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use cmd::Globals;
use lanes_core::ErrorCode;
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "lanes: a kanban board with ordered columns and task relations",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project id or name (defaults to board.default_project, or the only project).
    #[arg(long, global = true)]
    project: Option<String>,

    /// Board database path (overrides LANES_DB and the config file).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for --format json.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create the board database and a first project",
        after_help = "EXAMPLES:\n    # Default project with Todo / In Progress / Done\n    lanes init\n\n    # Named project without columns\n    lanes init --name work --empty"
    )]
    Init(cmd::init::InitArgs),

    #[command(next_help_heading = "Setup", about = "Manage projects")]
    Project {
        #[command(subcommand)]
        command: cmd::project::ProjectCommand,
    },

    #[command(
        next_help_heading = "Setup",
        about = "Manage columns and their roles",
        after_help = "EXAMPLES:\n    # Add a review column before Done\n    lanes column add Review --after \"In Progress\"\n\n    # Make Review the in-progress column\n    lanes column role in_progress Review"
    )]
    Column {
        #[command(subcommand)]
        command: cmd::column::ColumnCommand,
    },

    #[command(
        next_help_heading = "Tasks",
        about = "Create a task",
        after_help = "EXAMPLES:\n    # Create in the ready column\n    lanes create \"Fix login timeout\"\n\n    # Create a subtask that waits on #4\n    lanes create \"Write tests\" --parent 2 --blocked-by 4"
    )]
    Create(cmd::create::CreateArgs),

    #[command(next_help_heading = "Tasks", about = "List tasks in board order")]
    List(cmd::list::ListArgs),

    #[command(next_help_heading = "Tasks", about = "Show one task in full")]
    Show(cmd::show::ShowArgs),

    #[command(next_help_heading = "Tasks", about = "Edit a task's fields")]
    Update(cmd::update::UpdateArgs),

    #[command(next_help_heading = "Tasks", about = "Delete a task")]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Board",
        about = "Move a task to another column",
        after_help = "EXAMPLES:\n    # By name\n    lanes move 3 --to done\n\n    # Along the chain\n    lanes move 3 --next\n\n    # To the column holding a role\n    lanes move 3 --start"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(next_help_heading = "Board", about = "Swap a task with the one above it")]
    Up(cmd::move_cmd::SwapArgs),

    #[command(next_help_heading = "Board", about = "Swap a task with the one below it")]
    Down(cmd::move_cmd::SwapArgs),

    #[command(
        next_help_heading = "Relations",
        about = "Relate two tasks",
        after_help = "EXAMPLES:\n    # 5 waits on 2\n    lanes link 5 2 --kind blocking\n\n    # 1 is the parent of 5\n    lanes link 1 5 --kind parent"
    )]
    Link(cmd::link::LinkArgs),

    #[command(next_help_heading = "Relations", about = "Remove a relation")]
    Unlink(cmd::link::UnlinkArgs),

    #[command(next_help_heading = "Relations", about = "Unblocked tasks in the ready column")]
    Ready,

    #[command(next_help_heading = "Relations", about = "Tasks waiting on other tasks")]
    Blocked,

    #[command(next_help_heading = "Metadata", about = "Manage task labels")]
    Label {
        #[command(subcommand)]
        command: cmd::label::LabelCommand,
    },

    #[command(next_help_heading = "Metadata", about = "Comment on a task, or list comments")]
    Comment(cmd::comment::CommentArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Check board invariants",
        long_about = "Check the column chain, task positions, role designations and relation graph of the current project."
    )]
    Check,

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    lanes completions bash > ~/.local/share/bash-completion/completions/lanes"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("LANES_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "lanes=debug,lanes_core=debug,info"
        } else {
            "lanes=info,warn"
        })
    });

    let format = env::var("LANES_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli, globals: &Globals) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, globals),
        Commands::Project { command } => cmd::project::run_project(&command, globals),
        Commands::Column { command } => cmd::column::run_column(&command, globals),
        Commands::Create(args) => cmd::create::run_create(&args, globals),
        Commands::List(args) => cmd::list::run_list(&args, globals),
        Commands::Show(args) => cmd::show::run_show(&args, globals),
        Commands::Update(args) => cmd::update::run_update(&args, globals),
        Commands::Delete(args) => cmd::delete::run_delete(&args, globals),
        Commands::Move(args) => cmd::move_cmd::run_move(&args, globals),
        Commands::Up(args) => cmd::move_cmd::run_swap(&args, true, globals),
        Commands::Down(args) => cmd::move_cmd::run_swap(&args, false, globals),
        Commands::Link(args) => cmd::link::run_link(&args, globals),
        Commands::Unlink(args) => cmd::link::run_unlink(&args, globals),
        Commands::Ready => cmd::ready::run_ready(globals),
        Commands::Blocked => cmd::ready::run_blocked(globals),
        Commands::Label { command } => cmd::label::run_label(&command, globals),
        Commands::Comment(args) => cmd::comment::run_comment(&args, globals),
        Commands::Check => cmd::check::run_check(globals),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn globals(cli: &Cli) -> anyhow::Result<Globals> {
    let config = lanes_core::config::load_config().map_err(|err| {
        CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}"))
    })?;
    let output = output::resolve_output_mode(cli.format, cli.json, &config)?;
    Ok(Globals {
        project: cli.project.clone(),
        db: cli.db.clone(),
        output,
        config,
    })
}

fn fail(err: &anyhow::Error, mode: OutputMode) -> ExitCode {
    let cli_error = CliError::from_anyhow(err);
    debug!(code = ?cli_error.error_code, exit = cli_error.exit_code, "command failed");
    if render_error(mode, &cli_error).is_err() {
        eprintln!("error: {}", cli_error.message);
    }
    ExitCode::from(u8::try_from(cli_error.exit_code).unwrap_or(1))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if cli.verbose {
        info!("verbose mode enabled");
    }

    let globals = match globals(&cli) {
        Ok(globals) => globals,
        Err(err) => {
            let mode = cli.format.unwrap_or(if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Text
            });
            return fail(&err, mode);
        }
    };

    let mode = globals.output;
    match run(cli, &globals) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err, mode),
    }
}
