use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use wat::types::Command;
use wat::workspace::Workspace;

const NUM_DECIDE_COMMANDS: usize = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Parser)]
#[command(name = "wat")]
#[command(about = "What's the next test? Recommends and runs it.")]
struct App {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Don't execute the recommended commands, just print them
    #[arg(short = 'd', long = "dry-run", global = true)]
    dry_run: bool,

    /// Number of commands to recommend
    #[arg(short = 'n', global = true, default_value_t = NUM_DECIDE_COMMANDS)]
    num_cmds: usize,

    /// Per-command timeout
    #[arg(short = 't', long = "timeout", global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create .wat/ at the current directory and write .watignore if missing
    Init,
    /// Force-refresh the candidate command list via plugins
    Populate,
    /// Print the candidate command list, refreshing it if stale
    List,
    /// Run the trainer, appending bootstrap log groups
    Train,
    /// Print the top-N recommended commands, one per line
    Decide,
    /// Print the N most recently edited files
    Recent,
}

fn main() {
    if let Err(e) = run() {
        fatal(&e);
    }
}

fn run() -> Result<()> {
    let app = App::parse();
    let cwd = std::env::current_dir().context("getting current directory")?;

    match app.command {
        Some(Commands::Init) => cmd_init(&cwd),
        Some(Commands::Populate) => cmd_populate(&cwd),
        Some(Commands::List) => cmd_list(&cwd),
        Some(Commands::Train) => cmd_train(&cwd, Duration::from_secs(app.timeout_secs)),
        Some(Commands::Decide) => cmd_decide(&cwd, app.num_cmds, Duration::from_secs(app.timeout_secs)),
        Some(Commands::Recent) => cmd_recent(&cwd, app.num_cmds),
        None => cmd_root(&cwd, app.dry_run, app.num_cmds, Duration::from_secs(app.timeout_secs)),
    }
}

fn workspace(cwd: &std::path::Path) -> Result<Workspace> {
    let ws = wat::workspace::get_or_init(cwd)?;
    wat::diagnostics::set_workspace_root(&ws.root);
    Ok(ws)
}

fn cmd_init(cwd: &std::path::Path) -> Result<()> {
    let ws = wat::workspace::wat_root(cwd);
    if ws.is_ok() {
        eprintln!(".wat already exists, nothing to do");
        return Ok(());
    }
    let ws = wat::workspace::init(cwd)?;
    wat::ignore::make_wat_ignore(&ws)?;
    Ok(())
}

fn candidates(ws: &Workspace) -> Result<Vec<Command>> {
    if let Some(cached) = wat::store::cached_list(ws, wat::store::LIST_TTL)? {
        return Ok(cached);
    }
    populate(ws)
}

fn populate(ws: &Workspace) -> Result<Vec<Command>> {
    let deadline = std::time::Instant::now() + Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    let builtins = wat::plugins::builtins();
    let mut commands = wat::plugins::run_all(&builtins, &ws.root, deadline);
    let user = wat::plugins::user_plugins(ws);
    commands.extend(wat::plugins::run_all_user(&user, &ws.root, deadline));
    wat::store::save_list(ws, &commands)?;
    Ok(commands)
}

fn cmd_populate(cwd: &std::path::Path) -> Result<()> {
    let ws = workspace(cwd)?;
    let commands = populate(&ws)?;
    println!("{} candidate commands", commands.len());
    Ok(())
}

fn cmd_list(cwd: &std::path::Path) -> Result<()> {
    let ws = workspace(cwd)?;
    let commands = candidates(&ws)?;
    println!("{}", serde_json::to_string_pretty(&commands)?);
    Ok(())
}

fn cmd_train(cwd: &std::path::Path, timeout: Duration) -> Result<()> {
    let ws = workspace(cwd)?;
    let cmds = candidates(&ws)?;
    let groups = wat::trainer::train(&ws, &cmds, timeout, wat::trainer::TRAIN_TTL)?;
    println!("{} bootstrap log groups recorded", groups.len());
    Ok(())
}

fn recent_files(ws: &Workspace, n: usize) -> Result<Vec<String>> {
    let matcher = wat::ignore::IgnoreMatcher::load(&ws.root);
    Ok(wat::walker::recent_file_names(&ws.root, &matcher, n.max(1))?)
}

fn cmd_recent(cwd: &std::path::Path, n: usize) -> Result<()> {
    let ws = workspace(cwd)?;
    for f in recent_files(&ws, n)? {
        println!("{f}");
    }
    Ok(())
}

/// Trains (a no-op once the trainer's own data is fresh), then ranks
/// candidates against the full post-training history, mirroring
/// `decide.go`'s `Decide()`, which always calls `Train` first.
fn decide_commands(ws: &Workspace, n: usize, timeout: Duration) -> Result<Vec<Command>> {
    let cmds = candidates(ws)?;
    wat::trainer::train(ws, &cmds, timeout, wat::trainer::TRAIN_TTL)?;
    let groups = wat::store::read_all(ws)?;
    let store = wat::history::DecisionStore::from_groups(groups.iter());
    let files = recent_files(ws, usize::MAX)?;
    Ok(wat::decision::decide(&cmds, &store, &files, n))
}

fn cmd_decide(cwd: &std::path::Path, n: usize, timeout: Duration) -> Result<()> {
    let ws = workspace(cwd)?;
    for c in decide_commands(&ws, n, timeout)? {
        println!("{}", c.command);
    }
    Ok(())
}

fn cmd_root(cwd: &std::path::Path, dry_run: bool, n: usize, timeout: Duration) -> Result<()> {
    let ws = workspace(cwd)?;
    let chosen = decide_commands(&ws, n, timeout)?;

    if dry_run {
        println!("WAT recommends the following commands:");
    } else {
        println!("WAT will run the following commands:");
    }
    for c in &chosen {
        println!("  {}", c.command.bold());
    }
    if dry_run || chosen.is_empty() {
        return Ok(());
    }

    if !confirm("Run these commands? [Y/n] ")? {
        return Ok(());
    }

    let recent_edits = recent_files(&ws, 1)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let logs = wat::runner::run_commands(&ws.root, &chosen, timeout, &mut handle)?;

    let group = wat::types::LogGroup {
        context: wat::types::LogContext {
            recent_edits,
            start_time: chrono::Utc::now(),
            source: wat::types::Source::User,
        },
        logs,
    };
    wat::store::append(&ws, std::slice::from_ref(&group))?;
    Ok(())
}

/// Reads one line from stdin and interprets it as yes/no, defaulting to
/// yes on an empty line (bare Enter). Mirrors `original_source`'s
/// `UserYN(defaultVal = true)`.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim();
    Ok(answer.is_empty() || answer.eq_ignore_ascii_case("y"))
}

fn fatal(err: &anyhow::Error) {
    wat::diagnostics::log_event("fatal", &format!("{err:#}"));
    eprintln!("{}: {err:#}", "wat".red());
    std::process::exit(1);
}
