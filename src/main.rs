// Tue Jan 13 2026 - Alex

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use process_snapshot::{
    config::SnapshotConfig,
    output::{JsonSerializer, SnapshotSummary},
    process::SuspensionState,
    snapshot::{ProcessSnapshot, TriState},
    ui::{Banner, ProgressSpinner},
    utils::{format_bytes, format_duration, pluralize, LoggingUtils},
};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author = "Alex")]
#[command(version)]
#[command(about = "Captures a postmortem snapshot of another process", long_about = None)]
struct Args {
    /// Process to snapshot.
    #[arg(short, long)]
    pid: i32,

    /// JSON file overriding snapshot limits.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a JSON summary here.
    #[arg(short, long)]
    json: Option<PathBuf>,

    /// The target was stopped before this tool was started.
    #[arg(long)]
    suspended: bool,

    /// Client id to stamp into the snapshot.
    #[arg(long)]
    client_id: Option<Uuid>,

    /// Repeat for more detail (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use RUST_LOG instead of --verbose.
    #[arg(long)]
    env_log: bool,

    #[arg(long)]
    no_banner: bool,

    #[arg(long)]
    no_progress: bool,
}

fn main() {
    let args = Args::parse();

    if args.env_log {
        process_snapshot::utils::logging::init_from_env();
    } else {
        LoggingUtils::init_logger(LoggingUtils::level_from_verbosity(args.verbose), true);
    }

    if !args.no_banner {
        Banner::new("process-snapshot")
            .with_subtitle("postmortem process capture")
            .with_version(env!("CARGO_PKG_VERSION"))
            .print();
    }

    if let Err(e) = run(&args) {
        eprintln!("{} {:#}", "[!]".red(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => SnapshotConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SnapshotConfig::default(),
    };
    if args.pid <= 0 {
        bail!("invalid pid {}", args.pid);
    }

    let suspension_state = if args.suspended {
        SuspensionState::Suspended
    } else {
        SuspensionState::Running
    };

    println!("{} Snapshotting pid {}", "[*]".blue(), args.pid);
    let spinner = ProgressSpinner::new("Capturing process state...", !args.no_progress);
    let mut snapshot = ProcessSnapshot::with_config(config);
    match capture(args.pid, &mut snapshot, suspension_state) {
        Ok(()) => spinner.success("Snapshot captured"),
        Err(e) => {
            spinner.failure("Snapshot failed");
            return Err(e);
        }
    }
    let elapsed = spinner.elapsed();

    snapshot.set_report_id(Uuid::new_v4());
    if let Some(client_id) = args.client_id {
        snapshot.set_client_id(client_id);
    }

    let summary = SnapshotSummary::from_snapshot(&snapshot);
    print_summary(&summary);

    if let Some(path) = &args.json {
        JsonSerializer::new()
            .serialize_to_file(&summary, path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("{} Summary saved to: {}", "[+]".green(), path.display());
    }

    println!("{} Done in {}", "[+]".green(), format_duration(elapsed));
    Ok(())
}

#[cfg(target_os = "linux")]
fn capture(pid: i32, snapshot: &mut ProcessSnapshot, state: SuspensionState) -> Result<()> {
    let process = process_snapshot::process::LinuxProcess::new(pid);
    snapshot.initialize(&process, state, None, None)?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn capture(_pid: i32, _snapshot: &mut ProcessSnapshot, _state: SuspensionState) -> Result<()> {
    bail!("live capture is only implemented for Linux")
}

fn tri_state(value: TriState) -> colored::ColoredString {
    match value {
        TriState::Unset => "unset".dimmed(),
        TriState::Enabled => "enabled".green(),
        TriState::Disabled => "disabled".yellow(),
    }
}

fn print_summary(summary: &SnapshotSummary) {
    println!();
    println!("{}", "Snapshot Summary".cyan().bold());
    println!("{}", "-".repeat(40).cyan());
    println!("  Process:  {} (parent {})", summary.process_id, summary.parent_process_id);
    println!("  Report:   {}", summary.report_id);
    println!(
        "  System:   {} {} ({}), {}",
        summary.system.os_name,
        summary.system.os_version.as_deref().unwrap_or("?"),
        summary.system.cpu_architecture,
        pluralize(summary.system.cpu_count, "cpu", "cpus")
    );
    println!("  Threads:  {}", summary.threads.len().to_string().green());
    println!("  Modules:  {}", summary.modules.len().to_string().green());
    println!("  Unloaded: {}", summary.unloaded_modules.len());
    println!("  Handles:  {}", summary.handles.len());
    println!("  Regions:  {}", summary.memory_regions);
    println!(
        "  Extra memory: {} ({})",
        pluralize(summary.extra_memory.len(), "range", "ranges"),
        format_bytes(summary.extra_memory_bytes)
    );

    let options = &summary.crashpad_options;
    println!(
        "  Options:  handler {}, forwarding {}, indirect memory {}",
        tri_state(options.crashpad_handler_behavior),
        tri_state(options.system_crash_reporter_forwarding),
        tri_state(options.gather_indirectly_referenced_memory)
    );

    if let Some(exception) = &summary.exception {
        println!(
            "  {} {} at {} on thread {}",
            "Exception:".red().bold(),
            exception.code,
            exception.address,
            exception.thread_id
        );
    }

    if !summary.threads.is_empty() {
        println!();
        println!("{}", "Threads:".yellow().bold());
        for thread in &summary.threads {
            let stack = thread
                .stack
                .as_ref()
                .map(|s| format!("{} +0x{:x}", s.address, s.size))
                .unwrap_or_else(|| "-".to_string());
            println!("  {:>7}  suspend {}  stack {}", thread.id.to_string().cyan(), thread.suspend_count, stack);
        }
    }

    if !summary.modules.is_empty() {
        println!();
        println!("{}", "Modules:".yellow().bold());
        for module in &summary.modules {
            println!("  {} {} +0x{:x}", module.base, module.name.cyan(), module.size);
        }
    }
    println!();
}
