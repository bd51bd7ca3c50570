use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod build;
mod config;
mod error;
mod graph;
mod memory;
mod node;
mod propagate;
mod render;
mod session;
#[cfg(test)]
mod testkit;
mod tracker;

use config::Settings;
use memory::{MemoryPort, ProcessMemory, SnapshotMemory};
use propagate::ForceRequest;
use tracker::{Request, Tracker};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "dagviz")]
#[command(about = "Live task DAG inspector for emulated games", long_about = None)]
struct Cli {
    /// Settings file (JSON). Missing file means defaults.
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Read a raw guest memory dump instead of attaching to the emulator.
    #[arg(long, global = true)]
    dump: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the game and rewrite the DOT file on every change.
    ///
    /// Requests are read from stdin, one per line:
    /// `<address>=<state>`, `reset` or `refresh`.
    Watch {
        #[arg(short = 'o', long)]
        out: PathBuf,
    },
    /// Discover the current DAG once and write it as DOT.
    Export {
        #[arg(short = 'o', long, default_value = "export.dot")]
        out: PathBuf,
    },
    /// Force a node into a state, cascading to keep the DAG consistent.
    Force {
        /// Node address in hex (with or without 0x).
        #[arg(long, value_parser = ForceRequest::parse_node)]
        node: u32,

        /// 0 unavailable, 1 available, 2 complete, 3 final.
        #[arg(long)]
        state: u32,
    },
    /// Put every node of the current DAG back to its initial state.
    Reset,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "dagviz=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;
    let dump = cli
        .dump
        .as_deref()
        .map(SnapshotMemory::from_file)
        .transpose()?;

    match cli.cmd {
        Commands::Watch { out } => watch(settings, dump.as_ref(), &out),
        Commands::Export { out } => {
            let source = open_source(&settings, dump.as_ref())?;
            let memory = source.port();
            let dot = Tracker::new(settings).snapshot(memory)?;
            write_dot(&out, &dot)?;
            info!("exported DAG to {}", out.display());
            Ok(())
        }
        Commands::Force { node, state } => {
            let source = open_source(&settings, dump.as_ref())?;
            let memory = source.port();
            Tracker::new(settings).handle(memory, Request::Force(ForceRequest::new(node, state)))?;
            Ok(())
        }
        Commands::Reset => {
            let source = open_source(&settings, dump.as_ref())?;
            let memory = source.port();
            let mut tracker = Tracker::new(settings);
            tracker.handle(memory, Request::Refresh)?;
            tracker.handle(memory, Request::Reset)?;
            info!(nodes = tracker.graph().node_count(), "reset DAG");
            Ok(())
        }
    }
}

/// Where guest memory comes from for one command or tick.
enum Source<'a> {
    Dump(&'a SnapshotMemory),
    Live(ProcessMemory),
}

impl Source<'_> {
    fn port(&self) -> &dyn MemoryPort {
        match self {
            Source::Dump(dump) => *dump,
            Source::Live(process) => process,
        }
    }
}

/// Attach to the emulator unless a dump was given.
fn open_source<'a>(
    settings: &Settings,
    dump: Option<&'a SnapshotMemory>,
) -> error::DagResult<Source<'a>> {
    match dump {
        Some(dump) => Ok(Source::Dump(dump)),
        None => ProcessMemory::attach(&settings.process_name, settings.base_address).map(Source::Live),
    }
}

fn write_dot(path: &Path, dot: &str) -> Result<()> {
    use anyhow::Context;
    std::fs::write(path, dot).with_context(|| format!("write {}", path.display()))
}

fn watch(settings: Settings, dump: Option<&SnapshotMemory>, out: &Path) -> Result<()> {
    let interval = settings.refresh_interval();
    let mut tracker = Tracker::new(settings.clone());

    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut last_dot = String::new();
    let mut last_status = String::new();
    loop {
        // Reattach every tick; the emulator may have been restarted.
        let source = match open_source(&settings, dump) {
            Ok(source) => source,
            Err(e) => {
                report(&mut last_status, &e.to_string());
                std::thread::sleep(interval);
                continue;
            }
        };
        let memory = source.port();

        for line in rx.try_iter() {
            match Request::parse(&line) {
                Ok(request) => {
                    if let Err(e) = tracker.handle(memory, request) {
                        warn!("request {:?} failed: {}", line.trim(), e);
                    }
                }
                Err(e) => warn!("{:#}", e),
            }
        }

        match tracker.tick(memory, Instant::now()) {
            Ok(Some(dot)) => {
                report(&mut last_status, "tracking");
                if dot != last_dot {
                    match write_dot(out, &dot) {
                        Ok(()) => last_dot = dot,
                        Err(e) => error!("{:#}", e),
                    }
                }
            }
            Ok(None) => report(&mut last_status, "no active DAG"),
            Err(e) => report(&mut last_status, &e.to_string()),
        }

        std::thread::sleep(interval);
    }
}

/// Log status transitions only, not every tick.
fn report(last: &mut String, status: &str) {
    if last != status {
        info!("{}", status);
        *last = status.to_string();
    } else {
        debug!("{}", status);
    }
}
