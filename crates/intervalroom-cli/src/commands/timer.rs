use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use intervalroom_core::{
    Config, ConfigSettings, Database, Event, MonotonicClock, Notifier, NullNotifier, SessionLock,
    SessionStatus, SessionStore, Snapshot, TimerController, TimerService,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use super::plan::PlanArgs;
use crate::terminal::TerminalNotifier;

/// Tick intervals below this are clamped.
const MIN_TICK_INTERVAL_MS: u64 = 50;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a new session (no-op while one is active)
    Start {
        #[command(flatten)]
        plan: PlanArgs,
    },
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// End the session
    Stop,
    /// Print current timer state as JSON
    Status,
    /// Drive the session in the foreground with a live status line and cues.
    ///
    /// Picks up a persisted session if one exists, otherwise starts the given
    /// plan. Reads p/r/s/q from stdin; q or Ctrl-C detaches and leaves the
    /// session persisted. While it runs, start/pause/resume/stop from other
    /// shells are refused; `status` still works.
    Run {
        #[command(flatten)]
        plan: PlanArgs,
    },
}

fn open_controller(
    config: &Config,
    notifier: Arc<dyn Notifier>,
) -> Result<TimerController, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let settings = ConfigSettings::from_default_path()?;
    Ok(TimerController::new(
        Arc::new(MonotonicClock::new()),
        SessionStore::new(db),
        notifier,
        Arc::new(settings),
    )
    .with_status_interval(config.timer.status_interval_ms))
}

/// JSON printed by the one-shot timer commands.
#[derive(Serialize)]
struct Outcome {
    status: SessionStatus,
    event: Option<Event>,
    snapshot: Snapshot,
}

fn print_outcome(
    ctl: &TimerController,
    event: Option<Event>,
) -> Result<(), Box<dyn std::error::Error>> {
    let out = Outcome {
        status: ctl.status(),
        event,
        snapshot: ctl.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    eprint!("\r\x1b[2K");
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    if let TimerAction::Run { plan } = &action {
        return run_foreground(&config, plan);
    }
    // Mutations need the session; a live runner keeps it until it exits.
    let _owner = match action {
        TimerAction::Status => None,
        _ => Some(SessionLock::acquire()?),
    };
    let mut ctl = open_controller(&config, Arc::new(NullNotifier))?;

    let event = match action {
        TimerAction::Start { plan } => {
            let plan = plan.resolve(&config)?;
            ctl.start(plan)
        }
        TimerAction::Pause => ctl.pause(),
        TimerAction::Resume => ctl.resume(),
        TimerAction::Stop => ctl.stop(),
        TimerAction::Status => ctl.take_recovered(),
        TimerAction::Run { .. } => None,
    };

    print_outcome(&ctl, event)
}

fn run_foreground(config: &Config, plan_args: &PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _owner = SessionLock::acquire()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut ctl = open_controller(config, Arc::new(TerminalNotifier))?;
        let recovered = ctl.take_recovered();
        let tick_interval =
            Duration::from_millis(config.timer.tick_interval_ms.max(MIN_TICK_INTERVAL_MS));
        tracing::debug!(?tick_interval, recovered = recovered.is_some(), "foreground runner");
        let service = TimerService::new(ctl, tick_interval).await;
        let mut events = service.subscribe_events();
        let mut snapshots = service.subscribe();

        match recovered {
            Some(event) => print_event(&event)?,
            None => {
                let plan = plan_args.resolve(config)?;
                service.start(plan).await;
            }
        }
        eprintln!("controls: p = pause, r = resume, s = stop, q = detach");

        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let mut detached = false;

        while !snapshots.borrow().is_finished() {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => print_event(&event)?,
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                },
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                line = stdin.next_line(), if stdin_open => match line {
                    Ok(Some(cmd)) => match cmd.trim() {
                        "p" => { service.pause().await; }
                        "r" => { service.resume().await; }
                        "s" => { service.stop().await; }
                        "q" => { detached = true; break; }
                        "" => {}
                        other => eprintln!("unknown command '{other}' (p, r, s, q)"),
                    },
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        tracing::debug!(error = %e, "stdin closed");
                        stdin_open = false;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    detached = true;
                    break;
                }
            }
        }

        while let Ok(event) = events.try_recv() {
            print_event(&event)?;
        }
        if detached {
            eprintln!("\ndetached; run `intervalroom-cli timer run` to pick the session up again");
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
