use std::io::Write;
use std::time::Duration;

use boxbreath_core::timer::NoopObserver;
use boxbreath_core::{
    open_settings, BreathingConfig, Config, Event, Feedback, SessionSummary, TimerObserver,
    TimerRunner, TimerSnapshot, TimerState,
};
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

const BAR_WIDTH: usize = 24;

#[derive(Args)]
pub struct RunArgs {
    /// Seconds per phase for this session (1-60)
    #[arg(long, allow_negative_numbers = true)]
    duration: Option<i64>,
    /// Number of cycles for this session (1-20)
    #[arg(long, allow_negative_numbers = true)]
    cycles: Option<i64>,
    /// Disable sound and haptic cues
    #[arg(long)]
    no_sound: bool,
    /// Print events as JSON lines instead of a status line
    #[arg(long)]
    json: bool,
}

/// Writes each timer event to stdout as one JSON line.
struct JsonEvents;

impl TimerObserver for JsonEvents {
    fn on_event(&mut self, event: &Event) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("failed to encode event: {e}"),
        }
    }
}

enum Input {
    Pause,
    Resume,
    Stop,
    Reset,
    Quit,
}

impl Input {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "s" | "stop" => Some(Self::Stop),
            "reset" => Some(Self::Reset),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let stored = open_settings()?.config();
    // Flags apply to this session only and are never written back.
    let session = BreathingConfig::new(
        args.duration.unwrap_or(i64::from(stored.duration())),
        args.cycles.unwrap_or(i64::from(stored.cycles())),
    );

    let mut feedback = if args.no_sound {
        Feedback::silent()
    } else {
        Feedback::from_config(&config.feedback)
    };
    // Cue hooks run under the timer lock, so the device must be open first.
    feedback.warm_up();
    let tail = feedback.completion_tail();
    let tick_interval = config.timer.tick_interval();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let stdin = BufReader::new(tokio::io::stdin());
    let outcome = if args.json {
        let runner = TimerRunner::new(session, tick_interval, (feedback, JsonEvents));
        runtime.block_on(drive(runner, false, tail, stdin))
    } else {
        let runner = TimerRunner::new(session, tick_interval, (feedback, NoopObserver));
        runtime.block_on(drive(runner, true, tail, stdin))
    };
    // A pending stdin read would otherwise hold the process open until the
    // next line of input.
    runtime.shutdown_background();
    let outcome = outcome?;

    if !args.json {
        match outcome {
            Some(summary) => print_summary(&summary),
            None => println!("session stopped"),
        }
    }
    Ok(())
}

/// Run the session until it completes or the user stops it, reading
/// commands line by line from `input`.
///
/// Returns the summary of a completed session, `None` if it was stopped.
/// After completion the runner is kept alive for `tail` so the final chime
/// is not cut off.
async fn drive(
    mut runner: TimerRunner,
    render: bool,
    tail: Duration,
    input: impl AsyncBufRead + Unpin,
) -> Result<Option<SessionSummary>, std::io::Error> {
    let mut snapshots = runner.subscribe();
    let mut lines = input.lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    if render {
        println!("commands: p(ause), r(esume), s(top), reset, q(uit)");
    }
    runner.start();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return Ok(None);
                }
                let snapshot = *snapshots.borrow_and_update();
                if render {
                    draw(&snapshot)?;
                }
                if snapshot.state == TimerState::Completed {
                    if render {
                        println!();
                    }
                    tokio::time::sleep(tail).await;
                    return Ok(Some(SessionSummary::from(runner.config())));
                }
            }
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    // Without stdin the session simply runs to completion.
                    Ok(None) => {
                        stdin_open = false;
                        continue;
                    }
                    Err(e) => {
                        warn!("stopped reading commands: {e}");
                        stdin_open = false;
                        continue;
                    }
                };
                match Input::parse(&line) {
                    Some(Input::Pause) => {
                        runner.pause();
                    }
                    Some(Input::Resume) => {
                        runner.resume();
                    }
                    Some(Input::Reset) => {
                        runner.reset();
                        runner.start();
                    }
                    Some(Input::Stop) | Some(Input::Quit) => {
                        runner.stop();
                        if render {
                            println!();
                        }
                        return Ok(None);
                    }
                    None if line.trim().is_empty() => {}
                    None => eprintln!("unknown command: {}", line.trim()),
                }
            }
            _ = &mut ctrl_c => {
                runner.stop();
                if render {
                    println!();
                }
                return Ok(None);
            }
        }
    }
}

fn status_line(snapshot: &TimerSnapshot) -> String {
    let phase = snapshot.current_phase;
    let filled = ((snapshot.progress / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    let state = match snapshot.state {
        TimerState::Paused => " (paused)",
        _ => "",
    };
    format!(
        "Cycle {} of {} | {:<6} {:>2}s [{}{}] {}{}",
        snapshot.current_cycle,
        snapshot.total_cycles,
        phase.label(),
        snapshot.phase_time_remaining.ceil() as u64,
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        phase.instruction(),
        state,
    )
}

fn draw(snapshot: &TimerSnapshot) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "\r{}\x1b[K", status_line(snapshot))?;
    stdout.flush()
}

fn print_summary(summary: &SessionSummary) {
    let minutes = summary.total_secs / 60;
    let seconds = summary.total_secs % 60;
    println!("Session complete");
    println!("  cycles:     {}", summary.cycles);
    println!("  per phase:  {}s", summary.duration_secs);
    println!("  total time: {minutes}:{seconds:02}");
}
