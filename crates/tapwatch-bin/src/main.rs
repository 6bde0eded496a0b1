//! tapwatch entrypoint.
use anyhow::Result;
use clap::Parser;
use core_config::load_from;
use core_events::{EVENT_CHANNEL_CAP, Event, EventSourceRegistry};
use core_input::{AsyncInputShutdown, TerminalInputSource};
use core_session::{MonotonicClock, SessionSettings};
use core_terminal::{CrosstermBackend, TerminalBackend, TerminalGuard};
use std::io::{Stdout, stdout};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tapwatch::{LoopControl, Runtime, ShutdownReason};
use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "tapwatch",
    version,
    about = "Measure pointer-to-content latency on a demo page"
)]
struct Args {
    /// Configuration file path (overrides discovery of `tapwatch.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Timeout in milliseconds before a press with no page change gives up.
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
    /// Start with instrumentation off (press `a` to activate).
    #[arg(long)]
    pub inactive: bool,
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

struct Bootstrap {
    settings: SessionSettings,
    load_delay: Duration,
    activate: bool,
    size: (u16, u16),
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn run(&mut self) -> Result<(Bootstrap, TerminalGuard<'_>)> {
        self.configure_logging()?;
        Self::install_panic_hook();
        info!(target: "runtime", "startup");

        let args = Args::parse();
        let mut config = load_from(args.config.clone())?;
        if let Some(ms) = args.timeout_ms {
            config.override_timeout_ms(ms);
        }

        self.backend.set_title("tapwatch")?;
        let size = self.backend.size().unwrap_or((80, 24));
        let guard = self.backend.enter_guard()?;

        let settings = SessionSettings::from(&config);
        info!(
            target: "runtime.startup",
            config_override = args.config.is_some(),
            timeout_ms = u64::try_from(settings.timeout.as_millis()).unwrap_or(u64::MAX),
            frame_targets = settings.frame_targets.len(),
            overlay_offset = settings.overlay_offset,
            inactive = args.inactive,
            "bootstrap_complete"
        );
        Ok((
            Bootstrap {
                settings,
                load_delay: config.effective.load_delay,
                activate: !args.inactive,
                size,
            },
            guard,
        ))
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("tapwatch.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "tapwatch.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        if tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .with_ansi(false)
            .try_init()
            .is_ok()
        {
            self.log_guard = Some(guard);
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

struct App<'a> {
    runtime: Runtime<MonotonicClock>,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    source_handles: Vec<tokio::task::JoinHandle<()>>,
    input_shutdown: Option<AsyncInputShutdown>,
    out: Stdout,
    _terminal_guard: TerminalGuard<'a>,
}

impl<'a> App<'a> {
    async fn run(&mut self) -> Result<()> {
        self.render("initial");

        let loop_span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter_loop = loop_span.enter();

        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        while let Some(event) = self.rx.recv().await {
            match self.runtime.handle(&event) {
                LoopControl::Break { reason } => {
                    shutdown_reason = reason;
                    break;
                }
                LoopControl::Continue => self.render("frame"),
            }
        }

        self.rx.close();
        self.finalize_shutdown(shutdown_reason).await;
        Ok(())
    }

    fn render(&mut self, failure: &'static str) {
        if let Err(e) = self.runtime.render(&mut self.out) {
            error!(target: "render", ?e, stage = failure, "render_failed");
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        let remaining = self.runtime.teardown_all();
        if remaining > 0 {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                remaining,
                "instrumentation_torn_down"
            );
        }

        if let Some(tx) = self.tx.take() {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "dropping_runtime_sender"
            );
            drop(tx);
        }

        if let Some(shutdown) = self.input_shutdown.take() {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "input_task_shutdown_signal"
            );
            shutdown.signal();
        }

        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_stopped"
                ),
                Ok(Err(err)) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_cancelled"
                ),
                Ok(Err(err)) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "event_source_task_error"
                ),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_timeout"
                ),
            }
        }

        let m = self.runtime.engine().metrics().snapshot();
        info!(
            target: "render",
            full_frames = m.full_frames,
            partial_frames = m.partial_frames,
            skipped_frames = m.skipped_frames,
            rows_repainted = m.rows_repainted,
            print_commands = m.print_commands,
            "render_totals"
        );
        log_shutdown_stage(reason, "complete");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    let (boot, guard) = startup.run()?;
    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (input, input_shutdown) = TerminalInputSource::with_shutdown();
    let mut registry = EventSourceRegistry::new();
    registry.register(input);
    let source_handles = registry.spawn_all(&tx);

    let mut runtime = Runtime::new(
        tx.clone(),
        MonotonicClock,
        boot.settings,
        boot.load_delay,
        boot.size,
    );
    if boot.activate {
        runtime.activate();
    }

    let mut app = App {
        runtime,
        rx,
        tx: Some(tx),
        source_handles,
        input_shutdown: Some(input_shutdown),
        out: stdout(),
        _terminal_guard: guard,
    };
    app.run().await
}
