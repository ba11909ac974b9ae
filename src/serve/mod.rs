//! Development orchestrator.
//!
//! One serialized build queue: at most one pipeline pass in flight, and
//! any triggers arriving mid-build coalesce into exactly one follow-up
//! pass. File changes are debounced before enqueueing. Build outcomes are
//! pushed to live-preview subscribers over a fan-out channel so a slow
//! subscriber never delays the next build.
//!
//! ```text
//! notify → Debouncer → trigger channel → build loop → broadcast channel → subscribers
//! ```

mod debounce;
mod http;
mod message;
mod state;
mod ws;

pub use message::{DevMessage, IssuePayload};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use notify::{RecursiveMode, Watcher};

use crate::config::PackConfig;
use crate::error::Severity;
use crate::logger;
use crate::pipeline::{self, BuildCaches};

use debounce::Debouncer;
use state::DevState;

/// Capacity of the trigger channel. The build loop drains it before every
/// pass, so it only needs to absorb a burst.
const TRIGGER_QUEUE: usize = 16;

/// Why a rebuild was enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    FileChange(usize),
    Manual,
    Shutdown,
}

impl Trigger {
    fn label(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::FileChange(_) => "file change",
            Self::Manual => "client request",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Run the development orchestrator until Ctrl+C.
pub fn run(config: Arc<PackConfig>) -> Result<()> {
    let state = Arc::new(DevState::default());
    let caches = BuildCaches::default();
    let subscribers = ws::Subscribers::new();

    let (trigger_tx, trigger_rx) = bounded::<Trigger>(TRIGGER_QUEUE);
    // Fan-out channel: broadcast latency is decoupled from build latency.
    let (broadcast_tx, broadcast_rx) = unbounded::<DevMessage>();

    // Broadcaster thread
    let broadcast_subscribers = subscribers.clone();
    std::thread::spawn(move || {
        for msg in broadcast_rx {
            broadcast_subscribers.broadcast(&msg);
        }
    });

    let ws_port = ws::start_ws_server(
        config.serve.ws_port,
        subscribers,
        trigger_tx.clone(),
        Arc::clone(&state),
    )?;
    let http_port = http::start_preview_server(config.serve.port, Arc::clone(&state))?;
    crate::log!("serve"; "preview on http://127.0.0.1:{http_port}, push on ws://127.0.0.1:{ws_port}");

    if config.serve.watch {
        start_watcher(&config, trigger_tx.clone())?;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let ctrlc_shutdown = Arc::clone(&shutdown);
    let ctrlc_tx = trigger_tx.clone();
    ctrlc::set_handler(move || {
        ctrlc_shutdown.store(true, Ordering::SeqCst);
        let _ = ctrlc_tx.try_send(Trigger::Shutdown);
    })
    .context("failed to install Ctrl+C handler")?;

    trigger_tx
        .send(Trigger::Initial)
        .context("trigger channel closed before initial build")?;

    build_loop(&config, &caches, &state, &trigger_rx, &broadcast_tx, &shutdown);
    crate::log!("serve"; "shutting down");
    Ok(())
}

/// Watch the source root (and the skeleton template) and feed debounced
/// change batches into the trigger channel.
fn start_watcher(config: &Arc<PackConfig>, trigger_tx: Sender<Trigger>) -> Result<()> {
    let (event_tx, event_rx) = unbounded::<notify::Event>();

    let mut watcher = notify::recommended_watcher(move |res| match res {
        Ok(event) => {
            let _ = event_tx.send(event);
        }
        Err(e) => crate::log!("watch"; "notify error: {e}"),
    })
    .context("failed to create file watcher")?;

    let source_dir = config.source_dir();
    watcher
        .watch(&source_dir, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch `{}`", source_dir.display()))?;

    let template = config.template_path();
    if template.exists() {
        watcher
            .watch(&template, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch `{}`", template.display()))?;
    }

    let debounce_ms = config.serve.debounce_ms;
    std::thread::spawn(move || {
        // Watcher must stay alive for the lifetime of the loop
        let _watcher = watcher;
        let mut debouncer = Debouncer::new(debounce_ms);

        loop {
            match event_rx.recv_timeout(debouncer.sleep_duration()) {
                Ok(event) => debouncer.add_event(&event),
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(changes) = debouncer.take_if_ready() {
                        crate::debug!("watch"; "{} change(s) after quiet window", changes.len());
                        // A full queue already guarantees a follow-up pass
                        let _ = trigger_tx.try_send(Trigger::FileChange(changes.len()));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    });

    Ok(())
}

/// The serialized build queue. Runs on the caller's thread until shutdown.
fn build_loop(
    config: &PackConfig,
    caches: &BuildCaches,
    state: &Arc<DevState>,
    trigger_rx: &Receiver<Trigger>,
    broadcast_tx: &Sender<DevMessage>,
    shutdown: &AtomicBool,
) {
    while let Ok(trigger) = trigger_rx.recv() {
        if trigger == Trigger::Shutdown || shutdown.load(Ordering::SeqCst) {
            break;
        }

        // Coalesce every queued trigger into this pass: N triggers that
        // arrived while the previous build ran become exactly one run.
        let mut stop = false;
        while let Ok(extra) = trigger_rx.try_recv() {
            if extra == Trigger::Shutdown {
                stop = true;
            }
        }
        if stop {
            break;
        }

        let sequence = state.next_sequence();
        crate::debug!("serve"; "build #{sequence} ({})", trigger.label());

        state.set_building(true);
        let outcome = pipeline::build(config, caches);
        state.set_building(false);

        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                state.publish(Arc::clone(&result));

                if result.success {
                    let warnings = result.issues.len();
                    if warnings > 0 {
                        logger::status_warning(&format!(
                            "build #{sequence}: {} bytes in {:.0?}, {warnings} warning(s)",
                            result.byte_size, result.duration
                        ));
                    } else {
                        logger::status_success(&format!(
                            "build #{sequence}: {} bytes in {:.0?}",
                            result.byte_size, result.duration
                        ));
                    }
                    let _ = broadcast_tx.send(DevMessage::Reload);
                    let _ = broadcast_tx.send(DevMessage::BuildSuccess {
                        duration_ms: result.duration.as_millis() as u64,
                    });
                } else {
                    let detail = result
                        .issues
                        .iter()
                        .filter(|i| i.is_error())
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n");
                    logger::status_error(&format!("build #{sequence} failed"), &detail);
                    let _ = broadcast_tx.send(DevMessage::build_error(&result.issues));
                }
            }
            Err(e) => {
                // Pipeline errors become push messages, never a process
                // exit: the orchestrator outlives every failed build.
                logger::status_error(&format!("build #{sequence} failed"), &e.to_string());
                let _ = broadcast_tx.send(DevMessage::BuildError {
                    issues: vec![IssuePayload {
                        severity: Severity::Error,
                        message: e.to_string(),
                    }],
                });
            }
        }
    }
}
