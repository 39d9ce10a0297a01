//! Supervisor loop: wires the transport, assembler, filter engine,
//! enrichment hooks, and sink together and drives
//! receive -> parse -> assemble -> filter -> enrich -> write. Components
//! are expressed behind the capability interfaces `sink::Sink` and
//! `enrich::EnrichHook` rather than a plugin/reflection layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};

use crate::assembler::Assembler;
use crate::canary;
use crate::config::Settings;
use crate::enrich::{self, EnrichHook};
use crate::error::TransportError;
use crate::event::AuditEventGroup;
use crate::filter::FilterEngine;
use crate::parser::parse_header;
use crate::rules::{self, SystemExecutor};
use crate::sequence_tracker::SequenceTracker;
use crate::sink::{self, Sink};
use crate::transport::NetlinkTransport;
use crate::uid_cache::UidCache;

/// `audit_status` mask for "enable auditing", used by the keepalive task
/// and the one-time arm-on-startup call.
const STATUS_MASK_ENABLED: u32 = 4;

pub struct Supervisor {
    settings: Settings,
}

impl Supervisor {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Runs until SIGINT (clean exit) or a fatal condition (sink
    /// exhausted its retries, file reopen failed) terminates the process.
    pub async fn run(self) -> Result<()> {
        let settings = self.settings;

        if !settings.rules.is_empty() {
            rules::apply(&settings.rules, &SystemExecutor).context("failed to install audit rules")?;
        }

        let sink = sink::build(&settings.output).context("failed to open configured output")?;
        let sink = Arc::new(Mutex::new(sink));

        let filter_engine =
            FilterEngine::from_config(&settings.filters).context("failed to compile configured filters")?;

        let mut hooks: Vec<Box<dyn EnrichHook>> = enrich::build(&settings.extras);
        if settings.extras.dnstap.enabled {
            let cache = enrich::dnstap::new_cache(settings.extras.dnstap.cache_size);
            hooks.push(Box::new(enrich::dnstap::DnsTapHook::new(cache.clone())));
            tokio::spawn(enrich::dnstap::listen(settings.extras.dnstap.socket_path.clone(), cache));
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let transport = Arc::new(
            NetlinkTransport::open(settings.socket_buffer.receive, Arc::clone(&shutdown))
                .context("failed to open audit netlink socket")?,
        );
        transport
            .send_status(STATUS_MASK_ENABLED, 1)
            .context("failed to arm the audit feed")?;

        tokio::spawn(Arc::clone(&transport).keepalive());

        if settings.canary.enabled {
            tokio::spawn(canary::run(settings.canary.host.clone(), settings.canary.port.clone()));
        }

        let uid_cache = Arc::new(UidCache::new());
        let tracker = settings
            .message_tracking
            .enabled
            .then(|| SequenceTracker::new(settings.message_tracking.log_out_of_order, settings.message_tracking.max_out_of_order));
        let events_min = settings.events.min;
        let events_max = settings.events.max;

        let (exit_tx, mut exit_rx) = tokio::sync::mpsc::channel::<i32>(1);
        let ingest_transport = Arc::clone(&transport);
        let ingest_sink = Arc::clone(&sink);

        let ingest = tokio::task::spawn_blocking(move || {
            run_ingest_loop(
                ingest_transport,
                ingest_sink,
                exit_tx,
                uid_cache,
                tracker,
                events_min,
                events_max,
                filter_engine,
                hooks,
            )
        });

        let reopen_sink = Arc::clone(&sink);
        tokio::spawn(async move {
            let Ok(mut usr1) = signal(SignalKind::user_defined1()) else {
                log::warn!("failed to install SIGUSR1 handler, log rotation reopen is disabled");
                return;
            };
            loop {
                usr1.recv().await;
                let result = reopen_sink.lock().unwrap().reopen();
                if let Err(err) = result {
                    log::error!("failed to reopen output after SIGUSR1: {}", err);
                    std::process::exit(1);
                }
            }
        });

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("received SIGINT, shutting down");
                shutdown.store(true, Ordering::Relaxed);
            }
            code = exit_rx.recv() => {
                if let Some(code) = code {
                    let _ = ingest.await;
                    std::process::exit(code);
                }
            }
        }

        let _ = ingest.await;
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn run_ingest_loop(
    transport: Arc<NetlinkTransport>,
    sink: Arc<Mutex<Box<dyn Sink>>>,
    exit: tokio::sync::mpsc::Sender<i32>,
    uid_cache: Arc<UidCache>,
    tracker: Option<SequenceTracker>,
    events_min: u16,
    events_max: u16,
    filter_engine: FilterEngine,
    hooks: Vec<Box<dyn EnrichHook>>,
) {
    let mut assembler = Assembler::new(uid_cache, tracker, events_min, events_max);

    loop {
        match transport.receive() {
            Ok(frame) => {
                let payload = String::from_utf8_lossy(&frame.payload);
                let (header, rest) = parse_header(&payload);
                let completed = assembler.process(frame.record_type, header.sequence, header.timestamp, rest);
                for group in completed {
                    if dispatch(group, &filter_engine, &hooks, &sink) {
                        let _ = exit.blocking_send(1);
                        return;
                    }
                }
            }
            Err(TransportError::ShutdownRequested) => return,
            Err(TransportError::ZeroLengthFrame) => {
                log::warn!("received a zero-length frame from the audit socket");
            }
            Err(TransportError::SocketError(err)) => {
                log::warn!("audit socket error, continuing: {}", err);
            }
        }
    }
}

/// Filters, enriches, and writes one completed group. Returns `true` if
/// the sink exhausted its retries -- a fatal condition.
fn dispatch(
    mut group: AuditEventGroup,
    filter_engine: &FilterEngine,
    hooks: &[Box<dyn EnrichHook>],
    sink: &Arc<Mutex<Box<dyn Sink>>>,
) -> bool {
    if filter_engine.should_drop(&group) {
        return false;
    }

    for hook in hooks {
        hook.enrich(&mut group);
    }

    if let Err(err) = sink.lock().unwrap().write(&group) {
        log::error!("sink exhausted all retry attempts, exiting: {}", err);
        return true;
    }
    false
}
