use crate::domain::EventResolver;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::error::PipelineError;
use crate::pipeline::inbound_loop::InboundLoop;
use crate::pipeline::outbound_loop::OutboundLoop;
use crate::pipeline::queue::shared_channel;
use crate::pipeline::resolver_pool::ResolverPool;
use crate::pipeline::traits::{InvalidMessageSink, MessageSource, MessageWriter, ResponseHandler};
use common::domain::{DeviceManagement, EventCodec, EventResolutionResult, FailedEvent};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

/// Lifecycle phase of a pipeline supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Created,
    Initialized,
    Started,
    Stopped,
    Terminated,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Created => "created",
            PipelineState::Initialized => "initialized",
            PipelineState::Started => "started",
            PipelineState::Stopped => "stopped",
            PipelineState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// External collaborators the pipeline is wired to
pub struct PipelineComponents {
    pub source: Box<dyn MessageSource>,
    pub device_management: Arc<dyn DeviceManagement>,
    pub codec: Arc<dyn EventCodec>,
    pub resolved_writer: Arc<dyn MessageWriter>,
    pub failed_writer: Arc<dyn MessageWriter>,
    pub invalid_sink: Arc<dyn InvalidMessageSink>,
    pub response_handler: Arc<dyn ResponseHandler>,
}

/// Queues allocated and loops constructed, nothing spawned yet
struct PreparedPipeline {
    inbound: InboundLoop,
    pool: ResolverPool,
    resolved: OutboundLoop<Vec<EventResolutionResult>>,
    failed: OutboundLoop<FailedEvent>,
}

struct RunningPipeline {
    inbound: JoinHandle<()>,
    resolvers: Vec<JoinHandle<()>>,
    outbound: Vec<(&'static str, JoinHandle<()>)>,
}

impl RunningPipeline {
    fn abort(self) -> usize {
        let mut aborted = 0;
        let handles = std::iter::once(&self.inbound)
            .chain(self.resolvers.iter())
            .chain(self.outbound.iter().map(|(_, handle)| handle));
        for handle in handles {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        aborted
    }
}

/// Owns the queues and tasks of the resolution pipeline
///
/// Phases run in order: `initialize` allocates queues and builds the loops,
/// `start` spawns them, `stop` closes the inbound side and waits for every
/// stage to drain, `terminate` aborts whatever is left. Repeating the phase
/// already reached is a no-op.
///
/// Shutdown is cooperative. Stopping ends the inbound loop, whose queue then
/// closes; resolvers drain it and drop their outbound senders, and the
/// outbound loops drain in turn.
pub struct PipelineSupervisor {
    config: PipelineConfig,
    state: PipelineState,
    components: Option<PipelineComponents>,
    prepared: Option<PreparedPipeline>,
    running: Option<RunningPipeline>,
    shutdown: CancellationToken,
    source_finished: CancellationToken,
}

impl PipelineSupervisor {
    pub fn new(config: PipelineConfig, components: PipelineComponents) -> Self {
        Self {
            config,
            state: PipelineState::Created,
            components: Some(components),
            prepared: None,
            running: None,
            shutdown: CancellationToken::new(),
            source_finished: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn transition_error(&self, to: PipelineState) -> PipelineError {
        PipelineError::InvalidTransition {
            from: self.state,
            to,
        }
    }

    /// Allocate queues and construct every loop without starting them
    pub fn initialize(&mut self) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Initialized => return Ok(()),
            PipelineState::Created => {}
            _ => return Err(self.transition_error(PipelineState::Initialized)),
        }

        self.config.validate()?;
        let Some(components) = self.components.take() else {
            return Err(self.transition_error(PipelineState::Initialized));
        };

        let (inbound_tx, inbound_rx) = shared_channel(self.config.inbound_capacity);
        let (resolved_tx, resolved_rx) = mpsc::channel(self.config.resolved_capacity);
        let (failed_tx, failed_rx) = mpsc::channel(self.config.failed_capacity);

        let resolver = Arc::new(EventResolver::new(
            components.device_management,
            Arc::clone(&components.codec),
        ));

        let inbound = InboundLoop::new(
            components.source,
            inbound_tx,
            Arc::clone(&components.response_handler),
            self.config.read_error_backoff,
        );
        let pool = ResolverPool::new(
            self.config.pool_size,
            &self.config.service_name,
            resolver,
            inbound_rx,
            resolved_tx,
            failed_tx,
            components.invalid_sink,
        );
        let resolved = OutboundLoop::new(
            "resolved",
            resolved_rx,
            Arc::clone(&components.codec),
            components.resolved_writer,
            Arc::clone(&components.response_handler),
        );
        let failed = OutboundLoop::new(
            "failed",
            failed_rx,
            components.codec,
            components.failed_writer,
            components.response_handler,
        );

        self.prepared = Some(PreparedPipeline {
            inbound,
            pool,
            resolved,
            failed,
        });
        self.state = PipelineState::Initialized;

        info!(
            pool_size = self.config.pool_size,
            inbound_capacity = self.config.inbound_capacity,
            resolved_capacity = self.config.resolved_capacity,
            failed_capacity = self.config.failed_capacity,
            "Pipeline initialized"
        );
        Ok(())
    }

    /// Spawn the inbound loop, the resolver pool and both outbound loops
    pub fn start(&mut self) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Started => return Ok(()),
            PipelineState::Initialized => {}
            _ => return Err(self.transition_error(PipelineState::Started)),
        }
        let Some(PreparedPipeline {
            inbound,
            pool,
            resolved,
            failed,
        }) = self.prepared.take()
        else {
            return Err(self.transition_error(PipelineState::Started));
        };

        let shutdown = self.shutdown.clone();
        let source_finished = self.source_finished.clone();
        let inbound = tokio::spawn(
            async move {
                inbound.run(shutdown).await;
                source_finished.cancel();
            }
            .instrument(tracing::info_span!("inbound_loop")),
        );
        let resolvers = pool.spawn();
        let outbound = vec![
            (
                "resolved",
                tokio::spawn(
                    resolved
                        .run()
                        .instrument(tracing::info_span!("outbound_loop", stream = "resolved")),
                ),
            ),
            (
                "failed",
                tokio::spawn(
                    failed
                        .run()
                        .instrument(tracing::info_span!("outbound_loop", stream = "failed")),
                ),
            ),
        ];

        self.running = Some(RunningPipeline {
            inbound,
            resolvers,
            outbound,
        });
        self.state = PipelineState::Started;

        info!("Pipeline started");
        Ok(())
    }

    /// Resolves once the inbound loop has exited, for example because the
    /// source reached end of stream. Returns immediately unless started.
    pub async fn wait_for_completion(&self) {
        if self.state != PipelineState::Started {
            return;
        }
        self.source_finished.cancelled().await;
    }

    /// Stop reading and wait for every stage to drain
    ///
    /// Messages already enqueued are processed and written before this
    /// returns. The first task that panicked is reported as `TaskFailed`.
    pub async fn stop(&mut self) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Stopped => return Ok(()),
            PipelineState::Started => {}
            PipelineState::Initialized => {
                // Dropping the unstarted loops releases every queue
                self.prepared = None;
                self.state = PipelineState::Stopped;
                info!("Pipeline stopped before start");
                return Ok(());
            }
            _ => return Err(self.transition_error(PipelineState::Stopped)),
        }

        info!("Stopping pipeline");
        self.shutdown.cancel();

        let mut first_error = None;
        if let Some(running) = self.running.as_mut() {
            record_join("inbound_loop", (&mut running.inbound).await, &mut first_error);
            for (id, handle) in running.resolvers.iter_mut().enumerate() {
                record_join(&format!("resolver_{}", id), handle.await, &mut first_error);
            }
            for (stream, handle) in running.outbound.iter_mut() {
                record_join(&format!("outbound_{}", stream), handle.await, &mut first_error);
            }
        }
        self.running = None;
        self.state = PipelineState::Stopped;

        match first_error {
            Some(err) => Err(err),
            None => {
                info!("Pipeline stopped and drained");
                Ok(())
            }
        }
    }

    /// Abort anything still running and release every queue; always safe
    pub fn terminate(&mut self) {
        if self.state == PipelineState::Terminated {
            return;
        }

        self.shutdown.cancel();
        if let Some(running) = self.running.take() {
            let aborted = running.abort();
            if aborted > 0 {
                warn!(aborted, "Aborted pipeline tasks that had not drained");
            }
        }
        self.prepared = None;
        self.components = None;
        self.state = PipelineState::Terminated;
        info!("Pipeline terminated");
    }

    /// Adapt the supervisor into a runner process
    ///
    /// Runs until the runner cancels or the source ends, then stops and
    /// terminates the pipeline.
    pub fn into_runner_process(mut self) -> runner::AppProcess {
        Box::new(move |ctx: CancellationToken| -> runner::ProcessFuture {
            Box::pin(async move {
                self.initialize()?;
                self.start()?;

                let source_finished = self.source_finished.clone();
                tokio::select! {
                    _ = ctx.cancelled() => info!("Shutdown requested, stopping pipeline"),
                    _ = source_finished.cancelled() => {
                        info!("Message source finished, stopping pipeline")
                    }
                }

                let stopped = self.stop().await;
                self.terminate();
                stopped.map_err(anyhow::Error::from)
            })
        })
    }
}

impl Drop for PipelineSupervisor {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.abort();
        }
    }
}

fn record_join(
    task: &str,
    result: Result<(), tokio::task::JoinError>,
    first_error: &mut Option<PipelineError>,
) {
    if let Err(e) = result {
        error!(task = %task, error = %e, "Pipeline task failed");
        if first_error.is_none() {
            *first_error = Some(PipelineError::TaskFailed {
                task: task.to_string(),
                message: e.to_string(),
            });
        }
    }
}
