use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chatbridge_binder::{EnhancementBinder, PageSurface, TriggerSink};
use chatbridge_core_types::{ActionContext, Capability, TriggerSource};
use chatbridge_dispatcher::{
    DispatchPolicy, Dispatcher, DispatcherBuilder, NavigationPort, RouteCategories,
};
use chatbridge_readiness::{ReadinessGate, StatusSnapshot};
use chatbridge_vendor_bus::{BusCommand, BusEvent, BusLoader, DeploymentConfig};

use crate::config::AppConfig;
use crate::errors::IntegrationError;

/// Delivers bound clicks to the dispatcher. Failures are logged here and
/// never travel back to the click site.
struct DispatcherSink {
    dispatcher: Arc<Dispatcher>,
}

#[async_trait]
impl TriggerSink for DispatcherSink {
    async fn trigger(&self, source: TriggerSource, context: ActionContext) {
        match self.dispatcher.trigger(source, context).await {
            Ok(report) => debug!(
                trigger = %report.trigger_id,
                attempts = report.attempts,
                "bound click dispatched"
            ),
            Err(err) => warn!(error = %err, "bound click failed"),
        }
    }
}

/// The caller-facing integration: bootstraps the gate, enhances the page,
/// and exposes trigger/status/form operations.
pub struct Integration {
    deployment: DeploymentConfig,
    gate: Arc<ReadinessGate>,
    dispatcher: Arc<Dispatcher>,
    binder: EnhancementBinder,
    page: Arc<dyn PageSurface>,
    cancel: CancellationToken,
    telemetry: Mutex<Option<JoinHandle<()>>>,
}

impl Integration {
    pub fn new(
        config: AppConfig,
        loader: Arc<dyn BusLoader>,
        nav: Arc<dyn NavigationPort>,
        page: Arc<dyn PageSurface>,
    ) -> Arc<Self> {
        let AppConfig {
            deployment,
            gate,
            dispatch,
            bind,
            routes,
            ..
        } = config;
        let cancel = CancellationToken::new();
        let gate = Arc::new(ReadinessGate::new(loader, gate, cancel.child_token()));
        let dispatcher = Self::build_dispatcher(dispatch, routes, &gate, nav, &cancel);
        let binder = EnhancementBinder::new(
            bind,
            Arc::new(DispatcherSink {
                dispatcher: Arc::clone(&dispatcher),
            }),
        );
        Arc::new(Self {
            deployment,
            gate,
            dispatcher,
            binder,
            page,
            cancel,
            telemetry: Mutex::new(None),
        })
    }

    fn build_dispatcher(
        policy: DispatchPolicy,
        routes: RouteCategories,
        gate: &Arc<ReadinessGate>,
        nav: Arc<dyn NavigationPort>,
        cancel: &CancellationToken,
    ) -> Arc<Dispatcher> {
        DispatcherBuilder::new(policy)
            .with_routes(routes)
            .with_gate(Arc::clone(gate))
            .with_nav(nav)
            .with_cancel(cancel.child_token())
            .build()
    }

    /// Bootstrap: wait for the messenger and journey capabilities, wire
    /// telemetry, enhance the page once, and latch the ready flag.
    pub async fn init(&self) -> Result<(), IntegrationError> {
        info!(
            environment = %self.deployment.environment,
            deployment = %self.deployment.deployment_id,
            "initializing messenger integration"
        );

        self.gate
            .await_ready(&[Capability::MessengerReady, Capability::JourneyReady])
            .await?;

        self.spawn_telemetry().await?;
        let bound = self.binder.bind_all(self.page.as_ref());
        self.gate.mark_integration_ready();

        // Landing pageview, now that journey tracking is up.
        self.dispatcher.record_pageview().await?;

        info!(bound, "messenger integration ready");
        Ok(())
    }

    /// Forward widget lifecycle events into journey records. Best-effort:
    /// a failed record is logged and the pump keeps running.
    async fn spawn_telemetry(&self) -> Result<(), IntegrationError> {
        if self.telemetry.lock().is_some() {
            return Ok(());
        }
        // Already resolved by init's await_ready, so this does not poll.
        let bus = self.gate.bus().await?;
        let mut guard = self.telemetry.lock();
        if guard.is_some() {
            return Ok(());
        }

        let mut events = bus.subscribe();
        let emitter = Arc::clone(&bus);
        let cancel = self.cancel.clone();
        *guard = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(BusEvent::MessengerOpened) => {
                            let record = BusCommand::RecordEvent {
                                event_name: "messenger-opened".to_string(),
                                attributes: ActionContext::new(),
                            };
                            if let Err(err) = emitter.command(record).await {
                                warn!(error = %err, "messenger-opened record failed");
                            }
                        }
                        Ok(BusEvent::ConversationStarted { conversation_id }) => {
                            let record = BusCommand::RecordEvent {
                                event_name: "conversation-started".to_string(),
                                attributes: ActionContext::new()
                                    .with("conversationId", conversation_id),
                            };
                            if let Err(err) = emitter.command(record).await {
                                warn!(error = %err, "conversation-started record failed");
                            }
                        }
                        Ok(BusEvent::MessengerClosed) => {
                            debug!("messenger closed");
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "telemetry pump lagged behind vendor events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }));
        Ok(())
    }

    /// Trigger the primary action with caller-supplied context.
    pub async fn trigger(&self, context: ActionContext) -> Result<(), IntegrationError> {
        self.dispatcher
            .trigger(TriggerSource::Manual, context)
            .await?;
        Ok(())
    }

    /// Re-scan the page, binding only elements not yet enhanced.
    pub fn bind_all(&self) -> usize {
        self.binder.bind_all(self.page.as_ref())
    }

    /// Diagnostics snapshot: bus presence, integration latch, capabilities.
    pub fn status(&self) -> StatusSnapshot {
        self.gate.status()
    }

    pub async fn send_form_context(
        &self,
        form_type: &str,
        form: &ActionContext,
    ) -> Result<(), IntegrationError> {
        self.dispatcher.send_form_context(form_type, form).await?;
        Ok(())
    }

    pub async fn open_with_form(
        &self,
        form_type: &str,
        form: ActionContext,
    ) -> Result<(), IntegrationError> {
        self.dispatcher.open_with_form(form_type, form).await?;
        Ok(())
    }

    pub async fn record_pageview(&self) -> Result<(), IntegrationError> {
        self.dispatcher.record_pageview().await?;
        Ok(())
    }

    pub async fn close(&self) -> Result<(), IntegrationError> {
        self.dispatcher.close().await?;
        Ok(())
    }

    /// Cancel pending polls, retries, and the telemetry pump.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.telemetry.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for Integration {
    fn drop(&mut self) {
        self.shutdown();
    }
}
