use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use chatbridge_core_types::{ActionContext, TriggerSource};
use chatbridge_readiness::ReadinessGate;
use chatbridge_vendor_bus::BusCommand;

use crate::errors::DispatchError;
use crate::model::{DispatchReport, RouteCategories};
use crate::policy::DispatchPolicy;
use crate::ports::NavigationPort;
use crate::runner::{execute, RunnerDeps};

/// Issues vendor-bus commands once the readiness gate allows them.
pub struct Dispatcher {
    policy: DispatchPolicy,
    routes: RouteCategories,
    gate: Arc<ReadinessGate>,
    nav: Arc<dyn NavigationPort>,
    cancel: CancellationToken,
}

pub struct DispatcherBuilder {
    policy: DispatchPolicy,
    routes: RouteCategories,
    gate: Option<Arc<ReadinessGate>>,
    nav: Option<Arc<dyn NavigationPort>>,
    cancel: CancellationToken,
}

impl DispatcherBuilder {
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            policy,
            routes: RouteCategories::default(),
            gate: None,
            nav: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_routes(mut self, routes: RouteCategories) -> Self {
        self.routes = routes;
        self
    }

    pub fn with_gate(mut self, gate: Arc<ReadinessGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_nav(mut self, nav: Arc<dyn NavigationPort>) -> Self {
        self.nav = Some(nav);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn build(self) -> Arc<Dispatcher> {
        Arc::new(Dispatcher {
            policy: self.policy,
            routes: self.routes,
            gate: self.gate.expect("readiness gate is required"),
            nav: self.nav.expect("navigation port is required"),
            cancel: self.cancel,
        })
    }
}

impl Dispatcher {
    /// Trigger the primary action. Deferred with backoff until the
    /// integration is ready; terminal failures surface in the result, never
    /// as panics.
    pub async fn trigger(
        &self,
        source: TriggerSource,
        context: ActionContext,
    ) -> Result<DispatchReport, DispatchError> {
        execute(
            source,
            context,
            RunnerDeps {
                gate: self.gate.as_ref(),
                nav: self.nav.as_ref(),
                policy: &self.policy,
                routes: &self.routes,
                cancel: &self.cancel,
            },
        )
        .await
    }

    /// Push form data into the vendor's conversation context and record the
    /// submission. The record command is best-effort.
    pub async fn send_form_context(
        &self,
        form_type: &str,
        form: &ActionContext,
    ) -> Result<(), DispatchError> {
        let bus = self.gate.bus().await?;

        let mut attributes = ActionContext::new().with("formType", form_type);
        attributes.merge(form);
        attributes.insert("submissionTime", Utc::now().to_rfc3339());
        bus.command(BusCommand::SetDatabase { attributes })
            .await
            .map_err(DispatchError::CommandEmission)?;

        let record = BusCommand::RecordEvent {
            event_name: "form-submitted".to_string(),
            attributes: ActionContext::new()
                .with("formType", form_type)
                .with("page", self.nav.current_path())
                .with("success", true),
        };
        if let Err(err) = bus.command(record).await {
            warn!(form_type, error = %err, "form telemetry failed; continuing");
        }
        Ok(())
    }

    /// Open the widget with form context attached (form-assistance flows).
    pub async fn open_with_form(
        &self,
        form_type: &str,
        form: ActionContext,
    ) -> Result<DispatchReport, DispatchError> {
        let mut context = ActionContext::new()
            .with("formType", form_type)
            .with("needsHelp", true);
        context.merge(&form);
        self.trigger(TriggerSource::FormAssistance, context).await
    }

    /// Report the current page to the vendor's journey tracking.
    /// Best-effort: emission failures are logged, never surfaced.
    pub async fn record_pageview(&self) -> Result<(), DispatchError> {
        let bus = self.gate.bus().await?;
        let path = self.nav.current_path();
        let route = self.routes.classify(&path);
        let pageview = BusCommand::Pageview {
            page_title: self.nav.page_title(),
            page_url: path.clone(),
            attributes: ActionContext::new()
                .with("category", route.category)
                .with("intent", route.intent),
        };
        if let Err(err) = bus.command(pageview).await {
            warn!(page = %path, error = %err, "pageview telemetry failed; continuing");
        }
        Ok(())
    }

    /// Close the widget. Best-effort like the other secondary commands.
    pub async fn close(&self) -> Result<(), DispatchError> {
        let bus = self.gate.bus().await?;
        bus.command(BusCommand::CloseMessenger)
            .await
            .map_err(DispatchError::CommandEmission)
    }
}
