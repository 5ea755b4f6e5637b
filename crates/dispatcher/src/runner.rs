use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use chatbridge_core_types::{ActionContext, Capability, TriggerId, TriggerSource};
use chatbridge_readiness::ReadinessGate;
use chatbridge_vendor_bus::{BusCommand, VendorBus};

use crate::errors::DispatchError;
use crate::model::{merged_context, DispatchReport, RouteCategories};
use crate::policy::DispatchPolicy;
use crate::ports::NavigationPort;

pub(crate) struct RunnerDeps<'a> {
    pub gate: &'a ReadinessGate,
    pub nav: &'a dyn NavigationPort,
    pub policy: &'a DispatchPolicy,
    pub routes: &'a RouteCategories,
    pub cancel: &'a CancellationToken,
}

/// The primary action: defer until ready, then emit context-set and open in
/// strict order with the settle delay between them, then best-effort
/// telemetry. Each invocation revalidates readiness and emits its own
/// command pair, so rapid repeat calls are safe.
pub(crate) async fn execute(
    source: TriggerSource,
    caller_context: ActionContext,
    deps: RunnerDeps<'_>,
) -> Result<DispatchReport, DispatchError> {
    let trigger_id = TriggerId::new();
    let mut attempts = 0u32;

    // Retry-until-precondition: a scheduled re-check, never recursion. The
    // flag is re-read on every pass, including after emission retries.
    while !deps.gate.integration_ready() {
        attempts += 1;
        if attempts >= deps.policy.max_attempts {
            warn!(%trigger_id, attempts, "integration never became ready; dropping trigger");
            return Err(DispatchError::NeverReady { attempts });
        }
        debug!(%trigger_id, attempts, "integration not ready; deferring trigger");
        tokio::select! {
            _ = deps.cancel.cancelled() => {
                info!(%trigger_id, "trigger cancelled while deferred");
                return Err(DispatchError::Cancelled);
            }
            _ = sleep(deps.policy.backoff()) => {}
        }
    }

    let bus = deps.gate.bus().await?;
    let merged = merged_context(deps.nav, deps.routes, &source, &caller_context);

    let opened_via_launcher = loop {
        match emit_primary_pair(bus.as_ref(), &merged, &deps).await {
            Ok(via_launcher) => break via_launcher,
            Err(err) => {
                attempts += 1;
                if attempts >= deps.policy.max_attempts {
                    error!(%trigger_id, attempts, error = %err, "primary emission exhausted retries");
                    return Err(DispatchError::CommandEmission(err));
                }
                warn!(%trigger_id, attempts, error = %err, "primary emission failed; backing off");
                tokio::select! {
                    _ = deps.cancel.cancelled() => {
                        info!(%trigger_id, "trigger cancelled during emission backoff");
                        return Err(DispatchError::Cancelled);
                    }
                    _ = sleep(deps.policy.backoff()) => {}
                }
            }
        }
    };

    let mut commands_emitted = 2u32;
    let route = deps.routes.classify(&deps.nav.current_path());
    let telemetry = BusCommand::RecordEvent {
        event_name: "messenger-triggered".to_string(),
        attributes: ActionContext::new()
            .with("trigger", source.label())
            .with("page", deps.nav.current_path())
            .with("category", route.category),
    };
    match bus.command(telemetry).await {
        Ok(()) => commands_emitted += 1,
        // Best-effort: a failed record must never block the open.
        Err(err) => warn!(%trigger_id, error = %err, "trigger telemetry failed; continuing"),
    }

    Ok(DispatchReport {
        trigger_id,
        attempts,
        opened_via_launcher,
        commands_emitted,
    })
}

/// Context-set strictly precedes open; the settle delay between them is the
/// vendor ordering workaround and must not be elided.
async fn emit_primary_pair(
    bus: &dyn VendorBus,
    merged: &ActionContext,
    deps: &RunnerDeps<'_>,
) -> Result<bool, chatbridge_core_types::BridgeError> {
    bus.command(BusCommand::SetDatabase {
        attributes: merged.clone(),
    })
    .await?;

    sleep(deps.policy.settle_delay()).await;

    let via_launcher = deps.policy.open_via_launcher
        && deps.gate.state().is_set(Capability::LauncherReady);
    let open = if via_launcher {
        BusCommand::OpenLauncher
    } else {
        BusCommand::OpenMessenger
    };
    bus.command(open).await?;
    Ok(via_launcher)
}
