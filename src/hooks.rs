//! Post-creation hooks, fed by the event bus.
//!
//! Each hook is error-isolated: a failing hook is logged and reported in
//! its `HookResult`, never propagated back to the record flow that
//! emitted the event.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::CrmEvent;
use crate::gateway::RecordGateway;

/// Result from a single hook.
#[derive(Debug, Clone, PartialEq)]
pub struct HookResult {
    pub hook_name: &'static str,
    pub success: bool,
    pub message: Option<String>,
}

/// Sends the welcome email for a new contact through a server function.
pub struct WelcomeMailer {
    gateway: Arc<dyn RecordGateway>,
    function: Option<String>,
}

impl WelcomeMailer {
    pub fn new(gateway: Arc<dyn RecordGateway>, function: Option<String>) -> Self {
        Self { gateway, function }
    }

    pub async fn handle(&self, event: &CrmEvent) -> HookResult {
        let CrmEvent::ContactCreated {
            id,
            first_name,
            last_name,
            email,
        } = event;

        let Some(function) = self.function.as_deref().filter(|f| !f.trim().is_empty()) else {
            return HookResult {
                hook_name: "welcome_email",
                success: true,
                message: Some("No welcome email function configured".to_string()),
            };
        };

        log::debug!("welcome_email: contact {} via {}", id, function);
        let payload = json!({
            "firstName": first_name,
            "lastName": last_name,
            "email": email,
        });

        match self.gateway.invoke_function(function, payload).await {
            Ok(_) => HookResult {
                hook_name: "welcome_email",
                success: true,
                message: Some(format!("Welcome email sent to {}", email)),
            },
            Err(e) => {
                log::info!("Welcome email for contact {} failed: {}", id, e);
                HookResult {
                    hook_name: "welcome_email",
                    success: false,
                    message: Some(e.to_string()),
                }
            }
        }
    }
}

/// Run every post-create hook for one event.
pub async fn run_post_create_hooks(mailer: &WelcomeMailer, event: &CrmEvent) -> Vec<HookResult> {
    vec![mailer.handle(event).await]
}

/// Consume events until the bus is dropped.
pub fn spawn_hook_consumer(
    mut receiver: mpsc::Receiver<CrmEvent>,
    mailer: WelcomeMailer,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut handled = 0;
        while let Some(event) = receiver.recv().await {
            for result in run_post_create_hooks(&mailer, &event).await {
                if !result.success {
                    log::debug!(
                        "Hook {} did not succeed: {}",
                        result.hook_name,
                        result.message.as_deref().unwrap_or("")
                    );
                }
            }
            handled += 1;
        }
        handled
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::gateway::memory::{MemoryGateway, Op};

    fn event() -> CrmEvent {
        CrmEvent::ContactCreated {
            id: 3,
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@navy.mil".into(),
        }
    }

    #[tokio::test]
    async fn test_welcome_email_payload() {
        let gw = Arc::new(MemoryGateway::new());
        let mailer = WelcomeMailer::new(gw.clone(), Some("send-welcome".into()));
        let result = mailer.handle(&event()).await;
        assert!(result.success);

        let calls = gw.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.as_deref(), Some("send-welcome"));
        let payload = calls[0].fields.clone().unwrap();
        assert_eq!(payload["firstName"], "Grace");
        assert_eq!(payload["lastName"], "Hopper");
        assert_eq!(payload["email"], "grace@navy.mil");
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_raised() {
        let gw = Arc::new(MemoryGateway::new());
        gw.fail_functions();
        let mailer = WelcomeMailer::new(gw.clone(), Some("send-welcome".into()));
        let result = mailer.handle(&event()).await;
        assert!(!result.success);
        assert!(result.message.unwrap().contains("simulated"));
    }

    #[tokio::test]
    async fn test_unconfigured_skips_call() {
        let gw = Arc::new(MemoryGateway::new());
        let mailer = WelcomeMailer::new(gw.clone(), None);
        assert!(mailer.handle(&event()).await.success);
        assert_eq!(gw.count(Op::Invoke), 0);
    }

    #[tokio::test]
    async fn test_consumer_drains_until_bus_dropped() {
        let gw = Arc::new(MemoryGateway::new());
        let (bus, rx) = EventBus::new();
        let handle = spawn_hook_consumer(rx, WelcomeMailer::new(gw.clone(), Some("f".into())));
        bus.emit(event());
        bus.emit(event());
        drop(bus);
        assert_eq!(handle.await.unwrap(), 2);
        assert_eq!(gw.count(Op::Invoke), 2);
    }
}
