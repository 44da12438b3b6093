//! Cross-module integration tests exercising the public facade exactly
//! as a host application would: build a `TransactionManager` via
//! `Tyloo::build`, wrap it with `CompensableInterceptor`, and drive it
//! through the root/provider scenarios from the spec.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use tyloo::prelude::*;

#[derive(Clone, Default)]
struct RecordingInvoker {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingInvoker {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ParticipantInvoker for RecordingInvoker {
    async fn invoke(&self, descriptor: &InvocationDescriptor) -> Result<(), String> {
        self.calls.lock().push(descriptor.method.clone());
        Ok(())
    }
}

fn annotation() -> CompensableAnnotation {
    CompensableAnnotation::builder("confirmDebit", "cancelDebit").build()
}

// S1 — happy root: begin, enlist, commit deletes the record.
#[tokio::test]
async fn happy_root_round_trip_through_the_facade() {
    let invoker = RecordingInvoker::default();
    let manager = Tyloo::build(
        Arc::new(InMemoryRepository::new()),
        Arc::new(invoker.clone()),
    );
    let interceptor = CompensableInterceptor::new(&manager);
    let ann = annotation();

    let result: Result<i32, anyhow::Error> = enter_chain(async {
        interceptor
            .root_method_proceed(&ann, None, || async {
                let xid = manager.current_transaction().unwrap().xid;
                manager
                    .enlist_participant(Participant::new(
                        xid,
                        Uuid::new_v4(),
                        InvocationDescriptor::new(
                            "acct-svc",
                            "confirmDebit",
                            serde_json::json!({"amount": 50}),
                        ),
                        InvocationDescriptor::new(
                            "acct-svc",
                            "cancelDebit",
                            serde_json::json!({"amount": 50}),
                        ),
                    ))
                    .await
                    .unwrap();
                Ok(50)
            })
            .await
    })
    .await;

    assert_eq!(result.unwrap(), 50);
    assert_eq!(invoker.calls(), vec!["confirmDebit"]);
    assert!(!manager.is_transaction_active());
}

// S4 + S5 — a provider branch opened under TRYING and later driven to
// CONFIRMING by a second, independent call chain sharing the same xid.
#[tokio::test]
async fn provider_branch_confirms_across_two_call_chains() {
    let invoker = RecordingInvoker::default();
    let manager = Tyloo::build(
        Arc::new(InMemoryRepository::new()),
        Arc::new(invoker.clone()),
    );
    let interceptor = CompensableInterceptor::new(&manager);
    let ann = annotation();

    let xid = Uuid::new_v4();
    let branch_id = Uuid::new_v4();
    let trying_ctx = Context::new(xid, branch_id, TxStatus::Trying);

    enter_chain(async {
        interceptor
            .provider_method_proceed::<i32, _, _>(&ann, &trying_ctx, || async {
                let tx_xid = manager.current_transaction().unwrap().xid;
                manager
                    .enlist_participant(Participant::new(
                        tx_xid,
                        branch_id,
                        InvocationDescriptor::new(
                            "inventory-svc",
                            "confirmReserve",
                            serde_json::Value::Null,
                        ),
                        InvocationDescriptor::new(
                            "inventory-svc",
                            "cancelReserve",
                            serde_json::Value::Null,
                        ),
                    ))
                    .await
                    .unwrap();
                Ok(0)
            })
            .await
    })
    .await
    .unwrap();

    let confirming_ctx = Context::new(xid, branch_id, TxStatus::Confirming);
    let result: Result<i32, anyhow::Error> = enter_chain(async {
        interceptor
            .provider_method_proceed(&ann, &confirming_ctx, || async { Ok(0) })
            .await
    })
    .await;

    assert_eq!(result.unwrap(), 0);
    assert_eq!(invoker.calls(), vec!["confirmReserve"]);

    // S6 — a retried delivery of the same confirm finds the branch
    // already terminated and swallows it silently.
    let result_again: Result<i32, anyhow::Error> = enter_chain(async {
        interceptor
            .provider_method_proceed(&ann, &confirming_ctx, || async { Ok(0) })
            .await
    })
    .await;
    assert_eq!(result_again.unwrap(), 0);
    assert_eq!(invoker.calls(), vec!["confirmReserve"], "double delivery must not re-invoke confirm");
}

// Abandoned TRYING transactions are picked up by a one-shot recovery
// pass and driven to CANCELLING once their grace period has elapsed.
#[tokio::test]
async fn recovery_cancels_an_abandoned_root() {
    let invoker = RecordingInvoker::default();
    let repository = Arc::new(InMemoryRepository::new());
    let manager = Tyloo::build(repository.clone(), Arc::new(invoker.clone()));

    enter_chain(async {
        let tx = manager.begin(None).await.unwrap();
        manager
            .enlist_participant(Participant::new(
                tx.xid,
                Uuid::new_v4(),
                InvocationDescriptor::new("acct-svc", "confirmDebit", serde_json::Value::Null),
                InvocationDescriptor::new("acct-svc", "cancelDebit", serde_json::Value::Null),
            ))
            .await
            .unwrap();
        // Deliberately never commits or rolls back, then cleans up the
        // stack as the call chain would on an uncaught panic.
        manager
            .clean_after_completion(&manager.current_transaction().unwrap())
            .unwrap();
    })
    .await;

    let config = RecoveryConfig {
        trying_timeout: chrono::Duration::seconds(-1),
        ..RecoveryConfig::default()
    };
    let results = scan_and_recover(repository.as_ref(), &invoker, &config).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_ref().unwrap(), &RecoveryOutcome::Cancelled);
    assert_eq!(invoker.calls(), vec!["cancelDebit"]);
}
