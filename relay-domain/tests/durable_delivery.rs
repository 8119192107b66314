use chrono::{Duration as ChronoDuration, Utc};
use relay_domain::transport::durable::{
    DurableSendOptions, IdFn, InMemoryEngine, InProcessSteps, NO_REGISTERED_CONSUMER, Trigger,
};
use relay_domain::transport::DurableEventConfig;
use relay_domain::{
    DispatchError, EventRegistry, EventService, PayloadDefinition, SendOptions, TransportRegistry,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

fn durable_service(event: &str, config: DurableEventConfig) -> (Arc<InMemoryEngine>, EventService) {
    let mut transport_registry = TransportRegistry::new();
    transport_registry.configure_event_transport(event, config);
    let engine = Arc::new(InMemoryEngine::new());
    let service = EventService::builder()
        .event_registry(EventRegistry::new().register_event(event, PayloadDefinition::new()))
        .transport_registry(transport_registry)
        .engine(engine.clone())
        .build();
    (engine, service)
}

#[tokio::test(start_paused = true)]
async fn delayed_event_is_consumed_after_the_delay() {
    let (engine, service) = durable_service("DELAYED", DurableEventConfig::default());
    let consumed = Arc::new(AtomicUsize::new(0));
    {
        let consumed = consumed.clone();
        service.subscribe("DELAYED", move |_payload| {
            let consumed = consumed.clone();
            async move {
                consumed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
    }

    let options = SendOptions::new().durable(DurableSendOptions::builder().delay("10s").build());
    let result = service.send("DELAYED", json!({"n": 1}), Some(&options)).await;
    assert!(result.is_delivered());
    assert_eq!(consumed.load(Ordering::SeqCst), 0);

    let sent = engine.sent();
    assert_eq!(
        serde_json::to_value(&sent[0].data).unwrap(),
        json!({"payload": {"n": 1}, "options": {"delay": "10s"}})
    );

    let started = Instant::now();
    let transport = service.durable_transport().unwrap();
    let records = engine.run_pending(transport, &InProcessSteps).await;

    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].function_id, "DELAYED-function");
    assert!(records[0].outcome.as_ref().unwrap().success);
    assert_eq!(consumed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn millisecond_delay_string_is_honoured_and_garbage_is_rejected_at_send() {
    let (engine, service) =
        durable_service("MILLIS", DurableEventConfig::builder().retries(2).build());
    let consumed = Arc::new(AtomicUsize::new(0));
    {
        let consumed = consumed.clone();
        service.subscribe("MILLIS", move |_payload| {
            let consumed = consumed.clone();
            async move {
                consumed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
    }

    let options = SendOptions::new().durable(DurableSendOptions::builder().delay("5000").build());
    assert!(service.send("MILLIS", json!({}), Some(&options)).await.is_delivered());

    let started = Instant::now();
    let records = engine
        .run_pending(service.durable_transport().unwrap(), &InProcessSteps)
        .await;
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(records[0].attempts, 1);
    assert!(records[0].outcome.as_ref().unwrap().success);
    assert_eq!(consumed.load(Ordering::SeqCst), 1);

    let options = SendOptions::new().durable(DurableSendOptions::builder().delay("soon").build());
    let result = service.send("MILLIS", json!({}), Some(&options)).await;
    let failures: Vec<_> = result.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0].1, DispatchError::InvalidDelay { .. }));
    assert_eq!(engine.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn start_time_suspends_until_the_given_instant() {
    let (engine, service) = durable_service("SCHEDULED", DurableEventConfig::default());
    service.subscribe("SCHEDULED", |_payload| async { Ok(()) });

    let start = Utc::now() + ChronoDuration::hours(1);
    let options =
        SendOptions::new().durable(DurableSendOptions::builder().start_time(start).build());
    service.send("SCHEDULED", json!({}), Some(&options)).await;

    let started = Instant::now();
    let records = engine
        .run_pending(service.durable_transport().unwrap(), &InProcessSteps)
        .await;

    assert!(started.elapsed() >= Duration::from_secs(59 * 60));
    assert!(records[0].outcome.is_ok());
}

#[tokio::test]
async fn failing_consumer_is_retried_up_to_the_configured_limit() {
    let (engine, service) =
        durable_service("FLAKY", DurableEventConfig::builder().retries(3).build());
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = calls.clone();
        service.subscribe("FLAKY", move |_payload| {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(anyhow::anyhow!("transient"))
                } else {
                    Ok(())
                }
            }
        });
    }

    service.send("FLAKY", json!({}), None).await;
    let records = engine
        .run_pending(service.durable_transport().unwrap(), &InProcessSteps)
        .await;

    assert_eq!(records[0].attempts, 3);
    assert!(records[0].outcome.is_ok());
}

#[tokio::test]
async fn retries_are_exhausted_for_a_consumer_that_always_fails() {
    let (engine, service) =
        durable_service("BROKEN", DurableEventConfig::builder().retries(1).build());
    service.subscribe("BROKEN", |_payload| async {
        Err::<(), _>(anyhow::anyhow!("permanent"))
    });

    service.send("BROKEN", json!({}), None).await;
    let records = engine
        .run_pending(service.durable_transport().unwrap(), &InProcessSteps)
        .await;

    assert_eq!(records[0].attempts, 2);
    assert!(matches!(
        records[0].outcome,
        Err(DispatchError::ConsumerFailed { .. })
    ));
}

#[tokio::test]
async fn invocation_without_consumers_is_reported_not_retried() {
    let (engine, service) =
        durable_service("ORPHAN", DurableEventConfig::builder().retries(5).build());

    service.send("ORPHAN", json!({}), None).await;
    let records = engine
        .run_pending(service.durable_transport().unwrap(), &InProcessSteps)
        .await;

    assert_eq!(records[0].attempts, 1);
    let report = records[0].outcome.as_ref().unwrap();
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some(NO_REGISTERED_CONSUMER));
}

#[tokio::test]
async fn idempotency_id_deduplicates_repeated_sends() {
    let (engine, service) = durable_service(
        "UPLOAD",
        DurableEventConfig::builder().id(IdFn::field("uri")).build(),
    );

    let first = service.send("UPLOAD", json!({"uri": "gs://a"}), None).await;
    let second = service.send("UPLOAD", json!({"uri": "gs://a"}), None).await;

    assert_eq!(first.durable().unwrap().ids, vec!["gs://a".to_string()]);
    assert_eq!(second.durable(), first.durable());
    assert_eq!(engine.sent().len(), 1);
    assert_eq!(engine.sent()[0].id.as_deref(), Some("gs://a"));
}

#[test]
fn cron_adds_a_second_trigger_to_the_function() {
    let (_, service) = durable_service(
        "REPORT",
        DurableEventConfig::builder().cron("0 9 * * 1").build(),
    );
    let manifests = service.durable_transport().unwrap().manifests();

    assert_eq!(manifests.len(), 1);
    assert_eq!(
        manifests[0].triggers,
        vec![
            Trigger::Event {
                event: "REPORT".into()
            },
            Trigger::Cron {
                cron: "0 9 * * 1".into()
            },
        ]
    );
}
