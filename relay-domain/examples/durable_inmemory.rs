//! 持久化传输 + 内存引擎：发送带延迟的事件，随后由引擎执行函数
use relay_domain::transport::DurableEventConfig;
use relay_domain::transport::durable::{DurableSendOptions, InMemoryEngine, InProcessSteps};
use relay_domain::{EventRegistry, EventService, PayloadDefinition, SendOptions, TransportRegistry};
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut transports = TransportRegistry::new();
    transports.configure_event_transport(
        "report-requested",
        DurableEventConfig::builder()
            .retries(2)
            .cron("0 9 * * 1")
            .build(),
    );

    let engine = Arc::new(InMemoryEngine::new());
    let service = EventService::builder()
        .event_registry(
            EventRegistry::new().register_event("report-requested", PayloadDefinition::new()),
        )
        .transport_registry(transports)
        .engine(engine.clone())
        .build();

    service.subscribe("report-requested", |payload| async move {
        println!("building report for {}", payload["team"]);
        Ok(())
    });

    let durable = service
        .durable_transport()
        .ok_or_else(|| anyhow::anyhow!("durable transport not assembled"))?;
    for manifest in durable.manifests() {
        println!("function: {}", serde_json::to_string(&manifest)?);
    }

    let options =
        SendOptions::new().durable(DurableSendOptions::builder().delay(500u64).build());
    let result = service
        .send("report-requested", json!({"team": "core"}), Some(&options))
        .await;
    println!("engine ids: {:?}", result.durable().map(|r| &r.ids));

    for record in engine.run_pending(durable, &InProcessSteps).await {
        println!(
            "{} finished after {} attempt(s): {:?}",
            record.function_id, record.attempts, record.outcome
        );
    }
    Ok(())
}
