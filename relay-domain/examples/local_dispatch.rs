//! 进程内分发：一个事件、两个消费者，外加一次被 schema 拒绝的发送
use relay_domain::event::{FieldKind, ObjectSchema};
use relay_domain::transport::LocalEventConfig;
use relay_domain::{EventRegistry, EventService, PayloadDefinition, TransportRegistry};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let schema = ObjectSchema::new()
        .field("orderId", FieldKind::String)
        .field("amount", FieldKind::Integer);
    let events =
        EventRegistry::new().register_event("order-placed", PayloadDefinition::with_schema(schema));

    let mut transports = TransportRegistry::new();
    transports.configure_event_transport("order-placed", LocalEventConfig);

    let service = EventService::builder()
        .event_registry(events)
        .transport_registry(transports)
        .build();

    service.subscribe("order-placed", |payload| async move {
        println!("[billing] charge {}", payload["amount"]);
        Ok(())
    });
    service.subscribe("order-placed", |payload| async move {
        println!("[mailer] confirm {}", payload["orderId"]);
        Ok(())
    });

    service.start_workers().await?;

    let delivered = service
        .send("order-placed", json!({"orderId": "o-1", "amount": 42}), None)
        .await;
    println!("delivered via {:?}", delivered.transports().collect::<Vec<_>>());

    let rejected = service
        .send("order-placed", json!({"orderId": 1}), None)
        .await;
    println!("rejected payload delivered: {}", !rejected.is_empty());

    service.stop_workers().await?;
    Ok(())
}
