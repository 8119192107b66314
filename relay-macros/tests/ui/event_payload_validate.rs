use relay_domain::event::Event;
use relay_domain::EventRegistry;
use relay_macros::event_payload;

#[event_payload(name = "rate-answers", validate)]
struct RateAnswers {
    answers: Vec<String>,
    uri: String,
}

fn main() {
    assert!(RateAnswers::definition().has_schema());

    let registry = EventRegistry::new().register::<RateAnswers>();
    assert!(registry.validate_event(
        "rate-answers",
        &serde_json::json!({"answers": ["a"], "uri": "gs://x"})
    ));
    assert!(!registry.validate_event("rate-answers", &serde_json::json!({"uri": 1})));
}
