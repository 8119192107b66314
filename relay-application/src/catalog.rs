//! 应用事件目录
//!
//! 声明应用内的全部事件及其传输配置，两个事件均走持久化传输。

use relay_domain::event::Event;
use relay_domain::transport::DurableEventConfig;
use relay_domain::{EventRegistry, TransportRegistry};
use relay_macros::event_payload;
use serde::{Deserialize, Serialize};

/// 已上传的 PDF 文件元数据
#[event_payload(name = "upload-pdf", validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadPdf {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: String,
    pub create_time: String,
    pub update_time: String,
    pub expiration_time: String,
    pub sha256_hash: String,
    pub uri: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub question: String,
}

/// 针对某份文件提交的答案，等待评分
#[event_payload(name = "rate-answers", validate)]
pub struct RateAnswers {
    pub answers: Vec<Answer>,
    pub uri: String,
}

pub fn event_registry() -> EventRegistry {
    EventRegistry::new()
        .register::<UploadPdf>()
        .register::<RateAnswers>()
}

pub fn transport_registry() -> TransportRegistry {
    let mut registry = TransportRegistry::new();
    registry
        .configure_event_transport(UploadPdf::NAME, DurableEventConfig::default())
        .configure_event_transport(RateAnswers::NAME, DurableEventConfig::default());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::TransportKind;
    use serde_json::json;

    #[test]
    fn every_event_is_routed_to_the_durable_transport() {
        let events = event_registry();
        let transports = transport_registry();

        for name in [UploadPdf::NAME, RateAnswers::NAME] {
            assert!(events.contains(name));
            assert!(
                transports
                    .get_transport_config_by_event(name, TransportKind::Durable)
                    .is_some()
            );
            assert!(
                transports
                    .get_transport_config_by_event(name, TransportKind::Local)
                    .is_none()
            );
        }
    }

    #[test]
    fn upload_payload_uses_camel_case_keys() {
        let events = event_registry();
        let payload = json!({
            "name": "files/abc",
            "mimeType": "application/pdf",
            "sizeBytes": "1024",
            "createTime": "2025-01-01T00:00:00Z",
            "updateTime": "2025-01-01T00:00:00Z",
            "expirationTime": "2025-01-03T00:00:00Z",
            "sha256Hash": "deadbeef",
            "uri": "https://files.example/abc",
            "state": "ACTIVE"
        });
        assert!(events.validate_event("upload-pdf", &payload));

        let mut snake = payload.clone();
        if let Some(fields) = snake.as_object_mut() {
            let mime = fields.remove("mimeType").unwrap_or_default();
            fields.insert("mime_type".into(), mime);
        }
        assert!(!events.validate_event("upload-pdf", &snake));
    }

    #[test]
    fn rate_answers_requires_question_and_answer() {
        let events = event_registry();
        assert!(events.validate_event(
            "rate-answers",
            &json!({"answers": [{"answer": "42", "question": "why?"}], "uri": "u"})
        ));
        assert!(!events.validate_event(
            "rate-answers",
            &json!({"answers": [{"answer": "42"}], "uri": "u"})
        ));
    }
}
