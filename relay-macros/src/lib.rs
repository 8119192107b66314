//! 事件分发层的过程宏
use proc_macro::TokenStream;

mod event_payload;
mod utils;

/// 事件载荷宏
/// - 为结构体合并派生 `Debug, Clone, serde::Serialize, serde::Deserialize`
/// - 实现 `::relay_domain::event::Event`
/// - 参数：
///   - `name = "..."`：事件名，缺省为类型名的 kebab-case（`UploadPdf` -> `upload-pdf`）
///   - `validate`：以载荷类型本身作为 schema，发送前校验载荷能否反序列化为该类型
///
/// ```ignore
/// #[event_payload(name = "rate-answers", validate)]
/// pub struct RateAnswers {
///     pub answers: Vec<Answer>,
///     pub uri: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn event_payload(attr: TokenStream, item: TokenStream) -> TokenStream {
    event_payload::expand(attr, item)
}
