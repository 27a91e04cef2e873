//! Generation calls with an optional deadline.

use std::time::Duration;

use scholar_model::{Llm, LlmRequest, LlmResponse};
use tracing::warn;

use crate::error::{AssistantError, Result};

/// Call `llm`, failing with [`AssistantError::GenerationFailure`] once `timeout` expires.
///
/// On expiry the in-flight call is dropped, which cancels it.
pub(crate) async fn generate(
    llm: &dyn Llm,
    request: LlmRequest,
    timeout: Option<Duration>,
) -> Result<LlmResponse> {
    let call = llm.generate(request);
    let response = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(model = llm.name(), timeout = ?limit, "generation timed out");
                return Err(AssistantError::GenerationFailure(format!("no response within {limit:?}")));
            }
        },
        None => call.await?,
    };

    if response.text.trim().is_empty() {
        return Err(AssistantError::GenerationFailure(format!("{} returned an empty answer", llm.name())));
    }
    Ok(response)
}
