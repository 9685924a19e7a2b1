use rand::Rng;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use super::LlmError;

const MAX_RETRIES: u32 = 3;
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Upstream statuses that a later attempt may not see again
fn should_retry(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}

/// Wait before retry number `attempt` (0-based): 1s, 2s, 4s plus up to 25% jitter.
fn backoff(attempt: u32) -> Duration {
    let delay = BASE_DELAY * 2u32.pow(attempt.min(MAX_RETRIES));
    let max_jitter_ms = delay.as_millis() as u64 / 4;
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..=max_jitter_ms))
}

/// Send a request, retrying transient failures.
///
/// The last response is returned even when it is not a success, so callers
/// can report the status and body.
pub(super) async fn send_with_retry(
    mut make_request: impl FnMut() -> reqwest::RequestBuilder,
) -> Result<reqwest::Response, LlmError> {
    let mut attempt = 0;

    loop {
        let retry_reason = match make_request().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || !should_retry(status) || attempt >= MAX_RETRIES {
                    return Ok(response);
                }
                // drain so the connection can be reused
                let _ = response.bytes().await;
                format!("status {}", status)
            }
            Err(err) if (err.is_timeout() || err.is_connect()) && attempt < MAX_RETRIES => {
                err.to_string()
            }
            Err(err) => {
                return Err(LlmError::Transport(format!(
                    "{} (after {} attempt(s))",
                    err,
                    attempt + 1
                )));
            }
        };

        let delay = backoff(attempt);
        debug!(
            "Completion request failed ({}); retrying in {:?} (attempt {}/{})",
            retry_reason,
            delay,
            attempt + 1,
            MAX_RETRIES + 1
        );
        sleep(delay).await;
        attempt += 1;
    }
}
