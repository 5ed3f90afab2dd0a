//! Rate-limit friendly request sending.

use rand::{thread_rng, Rng};
use std::time::Duration;

/// Send `rb`, retrying on transient statuses (429, 500, 502, 503, 504) and
/// transport errors with exponential backoff.
///
/// Any other status is returned to the caller untouched. Requests whose body
/// cannot be cloned are sent once.
pub async fn send_with_backoff(
    rb: reqwest::RequestBuilder,
    label: &str,
    max_retries: u32,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut attempt = 0u32;
    loop {
        let Some(req) = rb.try_clone() else {
            return rb.send().await;
        };
        match req.send().await {
            Ok(r) => {
                if is_transient_status(r.status().as_u16()) && attempt < max_retries {
                    attempt += 1;
                    let back_ms = backoff_delay_ms(attempt);
                    log::warn!(
                        "{} {} retry={} backoff={}ms",
                        r.status().as_u16(),
                        label,
                        attempt,
                        back_ms
                    );
                    tokio::time::sleep(Duration::from_millis(back_ms)).await;
                    continue;
                }
                return Ok(r);
            }
            Err(e) => {
                if attempt < max_retries {
                    attempt += 1;
                    let back_ms = backoff_delay_ms(attempt);
                    log::warn!("err {label} retry={attempt} backoff={back_ms}ms : {e}");
                    tokio::time::sleep(Duration::from_millis(back_ms)).await;
                    continue;
                }
                return Err(e);
            }
        }
    }
}

pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn backoff_delay_ms(attempt: u32) -> u64 {
    let base = backoff_base_ms(attempt);
    let jitter: u64 = thread_rng().gen_range(0..=250);
    base + jitter
}

// 300, 600, 1200, 2400, 4800, 9600 and flat after that
fn backoff_base_ms(attempt: u32) -> u64 {
    300u64.saturating_mul(1u64 << (attempt.clamp(1, 6) - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_base_ms(1), 300);
        assert_eq!(backoff_base_ms(2), 600);
        assert_eq!(backoff_base_ms(6), 9600);
        assert_eq!(backoff_base_ms(9), 9600);
    }

    #[test]
    fn jitter_stays_bounded() {
        for attempt in 1..=4 {
            let d = backoff_delay_ms(attempt);
            let base = backoff_base_ms(attempt);
            assert!(d >= base && d <= base + 250);
        }
    }

    #[test]
    fn only_throttling_and_gateway_errors_are_transient() {
        assert!(is_transient_status(429));
        assert!(is_transient_status(503));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(200));
    }
}
