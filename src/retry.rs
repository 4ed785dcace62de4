use crate::error::LookupError;
use std::future::Future;
use tracing::{info, warn};

/// Runs `primary`, degrading to `fallback` when the model rejects the input.
///
/// Only [`ModelError::UnsupportedInput`](crate::ModelError::UnsupportedInput)
/// consults the fallback; every other failure propagates at once. When the
/// fallback fails too, the pair is re-attempted while budget remains, so
/// `fallback` runs at most `max_retries` times. Cancellation observed in
/// either attempt ends the policy immediately.
pub async fn run_with_fallback<T, P, PF, F, FF>(
    mut primary: P,
    mut fallback: F,
    max_retries: u32,
) -> Result<T, LookupError>
where
    P: FnMut() -> PF,
    PF: Future<Output = Result<T, LookupError>>,
    F: FnMut() -> FF,
    FF: Future<Output = Result<T, LookupError>>,
{
    let mut remaining = max_retries;
    loop {
        let err = match primary().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let unsupported = matches!(&err, LookupError::Model(model) if model.is_unsupported_input());
        if !unsupported || remaining == 0 {
            return Err(err);
        }

        info!(remaining, "primary prompt unsupported, retrying with fallback");
        match fallback().await {
            Ok(value) => return Ok(value),
            Err(LookupError::Cancelled) => return Err(LookupError::Cancelled),
            Err(err) if remaining > 1 => {
                warn!(error = %err, "fallback prompt failed, retrying pair");
                remaining -= 1;
            }
            Err(err) => return Err(err),
        }
    }
}
