use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::errors::AppError;

/// Runs `fut` until it completes or `cancel` fires, whichever happens first.
///
/// On cancellation the future is dropped before it is polled again, so an
/// open `sqlx::Transaction` held inside it is rolled back by its `Drop`.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        res = fut => res,
    }
}
