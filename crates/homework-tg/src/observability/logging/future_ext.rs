use async_trait::async_trait;
use easy_ext::ext;
use futures::prelude::*;
use std::time::Duration;

#[ext(FutureExt)]
#[async_trait]
pub(crate) impl<T, E, F> F
where
    F: Future<Output = Result<T, E>> + Send,
{
    async fn with_duration(self) -> (F::Output, Duration) {
        let start = std::time::Instant::now();
        let result = self.await;
        let elapsed = start.elapsed();
        (result, elapsed)
    }
}
