use std::time::Instant;
use surf::middleware::{Middleware, Next};
use surf::{Client, Request, Response};

/// Logs every outgoing request together with its status and round-trip time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SurfLogging;

#[surf::utils::async_trait]
impl Middleware for SurfLogging {
    async fn handle(&self, req: Request, client: Client, next: Next<'_>) -> surf::Result<Response> {
        let method = req.method();
        let url = req.url().to_string();
        log::trace!("{} {}", method, url);

        let start = Instant::now();
        let result = next.run(req, client).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                log::debug!("{} {} -> {} in {:?}", method, url, response.status(), elapsed)
            }
            Err(err) => log::debug!("{} {} failed after {:?}: {}", method, url, elapsed, err),
        }

        result
    }
}
