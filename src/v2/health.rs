use tracing::debug;

use crate::client::InferenceClient;
use crate::error::Result;

pub const READY_PATH: &str = "/v2/health/ready";

impl InferenceClient {
    /// Asks the server whether it is ready to serve inference requests.
    ///
    /// Any non-2xx answer reads as "not ready"; only transport failures are
    /// errors.
    pub async fn ready(&self) -> Result<bool> {
        let url = format!("{}{}", self.base_url(), READY_PATH);
        let response = self.http().get(&url).send().await?;
        let status = response.status();
        debug!(%url, %status, "readiness probe");

        Ok(status.is_success())
    }
}
