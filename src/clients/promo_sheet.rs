use super::{transport_error, PromoTable};
use crate::errors::ServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

/// Reads the promo-code table from a spreadsheet values endpoint that returns
/// `{ "values": [[col, col, col, col], ...] }`. Fetched fresh on every call;
/// the table is append-only and small, so there is no caching layer.
#[derive(Clone)]
pub struct SheetPromoTable {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ValuesEnvelope {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetPromoTable {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PromoTable for SheetPromoTable {
    #[instrument(skip(self))]
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, ServiceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| transport_error("fetch promo table", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::ExternalApiError {
                status: status.as_u16(),
                message: "fetch promo table: non-success response".to_string(),
            });
        }

        let envelope: ValuesEnvelope = response
            .json()
            .await
            .map_err(|e| transport_error("fetch promo table", e))?;
        Ok(envelope.values)
    }
}
