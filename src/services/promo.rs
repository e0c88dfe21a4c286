use crate::clients::PromoTable;
use crate::errors::ServiceError;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Result of a promo-code lookup. An unknown code is a valid, negative
/// answer rather than an error.
#[derive(Debug, Clone, Serialize)]
pub struct PromoLookup {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<String>,
}

impl PromoLookup {
    fn invalid() -> Self {
        Self {
            valid: false,
            percentage: None,
        }
    }
}

/// Answers code-to-discount lookups against the external promo table.
#[derive(Clone)]
pub struct PromoResolver {
    table: Arc<dyn PromoTable>,
}

impl PromoResolver {
    pub fn new(table: Arc<dyn PromoTable>) -> Self {
        Self { table }
    }

    /// Look up a promo code. The full table is fetched fresh on every call;
    /// matching is a case-sensitive exact match on the first column, with the
    /// header row skipped. Failure to reach the table surfaces to the caller.
    #[instrument(skip(self))]
    pub async fn lookup(&self, code: &str) -> Result<PromoLookup, ServiceError> {
        let rows = self.table.fetch_rows().await?;

        for row in rows.iter().skip(1) {
            let (Some(row_code), Some(raw_percentage)) = (row.first(), row.get(1)) else {
                continue;
            };
            if row_code == code {
                return Ok(PromoLookup {
                    valid: true,
                    percentage: Some(raw_percentage.trim_end_matches('%').to_string()),
                });
            }
        }

        Ok(PromoLookup::invalid())
    }
}
