use super::{transport_error, MembershipApi};
use crate::errors::ServiceError;
use crate::models::{Member, MemberUpdate};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::instrument;

/// One large page covers the whole roster; the admin API caps result counts
/// well above the memberships this service deals with.
const LIST_PAGE_LIMIT: u32 = 99_999;

/// Reqwest-backed client for the Memberstack admin API.
#[derive(Clone)]
pub struct MemberstackClient {
    client: Client,
    base_url: String,
    secret: String,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

impl MemberstackClient {
    pub fn new(client: Client, base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-api-key", &self.secret)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        context: &str,
        response: Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if status.is_success() {
            let envelope: DataEnvelope<T> = response
                .json()
                .await
                .map_err(|e| transport_error(context, e))?;
            return Ok(envelope.data);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ServiceError::ExternalApiError {
            status: status.as_u16(),
            message: format!("{}: {}", context, message),
        })
    }
}

#[async_trait]
impl MembershipApi for MemberstackClient {
    #[instrument(skip(self))]
    async fn retrieve_member(&self, member_id: &str) -> Result<Member, ServiceError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/members/{}", member_id))
            .send()
            .await
            .map_err(|e| transport_error("retrieve member", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(format!(
                "member {} not found",
                member_id
            )));
        }

        self.decode("retrieve member", response).await
    }

    #[instrument(skip(self))]
    async fn list_members(&self) -> Result<Vec<Member>, ServiceError> {
        let response = self
            .request(reqwest::Method::GET, "/members")
            .query(&[("limit", LIST_PAGE_LIMIT)])
            .send()
            .await
            .map_err(|e| transport_error("list members", e))?;

        self.decode("list members", response).await
    }

    #[instrument(skip(self, update))]
    async fn update_member(
        &self,
        member_id: &str,
        update: &MemberUpdate,
    ) -> Result<(), ServiceError> {
        let response = self
            .request(reqwest::Method::PATCH, &format!("/members/{}", member_id))
            .json(update)
            .send()
            .await
            .map_err(|e| transport_error("update member", e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(format!(
                "member {} not found",
                member_id
            )));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::ExternalApiError {
                status: status.as_u16(),
                message: format!("update member: {}", message),
            });
        }
        Ok(())
    }
}
