use super::{transport_error, PaymentsApi};
use crate::errors::ServiceError;
use crate::models::{Checkout, CreateCheckoutRequest, Customer, Order};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

const SQUARE_API_VERSION: &str = "2024-01-18";

/// Reqwest-backed client for the Square Connect API.
#[derive(Clone)]
pub struct SquareClient {
    client: Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    order: Order,
}

#[derive(Debug, Deserialize)]
struct CustomerEnvelope {
    customer: Customer,
}

#[derive(Debug, Deserialize)]
struct CheckoutEnvelope {
    checkout: Checkout,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl SquareClient {
    pub fn new(client: Client, base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .header("Square-Version", SQUARE_API_VERSION)
    }

    /// Decode a success envelope or surface the API's error detail with its status.
    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        context: &str,
        response: Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| transport_error(context, e));
        }
        Err(api_error(context, status, response).await)
    }
}

async fn api_error(context: &str, status: StatusCode, response: Response) -> ServiceError {
    let message = match response.json::<ApiErrorBody>().await {
        Ok(body) => body
            .errors
            .into_iter()
            .next()
            .map(|e| {
                e.detail
                    .or(e.code)
                    .unwrap_or_else(|| "unspecified error".to_string())
            })
            .unwrap_or_else(|| "unspecified error".to_string()),
        Err(_) => "unreadable error body".to_string(),
    };
    ServiceError::ExternalApiError {
        status: status.as_u16(),
        message: format!("{}: {}", context, message),
    }
}

#[async_trait]
impl PaymentsApi for SquareClient {
    #[instrument(skip(self))]
    async fn retrieve_order(&self, order_id: &str) -> Result<Order, ServiceError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v2/orders/{}", order_id))
            .send()
            .await
            .map_err(|e| transport_error("retrieve order", e))?;

        let envelope: OrderEnvelope = self.decode("retrieve order", response).await?;
        Ok(envelope.order)
    }

    #[instrument(skip(self))]
    async fn create_customer(&self, email: &str) -> Result<Customer, ServiceError> {
        let response = self
            .request(reqwest::Method::POST, "/v2/customers")
            .json(&json!({ "emailAddress": email }))
            .send()
            .await
            .map_err(|e| transport_error("create customer", e))?;

        let envelope: CustomerEnvelope = self.decode("create customer", response).await?;
        Ok(envelope.customer)
    }

    #[instrument(skip(self, request))]
    async fn create_checkout(
        &self,
        location_id: &str,
        request: &CreateCheckoutRequest,
    ) -> Result<Checkout, ServiceError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/v2/locations/{}/checkouts", location_id),
            )
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error("create checkout", e))?;

        let envelope: CheckoutEnvelope = self.decode("create checkout", response).await?;
        Ok(envelope.checkout)
    }
}
