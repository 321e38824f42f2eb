pub mod models;

use crate::config::Config;
use models::{Contact, ContactProperties, CreateDealPayload, Deal, DealProperties, ListResponse};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use tracing::debug;

/// `get_contacts` only hands back this many rows.
pub const CONTACT_LIST_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },
}

impl Serialize for CrmError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Serialize)]
struct PropertiesBody<'a, P> {
    properties: &'a P,
}

/// Contacts and deals CRUD against the dashboard's REST server.
#[derive(Debug, Clone)]
pub struct CrmClient {
    http: Client,
    server_url: String,
}

impl CrmClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.server_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.server_url, path)
    }

    // ── Contacts ──

    pub async fn get_contacts(&self) -> Result<Vec<Contact>, CrmError> {
        let list: ListResponse<Contact> = self
            .fetch_json(self.http.get(self.url("contacts")), "Failed to fetch contacts")
            .await?;
        let mut contacts = list.into_vec();
        contacts.truncate(CONTACT_LIST_LIMIT);
        Ok(contacts)
    }

    pub async fn get_contact(&self, id: &str) -> Result<Contact, CrmError> {
        self.fetch_json(
            self.http.get(self.url(&format!("contacts/{}", id))),
            "Failed to fetch contact",
        )
        .await
    }

    pub async fn update_contact(
        &self,
        id: &str,
        properties: &ContactProperties,
    ) -> Result<Contact, CrmError> {
        let req = self
            .http
            .put(self.url(&format!("contacts/{}", id)))
            .json(&PropertiesBody { properties });
        self.fetch_json(req, "Failed to update contact").await
    }

    pub async fn delete_contact(&self, id: &str) -> Result<(), CrmError> {
        self.send(
            self.http.delete(self.url(&format!("contacts/{}", id))),
            "Failed to delete contact",
        )
        .await?;
        Ok(())
    }

    // ── Deals ──

    pub async fn get_deals(&self) -> Result<Vec<Deal>, CrmError> {
        let list: ListResponse<Deal> = self
            .fetch_json(self.http.get(self.url("deals")), "Failed to fetch deals")
            .await?;
        Ok(list.into_vec())
    }

    pub async fn get_contact_deals(&self, contact_id: &str) -> Result<Vec<Deal>, CrmError> {
        let list: ListResponse<Deal> = self
            .fetch_json(
                self.http
                    .get(self.url(&format!("contacts/{}/deals", contact_id))),
                "Failed to fetch contact deals",
            )
            .await?;
        Ok(list.into_vec())
    }

    pub async fn create_deal(&self, payload: &CreateDealPayload) -> Result<Deal, CrmError> {
        let req = self.http.post(self.url("deals")).json(payload);
        self.fetch_json(req, "Failed to create deal").await
    }

    pub async fn update_deal(&self, id: &str, properties: &DealProperties) -> Result<Deal, CrmError> {
        let req = self
            .http
            .put(self.url(&format!("deals/{}", id)))
            .json(&PropertiesBody { properties });
        self.fetch_json(req, "Failed to update deal").await
    }

    pub async fn delete_deal(&self, id: &str) -> Result<(), CrmError> {
        self.send(
            self.http.delete(self.url(&format!("deals/{}", id))),
            "Failed to delete deal",
        )
        .await?;
        Ok(())
    }

    async fn send(&self, req: RequestBuilder, failure: &str) -> Result<Response, CrmError> {
        let resp = req.send().await?;
        let status = resp.status();
        debug!(url = %resp.url(), status = status.as_u16(), "crm request");
        if !status.is_success() {
            return Err(CrmError::Api {
                status: status.as_u16(),
                message: failure.to_string(),
            });
        }
        Ok(resp)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        failure: &str,
    ) -> Result<T, CrmError> {
        let resp = self.send(req, failure).await?;
        Ok(resp.json().await?)
    }
}
