// Generic JSON transport over reqwest with custom user-agent support
use super::event::EventRecord;
use super::resource::{Fetch, ResourceRef, ResourceState};
use super::transport::Transport;
use super::USER_AGENT;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

/// [`Transport`] over plain JSON REST endpoints.
///
/// Resources live at `{base}/{service}/{path}/{id}` and event logs at
/// `{base}/{service}/{path}/{id}/events`. The transport speaks generic
/// JSON only: authentication, per-resource schema mapping, and service
/// discovery belong to the embedding client, not here.
pub struct RestTransport {
    base_url: String,
    http: reqwest::Client,
}

impl RestTransport {
    /// Create a transport rooted at `base_url`.
    ///
    /// A custom user-agent helps identify this library's API calls in
    /// production environments; pass `None` for the default.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the underlying HTTP client cannot be built
    pub fn new(base_url: &str, custom_user_agent: Option<&str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(custom_user_agent.unwrap_or(USER_AGENT))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn resource_url(&self, resource: &ResourceRef) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url, resource.service, resource.path, resource.id
        )
    }
}

#[async_trait]
impl Transport for RestTransport {
    async fn fetch(&self, resource: &ResourceRef) -> Result<Fetch> {
        let url = self.resource_url(resource);
        debug!("GET {}", url);

        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Fetch::Missing);
        }

        let body: Value = response.error_for_status()?.json().await?;
        Ok(Fetch::Found(ResourceState::new(body)))
    }

    async fn events_since(
        &self,
        scope: &ResourceRef,
        marker: Option<&str>,
    ) -> Result<Vec<EventRecord>> {
        let url = format!("{}/events", self.resource_url(scope));
        debug!("GET {} (marker: {:?})", url, marker);

        let mut request = self.http.get(&url).query(&[("sort_dir", "asc")]);
        if let Some(marker) = marker {
            request = request.query(&[("marker", marker)]);
        }

        let events: Vec<EventRecord> = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(events)
    }

    async fn direct_status(&self, scope: &ResourceRef) -> Result<ResourceState> {
        match self.fetch(scope).await? {
            Fetch::Found(state) => Ok(state),
            Fetch::Missing => Err(Error::Custom(format!(
                "direct status fetch found no resource at {scope}"
            ))),
        }
    }
}
