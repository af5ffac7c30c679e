//! Slack incoming-webhook notifier.

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::application::notify::{Notifier, NotifierError, StatusFilter};
use crate::domain::entities::FeatureFlag;
use crate::domain::types::ChangeStatus;
use crate::infra::error::InfraError;

const SOURCE: &str = "infra::notify::slack";

#[derive(Debug, Serialize)]
struct SlackMessage {
    text: String,
}

pub struct SlackNotifier {
    client: Client,
    webhook_url: Url,
    headers: HeaderMap,
    filter: StatusFilter,
}

impl SlackNotifier {
    pub fn new(webhook_url: &str, filter: StatusFilter) -> Result<Self, InfraError> {
        let webhook_url = Url::parse(webhook_url).map_err(|err| {
            InfraError::configuration(format!("invalid slack webhook url: {err}"))
        })?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(InfraError::http_client)?;

        Ok(Self {
            client,
            webhook_url,
            headers: HeaderMap::new(),
            filter,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("flagforge/", env!("CARGO_PKG_VERSION"))
    }

    /// Extra headers sent with every webhook request.
    pub fn with_headers<'a>(
        mut self,
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, InfraError> {
        for (name, value) in headers {
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                InfraError::configuration(format!("invalid notifier header `{name}`: {err}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|err| {
                InfraError::configuration(format!("invalid value for header `{name}`: {err}"))
            })?;
            self.headers.insert(header, value);
        }
        Ok(self)
    }

    pub fn filter(&self) -> &StatusFilter {
        &self.filter
    }

    pub fn message(flag: &FeatureFlag, status: ChangeStatus) -> String {
        format!("Feature Flag[Code=`{}`] has been {status}", flag.code)
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, flag: &FeatureFlag, status: ChangeStatus) -> Result<(), NotifierError> {
        if !self.filter.allows(status) {
            debug!(target = SOURCE, code = %flag.code, %status, "notification filtered out");
            return Ok(());
        }

        let body = SlackMessage {
            text: Self::message(flag, status),
        };
        let response = self
            .client
            .post(self.webhook_url.clone())
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(NotifierError::transport)?;

        let status_code = response.status();
        if !status_code.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Rejected {
                status: status_code.as_u16(),
                body,
            });
        }

        debug!(target = SOURCE, code = %flag.code, %status, "notification delivered");
        Ok(())
    }
}
