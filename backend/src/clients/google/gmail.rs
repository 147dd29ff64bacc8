use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use google_gmail1::api::WatchRequest;
use google_gmail1::hyper_rustls::HttpsConnector;
use google_gmail1::Gmail;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use super::GoogleCredentials;
use crate::clients::{ClientError, MailboxProvider, MailboxWatch};

const SERVICE: &str = "Gmail";

/// Client for the mailbox push subscription endpoints of the Gmail API
pub struct GmailClient {
    hub: Gmail<HttpsConnector<HttpConnector>>,
}

impl GmailClient {
    pub async fn from_credentials(credentials: &GoogleCredentials) -> Result<Self> {
        let secret = google_gmail1::yup_oauth2::authorized_user::AuthorizedUserSecret {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            refresh_token: credentials.refresh_token.clone(),
            key_type: "authorized_user".to_string(),
        };

        let auth = google_gmail1::yup_oauth2::AuthorizedUserAuthenticator::builder(secret)
            .build()
            .await
            .context("Failed to build authenticator from refresh token")?;

        let connector = google_gmail1::hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .context("Failed to load native TLS roots")?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new()).build(connector);
        let hub = Gmail::new(client, auth);

        Ok(Self { hub })
    }
}

#[async_trait]
impl MailboxProvider for GmailClient {
    async fn watch(&self, topic: &str, label_ids: &[&str]) -> Result<MailboxWatch, ClientError> {
        let request = WatchRequest {
            topic_name: Some(topic.to_string()),
            label_ids: Some(label_ids.iter().map(|l| l.to_string()).collect()),
            ..Default::default()
        };

        let (_, response) = self
            .hub
            .users()
            .watch(request, "me")
            .doit()
            .await
            .map_err(|e| ClientError::provider(SERVICE, e))?;

        Ok(MailboxWatch {
            history_id: response.history_id,
            expiration: response.expiration.and_then(DateTime::from_timestamp_millis),
        })
    }

    async fn stop(&self) -> Result<(), ClientError> {
        self.hub
            .users()
            .stop("me")
            .doit()
            .await
            .map_err(|e| ClientError::provider(SERVICE, e))?;

        tracing::info!("Stopped existing Gmail push subscriptions");
        Ok(())
    }
}
