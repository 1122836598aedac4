//! Team directory client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use token_gate_sdk::{TeamDirectoryClient, TeamDirectoryError, TeamRecord};
use url::Url;

use super::http::HttpTransport;
use crate::config::{ConfigError, parse_url};
use crate::domain::masking::Masker;

/// Looks up team memberships with `GET <url>?member=<uid>`, authenticating
/// with the member's own bearer token.
#[derive(Clone)]
pub struct HttpTeamDirectory {
    transport: HttpTransport,
    url: Url,
}

impl HttpTeamDirectory {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `url` does not parse.
    pub fn new(transport: HttpTransport, url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            transport,
            url: parse_url("team_api.url", url)?,
        })
    }
}

#[async_trait]
impl TeamDirectoryClient for HttpTeamDirectory {
    async fn teams_of(
        &self,
        member: &str,
        bearer_token: &SecretString,
    ) -> Result<Vec<TeamRecord>, TeamDirectoryError> {
        let masker = Masker::new().with_secret(bearer_token.expose_secret());
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("member", member);

        let response = self
            .transport
            .get(&url, Some(bearer_token))
            .await
            .map_err(|e| TeamDirectoryError::Unavailable(masker.mask(&e.to_string())))?;

        if !response.status.is_success() {
            return Err(TeamDirectoryError::Unavailable(format!(
                "team directory returned {}",
                response.status
            )));
        }

        let teams: Vec<TeamRecord> = serde_json::from_slice(&response.body)
            .map_err(|e| TeamDirectoryError::MalformedResponse(masker.mask(&e.to_string())))?;
        tracing::debug!(member, teams = teams.len(), "team lookup finished");
        Ok(teams)
    }
}
