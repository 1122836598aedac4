//! Team membership checks backed by the team directory.

use std::sync::Arc;

use async_trait::async_trait;
use token_gate_sdk::{
    AccessPredicate, AccessTuple, IdentityRecord, RequestContext, TeamDirectoryClient,
    TeamDirectoryError, TeamRecord, keys,
};

async fn lookup_teams(
    directory: &dyn TeamDirectoryClient,
    identity: &IdentityRecord,
) -> Result<(String, Vec<TeamRecord>), TeamDirectoryError> {
    let uid = identity.uid().ok_or(TeamDirectoryError::MissingUid)?;
    let teams = directory
        .teams_of(uid, identity.token().access_token())
        .await?;
    Ok((uid.to_owned(), teams))
}

/// Grants when one of the member's teams is on the allow-list.
///
/// All returned records are scanned. Independently of the grant, every
/// `official` record annotates the context with `uid` and `team`; when the
/// directory returns more than one, the last one wins.
pub struct GroupMembershipCheck {
    allow: Vec<AccessTuple>,
    directory: Arc<dyn TeamDirectoryClient>,
}

impl GroupMembershipCheck {
    #[must_use]
    pub fn new(allow: Vec<AccessTuple>, directory: Arc<dyn TeamDirectoryClient>) -> Self {
        Self { allow, directory }
    }
}

#[async_trait]
impl AccessPredicate for GroupMembershipCheck {
    fn name(&self) -> &str {
        "group_check"
    }

    async fn evaluate(&self, identity: &IdentityRecord, ctx: &mut RequestContext) -> bool {
        let (uid, teams) = match lookup_teams(self.directory.as_ref(), identity).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(predicate = self.name(), error = %e, "team lookup failed");
                return false;
            }
        };

        let mut granted = false;
        let mut official_seen = 0_usize;
        for team in &teams {
            if self.allow.iter().any(|tuple| tuple.uid == team.id) {
                tracing::info!(uid = %uid, team = %team.id, "grant access to team member");
                granted = true;
            }
            if team.is_official() {
                official_seen += 1;
                ctx.set(keys::UID, uid.as_str());
                ctx.set(keys::TEAM, team.id.as_str());
            }
        }

        if official_seen > 1 {
            tracing::warn!(
                uid = %uid,
                official_teams = official_seen,
                team = ?ctx.get_str(keys::TEAM),
                "directory returned more than one official team, keeping the last"
            );
        }
        granted
    }
}

/// Grants every valid identity.
///
/// When the directory is reachable the member's first `official` team is
/// recorded; a failed lookup is logged and does not deny.
pub struct NoAuthorization {
    directory: Option<Arc<dyn TeamDirectoryClient>>,
}

impl NoAuthorization {
    #[must_use]
    pub fn new(directory: Option<Arc<dyn TeamDirectoryClient>>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl AccessPredicate for NoAuthorization {
    fn name(&self) -> &str {
        "no_authorization"
    }

    async fn evaluate(&self, identity: &IdentityRecord, ctx: &mut RequestContext) -> bool {
        let Some(directory) = &self.directory else {
            return true;
        };

        match lookup_teams(directory.as_ref(), identity).await {
            Ok((uid, teams)) => {
                if let Some(team) = teams.iter().find(|t| t.is_official()) {
                    ctx.set(keys::UID, uid.as_str());
                    ctx.set(keys::TEAM, team.id.as_str());
                }
            }
            Err(e) => {
                tracing::warn!(predicate = self.name(), error = %e, "team lookup failed");
            }
        }
        true
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use secrecy::{ExposeSecret, SecretString};
    use tracing_test::traced_test;

    use super::*;

    struct StaticDirectory {
        teams: Result<Vec<TeamRecord>, TeamDirectoryError>,
        calls: AtomicUsize,
    }

    impl StaticDirectory {
        fn with(teams: Result<Vec<TeamRecord>, TeamDirectoryError>) -> Arc<Self> {
            Arc::new(Self {
                teams,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TeamDirectoryClient for StaticDirectory {
        async fn teams_of(
            &self,
            member: &str,
            bearer_token: &SecretString,
        ) -> Result<Vec<TeamRecord>, TeamDirectoryError> {
            assert_eq!(member, "alice");
            assert_eq!(bearer_token.expose_secret(), "tok");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.teams.clone()
        }
    }

    fn team(id: &str, team_type: &str) -> TeamRecord {
        TeamRecord {
            id: id.to_owned(),
            team_type: team_type.to_owned(),
            ..TeamRecord::default()
        }
    }

    fn identity() -> IdentityRecord {
        IdentityRecord::builder()
            .access_token("tok".to_owned())
            .scope("uid", "alice")
            .build()
    }

    #[tokio::test]
    async fn grants_allowed_team_and_annotates_official() {
        let directory = StaticDirectory::with(Ok(vec![
            team("teapot", "official"),
            team("guild", "virtual"),
        ]));
        let check = GroupMembershipCheck::new(
            vec![AccessTuple::new("teams", "guild", "Guild")],
            directory.clone(),
        );
        let mut ctx = RequestContext::new();

        assert!(check.evaluate(&identity(), &mut ctx).await);
        assert_eq!(ctx.get_str("uid"), Some("alice"));
        assert_eq!(ctx.get_str("team"), Some("teapot"));
        assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn annotates_official_team_even_when_denied() {
        let directory = StaticDirectory::with(Ok(vec![team("teapot", "official")]));
        let check = GroupMembershipCheck::new(
            vec![AccessTuple::new("teams", "other", "Other")],
            directory,
        );
        let mut ctx = RequestContext::new();

        assert!(!check.evaluate(&identity(), &mut ctx).await);
        assert_eq!(ctx.get_str("team"), Some("teapot"));
    }

    #[tokio::test]
    #[traced_test]
    async fn last_official_team_wins_with_warning() {
        let directory = StaticDirectory::with(Ok(vec![
            team("first", "official"),
            team("second", "official"),
        ]));
        let check = GroupMembershipCheck::new(Vec::new(), directory);
        let mut ctx = RequestContext::new();

        assert!(!check.evaluate(&identity(), &mut ctx).await);
        assert_eq!(ctx.get_str("team"), Some("second"));
        assert!(logs_contain("more than one official team"));
    }

    #[tokio::test]
    async fn lookup_failure_denies() {
        let directory = StaticDirectory::with(Err(TeamDirectoryError::Unavailable(
            "connection refused".to_owned(),
        )));
        let check = GroupMembershipCheck::new(
            vec![AccessTuple::new("teams", "teapot", "Teapot")],
            directory,
        );
        let mut ctx = RequestContext::new();

        assert!(!check.evaluate(&identity(), &mut ctx).await);
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn missing_uid_denies_without_lookup() {
        let directory = StaticDirectory::with(Ok(vec![team("teapot", "official")]));
        let check = GroupMembershipCheck::new(
            vec![AccessTuple::new("teams", "teapot", "Teapot")],
            directory.clone(),
        );
        let record = IdentityRecord::builder().access_token("tok".to_owned()).build();

        assert!(!check.evaluate(&record, &mut RequestContext::new()).await);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_authorization_always_grants() {
        let mut ctx = RequestContext::new();
        assert!(NoAuthorization::new(None).evaluate(&identity(), &mut ctx).await);
        assert!(ctx.is_empty());

        let failing = StaticDirectory::with(Err(TeamDirectoryError::MalformedResponse(
            "not an array".to_owned(),
        )));
        assert!(
            NoAuthorization::new(Some(failing))
                .evaluate(&identity(), &mut ctx)
                .await
        );

        let directory = StaticDirectory::with(Ok(vec![
            team("guild", "virtual"),
            team("teapot", "official"),
            team("later", "official"),
        ]));
        let mut ctx = RequestContext::new();
        assert!(
            NoAuthorization::new(Some(directory))
                .evaluate(&identity(), &mut ctx)
                .await
        );
        assert_eq!(ctx.get_str("team"), Some("teapot"));
        assert_eq!(ctx.get_str("uid"), Some("alice"));
    }
}
