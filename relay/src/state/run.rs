// Copyright (c) 2020-present, UMD Database Group.
//
// This program is free software: you can use, redistribute, and/or modify
// it under the terms of the GNU Affero General Public License, version 3
// or later ("AGPL"), as published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! The state of one pipeline run, as persisted by its earlier invocations.

use super::{ParameterScope, ParameterStore, PutAck};
use crate::error::{RelayError, Result};
use crate::event::{PipelineEvent, Stage, State};
use futures::future::try_join_all;
use log::{debug, warn};

/// The commit message reported by the Source action.
pub const COMMIT_MESSAGE_PARAM: &str = "commitMsg";
/// The CodeBuild build number reported by the Build action.
pub const BUILD_NUMBER_PARAM: &str = "buildNumber";
/// The repository exported by the Source action variables.
pub const REPO_NAME_PARAM: &str = "RepoName";
/// The branch exported by the Source action variables.
pub const BRANCH_NAME_PARAM: &str = "BranchName";

/// The build number shown for a starting Build stage whose Build action has
/// not reported yet.
pub const PENDING_BUILD_NUMBER: &str = "pending";

/// A parameter store restricted to the namespace of one pipeline run.
#[derive(Debug)]
pub struct ScopedStore<'a> {
    store:     &'a dyn ParameterStore,
    namespace: String,
}

impl<'a> ScopedStore<'a> {
    /// Scopes `store` to the run of `event`.
    pub fn new(
        store: &'a dyn ParameterStore,
        prefix: &str,
        scope: ParameterScope,
        event: &PipelineEvent,
    ) -> Self {
        Self {
            store,
            namespace: scope.namespace(prefix, event),
        }
    }

    /// The parameter path of this run.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The full parameter name of `name`.
    pub fn key(&self, name: &str) -> String {
        format!("{}/{}", self.namespace, name)
    }

    /// Reads a parameter of this run.
    pub async fn get(&self, name: &str) -> Result<String> {
        self.store.get(&self.key(name)).await
    }

    /// Reads a parameter of this run, mapping absence to `None`.
    pub async fn get_optional(&self, name: &str) -> Result<Option<String>> {
        match self.get(name).await {
            Ok(value) => Ok(Some(value)),
            Err(RelayError::MissingParameter(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes a parameter of this run.
    pub async fn put(&self, name: &str, value: &str) -> Result<PutAck> {
        self.store.put(&self.key(name), value).await
    }

    /// Writes several parameters concurrently.
    ///
    /// The first failure fails the whole call; writes that already went
    /// through are kept.
    pub async fn put_all(&self, params: &[(&str, String)]) -> Result<Vec<PutAck>> {
        try_join_all(params.iter().map(|(name, value)| self.put(name, value))).await
    }
}

/// What the earlier invocations of a pipeline run have recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    /// Repository, from the Source action variables.
    pub repo:           Option<String>,
    /// Branch, from the Source action variables.
    pub branch:         Option<String>,
    /// Commit message, from the Source action.
    pub commit_message: Option<String>,
    /// Build number, from the Build action.
    pub build_number:   Option<String>,
}

impl RunState {
    /// Loads the state of the run. The reads are issued concurrently; absent
    /// parameters are left unset.
    pub async fn load(store: &ScopedStore<'_>) -> Result<Self> {
        let (repo, branch, commit_message, build_number) = futures::try_join!(
            store.get_optional(REPO_NAME_PARAM),
            store.get_optional(BRANCH_NAME_PARAM),
            store.get_optional(COMMIT_MESSAGE_PARAM),
            store.get_optional(BUILD_NUMBER_PARAM),
        )?;

        let state = RunState {
            repo,
            branch,
            commit_message,
            build_number,
        };
        debug!("Loaded run state from {}: {:?}", store.namespace(), state);
        if state.commit_message.is_none() || state.build_number.is_none() {
            warn!(
                "Run {} is incomplete; the Source or Build action has not reported yet.",
                store.namespace()
            );
        }
        Ok(state)
    }

    /// Returns the commit message, failing if the Source action never
    /// reported one.
    pub fn require_commit_message(&self, store: &ScopedStore<'_>) -> Result<&str> {
        self.commit_message
            .as_deref()
            .ok_or_else(|| RelayError::MissingParameter(store.key(COMMIT_MESSAGE_PARAM)))
    }

    /// Returns the build number, failing if the Build action never reported
    /// one.
    pub fn require_build_number(&self, store: &ScopedStore<'_>) -> Result<&str> {
        self.build_number
            .as_deref()
            .ok_or_else(|| RelayError::MissingParameter(store.key(BUILD_NUMBER_PARAM)))
    }

    /// Returns the build number to report for a `stage` transition to
    /// `state`.
    ///
    /// The Build stage starts before its Build action completes, so a starting
    /// Build stage reads [`PENDING_BUILD_NUMBER`] when nothing is recorded.
    /// Every other transition requires the build number.
    pub fn build_number_for(
        &self,
        store: &ScopedStore<'_>,
        stage: &Stage,
        state: &State,
    ) -> Result<&str> {
        match (stage, state, self.build_number.as_deref()) {
            (Stage::Build, State::Started, None) => Ok(PENDING_BUILD_NUMBER),
            _ => self.require_build_number(store),
        }
    }

    /// Returns the repository and branch to report: the persisted source
    /// variables when present, the pipeline name otherwise.
    pub fn repo_and_branch(&self, event: &PipelineEvent) -> (String, String) {
        let (repo, branch) = event.pipeline_repo_and_branch();
        (
            self.repo.clone().unwrap_or(repo),
            self.branch.clone().unwrap_or(branch),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::parse_sns;
    use crate::state::HashMapParameterStore;
    use crate::tests::*;

    #[tokio::test]
    async fn put_all_then_load() -> Result<()> {
        let store = HashMapParameterStore::new();
        let event = parse_sns(stage_event("Build", "SUCCEEDED"))?;
        let scoped = ScopedStore::new(&store, "/n", ParameterScope::Global, &event);

        let acks = scoped
            .put_all(&[
                (COMMIT_MESSAGE_PARAM, "Fix the scoring bug".to_string()),
                (BUILD_NUMBER_PARAM, "17".to_string()),
            ])
            .await?;
        assert_eq!(acks.len(), 2);
        assert_eq!(acks[0].name, "/n/commitMsg");
        assert_eq!(acks[1].name, "/n/buildNumber");

        let state = RunState::load(&scoped).await?;
        assert_eq!(state.require_commit_message(&scoped)?, "Fix the scoring bug");
        assert_eq!(state.require_build_number(&scoped)?, "17");
        assert_eq!(state.repo, None);
        assert_eq!(
            state.repo_and_branch(&event),
            ("myrepo".to_string(), "main".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_upstream_values() -> Result<()> {
        let store = HashMapParameterStore::new();
        let event = parse_sns(stage_event("Deploy", "STARTED"))?;
        let scoped = ScopedStore::new(&store, "/n", ParameterScope::Pipeline, &event);
        scoped.put(BUILD_NUMBER_PARAM, "3").await?;

        let state = RunState::load(&scoped).await?;
        match state.require_commit_message(&scoped) {
            Err(RelayError::MissingParameter(name)) => {
                assert_eq!(name, "/n/myrepo-main/commitMsg")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(state.require_build_number(&scoped)?, "3");
        Ok(())
    }

    #[tokio::test]
    async fn starting_build_without_build_number() -> Result<()> {
        let store = HashMapParameterStore::new();
        let event = parse_sns(stage_event("Build", "STARTED"))?;
        let scoped = ScopedStore::new(&store, "/n", ParameterScope::Execution, &event);
        scoped.put(COMMIT_MESSAGE_PARAM, "Fix the scoring bug").await?;

        let state = RunState::load(&scoped).await?;
        assert_eq!(
            state.build_number_for(&scoped, &Stage::Build, &State::Started)?,
            PENDING_BUILD_NUMBER
        );
        for (stage, status) in [
            (Stage::Build, State::Succeeded),
            (Stage::Build, State::Failed),
            (Stage::Deploy, State::Started),
        ] {
            assert!(matches!(
                state.build_number_for(&scoped, &stage, &status),
                Err(RelayError::MissingParameter(_))
            ));
        }

        scoped.put(BUILD_NUMBER_PARAM, "16").await?;
        let state = RunState::load(&scoped).await?;
        assert_eq!(
            state.build_number_for(&scoped, &Stage::Build, &State::Started)?,
            "16"
        );
        Ok(())
    }

    #[tokio::test]
    async fn persisted_variables_win() -> Result<()> {
        let store = HashMapParameterStore::new();
        let event = parse_sns(stage_event("Deploy", "SUCCEEDED"))?;
        let scoped = ScopedStore::new(&store, "/n", ParameterScope::Execution, &event);
        scoped
            .put_all(&[
                (REPO_NAME_PARAM, "rhythm-game-map".to_string()),
                (BRANCH_NAME_PARAM, "release".to_string()),
            ])
            .await?;

        let state = RunState::load(&scoped).await?;
        assert_eq!(
            state.repo_and_branch(&event),
            ("rhythm-game-map".to_string(), "release".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn store_failures_propagate() -> Result<()> {
        let store = FailingParameterStore::default();
        let event = parse_sns(stage_event("Build", "SUCCEEDED"))?;
        let scoped = ScopedStore::new(&store, "/n", ParameterScope::Global, &event);

        assert!(matches!(
            RunState::load(&scoped).await,
            Err(RelayError::AWS(_))
        ));
        assert!(scoped
            .put_all(&[(COMMIT_MESSAGE_PARAM, "x".to_string())])
            .await
            .is_err());
        Ok(())
    }
}
