use async_trait::async_trait;

use wgt_store::{typed, KeyValueStore, StoreResult};
use wgt_types::keys;

use crate::domain::{Domain, Entry, Hydrated};
use crate::error::StateResult;
use crate::provider::{Accessor, PendingWrite};

/// First-run and post-update notice flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OnboardingSnapshot {
    /// `showWelcomeModal`; absent counts as `true`.
    pub show_welcome: bool,
    /// `lastVersion`: release whose notes were last acknowledged.
    pub last_version: Option<String>,
    /// The welcome was due when the domain loaded. Release notes wait for
    /// the next session then. Not persisted.
    pub welcomed_this_session: bool,
}

impl Default for OnboardingSnapshot {
    fn default() -> Self {
        Self {
            show_welcome: true,
            last_version: None,
            welcomed_this_session: true,
        }
    }
}

/// Notice the dashboard should show on open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Welcome,
    /// Release notes for a version newer than `previous`.
    ReleaseNotes { previous: Option<String> },
}

/// Domain persisted under `showWelcomeModal` and `lastVersion`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OnboardingDomain;

#[async_trait]
impl Domain for OnboardingDomain {
    type Snapshot = OnboardingSnapshot;
    const NAME: &'static str = "onboarding";

    fn neutral(&self) -> OnboardingSnapshot {
        OnboardingSnapshot {
            show_welcome: false,
            last_version: None,
            welcomed_this_session: false,
        }
    }

    async fn load(&self, store: &dyn KeyValueStore) -> StoreResult<Hydrated<OnboardingSnapshot>> {
        let (show_welcome, last_version) = tokio::join!(
            typed::get::<bool, _>(store, keys::SHOW_WELCOME_MODAL),
            typed::get::<String, _>(store, keys::LAST_VERSION),
        );
        let show_welcome = show_welcome?.unwrap_or(true);
        Ok(Hydrated::loaded(OnboardingSnapshot {
            show_welcome,
            last_version: last_version?,
            welcomed_this_session: show_welcome,
        }))
    }

    fn entries(&self, snapshot: &OnboardingSnapshot) -> StoreResult<Vec<Entry>> {
        let mut entries = vec![Entry::encode(keys::SHOW_WELCOME_MODAL, &snapshot.show_welcome)?];
        if let Some(version) = &snapshot.last_version {
            entries.push(Entry::encode(keys::LAST_VERSION, version)?);
        }
        Ok(entries)
    }
}

impl OnboardingSnapshot {
    /// Welcome takes precedence. Release notes are due when the last
    /// acknowledged version is not `version`, except in a session that
    /// opened with the welcome.
    pub fn pending_notice(&self, version: &str) -> Option<Notice> {
        if self.show_welcome {
            return Some(Notice::Welcome);
        }
        if self.welcomed_this_session {
            return None;
        }
        if self.last_version.as_deref() != Some(version) {
            return Some(Notice::ReleaseNotes {
                previous: self.last_version.clone(),
            });
        }
        None
    }
}

impl Accessor<OnboardingDomain> {
    /// Notice due for `version`, or `None` (also while not ready).
    pub fn pending_notice(&self, version: &str) -> Option<Notice> {
        self.read(|s| s.pending_notice(version)).flatten()
    }

    pub fn dismiss_welcome(&self) -> StateResult<PendingWrite> {
        self.update(|s| s.show_welcome = false)
    }

    /// Record that the notes for `version` have been seen.
    pub fn acknowledge_release(&self, version: &str) -> StateResult<PendingWrite> {
        self.update(|s| s.last_version = Some(version.to_string()))
    }
}
