//! Display profiles used to describe the counterpart in events.

use std::sync::Arc;

use dashmap::DashMap;
use p2px_core::{BoxFuture, CounterpartInfo, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Read-only access to user display profiles.
pub trait ProfileDirectory: Send + Sync {
    fn profile<'a>(&'a self, user: &'a UserId) -> BoxFuture<'a, Option<Profile>>;
}

pub type DynProfileDirectory = Arc<dyn ProfileDirectory>;

/// Counterpart info for `user`, falling back to the raw id as display name.
pub(crate) fn counterpart_info(user: &UserId, profile: Option<Profile>) -> CounterpartInfo {
    match profile {
        Some(p) => CounterpartInfo {
            user_id: user.clone(),
            display_name: p.display_name,
            avatar_url: p.avatar_url,
        },
        None => CounterpartInfo {
            user_id: user.clone(),
            display_name: user.to_string(),
            avatar_url: None,
        },
    }
}

/// In-memory profile directory.
#[derive(Debug, Default)]
pub struct StaticProfiles {
    profiles: DashMap<UserId, Profile>,
}

impl StaticProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserId, profile: Profile) {
        self.profiles.insert(user, profile);
    }
}

impl ProfileDirectory for StaticProfiles {
    fn profile<'a>(&'a self, user: &'a UserId) -> BoxFuture<'a, Option<Profile>> {
        let profile = self.profiles.get(user).map(|p| p.value().clone());
        Box::pin(async move { profile })
    }
}
