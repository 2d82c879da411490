// Caller identity supplied by the auth layer

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    /// A signed-in seller. Only their own stock rows are visible.
    User(String),
    /// Marketplace sync jobs and the scheduler. Acts on whichever owner the
    /// referenced stock rows belong to.
    Service,
}

impl Principal {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Principal::User(id) => Some(id.as_str()),
            Principal::Service => None,
        }
    }

    pub fn can_see(&self, owner_id: &str) -> bool {
        match self {
            Principal::User(id) => id == owner_id,
            Principal::Service => true,
        }
    }
}
