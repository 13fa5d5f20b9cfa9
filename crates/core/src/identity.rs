use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Identifier of an authenticated user; owner columns store this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Creates a user identifier from its stored integer value.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the stored integer value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of the privilege group an identity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(i64);

impl GroupId {
    /// Creates a group identifier from its stored integer value.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the stored integer value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for GroupId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Acting identity for one gateway call.
///
/// Callers construct this from their authentication layer and hand it to
/// every enforcement call; nothing in the gateway reads ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    user_id: Option<UserId>,
    group_id: Option<GroupId>,
}

impl Identity {
    /// Creates an authenticated identity.
    #[must_use]
    pub fn authenticated(user_id: UserId, group_id: Option<GroupId>) -> Self {
        Self {
            user_id: Some(user_id),
            group_id,
        }
    }

    /// Creates an anonymous identity, optionally mapped to a public group.
    #[must_use]
    pub fn anonymous(group_id: Option<GroupId>) -> Self {
        Self {
            user_id: None,
            group_id,
        }
    }

    /// Returns whether a user is logged in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Returns the current user id, or `None` for anonymous callers.
    #[must_use]
    pub fn current_user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the privilege group, if any.
    #[must_use]
    pub fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    /// Prefix attached to denial messages so audit lines name the actor.
    #[must_use]
    pub fn error_message_prefix(&self) -> String {
        match (self.user_id, self.group_id) {
            (Some(user_id), Some(group_id)) => format!("[user #{user_id}, group #{group_id}] "),
            (Some(user_id), None) => format!("[user #{user_id}, no group] "),
            (None, Some(group_id)) => format!("[anonymous, group #{group_id}] "),
            (None, None) => "[anonymous] ".to_owned(),
        }
    }
}
