//! Post eligibility for a viewer.
//!
//! A viewer sees their own posts, every public post, and friends-only posts
//! written by a friend. The same filter value backs the count query, the
//! candidate query and the in-process predicate for one request.

use std::collections::HashSet;
use uuid::Uuid;

use crate::models::PostPrivacy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityFilter {
    viewer_id: Uuid,
    friend_ids: HashSet<Uuid>,
}

impl VisibilityFilter {
    pub fn new(viewer_id: Uuid, friend_ids: HashSet<Uuid>) -> Self {
        Self {
            viewer_id,
            friend_ids,
        }
    }

    pub fn viewer_id(&self) -> Uuid {
        self.viewer_id
    }

    pub fn is_friend(&self, user_id: &Uuid) -> bool {
        self.friend_ids.contains(user_id)
    }

    pub fn allows(&self, author_id: Uuid, privacy: PostPrivacy) -> bool {
        author_id == self.viewer_id
            || privacy == PostPrivacy::Public
            || (privacy == PostPrivacy::Friends && self.friend_ids.contains(&author_id))
    }

    /// Friend ids as a sorted array, for `= ANY($n)` binds.
    pub fn friend_id_list(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.friend_ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
