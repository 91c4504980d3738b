use std::collections::HashSet;

use crate::messages::ChannelStateFields;
use crate::types::{ChannelId, SessionId};

/// A channel node in the server's channel tree Read-only from
/// the outside; see the module doc comment.
pub struct Channel {
    channel_id: ChannelId,
    parent: Option<ChannelId>,
    name: String,
    description: Option<String>,
    description_hash: Option<Vec<u8>>,
    description_requested: bool,
    temporary: bool,
    position: i32,
    max_users: u32,
    links: HashSet<ChannelId>,
    /// Session ids of users currently in this channel, in the order they
    /// joined.
    users: Vec<SessionId>,
    /// Child channel ids, in the order `ChannelState` introduced them.
    children: Vec<ChannelId>,
}

impl Channel {
    pub(crate) fn from_initial_state(fields: &ChannelStateFields) -> Self {
        let mut channel = Channel {
            channel_id: fields.channel_id,
            parent: fields.parent,
            name: fields.name.clone().unwrap_or_default(),
            description: fields.description.clone(),
            description_hash: fields.description_hash.clone(),
            description_requested: false,
            temporary: fields.temporary.unwrap_or(false),
            position: fields.position.unwrap_or(0),
            max_users: fields.max_users.unwrap_or(0),
            links: HashSet::new(),
            users: Vec::new(),
            children: Vec::new(),
        };
        channel.apply_update(fields);
        channel
    }

    /// Apply a subsequent `ChannelState`'s present fields. `links` replaces
    /// the set wholesale; `links_add`/`links_remove` mutate it incrementally
    /// instead.
    pub(crate) fn apply_update(&mut self, fields: &ChannelStateFields) {
        if fields.parent.is_some() {
            self.parent = fields.parent;
        }
        if let Some(name) = &fields.name {
            self.name = name.clone();
        }
        if let Some(description) = &fields.description {
            self.description = Some(description.clone());
            self.description_requested = false;
        }
        if let Some(description_hash) = &fields.description_hash {
            self.description_hash = Some(description_hash.clone());
            self.description_requested = false;
        }
        if let Some(temporary) = fields.temporary {
            self.temporary = temporary;
        }
        if let Some(position) = fields.position {
            self.position = position;
        }
        if let Some(max_users) = fields.max_users {
            self.max_users = max_users;
        }
        if let Some(links) = &fields.links {
            self.links = links.iter().copied().collect();
        }
        for added in &fields.links_add {
            self.links.insert(*added);
        }
        for removed in &fields.links_remove {
            self.links.remove(removed);
        }
    }

    pub(crate) fn mark_description_requested(&mut self) {
        self.description_requested = true;
    }

    /// Remove `other` from this channel's link set, mirroring a
    /// `links_remove` the other channel's `ChannelState` named us in.
    pub(crate) fn remove_link(&mut self, other: ChannelId) {
        self.links.remove(&other);
    }

    pub(crate) fn add_child(&mut self, child: ChannelId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: ChannelId) {
        self.children.retain(|&id| id != child);
    }

    pub(crate) fn add_user(&mut self, session: SessionId) {
        if !self.users.contains(&session) {
            self.users.push(session);
        }
    }

    pub(crate) fn remove_user(&mut self, session: SessionId) {
        self.users.retain(|&id| id != session);
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn parent(&self) -> Option<ChannelId> {
        self.parent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn description_hash(&self) -> Option<&[u8]> {
        self.description_hash.as_deref()
    }

    pub fn needs_description_blob(&self) -> bool {
        self.description_hash.is_some() && self.description.is_none() && !self.description_requested
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn max_users(&self) -> u32 {
        self.max_users
    }

    pub fn links(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.links.iter().copied()
    }

    pub fn is_linked_to(&self, other: ChannelId) -> bool {
        self.links.contains(&other)
    }

    pub fn users(&self) -> &[SessionId] {
        &self.users
    }

    pub fn children(&self) -> &[ChannelId] {
        &self.children
    }

    pub fn is_full(&self) -> bool {
        self.max_users > 0 && self.users.len() as u32 >= self.max_users
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(id: ChannelId) -> ChannelStateFields {
        ChannelStateFields { channel_id: id, ..Default::default() }
    }

    #[test]
    fn links_add_and_remove_mutate_incrementally() {
        let mut channel = Channel::from_initial_state(&fields(0));
        channel.apply_update(&ChannelStateFields { channel_id: 0, links_add: vec![1, 2], ..Default::default() });
        assert!(channel.is_linked_to(1));
        assert!(channel.is_linked_to(2));

        channel.apply_update(&ChannelStateFields { channel_id: 0, links_remove: vec![1], ..Default::default() });
        assert!(!channel.is_linked_to(1));
        assert!(channel.is_linked_to(2));
    }

    #[test]
    fn a_fresh_description_hash_reopens_the_request_need() {
        let mut channel = Channel::from_initial_state(&fields(0));
        channel.apply_update(&ChannelStateFields {
            channel_id: 0,
            description_hash: Some(vec![1]),
            ..Default::default()
        });
        channel.mark_description_requested();
        assert!(!channel.needs_description_blob());

        channel.apply_update(&ChannelStateFields {
            channel_id: 0,
            description_hash: Some(vec![2]),
            ..Default::default()
        });
        assert!(channel.needs_description_blob());
    }

    #[test]
    fn remove_link_unlinks_from_the_other_side() {
        let mut channel = Channel::from_initial_state(&fields(0));
        channel.apply_update(&ChannelStateFields { channel_id: 0, links_add: vec![1], ..Default::default() });
        assert!(channel.is_linked_to(1));
        channel.remove_link(1);
        assert!(!channel.is_linked_to(1));
    }

    #[test]
    fn full_links_replaces_entire_set() {
        let mut channel = Channel::from_initial_state(&fields(0));
        channel.apply_update(&ChannelStateFields { channel_id: 0, links_add: vec![5], ..Default::default() });
        channel.apply_update(&ChannelStateFields { channel_id: 0, links: Some(vec![9]), ..Default::default() });
        assert!(!channel.is_linked_to(5));
        assert!(channel.is_linked_to(9));
    }

    #[test]
    fn user_roster_preserves_join_order_and_no_duplicates() {
        let mut channel = Channel::from_initial_state(&fields(0));
        channel.add_user(3);
        channel.add_user(1);
        channel.add_user(3);
        assert_eq!(channel.users(), &[3, 1]);
        channel.remove_user(3);
        assert_eq!(channel.users(), &[1]);
    }

    #[test]
    fn is_full_respects_unlimited_max_users() {
        let mut channel = Channel::from_initial_state(&fields(0));
        channel.add_user(1);
        assert!(!channel.is_full());
    }
}
