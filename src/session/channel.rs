//! Per-channel session data.

use std::collections::HashMap;
use std::sync::Arc;

use crate::moderation::ChannelRules;

/// State of one joined channel.
///
/// Created when the channel is joined and dropped when it is parted. Only
/// the read loop touches it, so no locking is involved.
#[derive(Clone, Debug)]
pub struct ChannelState {
    name: String,
    trigger: String,
    rules: Arc<ChannelRules>,
    /// Timestamp (ms) of the last auto-reaction, per reaction key.
    last_reaction: HashMap<String, i64>,
}

impl ChannelState {
    pub fn new(name: impl Into<String>, trigger: impl Into<String>, rules: ChannelRules) -> Self {
        Self {
            name: name.into(),
            trigger: trigger.into(),
            rules: Arc::new(rules),
            last_reaction: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix that marks chat text as a sub-command in this channel.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn rules(&self) -> &Arc<ChannelRules> {
        &self.rules
    }

    pub fn last_reaction(&self, key: &str) -> Option<i64> {
        self.last_reaction.get(key).copied()
    }

    /// Record a reaction under `key` at `now_ms` unless one happened within
    /// `cooldown_ms`. Returns whether the reaction may go ahead.
    ///
    /// The elapsed time must strictly exceed the cooldown.
    pub fn try_react(&mut self, key: &str, now_ms: i64, cooldown_ms: i64) -> bool {
        let ready = match self.last_reaction.get(key) {
            Some(&last) => now_ms.saturating_sub(last) > cooldown_ms,
            None => true,
        };
        if ready {
            self.last_reaction.insert(key.to_string(), now_ms);
        }
        ready
    }
}
