//! Per-connection subscription manager.
//!
//! Tracks which map channels a WebSocket client receives and provides
//! server-side message filtering. New connections receive every channel.

use std::collections::HashSet;

use crate::domain::MapChannel;

const ALL_CHANNELS: [MapChannel; 3] = [MapChannel::Contours, MapChannel::Knocks, MapChannel::Storms];

/// Manages the set of channel subscriptions for a single WebSocket connection.
#[derive(Debug)]
pub struct SubscriptionManager {
    channels: HashSet<MapChannel>,
}

impl SubscriptionManager {
    /// Creates a manager subscribed to every channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: ALL_CHANNELS.into_iter().collect(),
        }
    }

    /// Adds channels. `"*"` adds all; unknown names are returned.
    pub fn subscribe(&mut self, names: &[String]) -> Vec<String> {
        let (channels, unknown) = parse(names);
        self.channels.extend(channels);
        unknown
    }

    /// Removes channels. `"*"` removes all; unknown names are returned.
    pub fn unsubscribe(&mut self, names: &[String]) -> Vec<String> {
        let (channels, unknown) = parse(names);
        for channel in channels {
            self.channels.remove(&channel);
        }
        unknown
    }

    /// Returns `true` if messages on `channel` should be forwarded.
    #[must_use]
    pub fn matches(&self, channel: MapChannel) -> bool {
        self.channels.contains(&channel)
    }

    /// Subscribed channels in a stable order.
    #[must_use]
    pub fn channels(&self) -> Vec<MapChannel> {
        ALL_CHANNELS
            .into_iter()
            .filter(|c| self.channels.contains(c))
            .collect()
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(names: &[String]) -> (Vec<MapChannel>, Vec<String>) {
    let mut channels = Vec::new();
    let mut unknown = Vec::new();
    for name in names {
        if name == "*" {
            channels.extend(ALL_CHANNELS);
        } else {
            match name.parse::<MapChannel>() {
                Ok(channel) => channels.push(channel),
                Err(_) => unknown.push(name.clone()),
            }
        }
    }
    (channels, unknown)
}
