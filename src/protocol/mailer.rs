//! Round-synchronous message delivery.
//!
//! Agents post messages during a phase; nothing is visible to receivers until
//! the coordinator calls [`Mailer::deliver`] at the phase barrier. Delivery
//! sorts by `(receiver, sender)`, so the order in which agents posted never
//! leaks into what they read.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use super::message::{Message, MessageType};
use crate::error::{DcopError, Result};
use crate::graph::{AgentId, ConstraintGraph};

/// Local, deterministic mailer for one DCOP.
#[derive(Debug, Clone)]
pub struct Mailer {
    clock: u64,
    links: BTreeMap<AgentId, BTreeSet<AgentId>>,
    outbox: Vec<Message>,
    inboxes: BTreeMap<AgentId, Vec<Message>>,
    sent_this_tick: BTreeSet<(AgentId, AgentId, MessageType)>,
    delivered: u64,
}

impl Mailer {
    /// Create a mailer over the adjacency of `graph`.
    pub fn new(graph: &ConstraintGraph) -> Result<Self> {
        let mut links = BTreeMap::new();
        for spec in graph.agents() {
            links.insert(spec.id, graph.neighbors(spec.id)?.into_iter().collect());
        }
        Ok(Self {
            clock: 0,
            links,
            outbox: Vec::new(),
            inboxes: BTreeMap::new(),
            sent_this_tick: BTreeSet::new(),
            delivered: 0,
        })
    }

    /// Current tick.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Total messages delivered since creation.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Messages posted but not yet delivered.
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Start tick `clock`, dropping anything left over from the previous one.
    pub fn open_round(&mut self, clock: u64) {
        self.clock = clock;
        self.outbox.clear();
        self.inboxes.clear();
        self.sent_this_tick.clear();
    }

    /// Queue a message for the next barrier.
    pub fn post(&mut self, message: Message) -> Result<()> {
        if message.clock != self.clock {
            return Err(DcopError::Protocol(format!(
                "A_{} sent a message stamped {} during tick {}",
                message.sender, message.clock, self.clock
            )));
        }

        let is_neighbor = self
            .links
            .get(&message.sender)
            .is_some_and(|n| n.contains(&message.receiver));
        if !is_neighbor {
            return Err(DcopError::Protocol(format!(
                "A_{} is not a neighbor of A_{}",
                message.receiver, message.sender
            )));
        }

        let key = (message.sender, message.receiver, message.msg_type);
        if !self.sent_this_tick.insert(key) {
            return Err(DcopError::Protocol(format!(
                "A_{} already sent {:?} to A_{} in tick {}",
                message.sender, message.msg_type, message.receiver, self.clock
            )));
        }

        self.outbox.push(message);
        Ok(())
    }

    /// Post a batch of messages.
    pub fn post_all(&mut self, messages: impl IntoIterator<Item = Message>) -> Result<()> {
        for message in messages {
            self.post(message)?;
        }
        Ok(())
    }

    /// Barrier: move every queued message into its receiver's inbox.
    pub fn deliver(&mut self) -> usize {
        let mut batch = std::mem::take(&mut self.outbox);
        batch.sort_by_key(|m| (m.receiver, m.sender));
        let count = batch.len();
        for message in batch {
            self.inboxes.entry(message.receiver).or_default().push(message);
        }
        self.delivered += count as u64;
        trace!(clock = self.clock, count, "delivered");
        count
    }

    /// Hand over (and clear) the inbox of `agent`.
    pub fn take_inbox(&mut self, agent: AgentId) -> Vec<Message> {
        self.inboxes.remove(&agent).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> ConstraintGraph {
        let mut builder = ConstraintGraph::builder("path");
        let a = builder.add_agent(2, vec![0, 0], 0);
        let b = builder.add_agent(2, vec![0, 0], 0);
        let c = builder.add_agent(2, vec![0, 0], 0);
        builder.add_edge(a, b, |_, _| 0).unwrap();
        builder.add_edge(b, c, |_, _| 0).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_nothing_visible_before_barrier() {
        let mut mailer = Mailer::new(&path()).unwrap();
        mailer.post(Message::assignment(1, 2, 0, 1)).unwrap();
        assert_eq!(mailer.pending(), 1);
        assert!(mailer.take_inbox(2).is_empty());
        assert_eq!(mailer.deliver(), 1);
        assert_eq!(mailer.take_inbox(2).len(), 1);
    }

    #[test]
    fn test_delivery_order_independent_of_post_order() {
        let mut first = Mailer::new(&path()).unwrap();
        first.post(Message::gain(3, 2, 0, 5)).unwrap();
        first.post(Message::gain(1, 2, 0, 9)).unwrap();
        first.deliver();

        let mut second = Mailer::new(&path()).unwrap();
        second.post(Message::gain(1, 2, 0, 9)).unwrap();
        second.post(Message::gain(3, 2, 0, 5)).unwrap();
        second.deliver();

        assert_eq!(first.take_inbox(2), second.take_inbox(2));
    }

    #[test]
    fn test_rejects_stale_clock_and_strangers() {
        let mut mailer = Mailer::new(&path()).unwrap();
        mailer.open_round(3);
        assert!(mailer.post(Message::assignment(1, 2, 2, 0)).is_err());
        assert!(mailer.post(Message::assignment(1, 3, 3, 0)).is_err());
        assert!(mailer.post(Message::assignment(1, 2, 3, 0)).is_ok());
        assert!(mailer.post(Message::assignment(1, 2, 3, 1)).is_err());
    }

    #[test]
    fn test_open_round_clears_leftovers() {
        let mut mailer = Mailer::new(&path()).unwrap();
        mailer.post(Message::assignment(2, 1, 0, 0)).unwrap();
        mailer.deliver();
        mailer.open_round(1);
        assert!(mailer.take_inbox(1).is_empty());
        assert_eq!(mailer.delivered(), 1);
        assert_eq!(mailer.clock(), 1);
    }
}
