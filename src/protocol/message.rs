//! Round messages exchanged between neighboring agents.
//!
//! MGM uses two kinds of message per round: the sender's committed value
//! (ASSIGNMENT) and the sender's best local reduction (GAIN).

use serde::{Deserialize, Serialize};

use crate::graph::{AgentId, Cost, Value};

/// Message types in an MGM round
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    /// Committed value as of the previous round
    Assignment,
    /// Local reduction computed this round
    Gain,
}

/// Message payload variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessagePayload {
    /// Sender's committed value
    Assignment {
        /// The value
        value: Value,
    },
    /// Sender's local reduction
    Gain {
        /// `lr`, zero when the sender has no improving move
        lr: Cost,
    },
}

/// Round message envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message type
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    /// Sending agent
    pub sender: AgentId,
    /// Receiving agent
    pub receiver: AgentId,
    /// Global clock tick the message belongs to
    pub clock: u64,
    /// Message payload
    pub payload: MessagePayload,
}

impl Message {
    /// Create an ASSIGNMENT message
    pub fn assignment(sender: AgentId, receiver: AgentId, clock: u64, value: Value) -> Self {
        Self {
            msg_type: MessageType::Assignment,
            sender,
            receiver,
            clock,
            payload: MessagePayload::Assignment { value },
        }
    }

    /// Create a GAIN message
    pub fn gain(sender: AgentId, receiver: AgentId, clock: u64, lr: Cost) -> Self {
        Self {
            msg_type: MessageType::Gain,
            sender,
            receiver,
            clock,
            payload: MessagePayload::Gain { lr },
        }
    }

    /// Value carried by an ASSIGNMENT message
    pub fn get_value(&self) -> Option<Value> {
        match self.payload {
            MessagePayload::Assignment { value } => Some(value),
            MessagePayload::Gain { .. } => None,
        }
    }

    /// Local reduction carried by a GAIN message
    pub fn get_gain(&self) -> Option<Cost> {
        match self.payload {
            MessagePayload::Gain { lr } => Some(lr),
            MessagePayload::Assignment { .. } => None,
        }
    }
}
