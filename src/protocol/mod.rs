//! MGM round protocol: agents, messages, and the mailer.
//!
//! # Round Overview
//!
//! Every round is a fixed sequence of phases separated by mailer barriers.
//! Nothing an agent posts is visible to anyone until the barrier, so each
//! phase reads a frozen snapshot of the previous one.
//!
//! ```text
//!  Agent i                         Mailer                        Agent j
//!     |                              |                              |
//!     |--- ASSIGNMENT(x_i) --------->|<-------- ASSIGNMENT(x_j) ----|
//!     |                        [ deliver ]                          |
//!     |<-- x_j ----------------------|---------------------- x_i -->|
//!     |  compute lr_i                |                 compute lr_j |
//!     |--- GAIN(lr_i) -------------->|<-------------- GAIN(lr_j) ---|
//!     |                        [ deliver ]                          |
//!     |<-- lr_j ---------------------|--------------------- lr_i -->|
//!     |  commit iff lr_i > lr_j      |       commit iff lr_j > lr_i |
//! ```
//!
//! ## State Machine
//!
//! | Status    | Operation          | Next      |
//! |-----------|--------------------|-----------|
//! | `Observe` | `observe()`        | `Compute` |
//! | `Compute` | `compute()`        | `Compare` |
//! | `Compare` | `compare()`        | `Decide`  |
//! | `Decide`  | `commit_or_hold()` | `Observe` |
//!
//! Calling an operation in any other status is a protocol error.
//!
//! ## Tie Handling
//!
//! An agent commits only when its `lr` is strictly greater than every
//! neighbor's. Two neighbors with the same nonzero `lr` both hold; this can
//! stall on a plateau and is kept as-is.

mod agent;
mod mailer;
mod message;

pub use agent::{AgentStatus, MgmAgent, RoundState};
pub use mailer::Mailer;
pub use message::{Message, MessagePayload, MessageType};
