//! Contrastive explanations ("why this assignment and not another?").
//!
//! The converged assignment is the *context*. The user sorts agents into four
//! categories that restrict their domains; the solver then runs again from the
//! context to find the *no-good*, the best assignment it reaches under those
//! restrictions. The report lists what changed and what it cost.
//!
//! # Categories
//!
//! | # | Category          | Restricted domain            |
//! |---|-------------------|------------------------------|
//! | 1 | `FixedToContext`  | `{context value}`            |
//! | 2 | `ExcludeContext`  | `domain \ {context value}`   |
//! | 3 | `FixedTo(v)`      | `{v}`, `v` ≠ context value   |
//! | 4 | `Free`            | full domain (also unlisted)  |
//!
//! An agent may appear in at most one category.
//!
//! # Lifecycle
//!
//! ```text
//!   Explanation::new()        update_agents_before_generate_no_good()
//! [Constructed] ───────────────────────────────────────> [Prepared]
//!                                                            │
//!                                          generate_no_good()│
//!                                                            v
//!                                  explain(mode) ──────> [Generated]
//! ```
//!
//! ```rust,ignore
//! use dcop::explain::{ExplainMode, Explanation};
//!
//! dcop.execute()?;
//! let mut explanation = Explanation::from_sets(&mut dcop, [1], [2], [], [])?;
//! explanation.update_agents_before_generate_no_good()?;
//! explanation.generate_no_good()?;
//! println!("{}", explanation.explain(ExplainMode::Narrative)?);
//! ```

mod category;
mod explanation;
mod report;

pub use category::{Category, CategoryPartition};
pub use explanation::{Explanation, ExplanationStage};
pub use report::{
    AgentChange, EdgeChange, ExplainMode, ExplanationReport, OverlapChange, ParticipantChange,
    SatisfactionTrend,
};
