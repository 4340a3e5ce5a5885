//! Motions
//!
//! A motion is a named proposal introduced by a CALL_VOTE turn action. It is
//! resolved (seconded and voted, or dropped) within the turn it was called.

use serde::{Deserialize, Serialize};

/// A proposal under consideration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Motion {
    pub motion_id: String,
    pub title: String,
    /// Full text of the proposal as read to the council
    pub text: String,
    /// Resolution adopted by the phase if the motion passes
    pub decision_if_pass: String,
    /// Member id of the caller
    pub proposer: String,
    /// Round the motion was called in
    pub round: u32,
    /// Session-global turn index of the calling turn
    pub turn_index: u64,
}
