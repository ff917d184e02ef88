//! Missed-round detection from the producer's unpaid-block counter.
//!
//! The counter grows while the producer signs blocks and drops back when it
//! claims rewards, so comparing consecutive observations tells us whether a
//! round was produced.

use crate::state::MonitorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// First observation, baseline recorded
    Initializing,
    /// Counter went down: rewards were claimed. Clears `rounds_missed`.
    Reset { previous: u64, current: u64 },
    /// New blocks were produced since the last poll
    Progress {
        delta: u64,
        /// Missed rounds that were outstanding before this progress
        recovered_after: Option<u32>,
    },
    /// No new blocks since the last poll
    Missed { rounds_missed: u32 },
}

/// Compare an unpaid-block observation against the stored baseline and update
/// the state accordingly.
pub fn classify(state: &mut MonitorState, unpaid_blocks: u64) -> RoundOutcome {
    log::debug!(
        "Unpaid block states: unpaid_blocks={} last_unpaid={:?}",
        unpaid_blocks, state.last_unpaid_blocks
    );

    let Some(last_unpaid) = state.last_unpaid_blocks else {
        log::info!("Initializing unpaid block count at {}", unpaid_blocks);
        state.last_unpaid_blocks = Some(unpaid_blocks);
        return RoundOutcome::Initializing;
    };

    if unpaid_blocks < last_unpaid {
        log::debug!(
            "Resetting unpaid blocks {} -> {}, encountered reward claim",
            last_unpaid, unpaid_blocks
        );
        state.last_unpaid_blocks = Some(unpaid_blocks);
        state.rounds_missed = 0;
        return RoundOutcome::Reset {
            previous: last_unpaid,
            current: unpaid_blocks,
        };
    }

    if unpaid_blocks > last_unpaid {
        let delta = unpaid_blocks - last_unpaid;
        log::info!(
            "Round success, witnessed {} new unpaid blocks ({} -> {})",
            delta, last_unpaid, unpaid_blocks
        );
        state.last_unpaid_blocks = Some(unpaid_blocks);

        let recovered_after = if state.rounds_missed > 0 {
            log::info!("Producer recovered after {} missed rounds", state.rounds_missed);
            Some(std::mem::take(&mut state.rounds_missed))
        } else {
            None
        };
        return RoundOutcome::Progress { delta, recovered_after };
    }

    state.rounds_missed = state.rounds_missed.saturating_add(1);
    log::info!(
        "Producer missed a round! unpaid_blocks={} rounds_missed={}",
        unpaid_blocks, state.rounds_missed
    );
    RoundOutcome::Missed {
        rounds_missed: state.rounds_missed,
    }
}
