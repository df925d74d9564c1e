//! Trial event log.
//!
//! Every trial of an extraction run records [`CoverEvent`]s: the cover that
//! was built, each widening of the eigensolver window, and how the trial
//! ended. The log travels with the trial's
//! [`TrialReport`](crate::extractor::TrialReport).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Events emitted during one trial.
///
/// Events are tagged with `#[serde(tag = "type")]` so they serialise as
/// `{ "type": "WindowWidened", ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CoverEvent {
    /// A cover was built and extraction is about to begin.
    TrialStarted {
        /// Trial index.
        trial: usize,
        /// Number of cover vertices.
        cover_size: usize,
        /// Stored entries of the cover adjacency matrix.
        cover_nnz: usize,
        /// Window the first eigensolver query uses.
        window: usize,
    },

    /// A loop-graph trial discarded a cover whose queried eigenvalues were
    /// all trivial and drew a new one.
    CoverRedrawn {
        /// Trial index.
        trial: usize,
        /// Covers drawn so far for this trial.
        attempt: usize,
    },

    /// Every eigenvalue in the window was inherited from the base; the
    /// window grows and the eigensolver is queried again.
    WindowWidened {
        /// Trial index.
        trial: usize,
        /// Previous window.
        from: usize,
        /// New window.
        to: usize,
        /// Eigenvalues filtered out at the previous window.
        inherited: usize,
    },

    /// A new eigenvalue passed filtering and certification.
    NewEigenvalueCertified {
        /// Trial index.
        trial: usize,
        /// The certified eigenvalue (shift removed).
        eigenvalue: f64,
        /// Window of the successful query.
        window: usize,
        /// Eigensolver queries issued for this trial.
        queries: usize,
        /// Wall time spent on extraction.
        elapsed: Duration,
    },

    /// The selected eigenvalue is smaller in magnitude than the partial
    /// base spectrum's cutoff. The run aborts after this event.
    CertificationFailed {
        /// Trial index.
        trial: usize,
        /// The selected eigenvalue.
        eigenvalue: f64,
        /// Magnitude cutoff it failed against.
        cutoff: f64,
    },
}

impl CoverEvent {
    /// Trial the event belongs to.
    pub fn trial(&self) -> usize {
        match self {
            CoverEvent::TrialStarted { trial, .. }
            | CoverEvent::CoverRedrawn { trial, .. }
            | CoverEvent::WindowWidened { trial, .. }
            | CoverEvent::NewEigenvalueCertified { trial, .. }
            | CoverEvent::CertificationFailed { trial, .. } => *trial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_type_tag() {
        let event = CoverEvent::WindowWidened {
            trial: 3,
            from: 2,
            to: 4,
            inherited: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "WindowWidened");
        assert_eq!(json["to"], 4);
        assert_eq!(event.trial(), 3);
    }
}
