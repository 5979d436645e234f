use crate::decode::ScanCode;
use crate::directory::{MemberRecord, MembershipStatus};

/// Which stage a surfaced fault came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStage {
    Directory,
    Attendance,
}

/// The per-tick result handed to the presentation layer. Transient: consumed
/// once for display, never persisted. Suppressed scans produce no outcome at
/// all.
#[derive(Debug, Clone)]
pub enum CheckInOutcome {
    /// The frame carried no scannable code. The common case.
    NoCode,
    /// A code was admitted through the gate but matched no member.
    Unrecognized { code: ScanCode },
    /// A recognized member with a currently-valid membership; attendance has
    /// been recorded.
    Welcome {
        member: MemberRecord,
        status: MembershipStatus,
        days_remaining: i64,
    },
    /// A recognized member whose membership has lapsed. Advisory only: no
    /// attendance is recorded and nothing further happens.
    Expired { member: MemberRecord },
    /// No frame arrived within the stall timeout. Advisory, the pipeline
    /// keeps waiting.
    SourceStalled,
    /// The camera failed mid-run; the pipeline has gone idle and must be
    /// restarted manually.
    SourceFailed { reason: String },
    /// A directory or attendance call failed. The camera keeps running.
    Fault { stage: FaultStage, reason: String },
}
