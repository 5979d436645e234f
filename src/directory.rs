use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;

use crate::decode::ScanCode;
use crate::error::{AttendanceError, DirectoryError};

/// A member as stored by the surrounding system. Looked up by scan code,
/// never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub id: i64,
    pub full_name: String,
    pub phone: String,
    pub valid_until: NaiveDate,
    pub photo_path: Option<PathBuf>,
}

/// Derived from the valid-until date at scan time, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Active,
    ExpiringSoon,
    Expired,
}

/// Classifies a membership against `today`. A valid-until date in the past
/// is Expired; within `expiring_soon_days` of today (inclusive) and not past
/// is ExpiringSoon; anything later is Active.
pub fn membership_status(
    valid_until: NaiveDate,
    today: NaiveDate,
    expiring_soon_days: i64,
) -> MembershipStatus {
    if valid_until < today {
        MembershipStatus::Expired
    } else if (valid_until - today).num_days() <= expiring_soon_days {
        MembershipStatus::ExpiringSoon
    } else {
        MembershipStatus::Active
    }
}

/// Whole days until the membership lapses, clamped to zero for display.
pub fn days_remaining(valid_until: NaiveDate, today: NaiveDate) -> i64 {
    (valid_until - today).num_days().max(0)
}

/// Membership lookup capability. Pure read; must tolerate concurrent calls
/// from unrelated pipeline instances.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn lookup_by_scan_code(
        &self,
        code: &ScanCode,
    ) -> Result<Option<MemberRecord>, DirectoryError>;
}

/// Attendance log capability. Append-only; the cooldown gate already
/// prevents duplicate calls within the window, so no idempotency is
/// required here.
#[async_trait]
pub trait AttendanceSink: Send + Sync {
    async fn record(&self, member_id: i64, at: DateTime<Utc>) -> Result<(), AttendanceError>;
}
