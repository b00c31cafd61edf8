use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::member::MemberId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    PendingManagerApproval,
    PendingHrApproval,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(&self) -> bool {
        match self {
            LeaveStatus::Approved | LeaveStatus::Rejected => true,
            LeaveStatus::PendingManagerApproval | LeaveStatus::PendingHrApproval => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.is_terminal()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationKind {
    FullDay,
    HalfDay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approve,
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveDecision {
    pub outcome: DecisionOutcome,
    pub comment: Option<String>,
}

/// A time-off request. `requester_name` and `leave_type_name` are snapshots
/// frozen at creation time; they are never re-resolved against the live
/// directory or policy registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: RequestId,
    pub requester_id: MemberId,
    pub requester_name: String,
    pub leave_type_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_kind: DurationKind,
    pub reason: String,
    pub status: LeaveStatus,
    pub approver_id: MemberId,
    pub is_urgent: bool,
    pub notify_ids: Vec<MemberId>,
    pub manager_comment: Option<String>,
    pub hr_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Days this request consumes. Half-day requests always count 0.5 even
    /// if a stored record carries a mismatched end date; inverted full-day
    /// ranges floor at zero.
    pub fn duration_days(&self) -> Decimal {
        match self.duration_kind {
            DurationKind::HalfDay => Decimal::new(5, 1),
            DurationKind::FullDay => {
                let span = (self.end_date - self.start_date).num_days() + 1;
                Decimal::from(span.max(0))
            }
        }
    }

    /// Requester-initiated edits and withdrawals are allowed only before any
    /// approver has acted.
    pub fn permits_requester_mutation(&self) -> bool {
        matches!(self.status, LeaveStatus::PendingManagerApproval)
    }
}

/// Caller-supplied fields for a new submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSubmission {
    pub leave_type_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_kind: DurationKind,
    pub reason: String,
    pub approver_id: MemberId,
    pub is_urgent: bool,
    pub notify_ids: Vec<MemberId>,
}

/// The mutable field set a requester may replace while the request is still
/// awaiting manager approval. Identity fields are not expressible here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRevision {
    pub leave_type_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_kind: DurationKind,
    pub reason: String,
    pub approver_id: MemberId,
    pub is_urgent: bool,
    pub notify_ids: Vec<MemberId>,
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use crate::domain::member::MemberId;

    use super::{DurationKind, LeaveRequest, LeaveStatus, RequestId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn request(kind: DurationKind, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        LeaveRequest {
            id: RequestId::generate(),
            requester_id: MemberId("u-1".to_string()),
            requester_name: "Asha Rao".to_string(),
            leave_type_name: "Annual Leave".to_string(),
            start_date: start,
            end_date: end,
            duration_kind: kind,
            reason: "family trip".to_string(),
            status: LeaveStatus::PendingManagerApproval,
            approver_id: MemberId("u-2".to_string()),
            is_urgent: false,
            notify_ids: Vec::new(),
            manager_comment: None,
            hr_comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn full_day_duration_counts_both_endpoints() {
        let request =
            request(DurationKind::FullDay, date(2024, 6, 10), date(2024, 6, 14));
        assert_eq!(request.duration_days(), Decimal::from(5));
    }

    #[test]
    fn half_day_duration_is_half_even_with_mismatched_end_date() {
        let request =
            request(DurationKind::HalfDay, date(2024, 6, 10), date(2024, 6, 20));
        assert_eq!(request.duration_days(), Decimal::new(5, 1));
    }

    #[test]
    fn inverted_full_day_range_floors_at_zero() {
        let request =
            request(DurationKind::FullDay, date(2024, 6, 14), date(2024, 6, 10));
        assert_eq!(request.duration_days(), Decimal::ZERO);
    }

    #[test]
    fn terminal_statuses_block_requester_mutation() {
        let mut request =
            request(DurationKind::FullDay, date(2024, 6, 10), date(2024, 6, 11));
        assert!(request.permits_requester_mutation());

        for status in
            [LeaveStatus::PendingHrApproval, LeaveStatus::Approved, LeaveStatus::Rejected]
        {
            request.status = status;
            assert!(!request.permits_requester_mutation());
        }
    }

    #[test]
    fn pending_and_terminal_partition_the_status_space() {
        assert!(LeaveStatus::PendingManagerApproval.is_pending());
        assert!(LeaveStatus::PendingHrApproval.is_pending());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
    }
}
