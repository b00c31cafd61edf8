use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::leave_type::{LeaveTypeConfig, PolicyRegistry};
use crate::domain::member::MemberId;
use crate::domain::request::{LeaveRequest, LeaveStatus};

/// Derived entitlement row for one requester and leave type. Computed fresh
/// on every read; approvals can land between reads, so a view is a
/// point-in-time estimate, not a reservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub leave_type_name: String,
    pub allowance_days: Decimal,
    pub used_days: Decimal,
    pub remaining_days: Decimal,
}

#[derive(Clone, Debug, Default)]
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Days consumed by approved requests of the given type. Pending and
    /// rejected requests never count.
    pub fn used_days(
        &self,
        requests: &[LeaveRequest],
        requester_id: &MemberId,
        leave_type_name: &str,
    ) -> Decimal {
        let key = normalize_key(leave_type_name);
        requests
            .iter()
            .filter(|request| &request.requester_id == requester_id)
            .filter(|request| normalize_key(&request.leave_type_name) == key)
            .filter(|request| request.status == LeaveStatus::Approved)
            .map(|request| request.duration_days())
            .sum()
    }

    /// Remaining entitlement floors at zero even when approved history
    /// exceeds the allowance.
    pub fn view(
        &self,
        config: &LeaveTypeConfig,
        requests: &[LeaveRequest],
        requester_id: &MemberId,
    ) -> BalanceView {
        let allowance_days = Decimal::from(config.annual_allowance_days);
        let used_days = self.used_days(requests, requester_id, &config.name);
        let remaining_days = (allowance_days - used_days).max(Decimal::ZERO);

        BalanceView {
            leave_type_name: config.name.clone(),
            allowance_days,
            used_days,
            remaining_days,
        }
    }

    /// One view per active leave type, in registry order.
    pub fn summary(
        &self,
        registry: &PolicyRegistry,
        requests: &[LeaveRequest],
        requester_id: &MemberId,
    ) -> Vec<BalanceView> {
        registry
            .active_types()
            .into_iter()
            .map(|config| self.view(config, requests, requester_id))
            .collect()
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, Utc};
    use rust_decimal::Decimal;

    use crate::domain::leave_type::{LeaveTypeConfig, LeaveTypeId, PolicyRegistry};
    use crate::domain::member::MemberId;
    use crate::domain::request::{DurationKind, LeaveRequest, LeaveStatus, RequestId};

    use super::BalanceCalculator;

    fn annual_leave(allowance: u32) -> LeaveTypeConfig {
        LeaveTypeConfig {
            id: LeaveTypeId("lt-annual".to_string()),
            name: "Annual Leave".to_string(),
            annual_allowance_days: allowance,
            description: String::new(),
            is_active: true,
        }
    }

    fn approved_full_days(requester: &str, days: u32) -> LeaveRequest {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date");
        let end = start + Duration::days(i64::from(days) - 1);
        LeaveRequest {
            id: RequestId::generate(),
            requester_id: MemberId(requester.to_string()),
            requester_name: "Priya Nair".to_string(),
            leave_type_name: "Annual Leave".to_string(),
            start_date: start,
            end_date: end,
            duration_kind: DurationKind::FullDay,
            reason: "holiday".to_string(),
            status: LeaveStatus::Approved,
            approver_id: MemberId("u-mgr".to_string()),
            is_urgent: false,
            notify_ids: Vec::new(),
            manager_comment: None,
            hr_comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn remaining_subtracts_approved_history_from_the_allowance() {
        let calculator = BalanceCalculator;
        let requester = MemberId("u-1".to_string());
        let requests = vec![approved_full_days("u-1", 5), approved_full_days("u-1", 3)];

        let view = calculator.view(&annual_leave(20), &requests, &requester);
        assert_eq!(view.used_days, Decimal::from(8));
        assert_eq!(view.remaining_days, Decimal::from(12));
    }

    #[test]
    fn pending_and_rejected_requests_never_count_as_used() {
        let calculator = BalanceCalculator;
        let requester = MemberId("u-1".to_string());
        let mut pending = approved_full_days("u-1", 5);
        pending.status = LeaveStatus::PendingManagerApproval;
        let mut rejected = approved_full_days("u-1", 5);
        rejected.status = LeaveStatus::Rejected;

        let view = calculator.view(&annual_leave(20), &[pending, rejected], &requester);
        assert_eq!(view.used_days, Decimal::ZERO);
        assert_eq!(view.remaining_days, Decimal::from(20));
    }

    #[test]
    fn other_requesters_history_is_ignored() {
        let calculator = BalanceCalculator;
        let requester = MemberId("u-1".to_string());
        let requests = vec![approved_full_days("u-1", 2), approved_full_days("u-2", 9)];

        let view = calculator.view(&annual_leave(20), &requests, &requester);
        assert_eq!(view.used_days, Decimal::from(2));
    }

    #[test]
    fn remaining_floors_at_zero_when_history_exceeds_the_allowance() {
        let calculator = BalanceCalculator;
        let requester = MemberId("u-1".to_string());
        let requests = vec![approved_full_days("u-1", 15), approved_full_days("u-1", 10)];

        let view = calculator.view(&annual_leave(20), &requests, &requester);
        assert_eq!(view.used_days, Decimal::from(25));
        assert_eq!(view.remaining_days, Decimal::ZERO);
    }

    #[test]
    fn half_day_requests_consume_half_a_day() {
        let calculator = BalanceCalculator;
        let requester = MemberId("u-1".to_string());
        let mut half_day = approved_full_days("u-1", 1);
        half_day.duration_kind = DurationKind::HalfDay;

        let view = calculator.view(&annual_leave(20), &[half_day], &requester);
        assert_eq!(view.used_days, Decimal::new(5, 1));
        assert_eq!(view.remaining_days, Decimal::new(195, 1));
    }

    #[test]
    fn summary_lists_one_view_per_active_type() {
        let calculator = BalanceCalculator;
        let requester = MemberId("u-1".to_string());
        let mut sick = annual_leave(10);
        sick.id = LeaveTypeId("lt-sick".to_string());
        sick.name = "Sick Leave".to_string();
        let mut retired = annual_leave(5);
        retired.id = LeaveTypeId("lt-retired".to_string());
        retired.name = "Sabbatical".to_string();
        retired.is_active = false;

        let registry = PolicyRegistry::new(vec![annual_leave(20), sick, retired]);
        let summary = calculator.summary(&registry, &[], &requester);

        let names: Vec<&str> =
            summary.iter().map(|view| view.leave_type_name.as_str()).collect();
        assert_eq!(names, vec!["Annual Leave", "Sick Leave"]);
    }
}
