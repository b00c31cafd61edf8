use chrono::NaiveDate;
use rust_decimal::Decimal;

use leavedesk_core::{
    Actor, ActorContext, DecisionOutcome, DurationKind, EngineConfig, InMemoryDirectory,
    InMemoryRequestStore, LeaveDecision, LeaveLifecycleService, LeaveRevision, LeaveStatus,
    LeaveSubmission, LeaveTypeConfig, LeaveTypeId, LifecycleError, MemberId, OrgMember,
    RecordingNotifier,
};

type Service = LeaveLifecycleService<InMemoryRequestStore, RecordingNotifier, InMemoryDirectory>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn leave_type(id: &str, name: &str, allowance: u32, is_active: bool) -> LeaveTypeConfig {
    LeaveTypeConfig {
        id: LeaveTypeId(id.to_string()),
        name: name.to_string(),
        annual_allowance_days: allowance,
        description: String::new(),
        is_active,
    }
}

fn member(id: &str, name: &str, role_title: &str) -> OrgMember {
    OrgMember {
        id: MemberId(id.to_string()),
        name: name.to_string(),
        email: format!("{id}@example.test"),
        role_title: role_title.to_string(),
    }
}

fn harness() -> Service {
    let store = InMemoryRequestStore::with_leave_types(vec![
        leave_type("lt-annual", "Annual Leave", 20, true),
        leave_type("lt-sick", "Sick Leave", 10, true),
        leave_type("lt-study", "Study Leave", 5, false),
    ]);
    let directory = InMemoryDirectory::new(vec![
        member("u-req", "Dana Petrov", "Software Engineer"),
        member("u-mgr", "Noor Haddad", "Engineering Manager"),
        member("u-mgr2", "Felix Brandt", "Delivery Manager"),
        member("u-hr", "Ines Duarte", "HR Business Partner"),
        member("u-admin", "Ravi Shenoy", "Portal Admin"),
        member("u-cc", "Olu Adeyemi", "Software Engineer"),
    ]);
    LeaveLifecycleService::new(
        store,
        RecordingNotifier::default(),
        directory,
        &EngineConfig::default(),
    )
}

fn requester() -> ActorContext {
    ActorContext::new("u-req", Actor::Requester)
}

fn manager() -> ActorContext {
    ActorContext::new("u-mgr", Actor::LineManager)
}

fn full_days(start: NaiveDate, end: NaiveDate) -> LeaveSubmission {
    LeaveSubmission {
        leave_type_name: "Annual Leave".to_string(),
        start_date: start,
        end_date: end,
        duration_kind: DurationKind::FullDay,
        reason: "planned time off".to_string(),
        approver_id: MemberId("u-mgr".to_string()),
        is_urgent: false,
        notify_ids: Vec::new(),
    }
}

async fn submit_and_approve(service: &Service, start: NaiveDate, end: NaiveDate) {
    let receipt =
        service.submit(&requester(), full_days(start, end)).await.expect("submission");
    service
        .decide(
            &manager(),
            &receipt.request.id,
            LeaveDecision { outcome: DecisionOutcome::Approve, comment: None },
        )
        .await
        .expect("approval");
}

#[tokio::test]
async fn approved_history_reduces_the_remaining_balance() {
    let service = harness();
    submit_and_approve(&service, date(2024, 3, 4), date(2024, 3, 8)).await;
    submit_and_approve(&service, date(2024, 4, 1), date(2024, 4, 3)).await;

    let view = service
        .remaining_balance(&MemberId("u-req".to_string()), "Annual Leave")
        .await
        .expect("balance view");

    assert_eq!(view.used_days, Decimal::from(8));
    assert_eq!(view.remaining_days, Decimal::from(12));
}

#[tokio::test]
async fn half_day_submissions_store_a_single_day_and_count_half() {
    let service = harness();
    let mut submission = full_days(date(2024, 6, 10), date(2024, 6, 15));
    submission.duration_kind = DurationKind::HalfDay;

    let receipt = service.submit(&requester(), submission).await.expect("submission");
    assert_eq!(receipt.request.end_date, date(2024, 6, 10));
    assert_eq!(receipt.request.duration_days(), Decimal::new(5, 1));

    service
        .decide(
            &manager(),
            &receipt.request.id,
            LeaveDecision { outcome: DecisionOutcome::Approve, comment: None },
        )
        .await
        .expect("approval");

    let view = service
        .remaining_balance(&MemberId("u-req".to_string()), "Annual Leave")
        .await
        .expect("balance view");
    assert_eq!(view.remaining_days, Decimal::new(195, 1));
}

#[tokio::test]
async fn rejection_needs_a_comment_and_then_notifies_the_requester() {
    let service = harness();
    let receipt = service
        .submit(&requester(), full_days(date(2024, 6, 10), date(2024, 6, 12)))
        .await
        .expect("submission");

    let error = service
        .decide(
            &manager(),
            &receipt.request.id,
            LeaveDecision { outcome: DecisionOutcome::Reject, comment: None },
        )
        .await
        .expect_err("rejection without a comment");
    assert!(matches!(error, LifecycleError::Validation(_)));

    let rejected = service
        .decide(
            &manager(),
            &receipt.request.id,
            LeaveDecision {
                outcome: DecisionOutcome::Reject,
                comment: Some("coverage conflict".to_string()),
            },
        )
        .await
        .expect("rejection with a comment");

    assert_eq!(rejected.request.status, LeaveStatus::Rejected);
    assert_eq!(rejected.request.manager_comment.as_deref(), Some("coverage conflict"));

    let to_requester: Vec<String> = service_notices(&service)
        .into_iter()
        .filter(|(recipient, _)| recipient.0 == "u-req")
        .map(|(_, message)| message)
        .collect();
    assert!(to_requester.iter().any(|message| message.contains("rejected")));
}

#[tokio::test]
async fn an_approved_request_can_no_longer_be_edited_or_withdrawn() {
    let service = harness();
    let receipt = service
        .submit(&requester(), full_days(date(2024, 6, 10), date(2024, 6, 12)))
        .await
        .expect("submission");
    service
        .decide(
            &manager(),
            &receipt.request.id,
            LeaveDecision { outcome: DecisionOutcome::Approve, comment: None },
        )
        .await
        .expect("approval");

    let error = service
        .edit(&requester(), &receipt.request.id, revision_to(date(2024, 7, 1), date(2024, 7, 2)))
        .await
        .expect_err("edit after approval");
    assert!(matches!(error, LifecycleError::NotEditable { .. }));

    let error = service
        .withdraw(&requester(), &receipt.request.id)
        .await
        .expect_err("withdraw after approval");
    assert!(matches!(error, LifecycleError::NotWithdrawable { .. }));
}

#[tokio::test]
async fn hr_overrides_a_request_resolved_to_a_different_manager() {
    let service = harness();
    let receipt = service
        .submit(&requester(), full_days(date(2024, 6, 10), date(2024, 6, 12)))
        .await
        .expect("submission");

    let decided = service
        .decide(
            &ActorContext::new("u-hr", Actor::HrReviewer),
            &receipt.request.id,
            LeaveDecision { outcome: DecisionOutcome::Approve, comment: None },
        )
        .await
        .expect("hr override approval");

    assert_eq!(decided.request.status, LeaveStatus::Approved);
}

#[tokio::test]
async fn inactive_leave_types_are_refused_at_submission() {
    let service = harness();
    let mut submission = full_days(date(2024, 6, 10), date(2024, 6, 12));
    submission.leave_type_name = "Study Leave".to_string();

    let error = service.submit(&requester(), submission).await.expect_err("inactive type");
    assert!(matches!(error, LifecycleError::Validation(ref m) if m.contains("not open")));
}

#[tokio::test]
async fn deciding_twice_fails_and_never_double_counts_the_balance() {
    let service = harness();
    let receipt = service
        .submit(&requester(), full_days(date(2024, 6, 10), date(2024, 6, 12)))
        .await
        .expect("submission");
    let decision = LeaveDecision { outcome: DecisionOutcome::Approve, comment: None };

    service.decide(&manager(), &receipt.request.id, decision.clone()).await.expect("first");
    let error = service
        .decide(&manager(), &receipt.request.id, decision)
        .await
        .expect_err("second decision");
    assert!(matches!(error, LifecycleError::InvalidTransition { .. }));

    let view = service
        .remaining_balance(&MemberId("u-req".to_string()), "Annual Leave")
        .await
        .expect("balance view");
    assert_eq!(view.used_days, Decimal::from(3));
}

#[tokio::test]
async fn editing_a_pending_request_replaces_fields_and_keeps_identity() {
    let service = harness();
    let receipt = service
        .submit(&requester(), full_days(date(2024, 6, 10), date(2024, 6, 12)))
        .await
        .expect("submission");

    let edited = service
        .edit(&requester(), &receipt.request.id, revision_to(date(2024, 8, 5), date(2024, 8, 9)))
        .await
        .expect("edit while pending");

    assert_eq!(edited.request.id, receipt.request.id);
    assert_eq!(edited.request.requester_id, receipt.request.requester_id);
    assert_eq!(edited.request.requester_name, receipt.request.requester_name);
    assert_eq!(edited.request.created_at, receipt.request.created_at);

    assert_eq!(edited.request.leave_type_name, "Sick Leave");
    assert_eq!(edited.request.start_date, date(2024, 8, 5));
    assert_eq!(edited.request.end_date, date(2024, 8, 9));
    assert_eq!(edited.request.approver_id.0, "u-mgr2");
    assert_eq!(edited.request.reason, "medical appointment");
    assert!(edited.request.is_urgent);
}

#[tokio::test]
async fn withdrawal_deletes_the_request_and_tells_the_approver() {
    let service = harness();
    let receipt = service
        .submit(&requester(), full_days(date(2024, 6, 10), date(2024, 6, 12)))
        .await
        .expect("submission");

    service.withdraw(&requester(), &receipt.request.id).await.expect("withdrawal");

    let listing = service.visible_requests(&requester()).await.expect("listing");
    assert!(listing.is_empty());

    let error = service
        .withdraw(&requester(), &receipt.request.id)
        .await
        .expect_err("second withdrawal");
    assert!(matches!(error, LifecycleError::UnknownRequest { .. }));

    let to_approver: Vec<String> = service_notices(&service)
        .into_iter()
        .filter(|(recipient, _)| recipient.0 == "u-mgr")
        .map(|(_, message)| message)
        .collect();
    assert!(to_approver.iter().any(|message| message.contains("withdrew")));
}

#[tokio::test]
async fn a_manager_approval_raises_the_hr_review_notice() {
    let service = harness();
    let mut submission = full_days(date(2024, 6, 10), date(2024, 6, 12));
    submission.notify_ids = vec![MemberId("u-cc".to_string())];
    let receipt = service.submit(&requester(), submission).await.expect("submission");

    service
        .decide(
            &manager(),
            &receipt.request.id,
            LeaveDecision { outcome: DecisionOutcome::Approve, comment: None },
        )
        .await
        .expect("approval");

    let hr_messages: Vec<(MemberId, String)> = service_notices(&service)
        .into_iter()
        .filter(|(_, message)| message.contains("HR review expected"))
        .collect();
    let recipients: Vec<&str> =
        hr_messages.iter().map(|(recipient, _)| recipient.0.as_str()).collect();
    assert_eq!(recipients, vec!["u-hr", "u-admin"]);
}

#[tokio::test]
async fn eligible_approvers_lists_every_manager_title_except_the_requester() {
    let service = harness();
    let candidates = service
        .eligible_approvers(&MemberId("u-mgr".to_string()))
        .await
        .expect("candidate listing");

    let ids: Vec<&str> = candidates.iter().map(|member| member.id.0.as_str()).collect();
    assert_eq!(ids, vec!["u-mgr2"]);
}

fn revision_to(start: NaiveDate, end: NaiveDate) -> LeaveRevision {
    LeaveRevision {
        leave_type_name: "Sick Leave".to_string(),
        start_date: start,
        end_date: end,
        duration_kind: DurationKind::FullDay,
        reason: "medical appointment".to_string(),
        approver_id: MemberId("u-mgr2".to_string()),
        is_urgent: true,
        notify_ids: Vec::new(),
    }
}

fn service_notices(service: &Service) -> Vec<(MemberId, String)> {
    service_notifier(service).sent_notices()
}

fn service_notifier(service: &Service) -> &RecordingNotifier {
    service.notifier()
}
