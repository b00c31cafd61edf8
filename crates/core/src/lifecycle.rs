use chrono::{NaiveDate, Utc};

use crate::domain::leave_type::PolicyRegistry;
use crate::domain::member::{Actor, ActorContext, MemberId, OrgMember};
use crate::domain::request::{
    DecisionOutcome, DurationKind, LeaveDecision, LeaveRequest, LeaveRevision, LeaveStatus,
    LeaveSubmission, RequestId,
};
use crate::errors::LifecycleError;

/// Pure lifecycle rules: submission validation, decision application,
/// requester revisions, and withdrawal gating. All I/O stays with the
/// service that drives this.
#[derive(Clone, Debug, Default)]
pub struct ApprovalStateMachine;

/// Which comment field a deciding role writes into.
enum CommentSlot {
    Manager,
    Hr,
}

impl ApprovalStateMachine {
    /// Build a new request in `PendingManagerApproval`, or refuse with a
    /// validation/eligibility error. Half-day submissions get their end date
    /// forced onto the start date.
    pub fn submit(
        &self,
        registry: &PolicyRegistry,
        eligible: &[&OrgMember],
        actor: &ActorContext,
        requester_name: &str,
        submission: LeaveSubmission,
    ) -> Result<LeaveRequest, LifecycleError> {
        let fields = validate_draft(
            registry,
            eligible,
            &actor.member_id,
            DraftFields {
                leave_type_name: &submission.leave_type_name,
                start_date: submission.start_date,
                end_date: submission.end_date,
                duration_kind: submission.duration_kind,
                reason: &submission.reason,
                approver_id: &submission.approver_id,
            },
        )?;

        Ok(LeaveRequest {
            id: RequestId::generate(),
            requester_id: actor.member_id.clone(),
            requester_name: requester_name.to_string(),
            leave_type_name: fields.leave_type_name,
            start_date: fields.start_date,
            end_date: fields.end_date,
            duration_kind: submission.duration_kind,
            reason: fields.reason,
            status: LeaveStatus::PendingManagerApproval,
            approver_id: submission.approver_id,
            is_urgent: submission.is_urgent,
            notify_ids: dedupe_ids(submission.notify_ids),
            manager_comment: None,
            hr_comment: None,
            created_at: Utc::now(),
        })
    }

    /// Apply an approve/reject decision and return the updated record. The
    /// resolved approver may decide as a line manager; HR and admin actors
    /// always override.
    pub fn decide(
        &self,
        request: &LeaveRequest,
        actor: &ActorContext,
        decision: &LeaveDecision,
    ) -> Result<LeaveRequest, LifecycleError> {
        if !request.status.is_pending() {
            return Err(LifecycleError::InvalidTransition {
                request_id: request.id.0.clone(),
                status: request.status,
                operation: "a decision",
            });
        }

        let slot = authorize_decision(request, actor)?;
        let comment = decision
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
            .map(str::to_string);

        let mut updated = request.clone();
        match decision.outcome {
            DecisionOutcome::Reject => {
                let comment = comment.ok_or_else(|| {
                    LifecycleError::Validation("a rejection must carry a comment".to_string())
                })?;
                updated.status = LeaveStatus::Rejected;
                stamp_comment(&mut updated, &slot, Some(comment));
            }
            DecisionOutcome::Approve => {
                // A manager approval becomes final immediately; no pending-HR
                // hop is inserted before the terminal status.
                updated.status = LeaveStatus::Approved;
                stamp_comment(&mut updated, &slot, comment);
            }
        }

        Ok(updated)
    }

    /// Replace the mutable field set while the request still awaits manager
    /// approval and the actor owns it. Identity fields survive untouched.
    pub fn revise(
        &self,
        request: &LeaveRequest,
        actor: &ActorContext,
        registry: &PolicyRegistry,
        eligible: &[&OrgMember],
        revision: LeaveRevision,
    ) -> Result<LeaveRequest, LifecycleError> {
        if request.requester_id != actor.member_id || !request.permits_requester_mutation() {
            return Err(LifecycleError::NotEditable {
                request_id: request.id.0.clone(),
                status: request.status,
            });
        }

        let fields = validate_draft(
            registry,
            eligible,
            &request.requester_id,
            DraftFields {
                leave_type_name: &revision.leave_type_name,
                start_date: revision.start_date,
                end_date: revision.end_date,
                duration_kind: revision.duration_kind,
                reason: &revision.reason,
                approver_id: &revision.approver_id,
            },
        )?;

        let mut updated = request.clone();
        updated.leave_type_name = fields.leave_type_name;
        updated.start_date = fields.start_date;
        updated.end_date = fields.end_date;
        updated.duration_kind = revision.duration_kind;
        updated.reason = fields.reason;
        updated.approver_id = revision.approver_id;
        updated.is_urgent = revision.is_urgent;
        updated.notify_ids = dedupe_ids(revision.notify_ids);
        Ok(updated)
    }

    /// Withdrawal shares the revision precondition but removes the record.
    pub fn authorize_withdrawal(
        &self,
        request: &LeaveRequest,
        actor: &ActorContext,
    ) -> Result<(), LifecycleError> {
        if request.requester_id != actor.member_id || !request.permits_requester_mutation() {
            return Err(LifecycleError::NotWithdrawable {
                request_id: request.id.0.clone(),
                status: request.status,
            });
        }
        Ok(())
    }
}

fn authorize_decision(
    request: &LeaveRequest,
    actor: &ActorContext,
) -> Result<CommentSlot, LifecycleError> {
    match actor.role {
        Actor::LineManager if request.approver_id == actor.member_id => Ok(CommentSlot::Manager),
        Actor::HrReviewer | Actor::Admin => Ok(CommentSlot::Hr),
        Actor::LineManager | Actor::Requester => Err(LifecycleError::NotAuthorized {
            request_id: request.id.0.clone(),
            actor_id: actor.member_id.0.clone(),
        }),
    }
}

fn stamp_comment(request: &mut LeaveRequest, slot: &CommentSlot, comment: Option<String>) {
    let Some(comment) = comment else {
        return;
    };
    match slot {
        CommentSlot::Manager => request.manager_comment = Some(comment),
        CommentSlot::Hr => request.hr_comment = Some(comment),
    }
}

struct DraftFields<'a> {
    leave_type_name: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration_kind: DurationKind,
    reason: &'a str,
    approver_id: &'a MemberId,
}

struct ValidatedFields {
    leave_type_name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
}

fn validate_draft(
    registry: &PolicyRegistry,
    eligible: &[&OrgMember],
    requester_id: &MemberId,
    fields: DraftFields<'_>,
) -> Result<ValidatedFields, LifecycleError> {
    let reason = fields.reason.trim();
    if reason.is_empty() {
        return Err(LifecycleError::Validation("reason must not be empty".to_string()));
    }

    let config = registry.find(fields.leave_type_name).ok_or_else(|| {
        LifecycleError::Validation(format!(
            "unknown leave type `{}`",
            fields.leave_type_name.trim()
        ))
    })?;
    if !config.is_active {
        return Err(LifecycleError::Validation(format!(
            "leave type `{}` is not open for new requests",
            config.name
        )));
    }

    let end_date = match fields.duration_kind {
        DurationKind::HalfDay => fields.start_date,
        DurationKind::FullDay => {
            if fields.end_date < fields.start_date {
                return Err(LifecycleError::Validation(
                    "end date must not precede start date".to_string(),
                ));
            }
            fields.end_date
        }
    };

    let approver_is_eligible =
        eligible.iter().any(|member| &member.id == fields.approver_id);
    if !approver_is_eligible {
        return Err(LifecycleError::NoEligibleApprover {
            requester_id: requester_id.0.clone(),
            approver_id: fields.approver_id.0.clone(),
        });
    }

    Ok(ValidatedFields {
        leave_type_name: config.name.clone(),
        start_date: fields.start_date,
        end_date,
        reason: reason.to_string(),
    })
}

fn dedupe_ids(ids: Vec<MemberId>) -> Vec<MemberId> {
    let mut deduped: Vec<MemberId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !deduped.contains(&id) {
            deduped.push(id);
        }
    }
    deduped
}
