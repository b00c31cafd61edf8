use serde_json::json;
use tracing::{info, warn};

use crate::approvers::ApproverResolver;
use crate::balance::{BalanceCalculator, BalanceView};
use crate::collaborators::{Directory, EmailPayload, Notifier, RequestFilter, RequestStore};
use crate::config::EngineConfig;
use crate::domain::leave_type::PolicyRegistry;
use crate::domain::member::{Actor, ActorContext, MemberId, OrgMember};
use crate::domain::request::{
    LeaveDecision, LeaveRequest, LeaveRevision, LeaveSubmission, RequestId,
};
use crate::errors::LifecycleError;
use crate::lifecycle::ApprovalStateMachine;
use crate::notifications::{status_label, LifecycleEvent, NotificationFanout, NotificationPlan};

/// Result of a committed lifecycle operation. `notification_warnings` carries
/// delivery failures that happened after the store write; the transition
/// itself is never rolled back for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationReceipt {
    pub request: LeaveRequest,
    pub notification_warnings: Vec<String>,
}

/// Façade composing the policy registry, state machine, approver resolver,
/// balance calculator, and notification fan-out over the collaborator
/// contracts. One public operation is one awaited unit of work; every
/// mutation re-fetches the current record first.
pub struct LeaveLifecycleService<S, N, D> {
    store: S,
    notifier: N,
    directory: D,
    machine: ApprovalStateMachine,
    resolver: ApproverResolver,
    calculator: BalanceCalculator,
    fanout: NotificationFanout,
}

impl<S, N, D> LeaveLifecycleService<S, N, D>
where
    S: RequestStore,
    N: Notifier,
    D: Directory,
{
    pub fn new(store: S, notifier: N, directory: D, config: &EngineConfig) -> Self {
        Self {
            store,
            notifier,
            directory,
            machine: ApprovalStateMachine,
            resolver: ApproverResolver::from_config(&config.approvals),
            calculator: BalanceCalculator,
            fanout: NotificationFanout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub async fn submit(
        &self,
        actor: &ActorContext,
        submission: LeaveSubmission,
    ) -> Result<OperationReceipt, LifecycleError> {
        let members = self.members().await?;
        let registry = self.registry().await?;
        let requester_name = members
            .iter()
            .find(|member| member.id == actor.member_id)
            .map(|member| member.name.clone())
            .ok_or_else(|| {
                LifecycleError::Validation(format!(
                    "requester `{}` is not a directory member",
                    actor.member_id.0
                ))
            })?;

        let eligible = self.resolver.eligible_approvers(&members, &actor.member_id);
        let request =
            self.machine.submit(&registry, &eligible, actor, &requester_name, submission)?;

        self.store
            .create_request(request.clone())
            .await
            .map_err(|source| LifecycleError::collaborator("store.create_request", source))?;
        info!(
            event_name = "leave.request_submitted",
            request_id = request.id.0.as_str(),
            requester_id = request.requester_id.0.as_str(),
            "leave request submitted"
        );

        let plan = self.fanout.plan(&LifecycleEvent::Submitted, &request, &[]);
        let notification_warnings = self.deliver(&plan).await;
        Ok(OperationReceipt { request, notification_warnings })
    }

    pub async fn edit(
        &self,
        actor: &ActorContext,
        request_id: &RequestId,
        revision: LeaveRevision,
    ) -> Result<OperationReceipt, LifecycleError> {
        let members = self.members().await?;
        let registry = self.registry().await?;
        let current = self.current_request(request_id).await?;

        let eligible = self.resolver.eligible_approvers(&members, &current.requester_id);
        let updated = self.machine.revise(&current, actor, &registry, &eligible, revision)?;

        self.store
            .replace_request(updated.clone())
            .await
            .map_err(|source| LifecycleError::collaborator("store.replace_request", source))?;
        info!(
            event_name = "leave.request_revised",
            request_id = updated.id.0.as_str(),
            "leave request revised by its requester"
        );

        let plan = self.fanout.plan(&LifecycleEvent::Edited, &updated, &[]);
        let notification_warnings = self.deliver(&plan).await;
        Ok(OperationReceipt { request: updated, notification_warnings })
    }

    pub async fn withdraw(
        &self,
        actor: &ActorContext,
        request_id: &RequestId,
    ) -> Result<OperationReceipt, LifecycleError> {
        let current = self.current_request(request_id).await?;
        self.machine.authorize_withdrawal(&current, actor)?;

        self.store
            .delete_request(request_id)
            .await
            .map_err(|source| LifecycleError::collaborator("store.delete_request", source))?;
        info!(
            event_name = "leave.request_withdrawn",
            request_id = current.id.0.as_str(),
            "leave request withdrawn"
        );

        let plan = self.fanout.plan(&LifecycleEvent::Withdrawn, &current, &[]);
        let notification_warnings = self.deliver(&plan).await;
        Ok(OperationReceipt { request: current, notification_warnings })
    }

    pub async fn decide(
        &self,
        actor: &ActorContext,
        request_id: &RequestId,
        decision: LeaveDecision,
    ) -> Result<OperationReceipt, LifecycleError> {
        let members = self.members().await?;
        let current = self.current_request(request_id).await?;
        let updated = self.machine.decide(&current, actor, &decision)?;

        self.store
            .replace_request(updated.clone())
            .await
            .map_err(|source| LifecycleError::collaborator("store.replace_request", source))?;
        info!(
            event_name = "leave.request_decided",
            request_id = updated.id.0.as_str(),
            status = status_label(updated.status),
            decided_by = actor_role_label(actor),
            "leave request decided"
        );

        let hr_identities: Vec<MemberId> = self
            .resolver
            .hr_identities(&members)
            .into_iter()
            .map(|member| member.id.clone())
            .collect();
        let event =
            LifecycleEvent::Decided { outcome: decision.outcome, decided_by: actor.role };
        let plan = self.fanout.plan(&event, &updated, &hr_identities);

        let mut notification_warnings = self.deliver(&plan).await;
        self.send_decision_email(&updated, &members, &mut notification_warnings).await;
        Ok(OperationReceipt { request: updated, notification_warnings })
    }

    /// Candidates the requester (or UI) may pick an approver from. An empty
    /// list is a valid outcome the caller must handle.
    pub async fn eligible_approvers(
        &self,
        requester_id: &MemberId,
    ) -> Result<Vec<OrgMember>, LifecycleError> {
        let members = self.members().await?;
        Ok(self
            .resolver
            .eligible_approvers(&members, requester_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Requesters see their own requests; managers, HR, and admins see all.
    pub async fn visible_requests(
        &self,
        actor: &ActorContext,
    ) -> Result<Vec<LeaveRequest>, LifecycleError> {
        let filter = match actor.role {
            Actor::Requester => RequestFilter::for_requester(actor.member_id.clone()),
            Actor::LineManager | Actor::HrReviewer | Actor::Admin => RequestFilter::default(),
        };
        self.store
            .list_requests(&filter)
            .await
            .map_err(|source| LifecycleError::collaborator("store.list_requests", source))
    }

    /// Point-in-time balance for one leave type. Recomputed on every call;
    /// deactivated types still resolve for historical requests.
    pub async fn remaining_balance(
        &self,
        requester_id: &MemberId,
        leave_type_name: &str,
    ) -> Result<BalanceView, LifecycleError> {
        let registry = self.registry().await?;
        let config = registry.find(leave_type_name).ok_or_else(|| {
            LifecycleError::Validation(format!("unknown leave type `{leave_type_name}`"))
        })?;
        let requests = self.requester_history(requester_id).await?;
        Ok(self.calculator.view(config, &requests, requester_id))
    }

    /// One balance row per active leave type.
    pub async fn balance_summary(
        &self,
        requester_id: &MemberId,
    ) -> Result<Vec<BalanceView>, LifecycleError> {
        let registry = self.registry().await?;
        let requests = self.requester_history(requester_id).await?;
        Ok(self.calculator.summary(&registry, &requests, requester_id))
    }

    async fn members(&self) -> Result<Vec<OrgMember>, LifecycleError> {
        self.directory
            .list_members()
            .await
            .map_err(|source| LifecycleError::collaborator("directory.list_members", source))
    }

    async fn registry(&self) -> Result<PolicyRegistry, LifecycleError> {
        let types = self
            .store
            .list_leave_types()
            .await
            .map_err(|source| LifecycleError::collaborator("store.list_leave_types", source))?;
        Ok(PolicyRegistry::new(types))
    }

    async fn current_request(&self, id: &RequestId) -> Result<LeaveRequest, LifecycleError> {
        self.store
            .find_request(id)
            .await
            .map_err(|source| LifecycleError::collaborator("store.find_request", source))?
            .ok_or_else(|| LifecycleError::UnknownRequest { request_id: id.0.clone() })
    }

    async fn requester_history(
        &self,
        requester_id: &MemberId,
    ) -> Result<Vec<LeaveRequest>, LifecycleError> {
        self.store
            .list_requests(&RequestFilter::for_requester(requester_id.clone()))
            .await
            .map_err(|source| LifecycleError::collaborator("store.list_requests", source))
    }

    /// Deliver a plan item by item. The transition is already committed, so
    /// failures are collected and warned about, never propagated.
    async fn deliver(&self, plan: &NotificationPlan) -> Vec<String> {
        let mut warnings = Vec::new();
        for notice in &plan.notices {
            if let Err(error) =
                self.notifier.notify(&notice.recipient, &notice.template.render()).await
            {
                warn!(
                    event_name = "leave.notification_failed",
                    recipient = notice.recipient.0.as_str(),
                    error = %error,
                    "notification delivery failed after a committed transition"
                );
                warnings.push(format!(
                    "notification to `{}` failed: {error}",
                    notice.recipient.0
                ));
            }
        }
        warnings
    }

    async fn send_decision_email(
        &self,
        request: &LeaveRequest,
        members: &[OrgMember],
        warnings: &mut Vec<String>,
    ) {
        let Some(requester) = members.iter().find(|member| member.id == request.requester_id)
        else {
            warnings.push(format!(
                "requester `{}` has no directory record; decision email skipped",
                request.requester_id.0
            ));
            return;
        };

        let cc: Vec<String> = request
            .notify_ids
            .iter()
            .filter_map(|id| members.iter().find(|member| &member.id == id))
            .map(|member| member.email.clone())
            .collect();

        let payload = EmailPayload {
            to: requester.email.clone(),
            cc,
            template_fields: json!({
                "request_id": request.id.0,
                "leave_type": request.leave_type_name,
                "status": status_label(request.status),
                "start_date": request.start_date.to_string(),
                "end_date": request.end_date.to_string(),
                "manager_comment": request.manager_comment,
                "hr_comment": request.hr_comment,
            }),
        };

        if let Err(error) = self.notifier.send_structured_email(payload).await {
            warn!(
                event_name = "leave.notification_failed",
                recipient = requester.id.0.as_str(),
                error = %error,
                "decision email delivery failed after a committed transition"
            );
            warnings.push(format!("decision email to `{}` failed: {error}", requester.id.0));
        }
    }
}

fn actor_role_label(actor: &ActorContext) -> &'static str {
    match actor.role {
        Actor::Requester => "requester",
        Actor::LineManager => "line_manager",
        Actor::HrReviewer => "hr_reviewer",
        Actor::Admin => "admin",
    }
}
