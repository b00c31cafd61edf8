use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::member::{Actor, MemberId};
use crate::domain::request::{DecisionOutcome, LeaveRequest, LeaveStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    Submitted,
    Edited,
    Withdrawn,
    Decided { outcome: DecisionOutcome, decided_by: Actor },
}

/// Message content as pure data; rendering stays here so the decision logic
/// is testable without a live delivery path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeTemplate {
    ApprovalRequested {
        requester_name: String,
        leave_type_name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    RequestRevised {
        requester_name: String,
        leave_type_name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    CourtesyCopy {
        requester_name: String,
        leave_type_name: String,
    },
    RequestWithdrawn {
        requester_name: String,
        leave_type_name: String,
    },
    DecisionIssued {
        leave_type_name: String,
        status: LeaveStatus,
        comment: Option<String>,
    },
    HrReviewExpected {
        requester_name: String,
        request_id: String,
    },
}

impl NoticeTemplate {
    pub fn render(&self) -> String {
        match self {
            Self::ApprovalRequested { requester_name, leave_type_name, start_date, end_date } => {
                format!(
                    "{requester_name} requests {leave_type_name} from {start_date} to {end_date}; your decision is needed"
                )
            }
            Self::RequestRevised { requester_name, leave_type_name, start_date, end_date } => {
                format!(
                    "{requester_name} updated their {leave_type_name} request ({start_date} to {end_date}); your decision is still needed"
                )
            }
            Self::CourtesyCopy { requester_name, leave_type_name } => {
                format!("FYI: {requester_name} has a {leave_type_name} request in review")
            }
            Self::RequestWithdrawn { requester_name, leave_type_name } => {
                format!("{requester_name} withdrew their {leave_type_name} request")
            }
            Self::DecisionIssued { leave_type_name, status, comment } => match comment {
                Some(comment) => format!(
                    "Your {leave_type_name} request is now {}: {comment}",
                    status_label(*status)
                ),
                None => {
                    format!("Your {leave_type_name} request is now {}", status_label(*status))
                }
            },
            Self::HrReviewExpected { requester_name, request_id } => {
                format!("HR review expected for {requester_name}'s leave request {request_id}")
            }
        }
    }
}

pub fn status_label(status: LeaveStatus) -> &'static str {
    match status {
        LeaveStatus::PendingManagerApproval => "awaiting manager approval",
        LeaveStatus::PendingHrApproval => "awaiting HR review",
        LeaveStatus::Approved => "approved",
        LeaveStatus::Rejected => "rejected",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub recipient: MemberId,
    pub template: NoticeTemplate,
}

/// Ordered recipient/template pairs for one lifecycle event. A recipient
/// appears at most once per plan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPlan {
    pub notices: Vec<Notice>,
}

impl NotificationPlan {
    fn push_unique(&mut self, recipient: MemberId, template: NoticeTemplate) {
        if self.notices.iter().any(|notice| notice.recipient == recipient) {
            return;
        }
        self.notices.push(Notice { recipient, template });
    }

    pub fn recipients(&self) -> Vec<&MemberId> {
        self.notices.iter().map(|notice| &notice.recipient).collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct NotificationFanout;

impl NotificationFanout {
    /// Compute who must hear about `event` on `request`. `hr_identities` is
    /// the directory's current HR/Admin set, used only for decision events.
    pub fn plan(
        &self,
        event: &LifecycleEvent,
        request: &LeaveRequest,
        hr_identities: &[MemberId],
    ) -> NotificationPlan {
        let mut plan = NotificationPlan::default();

        match event {
            LifecycleEvent::Submitted => {
                plan.push_unique(
                    request.approver_id.clone(),
                    NoticeTemplate::ApprovalRequested {
                        requester_name: request.requester_name.clone(),
                        leave_type_name: request.leave_type_name.clone(),
                        start_date: request.start_date,
                        end_date: request.end_date,
                    },
                );
                self.push_courtesy_copies(&mut plan, request);
            }
            LifecycleEvent::Edited => {
                plan.push_unique(
                    request.approver_id.clone(),
                    NoticeTemplate::RequestRevised {
                        requester_name: request.requester_name.clone(),
                        leave_type_name: request.leave_type_name.clone(),
                        start_date: request.start_date,
                        end_date: request.end_date,
                    },
                );
                self.push_courtesy_copies(&mut plan, request);
            }
            LifecycleEvent::Withdrawn => {
                plan.push_unique(
                    request.approver_id.clone(),
                    NoticeTemplate::RequestWithdrawn {
                        requester_name: request.requester_name.clone(),
                        leave_type_name: request.leave_type_name.clone(),
                    },
                );
            }
            LifecycleEvent::Decided { outcome, decided_by } => {
                let comment = match decided_by {
                    Actor::LineManager => request.manager_comment.clone(),
                    Actor::HrReviewer | Actor::Admin => request.hr_comment.clone(),
                    Actor::Requester => None,
                };
                plan.push_unique(
                    request.requester_id.clone(),
                    NoticeTemplate::DecisionIssued {
                        leave_type_name: request.leave_type_name.clone(),
                        status: request.status,
                        comment,
                    },
                );

                // A manager approval is final yet still raises the HR notice.
                // The pending-HR arm stays alive for records that already
                // carry that status even though the decision flow never
                // produces it.
                let manager_approval = matches!(outcome, DecisionOutcome::Approve)
                    && matches!(decided_by, Actor::LineManager);
                let awaiting_hr = request.status == LeaveStatus::PendingHrApproval;
                if manager_approval || awaiting_hr {
                    for identity in hr_identities {
                        plan.push_unique(
                            identity.clone(),
                            NoticeTemplate::HrReviewExpected {
                                requester_name: request.requester_name.clone(),
                                request_id: request.id.0.clone(),
                            },
                        );
                    }
                }
            }
        }

        plan
    }

    fn push_courtesy_copies(&self, plan: &mut NotificationPlan, request: &LeaveRequest) {
        for recipient in &request.notify_ids {
            plan.push_unique(
                recipient.clone(),
                NoticeTemplate::CourtesyCopy {
                    requester_name: request.requester_name.clone(),
                    leave_type_name: request.leave_type_name.clone(),
                },
            );
        }
    }
}
