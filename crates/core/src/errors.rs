use thiserror::Error;

use crate::collaborators::CollaboratorError;
use crate::domain::request::LeaveStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("actor `{actor_id}` has no authority to decide request `{request_id}`")]
    NotAuthorized { request_id: String, actor_id: String },

    #[error("request `{request_id}` in status `{status:?}` does not allow {operation}")]
    InvalidTransition { request_id: String, status: LeaveStatus, operation: &'static str },

    #[error("request `{request_id}` in status `{status:?}` can no longer be edited by its requester")]
    NotEditable { request_id: String, status: LeaveStatus },

    #[error(
        "request `{request_id}` in status `{status:?}` can no longer be withdrawn by its requester"
    )]
    NotWithdrawable { request_id: String, status: LeaveStatus },

    #[error("`{approver_id}` is not an eligible approver for requester `{requester_id}`")]
    NoEligibleApprover { requester_id: String, approver_id: String },

    #[error("no leave request with id `{request_id}`")]
    UnknownRequest { request_id: String },

    #[error("{operation} failed: {source}")]
    Collaborator {
        operation: &'static str,
        #[source]
        source: CollaboratorError,
    },
}

impl LifecycleError {
    /// Caller-facing message class. Every kind stays distinguishable; no
    /// generic catch-all may hide an authorization or transition failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => {
                "The request could not be accepted. Correct the fields and try again."
            }
            Self::NotAuthorized { .. } => "You do not have authority to act on this request.",
            Self::InvalidTransition { .. } => {
                "The request is no longer in a state that allows this action."
            }
            Self::NotEditable { .. } => {
                "Only requests still awaiting manager approval can be edited."
            }
            Self::NotWithdrawable { .. } => {
                "Only requests still awaiting manager approval can be withdrawn."
            }
            Self::NoEligibleApprover { .. } => {
                "Choose an eligible approver before submitting the request."
            }
            Self::UnknownRequest { .. } => "This leave request no longer exists.",
            Self::Collaborator { .. } => {
                "A backing service is temporarily unavailable. Please retry shortly."
            }
        }
    }

    pub(crate) fn collaborator(operation: &'static str, source: CollaboratorError) -> Self {
        Self::Collaborator { operation, source }
    }
}
