use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::leave_type::LeaveTypeConfig;
use crate::domain::member::{MemberId, OrgMember};
use crate::domain::request::{LeaveRequest, LeaveStatus, RequestId};

/// Failure raised by a store, notifier, or directory implementation. The
/// engine wraps it with the originating operation name and never swallows it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator rejected the call: {0}")]
    Rejected(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub requester_id: Option<MemberId>,
    pub leave_type_name: Option<String>,
    pub status: Option<LeaveStatus>,
}

impl RequestFilter {
    pub fn for_requester(requester_id: MemberId) -> Self {
        Self { requester_id: Some(requester_id), ..Self::default() }
    }

    pub fn matches(&self, request: &LeaveRequest) -> bool {
        if let Some(requester_id) = &self.requester_id {
            if &request.requester_id != requester_id {
                return false;
            }
        }
        if let Some(leave_type_name) = &self.leave_type_name {
            if normalize_key(&request.leave_type_name) != normalize_key(leave_type_name) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if request.status != status {
                return false;
            }
        }
        true
    }
}

/// Structured mail handed to the notifier for decision messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailPayload {
    pub to: String,
    pub cc: Vec<String>,
    pub template_fields: serde_json::Value,
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<LeaveRequest>, CollaboratorError>;

    async fn find_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<LeaveRequest>, CollaboratorError>;

    async fn create_request(&self, request: LeaveRequest) -> Result<(), CollaboratorError>;

    async fn replace_request(&self, request: LeaveRequest) -> Result<(), CollaboratorError>;

    async fn delete_request(&self, id: &RequestId) -> Result<(), CollaboratorError>;

    async fn list_leave_types(&self) -> Result<Vec<LeaveTypeConfig>, CollaboratorError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &MemberId, message: &str) -> Result<(), CollaboratorError>;

    async fn send_structured_email(&self, payload: EmailPayload) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn list_members(&self) -> Result<Vec<OrgMember>, CollaboratorError>;
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
