use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use crate::collaborators::{
    CollaboratorError, Directory, EmailPayload, Notifier, RequestFilter, RequestStore,
};
use crate::domain::leave_type::LeaveTypeConfig;
use crate::domain::member::{MemberId, OrgMember};
use crate::domain::request::{LeaveRequest, RequestId};

/// In-memory store suitable for tests and as a starting point for hosts that
/// have not wired a real record store yet.
#[derive(Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<String, LeaveRequest>>,
    leave_types: RwLock<Vec<LeaveTypeConfig>>,
}

impl InMemoryRequestStore {
    pub fn with_leave_types(leave_types: Vec<LeaveTypeConfig>) -> Self {
        Self { requests: RwLock::new(HashMap::new()), leave_types: RwLock::new(leave_types) }
    }

    /// Insert a record directly, bypassing lifecycle validation. Test seam.
    pub fn seed_request(&self, request: LeaveRequest) {
        let mut requests = match self.requests.write() {
            Ok(requests) => requests,
            Err(poisoned) => poisoned.into_inner(),
        };
        requests.insert(request.id.0.clone(), request);
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<LeaveRequest>, CollaboratorError> {
        let requests = match self.requests.read() {
            Ok(requests) => requests,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut matching: Vec<LeaveRequest> =
            requests.values().filter(|request| filter.matches(request)).cloned().collect();
        matching.sort_by(|left, right| {
            left.created_at.cmp(&right.created_at).then_with(|| left.id.0.cmp(&right.id.0))
        });
        Ok(matching)
    }

    async fn find_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<LeaveRequest>, CollaboratorError> {
        let requests = match self.requests.read() {
            Ok(requests) => requests,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(requests.get(&id.0).cloned())
    }

    async fn create_request(&self, request: LeaveRequest) -> Result<(), CollaboratorError> {
        let mut requests = match self.requests.write() {
            Ok(requests) => requests,
            Err(poisoned) => poisoned.into_inner(),
        };
        if requests.contains_key(&request.id.0) {
            return Err(CollaboratorError::Rejected(format!(
                "request `{}` already exists",
                request.id.0
            )));
        }
        requests.insert(request.id.0.clone(), request);
        Ok(())
    }

    async fn replace_request(&self, request: LeaveRequest) -> Result<(), CollaboratorError> {
        let mut requests = match self.requests.write() {
            Ok(requests) => requests,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !requests.contains_key(&request.id.0) {
            return Err(CollaboratorError::Rejected(format!(
                "request `{}` does not exist",
                request.id.0
            )));
        }
        requests.insert(request.id.0.clone(), request);
        Ok(())
    }

    async fn delete_request(&self, id: &RequestId) -> Result<(), CollaboratorError> {
        let mut requests = match self.requests.write() {
            Ok(requests) => requests,
            Err(poisoned) => poisoned.into_inner(),
        };
        requests.remove(&id.0);
        Ok(())
    }

    async fn list_leave_types(&self) -> Result<Vec<LeaveTypeConfig>, CollaboratorError> {
        let leave_types = match self.leave_types.read() {
            Ok(leave_types) => leave_types,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(leave_types.clone())
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    members: RwLock<Vec<OrgMember>>,
}

impl InMemoryDirectory {
    pub fn new(members: Vec<OrgMember>) -> Self {
        Self { members: RwLock::new(members) }
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn list_members(&self) -> Result<Vec<OrgMember>, CollaboratorError> {
        let members = match self.members.read() {
            Ok(members) => members,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(members.clone())
    }
}

/// Notifier that records every delivery for assertions. `set_failing(true)`
/// makes all deliveries fail, to exercise the committed-then-warned path.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(MemberId, String)>>,
    emails: Mutex<Vec<EmailPayload>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent_notices(&self) -> Vec<(MemberId, String)> {
        match self.notices.lock() {
            Ok(notices) => notices.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn sent_emails(&self) -> Vec<EmailPayload> {
        match self.emails.lock() {
            Ok(emails) => emails.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable("mail relay offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: &MemberId, message: &str) -> Result<(), CollaboratorError> {
        self.check_available()?;
        match self.notices.lock() {
            Ok(mut notices) => notices.push((recipient.clone(), message.to_string())),
            Err(poisoned) => poisoned.into_inner().push((recipient.clone(), message.to_string())),
        }
        Ok(())
    }

    async fn send_structured_email(&self, payload: EmailPayload) -> Result<(), CollaboratorError> {
        self.check_available()?;
        match self.emails.lock() {
            Ok(mut emails) => emails.push(payload),
            Err(poisoned) => poisoned.into_inner().push(payload),
        }
        Ok(())
    }
}
