pub mod approvers;
pub mod balance;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod memory;
pub mod notifications;
pub mod service;

pub use approvers::ApproverResolver;
pub use balance::{BalanceCalculator, BalanceView};
pub use collaborators::{
    CollaboratorError, Directory, EmailPayload, Notifier, RequestFilter, RequestStore,
};
pub use config::{
    ApprovalsConfig, ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat,
    LoggingConfig,
};
pub use domain::leave_type::{LeaveTypeConfig, LeaveTypeId, PolicyRegistry};
pub use domain::member::{Actor, ActorContext, MemberId, OrgMember};
pub use domain::request::{
    DecisionOutcome, DurationKind, LeaveDecision, LeaveRequest, LeaveRevision, LeaveStatus,
    LeaveSubmission, RequestId,
};
pub use errors::LifecycleError;
pub use lifecycle::ApprovalStateMachine;
pub use memory::{InMemoryDirectory, InMemoryRequestStore, RecordingNotifier};
pub use notifications::{
    LifecycleEvent, Notice, NoticeTemplate, NotificationFanout, NotificationPlan,
};
pub use service::{LeaveLifecycleService, OperationReceipt};
