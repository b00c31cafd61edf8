use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub String);

/// Directory record as the organization directory collaborator reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMember {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub role_title: String,
}

/// Closed set of roles an acting identity can hold. Authority checks match
/// exhaustively over this enum, never over raw title strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Requester,
    LineManager,
    HrReviewer,
    Admin,
}

impl Actor {
    pub fn has_override_authority(&self) -> bool {
        match self {
            Actor::HrReviewer | Actor::Admin => true,
            Actor::Requester | Actor::LineManager => false,
        }
    }
}

/// The identity acting on an engine operation, passed explicitly by the
/// caller. The engine never reads ambient session state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub member_id: MemberId,
    pub role: Actor,
}

impl ActorContext {
    pub fn new(member_id: impl Into<String>, role: Actor) -> Self {
        Self { member_id: MemberId(member_id.into()), role }
    }
}
