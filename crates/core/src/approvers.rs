use crate::config::ApprovalsConfig;
use crate::domain::member::{Actor, MemberId, OrgMember};

/// Resolves who may approve a request and classifies directory titles into
/// `Actor` roles. Title text is consulted here and nowhere else.
#[derive(Clone, Debug)]
pub struct ApproverResolver {
    manager_tokens: Vec<String>,
    hr_tokens: Vec<String>,
    admin_tokens: Vec<String>,
}

impl ApproverResolver {
    pub fn new(
        manager_tokens: Vec<String>,
        hr_tokens: Vec<String>,
        admin_tokens: Vec<String>,
    ) -> Self {
        Self {
            manager_tokens: normalize_tokens(manager_tokens),
            hr_tokens: normalize_tokens(hr_tokens),
            admin_tokens: normalize_tokens(admin_tokens),
        }
    }

    pub fn from_config(config: &ApprovalsConfig) -> Self {
        Self::new(
            config.manager_title_tokens.clone(),
            config.hr_title_tokens.clone(),
            config.admin_title_tokens.clone(),
        )
    }

    /// Every member whose title carries a manager token, excluding the
    /// requester. An empty result is a valid outcome; the caller must then
    /// require an explicit approver choice.
    pub fn eligible_approvers<'a>(
        &self,
        members: &'a [OrgMember],
        requester_id: &MemberId,
    ) -> Vec<&'a OrgMember> {
        members
            .iter()
            .filter(|member| &member.id != requester_id)
            .filter(|member| matches_any(&member.role_title, &self.manager_tokens))
            .collect()
    }

    /// A title matching several token lists classifies admin first, then HR,
    /// then manager.
    pub fn classify_title(&self, role_title: &str) -> Actor {
        if matches_any(role_title, &self.admin_tokens) {
            Actor::Admin
        } else if matches_any(role_title, &self.hr_tokens) {
            Actor::HrReviewer
        } else if matches_any(role_title, &self.manager_tokens) {
            Actor::LineManager
        } else {
            Actor::Requester
        }
    }

    /// The HR/Admin identities that receive review-expected notices.
    pub fn hr_identities<'a>(&self, members: &'a [OrgMember]) -> Vec<&'a OrgMember> {
        members
            .iter()
            .filter(|member| {
                matches!(
                    self.classify_title(&member.role_title),
                    Actor::HrReviewer | Actor::Admin
                )
            })
            .collect()
    }
}

fn normalize_tokens(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .map(|token| normalize_key(&token))
        .filter(|token| !token.is_empty())
        .collect()
}

fn matches_any(role_title: &str, tokens: &[String]) -> bool {
    let title = normalize_key(role_title);
    tokens.iter().any(|token| title_matches(&title, token))
}

/// Short tokens (such as `hr`) match whole words only, so they cannot fire
/// inside unrelated titles; longer tokens match as substrings.
fn title_matches(normalized_title: &str, token: &str) -> bool {
    if token.chars().count() <= 3 {
        normalized_title.split(|c: char| !c.is_alphanumeric()).any(|word| word == token)
    } else {
        normalized_title.contains(token)
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
