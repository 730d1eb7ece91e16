//! Row-level access policy
//!
//! Every read or write against persisted records is decided here, from the
//! requester (user id + admin membership) and the row's owner. The service
//! layer calls [`AccessPolicy::authorize`] before each repository call, so
//! the same rules hold for every entry point.
//!
//! | Resource      | Read             | Insert     | Update           | Delete |
//! |---------------|------------------|------------|------------------|--------|
//! | Capture       | owner or admin   | owner      | owner            | never  |
//! | MonthlyGoal   | advisor or admin | admin      | admin            | admin  |
//! | ProductConfig | anyone           | admin      | admin            | never  |
//! | Observation   | advisor or admin | admin      | advisor or admin | admin  |
//! | AdminSet      | own row or admin | admin      | never            | admin  |

use crate::domain::errors::AccessDenied;
use crate::domain::identity::Requester;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Read,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Read => write!(f, "read"),
            Action::Insert => write!(f, "insert"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Capture,
    MonthlyGoal,
    ProductConfig,
    Observation,
    AdminSet,
}

impl ResourceKind {
    /// Stable label for logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Capture => "capture",
            ResourceKind::MonthlyGoal => "monthly_goal",
            ResourceKind::ProductConfig => "product_config",
            ResourceKind::Observation => "observation",
            ResourceKind::AdminSet => "admin_set",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Capture => write!(f, "capture"),
            ResourceKind::MonthlyGoal => write!(f, "monthly goal"),
            ResourceKind::ProductConfig => write!(f, "product config"),
            ResourceKind::Observation => write!(f, "observation"),
            ResourceKind::AdminSet => write!(f, "admin set"),
        }
    }
}

/// A row (or table, for reference data) a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Capture { owner: Uuid },
    MonthlyGoal { advisor: Uuid },
    ProductConfig,
    Observation { advisor: Uuid },
    AdminEntry { user: Uuid },
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Capture { .. } => ResourceKind::Capture,
            Resource::MonthlyGoal { .. } => ResourceKind::MonthlyGoal,
            Resource::ProductConfig => ResourceKind::ProductConfig,
            Resource::Observation { .. } => ResourceKind::Observation,
            Resource::AdminEntry { .. } => ResourceKind::AdminSet,
        }
    }
}

pub struct AccessPolicy;

impl AccessPolicy {
    pub fn is_allowed(requester: &Requester, action: Action, resource: &Resource) -> bool {
        let admin = requester.is_admin;
        match (resource, action) {
            (Resource::Capture { owner }, Action::Read) => admin || *owner == requester.user_id,
            (Resource::Capture { owner }, Action::Insert | Action::Update) => {
                *owner == requester.user_id
            }
            (Resource::Capture { .. }, Action::Delete) => false,

            (Resource::MonthlyGoal { advisor }, Action::Read) => {
                admin || *advisor == requester.user_id
            }
            (Resource::MonthlyGoal { .. }, _) => admin,

            (Resource::ProductConfig, Action::Read) => true,
            (Resource::ProductConfig, Action::Insert | Action::Update) => admin,
            (Resource::ProductConfig, Action::Delete) => false,

            (Resource::Observation { advisor }, Action::Read | Action::Update) => {
                admin || *advisor == requester.user_id
            }
            (Resource::Observation { .. }, Action::Insert | Action::Delete) => admin,

            (Resource::AdminEntry { user }, Action::Read) => admin || *user == requester.user_id,
            (Resource::AdminEntry { .. }, Action::Insert | Action::Delete) => admin,
            (Resource::AdminEntry { .. }, Action::Update) => false,
        }
    }

    pub fn authorize(
        requester: &Requester,
        action: Action,
        resource: &Resource,
    ) -> Result<(), AccessDenied> {
        if Self::is_allowed(requester, action, resource) {
            Ok(())
        } else {
            Err(AccessDenied {
                action,
                resource: resource.kind(),
            })
        }
    }
}

/// Which capture rows a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureScope {
    Owner(Uuid),
    All,
}

impl CaptureScope {
    pub fn for_requester(requester: &Requester) -> Self {
        if requester.is_admin {
            CaptureScope::All
        } else {
            CaptureScope::Owner(requester.user_id)
        }
    }

    pub fn admits(&self, owner: Uuid) -> bool {
        match self {
            CaptureScope::Owner(uid) => *uid == owner,
            CaptureScope::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_capture_rules() {
        let (me, other) = ids();
        let advisor = Requester::advisor(me);
        let admin = Requester::admin(other);
        let mine = Resource::Capture { owner: me };

        assert!(AccessPolicy::is_allowed(&advisor, Action::Read, &mine));
        assert!(AccessPolicy::is_allowed(&advisor, Action::Insert, &mine));
        assert!(AccessPolicy::is_allowed(&advisor, Action::Update, &mine));
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Delete, &mine));

        let theirs = Resource::Capture { owner: other };
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Read, &theirs));
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Insert, &theirs));

        // Admins read everything but cannot insert on someone else's behalf
        assert!(AccessPolicy::is_allowed(&admin, Action::Read, &mine));
        assert!(!AccessPolicy::is_allowed(&admin, Action::Insert, &mine));
        assert!(!AccessPolicy::is_allowed(&admin, Action::Update, &mine));
        assert!(!AccessPolicy::is_allowed(&admin, Action::Delete, &mine));
    }

    #[test]
    fn test_goal_rules() {
        let (me, other) = ids();
        let advisor = Requester::advisor(me);
        let admin = Requester::admin(other);
        let goal = Resource::MonthlyGoal { advisor: me };

        assert!(AccessPolicy::is_allowed(&advisor, Action::Read, &goal));
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Insert, &goal));
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Update, &goal));
        assert!(AccessPolicy::is_allowed(&admin, Action::Insert, &goal));
        assert!(AccessPolicy::is_allowed(&admin, Action::Read, &goal));

        let other_goal = Resource::MonthlyGoal { advisor: other };
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Read, &other_goal));
    }

    #[test]
    fn test_product_rules() {
        let (me, other) = ids();
        let advisor = Requester::advisor(me);
        let admin = Requester::admin(other);

        assert!(AccessPolicy::is_allowed(&advisor, Action::Read, &Resource::ProductConfig));
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Update, &Resource::ProductConfig));
        assert!(AccessPolicy::is_allowed(&admin, Action::Update, &Resource::ProductConfig));
        assert!(!AccessPolicy::is_allowed(&admin, Action::Delete, &Resource::ProductConfig));
    }

    #[test]
    fn test_observation_and_admin_set_rules() {
        let (me, other) = ids();
        let advisor = Requester::advisor(me);
        let note = Resource::Observation { advisor: me };

        assert!(AccessPolicy::is_allowed(&advisor, Action::Update, &note));
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Insert, &note));
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Delete, &note));

        assert!(AccessPolicy::is_allowed(&advisor, Action::Read, &Resource::AdminEntry { user: me }));
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Read, &Resource::AdminEntry { user: other }));
        assert!(!AccessPolicy::is_allowed(&advisor, Action::Insert, &Resource::AdminEntry { user: me }));
    }

    #[test]
    fn test_authorize_reports_denied_action() {
        let advisor = Requester::advisor(Uuid::new_v4());
        let err = AccessPolicy::authorize(&advisor, Action::Update, &Resource::ProductConfig)
            .unwrap_err();
        assert_eq!(err.action, Action::Update);
        assert_eq!(err.resource, ResourceKind::ProductConfig);
    }

    #[test]
    fn test_capture_scope() {
        let (me, other) = ids();
        let scope = CaptureScope::for_requester(&Requester::advisor(me));
        assert_eq!(scope, CaptureScope::Owner(me));
        assert!(scope.admits(me));
        assert!(!scope.admits(other));
        assert_eq!(CaptureScope::for_requester(&Requester::admin(me)), CaptureScope::All);
    }
}
