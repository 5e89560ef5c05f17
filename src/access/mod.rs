//! Role-based access checks.
//!
//! Identity is established by the caller; these checks only decide what an
//! already-authenticated [`Caller`] may see and change.

use crate::model::{Role, Run, User, UserId, WeeklyReport};
use crate::{Error, Result};

/// The authenticated user issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn can_manage_users(&self) -> bool {
        matches!(self.role, Role::Manager | Role::Admin)
    }

    /// Which runs this caller can list: `Some(owner)` restricts to one owner.
    pub fn run_scope(&self) -> Option<UserId> {
        match self.role {
            Role::Admin => None,
            Role::Regular | Role::Manager => Some(self.id),
        }
    }

    pub fn can_access_run(&self, run: &Run) -> bool {
        self.run_scope().is_none_or(|owner| owner == run.owner)
    }

    /// Reports are private to their owner, whatever the role.
    pub fn can_access_report(&self, report: &WeeklyReport) -> bool {
        report.owner == self.id
    }

    pub fn require_user_manager(&self) -> Result<()> {
        if self.can_manage_users() {
            Ok(())
        } else {
            Err(Error::PermissionDenied(format!(
                "user {} ({}) cannot manage accounts",
                self.id, self.role
            )))
        }
    }

    /// Managers handle regular and manager accounts; only admins touch admins.
    pub fn require_role_manager(&self, role: Role) -> Result<()> {
        self.require_user_manager()?;
        if role == Role::Admin && self.role != Role::Admin {
            return Err(Error::PermissionDenied(format!(
                "user {} ({}) cannot manage admin accounts",
                self.id, self.role
            )));
        }
        Ok(())
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Caller::new(user.id, user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use crate::model::RunId;

    fn run_owned_by(owner: u64) -> Run {
        Run {
            id: RunId(1),
            date: NaiveDate::from_ymd_opt(2020, 10, 6).unwrap(),
            distance: 5.4,
            time: TimeDelta::seconds(1280),
            location: "Buenos Aires".into(),
            owner: UserId(owner),
            weather: "?".into(),
        }
    }

    #[test]
    fn test_owner_has_access() {
        let peter = Caller::new(UserId(1), Role::Regular);
        assert!(peter.can_access_run(&run_owned_by(1)));
        assert!(!peter.can_access_run(&run_owned_by(2)));
    }

    #[test]
    fn test_manager_cannot_see_foreign_runs() {
        let epi = Caller::new(UserId(3), Role::Manager);
        assert!(!epi.can_access_run(&run_owned_by(1)));
        assert!(epi.require_user_manager().is_ok());
        assert!(epi.require_role_manager(Role::Manager).is_ok());
        assert!(matches!(epi.require_role_manager(Role::Admin), Err(Error::PermissionDenied(_))));
    }

    #[test]
    fn test_admin_sees_everything() {
        let root = Caller::new(UserId(9), Role::Admin);
        assert!(root.can_access_run(&run_owned_by(1)));
        assert_eq!(root.run_scope(), None);
        assert!(root.require_role_manager(Role::Admin).is_ok());
    }

    #[test]
    fn test_regular_user_cannot_manage_accounts() {
        let bob = Caller::new(UserId(1), Role::Regular);
        assert!(matches!(bob.require_user_manager(), Err(Error::PermissionDenied(_))));
    }
}
