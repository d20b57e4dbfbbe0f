/// Role-based authorization
///
/// Every protected action is listed in one policy table, [`Action::allowed_roles`].
/// An empty role list means any logged-in user may perform the action. Roles
/// are flat: Owner does not implicitly include Foreman.
///
/// # Example
///
/// ```
/// use workbuddy_shared::auth::authorization::{require, Action};
/// use workbuddy_shared::models::user::UserRole;
///
/// assert!(require(UserRole::Owner, Action::DeleteUser).is_ok());
/// assert!(require(UserRole::Worker, Action::DeleteUser).is_err());
/// assert!(require(UserRole::Worker, Action::CreateTask).is_ok());
/// ```

use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// The caller's role is not in the action's allowed set
    #[error("Role {role} is not allowed to {action}")]
    Forbidden { action: Action, role: UserRole },
}

/// Protected operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListUsers,
    CreateUser,
    DeleteUser,
    ListProjects,
    CreateProject,
    SelectProject,
    ListMembers,
    AddMember,
    CreateInvitation,
    ListTasks,
    ViewTask,
    CreateTask,
    UpdateTask,
    DeleteTask,
    ListComments,
    AddComment,
    ListMessages,
    PostMessage,
}

const OWNER_ONLY: &[UserRole] = &[UserRole::Owner];
const SUPERVISORS: &[UserRole] = &[UserRole::Owner, UserRole::Foreman];
const ANY_USER: &[UserRole] = &[];

impl Action {
    /// Roles allowed to perform this action; empty means every logged-in user
    pub fn allowed_roles(&self) -> &'static [UserRole] {
        match self {
            Action::CreateUser | Action::DeleteUser | Action::CreateInvitation => OWNER_ONLY,
            Action::AddMember => SUPERVISORS,
            // Task, comment and chat endpoints only require a session
            Action::ListUsers
            | Action::ListProjects
            | Action::CreateProject
            | Action::SelectProject
            | Action::ListMembers
            | Action::ListTasks
            | Action::ViewTask
            | Action::CreateTask
            | Action::UpdateTask
            | Action::DeleteTask
            | Action::ListComments
            | Action::AddComment
            | Action::ListMessages
            | Action::PostMessage => ANY_USER,
        }
    }

    pub fn permits(&self, role: UserRole) -> bool {
        let allowed = self.allowed_roles();
        allowed.is_empty() || allowed.contains(&role)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ListUsers => "list users",
            Action::CreateUser => "create users",
            Action::DeleteUser => "delete users",
            Action::ListProjects => "list projects",
            Action::CreateProject => "create projects",
            Action::SelectProject => "select a project",
            Action::ListMembers => "list project members",
            Action::AddMember => "add project members",
            Action::CreateInvitation => "send invitations",
            Action::ListTasks => "list tasks",
            Action::ViewTask => "view tasks",
            Action::CreateTask => "create tasks",
            Action::UpdateTask => "update tasks",
            Action::DeleteTask => "delete tasks",
            Action::ListComments => "list comments",
            Action::AddComment => "add comments",
            Action::ListMessages => "read messages",
            Action::PostMessage => "post messages",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks `role` against the policy for `action`
///
/// # Errors
///
/// Returns [`AuthzError::Forbidden`] when the role is not allowed.
pub fn require(role: UserRole, action: Action) -> Result<(), AuthzError> {
    if action.permits(role) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden { action, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [UserRole; 3] = [UserRole::Owner, UserRole::Foreman, UserRole::Worker];

    #[test]
    fn test_owner_only_actions() {
        for action in [Action::CreateUser, Action::DeleteUser, Action::CreateInvitation] {
            assert!(require(UserRole::Owner, action).is_ok());
            assert!(require(UserRole::Foreman, action).is_err());
            assert!(require(UserRole::Worker, action).is_err());
        }
    }

    #[test]
    fn test_add_member_allows_owner_and_foreman() {
        assert!(Action::AddMember.permits(UserRole::Owner));
        assert!(Action::AddMember.permits(UserRole::Foreman));
        assert!(!Action::AddMember.permits(UserRole::Worker));
    }

    #[test]
    fn test_session_only_actions_allow_every_role() {
        for action in [
            Action::ListProjects,
            Action::CreateTask,
            Action::UpdateTask,
            Action::DeleteTask,
            Action::AddComment,
            Action::PostMessage,
        ] {
            assert!(action.allowed_roles().is_empty());
            for role in ALL_ROLES {
                assert!(require(role, action).is_ok(), "{role} should {action}");
            }
        }
    }

    #[test]
    fn test_forbidden_error_message() {
        let err = require(UserRole::Worker, Action::DeleteUser).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden {
                action: Action::DeleteUser,
                role: UserRole::Worker,
            }
        );
        assert_eq!(err.to_string(), "Role Worker is not allowed to delete users");
    }
}
