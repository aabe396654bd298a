//! Role-based access control.
//!
//! Every protected route asks [`authorize`] for an [`Access`] before touching
//! the repository. The decision comes from one table, [`scope_for`], indexed by
//! role, resource and action, so handlers never re-implement role checks.

pub mod context;

use tracing::debug;

use crate::shared::AppError;
use crate::users::models::Role;
use context::{AuthenticatedUser, RequestContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Specialties,
    DoctorProfiles,
    Appointments,
    Payments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Delete,
}

/// How much of a resource a role may touch with a given action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Denied,
    /// Only records the acting user is a party to
    Own,
    All,
}

/// The permission table. `None` is the anonymous caller.
pub fn scope_for(role: Option<Role>, resource: Resource, action: Action) -> Scope {
    use Action::*;
    use Resource::*;

    match (role, resource, action) {
        (Some(Role::Admin), _, _) => Scope::All,
        (_, Specialties, List | Read) => Scope::All,
        (None, _, _) => Scope::Denied,

        (Some(_), DoctorProfiles, List | Read) => Scope::All,
        (Some(_), Users, Read | Update) => Scope::Own,

        (Some(Role::Accountant), Appointments, List | Read) => Scope::All,
        (Some(Role::Accountant), Payments, List | Read | Create) => Scope::All,

        (Some(Role::Doctor), Appointments, List | Read | Update) => Scope::Own,
        (Some(Role::Doctor), DoctorProfiles, Update) => Scope::Own,

        (Some(Role::Patient), Appointments, List | Read | Create | Update) => Scope::Own,

        _ => Scope::Denied,
    }
}

/// A granted permission, carrying the acting user when there is one
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// Anonymous caller on a public resource
    Public,
    All(AuthenticatedUser),
    Own(AuthenticatedUser),
}

impl Access {
    pub fn actor(&self) -> Option<&AuthenticatedUser> {
        match self {
            Access::Public => None,
            Access::All(user) | Access::Own(user) => Some(user),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.actor().map(|user| user.role) == Some(Role::Admin)
    }

    /// The user id a listing must be narrowed to, if any
    pub fn owner_filter(&self) -> Option<&str> {
        match self {
            Access::Own(user) => Some(&user.id),
            _ => None,
        }
    }

    /// Checks that a record owned by `owner_id` is within scope
    pub fn ensure_owner(&self, owner_id: &str) -> Result<(), AppError> {
        match self {
            Access::Own(user) if user.id != owner_id => {
                debug!(actor = %user.id, owner = %owner_id, "Record outside own scope");
                Err(AppError::forbidden())
            }
            _ => Ok(()),
        }
    }
}

/// The single guard: anonymous callers on non-public resources get
/// `Unauthenticated`, authenticated callers without permission get `Forbidden`.
pub fn authorize(
    ctx: &RequestContext,
    resource: Resource,
    action: Action,
) -> Result<Access, AppError> {
    let scope = scope_for(ctx.role(), resource, action);

    match (&ctx.user, scope) {
        (None, Scope::All) => Ok(Access::Public),
        (None, _) => Err(AppError::not_authenticated()),
        (Some(user), Scope::Denied) => {
            debug!(
                user_id = %user.id,
                role = %user.role,
                ?resource,
                ?action,
                "Access denied"
            );
            Err(AppError::forbidden())
        }
        (Some(user), Scope::Own) => Ok(Access::Own(user.clone())),
        (Some(user), Scope::All) => Ok(Access::All(user.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use strum::IntoEnumIterator;
    use Action::*;
    use Resource::*;

    fn context_for(role: Role) -> RequestContext {
        RequestContext::authenticated(
            AuthenticatedUser {
                id: format!("{}-id", role),
                email: format!("{}@clinic.com", role),
                name: role.to_string(),
                role,
            },
            "session".to_string(),
        )
    }

    #[test]
    fn test_admin_is_allowed_everything() {
        for resource in [Users, Specialties, DoctorProfiles, Appointments, Payments] {
            for action in [List, Read, Create, Update, Delete] {
                assert_eq!(scope_for(Some(Role::Admin), resource, action), Scope::All);
            }
        }
    }

    #[rstest]
    #[case(Specialties, List, Scope::All)]
    #[case(Specialties, Read, Scope::All)]
    #[case(Specialties, Create, Scope::Denied)]
    #[case(DoctorProfiles, List, Scope::Denied)]
    #[case(Appointments, Read, Scope::Denied)]
    #[case(Users, Read, Scope::Denied)]
    #[case(Payments, List, Scope::Denied)]
    fn test_anonymous_scopes(
        #[case] resource: Resource,
        #[case] action: Action,
        #[case] expected: Scope,
    ) {
        assert_eq!(scope_for(None, resource, action), expected);
    }

    #[rstest]
    #[case(Role::Accountant, Appointments, List, Scope::All)]
    #[case(Role::Accountant, Appointments, Update, Scope::Denied)]
    #[case(Role::Accountant, Payments, Create, Scope::All)]
    #[case(Role::Accountant, Users, List, Scope::Denied)]
    #[case(Role::Accountant, Specialties, Update, Scope::Denied)]
    #[case(Role::Accountant, DoctorProfiles, Update, Scope::Denied)]
    #[case(Role::Doctor, Appointments, List, Scope::Own)]
    #[case(Role::Doctor, Appointments, Update, Scope::Own)]
    #[case(Role::Doctor, Appointments, Create, Scope::Denied)]
    #[case(Role::Doctor, Appointments, Delete, Scope::Denied)]
    #[case(Role::Doctor, DoctorProfiles, Update, Scope::Own)]
    #[case(Role::Doctor, DoctorProfiles, Create, Scope::Denied)]
    #[case(Role::Doctor, Payments, List, Scope::Denied)]
    #[case(Role::Patient, Appointments, Create, Scope::Own)]
    #[case(Role::Patient, Appointments, Update, Scope::Own)]
    #[case(Role::Patient, Appointments, Delete, Scope::Denied)]
    #[case(Role::Patient, Users, Read, Scope::Own)]
    #[case(Role::Patient, Users, Update, Scope::Own)]
    #[case(Role::Patient, Users, List, Scope::Denied)]
    #[case(Role::Patient, Users, Delete, Scope::Denied)]
    #[case(Role::Patient, Payments, Read, Scope::Denied)]
    #[case(Role::Patient, DoctorProfiles, Read, Scope::All)]
    fn test_role_scopes(
        #[case] role: Role,
        #[case] resource: Resource,
        #[case] action: Action,
        #[case] expected: Scope,
    ) {
        assert_eq!(scope_for(Some(role), resource, action), expected);
    }

    #[test]
    fn test_only_admin_can_delete_users_or_write_specialties() {
        for role in Role::iter().filter(|r| *r != Role::Admin) {
            assert_eq!(scope_for(Some(role), Users, Delete), Scope::Denied);
            assert_eq!(scope_for(Some(role), Users, Create), Scope::Denied);
            assert_eq!(scope_for(Some(role), Specialties, Create), Scope::Denied);
            assert_eq!(scope_for(Some(role), Specialties, Delete), Scope::Denied);
        }
    }

    #[test]
    fn test_authorize_anonymous() {
        let ctx = RequestContext::anonymous();

        assert_eq!(authorize(&ctx, Specialties, List).unwrap(), Access::Public);
        assert!(matches!(
            authorize(&ctx, Appointments, List),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_authorize_denied_is_forbidden() {
        let ctx = context_for(Role::Patient);
        assert!(matches!(
            authorize(&ctx, Payments, List),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_own_access_checks_owner() {
        let ctx = context_for(Role::Patient);
        let access = authorize(&ctx, Appointments, Read).unwrap();

        assert_eq!(access.owner_filter(), Some("patient-id"));
        assert!(access.ensure_owner("patient-id").is_ok());
        assert!(matches!(
            access.ensure_owner("someone-else"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_all_access_skips_owner_check() {
        let ctx = context_for(Role::Accountant);
        let access = authorize(&ctx, Appointments, Read).unwrap();

        assert!(access.owner_filter().is_none());
        assert!(access.ensure_owner("anyone").is_ok());
        assert!(!access.is_admin());
    }
}
