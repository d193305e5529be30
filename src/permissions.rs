//! Role-based access policies dispatched by HTTP method.
//!
//! Each router is wrapped in one [`AccessPolicy`]; the policy decides from
//! the request method and the caller's roles whether the handler runs.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::auth::CurrentUser;
use crate::error::{ApiError, forbidden, unauthorized};

/// Roles backed by groups of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Registrar,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Registrar, Role::Teacher, Role::Student];

    pub fn group_name(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Registrar => "Registrar",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
        }
    }

    /// Permissions seeded for the role's group as `(name, codename)`.
    pub fn permissions(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Role::Admin => &[
                ("Can manage users", "manage_users"),
                ("Can manage groups", "manage_groups"),
                ("Can manage organization", "manage_organization"),
                ("Can manage curriculum", "manage_curriculum"),
                ("Can manage staff", "manage_staff"),
            ],
            Role::Registrar => &[
                ("Can manage students", "manage_students"),
                ("Can manage enrollments", "manage_enrollments"),
            ],
            Role::Teacher => &[
                ("Can record attendance", "record_attendance"),
                ("Can upload grades", "upload_grades"),
            ],
            Role::Student => &[
                ("Can view own records", "view_own_records"),
            ],
        }
    }
}

/// Who may call a group of routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    AdminOnly,
    /// Safe methods for any authenticated caller, writes for admins.
    AdminOrReadOnly,
    RegistrarOrReadOnly,
    TeacherOrReadOnly,
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

impl AccessPolicy {
    pub fn allows(self, method: &Method, user: &CurrentUser) -> bool {
        match self {
            AccessPolicy::AdminOnly => user.is_admin(),
            AccessPolicy::AdminOrReadOnly => is_safe(method) || user.is_admin(),
            AccessPolicy::RegistrarOrReadOnly => is_safe(method) || user.has_role(Role::Registrar),
            AccessPolicy::TeacherOrReadOnly => is_safe(method) || user.has_role(Role::Teacher),
        }
    }

    /// Checks the caller, returning 401 for anonymous and 403 for denied.
    pub fn check(self, method: &Method, user: Option<&CurrentUser>) -> Result<(), ApiError> {
        let Some(user) = user else {
            return Err(unauthorized(Some("Authentication credentials were not provided")));
        };
        if self.allows(method, user) {
            Ok(())
        } else {
            tracing::debug!(user_id = user.id, policy = ?self, %method, "Request denied by policy");
            Err(forbidden(Some(
                "You do not have permission to perform this action",
            )))
        }
    }
}

/// Route layer applying a policy, installed with
/// `middleware::from_fn_with_state(policy, enforce)`.
pub async fn enforce(
    State(policy): State<AccessPolicy>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    policy.check(request.method(), request.extensions().get::<CurrentUser>())?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn user(is_staff: bool, groups: &[&str]) -> CurrentUser {
        CurrentUser {
            id: 7,
            username: "someone".to_string(),
            is_staff,
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn anonymous_is_unauthorized() {
        let err = AccessPolicy::AdminOrReadOnly
            .check(&Method::GET, None)
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn read_only_policies_allow_safe_methods() {
        let student = user(false, &["Student"]);
        for policy in [
            AccessPolicy::AdminOrReadOnly,
            AccessPolicy::RegistrarOrReadOnly,
            AccessPolicy::TeacherOrReadOnly,
        ] {
            assert!(policy.allows(&Method::GET, &student));
            assert!(policy.allows(&Method::HEAD, &student));
            assert!(!policy.allows(&Method::POST, &student));
            assert!(!policy.allows(&Method::DELETE, &student));
        }
    }

    #[test]
    fn writes_follow_role() {
        let registrar = user(false, &["Registrar"]);
        let teacher = user(false, &["Teacher"]);
        let admin = user(false, &["Admin"]);

        assert!(AccessPolicy::RegistrarOrReadOnly.allows(&Method::POST, &registrar));
        assert!(!AccessPolicy::RegistrarOrReadOnly.allows(&Method::POST, &teacher));
        assert!(AccessPolicy::TeacherOrReadOnly.allows(&Method::PATCH, &teacher));
        assert!(!AccessPolicy::AdminOrReadOnly.allows(&Method::PATCH, &registrar));
        assert!(AccessPolicy::AdminOrReadOnly.allows(&Method::DELETE, &admin));
        assert!(AccessPolicy::TeacherOrReadOnly.allows(&Method::POST, &admin));
    }

    #[test]
    fn admin_only_denies_reads_for_others() {
        let err = AccessPolicy::AdminOnly
            .check(&Method::GET, Some(&user(false, &["Registrar"])))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(AccessPolicy::AdminOnly.check(&Method::GET, Some(&user(true, &[]))).is_ok());
    }

    #[test]
    fn every_role_seeds_permissions() {
        for role in Role::ALL {
            assert!(!role.permissions().is_empty(), "{:?}", role);
        }
    }
}
