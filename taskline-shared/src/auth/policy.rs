/// Role policy table for HTTP routes
///
/// A declarative, ordered list of `(method, path pattern, allowed roles)`
/// entries evaluated first-match per request, consulted by the API
/// middleware before any handler logic runs. `*` matches exactly one
/// path segment.
///
/// Routes not covered by any entry require an authenticated caller of
/// any role. Auth endpoints are public.

use axum::http::Method;

use crate::models::user::Role;

const ALL: &[Role] = &[Role::Admin, Role::ProjectManager, Role::Developer, Role::Viewer];
const MANAGERS: &[Role] = &[Role::Admin, Role::ProjectManager];
const CONTRIBUTORS: &[Role] = &[Role::Admin, Role::ProjectManager, Role::Developer];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Outcome of a policy lookup for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No credentials required
    Public,

    /// Caller must be authenticated with one of these roles
    Roles(&'static [Role]),

    /// Caller must be authenticated; any role is acceptable
    Authenticated,
}

struct PolicyEntry {
    method: Method,
    pattern: &'static str,
    access: Access,
}

fn entry(method: Method, pattern: &'static str, access: Access) -> PolicyEntry {
    PolicyEntry { method, pattern, access }
}

fn policy_table() -> &'static [PolicyEntry] {
    use Access::{Public, Roles};

    // Ordered first-match. Mirrors the resource permissions per role:
    // VIEWER reads projects/tasks/comments and the dashboard, DEVELOPER
    // additionally contributes comments/timelogs/attachments, PROJECT_MANAGER
    // manages projects and tasks, ADMIN does everything including deletes
    // and user administration.
    static TABLE: std::sync::OnceLock<Vec<PolicyEntry>> = std::sync::OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            // Liveness
            entry(Method::GET, "/health", Public),
            // Authentication
            entry(Method::POST, "/api/auth/*", Public),
            // User administration
            entry(Method::GET, "/api/users", Roles(ADMIN_ONLY)),
            entry(Method::GET, "/api/users/*", Roles(ADMIN_ONLY)),
            entry(Method::PUT, "/api/users/*", Roles(ADMIN_ONLY)),
            entry(Method::DELETE, "/api/users/*", Roles(ADMIN_ONLY)),
            // Projects; sub-resource patterns come before the bare id
            // pattern so the table stays first-match-correct even if the
            // matcher ever loosens
            entry(Method::GET, "/api/projects/*/stats", Roles(MANAGERS)),
            entry(Method::GET, "/api/projects/*/tasks", Roles(ALL)),
            entry(Method::POST, "/api/projects/*/tasks", Roles(MANAGERS)),
            entry(Method::GET, "/api/projects", Roles(ALL)),
            entry(Method::POST, "/api/projects", Roles(MANAGERS)),
            entry(Method::GET, "/api/projects/*", Roles(ALL)),
            entry(Method::PUT, "/api/projects/*", Roles(MANAGERS)),
            entry(Method::DELETE, "/api/projects/*", Roles(ADMIN_ONLY)),
            // Task sub-resources
            entry(Method::PUT, "/api/tasks/*/status", Roles(MANAGERS)),
            entry(Method::PUT, "/api/tasks/*/assign", Roles(MANAGERS)),
            entry(Method::GET, "/api/tasks/*/attachments/*", Roles(CONTRIBUTORS)),
            entry(Method::POST, "/api/tasks/*/attachments", Roles(CONTRIBUTORS)),
            entry(Method::GET, "/api/tasks/*/attachments", Roles(CONTRIBUTORS)),
            entry(Method::GET, "/api/tasks/*/comments", Roles(ALL)),
            entry(Method::POST, "/api/tasks/*/comments", Roles(CONTRIBUTORS)),
            entry(Method::GET, "/api/tasks/*/timelogs", Roles(CONTRIBUTORS)),
            entry(Method::POST, "/api/tasks/*/timelogs", Roles(CONTRIBUTORS)),
            // Tasks
            entry(Method::GET, "/api/tasks/*", Roles(ALL)),
            entry(Method::PUT, "/api/tasks/*", Roles(MANAGERS)),
            entry(Method::DELETE, "/api/tasks/*", Roles(ADMIN_ONLY)),
            // Comments and time logs
            entry(Method::PUT, "/api/comments/*", Roles(CONTRIBUTORS)),
            entry(Method::DELETE, "/api/comments/*", Roles(ADMIN_ONLY)),
            entry(Method::PUT, "/api/timelogs/*", Roles(CONTRIBUTORS)),
            entry(Method::DELETE, "/api/timelogs/*", Roles(ADMIN_ONLY)),
            // Dashboard and reports
            entry(Method::GET, "/api/dashboard/overview", Roles(ALL)),
            entry(Method::GET, "/api/dashboard/my-tasks", Roles(ALL)),
            entry(Method::GET, "/api/reports/project/*", Roles(MANAGERS)),
        ]
    })
}

/// Matches a path against a pattern where `*` matches one segment.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/').filter(|s| !s.is_empty());
    let mut path_segments = path.split('/').filter(|s| !s.is_empty());

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p == "*" || p == s => continue,
            _ => return false,
        }
    }
}

/// Looks up the access rule for a route; first match wins.
pub fn route_access(method: &Method, path: &str) -> Access {
    policy_table()
        .iter()
        .find(|e| e.method == *method && pattern_matches(e.pattern, path))
        .map(|e| e.access)
        .unwrap_or(Access::Authenticated)
}

/// Decides whether `role` may call `method path`.
///
/// - `Ok(())`: allowed
/// - `Err(Denial::Unauthenticated)`: no identity on a protected route
/// - `Err(Denial::Forbidden)`: identity present but role not allowed
pub fn authorize(method: &Method, path: &str, role: Option<Role>) -> Result<(), Denial> {
    match route_access(method, path) {
        Access::Public => Ok(()),
        Access::Authenticated => role.map(|_| ()).ok_or(Denial::Unauthenticated),
        Access::Roles(allowed) => match role {
            None => Err(Denial::Unauthenticated),
            Some(r) if allowed.contains(&r) => Ok(()),
            Some(_) => Err(Denial::Forbidden),
        },
    }
}

/// Why a request was rejected by the policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Forbidden,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matching() {
        assert!(pattern_matches("/api/projects/*", "/api/projects/42"));
        assert!(pattern_matches("/api/tasks/*/comments", "/api/tasks/7/comments"));
        assert!(!pattern_matches("/api/projects/*", "/api/projects"));
        assert!(!pattern_matches("/api/projects/*", "/api/projects/42/stats"));
        assert!(!pattern_matches("/api/projects", "/api/tasks"));
    }

    #[test]
    fn test_auth_routes_are_public() {
        assert_eq!(route_access(&Method::POST, "/api/auth/login"), Access::Public);
        assert_eq!(route_access(&Method::POST, "/api/auth/register"), Access::Public);
        assert!(authorize(&Method::POST, "/api/auth/refresh", None).is_ok());
    }

    #[test]
    fn test_viewer_cannot_create_or_delete_tasks() {
        let viewer = Some(Role::Viewer);
        assert_eq!(
            authorize(&Method::POST, "/api/projects/1/tasks", viewer),
            Err(Denial::Forbidden)
        );
        assert_eq!(
            authorize(&Method::DELETE, "/api/tasks/1", viewer),
            Err(Denial::Forbidden)
        );
        // But viewers can read
        assert!(authorize(&Method::GET, "/api/tasks/1", viewer).is_ok());
        assert!(authorize(&Method::GET, "/api/projects", viewer).is_ok());
    }

    #[test]
    fn test_deletes_are_admin_only() {
        for path in ["/api/projects/1", "/api/tasks/1", "/api/comments/1", "/api/timelogs/1"] {
            assert!(authorize(&Method::DELETE, path, Some(Role::Admin)).is_ok());
            assert_eq!(
                authorize(&Method::DELETE, path, Some(Role::ProjectManager)),
                Err(Denial::Forbidden)
            );
        }
    }

    #[test]
    fn test_user_admin_is_admin_only() {
        assert!(authorize(&Method::GET, "/api/users", Some(Role::Admin)).is_ok());
        assert_eq!(
            authorize(&Method::GET, "/api/users", Some(Role::ProjectManager)),
            Err(Denial::Forbidden)
        );
    }

    #[test]
    fn test_developer_contributes_but_does_not_manage() {
        let dev = Some(Role::Developer);
        assert!(authorize(&Method::POST, "/api/tasks/1/comments", dev).is_ok());
        assert!(authorize(&Method::POST, "/api/tasks/1/timelogs", dev).is_ok());
        assert!(authorize(&Method::POST, "/api/tasks/1/attachments", dev).is_ok());
        assert_eq!(
            authorize(&Method::POST, "/api/projects", dev),
            Err(Denial::Forbidden)
        );
        assert_eq!(
            authorize(&Method::PUT, "/api/tasks/1/status", dev),
            Err(Denial::Forbidden)
        );
    }

    #[test]
    fn test_sub_resource_rules_take_precedence() {
        // Stats stay manager-only even though the bare project read is
        // open to everyone
        let viewer = Some(Role::Viewer);
        assert!(authorize(&Method::GET, "/api/projects/1", viewer).is_ok());
        assert_eq!(
            authorize(&Method::GET, "/api/projects/1/stats", viewer),
            Err(Denial::Forbidden)
        );
        assert!(authorize(&Method::GET, "/api/projects/1/stats", Some(Role::ProjectManager)).is_ok());
        // Timelog reads are contributor-scoped despite the open task read
        assert!(authorize(&Method::GET, "/api/tasks/1", viewer).is_ok());
        assert_eq!(
            authorize(&Method::GET, "/api/tasks/1/timelogs", viewer),
            Err(Denial::Forbidden)
        );
    }

    #[test]
    fn test_unauthenticated_is_rejected_before_role_check() {
        assert_eq!(
            authorize(&Method::GET, "/api/projects", None),
            Err(Denial::Unauthenticated)
        );
        // Unlisted routes still require authentication
        assert_eq!(
            authorize(&Method::GET, "/api/something-else", None),
            Err(Denial::Unauthenticated)
        );
        assert!(authorize(&Method::GET, "/api/something-else", Some(Role::Viewer)).is_ok());
    }
}
