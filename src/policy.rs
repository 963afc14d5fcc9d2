//! Per-resource visibility and mutation rules.
//!
//! Every rule exists in two forms derived from the same definition: a
//! record-level predicate used on single-record paths, and a list [`Scope`]
//! (SQL fragment plus typed binds) appended to list queries so filtering and
//! per-row authorization cannot drift apart.

use actix_web::http::header;
use actix_web::HttpResponse;

use crate::model::role::Role;

/// The authenticated identity a handler is acting for. Always passed
/// explicitly; `department` is populated from the employee profile on the
/// paths where it matters (documents).
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: u64,
    pub role: Role,
    pub department: Option<String>,
}

impl Actor {
    pub fn new(user_id: u64, role: Role) -> Self {
        Self {
            user_id,
            role,
            department: None,
        }
    }

    pub fn with_department(mut self, department: Option<String>) -> Self {
        self.department = department;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_manager_or_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }

    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    U64(u64),
    Str(String),
}

/// Row filter for list queries. `None` clause means the actor sees every row.
#[derive(Debug, Clone)]
pub struct Scope {
    pub clause: Option<String>,
    pub binds: Vec<Bind>,
}

impl Scope {
    pub fn unrestricted() -> Self {
        Self {
            clause: None,
            binds: Vec::new(),
        }
    }

    pub fn filtered(clause: impl Into<String>, binds: Vec<Bind>) -> Self {
        Self {
            clause: Some(clause.into()),
            binds,
        }
    }

    /// Appends ` AND (<clause>)` to a WHERE clause already containing at
    /// least one term (list queries start from `WHERE 1=1`).
    pub fn push_onto(&self, sql: &mut String) {
        if let Some(clause) = &self.clause {
            sql.push_str(" AND (");
            sql.push_str(clause);
            sql.push(')');
        }
    }
}

/// Unauthorized view/edit paths land back on a safe list route, never on an
/// error page.
pub fn deny_to(location: &str) -> actix_web::Error {
    let resp = HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .finish();
    actix_web::error::InternalError::from_response("access denied", resp).into()
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

// ---------------------------------------------------------------------------
// Announcements
// ---------------------------------------------------------------------------

pub fn can_view_announcement(actor: &Actor, visible_to: &str) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Manager => matches!(visible_to, "all" | "manager"),
        Role::Employee => matches!(visible_to, "all" | "employee"),
    }
}

pub fn can_create_announcement(actor: &Actor) -> bool {
    actor.is_manager_or_admin()
}

/// Manager/Admin gate plus creator-or-Admin on the specific record.
pub fn can_edit_announcement(actor: &Actor, created_by: Option<u64>) -> bool {
    if !actor.is_manager_or_admin() {
        return false;
    }
    actor.is_admin() || created_by == Some(actor.user_id)
}

pub fn can_delete_announcement(actor: &Actor) -> bool {
    actor.is_admin()
}

pub fn announcement_scope(actor: &Actor) -> Scope {
    match actor.role {
        Role::Admin => Scope::unrestricted(),
        Role::Manager => Scope::filtered("visible_to IN ('all', 'manager')", vec![]),
        Role::Employee => Scope::filtered("visible_to IN ('all', 'employee')", vec![]),
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

pub fn can_view_asset(actor: &Actor, assigned_to: Option<u64>, status: &str) -> bool {
    if actor.is_manager_or_admin() {
        return true;
    }
    assigned_to == Some(actor.user_id) || status == "available"
}

pub fn can_manage_assets(actor: &Actor) -> bool {
    actor.is_admin()
}

pub fn asset_scope(actor: &Actor) -> Scope {
    if actor.is_manager_or_admin() {
        Scope::unrestricted()
    } else {
        Scope::filtered(
            "assigned_to = ? OR status = 'available'",
            vec![Bind::U64(actor.user_id)],
        )
    }
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

pub fn can_view_attendance(actor: &Actor, owner: Option<u64>) -> bool {
    actor.is_manager_or_admin() || owner == Some(actor.user_id)
}

pub fn can_clock(actor: &Actor) -> bool {
    actor.is_employee()
}

pub fn can_edit_attendance(actor: &Actor) -> bool {
    actor.is_manager_or_admin()
}

pub fn attendance_scope(actor: &Actor) -> Scope {
    if actor.is_manager_or_admin() {
        Scope::unrestricted()
    } else {
        Scope::filtered("user_id = ?", vec![Bind::U64(actor.user_id)])
    }
}

// ---------------------------------------------------------------------------
// Leave
// ---------------------------------------------------------------------------

pub fn can_view_leave(actor: &Actor, owner: Option<u64>) -> bool {
    actor.is_manager_or_admin() || owner == Some(actor.user_id)
}

pub fn can_request_leave(actor: &Actor) -> bool {
    actor.is_employee()
}

pub fn can_decide_leave(actor: &Actor) -> bool {
    actor.is_manager_or_admin()
}

pub fn leave_scope(actor: &Actor) -> Scope {
    if actor.is_manager_or_admin() {
        Scope::unrestricted()
    } else {
        Scope::filtered("user_id = ?", vec![Bind::U64(actor.user_id)])
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Visibility is the OR of the satisfied clauses: public, or private within
/// the actor's own department. An actor without a profile department sees
/// only public documents.
pub fn can_view_document(actor: &Actor, access_level: &str, department: &str) -> bool {
    if actor.is_admin() {
        return true;
    }
    if access_level == "public" {
        return true;
    }
    access_level == "private" && actor.department.as_deref() == Some(department)
}

pub fn can_upload_document(actor: &Actor) -> bool {
    actor.is_manager_or_admin()
}

pub fn can_edit_document(actor: &Actor, uploaded_by: Option<u64>) -> bool {
    if !actor.is_manager_or_admin() {
        return false;
    }
    actor.is_admin() || uploaded_by == Some(actor.user_id)
}

pub fn can_delete_document(actor: &Actor) -> bool {
    actor.is_admin()
}

pub fn document_scope(actor: &Actor) -> Scope {
    if actor.is_admin() {
        return Scope::unrestricted();
    }
    match &actor.department {
        Some(dept) => Scope::filtered(
            "access_level = 'public' OR (access_level = 'private' AND department = ?)",
            vec![Bind::Str(dept.clone())],
        ),
        None => Scope::filtered("access_level = 'public'", vec![]),
    }
}

// ---------------------------------------------------------------------------
// Projects and tasks
// ---------------------------------------------------------------------------

pub fn can_view_projects(actor: &Actor) -> bool {
    actor.is_manager_or_admin()
}

pub fn can_manage_projects(actor: &Actor) -> bool {
    actor.is_manager_or_admin()
}

pub fn can_delete_project(actor: &Actor) -> bool {
    actor.is_admin()
}

pub fn can_view_task(actor: &Actor, assigned_to: Option<u64>) -> bool {
    actor.is_manager_or_admin() || assigned_to == Some(actor.user_id)
}

pub fn can_create_task(actor: &Actor) -> bool {
    actor.is_manager_or_admin()
}

pub fn can_edit_task(actor: &Actor, assigned_to: Option<u64>) -> bool {
    actor.is_manager_or_admin() || assigned_to == Some(actor.user_id)
}

/// Assignees may touch everything except `assigned_to` and `project_id`;
/// those two require Manager/Admin.
pub fn can_reassign_task(actor: &Actor) -> bool {
    actor.is_manager_or_admin()
}

pub fn can_delete_task(actor: &Actor) -> bool {
    actor.is_admin()
}

pub fn task_scope(actor: &Actor) -> Scope {
    if actor.is_manager_or_admin() {
        Scope::unrestricted()
    } else {
        Scope::filtered("assigned_to = ?", vec![Bind::U64(actor.user_id)])
    }
}

// ---------------------------------------------------------------------------
// Employees and holidays
// ---------------------------------------------------------------------------

pub fn can_list_employees(actor: &Actor) -> bool {
    actor.is_manager_or_admin()
}

pub fn can_manage_employees(actor: &Actor) -> bool {
    actor.is_admin()
}

pub fn can_manage_holidays(actor: &Actor) -> bool {
    actor.is_admin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Actor {
        Actor::new(1, Role::Admin)
    }

    fn manager() -> Actor {
        Actor::new(2, Role::Manager)
    }

    fn employee(id: u64) -> Actor {
        Actor::new(id, Role::Employee)
    }

    #[test]
    fn announcement_visibility_by_role() {
        assert!(can_view_announcement(&admin(), "manager"));
        assert!(can_view_announcement(&admin(), "employee"));
        assert!(can_view_announcement(&manager(), "all"));
        assert!(can_view_announcement(&manager(), "manager"));
        assert!(!can_view_announcement(&manager(), "employee"));
        assert!(can_view_announcement(&employee(5), "all"));
        assert!(can_view_announcement(&employee(5), "employee"));
        assert!(!can_view_announcement(&employee(5), "manager"));
    }

    #[test]
    fn announcement_edit_requires_creator_or_admin() {
        let m = manager();
        assert!(can_edit_announcement(&m, Some(m.user_id)));
        assert!(!can_edit_announcement(&m, Some(99)));
        assert!(can_edit_announcement(&admin(), Some(99)));
        assert!(!can_edit_announcement(&employee(5), Some(5)));
        assert!(!can_delete_announcement(&manager()));
        assert!(can_delete_announcement(&admin()));
    }

    #[test]
    fn announcement_scope_matches_predicate() {
        assert!(announcement_scope(&admin()).clause.is_none());
        assert_eq!(
            announcement_scope(&manager()).clause.as_deref(),
            Some("visible_to IN ('all', 'manager')")
        );
        assert_eq!(
            announcement_scope(&employee(5)).clause.as_deref(),
            Some("visible_to IN ('all', 'employee')")
        );
    }

    #[test]
    fn employee_sees_own_or_available_assets_only() {
        let e = employee(7);
        assert!(can_view_asset(&e, Some(7), "in-use"));
        assert!(can_view_asset(&e, None, "available"));
        assert!(!can_view_asset(&e, Some(8), "in-use"));
        assert!(!can_view_asset(&e, None, "retired"));
        assert!(can_view_asset(&manager(), Some(8), "retired"));

        let scope = asset_scope(&e);
        assert_eq!(
            scope.clause.as_deref(),
            Some("assigned_to = ? OR status = 'available'")
        );
        assert_eq!(scope.binds, vec![Bind::U64(7)]);
        assert!(asset_scope(&manager()).clause.is_none());
        assert!(!can_manage_assets(&manager()));
        assert!(can_manage_assets(&admin()));
    }

    #[test]
    fn attendance_and_leave_ownership() {
        let e = employee(7);
        assert!(can_view_attendance(&e, Some(7)));
        assert!(!can_view_attendance(&e, Some(8)));
        assert!(can_view_attendance(&manager(), Some(8)));
        assert!(can_clock(&e));
        assert!(!can_clock(&manager()));
        assert!(!can_clock(&admin()));

        assert!(can_view_leave(&e, Some(7)));
        assert!(!can_view_leave(&e, Some(8)));
        assert!(can_request_leave(&e));
        assert!(!can_request_leave(&admin()));
        assert!(can_decide_leave(&manager()));
        assert!(!can_decide_leave(&e));
        assert_eq!(leave_scope(&e).binds, vec![Bind::U64(7)]);
    }

    #[test]
    fn private_documents_are_department_bound() {
        let hr = employee(7).with_department(Some("HR".into()));
        let it = employee(8).with_department(Some("IT".into()));
        let no_profile = employee(9);

        assert!(can_view_document(&hr, "private", "HR"));
        assert!(!can_view_document(&it, "private", "HR"));
        assert!(!can_view_document(&no_profile, "private", "HR"));
        assert!(can_view_document(&it, "public", "HR"));
        assert!(can_view_document(&admin(), "private", "HR"));

        let scope = document_scope(&it);
        assert_eq!(scope.binds, vec![Bind::Str("IT".into())]);
        assert_eq!(
            document_scope(&no_profile).clause.as_deref(),
            Some("access_level = 'public'")
        );
    }

    #[test]
    fn document_edit_is_owner_or_admin_within_manager_gate() {
        let m = manager();
        assert!(can_edit_document(&m, Some(m.user_id)));
        assert!(!can_edit_document(&m, Some(42)));
        assert!(can_edit_document(&admin(), Some(42)));
        assert!(!can_edit_document(&employee(42), Some(42)));
        assert!(!can_delete_document(&m));
    }

    #[test]
    fn tasks_are_scoped_to_assignee_for_employees() {
        let e = employee(7);
        assert!(can_view_task(&e, Some(7)));
        assert!(!can_view_task(&e, None));
        assert!(!can_view_task(&e, Some(8)));
        assert!(can_edit_task(&e, Some(7)));
        assert!(!can_edit_task(&e, Some(8)));
        assert!(!can_reassign_task(&e));
        assert!(can_reassign_task(&manager()));
        assert!(!can_delete_task(&manager()));
        assert!(can_delete_task(&admin()));
        assert_eq!(task_scope(&e).binds, vec![Bind::U64(7)]);
        assert!(task_scope(&admin()).clause.is_none());
    }

    #[test]
    fn project_and_employee_gates() {
        assert!(!can_view_projects(&employee(1)));
        assert!(can_view_projects(&manager()));
        assert!(!can_delete_project(&manager()));
        assert!(can_list_employees(&manager()));
        assert!(!can_manage_employees(&manager()));
        assert!(can_manage_employees(&admin()));
        assert!(!can_manage_holidays(&manager()));
    }

    #[test]
    fn scope_push_onto_appends_parenthesized_clause() {
        let mut sql = String::from("SELECT * FROM assets WHERE 1=1");
        asset_scope(&employee(3)).push_onto(&mut sql);
        assert_eq!(
            sql,
            "SELECT * FROM assets WHERE 1=1 AND (assigned_to = ? OR status = 'available')"
        );

        let mut sql = String::from("SELECT * FROM assets WHERE 1=1");
        asset_scope(&admin()).push_onto(&mut sql);
        assert_eq!(sql, "SELECT * FROM assets WHERE 1=1");
    }
}
