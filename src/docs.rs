use crate::api::announcement::{
    AnnouncementListResponse, CreateAnnouncement, UpdateAnnouncement,
};
use crate::model::announcement::Announcement;
use crate::api::asset::{AssetListResponse, CreateAsset, UpdateAsset};
use crate::api::attendance::{AttendanceListResponse, EditAttendance};
use crate::api::dashboard::{DashboardResponse, ProfileResponse};
use crate::api::document::{DocumentListResponse, UpdateDocument};
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::holiday::{CreateHoliday, UpdateHoliday};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::project::{CreateProject, ProjectListResponse, UpdateProject};
use crate::api::task::{CreateTask, TaskListResponse, UpdateTask};
use crate::model::announcement::Visibility;
use crate::model::asset::{Asset, AssetStatus};
use crate::model::attendance::Attendance;
use crate::model::document::{AccessLevel, Document};
use crate::model::employee::{EmployeeProfile, ProfileStatus};
use crate::model::holiday::PublicHoliday;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::project::Project;
use crate::model::role::Role;
use crate::model::task::{Task, TaskStatus};
use crate::models::{LoginReq, RegisterReq, TokenPairResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Office Management API",
        version = "1.0.0",
        description = r#"
## Office Management System

Role-gated CRUD over the day-to-day records of an office.

### 🔹 Key Features
- **Announcements** with per-role visibility
- **Assets** with assignment tracking
- **Attendance** (clock in/out) and **Leave** with an approval workflow
- **Documents** with department-scoped access and downloads
- **Projects & Tasks** with assignee-restricted editing
- **Employee records** managed by Admin
- **Social login** (Google, GitHub, Facebook)

### 🔐 Security
Endpoints are protected with **JWT Bearer authentication**; three roles
(Admin, Manager, Employee) gate what each actor can see and change.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::oauth::handlers::social_login,
        crate::oauth::handlers::social_callback,

        crate::api::dashboard::dashboard,
        crate::api::dashboard::profile,

        crate::api::announcement::announcement_list,
        crate::api::announcement::announcement_get,
        crate::api::announcement::announcement_create,
        crate::api::announcement::announcement_update,
        crate::api::announcement::announcement_delete,

        crate::api::asset::asset_list,
        crate::api::asset::asset_get,
        crate::api::asset::asset_create,
        crate::api::asset::asset_update,
        crate::api::asset::asset_delete,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::attendance_history,
        crate::api::attendance::attendance_get,
        crate::api::attendance::attendance_edit,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::holiday::holiday_list,
        crate::api::holiday::holiday_create,
        crate::api::holiday::holiday_update,
        crate::api::holiday::holiday_delete,

        crate::api::document::document_list,
        crate::api::document::document_upload,
        crate::api::document::document_update,
        crate::api::document::document_delete,
        crate::api::document::document_download,

        crate::api::project::project_list,
        crate::api::project::project_create,
        crate::api::project::project_update,
        crate::api::project::project_delete,

        crate::api::task::task_list,
        crate::api::task::task_get,
        crate::api::task::task_create,
        crate::api::task::task_update,
        crate::api::task::task_delete,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            RegisterReq,
            LoginReq,
            TokenPairResponse,
            DashboardResponse,
            ProfileResponse,
            Announcement,
            AnnouncementListResponse,
            CreateAnnouncement,
            UpdateAnnouncement,
            Asset,
            AssetListResponse,
            CreateAsset,
            UpdateAsset,
            Attendance,
            AttendanceListResponse,
            EditAttendance,
            LeaveRequest,
            LeaveListResponse,
            LeaveFilter,
            CreateLeave,
            PublicHoliday,
            CreateHoliday,
            UpdateHoliday,
            Document,
            DocumentListResponse,
            UpdateDocument,
            Project,
            ProjectListResponse,
            CreateProject,
            UpdateProject,
            Task,
            TaskListResponse,
            CreateTask,
            UpdateTask,
            EmployeeProfile,
            EmployeeListResponse,
            CreateEmployee,
            Role,
            Visibility,
            AssetStatus,
            LeaveStatus,
            AccessLevel,
            TaskStatus,
            ProfileStatus
        )
    ),
    tags(
        (name = "Auth", description = "Registration and token management"),
        (name = "SocialLogin", description = "External identity providers"),
        (name = "Dashboard", description = "Role-aware landing data"),
        (name = "Announcements", description = "Announcement management APIs"),
        (name = "Assets", description = "Asset management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Holidays", description = "Public holiday reference data"),
        (name = "Documents", description = "Document management APIs"),
        (name = "Projects", description = "Project management APIs"),
        (name = "Tasks", description = "Task management APIs"),
        (name = "Employees", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;
