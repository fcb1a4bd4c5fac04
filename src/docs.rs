use crate::api::{
    announcements::{CreateAnnouncement, MediaKind},
    assets::{CreateAsset, UpdateAsset},
    attendance::ClockResponse,
    dashboard::Dashboard,
    documents::DocumentResponse,
    evaluations::{CreateEvaluation, EvaluationSummary},
    goals::{CreateGoal, UpdateGoal},
    leave_request::{CreateLeave, LeaveListResponse},
    messages::SendMessage,
    shifts::CreateShift,
    tasks::{CreateTask, UpdateTaskStatus},
    users::SetRole,
};
use crate::model::{
    announcement::Announcement,
    asset::{Asset, AssetLog, AssetStatus},
    attendance::Attendance,
    document::{Document, DocumentCategory},
    evaluation::Evaluation,
    goal::{Goal, GoalStatus},
    leave_request::{LeaveRequest, LeaveStatus},
    message::Message,
    profile_picture::ProfilePicture,
    role::Role,
    shift::Shift,
    task::{Task, TaskPriority, TaskStatus},
    user::{User, UserSummary},
};
use crate::models::{LoginReqDto, RegisterReq, TokenPair};
use crate::tracking::attendance::{ClockState, ClockStatus, HoursWorked};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workforce Management API",
        version = "1.0.0",
        description = r#"
## Workforce Management System

Back office API for warehouse and shop floor staff.

### Features
- **Accounts**: registration, login, token refresh and roles
- **Work**: tasks, shifts, attendance clocking and hours analytics
- **Leave**: requests, approval and paginated review
- **Files**: documents, payslips and profile pictures
- **People**: goals, evaluations, announcements and direct messages
- **Assets**: inventory with check-out / check-in custody tracking

### Security
Everything under `/api` requires a JWT access token in the
`Authorization: Bearer` header. Managers and admins can act on other
people's records; only admins can change roles.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::dashboard::dashboard,

        crate::api::users::list_users,
        crate::api::users::directory,
        crate::api::users::get_user,
        crate::api::users::set_role,

        crate::api::tasks::create_task,
        crate::api::tasks::my_tasks,
        crate::api::tasks::update_task_status,

        crate::api::shifts::create_shift,
        crate::api::shifts::my_shifts,

        crate::api::attendance::clock,
        crate::api::attendance::my_attendance,
        crate::api::attendance::hours_analytics,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::my_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::documents::upload_document,
        crate::api::documents::search_documents,
        crate::api::documents::my_documents,
        crate::api::documents::upload_payslip,
        crate::api::documents::my_payslips,

        crate::api::profile::get_picture,
        crate::api::profile::upload_picture,

        crate::api::goals::create_goal,
        crate::api::goals::my_goals,
        crate::api::goals::update_goal,

        crate::api::evaluations::create_evaluation,
        crate::api::evaluations::list_evaluations,

        crate::api::announcements::list_announcements,
        crate::api::announcements::create_announcement,
        crate::api::announcements::attach_media,
        crate::api::announcements::delete_announcement,

        crate::api::messages::partners,
        crate::api::messages::conversation,
        crate::api::messages::send_message,

        crate::api::assets::list_assets,
        crate::api::assets::create_asset,
        crate::api::assets::update_asset,
        crate::api::assets::checkout_asset,
        crate::api::assets::checkin_asset,
        crate::api::assets::asset_logs
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            TokenPair,
            Role,
            User,
            UserSummary,
            SetRole,
            Dashboard,
            Task,
            TaskPriority,
            TaskStatus,
            CreateTask,
            UpdateTaskStatus,
            Shift,
            CreateShift,
            Attendance,
            ClockState,
            ClockStatus,
            ClockResponse,
            HoursWorked,
            LeaveRequest,
            LeaveStatus,
            CreateLeave,
            LeaveListResponse,
            Document,
            DocumentCategory,
            DocumentResponse,
            ProfilePicture,
            Goal,
            GoalStatus,
            CreateGoal,
            UpdateGoal,
            Evaluation,
            CreateEvaluation,
            EvaluationSummary,
            Announcement,
            CreateAnnouncement,
            MediaKind,
            Message,
            SendMessage,
            Asset,
            AssetStatus,
            AssetLog,
            CreateAsset,
            UpdateAsset
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and tokens"),
        (name = "Dashboard", description = "Personal overview"),
        (name = "Users", description = "Accounts and roles"),
        (name = "Tasks", description = "Task assignment"),
        (name = "Shifts", description = "Shift scheduling"),
        (name = "Attendance", description = "Clocking and hours"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Documents", description = "Documents and payslips"),
        (name = "Profile", description = "Profile pictures"),
        (name = "Goals", description = "Personal goals"),
        (name = "Evaluations", description = "Performance evaluations"),
        (name = "Announcements", description = "Company announcements"),
        (name = "Messages", description = "Direct messages"),
        (name = "Assets", description = "Inventory and custody"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_protected_path_with_bearer_auth() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/assets/{asset_id}/checkin"));
        assert!(doc.paths.paths.contains_key("/auth/login"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
