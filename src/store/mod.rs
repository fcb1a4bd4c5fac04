//! Repository interfaces, one per entity, plus the [`Store`] bundle handed to
//! handlers through `web::Data`.
//!
//! Two backends implement every trait: [`mysql::MySqlStore`] for deployments
//! and [`memory::MemoryStore`] for tests and local runs. Writes that protect
//! an invariant (one open attendance row per user, one open log per asset)
//! are guarded inside the backend and report a lost race instead of writing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::stream::BoxStream;
use sqlx::MySqlPool;

use crate::error::AppResult;
use crate::model::{
    announcement::{Announcement, NewAnnouncement},
    asset::{Asset, AssetLog, AssetPatch, NewAsset},
    attendance::Attendance,
    document::{Document, DocumentCategory, NewDocument},
    evaluation::{Evaluation, NewEvaluation},
    goal::{Goal, GoalPatch, NewGoal},
    leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
    message::{Message, NewMessage},
    profile_picture::ProfilePicture,
    refresh_token::RefreshToken,
    role::Role,
    shift::{NewShift, Shift},
    task::{NewTask, Task, TaskStatus},
    user::{NewUser, User},
};

pub mod memory;
pub mod mysql;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    async fn create(&self, new: NewUser) -> AppResult<User>;
    async fn find_by_id(&self, id: u64) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn username_exists(&self, username: &str) -> AppResult<bool>;
    async fn email_exists(&self, email: &str) -> AppResult<bool>;
    async fn list(&self) -> AppResult<Vec<User>>;
    async fn set_role(&self, id: u64, role: Role) -> AppResult<bool>;
    async fn touch_last_login(&self, id: u64, at: NaiveDateTime) -> AppResult<()>;
    /// Streams usernames, optionally only those who logged in since `since`.
    fn usernames(&self, since: Option<NaiveDateTime>) -> BoxStream<'_, AppResult<String>>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(&self, user_id: u64, jti: &str, expires_at: NaiveDateTime) -> AppResult<()>;
    /// Returns the token only if it exists and has not been revoked.
    async fn find_active(&self, jti: &str) -> AppResult<Option<RefreshToken>>;
    /// Idempotent; returns whether a live token was revoked.
    async fn revoke(&self, jti: &str) -> AppResult<bool>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, new: NewTask) -> AppResult<Task>;
    async fn find_by_id(&self, id: u64) -> AppResult<Option<Task>>;
    /// Ordered by deadline, soonest first.
    async fn list_assigned_to(&self, user_id: u64) -> AppResult<Vec<Task>>;
    async fn set_status(&self, id: u64, status: TaskStatus) -> AppResult<bool>;
}

#[async_trait]
pub trait ShiftRepository: Send + Sync {
    async fn create(&self, new: NewShift) -> AppResult<Shift>;
    /// Ordered by start time.
    async fn list_for_user(&self, user_id: u64) -> AppResult<Vec<Shift>>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Most recent row by clock-in time.
    async fn latest_for_user(&self, user_id: u64) -> AppResult<Option<Attendance>>;
    /// Inserts an open row. Fails with `Conflict` if the user already has one.
    async fn open(&self, user_id: u64, at: NaiveDateTime) -> AppResult<Attendance>;
    /// Stamps `clock_out_time` on row `id` if it is still open.
    /// Returns `None` when the row was already closed.
    async fn close(&self, id: u64, at: NaiveDateTime) -> AppResult<Option<Attendance>>;
    /// Newest first.
    async fn history(&self, user_id: u64, limit: u32) -> AppResult<Vec<Attendance>>;
    /// Every row with both timestamps set.
    async fn list_closed(&self) -> AppResult<Vec<Attendance>>;
}

#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub status: Option<LeaveStatus>,
    pub user_id: Option<u64>,
    pub page: u32,
    pub per_page: u32,
}

impl LeaveFilter {
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.per_page as u64
    }
}

#[async_trait]
pub trait LeaveRepository: Send + Sync {
    async fn create(&self, new: NewLeaveRequest) -> AppResult<LeaveRequest>;
    async fn find_by_id(&self, id: u64) -> AppResult<Option<LeaveRequest>>;
    /// Ordered by start date ascending. Returns the page and the total count.
    async fn list(&self, filter: &LeaveFilter) -> AppResult<(Vec<LeaveRequest>, i64)>;
    async fn list_for_user(&self, user_id: u64) -> AppResult<Vec<LeaveRequest>>;
    /// Moves a pending request to `status`. Returns false when the request is
    /// missing or already decided.
    async fn decide(&self, id: u64, status: LeaveStatus) -> AppResult<bool>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, new: NewDocument) -> AppResult<Document>;
    /// Filename substring search; all documents when `query` is `None`.
    async fn search(&self, query: Option<&str>) -> AppResult<Vec<Document>>;
    /// Newest upload first.
    async fn list_for_user(
        &self,
        user_id: u64,
        category: Option<DocumentCategory>,
    ) -> AppResult<Vec<Document>>;
}

#[async_trait]
pub trait ProfilePictureRepository: Send + Sync {
    async fn find_for_user(&self, user_id: u64) -> AppResult<Option<ProfilePicture>>;
    /// Creates or replaces the user's picture. Returns the stored record and
    /// the filename it replaced, if any.
    async fn upsert(
        &self,
        user_id: u64,
        filename: &str,
        at: NaiveDateTime,
    ) -> AppResult<(ProfilePicture, Option<String>)>;
}

#[async_trait]
pub trait GoalRepository: Send + Sync {
    async fn create(&self, new: NewGoal) -> AppResult<Goal>;
    async fn find_by_id(&self, id: u64) -> AppResult<Option<Goal>>;
    /// Goals that are not archived.
    async fn list_active_for_user(&self, user_id: u64) -> AppResult<Vec<Goal>>;
    async fn update(&self, id: u64, patch: GoalPatch) -> AppResult<bool>;
}

#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    async fn create(&self, new: NewEvaluation) -> AppResult<Evaluation>;
    /// Newest first.
    async fn list_for_employee(&self, employee_id: u64) -> AppResult<Vec<Evaluation>>;
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, new: NewAnnouncement) -> AppResult<Announcement>;
    async fn find_by_id(&self, id: u64) -> AppResult<Option<Announcement>>;
    /// Newest first.
    async fn list(&self) -> AppResult<Vec<Announcement>>;
    async fn set_image(&self, id: u64, filename: &str) -> AppResult<bool>;
    async fn set_video(&self, id: u64, filename: &str) -> AppResult<bool>;
    async fn delete(&self, id: u64) -> AppResult<bool>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, new: NewMessage) -> AppResult<Message>;
    /// Messages between the two users in either direction, oldest first.
    async fn conversation(&self, user_id: u64, other_id: u64) -> AppResult<Vec<Message>>;
    /// Ids of every user `user_id` has sent to or received from.
    async fn partners(&self, user_id: u64) -> AppResult<Vec<u64>>;
    /// Marks messages from `sender_id` to `recipient_id` read.
    async fn mark_read(&self, recipient_id: u64, sender_id: u64) -> AppResult<u64>;
}

#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn create(&self, new: NewAsset) -> AppResult<Asset>;
    async fn find_by_id(&self, id: u64) -> AppResult<Option<Asset>>;
    async fn list(&self) -> AppResult<Vec<Asset>>;
    /// Applies an administrative edit. The status column is only written while
    /// the asset is not checked out; returns false if nothing matched.
    async fn update(&self, id: u64, patch: AssetPatch) -> AppResult<bool>;
    /// The open log for the asset, if any.
    async fn open_log(&self, asset_id: u64) -> AppResult<Option<AssetLog>>;
    /// Atomically moves the asset from `Available` to `Checked Out` and opens a
    /// log for `user_id`. Returns `None` if the asset was not available.
    async fn check_out(
        &self,
        asset_id: u64,
        user_id: u64,
        at: NaiveDateTime,
    ) -> AppResult<Option<AssetLog>>;
    /// Atomically closes log `log_id` and moves the asset back to `Available`.
    /// Returns `None` if the log was already closed or the asset was not
    /// checked out.
    async fn check_in(
        &self,
        asset_id: u64,
        log_id: u64,
        at: NaiveDateTime,
    ) -> AppResult<Option<AssetLog>>;
    /// Custody history, newest checkout first.
    async fn logs(&self, asset_id: u64) -> AppResult<Vec<AssetLog>>;
}

/// Handles to every repository. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub shifts: Arc<dyn ShiftRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub leave: Arc<dyn LeaveRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub profile_pictures: Arc<dyn ProfilePictureRepository>,
    pub goals: Arc<dyn GoalRepository>,
    pub evaluations: Arc<dyn EvaluationRepository>,
    pub announcements: Arc<dyn AnnouncementRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub assets: Arc<dyn AssetRepository>,
}

impl Store {
    pub fn mysql(pool: MySqlPool) -> Self {
        Self::from_backend(Arc::new(mysql::MySqlStore::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(memory::MemoryStore::default()))
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserRepository
            + RefreshTokenRepository
            + TaskRepository
            + ShiftRepository
            + AttendanceRepository
            + LeaveRepository
            + DocumentRepository
            + ProfilePictureRepository
            + GoalRepository
            + EvaluationRepository
            + AnnouncementRepository
            + MessageRepository
            + AssetRepository
            + 'static,
    {
        Self {
            users: backend.clone(),
            refresh_tokens: backend.clone(),
            tasks: backend.clone(),
            shifts: backend.clone(),
            attendance: backend.clone(),
            leave: backend.clone(),
            documents: backend.clone(),
            profile_pictures: backend.clone(),
            goals: backend.clone(),
            evaluations: backend.clone(),
            announcements: backend.clone(),
            messages: backend.clone(),
            assets: backend,
        }
    }
}
