//! In-process backend. Every operation takes one lock over all tables, which
//! makes each guarded write atomic the same way a MySQL transaction is.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::{StreamExt, stream::BoxStream};

use super::{
    AnnouncementRepository, AssetRepository, AttendanceRepository, DocumentRepository,
    EvaluationRepository, GoalRepository, LeaveFilter, LeaveRepository, MessageRepository,
    ProfilePictureRepository, RefreshTokenRepository, ShiftRepository, TaskRepository,
    UserRepository,
};
use crate::error::{AppError, AppResult};
use crate::model::{
    announcement::{Announcement, NewAnnouncement},
    asset::{Asset, AssetLog, AssetPatch, AssetStatus, NewAsset},
    attendance::Attendance,
    document::{Document, DocumentCategory, NewDocument},
    evaluation::{Evaluation, NewEvaluation},
    goal::{Goal, GoalPatch, GoalStatus, NewGoal},
    leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
    message::{Message, NewMessage},
    profile_picture::ProfilePicture,
    refresh_token::RefreshToken,
    role::Role,
    shift::{NewShift, Shift},
    task::{NewTask, Task, TaskStatus},
    user::{NewUser, User},
};

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: Vec<User>,
    refresh_tokens: Vec<RefreshToken>,
    tasks: Vec<Task>,
    shifts: Vec<Shift>,
    attendance: Vec<Attendance>,
    leave: Vec<LeaveRequest>,
    documents: Vec<Document>,
    profile_pictures: Vec<ProfilePicture>,
    goals: Vec<Goal>,
    evaluations: Vec<Evaluation>,
    announcements: Vec<Announcement>,
    messages: Vec<Message>,
    assets: Vec<Asset>,
    asset_logs: Vec<AssetLog>,
}

impl Tables {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new: NewUser) -> AppResult<User> {
        let mut t = self.tables()?;
        if t
            .users
            .iter()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Err(AppError::conflict("Username or email already exists"));
        }
        let user = User {
            id: t.id(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: new.created_at,
            last_login_at: None,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        Ok(self
            .tables()?
            .users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username)))
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        Ok(self
            .tables()?
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let mut users = self.tables()?.users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn set_role(&self, id: u64, role: Role) -> AppResult<bool> {
        let mut t = self.tables()?;
        match t.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_login(&self, id: u64, at: NaiveDateTime) -> AppResult<()> {
        let mut t = self.tables()?;
        if let Some(user) = t.users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    fn usernames(&self, since: Option<NaiveDateTime>) -> BoxStream<'_, AppResult<String>> {
        let names: Vec<AppResult<String>> = match self.tables() {
            Ok(t) => t
                .users
                .iter()
                .filter(|u| match since {
                    Some(since) => u.last_login_at.is_some_and(|at| at >= since),
                    None => true,
                })
                .map(|u| Ok(u.username.clone()))
                .collect(),
            Err(e) => vec![Err(e)],
        };
        futures::stream::iter(names).boxed()
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn insert(&self, user_id: u64, jti: &str, expires_at: NaiveDateTime) -> AppResult<()> {
        let mut t = self.tables()?;
        let id = t.id();
        t.refresh_tokens.push(RefreshToken {
            id,
            user_id,
            jti: jti.to_string(),
            expires_at,
            revoked: false,
        });
        Ok(())
    }

    async fn find_active(&self, jti: &str) -> AppResult<Option<RefreshToken>> {
        Ok(self
            .tables()?
            .refresh_tokens
            .iter()
            .find(|r| r.jti == jti && !r.revoked)
            .cloned())
    }

    async fn revoke(&self, jti: &str) -> AppResult<bool> {
        let mut t = self.tables()?;
        match t
            .refresh_tokens
            .iter_mut()
            .find(|r| r.jti == jti && !r.revoked)
        {
            Some(token) => {
                token.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create(&self, new: NewTask) -> AppResult<Task> {
        let mut t = self.tables()?;
        let task = Task {
            id: t.id(),
            title: new.title,
            description: new.description,
            priority: new.priority,
            deadline: new.deadline,
            status: TaskStatus::default(),
            date_posted: new.date_posted,
            assigned_to_id: new.assigned_to_id,
            assigned_by_id: new.assigned_by_id,
        };
        t.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<Task>> {
        Ok(self.tables()?.tasks.iter().find(|x| x.id == id).cloned())
    }

    async fn list_assigned_to(&self, user_id: u64) -> AppResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tables()?
            .tasks
            .iter()
            .filter(|x| x.assigned_to_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|x| x.deadline);
        Ok(tasks)
    }

    async fn set_status(&self, id: u64, status: TaskStatus) -> AppResult<bool> {
        let mut t = self.tables()?;
        match t.tasks.iter_mut().find(|x| x.id == id) {
            Some(task) => {
                task.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ShiftRepository for MemoryStore {
    async fn create(&self, new: NewShift) -> AppResult<Shift> {
        let mut t = self.tables()?;
        let shift = Shift {
            id: t.id(),
            start_time: new.start_time,
            end_time: new.end_time,
            user_id: new.user_id,
        };
        t.shifts.push(shift.clone());
        Ok(shift)
    }

    async fn list_for_user(&self, user_id: u64) -> AppResult<Vec<Shift>> {
        let mut shifts: Vec<Shift> = self
            .tables()?
            .shifts
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        shifts.sort_by_key(|s| s.start_time);
        Ok(shifts)
    }
}

#[async_trait]
impl AttendanceRepository for MemoryStore {
    async fn latest_for_user(&self, user_id: u64) -> AppResult<Option<Attendance>> {
        Ok(self
            .tables()?
            .attendance
            .iter()
            .filter(|a| a.user_id == user_id)
            .max_by_key(|a| (a.clock_in_time, a.id))
            .cloned())
    }

    async fn open(&self, user_id: u64, at: NaiveDateTime) -> AppResult<Attendance> {
        let mut t = self.tables()?;
        if t
            .attendance
            .iter()
            .any(|a| a.user_id == user_id && a.is_open())
        {
            return Err(AppError::conflict(
                "Attendance changed concurrently, please retry",
            ));
        }
        let row = Attendance {
            id: t.id(),
            clock_in_time: at,
            clock_out_time: None,
            user_id,
        };
        t.attendance.push(row.clone());
        Ok(row)
    }

    async fn close(&self, id: u64, at: NaiveDateTime) -> AppResult<Option<Attendance>> {
        let mut t = self.tables()?;
        match t.attendance.iter_mut().find(|a| a.id == id && a.is_open()) {
            Some(row) => {
                row.clock_out_time = Some(at);
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn history(&self, user_id: u64, limit: u32) -> AppResult<Vec<Attendance>> {
        let mut rows: Vec<Attendance> = self
            .tables()?
            .attendance
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.clock_in_time, b.id).cmp(&(a.clock_in_time, a.id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn list_closed(&self) -> AppResult<Vec<Attendance>> {
        Ok(self
            .tables()?
            .attendance
            .iter()
            .filter(|a| !a.is_open())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LeaveRepository for MemoryStore {
    async fn create(&self, new: NewLeaveRequest) -> AppResult<LeaveRequest> {
        let mut t = self.tables()?;
        let leave = LeaveRequest {
            id: t.id(),
            start_date: new.start_date,
            end_date: new.end_date,
            reason: new.reason,
            status: LeaveStatus::default(),
            user_id: new.user_id,
            created_at: new.created_at,
        };
        t.leave.push(leave.clone());
        Ok(leave)
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        Ok(self.tables()?.leave.iter().find(|l| l.id == id).cloned())
    }

    async fn list(&self, filter: &LeaveFilter) -> AppResult<(Vec<LeaveRequest>, i64)> {
        let mut matching: Vec<LeaveRequest> = self
            .tables()?
            .leave
            .iter()
            .filter(|l| filter.status.is_none_or(|s| l.status == s))
            .filter(|l| filter.user_id.is_none_or(|u| l.user_id == u))
            .cloned()
            .collect();
        matching.sort_by_key(|l| (l.start_date, l.id));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.per_page as usize)
            .collect();
        Ok((page, total))
    }

    async fn list_for_user(&self, user_id: u64) -> AppResult<Vec<LeaveRequest>> {
        let mut rows: Vec<LeaveRequest> = self
            .tables()?
            .leave
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn decide(&self, id: u64, status: LeaveStatus) -> AppResult<bool> {
        let mut t = self.tables()?;
        match t
            .leave
            .iter_mut()
            .find(|l| l.id == id && l.status == LeaveStatus::Pending)
        {
            Some(leave) => {
                leave.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn create(&self, new: NewDocument) -> AppResult<Document> {
        let mut t = self.tables()?;
        let doc = Document {
            id: t.id(),
            filename: new.filename,
            stored_name: new.stored_name,
            category: new.category,
            upload_date: new.upload_date,
            expiry_date: new.expiry_date,
            user_id: new.user_id,
        };
        t.documents.push(doc.clone());
        Ok(doc)
    }

    async fn search(&self, query: Option<&str>) -> AppResult<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .tables()?
            .documents
            .iter()
            .filter(|d| query.is_none_or(|q| d.filename.contains(q)))
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(docs)
    }

    async fn list_for_user(
        &self,
        user_id: u64,
        category: Option<DocumentCategory>,
    ) -> AppResult<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .tables()?
            .documents
            .iter()
            .filter(|d| d.user_id == user_id)
            .filter(|d| category.is_none_or(|c| d.category == c))
            .cloned()
            .collect();
        docs.sort_by(|a, b| (b.upload_date, b.id).cmp(&(a.upload_date, a.id)));
        Ok(docs)
    }
}

#[async_trait]
impl ProfilePictureRepository for MemoryStore {
    async fn find_for_user(&self, user_id: u64) -> AppResult<Option<ProfilePicture>> {
        Ok(self
            .tables()?
            .profile_pictures
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn upsert(
        &self,
        user_id: u64,
        filename: &str,
        at: NaiveDateTime,
    ) -> AppResult<(ProfilePicture, Option<String>)> {
        let mut t = self.tables()?;
        if let Some(existing) = t.profile_pictures.iter_mut().find(|p| p.user_id == user_id) {
            let previous = std::mem::replace(&mut existing.filename, filename.to_string());
            existing.upload_date = at;
            return Ok((existing.clone(), Some(previous)));
        }
        let picture = ProfilePicture {
            id: t.id(),
            filename: filename.to_string(),
            upload_date: at,
            user_id,
        };
        t.profile_pictures.push(picture.clone());
        Ok((picture, None))
    }
}

#[async_trait]
impl GoalRepository for MemoryStore {
    async fn create(&self, new: NewGoal) -> AppResult<Goal> {
        let mut t = self.tables()?;
        let goal = Goal {
            id: t.id(),
            title: new.title,
            description: new.description,
            status: new.status,
            user_id: new.user_id,
        };
        t.goals.push(goal.clone());
        Ok(goal)
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<Goal>> {
        Ok(self.tables()?.goals.iter().find(|g| g.id == id).cloned())
    }

    async fn list_active_for_user(&self, user_id: u64) -> AppResult<Vec<Goal>> {
        Ok(self
            .tables()?
            .goals
            .iter()
            .filter(|g| g.user_id == user_id && g.status != GoalStatus::Archived)
            .cloned()
            .collect())
    }

    async fn update(&self, id: u64, patch: GoalPatch) -> AppResult<bool> {
        let mut t = self.tables()?;
        let Some(goal) = t.goals.iter_mut().find(|g| g.id == id) else {
            return Ok(false);
        };
        if let Some(title) = patch.title {
            goal.title = title;
        }
        if let Some(description) = patch.description {
            goal.description = description;
        }
        if let Some(status) = patch.status {
            goal.status = status;
        }
        Ok(true)
    }
}

#[async_trait]
impl EvaluationRepository for MemoryStore {
    async fn create(&self, new: NewEvaluation) -> AppResult<Evaluation> {
        let mut t = self.tables()?;
        let evaluation = Evaluation {
            id: t.id(),
            content: new.content,
            rating: new.rating,
            date_created: new.date_created,
            author_id: new.author_id,
            employee_id: new.employee_id,
        };
        t.evaluations.push(evaluation.clone());
        Ok(evaluation)
    }

    async fn list_for_employee(&self, employee_id: u64) -> AppResult<Vec<Evaluation>> {
        let mut rows: Vec<Evaluation> = self
            .tables()?
            .evaluations
            .iter()
            .filter(|e| e.employee_id == employee_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        Ok(rows)
    }
}

#[async_trait]
impl AnnouncementRepository for MemoryStore {
    async fn create(&self, new: NewAnnouncement) -> AppResult<Announcement> {
        let mut t = self.tables()?;
        let announcement = Announcement {
            id: t.id(),
            title: new.title,
            content: new.content,
            date_posted: new.date_posted,
            user_id: new.user_id,
            image_file: None,
            video_file: None,
        };
        t.announcements.push(announcement.clone());
        Ok(announcement)
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<Announcement>> {
        Ok(self
            .tables()?
            .announcements
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Announcement>> {
        let mut rows = self.tables()?.announcements.clone();
        rows.sort_by(|a, b| (b.date_posted, b.id).cmp(&(a.date_posted, a.id)));
        Ok(rows)
    }

    async fn set_image(&self, id: u64, filename: &str) -> AppResult<bool> {
        let mut t = self.tables()?;
        match t.announcements.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.image_file = Some(filename.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_video(&self, id: u64, filename: &str) -> AppResult<bool> {
        let mut t = self.tables()?;
        match t.announcements.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.video_file = Some(filename.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: u64) -> AppResult<bool> {
        let mut t = self.tables()?;
        let before = t.announcements.len();
        t.announcements.retain(|a| a.id != id);
        Ok(t.announcements.len() < before)
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn create(&self, new: NewMessage) -> AppResult<Message> {
        let mut t = self.tables()?;
        let message = Message {
            id: t.id(),
            content: new.content,
            timestamp: new.timestamp,
            sender_id: new.sender_id,
            recipient_id: new.recipient_id,
            is_read: false,
        };
        t.messages.push(message.clone());
        Ok(message)
    }

    async fn conversation(&self, user_id: u64, other_id: u64) -> AppResult<Vec<Message>> {
        let mut rows: Vec<Message> = self
            .tables()?
            .messages
            .iter()
            .filter(|m| {
                (m.sender_id == user_id && m.recipient_id == other_id)
                    || (m.sender_id == other_id && m.recipient_id == user_id)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.timestamp, m.id));
        Ok(rows)
    }

    async fn partners(&self, user_id: u64) -> AppResult<Vec<u64>> {
        let ids: BTreeSet<u64> = self
            .tables()?
            .messages
            .iter()
            .filter_map(|m| {
                if m.sender_id == user_id {
                    Some(m.recipient_id)
                } else if m.recipient_id == user_id {
                    Some(m.sender_id)
                } else {
                    None
                }
            })
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn mark_read(&self, recipient_id: u64, sender_id: u64) -> AppResult<u64> {
        let mut t = self.tables()?;
        let mut marked = 0;
        for m in t
            .messages
            .iter_mut()
            .filter(|m| m.recipient_id == recipient_id && m.sender_id == sender_id && !m.is_read)
        {
            m.is_read = true;
            marked += 1;
        }
        Ok(marked)
    }
}

#[async_trait]
impl AssetRepository for MemoryStore {
    async fn create(&self, new: NewAsset) -> AppResult<Asset> {
        let mut t = self.tables()?;
        let asset = Asset {
            id: t.id(),
            name: new.name,
            description: new.description,
            status: AssetStatus::default(),
        };
        t.assets.push(asset.clone());
        Ok(asset)
    }

    async fn find_by_id(&self, id: u64) -> AppResult<Option<Asset>> {
        Ok(self.tables()?.assets.iter().find(|a| a.id == id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Asset>> {
        let mut assets = self.tables()?.assets.clone();
        assets.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(assets)
    }

    async fn update(&self, id: u64, patch: AssetPatch) -> AppResult<bool> {
        let mut t = self.tables()?;
        let Some(asset) = t.assets.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        if patch.status.is_some() && asset.status == AssetStatus::CheckedOut {
            return Ok(false);
        }
        if let Some(name) = patch.name {
            asset.name = name;
        }
        if let Some(description) = patch.description {
            asset.description = Some(description);
        }
        if let Some(status) = patch.status {
            asset.status = status;
        }
        Ok(true)
    }

    async fn open_log(&self, asset_id: u64) -> AppResult<Option<AssetLog>> {
        Ok(self
            .tables()?
            .asset_logs
            .iter()
            .find(|l| l.asset_id == asset_id && l.is_open())
            .cloned())
    }

    async fn check_out(
        &self,
        asset_id: u64,
        user_id: u64,
        at: NaiveDateTime,
    ) -> AppResult<Option<AssetLog>> {
        let mut t = self.tables()?;
        let already_open = t
            .asset_logs
            .iter()
            .any(|l| l.asset_id == asset_id && l.is_open());
        let Some(asset) = t.assets.iter_mut().find(|a| a.id == asset_id) else {
            return Ok(None);
        };
        if asset.status != AssetStatus::Available || already_open {
            return Ok(None);
        }
        asset.status = AssetStatus::CheckedOut;

        let log = AssetLog {
            id: t.id(),
            check_out_time: at,
            check_in_time: None,
            user_id,
            asset_id,
        };
        t.asset_logs.push(log.clone());
        Ok(Some(log))
    }

    async fn check_in(
        &self,
        asset_id: u64,
        log_id: u64,
        at: NaiveDateTime,
    ) -> AppResult<Option<AssetLog>> {
        let mut t = self.tables()?;
        let checked_out = t
            .assets
            .iter()
            .any(|a| a.id == asset_id && a.status == AssetStatus::CheckedOut);
        let log_open = t
            .asset_logs
            .iter()
            .any(|l| l.id == log_id && l.asset_id == asset_id && l.is_open());
        if !checked_out || !log_open {
            return Ok(None);
        }

        if let Some(asset) = t.assets.iter_mut().find(|a| a.id == asset_id) {
            asset.status = AssetStatus::Available;
        }
        let log = t
            .asset_logs
            .iter_mut()
            .find(|l| l.id == log_id)
            .map(|l| {
                l.check_in_time = Some(at);
                l.clone()
            });
        Ok(log)
    }

    async fn logs(&self, asset_id: u64) -> AppResult<Vec<AssetLog>> {
        let mut logs: Vec<AssetLog> = self
            .tables()?
            .asset_logs
            .iter()
            .filter(|l| l.asset_id == asset_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| (b.check_out_time, b.id).cmp(&(a.check_out_time, a.id)));
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "hash".into(),
            role: Role::Employee,
            created_at: at(8, 0),
        }
    }

    #[actix_web::test]
    async fn duplicate_username_is_a_conflict() {
        let store = MemoryStore::default();
        UserRepository::create(&store, new_user("ana")).await.unwrap();

        let err = UserRepository::create(&store, new_user("ana")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_web::test]
    async fn second_open_attendance_row_is_refused() {
        let store = MemoryStore::default();
        let row = store.open(1, at(9, 0)).await.unwrap();

        assert!(matches!(store.open(1, at(9, 1)).await, Err(AppError::Conflict(_))));

        let closed = store.close(row.id, at(17, 0)).await.unwrap().unwrap();
        assert_eq!(closed.clock_out_time, Some(at(17, 0)));
        assert!(store.close(row.id, at(17, 5)).await.unwrap().is_none());
        assert!(store.open(1, at(18, 0)).await.is_ok());
    }

    #[actix_web::test]
    async fn check_out_is_refused_while_a_log_is_open() {
        let store = MemoryStore::default();
        let asset = AssetRepository::create(
            &store,
            NewAsset {
                name: "Laptop".into(),
                description: None,
            },
        )
        .await
        .unwrap();

        let log = store.check_out(asset.id, 2, at(9, 0)).await.unwrap().unwrap();
        assert!(store.check_out(asset.id, 3, at(9, 5)).await.unwrap().is_none());

        let closed = store.check_in(asset.id, log.id, at(12, 0)).await.unwrap().unwrap();
        assert_eq!(closed.check_in_time, Some(at(12, 0)));
        assert!(store.check_in(asset.id, log.id, at(12, 1)).await.unwrap().is_none());

        let asset = AssetRepository::find_by_id(&store, asset.id).await.unwrap().unwrap();
        assert_eq!(asset.status, AssetStatus::Available);
    }

    #[actix_web::test]
    async fn status_edit_skips_checked_out_assets() {
        let store = MemoryStore::default();
        let asset = AssetRepository::create(
            &store,
            NewAsset {
                name: "Drill".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        store.check_out(asset.id, 2, at(9, 0)).await.unwrap();

        let patch = AssetPatch {
            status: Some(AssetStatus::InMaintenance),
            ..Default::default()
        };
        assert!(!AssetRepository::update(&store, asset.id, patch).await.unwrap());

        let rename = AssetPatch {
            name: Some("Cordless drill".into()),
            ..Default::default()
        };
        assert!(AssetRepository::update(&store, asset.id, rename).await.unwrap());
    }

    #[actix_web::test]
    async fn leave_pages_and_decides_once() {
        let store = MemoryStore::default();
        for day in 1..=3 {
            LeaveRepository::create(
                &store,
                NewLeaveRequest {
                    start_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 5, day + 1).unwrap(),
                    reason: "trip".into(),
                    user_id: 1,
                    created_at: at(8, 0),
                },
            )
            .await
            .unwrap();
        }

        let filter = LeaveFilter {
            page: 2,
            per_page: 2,
            ..Default::default()
        };
        let (page, total) = LeaveRepository::list(&store, &filter).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);

        let id = page[0].id;
        assert!(store.decide(id, LeaveStatus::Approved).await.unwrap());
        assert!(!store.decide(id, LeaveStatus::Rejected).await.unwrap());
    }

    #[actix_web::test]
    async fn partners_and_read_marks() {
        let store = MemoryStore::default();
        for (from, to) in [(1, 2), (2, 1), (3, 1)] {
            MessageRepository::create(
                &store,
                NewMessage {
                    content: "hi".into(),
                    timestamp: at(10, from as u32),
                    sender_id: from,
                    recipient_id: to,
                },
            )
            .await
            .unwrap();
        }

        assert_eq!(store.partners(1).await.unwrap(), vec![2, 3]);
        assert_eq!(store.conversation(1, 2).await.unwrap().len(), 2);
        assert_eq!(store.mark_read(1, 2).await.unwrap(), 1);
        assert_eq!(store.mark_read(1, 2).await.unwrap(), 0);
    }
}
