use std::collections::HashMap;

use chrono::NaiveDateTime;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::{attendance::Attendance, user::User};
use crate::store::AttendanceRepository;

/// Result of a toggle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    #[display(fmt = "clocked in")]
    ClockedIn,
    #[display(fmt = "clocked out")]
    ClockedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClockStatus {
    pub state: ClockState,
    /// Clock-in time of the open row while clocked in.
    pub since: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HoursWorked {
    pub user_id: u64,
    pub username: String,
    pub hours: f64,
}

/// Closes the user's open row, or opens a new one when there is none.
#[instrument(skip(repo))]
pub async fn toggle(
    repo: &dyn AttendanceRepository,
    user_id: u64,
    now: NaiveDateTime,
) -> AppResult<ClockState> {
    match repo.latest_for_user(user_id).await? {
        Some(open) if open.is_open() => {
            repo.close(open.id, now).await?.ok_or_else(|| {
                AppError::conflict("Attendance changed concurrently, please retry")
            })?;
            tracing::info!(user_id, attendance_id = open.id, "Clocked out");
            Ok(ClockState::ClockedOut)
        }
        _ => {
            let row = repo.open(user_id, now).await?;
            tracing::info!(user_id, attendance_id = row.id, "Clocked in");
            Ok(ClockState::ClockedIn)
        }
    }
}

#[instrument(skip(repo))]
pub async fn status(repo: &dyn AttendanceRepository, user_id: u64) -> AppResult<ClockStatus> {
    Ok(match repo.latest_for_user(user_id).await? {
        Some(row) if row.is_open() => ClockStatus {
            state: ClockState::ClockedIn,
            since: Some(row.clock_in_time),
        },
        _ => ClockStatus {
            state: ClockState::ClockedOut,
            since: None,
        },
    })
}

/// Sum of closed intervals in hours. Open rows are ignored.
pub fn hours_worked(records: &[Attendance]) -> f64 {
    records
        .iter()
        .filter_map(|r| r.clock_out_time.map(|out| out - r.clock_in_time))
        .map(|d| d.num_seconds() as f64 / 3600.0)
        .sum()
}

/// Per-user totals in the order of `users`; users with no closed rows get 0.
pub fn hours_by_user(users: &[User], records: &[Attendance]) -> Vec<HoursWorked> {
    let mut by_user: HashMap<u64, Vec<Attendance>> = HashMap::new();
    for record in records {
        by_user.entry(record.user_id).or_default().push(record.clone());
    }

    users
        .iter()
        .map(|u| HoursWorked {
            user_id: u.id,
            username: u.username.clone(),
            hours: by_user.get(&u.id).map(|r| hours_worked(r)).unwrap_or(0.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::role::Role;
    use crate::store::memory::MemoryStore;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn open_rows(rows: &[Attendance]) -> usize {
        rows.iter().filter(|r| r.is_open()).count()
    }

    #[actix_web::test]
    async fn toggles_in_out_then_in_again() {
        let store = MemoryStore::default();

        assert_eq!(toggle(&store, 7, at(9, 0)).await.unwrap(), ClockState::ClockedIn);
        let first = store.latest_for_user(7).await.unwrap().unwrap();
        assert_eq!(first.clock_in_time, at(9, 0));
        assert!(first.is_open());

        assert_eq!(toggle(&store, 7, at(17, 0)).await.unwrap(), ClockState::ClockedOut);
        let closed = store.latest_for_user(7).await.unwrap().unwrap();
        assert_eq!(closed.id, first.id);
        assert_eq!(closed.clock_out_time, Some(at(17, 0)));

        assert_eq!(toggle(&store, 7, at(18, 0)).await.unwrap(), ClockState::ClockedIn);
        let rows = store.history(7, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_ne!(rows[0].id, first.id);
        assert!(rows[0].is_open());
    }

    #[actix_web::test]
    async fn open_row_count_follows_toggle_parity() {
        let store = MemoryStore::default();
        for n in 1..=6u32 {
            toggle(&store, 1, at(8, n)).await.unwrap();
            let rows = store.history(1, 100).await.unwrap();
            assert_eq!(open_rows(&rows), (n % 2) as usize, "after {n} toggles");
        }
    }

    #[actix_web::test]
    async fn users_are_tracked_independently() {
        let store = MemoryStore::default();
        toggle(&store, 1, at(9, 0)).await.unwrap();
        assert_eq!(toggle(&store, 2, at(9, 5)).await.unwrap(), ClockState::ClockedIn);
        assert_eq!(status(&store, 1).await.unwrap().since, Some(at(9, 0)));
        assert_eq!(status(&store, 3).await.unwrap().state, ClockState::ClockedOut);
    }

    #[test]
    fn sums_closed_intervals_per_user() {
        let row = |id, user_id, from: NaiveDateTime, to: Option<NaiveDateTime>| Attendance {
            id,
            clock_in_time: from,
            clock_out_time: to,
            user_id,
        };
        let records = vec![
            row(1, 1, at(9, 0), Some(at(12, 30))),
            row(2, 1, at(13, 0), Some(at(14, 0))),
            row(3, 1, at(15, 0), None),
        ];
        assert_eq!(hours_worked(&records), 4.5);

        let user = |id, name: &str| User {
            id,
            username: name.into(),
            email: format!("{name}@example.com"),
            password_hash: String::new(),
            role: Role::Employee,
            created_at: at(0, 0),
            last_login_at: None,
        };
        let totals = hours_by_user(&[user(1, "ana"), user(2, "ben")], &records);
        assert_eq!(totals[0].hours, 4.5);
        assert_eq!(totals[1].hours, 0.0);
        assert_eq!(ClockState::ClockedIn.to_string(), "clocked in");
    }
}
