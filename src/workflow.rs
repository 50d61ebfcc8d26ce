//! Club creation requests: a coordinator submits, an officer approves or
//! rejects exactly once, and an approval creates the club in the same
//! transaction.

use crate::{
    auth::Principal,
    club::{self, NewClub},
    error::{ensure, ClubError, ClubResult},
    models::{Club, ClubCreationRequest, ClubStatus, RequestStatus},
    permissions,
    schema::*,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

/// Status given to clubs created by an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowPolicy {
    pub approved_club_status: ClubStatus,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        WorkflowPolicy {
            approved_club_status: ClubStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { comment: Option<String> },
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = club_creation_requests)]
pub struct NewClubCreationRequest {
    pub club_name: String,
    pub description: String,
    pub submitted_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub coordinator_id: i32,
}

impl NewClubCreationRequest {
    pub fn submit(
        coordinator: &Principal,
        club_name: String,
        description: String,
        now: DateTime<Utc>,
    ) -> ClubResult<Self> {
        if !permissions::can_submit_request(coordinator) {
            return Err(ClubError::validation(
                "club creation requests must be submitted by a coordinator",
            ));
        }
        let club_name = club_name.trim().to_string();
        if club_name.is_empty() {
            return Err(ClubError::validation("club name must not be empty"));
        }

        Ok(NewClubCreationRequest {
            club_name,
            description,
            submitted_at: now,
            status: RequestStatus::Pending,
            coordinator_id: coordinator.user_id,
        })
    }
}

impl ClubCreationRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Moves a pending request to its terminal state and stamps the review
    /// fields. Fails without touching `self` if the request was already
    /// decided.
    pub fn review(
        &mut self,
        officer: &Principal,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> ClubResult<()> {
        ensure(
            permissions::can_review_request(officer),
            "only a student life officer may review club requests",
        )?;
        if !self.is_pending() {
            return Err(ClubError::conflict(format!(
                "club request {} was already {}",
                self.id, self.status
            )));
        }

        match decision {
            Decision::Approve => self.status = RequestStatus::Approved,
            Decision::Reject { comment } => {
                self.status = RequestStatus::Rejected;
                if comment.is_some() {
                    self.officer_comment = comment;
                }
            }
        }
        self.reviewed_at = Some(now);
        self.reviewed_by = Some(officer.user_id);
        Ok(())
    }
}

pub async fn submit(
    conn: &mut AsyncPgConnection,
    coordinator: &Principal,
    club_name: String,
    description: String,
    now: DateTime<Utc>,
) -> ClubResult<ClubCreationRequest> {
    let new_request = NewClubCreationRequest::submit(coordinator, club_name, description, now)?;

    let request = diesel::insert_into(club_creation_requests::table)
        .values(&new_request)
        .get_result::<ClubCreationRequest>(conn)
        .await?;

    tracing::info!(
        request_id = request.id,
        coordinator_id = request.coordinator_id,
        "club creation request submitted"
    );
    Ok(request)
}

pub async fn approve(
    conn: &mut AsyncPgConnection,
    request_id: i32,
    officer: Principal,
    policy: WorkflowPolicy,
    now: DateTime<Utc>,
) -> ClubResult<(ClubCreationRequest, Club)> {
    let (request, club) = conn
        .transaction::<_, ClubError, _>(move |conn| {
            Box::pin(async move {
                let mut request = lock(conn, request_id).await?;
                request.review(&officer, Decision::Approve, now)?;

                if club::find_by_coordinator(conn, request.coordinator_id)
                    .await?
                    .is_some()
                {
                    return Err(ClubError::conflict(
                        "the coordinator already manages a club",
                    ));
                }

                let request = save_review(conn, &request).await?;
                let club = diesel::insert_into(clubs::table)
                    .values(NewClub::from_approved(
                        &request,
                        policy.approved_club_status,
                        now,
                    ))
                    .get_result::<Club>(conn)
                    .await?;
                Ok((request, club))
            })
        })
        .await?;

    tracing::info!(
        request_id = request.id,
        club_id = club.id,
        reviewed_by = officer.user_id,
        "club creation request approved"
    );
    Ok((request, club))
}

pub async fn reject(
    conn: &mut AsyncPgConnection,
    request_id: i32,
    officer: Principal,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> ClubResult<ClubCreationRequest> {
    let request = conn
        .transaction::<_, ClubError, _>(move |conn| {
            Box::pin(async move {
                let mut request = lock(conn, request_id).await?;
                request.review(&officer, Decision::Reject { comment }, now)?;
                save_review(conn, &request).await
            })
        })
        .await?;

    tracing::info!(
        request_id = request.id,
        reviewed_by = officer.user_id,
        "club creation request rejected"
    );
    Ok(request)
}

/// Officers see every request, coordinators their own, newest first.
pub async fn list(
    conn: &mut AsyncPgConnection,
    actor: &Principal,
) -> ClubResult<Vec<ClubCreationRequest>> {
    let mut query = club_creation_requests::table
        .order(club_creation_requests::submitted_at.desc())
        .into_boxed();

    if !permissions::is_officer(actor) {
        ensure(
            permissions::is_coordinator(actor),
            "members cannot view club requests",
        )?;
        query = query.filter(club_creation_requests::coordinator_id.eq(actor.user_id));
    }

    Ok(query.load::<ClubCreationRequest>(conn).await?)
}

pub async fn get(
    conn: &mut AsyncPgConnection,
    request_id: i32,
    actor: &Principal,
) -> ClubResult<ClubCreationRequest> {
    club_creation_requests::table
        .find(request_id)
        .first::<ClubCreationRequest>(conn)
        .await
        .optional()?
        .filter(|request| permissions::can_view_request(actor, request))
        .ok_or_else(|| ClubError::not_found("club request does not exist"))
}

async fn lock(conn: &mut AsyncPgConnection, request_id: i32) -> ClubResult<ClubCreationRequest> {
    club_creation_requests::table
        .find(request_id)
        .for_update()
        .first::<ClubCreationRequest>(conn)
        .await
        .optional()?
        .ok_or_else(|| ClubError::not_found("club request does not exist"))
}

/// Writes the review fields, but only over a row that is still pending.
async fn save_review(
    conn: &mut AsyncPgConnection,
    request: &ClubCreationRequest,
) -> ClubResult<ClubCreationRequest> {
    use crate::schema::club_creation_requests::dsl::*;

    diesel::update(
        club_creation_requests
            .filter(id.eq(request.id))
            .filter(status.eq(RequestStatus::Pending)),
    )
    .set((
        status.eq(request.status),
        officer_comment.eq(request.officer_comment.clone()),
        reviewed_at.eq(request.reviewed_at),
        reviewed_by.eq(request.reviewed_by),
    ))
    .get_result::<ClubCreationRequest>(conn)
    .await
    .optional()?
    .ok_or_else(|| ClubError::conflict(format!("club request {} was already reviewed", request.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::{Duration, TimeZone};

    const OFFICER: Principal = Principal {
        user_id: 1,
        role: Role::StudentLifeOfficer,
    };
    const COORDINATOR: Principal = Principal {
        user_id: 2,
        role: Role::Coordinator,
    };
    const MEMBER: Principal = Principal {
        user_id: 3,
        role: Role::Member,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 21, 12, 0, 0).unwrap()
    }

    fn pending() -> ClubCreationRequest {
        let new = NewClubCreationRequest::submit(
            &COORDINATOR,
            "Chess Club".into(),
            "Weekly games".into(),
            now(),
        )
        .unwrap();
        ClubCreationRequest {
            id: 9,
            club_name: new.club_name,
            description: new.description,
            submitted_at: new.submitted_at,
            status: new.status,
            coordinator_id: new.coordinator_id,
            officer_comment: None,
            reviewed_at: None,
            reviewed_by: None,
        }
    }

    #[test]
    fn submit_starts_pending_and_unreviewed() {
        let request = pending();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.submitted_at, now());
        assert_eq!(request.coordinator_id, COORDINATOR.user_id);
        assert!(request.reviewed_at.is_none());
        assert!(request.reviewed_by.is_none());
        assert!(request.officer_comment.is_none());
    }

    #[test]
    fn only_coordinators_submit() {
        for actor in [OFFICER, MEMBER] {
            let err = NewClubCreationRequest::submit(&actor, "Chess".into(), String::new(), now())
                .unwrap_err();
            assert!(matches!(err, ClubError::Validation(_)));
        }
    }

    #[test]
    fn blank_club_name_is_rejected() {
        let err = NewClubCreationRequest::submit(&COORDINATOR, "   ".into(), String::new(), now())
            .unwrap_err();
        assert!(matches!(err, ClubError::Validation(_)));
    }

    #[test]
    fn approval_stamps_review_fields() {
        let mut request = pending();
        let later = now() + Duration::hours(2);
        request.review(&OFFICER, Decision::Approve, later).unwrap();

        assert_eq!(request.status, RequestStatus::Approved);
        assert_eq!(request.reviewed_at, Some(later));
        assert_eq!(request.reviewed_by, Some(OFFICER.user_id));
        assert_eq!(request.submitted_at, now());
    }

    #[test]
    fn rejection_keeps_comment_verbatim() {
        let mut request = pending();
        request
            .review(
                &OFFICER,
                Decision::Reject {
                    comment: Some("insufficient members".into()),
                },
                now(),
            )
            .unwrap();

        assert_eq!(request.status, RequestStatus::Rejected);
        assert_eq!(request.officer_comment.as_deref(), Some("insufficient members"));
        assert_eq!(request.reviewed_by, Some(OFFICER.user_id));
    }

    #[test]
    fn non_officers_cannot_review() {
        for actor in [COORDINATOR, MEMBER] {
            let mut request = pending();
            let err = request.review(&actor, Decision::Approve, now()).unwrap_err();
            assert!(matches!(err, ClubError::Permission(_)));
            assert_eq!(request, pending());
        }
    }

    #[test]
    fn decided_requests_cannot_be_reviewed_again() {
        let decisions = || {
            [
                Decision::Approve,
                Decision::Reject { comment: None },
                Decision::Reject {
                    comment: Some("late".into()),
                },
            ]
        };

        for first in decisions() {
            for second in decisions() {
                let mut request = pending();
                request.review(&OFFICER, first.clone(), now()).unwrap();
                let decided = request.clone();

                let err = request
                    .review(&OFFICER, second, now() + Duration::minutes(5))
                    .unwrap_err();
                assert!(matches!(err, ClubError::Conflict(_)));
                assert_eq!(request, decided);
            }
        }
    }

    #[test]
    fn default_policy_activates_approved_clubs() {
        assert_eq!(
            WorkflowPolicy::default().approved_club_status,
            ClubStatus::Active
        );
    }
}
