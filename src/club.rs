use crate::{
    auth::Principal,
    error::{ensure, ClubError, ClubResult},
    models::{Club, ClubCreationRequest, ClubStatus, Membership, MembershipStatus, Role, User},
    permissions,
    schema::*,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = clubs)]
pub struct NewClub {
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: ClubStatus,
    pub coordinator_id: Option<i32>,
    pub creation_request_id: Option<i32>,
}

impl NewClub {
    /// The club produced by an approved request, owned by the request's
    /// coordinator and linked back to it.
    pub fn from_approved(
        request: &ClubCreationRequest,
        status: ClubStatus,
        now: DateTime<Utc>,
    ) -> NewClub {
        NewClub {
            name: request.club_name.clone(),
            description: request.description.clone(),
            created_at: now,
            status,
            coordinator_id: Some(request.coordinator_id),
            creation_request_id: Some(request.id),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClubFields {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub coordinator: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = clubs)]
pub struct ClubChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ClubStatus>,
}

impl ClubChanges {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none()
    }

    /// Coordinators edit their club's name and description; only officers
    /// move its status.
    pub fn check(&self, actor: &Principal, club: &Club) -> ClubResult<()> {
        ensure(
            permissions::can_mutate_club(actor, club),
            "only the club's coordinator or an officer may change it",
        )?;
        if self.status.is_some() {
            ensure(
                permissions::can_change_club_status(actor),
                "only an officer may change a club's status",
            )?;
        }
        if self.name.as_deref().map_or(false, |n| n.trim().is_empty()) {
            return Err(ClubError::validation("club name must not be empty"));
        }
        Ok(())
    }
}

/// Number of memberships counted as members of a club.
pub fn active_member_count(memberships: &[Membership]) -> usize {
    memberships
        .iter()
        .filter(|m| m.status == MembershipStatus::Active)
        .count()
}

pub async fn list(conn: &mut AsyncPgConnection) -> ClubResult<Vec<Club>> {
    Ok(clubs::table
        .order((clubs::name.asc(), clubs::id.asc()))
        .load::<Club>(conn)
        .await?)
}

pub async fn find(conn: &mut AsyncPgConnection, club_id: i32) -> ClubResult<Option<Club>> {
    Ok(clubs::table
        .find(club_id)
        .first::<Club>(conn)
        .await
        .optional()?)
}

pub async fn get(conn: &mut AsyncPgConnection, club_id: i32) -> ClubResult<Club> {
    find(conn, club_id)
        .await?
        .ok_or_else(|| ClubError::not_found("the club does not exist"))
}

pub async fn find_by_coordinator(
    conn: &mut AsyncPgConnection,
    coordinator_id: i32,
) -> ClubResult<Option<Club>> {
    Ok(clubs::table
        .filter(clubs::coordinator_id.eq(coordinator_id))
        .first::<Club>(conn)
        .await
        .optional()?)
}

/// Coordinators create the club they will run and it waits for validation;
/// officers may name any coordinator (or none) and the club starts active.
pub async fn create(
    conn: &mut AsyncPgConnection,
    actor: &Principal,
    fields: ClubFields,
    now: DateTime<Utc>,
) -> ClubResult<Club> {
    ensure(
        permissions::can_create_club(actor),
        "only coordinators and officers may create clubs",
    )?;

    let name = fields.name.trim().to_string();
    if name.is_empty() {
        return Err(ClubError::validation("club name must not be empty"));
    }

    let (coordinator_id, status) = if permissions::is_officer(actor) {
        if let Some(coordinator_id) = fields.coordinator {
            let coordinator = users::table
                .find(coordinator_id)
                .first::<User>(conn)
                .await
                .optional()?
                .ok_or_else(|| ClubError::not_found("the coordinator does not exist"))?;
            if coordinator.role != Role::Coordinator {
                return Err(ClubError::validation(
                    "a club coordinator must have the coordinator role",
                ));
            }
        }
        (fields.coordinator, ClubStatus::Active)
    } else {
        if fields.coordinator.map_or(false, |id| id != actor.user_id) {
            return Err(ClubError::validation(
                "coordinators can only create a club they coordinate",
            ));
        }
        (Some(actor.user_id), ClubStatus::Pending)
    };

    if let Some(coordinator_id) = coordinator_id {
        if find_by_coordinator(conn, coordinator_id).await?.is_some() {
            return Err(ClubError::conflict("the coordinator already manages a club"));
        }
    }

    let club = diesel::insert_into(clubs::table)
        .values(NewClub {
            name,
            description: fields.description,
            created_at: now,
            status,
            coordinator_id,
            creation_request_id: None,
        })
        .get_result::<Club>(conn)
        .await?;

    tracing::info!(club_id = club.id, created_by = actor.user_id, "club created");
    Ok(club)
}

pub async fn update(
    conn: &mut AsyncPgConnection,
    actor: &Principal,
    club_id: i32,
    changes: ClubChanges,
) -> ClubResult<Club> {
    let club = get(conn, club_id).await?;
    changes.check(actor, &club)?;
    if changes.is_empty() {
        return Ok(club);
    }

    Ok(diesel::update(clubs::table.find(club_id))
        .set(changes)
        .get_result::<Club>(conn)
        .await?)
}

/// Memberships and events go with the club.
pub async fn delete(conn: &mut AsyncPgConnection, actor: &Principal, club_id: i32) -> ClubResult<()> {
    let club = get(conn, club_id).await?;
    ensure(
        permissions::can_mutate_club(actor, &club),
        "only the club's coordinator or an officer may delete it",
    )?;

    diesel::delete(clubs::table.find(club_id))
        .execute(conn)
        .await?;

    tracing::info!(club_id, deleted_by = actor.user_id, "club deleted");
    Ok(())
}

/// Clubs paired with their active member counts.
pub async fn with_member_counts(
    conn: &mut AsyncPgConnection,
    clubs: Vec<Club>,
) -> ClubResult<Vec<(Club, usize)>> {
    let memberships = Membership::belonging_to(&clubs)
        .load::<Membership>(conn)
        .await?
        .grouped_by(&clubs);

    Ok(clubs
        .into_iter()
        .zip(memberships)
        .map(|(club, memberships)| {
            let count = active_member_count(&memberships);
            (club, count)
        })
        .collect())
}

/// Users of every membership of the club, whatever its status, oldest first.
pub async fn members(conn: &mut AsyncPgConnection, club_id: i32) -> ClubResult<Vec<User>> {
    get(conn, club_id).await?;

    Ok(memberships::table
        .inner_join(users::table)
        .filter(memberships::club_id.eq(club_id))
        .order((memberships::joined_at.asc(), memberships::id.asc()))
        .select(users::all_columns)
        .load::<User>(conn)
        .await?)
}

pub async fn coordinator(conn: &mut AsyncPgConnection, club_id: i32) -> ClubResult<User> {
    let club = get(conn, club_id).await?;
    let coordinator_id = club
        .coordinator_id
        .ok_or_else(|| ClubError::not_found("the club has no coordinator"))?;

    users::table
        .find(coordinator_id)
        .first::<User>(conn)
        .await
        .optional()?
        .ok_or_else(|| ClubError::not_found("the club has no coordinator"))
}
