use crate::{
    auth::Principal,
    club,
    error::{ensure, ClubError, ClubResult},
    models::{Club, ClubRole, Membership, MembershipStatus, Role},
    permissions,
    schema::*,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

impl ClubRole {
    /// Titles that administer a club.
    pub fn is_elevated(&self) -> bool {
        matches!(self, ClubRole::President | ClubRole::VicePresident)
    }
}

impl MembershipStatus {
    /// `rejected` is final; `active` can only be revoked.
    pub fn can_become(&self, next: MembershipStatus) -> bool {
        use MembershipStatus::*;
        matches!(
            (*self, next),
            (Pending, Active) | (Pending, Rejected) | (Active, Rejected)
        )
    }
}

impl Membership {
    pub fn is_admin(&self) -> bool {
        self.club_role.is_elevated()
    }

    pub fn transition(&mut self, next: MembershipStatus) -> ClubResult<()> {
        if !self.status.can_become(next) {
            return Err(ClubError::conflict(format!(
                "a {} membership cannot become {}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Owners may withdraw while pending or active. A rejected row is kept
    /// until the club's coordinator or an officer removes it, otherwise its
    /// owner could delete it and join again.
    pub fn check_removal(&self, actor: &Principal, club: &Club) -> ClubResult<()> {
        ensure(
            permissions::can_access_membership(actor, self, club),
            "this membership belongs to someone else",
        )?;
        if self.status == MembershipStatus::Rejected
            && !permissions::can_manage_membership(actor, self, club)
        {
            return Err(ClubError::conflict(
                "a rejected membership can only be removed by the club's coordinator or an officer",
            ));
        }
        Ok(())
    }

    pub fn assign_role(&mut self, role: ClubRole) -> ClubResult<()> {
        if self.status != MembershipStatus::Active {
            return Err(ClubError::conflict(format!(
                "club roles can only be given to active members, this membership is {}",
                self.status
            )));
        }
        self.club_role = role;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = memberships)]
pub struct NewMembership {
    pub user_id: i32,
    pub club_id: i32,
    pub joined_at: DateTime<Utc>,
    pub status: MembershipStatus,
    pub club_role: ClubRole,
}

impl NewMembership {
    pub fn join(user: &Principal, club_id: i32, now: DateTime<Utc>) -> ClubResult<Self> {
        if user.role != Role::Member {
            return Err(ClubError::validation("only members can join a club"));
        }
        Ok(NewMembership {
            user_id: user.user_id,
            club_id,
            joined_at: now,
            status: MembershipStatus::Pending,
            club_role: ClubRole::Member,
        })
    }
}

pub async fn join(
    conn: &mut AsyncPgConnection,
    user: &Principal,
    club_id: i32,
    now: DateTime<Utc>,
) -> ClubResult<Membership> {
    let new_membership = NewMembership::join(user, club_id, now)?;
    club::get(conn, club_id).await?;

    if find_for(conn, user.user_id, club_id).await?.is_some() {
        return Err(ClubError::conflict("already a member of this club"));
    }

    // the unique (user_id, club_id) index settles concurrent joins
    let membership = diesel::insert_into(memberships::table)
        .values(&new_membership)
        .get_result::<Membership>(conn)
        .await?;

    tracing::info!(
        membership_id = membership.id,
        user_id = user.user_id,
        club_id,
        "membership requested"
    );
    Ok(membership)
}

pub async fn set_status(
    conn: &mut AsyncPgConnection,
    membership_id: i32,
    status: MembershipStatus,
    actor: Principal,
) -> ClubResult<Membership> {
    let membership = conn
        .transaction::<_, ClubError, _>(move |conn| {
            Box::pin(async move {
                let (mut membership, club) = lock(conn, membership_id).await?;
                ensure(
                    permissions::can_manage_membership(&actor, &membership, &club),
                    "only the club's coordinator or an officer may change a membership",
                )?;
                membership.transition(status)?;

                Ok(diesel::update(memberships::table.find(membership_id))
                    .set(memberships::status.eq(membership.status))
                    .get_result::<Membership>(conn)
                    .await?)
            })
        })
        .await?;

    tracing::info!(
        membership_id,
        status = %membership.status,
        changed_by = actor.user_id,
        "membership status changed"
    );
    Ok(membership)
}

pub async fn set_role(
    conn: &mut AsyncPgConnection,
    membership_id: i32,
    role: ClubRole,
    actor: Principal,
) -> ClubResult<Membership> {
    let membership = conn
        .transaction::<_, ClubError, _>(move |conn| {
            Box::pin(async move {
                let (mut membership, club) = lock(conn, membership_id).await?;
                ensure(
                    permissions::can_manage_membership(&actor, &membership, &club),
                    "only the club's coordinator or an officer may change a membership",
                )?;
                membership.assign_role(role)?;

                Ok(diesel::update(memberships::table.find(membership_id))
                    .set(memberships::club_role.eq(membership.club_role))
                    .get_result::<Membership>(conn)
                    .await?)
            })
        })
        .await?;

    tracing::info!(
        membership_id,
        club_role = %membership.club_role,
        changed_by = actor.user_id,
        "membership role changed"
    );
    Ok(membership)
}

pub async fn get(
    conn: &mut AsyncPgConnection,
    membership_id: i32,
    actor: &Principal,
) -> ClubResult<Membership> {
    let (membership, club) = with_club(conn, membership_id).await?;
    ensure(
        permissions::can_access_membership(actor, &membership, &club),
        "this membership belongs to someone else",
    )?;
    Ok(membership)
}

pub async fn leave(
    conn: &mut AsyncPgConnection,
    membership_id: i32,
    actor: &Principal,
) -> ClubResult<()> {
    let (membership, club) = with_club(conn, membership_id).await?;
    membership.check_removal(actor, &club)?;

    diesel::delete(memberships::table.find(membership_id))
        .execute(conn)
        .await?;

    tracing::info!(
        membership_id,
        club_id = club.id,
        removed_by = actor.user_id,
        "membership removed"
    );
    Ok(())
}

/// Memberships of a club in the order they were requested.
pub async fn list_by_club(
    conn: &mut AsyncPgConnection,
    club_id: i32,
    actor: &Principal,
) -> ClubResult<Vec<Membership>> {
    let club = club::find(conn, club_id).await?;
    ensure(
        permissions::can_list_memberships(actor, club.as_ref()),
        "only the club's coordinator or an officer may list its members",
    )?;
    let club = club.ok_or_else(|| ClubError::not_found("the club does not exist"))?;

    Ok(Membership::belonging_to(&club)
        .order((memberships::joined_at.asc(), memberships::id.asc()))
        .load::<Membership>(conn)
        .await?)
}

/// A user's own membership row in a club.
pub async fn find_for(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    club_id: i32,
) -> ClubResult<Option<Membership>> {
    Ok(memberships::table
        .filter(memberships::user_id.eq(user_id))
        .filter(memberships::club_id.eq(club_id))
        .first::<Membership>(conn)
        .await
        .optional()?)
}

async fn with_club(
    conn: &mut AsyncPgConnection,
    membership_id: i32,
) -> ClubResult<(Membership, Club)> {
    memberships::table
        .inner_join(clubs::table)
        .filter(memberships::id.eq(membership_id))
        .first::<(Membership, Club)>(conn)
        .await
        .optional()?
        .ok_or_else(|| ClubError::not_found("membership does not exist"))
}

async fn lock(
    conn: &mut AsyncPgConnection,
    membership_id: i32,
) -> ClubResult<(Membership, Club)> {
    let membership = memberships::table
        .find(membership_id)
        .for_update()
        .first::<Membership>(conn)
        .await
        .optional()?
        .ok_or_else(|| ClubError::not_found("membership does not exist"))?;
    let club = club::get(conn, membership.club_id).await?;
    Ok((membership, club))
}
