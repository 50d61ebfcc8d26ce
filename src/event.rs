use crate::{
    auth::Principal,
    club, membership,
    error::{ensure, ClubError, ClubResult},
    models::{Club, Event, EventStatus, EventType},
    permissions,
    schema::*,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;

// `status` is stored independently and is never reconciled with these.
impl Event {
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_time > now
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end_time < now
    }
}

fn check_schedule(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> ClubResult<()> {
    if end_time < start_time {
        return Err(ClubError::validation("an event cannot end before it starts"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventFields {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub event_type: Option<EventType>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
struct NewEvent {
    club_id: i32,
    title: String,
    description: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    location: String,
    event_type: EventType,
    status: EventStatus,
    created_by: i32,
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = events)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
}

impl EventChanges {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.location.is_none()
            && self.event_type.is_none()
            && self.status.is_none()
    }
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    actor: &Principal,
    club_id: i32,
    fields: EventFields,
) -> ClubResult<Event> {
    let club = club::get(conn, club_id).await?;
    ensure(
        permissions::can_create_event(actor, &club),
        "only the club's coordinator may create its events",
    )?;
    if fields.title.trim().is_empty() {
        return Err(ClubError::validation("event title must not be empty"));
    }
    check_schedule(fields.start_time, fields.end_time)?;

    let event = diesel::insert_into(events::table)
        .values(NewEvent {
            club_id,
            title: fields.title,
            description: fields.description,
            start_time: fields.start_time,
            end_time: fields.end_time,
            location: fields.location,
            event_type: fields.event_type.unwrap_or(EventType::Public),
            status: EventStatus::Upcoming,
            created_by: actor.user_id,
        })
        .get_result::<Event>(conn)
        .await?;

    tracing::info!(event_id = event.id, club_id, "event created");
    Ok(event)
}

/// Private events the actor may not see are reported as missing.
pub async fn get(conn: &mut AsyncPgConnection, actor: &Principal, event_id: i32) -> ClubResult<Event> {
    let (event, club) = with_club(conn, event_id).await?;
    let viewer = membership::find_for(conn, actor.user_id, club.id).await?;

    if permissions::can_view_event(actor, &event, &club, viewer.as_ref()) {
        Ok(event)
    } else {
        Err(ClubError::not_found("event does not exist"))
    }
}

/// Newest first, without the private events the actor may not see.
pub async fn list_by_club(
    conn: &mut AsyncPgConnection,
    actor: &Principal,
    club_id: i32,
) -> ClubResult<Vec<Event>> {
    let club = club::get(conn, club_id).await?;
    let viewer = membership::find_for(conn, actor.user_id, club_id).await?;

    let events = Event::belonging_to(&club)
        .order((events::start_time.desc(), events::id.desc()))
        .load::<Event>(conn)
        .await?;

    Ok(events
        .into_iter()
        .filter(|event| permissions::can_view_event(actor, event, &club, viewer.as_ref()))
        .collect())
}

pub async fn update(
    conn: &mut AsyncPgConnection,
    actor: &Principal,
    event_id: i32,
    changes: EventChanges,
) -> ClubResult<Event> {
    let (event, club) = with_club(conn, event_id).await?;
    ensure(
        permissions::can_mutate_event(actor, &event, &club),
        "only the club's coordinator or an officer may change its events",
    )?;

    if changes.title.as_deref().map_or(false, |t| t.trim().is_empty()) {
        return Err(ClubError::validation("event title must not be empty"));
    }
    check_schedule(
        changes.start_time.unwrap_or(event.start_time),
        changes.end_time.unwrap_or(event.end_time),
    )?;
    if changes.is_empty() {
        return Ok(event);
    }

    Ok(diesel::update(events::table.find(event_id))
        .set(changes)
        .get_result::<Event>(conn)
        .await?)
}

pub async fn delete(conn: &mut AsyncPgConnection, actor: &Principal, event_id: i32) -> ClubResult<()> {
    let (event, club) = with_club(conn, event_id).await?;
    ensure(
        permissions::can_mutate_event(actor, &event, &club),
        "only the club's coordinator or an officer may delete its events",
    )?;

    diesel::delete(events::table.find(event_id))
        .execute(conn)
        .await?;

    tracing::info!(event_id, club_id = club.id, deleted_by = actor.user_id, "event deleted");
    Ok(())
}

async fn with_club(conn: &mut AsyncPgConnection, event_id: i32) -> ClubResult<(Event, Club)> {
    events::table
        .inner_join(clubs::table)
        .filter(events::id.eq(event_id))
        .first::<(Event, Club)>(conn)
        .await
        .optional()?
        .ok_or_else(|| ClubError::not_found("event does not exist"))
}
