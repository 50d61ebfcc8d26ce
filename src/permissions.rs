//! Access decisions for clubs and the resources nested under them.
//!
//! Every function here is a pure predicate over the caller and resources that
//! were already loaded. A `false` is a denial; callers turn it into a
//! [`ClubError::Permission`](crate::error::ClubError) with [`ensure`](crate::error::ensure).

use crate::{
    auth::Principal,
    models::{Club, ClubCreationRequest, Event, EventType, Membership, MembershipStatus, Role},
};

/// Resources that belong to exactly one club.
pub trait ClubScoped {
    fn club_id(&self) -> i32;
}

impl ClubScoped for Membership {
    fn club_id(&self) -> i32 {
        self.club_id
    }
}

impl ClubScoped for Event {
    fn club_id(&self) -> i32 {
        self.club_id
    }
}

pub fn is_officer(user: &Principal) -> bool {
    user.role == Role::StudentLifeOfficer
}

pub fn is_coordinator(user: &Principal) -> bool {
    user.role == Role::Coordinator
}

/// `club` is `None` when the id from the request did not resolve; that is a
/// denial here, and the caller reports the missing club separately.
pub fn is_club_coordinator(user: &Principal, club: Option<&Club>) -> bool {
    club.map_or(false, |club| club.coordinator_id == Some(user.user_id))
}

pub fn is_membership_owner(user: &Principal, membership: &Membership) -> bool {
    membership.user_id == user.user_id
}

/// `club` must be the club `obj` points at; a mismatched pair is denied.
pub fn is_club_coordinator_for_object<T: ClubScoped>(
    user: &Principal,
    obj: &T,
    club: &Club,
) -> bool {
    obj.club_id() == club.id && is_club_coordinator(user, Some(club))
}

// Composite policies.

pub fn can_create_club(user: &Principal) -> bool {
    is_coordinator(user) || is_officer(user)
}

pub fn can_mutate_club(user: &Principal, club: &Club) -> bool {
    is_club_coordinator(user, Some(club)) || is_officer(user)
}

/// Status moves a club through validation, so it is not the coordinator's call.
pub fn can_change_club_status(user: &Principal) -> bool {
    is_officer(user)
}

pub fn can_submit_request(user: &Principal) -> bool {
    is_coordinator(user)
}

pub fn can_review_request(user: &Principal) -> bool {
    is_officer(user)
}

pub fn can_view_request(user: &Principal, request: &ClubCreationRequest) -> bool {
    is_officer(user) || request.coordinator_id == user.user_id
}

/// Reading, updating or leaving one membership row.
pub fn can_access_membership(user: &Principal, membership: &Membership, club: &Club) -> bool {
    is_membership_owner(user, membership)
        || is_club_coordinator_for_object(user, membership, club)
        || is_officer(user)
}

/// Changing a membership's status or club role.
pub fn can_manage_membership(user: &Principal, membership: &Membership, club: &Club) -> bool {
    is_club_coordinator_for_object(user, membership, club) || is_officer(user)
}

pub fn can_list_memberships(user: &Principal, club: Option<&Club>) -> bool {
    is_club_coordinator(user, club) || is_officer(user)
}

pub fn can_create_event(user: &Principal, club: &Club) -> bool {
    is_club_coordinator(user, Some(club))
}

pub fn can_mutate_event(user: &Principal, event: &Event, club: &Club) -> bool {
    is_club_coordinator_for_object(user, event, club) || is_officer(user)
}

/// Private events are limited to officers, the club's coordinator and
/// active members of that club. `membership` is the viewer's own row for the
/// event's club, if any.
pub fn can_view_event(
    user: &Principal,
    event: &Event,
    club: &Club,
    membership: Option<&Membership>,
) -> bool {
    match event.event_type {
        EventType::Public => true,
        EventType::Private => {
            is_officer(user)
                || is_club_coordinator_for_object(user, event, club)
                || membership.map_or(false, |m| {
                    m.club_id == event.club_id
                        && is_membership_owner(user, m)
                        && m.status == MembershipStatus::Active
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClubRole, ClubStatus, EventStatus, RequestStatus};
    use chrono::{TimeZone, Utc};

    const OFFICER: Principal = Principal {
        user_id: 1,
        role: Role::StudentLifeOfficer,
    };
    const COORDINATOR: Principal = Principal {
        user_id: 2,
        role: Role::Coordinator,
    };
    const OTHER_COORDINATOR: Principal = Principal {
        user_id: 3,
        role: Role::Coordinator,
    };
    const MEMBER: Principal = Principal {
        user_id: 4,
        role: Role::Member,
    };
    const OTHER_MEMBER: Principal = Principal {
        user_id: 5,
        role: Role::Member,
    };

    fn club(id: i32, coordinator_id: Option<i32>) -> Club {
        Club {
            id,
            name: "Chess Club".into(),
            description: String::new(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            status: ClubStatus::Active,
            coordinator_id,
            creation_request_id: None,
        }
    }

    fn membership(user_id: i32, club_id: i32, status: MembershipStatus) -> Membership {
        Membership {
            id: 10,
            user_id,
            club_id,
            joined_at: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
            status,
            club_role: ClubRole::Member,
        }
    }

    fn event(club_id: i32, event_type: EventType) -> Event {
        Event {
            id: 20,
            club_id,
            title: "Blitz night".into(),
            description: String::new(),
            start_time: Utc.with_ymd_and_hms(2025, 2, 1, 18, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 2, 1, 21, 0, 0).unwrap(),
            location: "Room 101".into(),
            event_type,
            status: EventStatus::Upcoming,
            created_by: COORDINATOR.user_id,
        }
    }

    #[test]
    fn officer_is_only_the_officer_role() {
        assert!(is_officer(&OFFICER));
        assert!(!is_officer(&COORDINATOR));
        assert!(!is_officer(&MEMBER));
    }

    #[test]
    fn missing_club_denies_instead_of_failing() {
        assert!(!is_club_coordinator(&COORDINATOR, None));
        assert!(!can_list_memberships(&COORDINATOR, None));
        assert!(can_list_memberships(&OFFICER, None));
    }

    #[test]
    fn coordinator_check_compares_ids() {
        let club = club(7, Some(COORDINATOR.user_id));
        assert!(is_club_coordinator(&COORDINATOR, Some(&club)));
        assert!(!is_club_coordinator(&OTHER_COORDINATOR, Some(&club)));
        assert!(!is_club_coordinator(&COORDINATOR, Some(&self::club(7, None))));
    }

    #[test]
    fn object_check_requires_the_objects_own_club() {
        let club = club(7, Some(COORDINATOR.user_id));
        let inside = membership(MEMBER.user_id, 7, MembershipStatus::Active);
        let elsewhere = membership(MEMBER.user_id, 8, MembershipStatus::Active);
        assert!(is_club_coordinator_for_object(&COORDINATOR, &inside, &club));
        assert!(!is_club_coordinator_for_object(&COORDINATOR, &elsewhere, &club));
        assert!(!is_club_coordinator_for_object(&OTHER_COORDINATOR, &inside, &club));
    }

    #[test]
    fn club_mutation_policy() {
        let club = club(7, Some(COORDINATOR.user_id));
        assert!(can_mutate_club(&COORDINATOR, &club));
        assert!(can_mutate_club(&OFFICER, &club));
        assert!(!can_mutate_club(&OTHER_COORDINATOR, &club));
        assert!(!can_mutate_club(&MEMBER, &club));
        assert!(can_create_club(&COORDINATOR));
        assert!(can_create_club(&OFFICER));
        assert!(!can_create_club(&MEMBER));
    }

    #[test]
    fn only_officers_change_club_status() {
        assert!(can_change_club_status(&OFFICER));
        assert!(!can_change_club_status(&COORDINATOR));
        assert!(!can_change_club_status(&MEMBER));
    }

    #[test]
    fn membership_row_policy() {
        let club = club(7, Some(COORDINATOR.user_id));
        let row = membership(MEMBER.user_id, 7, MembershipStatus::Pending);

        assert!(can_access_membership(&MEMBER, &row, &club));
        assert!(can_access_membership(&COORDINATOR, &row, &club));
        assert!(can_access_membership(&OFFICER, &row, &club));
        assert!(!can_access_membership(&OTHER_MEMBER, &row, &club));
        assert!(!can_access_membership(&OTHER_COORDINATOR, &row, &club));

        assert!(!can_manage_membership(&MEMBER, &row, &club));
        assert!(can_manage_membership(&COORDINATOR, &row, &club));
        assert!(can_manage_membership(&OFFICER, &row, &club));
    }

    #[test]
    fn membership_list_policy() {
        let club = club(7, Some(COORDINATOR.user_id));
        assert!(can_list_memberships(&COORDINATOR, Some(&club)));
        assert!(can_list_memberships(&OFFICER, Some(&club)));
        assert!(!can_list_memberships(&OTHER_COORDINATOR, Some(&club)));
        assert!(!can_list_memberships(&MEMBER, Some(&club)));
    }

    #[test]
    fn request_policies() {
        let request = ClubCreationRequest {
            id: 1,
            club_name: "Chess Club".into(),
            description: String::new(),
            submitted_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            status: RequestStatus::Pending,
            coordinator_id: COORDINATOR.user_id,
            officer_comment: None,
            reviewed_at: None,
            reviewed_by: None,
        };
        assert!(can_submit_request(&COORDINATOR));
        assert!(!can_submit_request(&OFFICER));
        assert!(!can_submit_request(&MEMBER));
        assert!(can_review_request(&OFFICER));
        assert!(!can_review_request(&COORDINATOR));
        assert!(can_view_request(&COORDINATOR, &request));
        assert!(can_view_request(&OFFICER, &request));
        assert!(!can_view_request(&OTHER_COORDINATOR, &request));
    }

    #[test]
    fn event_mutation_policy() {
        let club = club(7, Some(COORDINATOR.user_id));
        let event = event(7, EventType::Public);
        assert!(can_create_event(&COORDINATOR, &club));
        assert!(!can_create_event(&OFFICER, &club));
        assert!(can_mutate_event(&COORDINATOR, &event, &club));
        assert!(can_mutate_event(&OFFICER, &event, &club));
        assert!(!can_mutate_event(&OTHER_COORDINATOR, &event, &club));
        assert!(!can_mutate_event(&MEMBER, &event, &club));
    }

    #[test]
    fn public_events_are_visible_to_everyone() {
        let club = club(7, Some(COORDINATOR.user_id));
        let event = event(7, EventType::Public);
        assert!(can_view_event(&OTHER_MEMBER, &event, &club, None));
    }

    #[test]
    fn private_events_need_an_active_membership() {
        let club = club(7, Some(COORDINATOR.user_id));
        let event = event(7, EventType::Private);
        let active = membership(MEMBER.user_id, 7, MembershipStatus::Active);
        let pending = membership(MEMBER.user_id, 7, MembershipStatus::Pending);
        let other_club = membership(MEMBER.user_id, 8, MembershipStatus::Active);

        assert!(can_view_event(&MEMBER, &event, &club, Some(&active)));
        assert!(!can_view_event(&MEMBER, &event, &club, Some(&pending)));
        assert!(!can_view_event(&MEMBER, &event, &club, Some(&other_club)));
        assert!(!can_view_event(&MEMBER, &event, &club, None));
        assert!(!can_view_event(&OTHER_MEMBER, &event, &club, Some(&active)));
        assert!(can_view_event(&COORDINATOR, &event, &club, None));
        assert!(can_view_event(&OFFICER, &event, &club, None));
        assert!(!can_view_event(&OTHER_COORDINATOR, &event, &club, None));
    }
}
