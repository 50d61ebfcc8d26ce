use crate::schema::*;
use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
    sql_types::Text,
};
use serde::{Deserialize, Serialize};
use std::{fmt, io::Write, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed set of tags stored as snake_case text, both in
/// postgres and on the wire.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow, Serialize, Deserialize)]
        #[diesel(sql_type = Text)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                Ok(std::str::from_utf8(bytes.as_bytes())?.parse()?)
            }
        }
    };
}

text_enum! {
    /// Platform-wide role, fixed per user.
    Role ("role") {
        Member => "member",
        Coordinator => "coordinator",
        StudentLifeOfficer => "student_life_officer",
    }
}

text_enum! {
    RequestStatus ("request status") {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

text_enum! {
    ClubStatus ("club status") {
        Pending => "pending",
        Active => "active",
        Archived => "archived",
    }
}

text_enum! {
    MembershipStatus ("membership status") {
        Pending => "pending",
        Active => "active",
        Rejected => "rejected",
    }
}

text_enum! {
    /// Title held inside one club. Unrelated to the platform [`Role`].
    ClubRole ("club role") {
        Member => "member",
        President => "president",
        Treasurer => "treasurer",
        Secretary => "secretary",
        VicePresident => "vice_president",
        CommunicationManager => "communication_manager",
        MediaManager => "media_manager",
        HrManager => "hr_manager",
        SponsorManager => "sponsor_manager",
        Designer => "designer",
    }
}

text_enum! {
    EventType ("event type") {
        Public => "public",
        Private => "private",
    }
}

text_enum! {
    EventStatus ("event status") {
        Upcoming => "upcoming",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub profile_picture_url: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = club_creation_requests)]
pub struct ClubCreationRequest {
    pub id: i32,
    pub club_name: String,
    pub description: String,
    pub submitted_at: DateTime<Utc>,
    pub status: RequestStatus,
    #[serde(rename = "coordinator")]
    pub coordinator_id: i32,
    pub officer_comment: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = clubs)]
pub struct Club {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: ClubStatus,
    #[serde(rename = "coordinator")]
    pub coordinator_id: Option<i32>,
    #[serde(rename = "creation_request")]
    pub creation_request_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Club))]
#[diesel(table_name = memberships)]
pub struct Membership {
    pub id: i32,
    #[serde(rename = "user")]
    pub user_id: i32,
    #[serde(rename = "club")]
    pub club_id: i32,
    pub joined_at: DateTime<Utc>,
    pub status: MembershipStatus,
    pub club_role: ClubRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(Club))]
#[diesel(table_name = events)]
pub struct Event {
    pub id: i32,
    #[serde(rename = "club")]
    pub club_id: i32,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    pub event_type: EventType,
    pub status: EventStatus,
    pub created_by: i32,
}
