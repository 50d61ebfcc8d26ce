use crate::{models::ClubStatus, workflow::WorkflowPolicy};
use envconfig::Envconfig;
use std::time::Duration;

#[derive(Envconfig)]
pub struct Config {
    #[envconfig(from = "DATABASE_URL")]
    pub db_url: String,
    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,
    /// base64 encoded
    #[envconfig(from = "JWT_SECRET")]
    pub jwt_secret: String,
    #[envconfig(from = "TOKEN_TTL_HOURS", default = "24")]
    pub token_ttl_hours: u64,
    /// `active` or `pending`
    #[envconfig(from = "APPROVED_CLUB_STATUS", default = "active")]
    pub approved_club_status: ClubStatus,
}

impl Config {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours * 60 * 60)
    }

    pub fn workflow_policy(&self) -> anyhow::Result<WorkflowPolicy> {
        match self.approved_club_status {
            ClubStatus::Active | ClubStatus::Pending => Ok(WorkflowPolicy {
                approved_club_status: self.approved_club_status,
            }),
            ClubStatus::Archived => {
                anyhow::bail!("APPROVED_CLUB_STATUS must be `active` or `pending`")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::init_from_hashmap(&env(&[
            ("DATABASE_URL", "postgres://localhost/club_hub"),
            ("JWT_SECRET", "c2VjcmV0"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.token_ttl(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(
            config.workflow_policy().unwrap(),
            WorkflowPolicy::default()
        );
    }

    #[test]
    fn approved_clubs_can_wait_for_validation() {
        let config = Config::init_from_hashmap(&env(&[
            ("DATABASE_URL", "postgres://localhost/club_hub"),
            ("JWT_SECRET", "c2VjcmV0"),
            ("APPROVED_CLUB_STATUS", "pending"),
        ]))
        .unwrap();

        assert_eq!(
            config.workflow_policy().unwrap().approved_club_status,
            ClubStatus::Pending
        );
    }

    #[test]
    fn archived_is_not_a_valid_approval_status() {
        let config = Config::init_from_hashmap(&env(&[
            ("DATABASE_URL", "postgres://localhost/club_hub"),
            ("JWT_SECRET", "c2VjcmV0"),
            ("APPROVED_CLUB_STATUS", "archived"),
        ]))
        .unwrap();

        assert!(config.workflow_policy().is_err());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = Config::init_from_hashmap(&env(&[(
            "DATABASE_URL",
            "postgres://localhost/club_hub",
        )]));
        assert!(result.is_err());
    }
}
