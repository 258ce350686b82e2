//! # Gadget Model
//!
//! The gadget record and its status state machine.
//!
//! ## Invariants
//! - Once `destroyed`, a gadget's status never changes again
//! - `decommissioned_at` / `destroyed_at` are stamped the first time the
//!   gadget enters that status and are never cleared
//! - `success_probability` is fixed at creation

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{GadgetError, GadgetResult};
use crate::validation::FieldErrors;

/// Longest accepted gadget name
pub const MAX_NAME_LENGTH: usize = 100;

/// Gadget status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GadgetStatus {
    Available,
    Deployed,
    Destroyed,
    Decommissioned,
}

impl GadgetStatus {
    pub const ALL: [GadgetStatus; 4] = [
        GadgetStatus::Available,
        GadgetStatus::Deployed,
        GadgetStatus::Destroyed,
        GadgetStatus::Decommissioned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GadgetStatus::Available => "available",
            GadgetStatus::Deployed => "deployed",
            GadgetStatus::Destroyed => "destroyed",
            GadgetStatus::Decommissioned => "decommissioned",
        }
    }

    /// Whether a gadget may be created directly in this status
    pub fn is_creatable(&self) -> bool {
        !matches!(self, GadgetStatus::Decommissioned)
    }
}

impl fmt::Display for GadgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GadgetStatus {
    type Err = GadgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GadgetStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| GadgetError::InvalidStatus(s.to_string()))
    }
}

/// Gadget record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gadget {
    /// Unique gadget identifier
    pub id: Uuid,

    /// Codename, unique across every gadget ever created
    pub name: String,

    pub status: GadgetStatus,

    /// Percentage in [0, 100] with two decimals
    pub success_probability: f64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub decommissioned_at: Option<DateTime<Utc>>,

    pub destroyed_at: Option<DateTime<Utc>>,

    /// User who created the gadget
    pub created_by_id: Uuid,
}

impl Gadget {
    /// Create a new gadget record in the given status
    pub fn new(
        name: String,
        status: GadgetStatus,
        success_probability: f64,
        created_by_id: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        let mut gadget = Self {
            id: Uuid::new_v4(),
            name,
            status: GadgetStatus::Available,
            success_probability,
            created_at: now,
            updated_at: now,
            decommissioned_at: None,
            destroyed_at: None,
            created_by_id,
        };
        gadget.enter(status, now);
        gadget
    }

    /// Apply a validated patch.
    ///
    /// A destroyed gadget only accepts patches that explicitly keep it
    /// destroyed; an absent status counts as a change.
    pub fn apply_patch(&mut self, patch: &GadgetPatch, now: DateTime<Utc>) -> GadgetResult<()> {
        if self.status == GadgetStatus::Destroyed && patch.status != Some(GadgetStatus::Destroyed)
        {
            return Err(GadgetError::InvalidTransition {
                from: self.status,
                to: patch
                    .status
                    .map_or_else(|| "unchanged".to_string(), |s| s.to_string()),
            });
        }

        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(status) = patch.status {
            self.enter(status, now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Move to `decommissioned`
    pub fn decommission(&mut self, now: DateTime<Utc>) -> GadgetResult<()> {
        match self.status {
            GadgetStatus::Decommissioned => Err(GadgetError::AlreadyDecommissioned),
            GadgetStatus::Destroyed => Err(GadgetError::InvalidTransition {
                from: self.status,
                to: GadgetStatus::Decommissioned.to_string(),
            }),
            _ => {
                self.enter(GadgetStatus::Decommissioned, now);
                self.updated_at = now;
                Ok(())
            }
        }
    }

    /// Move to `destroyed`
    pub fn self_destruct(&mut self, now: DateTime<Utc>) -> GadgetResult<()> {
        if self.status == GadgetStatus::Destroyed {
            return Err(GadgetError::AlreadyDestroyed);
        }
        self.enter(GadgetStatus::Destroyed, now);
        self.updated_at = now;
        Ok(())
    }

    fn enter(&mut self, status: GadgetStatus, now: DateTime<Utc>) {
        self.status = status;
        match status {
            GadgetStatus::Decommissioned => {
                self.decommissioned_at.get_or_insert(now);
            }
            GadgetStatus::Destroyed => {
                self.destroyed_at.get_or_insert(now);
            }
            GadgetStatus::Available | GadgetStatus::Deployed => {}
        }
    }
}

/// Partial update of a gadget. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GadgetPatch {
    pub name: Option<String>,
    pub status: Option<GadgetStatus>,
}

impl GadgetPatch {
    pub fn validate(&self) -> GadgetResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            let trimmed = name.trim();
            errors.check(trimmed.is_empty(), "name", "Name cannot be empty");
            errors.check(
                trimmed.chars().count() > MAX_NAME_LENGTH,
                "name",
                "Name cannot exceed 100 characters",
            );
        }
        errors.finish().map_err(GadgetError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn gadget(status: GadgetStatus) -> Gadget {
        Gadget::new("The Kraken".to_string(), status, 42.5, Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_status_parsing() {
        for status in GadgetStatus::ALL {
            assert_eq!(status.as_str().parse::<GadgetStatus>().unwrap(), status);
        }
        assert!(matches!(
            "retired".parse::<GadgetStatus>(),
            Err(GadgetError::InvalidStatus(s)) if s == "retired"
        ));
        // Parsing is exact
        assert!("Available".parse::<GadgetStatus>().is_err());
    }

    #[test]
    fn test_creating_destroyed_gadget_stamps_destroyed_at() {
        let g = gadget(GadgetStatus::Destroyed);
        assert_eq!(g.destroyed_at, Some(g.created_at));
        assert!(g.decommissioned_at.is_none());
    }

    #[test]
    fn test_destroyed_gadget_rejects_other_statuses() {
        for status in [
            GadgetStatus::Available,
            GadgetStatus::Deployed,
            GadgetStatus::Decommissioned,
        ] {
            let mut g = gadget(GadgetStatus::Destroyed);
            let patch = GadgetPatch {
                name: None,
                status: Some(status),
            };
            assert!(matches!(
                g.apply_patch(&patch, Utc::now()),
                Err(GadgetError::InvalidTransition { .. })
            ));
            assert_eq!(g.status, GadgetStatus::Destroyed);
        }
    }

    #[test]
    fn test_destroyed_gadget_rejects_name_only_patch() {
        let mut g = gadget(GadgetStatus::Destroyed);
        let patch = GadgetPatch {
            name: Some("Nova Wolf".to_string()),
            status: None,
        };
        assert!(g.apply_patch(&patch, Utc::now()).is_err());
        assert_eq!(g.name, "The Kraken");
    }

    #[test]
    fn test_destroyed_gadget_accepts_rename_that_keeps_it_destroyed() {
        let mut g = gadget(GadgetStatus::Destroyed);
        let stamped = g.destroyed_at;
        let patch = GadgetPatch {
            name: Some("  Nova Wolf ".to_string()),
            status: Some(GadgetStatus::Destroyed),
        };
        g.apply_patch(&patch, Utc::now() + Duration::seconds(5)).unwrap();
        assert_eq!(g.name, "Nova Wolf");
        assert_eq!(g.destroyed_at, stamped);
    }

    #[test]
    fn test_patch_leaves_absent_fields_unchanged() {
        let mut g = gadget(GadgetStatus::Available);
        let patch = GadgetPatch {
            name: None,
            status: Some(GadgetStatus::Deployed),
        };
        g.apply_patch(&patch, Utc::now()).unwrap();
        assert_eq!(g.name, "The Kraken");
        assert_eq!(g.status, GadgetStatus::Deployed);
    }

    #[test]
    fn test_decommission_stamps_once() {
        let mut g = gadget(GadgetStatus::Deployed);
        let first = Utc::now();
        g.decommission(first).unwrap();
        assert_eq!(g.decommissioned_at, Some(first));

        let err = g.decommission(first + Duration::hours(1)).unwrap_err();
        assert!(matches!(err, GadgetError::AlreadyDecommissioned));
        assert_eq!(g.decommissioned_at, Some(first));
    }

    #[test]
    fn test_reentering_decommissioned_keeps_first_stamp() {
        let mut g = gadget(GadgetStatus::Available);
        let first = Utc::now();
        g.decommission(first).unwrap();

        let reactivate = GadgetPatch {
            name: None,
            status: Some(GadgetStatus::Available),
        };
        g.apply_patch(&reactivate, first + Duration::minutes(1)).unwrap();
        assert_eq!(g.decommissioned_at, Some(first));

        g.decommission(first + Duration::minutes(2)).unwrap();
        assert_eq!(g.decommissioned_at, Some(first));
    }

    #[test]
    fn test_destroyed_gadget_cannot_be_decommissioned() {
        let mut g = gadget(GadgetStatus::Available);
        g.self_destruct(Utc::now()).unwrap();
        assert!(matches!(
            g.decommission(Utc::now()),
            Err(GadgetError::InvalidTransition { .. })
        ));
        assert!(g.decommissioned_at.is_none());
    }

    #[test]
    fn test_self_destruct_twice() {
        let mut g = gadget(GadgetStatus::Decommissioned);
        g.self_destruct(Utc::now()).unwrap();
        assert!(g.destroyed_at.is_some());
        assert!(matches!(
            g.self_destruct(Utc::now()),
            Err(GadgetError::AlreadyDestroyed)
        ));
    }

    #[test]
    fn test_patch_validation() {
        let blank = GadgetPatch {
            name: Some("   ".to_string()),
            status: None,
        };
        assert!(matches!(blank.validate(), Err(GadgetError::Validation(e)) if e[0].field == "name"));

        let long = GadgetPatch {
            name: Some("x".repeat(MAX_NAME_LENGTH + 1)),
            status: None,
        };
        assert!(long.validate().is_err());

        assert!(GadgetPatch::default().validate().is_ok());
    }

    #[test]
    fn test_gadget_serializes_camel_case() {
        let g = gadget(GadgetStatus::Deployed);
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["status"], "deployed");
        assert_eq!(json["successProbability"], 42.5);
        assert!(json["decommissionedAt"].is_null());
        assert!(json.get("createdById").is_some());
    }
}
