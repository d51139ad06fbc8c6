//! Named profile registry.
//!
//! Profiles are keyed `<ROLE>_<GRANULARITY>_<entityName>` so any consumer can
//! reconstruct the key from an entity and a role without holding a reference
//! to whoever built the series.

use std::collections::HashMap;

use hp_core::Real;

use crate::profile::{DailyProfile, MonthlyProfile, MONTHS};
use crate::{ProfilesError, ProfilesResult};

/// What a profile bounds on its entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProfileRole {
    MinVolume,
    MaxVolume,
    MinFlow,
    MaxFlow,
    Demand,
    Inflow,
    ReturnFlow,
    Recharge,
}

impl ProfileRole {
    pub const ALL: [ProfileRole; 8] = [
        ProfileRole::MinVolume,
        ProfileRole::MaxVolume,
        ProfileRole::MinFlow,
        ProfileRole::MaxFlow,
        ProfileRole::Demand,
        ProfileRole::Inflow,
        ProfileRole::ReturnFlow,
        ProfileRole::Recharge,
    ];

    fn tag(self) -> &'static str {
        match self {
            ProfileRole::MinVolume => "VOL_MIN",
            ProfileRole::MaxVolume => "VOL_MAX",
            ProfileRole::MinFlow => "Q_MIN",
            ProfileRole::MaxFlow => "Q_MAX",
            ProfileRole::Demand => "DEMAND",
            ProfileRole::Inflow => "INFLOW",
            ProfileRole::ReturnFlow => "RETURN",
            ProfileRole::Recharge => "RECHARGE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    Monthly,
    Daily,
}

impl Granularity {
    pub const ALL: [Granularity; 2] = [Granularity::Monthly, Granularity::Daily];

    fn tag(self) -> &'static str {
        match self {
            Granularity::Monthly => "MONTHLY",
            Granularity::Daily => "DAILY",
        }
    }
}

/// Deterministic profile key for an entity/role/granularity triple.
pub fn profile_name(role: ProfileRole, granularity: Granularity, entity: &str) -> String {
    format!("{}_{}_{}", role.tag(), granularity.tag(), entity)
}

#[derive(Clone, Debug)]
pub enum Profile {
    Monthly(MonthlyProfile),
    Daily(DailyProfile),
}

impl Profile {
    /// Value at a 0-based slot: month index for monthly profiles, day-of-year
    /// index for daily ones.
    pub fn value(&self, slot: usize) -> Option<Real> {
        match self {
            Profile::Monthly(p) => p.value(slot),
            Profile::Daily(p) => p.value(slot),
        }
    }
}

/// Registry of every profile built for a run.
#[derive(Clone, Debug, Default)]
pub struct ProfileStore {
    profiles: HashMap<String, Profile>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a monthly profile from a raw source series and return its key.
    ///
    /// A missing or blank source is replaced with 12 zeros (optional series
    /// such as aquifer recharge are routinely absent from surveys); a series
    /// of the wrong length or with non-finite entries is an error.
    pub fn insert_monthly(
        &mut self,
        role: ProfileRole,
        entity: &str,
        source: Option<&[Real]>,
    ) -> ProfilesResult<String> {
        let name = profile_name(role, Granularity::Monthly, entity);
        let monthly = match source {
            None => {
                tracing::warn!(profile = %name, "blank monthly source, substituting zeros");
                MonthlyProfile::zeros()
            }
            Some(values) => {
                if values.len() != MONTHS {
                    return Err(ProfilesError::InvalidLength {
                        name,
                        expected: MONTHS,
                        got: values.len(),
                    });
                }
                if let Some(slot) = values.iter().position(|v| !v.is_finite()) {
                    return Err(ProfilesError::NonFinite { name, slot });
                }
                let mut arr = [0.0; MONTHS];
                arr.copy_from_slice(values);
                MonthlyProfile::new(arr)
            }
        };
        self.profiles.insert(name.clone(), Profile::Monthly(monthly));
        Ok(name)
    }

    /// Register the daily expansion of an already-registered monthly profile
    /// and return the daily key.
    pub fn expand_to_daily(&mut self, role: ProfileRole, entity: &str) -> ProfilesResult<String> {
        let monthly_name = profile_name(role, Granularity::Monthly, entity);
        let monthly = match self.profiles.get(&monthly_name) {
            Some(Profile::Monthly(p)) => p.clone(),
            _ => return Err(ProfilesError::NotFound { name: monthly_name }),
        };
        let name = profile_name(role, Granularity::Daily, entity);
        self.profiles
            .insert(name.clone(), Profile::Daily(monthly.expand_daily()));
        Ok(name)
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn monthly(&self, role: ProfileRole, entity: &str) -> Option<&MonthlyProfile> {
        match self.profiles.get(&profile_name(role, Granularity::Monthly, entity)) {
            Some(Profile::Monthly(p)) => Some(p),
            _ => None,
        }
    }

    pub fn daily(&self, role: ProfileRole, entity: &str) -> Option<&DailyProfile> {
        match self.profiles.get(&profile_name(role, Granularity::Daily, entity)) {
            Some(Profile::Daily(p)) => Some(p),
            _ => None,
        }
    }

    /// Drop every profile attached to an entity. Used when the exception
    /// resolver removes a node from the network.
    ///
    /// Matches by reconstructing the exact key for every role/granularity
    /// pair, never by string suffix: entity names may be suffixes of one
    /// another (`"11"` and `"canal_11"`).
    pub fn remove_entity(&mut self, entity: &str) -> usize {
        let mut removed = 0;
        for role in ProfileRole::ALL {
            for granularity in Granularity::ALL {
                let key = profile_name(role, granularity, entity);
                if self.profiles.remove(&key).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
