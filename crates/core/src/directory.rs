//! Directory collaborators: who the donors and hospitals are, and where.
//!
//! The core consumes these through the [`DonorDirectory`], [`DonorRegistry`] and
//! [`HospitalDirectory`] traits. [`InMemoryDirectory`] is the reference implementation used by
//! the binaries (loaded from a fixture) and by tests.

use crate::distance::distance_km;
use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hemo_types::{BloodType, Coordinate};
use hemo_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Platform role of a directory entry. Only donors are returned by donor queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Donor,
    Hospital,
    Receiver,
    Admin,
}

/// A donor as seen by matching and aggregation. Read-only to the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DonorCandidate {
    pub id: RecordId,
    pub name: String,
    pub blood_type: BloodType,
    pub location: Coordinate,
    #[serde(default)]
    pub last_donation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub donation_count: u32,
    #[serde(default)]
    pub is_eligible: bool,
    #[serde(default)]
    pub is_available: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoFilter {
    pub center: Coordinate,
    pub radius_km: f64,
}

/// Criteria for [`DonorDirectory::find_donors`].
///
/// `blood_types` of `None` means any type. Results are always restricted to active donors
/// flagged available.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DonorQuery {
    pub blood_types: Option<Vec<BloodType>>,
    pub near: Option<GeoFilter>,
    pub limit: Option<usize>,
}

impl DonorQuery {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of_types(types: impl Into<Vec<BloodType>>) -> Self {
        Self {
            blood_types: Some(types.into()),
            ..Self::default()
        }
    }

    pub fn near(mut self, center: Coordinate, radius_km: f64) -> Self {
        self.near = Some(GeoFilter { center, radius_km });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn admits(&self, user: &DirectoryUser) -> bool {
        let donor = &user.candidate;
        if user.role != UserRole::Donor || !user.is_active || !donor.is_available {
            return false;
        }
        if let Some(types) = &self.blood_types {
            if !types.contains(&donor.blood_type) {
                return false;
            }
        }
        match &self.near {
            Some(filter) => distance_km(filter.center, donor.location) <= filter.radius_km,
            None => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HospitalSite {
    pub id: RecordId,
    pub name: String,
    pub location: Coordinate,
}

#[async_trait]
pub trait DonorDirectory: Send + Sync {
    /// Active, available donors matching `query`.
    ///
    /// When `query.near` is set, results are ordered by ascending distance from its center
    /// before `limit` is applied.
    async fn find_donors(&self, query: &DonorQuery) -> CoreResult<Vec<DonorCandidate>>;
}

#[async_trait]
pub trait DonorRegistry: Send + Sync {
    /// Records a completed donation against a donor's profile.
    ///
    /// Implementations must treat a repeated `donated_at` for the same donor as already applied.
    async fn record_donation(
        &self,
        donor_id: &RecordId,
        donated_at: DateTime<Utc>,
        next_eligible: DateTime<Utc>,
    ) -> CoreResult<()>;
}

#[async_trait]
pub trait HospitalDirectory: Send + Sync {
    /// Hospitals within `radius_km` of `center`, nearest first.
    async fn find_hospitals(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> CoreResult<Vec<HospitalSite>>;
}

/// A directory entry: the donor view plus the account flags the directory filters on.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectoryUser {
    pub candidate: DonorCandidate,
    pub role: UserRole,
    pub is_active: bool,
    pub next_eligible_date: Option<DateTime<Utc>>,
}

impl DirectoryUser {
    pub fn donor(candidate: DonorCandidate) -> Self {
        Self {
            candidate,
            role: UserRole::Donor,
            is_active: true,
            next_eligible_date: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<Vec<DirectoryUser>>,
    hospitals: RwLock<Vec<HospitalSite>>,
}

fn poisoned() -> CoreError {
    CoreError::Collaborator("directory lock poisoned".into())
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: DirectoryUser) -> CoreResult<()> {
        self.users.write().map_err(|_| poisoned())?.push(user);
        Ok(())
    }

    pub fn insert_donor(&self, candidate: DonorCandidate) -> CoreResult<()> {
        self.insert_user(DirectoryUser::donor(candidate))
    }

    pub fn insert_hospital(&self, site: HospitalSite) -> CoreResult<()> {
        self.hospitals.write().map_err(|_| poisoned())?.push(site);
        Ok(())
    }

    /// Snapshot of a directory entry by id.
    pub fn user(&self, id: &RecordId) -> CoreResult<Option<DirectoryUser>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| &u.candidate.id == id).cloned())
    }

    pub fn hospital(&self, id: &RecordId) -> CoreResult<Option<HospitalSite>> {
        let hospitals = self.hospitals.read().map_err(|_| poisoned())?;
        Ok(hospitals.iter().find(|h| &h.id == id).cloned())
    }
}

#[async_trait]
impl DonorDirectory for InMemoryDirectory {
    async fn find_donors(&self, query: &DonorQuery) -> CoreResult<Vec<DonorCandidate>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        let mut found: Vec<(f64, DonorCandidate)> = users
            .iter()
            .filter(|user| query.admits(user))
            .map(|user| {
                let distance = query
                    .near
                    .map(|f| distance_km(f.center, user.candidate.location))
                    .unwrap_or(0.0);
                (distance, user.candidate.clone())
            })
            .collect();

        found.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found.into_iter().map(|(_, donor)| donor).collect())
    }
}

#[async_trait]
impl DonorRegistry for InMemoryDirectory {
    async fn record_donation(
        &self,
        donor_id: &RecordId,
        donated_at: DateTime<Utc>,
        next_eligible: DateTime<Utc>,
    ) -> CoreResult<()> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        let user = users
            .iter_mut()
            .find(|u| u.role == UserRole::Donor && &u.candidate.id == donor_id)
            .ok_or_else(|| CoreError::NotFound(format!("donor {donor_id}")))?;

        if user.candidate.last_donation_date == Some(donated_at) {
            tracing::debug!(donor_id = %donor_id, "donation already recorded on profile");
            return Ok(());
        }

        user.candidate.last_donation_date = Some(donated_at);
        user.candidate.donation_count = user.candidate.donation_count.saturating_add(1);
        user.next_eligible_date = Some(next_eligible);
        Ok(())
    }
}

#[async_trait]
impl HospitalDirectory for InMemoryDirectory {
    async fn find_hospitals(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> CoreResult<Vec<HospitalSite>> {
        let hospitals = self.hospitals.read().map_err(|_| poisoned())?;
        let mut found: Vec<(f64, HospitalSite)> = hospitals
            .iter()
            .map(|h| (distance_km(center, h.location), h.clone()))
            .filter(|(d, _)| *d <= radius_km)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        Ok(found.into_iter().map(|(_, h)| h).collect())
    }
}
