//! Pet service: adoption, vitals display and the feed/water actions.

use std::sync::Arc;

use crate::domain::decay::{self, VitalsReport};
use crate::domain::{
    Clock, DecayPolicy, EventBus, Personality, Pet, PetEvent, PetId, UserId, Vital,
};
use crate::error::PondError;
use crate::persistence::PondStore;

const PET_NAME_MAX_LEN: usize = 32;

/// Orchestration layer for pet operations.
///
/// Reads go through the decay calculator at the injected clock's current
/// instant; writes persist the refilled stat and publish a [`PetEvent`].
#[derive(Debug, Clone)]
pub struct PetService {
    store: Arc<dyn PondStore>,
    clock: Arc<dyn Clock>,
    policy: DecayPolicy,
    event_bus: EventBus,
}

impl PetService {
    /// Creates a new `PetService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn PondStore>,
        clock: Arc<dyn Clock>,
        policy: DecayPolicy,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
            event_bus,
        }
    }

    /// Returns the active decay policy.
    #[must_use]
    pub const fn policy(&self) -> &DecayPolicy {
        &self.policy
    }

    /// Adopts a new pet for `owner` with full vitals.
    ///
    /// # Errors
    ///
    /// [`PondError::InvalidRequest`] for a blank or overlong name,
    /// [`PondError::ProfileNotFound`] if the owner does not exist.
    pub async fn adopt_pet(
        &self,
        owner: UserId,
        name: &str,
        personality: Personality,
    ) -> Result<Pet, PondError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > PET_NAME_MAX_LEN {
            return Err(PondError::InvalidRequest(format!(
                "pet name must be 1-{PET_NAME_MAX_LEN} characters"
            )));
        }

        let now = self.clock.now();
        let pet = Pet::adopt(owner, name.to_string(), personality, now);
        self.store.insert_pet(&pet).await?;

        let _ = self.event_bus.publish(PetEvent::PetAdopted {
            pet_id: pet.id,
            owner_id: owner,
            name: pet.name.clone(),
            timestamp: now,
        });

        tracing::info!(pet_id = %pet.id, owner_id = %owner, "pet adopted");
        Ok(pet)
    }

    /// Loads the stored pet record without applying decay.
    ///
    /// # Errors
    ///
    /// [`PondError::PetNotFound`] if it does not exist.
    pub async fn get_pet(&self, id: PetId) -> Result<Pet, PondError> {
        self.store.get_pet(id).await?.ok_or(PondError::PetNotFound(id))
    }

    /// Returns the pet as a viewer should see it right now.
    ///
    /// # Errors
    ///
    /// [`PondError::PetNotFound`] if it does not exist.
    pub async fn pet_vitals(&self, id: PetId) -> Result<VitalsReport, PondError> {
        let pet = self.get_pet(id).await?;
        Ok(decay::vitals_report(&pet, self.clock.now(), &self.policy))
    }

    /// Feeds the pet back to full hunger.
    ///
    /// # Errors
    ///
    /// [`PondError::InteractionRefused`] while the pet is still full, plus
    /// the lookup errors of [`Self::pet_vitals`].
    pub async fn feed(&self, pet_id: PetId, actor: UserId) -> Result<VitalsReport, PondError> {
        self.interact(pet_id, actor, Vital::Hunger).await
    }

    /// Waters the pet back to full.
    ///
    /// # Errors
    ///
    /// [`PondError::InteractionRefused`] while the pet is still full, plus
    /// the lookup errors of [`Self::pet_vitals`].
    pub async fn water(&self, pet_id: PetId, actor: UserId) -> Result<VitalsReport, PondError> {
        self.interact(pet_id, actor, Vital::Water).await
    }

    async fn interact(
        &self,
        pet_id: PetId,
        actor: UserId,
        vital: Vital,
    ) -> Result<VitalsReport, PondError> {
        if self.store.get_profile(actor).await?.is_none() {
            return Err(PondError::ProfileNotFound(actor));
        }

        let pet = self.get_pet(pet_id).await?;
        let now = self.clock.now();
        let (open, wait) = match vital {
            Vital::Hunger => (
                decay::can_feed(&pet, now, &self.policy),
                decay::minutes_until_feedable(&pet, now, &self.policy),
            ),
            Vital::Water => (
                decay::can_water(&pet, now, &self.policy),
                decay::minutes_until_waterable(&pet, now, &self.policy),
            ),
        };
        if !open {
            tracing::debug!(%pet_id, action = vital.action(), wait, "interaction refused");
            return Err(PondError::InteractionRefused(format!(
                "{} is already full; try to {} again in about {wait} minutes",
                pet.name,
                vital.action()
            )));
        }

        let updated = self
            .store
            .refill_vital(pet_id, vital, now)
            .await?
            .ok_or(PondError::PetNotFound(pet_id))?;

        let event = match vital {
            Vital::Hunger => PetEvent::PetFed {
                pet_id,
                fed_by: actor,
                timestamp: now,
            },
            Vital::Water => PetEvent::PetWatered {
                pet_id,
                watered_by: actor,
                timestamp: now,
            },
        };
        let _ = self.event_bus.publish(event);

        tracing::info!(%pet_id, actor = %actor, action = vital.action(), "pet refilled");
        Ok(decay::vitals_report(&updated, now, &self.policy))
    }
}
