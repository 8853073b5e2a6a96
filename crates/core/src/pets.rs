//! Weight-based pet attribution.
//!
//! The roster stores reference weights in kilograms while the scale reports
//! grams. [`PetResolver`] picks the pet whose reference weight is closest to
//! a reading, or reports no match when that pet's roster weight is above
//! [`MAX_PET_WEIGHT_KG`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Pets whose roster weight exceeds this value are never matched.
///
/// The comparison is against the kilogram roster value. It is kept exactly
/// as the vendor integration has always behaved; a unit correction must be
/// an intentional change.
pub const MAX_PET_WEIGHT_KG: f64 = 600.0;

/// A known pet and its reference weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub name: String,
    /// Reference weight in kilograms.
    pub weight: f64,
}

impl Pet {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }

    /// Absolute distance in grams between this pet and a scale reading.
    pub fn deviation_grams(&self, grams: i64) -> f64 {
        (self.weight * 1000.0 - grams as f64).abs()
    }
}

/// Capability the classifier needs: name the pet behind a weight reading.
pub trait PetLookup {
    fn pet_for_weight(&self, grams: i64) -> Result<Option<String>, CoreError>;
}

/// Source of the account's pet roster.
#[async_trait]
pub trait RosterSource: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch_roster(&mut self) -> Result<Vec<Pet>, Self::Error>;
}

/// Session-scoped roster cache with nearest-weight matching.
///
/// The roster is loaded once through [`ensure_loaded`](Self::ensure_loaded)
/// and reused until [`invalidate`](Self::invalidate) is called. A resolver
/// must not outlive the session it was loaded in, since pet weights change.
#[derive(Debug, Default)]
pub struct PetResolver {
    roster: Option<Vec<Pet>>,
}

impl PetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver around an already fetched roster.
    pub fn with_roster(roster: Vec<Pet>) -> Self {
        Self {
            roster: Some(roster),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.roster.is_some()
    }

    /// Fetch the roster from `source` unless it is already cached.
    pub async fn ensure_loaded<S>(&mut self, source: &mut S) -> Result<(), S::Error>
    where
        S: RosterSource + ?Sized,
    {
        if self.roster.is_none() {
            let roster = source.fetch_roster().await?;
            self.roster = Some(roster);
        }
        Ok(())
    }

    /// Drop the cached roster so the next load fetches it again.
    pub fn invalidate(&mut self) {
        self.roster = None;
    }

    /// Find the pet closest to `grams`.
    ///
    /// Ties keep roster order. Returns `Ok(None)` when the closest pet's
    /// roster weight is above [`MAX_PET_WEIGHT_KG`]. There is no distance
    /// cutoff: any reading goes to the closest pet.
    pub fn resolve_by_weight(&self, grams: i64) -> Result<Option<&Pet>, CoreError> {
        let roster = self.roster.as_ref().ok_or(CoreError::RosterNotLoaded)?;

        let best = roster
            .iter()
            .min_by(|a, b| a.deviation_grams(grams).total_cmp(&b.deviation_grams(grams)))
            .ok_or(CoreError::EmptyRoster)?;

        if best.weight > MAX_PET_WEIGHT_KG {
            return Ok(None);
        }
        Ok(Some(best))
    }
}

impl PetLookup for PetResolver {
    fn pet_for_weight(&self, grams: i64) -> Result<Option<String>, CoreError> {
        Ok(self.resolve_by_weight(grams)?.map(|pet| pet.name.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn resolver() -> PetResolver {
        PetResolver::with_roster(vec![Pet::new("test1", 1.0), Pet::new("test2", 3.0)])
    }

    fn name_for(resolver: &PetResolver, grams: i64) -> Option<String> {
        resolver.pet_for_weight(grams).expect("roster is loaded")
    }

    #[test]
    fn picks_nearest_pet() {
        let r = resolver();
        assert_eq!(name_for(&r, 900).as_deref(), Some("test1"));
        assert_eq!(name_for(&r, 2700).as_deref(), Some("test2"));
    }

    /// A 4000 g reading goes to the 3 kg pet. The kilogram threshold only
    /// rejects heavy roster entries, so a distant reading is still matched.
    #[test]
    fn distant_reading_still_goes_to_nearest_pet() {
        let r = resolver();
        assert_eq!(name_for(&r, 4000).as_deref(), Some("test2"));
        assert_eq!(name_for(&r, 3700).as_deref(), Some("test2"));

        let single = PetResolver::with_roster(vec![Pet::new("Mochi", 4.2)]);
        assert_eq!(name_for(&single, 5000).as_deref(), Some("Mochi"));
        assert_eq!(name_for(&single, 3000).as_deref(), Some("Mochi"));
    }

    #[test]
    fn tie_keeps_roster_order() {
        let r = PetResolver::with_roster(vec![Pet::new("first", 2.0), Pet::new("second", 3.0)]);
        assert_eq!(name_for(&r, 2500).as_deref(), Some("first"));
    }

    /// Pins the kilogram comparison against 600. A pet listed at 700 kg is
    /// never matched even by an exact reading.
    #[test]
    fn roster_weight_above_threshold_never_matches() {
        let r = PetResolver::with_roster(vec![Pet::new("heavy", 700.0)]);
        assert_eq!(name_for(&r, 700_000), None);

        let r = PetResolver::with_roster(vec![Pet::new("edge", 0.6)]);
        assert_eq!(name_for(&r, 600).as_deref(), Some("edge"));
    }

    #[test]
    fn empty_roster_is_an_error() {
        let r = PetResolver::with_roster(Vec::new());
        assert_matches!(r.resolve_by_weight(1000), Err(CoreError::EmptyRoster));
    }

    #[test]
    fn unloaded_roster_is_an_error() {
        assert_matches!(
            PetResolver::new().resolve_by_weight(1000),
            Err(CoreError::RosterNotLoaded)
        );
    }

    struct CountingSource {
        calls: usize,
    }

    #[async_trait]
    impl RosterSource for CountingSource {
        type Error = std::io::Error;

        async fn fetch_roster(&mut self) -> Result<Vec<Pet>, Self::Error> {
            self.calls += 1;
            Ok(vec![Pet::new("Mochi", 4.2)])
        }
    }

    #[tokio::test]
    async fn roster_is_fetched_once_until_invalidated() {
        let mut source = CountingSource { calls: 0 };
        let mut r = PetResolver::new();

        r.ensure_loaded(&mut source).await.unwrap();
        r.ensure_loaded(&mut source).await.unwrap();
        assert_eq!(source.calls, 1);
        assert_eq!(name_for(&r, 4300).as_deref(), Some("Mochi"));

        r.invalidate();
        assert!(!r.is_loaded());
        r.ensure_loaded(&mut source).await.unwrap();
        assert_eq!(source.calls, 2);
    }

    struct FailingSource;

    #[async_trait]
    impl RosterSource for FailingSource {
        type Error = std::io::Error;

        async fn fetch_roster(&mut self) -> Result<Vec<Pet>, Self::Error> {
            Err(std::io::Error::other("vendor down"))
        }
    }

    #[tokio::test]
    async fn failed_fetch_leaves_resolver_unloaded() {
        let mut r = PetResolver::new();
        assert!(r.ensure_loaded(&mut FailingSource).await.is_err());
        assert!(!r.is_loaded());
    }
}
