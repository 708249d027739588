use std::cmp::min;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_isaac::Isaac64Rng;

use super::sites::Facility;


pub static DEFAULT_SEED: u64 = 42;

/// The order in which candidate facilities are "opened" as p grows.  This is a seeded random
/// sample of the candidates, not the output of any optimization; it's fixed for the life of the
/// server so that the facilities shown for p are always a prefix of those shown for p + 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOrder {
    facility_ids: Vec<String>,
}

impl SelectionOrder {
    pub fn from_candidates(candidates: &[Facility], seed: u64, max_p: usize) -> SelectionOrder {
        let mut rng = Isaac64Rng::seed_from_u64(seed);
        let amount = min(max_p, candidates.len());
        if amount < max_p {
            log::warn!("Only {} candidates are available, fewer than the maximum p of {}",
                       candidates.len(), max_p);
        }
        let facility_ids = candidates.choose_multiple(&mut rng, amount)
                                     .map(|ff| ff.id.clone())
                                     .collect();
        SelectionOrder{facility_ids}
    }

    /// The ids of the first p facilities selected.  If p is larger than the order, the whole
    /// order is returned.
    pub fn selected_for(&self, p: usize) -> &[String] {
        &self.facility_ids[..min(p, self.facility_ids.len())]
    }

    pub fn len(&self) -> usize {
        self.facility_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facility_ids.is_empty()
    }
}
