//! Synthetic records for the probe table
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::db::schema::STATUS_IDLE;

const NAMES: &[&str] = &[
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy",
    "mallory", "niaj", "olivia", "peggy", "rupert", "sybil", "trent", "victor", "walter",
];

const WORDS: &[&str] = &[
    "amber", "birch", "cedar", "delta", "ember", "fjord", "granite", "harbor", "indigo", "juniper",
    "kestrel", "lumen", "meadow", "nimbus", "orchid", "pepper", "quartz", "river",
];

const DOMAINS: &[&str] = &["example", "mailbox", "inbox", "postal", "courier", "letters"];

const TLDS: &[&str] = &["com", "net", "org", "io", "info"];

/// One probe row before it is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    description: String,
}

impl Record {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Every probe row is inserted with the same status
    pub fn status(&self) -> &'static str {
        STATUS_IDLE
    }
}

/// Produces email-shaped descriptions, one per call
pub struct RecordGenerator<R = StdRng> {
    rng: R,
}

impl RecordGenerator<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible runs
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RecordGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RecordGenerator<R> {
    pub fn next_record(&mut self) -> Record {
        Record::new(self.email())
    }

    fn email(&mut self) -> String {
        let name = pick(&mut self.rng, NAMES);
        let word = pick(&mut self.rng, WORDS);
        let suffix: u16 = self.rng.gen_range(0..100);
        let domain = pick(&mut self.rng, DOMAINS);
        let tld = pick(&mut self.rng, TLDS);
        format!("{name}.{word}{suffix:02}@{domain}.{tld}")
    }
}

fn pick<R: Rng>(rng: &mut R, items: &'static [&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or("probe")
}
