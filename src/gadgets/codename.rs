//! # Codename Generator
//!
//! Two-word gadget codenames drawn from fixed prefix and noun lists.
//!
//! The generator does not guarantee uniqueness; the lifecycle retries against
//! the store's unique constraint.

use rand::seq::SliceRandom;
use rand::Rng;

use super::errors::{GadgetError, GadgetResult};

const PREFIXES: [&str; 35] = [
    "The", "Operation", "Project", "Mission", "Codename", "Protocol", "Titan", "Echo", "Stealth",
    "Nebula", "Vortex", "Quantum", "Rogue", "Stellar", "Thunderstrike", "Shadow", "Nova",
    "Tempest", "Viper", "Solar", "Dark", "Spectral", "Iron", "Celestial", "Radiant", "Blackout",
    "Cosmic", "Inferno", "Chaos", "Sentinel", "Echelon", "Cipher", "Aurora", "Hyperion", "Havoc",
];

const NOUNS: [&str; 36] = [
    "Nightangle", "Kraken", "Phoenix", "Raven", "Eagle", "Storm", "Wolf", "Tiger", "Dragon",
    "Falcon", "Hawk", "Scorpion", "Spectre", "Griffin", "Ironclad", "Pulse", "Rider", "Spear",
    "Fury", "Blaze", "Serpent", "Striker", "Fang", "Flare", "Horizon", "Phantom", "Vortex",
    "Reaper", "Wrath", "Ghost", "Enigma", "Reborn", "Seraph", "Burst", "Maverick", "Renegade",
];

/// Draws `"<Prefix> <Noun>"` codenames
#[derive(Debug, Clone, Copy)]
pub struct CodenameGenerator {
    prefixes: &'static [&'static str],
    nouns: &'static [&'static str],
}

impl Default for CodenameGenerator {
    fn default() -> Self {
        Self {
            prefixes: &PREFIXES,
            nouns: &NOUNS,
        }
    }
}

impl CodenameGenerator {
    /// Build a generator over custom word lists.
    ///
    /// Fails when either list is empty or when every prefix equals every
    /// noun, since the redraw loop could then never finish.
    pub fn new(
        prefixes: &'static [&'static str],
        nouns: &'static [&'static str],
    ) -> GadgetResult<Self> {
        if prefixes.is_empty() || nouns.is_empty() {
            return Err(GadgetError::InvalidWordLists("lists must not be empty"));
        }
        if !prefixes.iter().any(|p| nouns.iter().any(|n| n != p)) {
            return Err(GadgetError::InvalidWordLists(
                "no distinct prefix/noun pair",
            ));
        }
        Ok(Self { prefixes, nouns })
    }

    /// Number of distinct codenames this generator can produce
    pub fn combinations(&self) -> usize {
        self.prefixes
            .iter()
            .map(|p| self.nouns.iter().filter(|n| *n != p).count())
            .sum()
    }

    /// Draw a codename using the thread-local RNG
    pub fn generate(&self) -> String {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Draw a codename from the given random source
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        loop {
            // Lists are non-empty by construction
            let (Some(prefix), Some(noun)) =
                (self.prefixes.choose(rng), self.nouns.choose(rng))
            else {
                continue;
            };
            if prefix != noun {
                return format!("{prefix} {noun}");
            }
        }
    }
}

/// Draw a success probability in [0, 100], rounded to two decimals
pub fn draw_success_probability<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let raw: f64 = rng.gen_range(0.0..=100.0);
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_builtin_lists_are_unique() {
        let mut prefixes = PREFIXES.to_vec();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), PREFIXES.len());

        let mut nouns = NOUNS.to_vec();
        nouns.sort_unstable();
        nouns.dedup();
        assert_eq!(nouns.len(), NOUNS.len());
    }

    #[test]
    fn test_prefix_never_equals_noun() {
        let generator = CodenameGenerator::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let name = generator.generate_with(&mut rng);
            let (prefix, noun) = name.split_once(' ').unwrap();
            assert_ne!(prefix, noun, "self-identical codename: {name}");
            assert!(PREFIXES.contains(&prefix));
            assert!(NOUNS.contains(&noun));
        }
    }

    #[test]
    fn test_overlapping_lists_still_terminate() {
        static SAME: [&str; 2] = ["Vortex", "Echo"];
        let generator = CodenameGenerator::new(&SAME, &SAME).unwrap();
        assert_eq!(generator.combinations(), 2);
        for _ in 0..100 {
            let name = generator.generate();
            assert!(name == "Vortex Echo" || name == "Echo Vortex");
        }
    }

    #[test]
    fn test_degenerate_lists_rejected() {
        static EMPTY: [&str; 0] = [];
        static ONE: [&str; 1] = ["Vortex"];
        assert!(CodenameGenerator::new(&EMPTY, &ONE).is_err());
        assert!(CodenameGenerator::new(&ONE, &EMPTY).is_err());
        assert!(CodenameGenerator::new(&ONE, &ONE).is_err());
    }

    #[test]
    fn test_builtin_combinations() {
        // 35 x 36 minus the shared "Vortex Vortex"
        assert_eq!(CodenameGenerator::default().combinations(), 35 * 36 - 1);
        assert!(NOUNS.contains(&"Nightangle"));
        assert!(!PREFIXES.contains(&"Obsidian"));
    }

    #[test]
    fn test_success_probability_range_and_precision() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1_000 {
            let p = draw_success_probability(&mut rng);
            assert!((0.0..=100.0).contains(&p));
            assert!(((p * 100.0).round() - p * 100.0).abs() < 1e-6);
        }
    }
}
