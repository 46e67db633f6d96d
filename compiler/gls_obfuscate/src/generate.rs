//! Short-name generation.
//!
//! A bijective base-53 counter over `a-z A-Z _` yields the densest possible
//! identifier stream: `a`..`_`, then `aa`, `ab`, ... Candidates that collide
//! with reserved words, extension-reserved builtins or pinned names are
//! skipped and the counter keeps advancing, so a given counter position
//! always maps to the same surviving name.

use rustc_hash::FxHashSet;

use gls_ast::reserved;

const ALPHABET: &[u8; 53] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_";

/// Bijective base-53 numeral for `n >= 1`.
fn encode(mut n: u64) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(ALPHABET[(n % 53) as usize]);
        n /= 53;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Counter-driven identifier generator.
///
/// Counter positions claimed by includes in earlier files can be blocked so
/// fresh module-level names never land inside a range that a replayed
/// include will mint from.
#[derive(Clone, Debug)]
pub struct NameGenerator {
    counter: u64,
    /// Names reserved by enabled extensions plus the pinned allow-list.
    banned: FxHashSet<String>,
    /// Half-open `(start, end]` counter ranges claimed elsewhere.
    blocked: Vec<(u64, u64)>,
    honor_blocked: bool,
}

impl NameGenerator {
    pub fn new(banned: FxHashSet<String>) -> Self {
        NameGenerator {
            counter: 0,
            banned,
            blocked: Vec::new(),
            honor_blocked: true,
        }
    }

    /// Current counter position.
    pub fn position(&self) -> u64 {
        self.counter
    }

    /// Move the counter, e.g. to replay a recorded include range.
    pub fn jump_to(&mut self, position: u64) {
        self.counter = position;
    }

    /// Install the counter ranges claimed by includes in other files.
    pub fn block(&mut self, ranges: Vec<(u64, u64)>) {
        self.blocked = ranges;
    }

    /// Whether minting steps over blocked ranges. Disabled while replaying
    /// the range's own include.
    pub fn set_honor_blocked(&mut self, honor: bool) {
        self.honor_blocked = honor;
    }

    /// Mint the next name, skipping reserved, banned and `taken` candidates.
    pub fn next_name(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            self.counter += 1;
            if self.honor_blocked {
                if let Some(&(_, end)) = self
                    .blocked
                    .iter()
                    .find(|&&(start, end)| self.counter > start && self.counter <= end)
                {
                    self.counter = end;
                    continue;
                }
            }
            let name = encode(self.counter);
            if reserved::is_reserved(&name)
                || reserved::PINNED.contains(&name.as_str())
                || self.banned.contains(&name)
                || taken(&name)
            {
                continue;
            }
            return name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn first_names_are_single_letters() {
        let mut generator = NameGenerator::new(FxHashSet::default());
        assert_eq!(generator.next_name(|_| false), "a");
        assert_eq!(generator.next_name(|_| false), "b");
    }

    #[test]
    fn reserved_candidates_are_skipped() {
        // Position the counter just before "do" (d=4, o=15: 4*53+15 = 227).
        let mut generator = NameGenerator::new(FxHashSet::default());
        generator.jump_to(226);
        assert_eq!(encode(227), "do");
        let name = generator.next_name(|_| false);
        assert_ne!(name, "do");
        assert_eq!(name, "dp");
    }

    #[test]
    fn banned_names_are_skipped() {
        let mut banned = FxHashSet::default();
        banned.insert("a".to_owned());
        let mut generator = NameGenerator::new(banned);
        assert_eq!(generator.next_name(|_| false), "b");
    }

    #[test]
    fn blocked_ranges_are_stepped_over() {
        let mut generator = NameGenerator::new(FxHashSet::default());
        generator.block(vec![(1, 3)]);
        // Positions 2 and 3 belong to another file's include.
        assert_eq!(generator.next_name(|_| false), "a");
        assert_eq!(generator.next_name(|_| false), "d");
    }

    #[test]
    fn replay_ignores_blocked_ranges() {
        let mut generator = NameGenerator::new(FxHashSet::default());
        generator.block(vec![(0, 2)]);
        generator.set_honor_blocked(false);
        assert_eq!(generator.next_name(|_| false), "a");
    }

    proptest! {
        #[test]
        fn encoding_is_injective(a in 1u64..100_000, b in 1u64..100_000) {
            prop_assume!(a != b);
            prop_assert_ne!(encode(a), encode(b));
        }

        #[test]
        fn generated_names_avoid_reserved(seed in 0u64..10_000) {
            let mut generator = NameGenerator::new(FxHashSet::default());
            generator.jump_to(seed);
            let name = generator.next_name(|_| false);
            prop_assert!(!gls_ast::reserved::is_reserved(&name));
            prop_assert!(!name.is_empty());
        }
    }
}
