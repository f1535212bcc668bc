// ---------------------------------------------------------------------------
// 16.16 fixed-point coordinate stepping.
//
// `fixed_div` gives the whole part of a step; `Step` also carries the
// remainder of that division, so after k steps the position equals
// floor(start + k * num * 65536 / den) exactly, however long the row is.
// ---------------------------------------------------------------------------

/// Largest divisor served from the reciprocal table.
const RECIP_MAX: usize = 4096;

/// `ceil(2^64 / d)` for `d` in `1..=4096`; entry 0 is unused.
///
/// With numerators below 2^52 a multiply-high by these reciprocals is exact
/// (Granlund-Montgomery with a 12-bit divisor), which covers `num << 16`
/// for every `u32` numerator.
static RECIP: [u128; RECIP_MAX + 1] = {
    let mut t = [0u128; RECIP_MAX + 1];
    let mut d = 1;
    while d <= RECIP_MAX {
        t[d] = (1u128 << 64).div_ceil(d as u128);
        d += 1;
    }
    t
};

/// `floor(num * 65536 / div)` as 16.16 fixed point. `div` must be non-zero.
#[inline]
pub(crate) fn fixed_div(num: u32, div: u32) -> u64 {
    debug_assert!(div != 0);
    let n = (num as u64) << 16;
    if (div as usize) <= RECIP_MAX {
        ((n as u128 * RECIP[div as usize]) >> 64) as u64
    } else {
        n / div as u64
    }
}

/// A position advancing by `num / den` source units per destination unit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Step {
    pos: u64,
    whole: u64,
    rem: u64,
    den: u64,
    err: u64,
}

impl Step {
    /// Start at `start` (16.16) and advance by `num / den` each step.
    pub(crate) fn new(start: u64, num: u32, den: u32) -> Self {
        let whole = fixed_div(num, den);
        let rem = ((num as u64) << 16) - whole * den as u64;
        Self {
            pos: start,
            whole,
            rem,
            den: den as u64,
            err: 0,
        }
    }

    /// A step that never moves.
    pub(crate) const fn fixed(pos: u64) -> Self {
        Self {
            pos,
            whole: 0,
            rem: 0,
            den: 1,
            err: 0,
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> u64 {
        self.pos
    }

    /// The whole 16.16 step, without the carried remainder.
    #[inline]
    pub(crate) fn whole(&self) -> u64 {
        self.whole
    }

    /// True when every step is the same whole number of 16.16 units.
    #[inline]
    pub(crate) fn is_exact(&self) -> bool {
        self.rem == 0
    }

    #[inline]
    pub(crate) fn advance(&mut self) {
        self.pos += self.whole;
        self.err += self.rem;
        if self.err >= self.den {
            self.err -= self.den;
            self.pos += 1;
        }
    }

    /// Advance `n` steps at once.
    pub(crate) fn skip(&mut self, n: usize) {
        let n = n as u64;
        let err = self.err + self.rem * n;
        self.pos += self.whole * n + err / self.den;
        self.err = err % self.den;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_div_matches_wide_division() {
        for div in (1..=5000u32).step_by(7).chain([1, 2, 3, 4095, 4096, 4097]) {
            for num in [0u32, 1, 2, 3, 639, 640, 1919, 4096, 65535, 1 << 20, u32::MAX] {
                let want = ((num as u64) << 16) / div as u64;
                assert_eq!(fixed_div(num, div), want, "num={num} div={div}");
            }
        }
    }

    #[test]
    fn step_tracks_exact_position() {
        for (num, den) in [(1920u32, 1280u32), (3, 7), (1000, 999), (7, 4097)] {
            let mut s = Step::new(0, num, den);
            for k in 1..=10_000u64 {
                s.advance();
                let exact = (k * ((num as u64) << 16)) / den as u64;
                assert_eq!(s.pos(), exact, "num={num} den={den} k={k}");
            }
        }
    }

    #[test]
    fn skip_equals_repeated_advance() {
        let mut a = Step::new(12345, 17, 5);
        let mut b = a;
        for _ in 0..333 {
            a.advance();
        }
        b.skip(333);
        assert_eq!(a.pos(), b.pos());
        a.advance();
        b.advance();
        assert_eq!(a.pos(), b.pos());
    }

    #[test]
    fn integer_ratios_are_exact() {
        assert!(Step::new(0, 4, 2).is_exact());
        assert_eq!(Step::new(0, 4, 2).whole(), 2 << 16);
        assert!(!Step::new(0, 4, 3).is_exact());
    }
}
