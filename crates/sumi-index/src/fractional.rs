//! The base-36 `between` / `before` / `after` algebra.

use crate::error::IndexError;
use crate::jitter::{JitterSource, JITTER_PROBABILITY, MAX_JITTERED_LEN};
use crate::Result;

/// The index alphabet, in collation order.
pub const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Radix of the alphabet.
pub const BASE: usize = 36;

/// Canonical midpoint of the keyspace: `'m'`, value 22.
const MIDPOINT: &str = "m";

/// Mid-alphabet character appended when bisecting past adjacent digits:
/// `'h'`, value 17.
const HALFWAY: u8 = b'h';

/// Value of a character in the alphabet, or `InvalidCharacter`.
fn char_val(c: u8) -> Result<usize> {
    match c {
        b'0'..=b'9' => Ok((c - b'0') as usize),
        b'a'..=b'z' => Ok((c - b'a') as usize + 10),
        other => Err(IndexError::InvalidCharacter(other as char)),
    }
}

/// Character for a value in `0..36`.
fn val_char(v: usize) -> u8 {
    debug_assert!(v < BASE);
    ALPHABET[v]
}

/// Check that every character of `s` is in the alphabet.
fn check(s: &str) -> Result<()> {
    for &c in s.as_bytes() {
        char_val(c)?;
    }
    Ok(())
}

/// Check validity: non-empty and alphabet-only.
pub fn is_valid(s: &str) -> bool {
    !s.is_empty() && check(s).is_ok()
}

/// Check that a sequence of indices is strictly increasing.
pub fn validate_order<S: AsRef<str>>(indices: &[S]) -> bool {
    indices
        .windows(2)
        .all(|pair| pair[0].as_ref() < pair[1].as_ref())
}

/// Synthesize an index strictly between `a` and `b`.
///
/// Either bound may be open (`None`). With both open, returns the canonical
/// midpoint `"m"`. Fails with [`IndexError::EmptyInterval`] when the bounds
/// are adjacent (nothing fits between them), and with
/// [`IndexError::InvalidRange`] when `a >= b`.
pub fn between(a: Option<&str>, b: Option<&str>) -> Result<String> {
    let (a, b) = match (a, b) {
        (None, None) => return Ok(MIDPOINT.to_string()),
        (None, Some(b)) => return before(b),
        (Some(a), None) => return after(a),
        (Some(a), Some(b)) => (a, b),
    };
    check(a)?;
    check(b)?;
    if a >= b {
        return Err(IndexError::InvalidRange {
            lower: a.to_string(),
            upper: b.to_string(),
        });
    }

    let ab = a.as_bytes();
    let bb = b.as_bytes();
    let prefix = ab.iter().zip(bb).take_while(|(x, y)| x == y).count();

    if prefix == ab.len() {
        // `a` is a proper prefix of `b`: bisect b's continuation.
        let v = char_val(bb[prefix])?;
        if v > 1 {
            return Ok(format!("{a}{}", val_char(v / 2) as char));
        }
        if v == 1 {
            return Ok(format!("{a}0"));
        }
        // b continues with '0': walk the zero run.
        let mut j = prefix;
        while j < bb.len() && bb[j] == b'0' {
            j += 1;
        }
        if j == bb.len() {
            let run = j - prefix;
            if run > 1 {
                return Ok(format!("{a}{}", "0".repeat(run / 2)));
            }
            // b == a + "0": nothing sorts between them.
            return Err(IndexError::EmptyInterval {
                lower: a.to_string(),
                upper: b.to_string(),
            });
        }
        // First non-zero past the run; bisect it under the full run of zeros.
        let v = char_val(bb[j])?;
        return Ok(format!(
            "{a}{}{}",
            "0".repeat(j - prefix),
            val_char(v / 2) as char
        ));
    }

    // Both sides have a character at the divergence point, and a < b
    // guarantees a[prefix] < b[prefix].
    let av = char_val(ab[prefix])?;
    let bv = char_val(bb[prefix])?;
    if bv - av > 1 {
        return Ok(format!("{}{}", &a[..prefix], val_char((av + bv) / 2) as char));
    }
    // Adjacent digits: keep a's digit and push past a's remainder.
    if prefix < a.len() - 1 {
        let tail = after(&a[prefix + 1..])?;
        return Ok(format!("{}{}", &a[..=prefix], tail));
    }
    Ok(format!("{a}{}", HALFWAY as char))
}

/// Synthesize an index sorting before `b` (for head insertion).
///
/// For the degenerate all-zero `b` there is no smaller index at all; the
/// documented behavior is to return `"0" + b`, which callers recover from via
/// rebalancing (the ordering layer tolerates the tie-adjacent placement).
pub fn before(b: &str) -> Result<String> {
    check(b)?;
    if b.is_empty() {
        return Ok(MIDPOINT.to_string());
    }
    let bytes = b.as_bytes();
    let Some(i) = bytes.iter().position(|&c| c != b'0') else {
        return Ok(format!("0{b}"));
    };
    let v = char_val(bytes[i])?;
    if v > 1 {
        return Ok(format!("{}{}", &b[..i], val_char(v / 2) as char));
    }
    // v == 1: step down into the '0' subtree and park mid-alphabet.
    Ok(format!("{}0h", &b[..i]))
}

/// Synthesize an index sorting after `a` (for tail insertion).
pub fn after(a: &str) -> Result<String> {
    check(a)?;
    if a.is_empty() {
        return Ok(MIDPOINT.to_string());
    }
    let bytes = a.as_bytes();
    let Some(i) = bytes.iter().rposition(|&c| c != b'z') else {
        return Ok(format!("{a}h"));
    };
    let v = char_val(bytes[i])?;
    // Stop one short of 'z' so the incremented digit keeps headroom above it.
    if v < 34 {
        return Ok(format!("{}{}", &a[..i], val_char(v + 1) as char));
    }
    Ok(format!("{a}h"))
}

/// [`between`] with the concurrent-writer jitter extension.
///
/// After computing the deterministic midpoint, short indices are extended by
/// one random alphabet character with probability [`JITTER_PROBABILITY`],
/// provided the extension still lies inside `(a, b)`. Diversifies the indices
/// two independent writers mint for the same gap.
pub fn between_jittered(
    a: Option<&str>,
    b: Option<&str>,
    jitter: &mut dyn JitterSource,
) -> Result<String> {
    let key = between(a, b)?;
    if key.len() < MAX_JITTERED_LEN && jitter.random() < JITTER_PROBABILITY {
        let c = ALPHABET[jitter.random_int(BASE)] as char;
        let extended = format!("{key}{c}");
        let above = a.map_or(true, |a| extended.as_str() > a);
        let below = b.map_or(true, |b| extended.as_str() < b);
        if above && below {
            return Ok(extended);
        }
    }
    Ok(key)
}

/// Generate `n` indices in strictly increasing order between the bounds.
///
/// Each index is placed between its predecessor and the upper bound, so the
/// sequence leans toward the low end of the interval and leaves the most
/// headroom where the next writer will land.
pub fn generate(
    a: Option<&str>,
    b: Option<&str>,
    n: usize,
    jitter: &mut dyn JitterSource,
) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(n);
    let mut prev: Option<String> = a.map(str::to_owned);
    for _ in 0..n {
        let next = between_jittered(prev.as_deref(), b, jitter)?;
        out.push(next.clone());
        prev = Some(next);
    }
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jitter::{NoJitter, RngJitter};

    fn mid(a: Option<&str>, b: Option<&str>) -> String {
        between(a, b).unwrap()
    }

    // ── between: open bounds ────────────────────────────────────────────

    #[test]
    fn test_both_open_is_canonical_midpoint() {
        assert_eq!(mid(None, None), "m");
    }

    #[test]
    fn test_open_lower_delegates_to_before() {
        assert_eq!(mid(None, Some("m")), before("m").unwrap());
    }

    #[test]
    fn test_open_upper_delegates_to_after() {
        assert_eq!(mid(Some("m"), None), after("m").unwrap());
    }

    // ── between: prefix cases ───────────────────────────────────────────

    #[test]
    fn test_prefix_bisects_continuation() {
        // 'x' has value 33, half is 16 -> 'g'
        assert_eq!(mid(Some("m"), Some("mx")), "mg");
        assert!("m" < "mg" && "mg" < "mx");
    }

    #[test]
    fn test_prefix_continuation_one_descends_to_zero() {
        assert_eq!(mid(Some("m"), Some("m1")), "m0");
    }

    #[test]
    fn test_prefix_zero_run_ending_in_zeros() {
        // b = a + "000": halve the run.
        assert_eq!(mid(Some("m"), Some("m000")), "m0");
        assert_eq!(mid(Some("m"), Some("m0000")), "m00");
    }

    #[test]
    fn test_prefix_zero_run_with_tail() {
        // b = a + "00" + '8': keep the zeros, bisect the 8.
        assert_eq!(mid(Some("m"), Some("m008")), "m004");
        // Tail digit 1 bisects to '0', extending the run by one.
        assert_eq!(mid(Some("m"), Some("m01")), "m00");
    }

    #[test]
    fn test_adjacent_prefix_is_empty_interval() {
        let err = between(Some("m"), Some("m0")).unwrap_err();
        assert_eq!(
            err,
            IndexError::EmptyInterval {
                lower: "m".into(),
                upper: "m0".into()
            }
        );
    }

    // ── between: divergent cases ────────────────────────────────────────

    #[test]
    fn test_wide_gap_takes_arithmetic_mean() {
        // 'a' = 10, 'z' = 35 -> 22 = 'm'
        assert_eq!(mid(Some("a"), Some("z")), "m");
        assert_eq!(mid(Some("a0"), Some("c0")), "b");
    }

    #[test]
    fn test_adjacent_digits_append_halfway() {
        assert_eq!(mid(Some("m"), Some("n")), "mh");
    }

    #[test]
    fn test_adjacent_digits_with_remainder_push_past() {
        // a = "mz", b = "n": step after the remainder under a's digit.
        let k = mid(Some("mz"), Some("n"));
        assert_eq!(k, "mzh");
        assert!("mz" < k.as_str() && k.as_str() < "n");
    }

    #[test]
    fn test_invalid_range_rejected() {
        assert!(matches!(
            between(Some("b"), Some("a")),
            Err(IndexError::InvalidRange { .. })
        ));
        assert!(matches!(
            between(Some("m"), Some("m")),
            Err(IndexError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_invalid_character_rejected() {
        assert!(matches!(
            between(Some("A"), Some("b")),
            Err(IndexError::InvalidCharacter('A'))
        ));
        assert!(matches!(before("m!"), Err(IndexError::InvalidCharacter('!'))));
    }

    // ── before / after ──────────────────────────────────────────────────

    #[test]
    fn test_before_halves_leading_digit() {
        assert_eq!(before("m").unwrap(), "b"); // 22 / 2 = 11
        assert_eq!(before("8").unwrap(), "4");
    }

    #[test]
    fn test_before_skips_zero_prefix() {
        assert_eq!(before("0z").unwrap(), "0h");
        assert_eq!(before("001").unwrap(), "000h");
    }

    #[test]
    fn test_before_of_one_descends() {
        assert_eq!(before("1").unwrap(), "0h");
    }

    #[test]
    fn test_before_all_zeros_degenerate() {
        // No base-36 string sorts below "0"; the documented fallback prepends.
        assert_eq!(before("0").unwrap(), "00");
        assert_eq!(before("00").unwrap(), "000");
    }

    #[test]
    fn test_after_increments_last_non_z() {
        assert_eq!(after("m").unwrap(), "n");
        assert_eq!(after("mz").unwrap(), "n");
        assert_eq!(after("az").unwrap(), "b");
    }

    #[test]
    fn test_after_keeps_headroom_at_y() {
        // 'y' is never incremented to 'z'; extend instead.
        assert_eq!(after("y").unwrap(), "yh");
        assert_eq!(after("z").unwrap(), "zh");
        assert_eq!(after("zz").unwrap(), "zzh");
    }

    #[test]
    fn test_empty_bounds_return_midpoint() {
        assert_eq!(before("").unwrap(), "m");
        assert_eq!(after("").unwrap(), "m");
    }

    // ── validity ────────────────────────────────────────────────────────

    #[test]
    fn test_is_valid() {
        assert!(is_valid("m"));
        assert!(is_valid("0"));
        assert!(is_valid("00"));
        assert!(is_valid("a0z9"));
        assert!(!is_valid(""));
        assert!(!is_valid("M"));
        assert!(!is_valid("a-b"));
    }

    #[test]
    fn test_validate_order() {
        assert!(validate_order(&["a", "b", "c"]));
        assert!(validate_order(&["0", "00", "001"]));
        assert!(!validate_order(&["a", "a"]));
        assert!(!validate_order(&["b", "a"]));
        assert!(validate_order::<&str>(&[]));
        assert!(validate_order(&["only"]));
    }

    // ── growth ──────────────────────────────────────────────────────────

    #[test]
    fn test_bounded_growth_appending() {
        let mut prev = "a".to_string();
        for _ in 0..100 {
            let next = between(Some(&prev), None).unwrap();
            assert!(next.as_str() > prev.as_str());
            assert!(next.len() < 20, "index grew too long: {next:?}");
            prev = next;
        }
    }

    #[test]
    fn test_bisection_stays_ordered() {
        // Repeatedly insert just after the head of a two-element list.
        let lo = "m".to_string();
        let mut hi = after("m").unwrap();
        for _ in 0..100 {
            let k = between(Some(&lo), Some(&hi)).unwrap();
            assert!(lo.as_str() < k.as_str() && k.as_str() < hi.as_str());
            hi = k;
        }
    }

    // ── jitter ──────────────────────────────────────────────────────────

    #[test]
    fn test_jitter_is_deterministic_per_seed() {
        let mut a = RngJitter::seeded(42);
        let mut b = RngJitter::seeded(42);
        let ka = between_jittered(Some("a"), Some("z"), &mut a).unwrap();
        let kb = between_jittered(Some("a"), Some("z"), &mut b).unwrap();
        assert_eq!(ka, kb);
    }

    #[test]
    fn test_jitter_stays_in_interval() {
        let mut j = RngJitter::seeded(7);
        for _ in 0..200 {
            let k = between_jittered(Some("mm"), Some("mn"), &mut j).unwrap();
            assert!("mm" < k.as_str() && k.as_str() < "mn", "escaped: {k:?}");
        }
    }

    #[test]
    fn test_no_jitter_matches_plain_between() {
        let mut none = NoJitter;
        assert_eq!(
            between_jittered(Some("a"), Some("z"), &mut none).unwrap(),
            between(Some("a"), Some("z")).unwrap()
        );
    }

    #[test]
    fn test_jitter_never_extends_long_indices() {
        let long = "abcdefghij"; // len 10 == MAX_JITTERED_LEN
        let mut j = RngJitter::seeded(3);
        for _ in 0..50 {
            let k = between_jittered(Some(long), None, &mut j).unwrap();
            assert_eq!(k, after(long).unwrap());
        }
    }

    // ── generate ────────────────────────────────────────────────────────

    #[test]
    fn test_generate_is_strictly_increasing() {
        let mut j = NoJitter;
        let ks = generate(None, None, 12, &mut j).unwrap();
        assert_eq!(ks.len(), 12);
        assert!(validate_order(&ks));
        assert_eq!(ks[0], "m");
    }

    #[test]
    fn test_generate_respects_bounds() {
        let mut j = NoJitter;
        let ks = generate(Some("c"), Some("d"), 8, &mut j).unwrap();
        for k in &ks {
            assert!("c" < k.as_str() && k.as_str() < "d");
        }
        assert!(validate_order(&ks));
    }
}
