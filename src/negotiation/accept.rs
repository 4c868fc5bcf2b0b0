//! Accept header parsing and media type selection.
//!
//! # Responsibilities
//! - Decide whether a client explicitly asked for the TOON media type
//! - Parse Accept headers into quality-ranked media ranges
//! - Pick the best supported content type for a request
//!
//! # Design Decisions
//! - Header length and media range count are capped before parsing
//! - Quality values are read up to the first non-numeric character, and fall
//!   back to 1.0 when no number leads the value
//! - Ranking is a stable sort, so equal qualities keep header order

use thiserror::Error;

use super::{MAX_ACCEPT_HEADER_LENGTH, MAX_MEDIA_TYPES, TOON_CONTENT_TYPE};

/// Errors produced while parsing an Accept header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    /// The raw header is longer than the configured limit.
    #[error("Accept header exceeds maximum length ({limit} bytes). Received {length} bytes.")]
    HeaderTooLarge { length: usize, limit: usize },
}

/// DoS guards applied to Accept headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptLimits {
    /// Maximum header length in bytes.
    pub max_header_length: usize,
    /// Maximum number of comma-separated entries considered.
    pub max_media_types: usize,
}

impl Default for AcceptLimits {
    fn default() -> Self {
        Self {
            max_header_length: MAX_ACCEPT_HEADER_LENGTH,
            max_media_types: MAX_MEDIA_TYPES,
        }
    }
}

/// A single media range from an Accept header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTypeRange {
    /// Lowercased `type/subtype`, possibly containing `*`.
    pub media_type: String,
    /// Preference weight in `[0, 1]`.
    pub quality: f32,
}

/// Check whether the Accept header explicitly asks for `target`.
///
/// Matches the exact type or a type-level wildcard such as `text/*`. A bare
/// `*/*` does not count: TOON is only served to clients that request it.
pub fn accepts_target(accept: Option<&str>, target: &str) -> bool {
    let Some(accept) = accept else {
        return false;
    };

    let normalized = accept.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return false;
    }

    let target = target.to_ascii_lowercase();
    if normalized.contains(&target) {
        return true;
    }

    let primary = target.split('/').next().unwrap_or_default();
    normalized.contains(&format!("{primary}/*"))
}

/// Ranked variant of [`accepts_target`] used on the response path.
///
/// The header goes through [`parse_accept_header`] first, so `limits` apply
/// and `q=0` entries count as refusals. A range accepts `target` when it names
/// it exactly or names its `{primary}/*`; `*/*` still does not.
pub fn accepts_target_ranked(
    accept: Option<&str>,
    target: &str,
    limits: &AcceptLimits,
) -> Result<bool, NegotiationError> {
    let Some(accept) = accept else {
        return Ok(false);
    };

    let target = target.to_ascii_lowercase();
    let wildcard = match target.split_once('/') {
        Some((primary, _)) => format!("{primary}/*"),
        None => return Ok(false),
    };

    Ok(parse_accept_header(accept.trim(), limits)?
        .iter()
        .filter(|range| range.quality > 0.0)
        .any(|range| range.media_type == target || range.media_type == wildcard))
}

/// Same as [`accepts_target`] with the default `text/toon` type.
pub fn accepts_toon(accept: Option<&str>) -> bool {
    accepts_target(accept, TOON_CONTENT_TYPE)
}

/// Parse an Accept header into media ranges, highest quality first.
pub fn parse_accept_header(
    accept: &str,
    limits: &AcceptLimits,
) -> Result<Vec<MediaTypeRange>, NegotiationError> {
    if accept.is_empty() {
        return Ok(Vec::new());
    }

    if accept.len() > limits.max_header_length {
        return Err(NegotiationError::HeaderTooLarge {
            length: accept.len(),
            limit: limits.max_header_length,
        });
    }

    let mut ranges: Vec<MediaTypeRange> = accept
        .split(',')
        .take(limits.max_media_types)
        .map(parse_media_range)
        .collect();

    // sort_by is stable: equal qualities keep their header order
    ranges.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    Ok(ranges)
}

fn parse_media_range(entry: &str) -> MediaTypeRange {
    let mut params = entry.trim().split(';');
    let media_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();

    let quality = params
        .map(str::trim)
        .find(|p| p.starts_with("q="))
        .and_then(|p| leading_float(&p[2..]))
        .filter(|q| !q.is_nan())
        .map(|q| q.clamp(0.0, 1.0))
        .unwrap_or(1.0);

    MediaTypeRange { media_type, quality }
}

/// Longest numeric prefix of `text`, so `0.5abc` reads as `0.5`.
fn leading_float(text: &str) -> Option<f32> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let whole = digits_from(end);
    end += whole;

    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if fraction > 0 {
            end += 1 + fraction;
        }
    }
    if whole == 0 && fraction == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent = digits_from(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }

    text[..end].parse().ok()
}

/// Choose the best entry of `supported` for the given Accept header.
///
/// With no header the first supported type wins. Ranges with `q=0` are
/// explicit rejections and are skipped. Returns `Ok(None)` when nothing in
/// the header matches.
pub fn negotiate_content_type<'a, S: AsRef<str>>(
    accept: Option<&str>,
    supported: &'a [S],
    limits: &AcceptLimits,
) -> Result<Option<&'a str>, NegotiationError> {
    let supported: Vec<&'a str> = supported.iter().map(|s| s.as_ref()).collect();
    let first = supported.first().copied();
    let Some(accept) = accept.filter(|a| !a.is_empty()) else {
        return Ok(first);
    };

    for range in parse_accept_header(accept, limits)? {
        if range.quality == 0.0 {
            continue;
        }

        if let Some(exact) = supported
            .iter()
            .find(|s| s.eq_ignore_ascii_case(&range.media_type))
        {
            return Ok(Some(*exact));
        }

        if range.media_type == "*/*" {
            return Ok(first);
        }

        if let Some(prefix) = range.media_type.strip_suffix("/*") {
            let matched = supported.iter().find(|s| {
                s.split_once('/')
                    .is_some_and(|(primary, _)| primary.eq_ignore_ascii_case(prefix))
            });
            if let Some(matched) = matched {
                return Ok(Some(*matched));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORTED: [&str; 2] = ["text/toon", "application/json"];

    #[test]
    fn test_accepts_target_table() {
        assert!(!accepts_toon(None));
        assert!(!accepts_toon(Some("")));
        assert!(!accepts_toon(Some("*/*")));
        assert!(!accepts_toon(Some("application/json")));
        assert!(accepts_toon(Some("text/toon")));
        assert!(accepts_toon(Some("TEXT/TOON")));
        assert!(accepts_toon(Some("text/*")));
        assert!(accepts_toon(Some("application/json, text/toon;q=0.5")));
    }

    #[test]
    fn test_accepts_custom_target() {
        let target = "application/x-toon";
        assert!(accepts_target(Some("application/x-toon"), target));
        assert!(accepts_target(Some("application/*"), target));
        assert!(!accepts_target(Some("text/*"), target));
    }

    #[test]
    fn test_parse_sorts_by_quality() {
        let ranges = parse_accept_header(
            "text/html;q=0.5, application/json, text/toon;q=0.9",
            &AcceptLimits::default(),
        )
        .unwrap();

        let types: Vec<_> = ranges.iter().map(|r| r.media_type.as_str()).collect();
        assert_eq!(types, ["application/json", "text/toon", "text/html"]);
        assert_eq!(ranges[0].quality, 1.0);
        assert_eq!(ranges[2].quality, 0.5);
    }

    #[test]
    fn test_parse_is_stable_on_ties() {
        let ranges =
            parse_accept_header("a/b;q=0.5, c/d, e/f;q=0.5, g/h", &AcceptLimits::default())
                .unwrap();
        let types: Vec<_> = ranges.iter().map(|r| r.media_type.as_str()).collect();
        assert_eq!(types, ["c/d", "g/h", "a/b", "e/f"]);
    }

    #[test]
    fn test_parse_quality_edge_cases() {
        let ranges = parse_accept_header(
            "a/a;q=abc, b/b;q=2, c/c;q=-1, d/d;level=1;q=0.3",
            &AcceptLimits::default(),
        )
        .unwrap();
        let quality = |t: &str| ranges.iter().find(|r| r.media_type == t).unwrap().quality;

        assert_eq!(quality("a/a"), 1.0);
        assert_eq!(quality("b/b"), 1.0);
        assert_eq!(quality("c/c"), 0.0);
        assert!((quality("d/d") - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_quality_reads_numeric_prefix() {
        let ranges = parse_accept_header(
            "a/a;q=0.5abc, b/b;q=.25;x=1, c/c;q=1e-1x, d/d;q=-0.2, e/e;q=x0.4, f/f;q=0.7.1",
            &AcceptLimits::default(),
        )
        .unwrap();
        let quality = |t: &str| ranges.iter().find(|r| r.media_type == t).unwrap().quality;

        assert!((quality("a/a") - 0.5).abs() < f32::EPSILON);
        assert!((quality("b/b") - 0.25).abs() < f32::EPSILON);
        assert!((quality("c/c") - 0.1).abs() < f32::EPSILON);
        assert_eq!(quality("d/d"), 0.0);
        assert_eq!(quality("e/e"), 1.0);
        assert!((quality("f/f") - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_accepts_target_ranked() {
        let limits = AcceptLimits::default();
        let check = |accept: Option<&str>| accepts_target_ranked(accept, "text/toon", &limits);

        assert!(check(Some("text/toon")).unwrap());
        assert!(check(Some("Application/JSON, TEXT/*;q=0.5")).unwrap());
        assert!(!check(Some("*/*")).unwrap());
        assert!(!check(Some("text/toon;q=0")).unwrap());
        assert!(!check(Some("text/toonish")).unwrap());
        assert!(!check(Some("")).unwrap());
        assert!(!check(None).unwrap());
    }

    #[test]
    fn test_ranked_acceptance_honors_limits() {
        let limits = AcceptLimits {
            max_header_length: 64,
            max_media_types: 2,
        };

        let long = format!("text/toon, {}", "a".repeat(64));
        assert!(matches!(
            accepts_target_ranked(Some(&long), "text/toon", &limits),
            Err(NegotiationError::HeaderTooLarge { limit: 64, .. })
        ));

        let crowded = "a/a, b/b, text/toon";
        assert!(!accepts_target_ranked(Some(crowded), "text/toon", &limits).unwrap());
    }

    #[test]
    fn test_parse_empty_header() {
        assert!(parse_accept_header("", &AcceptLimits::default()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_oversized_header() {
        let header = format!("text/toon, {}", "a".repeat(MAX_ACCEPT_HEADER_LENGTH));
        let err = parse_accept_header(&header, &AcceptLimits::default()).unwrap_err();
        assert_eq!(
            err,
            NegotiationError::HeaderTooLarge {
                length: header.len(),
                limit: MAX_ACCEPT_HEADER_LENGTH
            }
        );
    }

    #[test]
    fn test_parse_truncates_media_types() {
        let header = (0..50)
            .map(|i| format!("type{i}/sub"))
            .collect::<Vec<_>>()
            .join(", ");
        let ranges = parse_accept_header(&header, &AcceptLimits::default()).unwrap();
        assert_eq!(ranges.len(), MAX_MEDIA_TYPES);
        assert_eq!(ranges[0].media_type, "type0/sub");
        assert_eq!(ranges[MAX_MEDIA_TYPES - 1].media_type, "type19/sub");
    }

    #[test]
    fn test_negotiate_defaults_to_first() {
        let limits = AcceptLimits::default();
        assert_eq!(negotiate_content_type(None, &SUPPORTED, &limits).unwrap(), Some("text/toon"));

        let empty: [&str; 0] = [];
        assert_eq!(negotiate_content_type(None, &empty, &limits).unwrap(), None);
    }

    #[test]
    fn test_negotiate_respects_quality() {
        let limits = AcceptLimits::default();
        assert_eq!(
            negotiate_content_type(
                Some("application/json;q=0.9, text/toon;q=0.5"),
                &SUPPORTED,
                &limits
            )
            .unwrap(),
            Some("application/json")
        );
    }

    #[test]
    fn test_negotiate_skips_rejected_types() {
        let limits = AcceptLimits::default();
        assert_eq!(
            negotiate_content_type(Some("text/toon;q=0, application/json"), &SUPPORTED, &limits)
                .unwrap(),
            Some("application/json")
        );
        assert_eq!(
            negotiate_content_type(Some("text/toon;q=0"), &SUPPORTED, &limits).unwrap(),
            None
        );
    }

    #[test]
    fn test_negotiate_wildcards() {
        let limits = AcceptLimits::default();
        assert_eq!(
            negotiate_content_type(Some("*/*"), &SUPPORTED, &limits).unwrap(),
            Some("text/toon")
        );
        assert_eq!(
            negotiate_content_type(Some("application/*"), &SUPPORTED, &limits).unwrap(),
            Some("application/json")
        );
        assert_eq!(
            negotiate_content_type(Some("image/*, audio/mpeg"), &SUPPORTED, &limits).unwrap(),
            None
        );
    }

    #[test]
    fn test_negotiate_preserves_supported_casing() {
        let supported = ["Text/TOON", "application/json"];
        assert_eq!(
            negotiate_content_type(Some("text/toon"), &supported, &AcceptLimits::default())
                .unwrap(),
            Some("Text/TOON")
        );
    }

    #[test]
    fn test_negotiate_propagates_oversized_header() {
        let header = "x".repeat(MAX_ACCEPT_HEADER_LENGTH + 1);
        assert!(negotiate_content_type(Some(&header), &SUPPORTED, &AcceptLimits::default())
            .is_err());
    }
}
