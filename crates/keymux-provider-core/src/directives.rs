use std::collections::BTreeSet;

/// Everything extracted from a client auth header in one parsing pass.
///
/// The grammar is extensible: any `[TAG:value]` span whose tag is recognized
/// is consumed; unrecognized bracketed spans are forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthDirectives {
    /// Header value with directives stripped. `None` when nothing
    /// forwardable remains (bare `Bearer`, or empty after stripping).
    pub cleaned: Option<String>,
    /// Parsed `[STATUS_CODES:...]` set; `None` means the default policy.
    pub status_codes: Option<BTreeSet<u16>>,
    /// Literal `[ACCESS_KEY:...]` value.
    pub access_key: Option<String>,
}

const STATUS_CODES_TAG: &str = "STATUS_CODES:";
const ACCESS_KEY_TAG: &str = "ACCESS_KEY:";

const STATUS_CODE_MIN: u16 = 100;
const STATUS_CODE_MAX: u16 = 599;

/// Rotation policy used when the client supplies none.
pub fn default_rotation_codes() -> BTreeSet<u16> {
    BTreeSet::from([429])
}

/// Parses directives out of a raw auth header value and cleans it for
/// forwarding. Cleaning is idempotent.
pub fn parse_auth_header(raw: &str) -> AuthDirectives {
    let raw = raw.trim();
    let mut cleaned = String::with_capacity(raw.len());
    let mut status_codes: Option<BTreeSet<u16>> = None;
    let mut access_key: Option<String> = None;

    let mut rest = raw;
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']').map(|rel| open + rel) else {
            break;
        };
        let body = &rest[open + 1..close];
        if let Some(spec) = strip_tag(body, STATUS_CODES_TAG) {
            if let Some(codes) = parse_status_spec(spec) {
                status_codes = Some(codes);
            }
            cleaned.push_str(&rest[..open]);
        } else if let Some(value) = strip_tag(body, ACCESS_KEY_TAG) {
            access_key = Some(value.to_string());
            cleaned.push_str(&rest[..open]);
        } else {
            cleaned.push_str(&rest[..=close]);
        }
        rest = &rest[close + 1..];
    }
    cleaned.push_str(rest);

    AuthDirectives {
        cleaned: normalize_cleaned(cleaned),
        status_codes,
        access_key,
    }
}

/// Parses the status-code spec grammar: `INT | INT-INT | INT+ | INT=+`,
/// comma-separated. Invalid terms are skipped; everything is clamped to the
/// 100..=599 iteration bound. Returns `None` when no term contributes.
pub fn parse_status_spec(spec: &str) -> Option<BTreeSet<u16>> {
    let mut codes = BTreeSet::new();
    for term in spec.split(',') {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        if let Some(head) = term.strip_suffix("=+") {
            if let Ok(n) = head.trim().parse::<u16>() {
                insert_range(&mut codes, n, STATUS_CODE_MAX);
            }
        } else if let Some(head) = term.strip_suffix('+') {
            if let Ok(n) = head.trim().parse::<u16>() {
                insert_range(&mut codes, n.saturating_add(1), STATUS_CODE_MAX);
            }
        } else if let Some((a, b)) = term.split_once('-') {
            if let (Ok(a), Ok(b)) = (a.trim().parse::<u16>(), b.trim().parse::<u16>()) {
                insert_range(&mut codes, a, b);
            }
        } else if let Ok(n) = term.parse::<u16>() {
            insert_range(&mut codes, n, n);
        }
    }
    if codes.is_empty() { None } else { Some(codes) }
}

fn insert_range(codes: &mut BTreeSet<u16>, from: u16, to: u16) {
    let from = from.max(STATUS_CODE_MIN);
    let to = to.min(STATUS_CODE_MAX);
    for code in from..=to {
        codes.insert(code);
    }
}

fn strip_tag<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let head = body.get(..tag.len())?;
    if head.eq_ignore_ascii_case(tag) {
        body.get(tag.len()..)
    } else {
        None
    }
}

fn normalize_cleaned(value: String) -> Option<String> {
    // A bare bearer prefix means the client supplied no credential of its
    // own; drop the header so the provider client attaches a pool key.
    if value == "Bearer" || value == "Bearer " {
        return None;
    }
    if value.trim().is_empty() {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_both_directives_and_cleans() {
        let parsed =
            parse_auth_header("Bearer [STATUS_CODES:500,502-504][ACCESS_KEY:topsecret]sk-abc");
        assert_eq!(parsed.cleaned.as_deref(), Some("Bearer sk-abc"));
        assert_eq!(parsed.access_key.as_deref(), Some("topsecret"));
        assert_eq!(
            parsed.status_codes,
            Some(BTreeSet::from([500, 502, 503, 504]))
        );
    }

    #[test]
    fn directive_order_does_not_matter() {
        let parsed = parse_auth_header("Bearer [ACCESS_KEY:k][STATUS_CODES:429]token");
        assert_eq!(parsed.cleaned.as_deref(), Some("Bearer token"));
        assert_eq!(parsed.access_key.as_deref(), Some("k"));
        assert_eq!(parsed.status_codes, Some(BTreeSet::from([429])));
    }

    #[test]
    fn bare_bearer_is_dropped_after_stripping() {
        let parsed = parse_auth_header("Bearer [ACCESS_KEY:wrong]");
        assert_eq!(parsed.cleaned, None);
        assert_eq!(parsed.access_key.as_deref(), Some("wrong"));
    }

    #[test]
    fn empty_remainder_is_dropped() {
        let parsed = parse_auth_header("[STATUS_CODES:429]");
        assert_eq!(parsed.cleaned, None);
    }

    #[test]
    fn unrecognized_brackets_are_forwarded() {
        let parsed = parse_auth_header("Bearer [not-a-directive]tok");
        assert_eq!(parsed.cleaned.as_deref(), Some("Bearer [not-a-directive]tok"));
        assert_eq!(parsed.status_codes, None);
        assert_eq!(parsed.access_key, None);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let once = parse_auth_header("Bearer [STATUS_CODES:500+][ACCESS_KEY:x]sk-1");
        let twice = parse_auth_header(once.cleaned.as_deref().unwrap());
        assert_eq!(twice.cleaned, once.cleaned);
    }

    #[test]
    fn invalid_spec_falls_back_to_default_policy() {
        let parsed = parse_auth_header("Bearer [STATUS_CODES:abc,,]tok");
        assert_eq!(parsed.status_codes, None);
        assert_eq!(parsed.cleaned.as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn greater_than_expands_exclusively() {
        let codes = parse_status_spec("500+").unwrap();
        assert!(!codes.contains(&500));
        assert!(codes.contains(&501));
        assert!(codes.contains(&599));
        assert_eq!(codes.len(), 99);
    }

    #[test]
    fn greater_equal_expands_inclusively() {
        let codes = parse_status_spec("500=+").unwrap();
        assert!(codes.contains(&500));
        assert!(codes.contains(&599));
        assert_eq!(codes.len(), 100);
    }

    #[test]
    fn inverted_range_contributes_nothing() {
        assert_eq!(parse_status_spec("400-399"), None);
    }

    #[test]
    fn mixed_valid_and_invalid_terms() {
        let codes = parse_status_spec("429,xyz,500-502").unwrap();
        assert_eq!(codes, BTreeSet::from([429, 500, 501, 502]));
    }

    #[test]
    fn out_of_bound_codes_are_clamped_away() {
        assert_eq!(parse_status_spec("42"), None);
        let codes = parse_status_spec("590-700").unwrap();
        assert_eq!(codes.len(), 10);
        assert!(codes.contains(&599));
    }

    #[test]
    fn reparsing_sorted_set_is_stable() {
        let codes = parse_status_spec("502-504,429").unwrap();
        let spec: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
        let reparsed = parse_status_spec(&spec.join(",")).unwrap();
        assert_eq!(reparsed, codes);
    }
}
