//! Trace-context header parsing.
//!
//! # Responsibilities
//! - Parse W3C `traceparent` headers into a [`TraceContext`]
//! - Parse legacy `X-Cloud-Trace-Context` headers as a fallback
//! - Never fail: a malformed header yields an empty context
//!
//! # Design Decisions
//! - Both parsers are total functions; a partially-parsed header yields a
//!   partial context, never an error that blocks the request
//! - Legacy span ids are re-encoded as 16-char lowercase hex; candidates
//!   outside (0, 2^64) are dropped

/// Trace correlation data extracted from inbound request headers.
///
/// Created once per request by the trace-context middleware and immutable
/// afterwards. All fields are independently optional: whichever parts of a
/// header parsed are kept, the rest stay unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    /// Trace identifier. 32-char lowercase hex when it came from a W3C
    /// header; copied verbatim from the legacy header otherwise.
    pub trace_id: Option<String>,

    /// Span identifier, 16-char lowercase hex.
    pub span_id: Option<String>,

    /// Sampling decision. `None` means no header ever determined it,
    /// which the log formatter treats differently from `Some(false)`.
    pub sampled: Option<bool>,
}

impl TraceContext {
    /// Context with no trace information at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.trace_id.is_none() && self.span_id.is_none() && self.sampled.is_none()
    }

    /// Sampling decision as a plain flag, defaulting to not sampled when
    /// no header ever determined it.
    pub fn is_sampled(&self) -> bool {
        self.sampled.unwrap_or(false)
    }
}

/// Parse a W3C `traceparent` header.
///
/// Expected shape: `version-traceid-parentid-flags`, where version is 2
/// lowercase hex chars (not `ff`), traceid 32 (not all zero), parentid 16
/// (not all zero) and flags 2. A single leading or trailing whitespace
/// character is tolerated. Anything after a fourth `-` is ignored.
///
/// Returns an empty context if the header does not match.
pub fn parse_traceparent(header: &str) -> TraceContext {
    let value = trim_one(header);

    let mut parts = value.splitn(5, '-');
    let (version, trace_id, parent_id, flags) = match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some(v), Some(t), Some(p), Some(f)) => (v, t, p, f),
        _ => return TraceContext::empty(),
    };

    if !is_lower_hex(version, 2) || version == "ff" {
        return TraceContext::empty();
    }
    if !is_lower_hex(trace_id, 32) || is_all_zero(trace_id) {
        return TraceContext::empty();
    }
    if !is_lower_hex(parent_id, 16) || is_all_zero(parent_id) {
        return TraceContext::empty();
    }
    let flags_byte = match (is_lower_hex(flags, 2), u8::from_str_radix(flags, 16)) {
        (true, Ok(b)) => b,
        _ => return TraceContext::empty(),
    };

    TraceContext {
        trace_id: Some(trace_id.to_string()),
        span_id: Some(parent_id.to_string()),
        sampled: Some(flags_byte & 0x01 == 0x01),
    }
}

/// Parse a legacy `X-Cloud-Trace-Context` header.
///
/// Loose grammar: `TRACE_ID[/SPAN_ID][;o=OPTIONS]`. The trace id is the
/// leading run of word characters and hyphens, passed through verbatim
/// without hex validation. The span id candidate is only accepted if it
/// parses as a base-10 integer strictly between 0 and 2^64, and is then
/// re-encoded as zero-padded 16-char lowercase hex; otherwise it is
/// dropped. `o=1` marks the request as sampled.
pub fn parse_cloud_trace_context(header: &str) -> TraceContext {
    let (main, options) = match header.split_once(";o=") {
        Some((main, options)) => (main, Some(options)),
        None => (header, None),
    };

    let (trace_part, span_part) = match main.split_once('/') {
        Some((trace, span)) => (trace, Some(span)),
        None => (main, None),
    };

    let trace_id = leading_word_run(trace_part);
    if trace_id.is_empty() {
        return TraceContext::empty();
    }

    let span_id = span_part.and_then(decode_span_id);

    // An options digit other than "1" still counts as an explicit
    // sampling decision; only its absence leaves `sampled` undetermined
    // relative to the rest of the header.
    let sampled = Some(matches!(
        options.and_then(|o| o.chars().next()),
        Some('1')
    ));

    TraceContext {
        trace_id: Some(trace_id.to_string()),
        span_id,
        sampled,
    }
}

/// Accept a decimal span-id candidate in (0, 2^64) and re-encode it as
/// 16-char lowercase hex. Anything else is discarded.
fn decode_span_id(candidate: &str) -> Option<String> {
    let digits = leading_word_run(candidate);
    match digits.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(format!("{n:016x}")),
    }
}

fn trim_one(s: &str) -> &str {
    let s = s.strip_prefix(|c: char| c.is_whitespace()).unwrap_or(s);
    s.strip_suffix(|c: char| c.is_whitespace()).unwrap_or(s)
}

fn is_lower_hex(s: &str, width: usize) -> bool {
    s.len() == width
        && s.bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn is_all_zero(s: &str) -> bool {
    s.bytes().all(|b| b == b'0')
}

fn leading_word_run(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-')
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACEPARENT: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

    #[test]
    fn traceparent_sampled() {
        let ctx = parse_traceparent(TRACEPARENT);
        assert_eq!(
            ctx.trace_id.as_deref(),
            Some("0af7651916cd43dd8448eb211c80319c")
        );
        assert_eq!(ctx.span_id.as_deref(), Some("b7ad6b7169203331"));
        assert_eq!(ctx.sampled, Some(true));
    }

    #[test]
    fn traceparent_not_sampled() {
        let ctx = parse_traceparent("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-00");
        assert_eq!(ctx.sampled, Some(false));
        assert!(ctx.trace_id.is_some());
    }

    #[test]
    fn traceparent_flags_lsb_only() {
        // 0xfd has bit0 clear, 0xfb has bit0 set
        let ctx = parse_traceparent("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-fd");
        assert_eq!(ctx.sampled, Some(false));
        let ctx = parse_traceparent("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-fb");
        assert_eq!(ctx.sampled, Some(true));
    }

    #[test]
    fn traceparent_tolerates_single_surrounding_whitespace() {
        let padded = format!(" {TRACEPARENT}\t");
        assert!(parse_traceparent(&padded).trace_id.is_some());
    }

    #[test]
    fn traceparent_allows_trailing_extension() {
        let extended = format!("{TRACEPARENT}-congo=t61rcWkgMzE");
        let ctx = parse_traceparent(&extended);
        assert_eq!(ctx.span_id.as_deref(), Some("b7ad6b7169203331"));
    }

    #[test]
    fn traceparent_rejects_version_ff() {
        let ctx = parse_traceparent("ff-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01");
        assert!(ctx.is_empty());
    }

    #[test]
    fn traceparent_rejects_all_zero_ids() {
        let zero_trace = "00-00000000000000000000000000000000-b7ad6b7169203331-01";
        assert!(parse_traceparent(zero_trace).is_empty());
        let zero_parent = "00-0af7651916cd43dd8448eb211c80319c-0000000000000000-01";
        assert!(parse_traceparent(zero_parent).is_empty());
    }

    #[test]
    fn traceparent_rejects_bad_widths_and_non_hex() {
        // trace id one char short
        assert!(parse_traceparent("00-0af7651916cd43dd8448eb211c80319-b7ad6b7169203331-01").is_empty());
        // uppercase hex in parent id
        assert!(parse_traceparent("00-0af7651916cd43dd8448eb211c80319c-B7AD6B7169203331-01").is_empty());
        // non-hex character in trace id
        assert!(parse_traceparent("00-0af7651916cd43dd8448eb211c80319z-b7ad6b7169203331-01").is_empty());
        // missing flags field
        assert!(parse_traceparent("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331").is_empty());
    }

    #[test]
    fn cloud_trace_full_header() {
        let ctx = parse_cloud_trace_context("105445aa7843bc8bf206b12000100000/1;o=1");
        assert_eq!(
            ctx.trace_id.as_deref(),
            Some("105445aa7843bc8bf206b12000100000")
        );
        assert_eq!(ctx.span_id.as_deref(), Some("0000000000000001"));
        assert_eq!(ctx.sampled, Some(true));
    }

    #[test]
    fn cloud_trace_opt_out() {
        let ctx = parse_cloud_trace_context("105445aa7843bc8bf206b12000100000/1;o=0");
        assert_eq!(ctx.sampled, Some(false));
    }

    #[test]
    fn cloud_trace_span_id_re_encoded_as_hex() {
        let ctx = parse_cloud_trace_context("abc/1234567890;o=1");
        assert_eq!(ctx.span_id.as_deref(), Some("00000000499602d2"));
    }

    #[test]
    fn cloud_trace_zero_span_id_dropped() {
        let ctx = parse_cloud_trace_context("105445aa7843bc8bf206b12000100000/0;o=1");
        assert!(ctx.trace_id.is_some());
        assert!(ctx.span_id.is_none());
    }

    #[test]
    fn cloud_trace_overlong_span_id_dropped() {
        // 2^64 exactly, one past the maximum accepted value
        let ctx = parse_cloud_trace_context("105445aa7843bc8bf206b12000100000/18446744073709551616");
        assert!(ctx.trace_id.is_some());
        assert!(ctx.span_id.is_none());
    }

    #[test]
    fn cloud_trace_max_span_id_kept() {
        let ctx = parse_cloud_trace_context("abc/18446744073709551615");
        assert_eq!(ctx.span_id.as_deref(), Some("ffffffffffffffff"));
    }

    #[test]
    fn cloud_trace_non_numeric_span_id_dropped() {
        let ctx = parse_cloud_trace_context("105445aa7843bc8bf206b12000100000/span;o=1");
        assert!(ctx.trace_id.is_some());
        assert!(ctx.span_id.is_none());
    }

    #[test]
    fn cloud_trace_id_passed_through_verbatim() {
        // No hex validation and no case folding on the legacy trace id.
        let ctx = parse_cloud_trace_context("MY-TRACE_id-123");
        assert_eq!(ctx.trace_id.as_deref(), Some("MY-TRACE_id-123"));
        assert!(ctx.span_id.is_none());
        assert_eq!(ctx.sampled, Some(false));
    }

    #[test]
    fn cloud_trace_garbage_yields_empty_context() {
        assert!(parse_cloud_trace_context("").is_empty());
        assert!(parse_cloud_trace_context("/1;o=1").is_empty());
    }
}
