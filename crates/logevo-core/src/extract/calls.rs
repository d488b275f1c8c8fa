//! Logging call-site extraction from parsed method bodies.
//!
//! A call is a logging call site when it has arguments, its caller name hits
//! the allow pattern without hitting the block pattern, and (for dotted names)
//! its trailing segment is a known verbosity or print token.

use std::sync::LazyLock;

use regex::Regex;

use crate::extract::canonical::canonical_text;
use crate::models::{CallExpr, CallSite, MethodFragment};

// ---------------------------------------------------------------------------
// Regex patterns (compiled once via LazyLock)
// ---------------------------------------------------------------------------

static CALLER_ALLOW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(log|system\.out|system\.err|timber)").unwrap());

static CALLER_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(dialog|login|logout|loggedin|loggedout|catalog|logical|blog|logo)").unwrap()
});

static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(w|e|v|i|d|wtf|warn|warning|error|verbose|info|debug|severe|fine|fatal|trace|print|printf|println|log)$",
    )
    .unwrap()
});

// ---------------------------------------------------------------------------
// Name helpers
// ---------------------------------------------------------------------------

/// Split a call name at its last dot into (caller, level).
///
/// `Log.d` -> `("Log", Some("d"))`, `log` -> `("log", None)`.
pub fn split_call_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((caller, level)) => (caller, Some(level)),
        None => (name, None),
    }
}

/// The verbosity token of a call name: the suffix after the last dot, or
/// the whole name when undotted.
pub fn verbosity_token(name: &str) -> &str {
    split_call_name(name).1.unwrap_or(name)
}

/// Decide whether a call with the given name is a logging call site.
pub fn is_logging_call(name: &str, has_arguments: bool) -> bool {
    if !has_arguments {
        return false;
    }

    let (caller, level) = split_call_name(name);
    if !CALLER_ALLOW_RE.is_match(caller) {
        return false;
    }
    if CALLER_BLOCK_RE.is_match(caller) {
        return false;
    }
    match level {
        Some(level) => LEVEL_RE.is_match(level),
        None => true,
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Build a [`CallSite`] from a call expression without applying the filter.
pub fn call_site_from_expr(call: &CallExpr) -> CallSite {
    CallSite {
        name: call.name.clone(),
        verbosity: verbosity_token(&call.name).to_string(),
        text: canonical_text(&call.source),
        source: call.source.clone(),
        arguments: call.arguments.clone(),
    }
}

/// Extract the logging call sites of a method in document order.
pub fn extract_call_sites(method: &MethodFragment) -> Vec<CallSite> {
    method
        .calls()
        .into_iter()
        .filter(|call| is_logging_call(&call.name, !call.arguments.is_empty()))
        .map(call_site_from_expr)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Argument, BodyNode, Operand};

    fn text_arg(s: &str) -> Argument {
        Argument::new(s, vec![Operand::Text(s.to_string())])
    }

    fn call(name: &str, args: Vec<Argument>) -> CallExpr {
        let rendered: Vec<&str> = args.iter().map(|a| a.source.as_str()).collect();
        let source = format!("{}({})", name, rendered.join(", "));
        CallExpr::new(name, source, args)
    }

    #[test]
    fn test_split_call_name() {
        assert_eq!(split_call_name("Log.d"), ("Log", Some("d")));
        assert_eq!(
            split_call_name("System.out.println"),
            ("System.out", Some("println"))
        );
        assert_eq!(split_call_name("log"), ("log", None));
        assert_eq!(verbosity_token("Timber.w"), "w");
        assert_eq!(verbosity_token("log"), "log");
    }

    #[test]
    fn test_is_logging_call_accepts_common_loggers() {
        assert!(is_logging_call("Log.d", true));
        assert!(is_logging_call("LOGGER.warning", true));
        assert!(is_logging_call("System.out.println", true));
        assert!(is_logging_call("System.err.printf", true));
        assert!(is_logging_call("Timber.wtf", true));
        assert!(is_logging_call("log", true));
        assert!(is_logging_call("mLogger.Info", true));
    }

    #[test]
    fn test_is_logging_call_rejects_zero_arguments() {
        assert!(!is_logging_call("Log.d", false));
    }

    #[test]
    fn test_is_logging_call_rejects_blocked_callers() {
        assert!(!is_logging_call("dialog.show", true));
        assert!(!is_logging_call("loginManager.e", true));
        assert!(!is_logging_call("catalog.i", true));
        assert!(!is_logging_call("blogClient.d", true));
        assert!(!is_logging_call("Logout", true));
    }

    #[test]
    fn test_is_logging_call_rejects_unknown_levels_and_callers() {
        assert!(!is_logging_call("Log.isLoggable", true));
        assert!(!is_logging_call("logger.setLevel", true));
        assert!(!is_logging_call("foo.d", true));
        assert!(!is_logging_call("print", true));
    }

    #[test]
    fn test_extract_call_sites_filters_and_orders() {
        let body = vec![
            BodyNode::Call(call("Log.d", vec![text_arg("\"first\"")])),
            BodyNode::Call(call("helper.run", vec![text_arg("\"x\"")])),
            BodyNode::Block(vec![
                BodyNode::Call(call("Log.isLoggable", vec![text_arg("TAG")])),
                BodyNode::Call(call("Log.e", vec![text_arg("\"second\"")])),
            ]),
            BodyNode::Call(call("Log.i", vec![])),
        ];
        let method = MethodFragment::new("run", vec![], "", "", body);
        let sites = extract_call_sites(&method);
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "Log.d");
        assert_eq!(sites[0].verbosity, "d");
        assert_eq!(sites[0].text, "Log.d(\"first\")");
        assert_eq!(sites[1].name, "Log.e");
    }

    #[test]
    fn test_extract_call_sites_is_deterministic() {
        let body = vec![
            BodyNode::Call(call("Log.d", vec![text_arg("\"a\"")])),
            BodyNode::Call(call("Log.d", vec![text_arg("\"a\"")])),
            BodyNode::Call(call("Log.w", vec![text_arg("\"b\"")])),
        ];
        let method = MethodFragment::new("run", vec![], "", "", body);
        assert_eq!(extract_call_sites(&method), extract_call_sites(&method));
        assert_eq!(extract_call_sites(&method).len(), 3);
    }

    #[test]
    fn test_empty_method_yields_no_call_sites() {
        let method = MethodFragment::new("", vec![], "", "", vec![]);
        assert!(extract_call_sites(&method).is_empty());
    }
}
