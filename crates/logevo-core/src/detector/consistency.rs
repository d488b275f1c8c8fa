//! Consistency of variable updates in logging calls.
//!
//! A variable change in a log call is consistent when the same diff also
//! touches one of the call's variables: an added assignment to it, or an
//! added declaration/block header mentioning it.

use std::collections::HashSet;

use crate::extract::calls::split_call_name;
use crate::extract::canonical::canonical_text;
use crate::models::{Argument, CallSite, UpdateDetail};

/// Added lines of a unified diff, without the leading `+`.
///
/// File headers (`+++ b/...`) are skipped.
pub fn added_lines(diff: &str) -> Vec<&str> {
    diff.lines()
        .filter(|line| line.starts_with('+') && !line.starts_with("+++"))
        .map(|line| &line[1..])
        .collect()
}

/// Variable names referenced by a call: plain variables of every argument,
/// plus the receiver (or bare name) of every nested call and, recursively,
/// that call's own variables.
pub fn call_variables(site: &CallSite) -> HashSet<String> {
    let mut out = HashSet::new();
    collect_variables(&site.arguments, &mut out);
    out
}

fn collect_variables(arguments: &[Argument], out: &mut HashSet<String>) {
    for argument in arguments {
        out.extend(argument.vars().map(str::to_string));
        for call in argument.calls() {
            let (caller, _) = split_call_name(&call.name);
            out.insert(caller.to_string());
            collect_variables(&call.arguments, out);
        }
    }
}

/// Decide whether an updated call's variable change is backed by a code edit.
///
/// Returns `None` when the question cannot be evaluated: no update detail,
/// a detail without a variable dimension, or no diff text.
pub fn is_consistent_update(
    site: &CallSite,
    detail: Option<UpdateDetail>,
    added: Option<&[&str]>,
) -> Option<bool> {
    let detail = detail?;
    if !detail.involves_var() {
        return None;
    }
    let added = added?;

    let variables = call_variables(site);
    Some(added.iter().any(|line| line_touches(line.trim(), &site.text, &variables)))
}

fn line_touches(line: &str, call_text: &str, variables: &HashSet<String>) -> bool {
    if line.starts_with("//") || line.starts_with("/*") {
        return false;
    }
    if is_call_line(line, call_text) {
        return false;
    }

    if line.ends_with(';') && line.contains('=') {
        return assignment_target(line).is_some_and(|target| variables.contains(target));
    }
    if line.ends_with('{') {
        return line
            .split(|c: char| c == '(' || c == ')' || c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .any(|token| variables.contains(token));
    }
    false
}

/// The added line holding the call itself.
fn is_call_line(line: &str, call_text: &str) -> bool {
    let statement = canonical_text(line.trim_end_matches(';'));
    !statement.is_empty() && call_text.contains(&statement)
}

/// Token left of the first `=`, with compound-assignment operators removed.
/// `None` if that side is empty or sits inside a string literal.
fn assignment_target(line: &str) -> Option<&str> {
    let lhs = line.split('=').next()?;
    if lhs.trim().is_empty() || lhs.contains('"') {
        return None;
    }
    lhs.trim_end_matches(|c: char| c.is_whitespace() || "+-*/%&|^<>!".contains(c))
        .split_whitespace()
        .last()
}
