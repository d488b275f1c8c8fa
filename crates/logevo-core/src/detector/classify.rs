//! Change classification for updated call-site pairs, plus the at-rest
//! argument shape and verbosity class of a single call site.

use crate::extract::calls::split_call_name;
use crate::extract::canonical::canonical_text;
use crate::models::{
    Argument, ArgumentChange, ArgumentType, CallSite, CallerChange, UpdateDetail, VerbosityClass,
};

/// Compare the callee names of an updated pair.
///
/// Names are split at their first dot: an unchanged receiver root with a
/// different remainder is a verbosity change, anything else a logging
/// method change. Identical names report nothing.
pub fn caller_change(old: &CallSite, new: &CallSite) -> Option<CallerChange> {
    if old.name == new.name {
        return None;
    }
    match (old.name.split_once('.'), new.name.split_once('.')) {
        (Some((old_root, old_rest)), Some((new_root, new_rest))) => {
            if old_root != new_root {
                Some(CallerChange::LoggingMethod)
            } else if old_rest != new_rest {
                Some(CallerChange::Verbosity)
            } else {
                None
            }
        }
        _ => Some(CallerChange::LoggingMethod),
    }
}

/// Serialized TEXT / VAR / CALL components of one argument slot.
#[derive(Debug, Default, PartialEq)]
struct Slot {
    texts: Vec<String>,
    vars: Vec<String>,
    calls: Vec<String>,
}

impl Slot {
    fn of(argument: &Argument) -> Self {
        Self {
            texts: argument.texts().map(str::to_string).collect(),
            vars: argument.vars().map(str::to_string).collect(),
            calls: argument.calls().map(|c| canonical_text(&c.source)).collect(),
        }
    }
}

/// A call without arguments still occupies one (empty) slot.
fn slots(site: &CallSite) -> Vec<Slot> {
    if site.arguments.is_empty() {
        return vec![Slot::default()];
    }
    site.arguments.iter().map(Slot::of).collect()
}

/// Compare the arguments of an updated pair.
///
/// Differing arity short-circuits to [`ArgumentChange::Added`] or
/// [`ArgumentChange::Deleted`]. Otherwise each position is compared per
/// dimension and the changed dimensions select one [`UpdateDetail`]; no
/// changed dimension yields `None`.
pub fn argument_change(old: &CallSite, new: &CallSite) -> Option<ArgumentChange> {
    let old_slots = slots(old);
    let new_slots = slots(new);

    if old_slots.len() > new_slots.len() {
        return Some(ArgumentChange::Deleted);
    }
    if old_slots.len() < new_slots.len() {
        return Some(ArgumentChange::Added);
    }

    let (mut text, mut var, mut call) = (false, false, false);
    for (before, after) in old_slots.iter().zip(&new_slots) {
        text |= before.texts != after.texts;
        var |= before.vars != after.vars;
        call |= before.calls != after.calls;
    }

    UpdateDetail::from_flags(text, var, call).map(ArgumentChange::Content)
}

/// Argument shape of a single call site.
pub fn argument_type(site: &CallSite) -> Option<ArgumentType> {
    ArgumentType::from_tags(site.tags())
}

/// Severity bucket of a call site's verbosity token.
///
/// Print-family calls take their class from the stream: `System.err` is
/// ERROR, any other receiver INFO.
pub fn verbosity_class(site: &CallSite) -> Option<VerbosityClass> {
    let token = site.verbosity.to_ascii_lowercase();
    match token.as_str() {
        "v" | "verbose" | "trace" | "finest" | "finer" => Some(VerbosityClass::Verbose),
        "d" | "debug" | "fine" | "config" => Some(VerbosityClass::Debug),
        "i" | "info" => Some(VerbosityClass::Info),
        "w" | "warn" | "warning" => Some(VerbosityClass::Warn),
        "e" | "error" | "severe" | "fatal" | "wtf" => Some(VerbosityClass::Error),
        "print" | "printf" | "println" => {
            let (caller, _) = split_call_name(&site.name);
            if caller.to_ascii_lowercase().ends_with("system.err") {
                Some(VerbosityClass::Error)
            } else {
                Some(VerbosityClass::Info)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::calls::call_site_from_expr;
    use crate::models::{CallExpr, Operand};

    fn text(s: &str) -> Argument {
        Argument::new(s, vec![Operand::Text(s.to_string())])
    }

    fn var(s: &str) -> Argument {
        Argument::new(s, vec![Operand::Var(s.to_string())])
    }

    fn nested(source: &str) -> Argument {
        let name = source.split('(').next().unwrap_or_default();
        Argument::new(source, vec![Operand::Call(CallExpr::new(name, source, vec![]))])
    }

    fn site(name: &str, args: Vec<Argument>) -> CallSite {
        let rendered: Vec<&str> = args.iter().map(|a| a.source.as_str()).collect();
        let source = format!("{}({})", name, rendered.join(", "));
        call_site_from_expr(&CallExpr::new(name, source, args))
    }

    #[test]
    fn test_verbosity_change_only() {
        let old = site("Log.d", vec![text("\"x\"")]);
        let new = site("Log.e", vec![text("\"x\"")]);
        assert_eq!(caller_change(&old, &new), Some(CallerChange::Verbosity));
        assert_eq!(argument_change(&old, &new), None);
    }

    #[test]
    fn test_caller_change_variants() {
        let a = site("Log.d", vec![text("\"x\"")]);
        assert_eq!(caller_change(&a, &a.clone()), None);

        let other_receiver = site("Timber.d", vec![text("\"x\"")]);
        assert_eq!(
            caller_change(&a, &other_receiver),
            Some(CallerChange::LoggingMethod)
        );

        let undotted = site("log", vec![text("\"x\"")]);
        assert_eq!(caller_change(&a, &undotted), Some(CallerChange::LoggingMethod));

        // Same root, different remainder.
        let out = site("System.out.println", vec![text("\"x\"")]);
        let err = site("System.err.println", vec![text("\"x\"")]);
        assert_eq!(caller_change(&out, &err), Some(CallerChange::Verbosity));
    }

    #[test]
    fn test_argument_count_change_short_circuits() {
        let old = site("Log.d", vec![text("\"a\""), text("\"b\"")]);
        let new = site("Log.d", vec![text("\"a\"")]);
        assert_eq!(argument_change(&old, &new), Some(ArgumentChange::Deleted));
        assert_eq!(argument_change(&new, &old), Some(ArgumentChange::Added));
    }

    #[test]
    fn test_zero_arguments_count_as_one_slot() {
        let empty = site("Log.d", vec![]);
        let one = site("Log.d", vec![text("\"a\"")]);
        assert_eq!(
            argument_change(&empty, &one),
            Some(ArgumentChange::Content(UpdateDetail::Text))
        );
    }

    #[test]
    fn test_argument_detail_dimensions() {
        let old = site("Log.d", vec![var("TAG"), text("\"a\"")]);
        let text_only = site("Log.d", vec![var("TAG"), text("\"b\"")]);
        assert_eq!(
            argument_change(&old, &text_only),
            Some(ArgumentChange::Content(UpdateDetail::Text))
        );

        let var_only = site("Log.d", vec![var("TAG2"), text("\"a\"")]);
        assert_eq!(
            argument_change(&old, &var_only),
            Some(ArgumentChange::Content(UpdateDetail::Var))
        );

        let both = site("Log.d", vec![var("TAG2"), text("\"b\"")]);
        assert_eq!(
            argument_change(&old, &both),
            Some(ArgumentChange::Content(UpdateDetail::TextVar))
        );
    }

    #[test]
    fn test_nested_call_change() {
        let old = site("Log.e", vec![var("TAG"), nested("e.getMessage()")]);
        let new = site("Log.e", vec![var("TAG"), nested("e.toString()")]);
        assert_eq!(
            argument_change(&old, &new),
            Some(ArgumentChange::Content(UpdateDetail::Call))
        );

        let reformatted = site("Log.e", vec![var("TAG"), nested("e.getMessage( )")]);
        assert_eq!(argument_change(&old, &reformatted), None);
    }

    #[test]
    fn test_argument_type_at_rest() {
        assert_eq!(
            argument_type(&site("Log.d", vec![text("\"a\"")])),
            Some(ArgumentType::TextOnly)
        );
        assert_eq!(
            argument_type(&site("Log.d", vec![var("TAG"), text("\"a\"")])),
            Some(ArgumentType::TextVar)
        );
        assert_eq!(
            argument_type(&site("Log.d", vec![nested("foo()")])),
            Some(ArgumentType::SimOnly)
        );
        let number = Argument::new("42", vec![Operand::Other("42".into())]);
        assert_eq!(argument_type(&site("Log.d", vec![number])), None);
    }

    #[test]
    fn test_verbosity_class() {
        let class = |name: &str| verbosity_class(&site(name, vec![text("\"a\"")]));
        assert_eq!(class("Log.v"), Some(VerbosityClass::Verbose));
        assert_eq!(class("logger.FINE"), Some(VerbosityClass::Debug));
        assert_eq!(class("LOG.info"), Some(VerbosityClass::Info));
        assert_eq!(class("Timber.w"), Some(VerbosityClass::Warn));
        assert_eq!(class("Log.wtf"), Some(VerbosityClass::Error));
        assert_eq!(class("System.out.println"), Some(VerbosityClass::Info));
        assert_eq!(class("System.err.printf"), Some(VerbosityClass::Error));
        assert_eq!(class("logger.log"), None);
    }
}
