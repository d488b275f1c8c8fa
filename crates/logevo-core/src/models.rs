//! Shared typed models used across extraction, detection, and storage.

use std::fmt;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// 1. Parsed input: methods, body nodes, call expressions
// ---------------------------------------------------------------------------

/// One method body as parsed from one file version.
///
/// Identity is the pair (name, ordered parameter types). The body is a tree
/// of [`BodyNode`]s whose calls are visited in document order.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodFragment {
    pub name: String,
    pub parameter_types: Vec<String>,
    /// Full source text of the method declaration.
    pub source: String,
    /// Source text of the method body block only.
    pub body_source: String,
    pub body: Vec<BodyNode>,
}

/// Name and rendered parameter list of a method, e.g. `("run", "(int,String)")`.
///
/// A fragment without a name yields `("", "")`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: String,
    pub parameters: String,
}

impl MethodFragment {
    pub fn new(
        name: impl Into<String>,
        parameter_types: Vec<String>,
        source: impl Into<String>,
        body_source: impl Into<String>,
        body: Vec<BodyNode>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_types,
            source: source.into(),
            body_source: body_source.into(),
            body,
        }
    }

    pub fn signature(&self) -> MethodSignature {
        if self.name.is_empty() {
            return MethodSignature {
                name: String::new(),
                parameters: String::new(),
            };
        }
        MethodSignature {
            name: self.name.clone(),
            parameters: format!("({})", self.parameter_types.join(",")),
        }
    }

    /// Name immediately followed by the parameter list, e.g. `run(int,String)`.
    pub fn full_signature(&self) -> String {
        let sig = self.signature();
        format!("{}{}", sig.name, sig.parameters)
    }

    /// All call expressions of the body in document order, at any depth.
    pub fn calls(&self) -> Vec<&CallExpr> {
        let mut out = Vec::new();
        collect_calls(&self.body, &mut out);
        out
    }
}

fn collect_calls<'a>(nodes: &'a [BodyNode], out: &mut Vec<&'a CallExpr>) {
    for node in nodes {
        match node {
            BodyNode::Call(call) => out.push(call),
            BodyNode::Block(children) => collect_calls(children, out),
        }
    }
}

/// A node of a traversable method body.
#[derive(Clone, Debug, PartialEq)]
pub enum BodyNode {
    /// An expression statement headed by a method invocation.
    Call(CallExpr),
    /// A statement or expression enclosing further statements.
    Block(Vec<BodyNode>),
}

/// A method invocation as written in source.
#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    /// Callee name including its receiver, e.g. `Log.d` or `System.out.println`.
    pub name: String,
    /// Raw source text of the whole invocation.
    pub source: String,
    pub arguments: Vec<Argument>,
}

impl CallExpr {
    pub fn new(name: impl Into<String>, source: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            arguments,
        }
    }
}

/// One argument of a call, flattened over binary operators into operands.
#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub source: String,
    pub operands: Vec<Operand>,
}

/// A component of an argument expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A string (or character) literal, quotes included.
    Text(String),
    /// A variable reference: identifier, field access, array access.
    Var(String),
    /// A nested method invocation.
    Call(CallExpr),
    /// Anything else (numbers, casts, ternaries, lambdas...). Carries no tag.
    Other(String),
}

impl Argument {
    pub fn new(source: impl Into<String>, operands: Vec<Operand>) -> Self {
        Self {
            source: source.into(),
            operands,
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.operands.iter().filter_map(|op| match op {
            Operand::Text(t) => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.operands.iter().filter_map(|op| match op {
            Operand::Var(v) => Some(v.as_str()),
            _ => None,
        })
    }

    pub fn calls(&self) -> impl Iterator<Item = &CallExpr> {
        self.operands.iter().filter_map(|op| match op {
            Operand::Call(c) => Some(c),
            _ => None,
        })
    }

    pub fn tags(&self) -> ArgumentTags {
        ArgumentTags {
            text: self.texts().next().is_some(),
            var: self.vars().next().is_some(),
            call: self.calls().next().is_some(),
        }
    }
}

/// Which of the TEXT / VAR / CALL forms an argument (or call) contains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArgumentTags {
    pub text: bool,
    pub var: bool,
    pub call: bool,
}

impl ArgumentTags {
    pub fn union(self, other: Self) -> Self {
        Self {
            text: self.text || other.text,
            var: self.var || other.var,
            call: self.call || other.call,
        }
    }
}

// ---------------------------------------------------------------------------
// 2. CallSite
// ---------------------------------------------------------------------------

/// A logging invocation candidate extracted from a method body.
#[derive(Clone, Debug, PartialEq)]
pub struct CallSite {
    pub name: String,
    /// Suffix after the last dot of `name`, or the whole name if undotted.
    pub verbosity: String,
    /// Canonical rendering used for similarity and identity.
    pub text: String,
    /// Raw source text.
    pub source: String,
    pub arguments: Vec<Argument>,
}

impl CallSite {
    /// Aggregate tags over every argument.
    pub fn tags(&self) -> ArgumentTags {
        self.arguments
            .iter()
            .fold(ArgumentTags::default(), |acc, arg| acc.union(arg.tags()))
    }
}

// ---------------------------------------------------------------------------
// 3. MatchedPair
// ---------------------------------------------------------------------------

/// Link between an old and a new call site, by index into their sequences.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchedPair {
    pub old: usize,
    pub new: usize,
    pub ratio: f64,
}

// ---------------------------------------------------------------------------
// 4. Classification enums
// ---------------------------------------------------------------------------

/// How a logging call site moved between two versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    AddedWithFile,
    DeletedWithFile,
    AddedWithMethod,
    DeletedWithMethod,
    AddedInsideMethod,
    DeletedInsideMethod,
    Updated,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 7] = [
        ChangeKind::AddedWithFile,
        ChangeKind::DeletedWithFile,
        ChangeKind::AddedWithMethod,
        ChangeKind::DeletedWithMethod,
        ChangeKind::AddedInsideMethod,
        ChangeKind::DeletedInsideMethod,
        ChangeKind::Updated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::AddedWithFile => "ADDED_WITH_FILE",
            ChangeKind::DeletedWithFile => "DELETED_WITH_FILE",
            ChangeKind::AddedWithMethod => "ADDED_WITH_METHOD",
            ChangeKind::DeletedWithMethod => "DELETED_WITH_METHOD",
            ChangeKind::AddedInsideMethod => "ADDED_INSIDE_METHOD",
            ChangeKind::DeletedInsideMethod => "DELETED_INSIDE_METHOD",
            ChangeKind::Updated => "UPDATED",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == label)
    }

    pub fn is_added(self) -> bool {
        matches!(
            self,
            ChangeKind::AddedWithFile | ChangeKind::AddedWithMethod | ChangeKind::AddedInsideMethod
        )
    }

    pub fn is_deleted(self) -> bool {
        matches!(
            self,
            ChangeKind::DeletedWithFile
                | ChangeKind::DeletedWithMethod
                | ChangeKind::DeletedInsideMethod
        )
    }
}

/// Change of the logging call's callee between versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CallerChange {
    #[serde(rename = "UPDATED_VERBOSITY")]
    Verbosity,
    #[serde(rename = "UPDATED_LOGGING_METHOD")]
    LoggingMethod,
}

impl CallerChange {
    pub fn as_str(self) -> &'static str {
        match self {
            CallerChange::Verbosity => "UPDATED_VERBOSITY",
            CallerChange::LoggingMethod => "UPDATED_LOGGING_METHOD",
        }
    }
}

/// Which argument dimensions changed between two equal-arity calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UpdateDetail {
    #[serde(rename = "UPDATED_TEXT")]
    Text,
    #[serde(rename = "UPDATED_TEXT_VAR")]
    TextVar,
    #[serde(rename = "UPDATED_TEXT_SIM")]
    TextCall,
    #[serde(rename = "UPDATED_TEXT_VAR_SIM")]
    TextVarCall,
    #[serde(rename = "UPDATED_VAR")]
    Var,
    #[serde(rename = "UPDATED_VAR_SIM")]
    VarCall,
    #[serde(rename = "UPDATED_SIM")]
    Call,
}

impl UpdateDetail {
    /// Map the three change flags onto exactly one tag; `None` when no flag is set.
    pub fn from_flags(text: bool, var: bool, call: bool) -> Option<Self> {
        match (text, var, call) {
            (true, false, false) => Some(UpdateDetail::Text),
            (true, true, false) => Some(UpdateDetail::TextVar),
            (true, false, true) => Some(UpdateDetail::TextCall),
            (true, true, true) => Some(UpdateDetail::TextVarCall),
            (false, true, false) => Some(UpdateDetail::Var),
            (false, true, true) => Some(UpdateDetail::VarCall),
            (false, false, true) => Some(UpdateDetail::Call),
            (false, false, false) => None,
        }
    }

    pub fn involves_var(self) -> bool {
        matches!(
            self,
            UpdateDetail::TextVar
                | UpdateDetail::TextVarCall
                | UpdateDetail::Var
                | UpdateDetail::VarCall
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UpdateDetail::Text => "UPDATED_TEXT",
            UpdateDetail::TextVar => "UPDATED_TEXT_VAR",
            UpdateDetail::TextCall => "UPDATED_TEXT_SIM",
            UpdateDetail::TextVarCall => "UPDATED_TEXT_VAR_SIM",
            UpdateDetail::Var => "UPDATED_VAR",
            UpdateDetail::VarCall => "UPDATED_VAR_SIM",
            UpdateDetail::Call => "UPDATED_SIM",
        }
    }
}

/// Argument-level change of an updated call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentChange {
    /// The new call has more arguments.
    Added,
    /// The new call has fewer arguments.
    Deleted,
    /// Same arity, content changed along the given dimensions.
    Content(UpdateDetail),
}

impl ArgumentChange {
    pub fn as_str(self) -> &'static str {
        match self {
            ArgumentChange::Added => "ARGUMENT_ADDED",
            ArgumentChange::Deleted => "ARGUMENT_DELETED",
            ArgumentChange::Content(detail) => detail.as_str(),
        }
    }

    pub fn detail(self) -> Option<UpdateDetail> {
        match self {
            ArgumentChange::Content(detail) => Some(detail),
            _ => None,
        }
    }
}

impl Serialize for ArgumentChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Argument shape of a single call site, independent of any update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArgumentType {
    TextOnly,
    VarOnly,
    SimOnly,
    TextVar,
    TextSim,
    VarSim,
    TextVarSim,
}

impl ArgumentType {
    pub fn from_tags(tags: ArgumentTags) -> Option<Self> {
        match (tags.text, tags.var, tags.call) {
            (true, false, false) => Some(ArgumentType::TextOnly),
            (false, true, false) => Some(ArgumentType::VarOnly),
            (false, false, true) => Some(ArgumentType::SimOnly),
            (true, true, false) => Some(ArgumentType::TextVar),
            (true, false, true) => Some(ArgumentType::TextSim),
            (false, true, true) => Some(ArgumentType::VarSim),
            (true, true, true) => Some(ArgumentType::TextVarSim),
            (false, false, false) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArgumentType::TextOnly => "TEXT_ONLY",
            ArgumentType::VarOnly => "VAR_ONLY",
            ArgumentType::SimOnly => "SIM_ONLY",
            ArgumentType::TextVar => "TEXT_VAR",
            ArgumentType::TextSim => "TEXT_SIM",
            ArgumentType::VarSim => "VAR_SIM",
            ArgumentType::TextVarSim => "TEXT_VAR_SIM",
        }
    }
}

/// Coarse severity bucket of a verbosity token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerbosityClass {
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
}

impl VerbosityClass {
    pub fn as_str(self) -> &'static str {
        match self {
            VerbosityClass::Verbose => "VERBOSE",
            VerbosityClass::Debug => "DEBUG",
            VerbosityClass::Info => "INFO",
            VerbosityClass::Warn => "WARN",
            VerbosityClass::Error => "ERROR",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(
    ChangeKind,
    CallerChange,
    UpdateDetail,
    ArgumentChange,
    ArgumentType,
    VerbosityClass
);

// ---------------------------------------------------------------------------
// 5. ChangeRecord
// ---------------------------------------------------------------------------

/// One observed transition of one logging call site in one file diff.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub file_path: String,
    /// Full signature of the enclosing method, e.g. `onCreate(Bundle)`.
    pub method: String,
    pub kind: ChangeKind,
    /// Canonical text before the change; absent for additions.
    pub before: Option<String>,
    /// Canonical text after the change; absent for deletions.
    pub after: Option<String>,
    pub verbosity: String,
    pub verbosity_class: Option<VerbosityClass>,
    pub argument_type: Option<ArgumentType>,
    /// Only set on `UPDATED` records.
    pub caller_change: Option<CallerChange>,
    /// Only set on `UPDATED` records.
    pub argument_change: Option<ArgumentChange>,
    /// Only set on `UPDATED` records whose detail involves a variable change
    /// and whose diff text was available.
    pub is_consistent_update: Option<bool>,
}

impl ChangeRecord {
    /// Text of the call as it exists after the change, or before it for deletions.
    pub fn content(&self) -> &str {
        self.after
            .as_deref()
            .or(self.before.as_deref())
            .unwrap_or_default()
    }

    pub fn update_detail(&self) -> Option<UpdateDetail> {
        self.argument_change.and_then(ArgumentChange::detail)
    }

    /// Caller and argument changes joined by `+`, e.g. `UPDATED_VERBOSITY+UPDATED_TEXT`.
    pub fn update_type(&self) -> Option<String> {
        match (self.caller_change, self.argument_change) {
            (Some(caller), Some(args)) => Some(format!("{caller}+{args}")),
            (Some(caller), None) => Some(caller.to_string()),
            (None, Some(args)) => Some(args.to_string()),
            (None, None) => None,
        }
    }
}
