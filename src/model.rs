//! Immutable value types for locations, scopes, declarations, and references.
//!
//! Everything here is produced once by the tree walker (`walker`) and never
//! mutated afterward; the index aggregator (`index`) only sorts at read time.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in a source file. Always points at the first significant
/// character of a construct: leading comment/whitespace trivia is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            byte_offset,
        }
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.file, self.line, self.column).cmp(&(&other.file, other.line, other.column))
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A byte/line span. `end` is always `>= start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: Location,
    pub end: Location,
}

/// Opaque lexical scope id. `ScopeId::GLOBAL` names the project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    Global,
    Function,
    Class,
    Struct,
    Enum,
    Actor,
    Protocol,
    Extension,
    Closure,
    Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub name: Option<String>,
    pub parent: Option<ScopeId>,
    pub range: SourceRange,
}

/// Parent links form a forest rooted at `ScopeId::GLOBAL`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeTree {
    scopes: std::collections::HashMap<ScopeId, Scope>,
    next_id: u32,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            scopes: std::collections::HashMap::new(),
            next_id: 1,
        }
    }

    /// Allocate a fresh scope id and register the scope.
    pub fn insert(
        &mut self,
        kind: ScopeKind,
        name: Option<String>,
        parent: Option<ScopeId>,
        range: SourceRange,
    ) -> ScopeId {
        let id = ScopeId(self.next_id);
        self.next_id += 1;
        self.scopes.insert(
            id,
            Scope {
                id,
                kind,
                name,
                parent,
                range,
            },
        );
        id
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(&id)
    }

    /// Walk from `from` up to the global scope inclusive, starting with `from`.
    pub fn chain(&self, from: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut cur = Some(from);
        while let Some(id) = cur {
            out.push(id);
            cur = self.scopes.get(&id).and_then(|s| s.parent);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.values()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    Function,
    Method,
    Initializer,
    Variable,
    Constant,
    Parameter,
    Class,
    Struct,
    Enum,
    EnumCase,
    Protocol,
    Extension,
    TypeAlias,
    Import,
}

/// Total order `private < fileprivate < internal < package < public < open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    Private,
    FilePrivate,
    Internal,
    Package,
    Public,
    Open,
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Internal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Static,
    Final,
    Override,
    Lazy,
    Mutating,
    Convenience,
}

/// Closed set of property wrappers whose mere presence implies usage of the
/// wrapped declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrapperKind {
    State,
    Binding,
    Environment,
    ObservedObject,
    StateObject,
    Published,
    AppStorage,
    FocusState,
    GestureState,
    Namespace,
    Unknown,
}

impl WrapperKind {
    pub fn from_attribute_name(name: &str) -> Self {
        match name {
            "State" => Self::State,
            "Binding" => Self::Binding,
            "Environment" | "EnvironmentObject" => Self::Environment,
            "ObservedObject" => Self::ObservedObject,
            "StateObject" => Self::StateObject,
            "Published" => Self::Published,
            "AppStorage" | "SceneStorage" => Self::AppStorage,
            "FocusState" => Self::FocusState,
            "GestureState" => Self::GestureState,
            "Namespace" => Self::Namespace,
            _ => Self::Unknown,
        }
    }

    /// Whether the mere presence of this wrapper on a declaration implies
    /// the declaration is "used" for unused-code purposes.
    pub fn implies_usage(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyWrapper {
    pub kind: WrapperKind,
    pub arguments: Option<String>,
}

/// Ignore-directive categories parsed from `swa:<directive>` trivia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IgnoreCategory {
    All,
    Unused,
    UnusedCases,
    Duplicates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub access_level: AccessLevel,
    pub modifiers: HashSet<Modifier>,
    pub attributes: HashSet<String>,
    pub property_wrappers: Vec<PropertyWrapper>,
    pub type_conformances: HashSet<String>,
    pub location: Location,
    pub range: SourceRange,
    pub scope: ScopeId,
    pub ignore_directives: HashSet<IgnoreCategory>,
}

impl Declaration {
    /// Whether this declaration's attributes mark it as a compiler/OS
    /// entry point.
    pub fn is_entry_point(&self) -> bool {
        self.attributes.iter().any(|a| {
            matches!(
                a.as_str(),
                "main" | "UIApplicationMain" | "NSApplicationMain"
            )
        })
    }

    pub fn has_ignore(&self, category: IgnoreCategory) -> bool {
        self.ignore_directives.contains(&IgnoreCategory::All)
            || self.ignore_directives.contains(&category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceContext {
    Call,
    Read,
    Write,
    TypeAnnotation,
    Inheritance,
    MemberAccess,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub identifier: String,
    pub location: Location,
    pub scope: ScopeId,
    pub context: ReferenceContext,
    pub qualified: bool,
    pub qualifier: Option<String>,
}

/// Default set of conformance names treated as "view-like".
pub const DEFAULT_VIEW_LIKE_CONFORMANCES: &[&str] = &["View", "App", "PreviewProvider", "ViewModifier"];

pub fn is_view_like(conformances: &HashSet<String>, view_like: &[&str]) -> bool {
    conformances.iter().any(|c| view_like.contains(&c.as_str()))
}
