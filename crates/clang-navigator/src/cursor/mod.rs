//! Cursors: handles to the syntax tree node at a source position.

mod position;

use std::{
    borrow::Cow,
    collections::HashMap,
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

use tracing::debug;

pub use position::{SourceExtent, SourcePosition};

use crate::{
    paths::paths_match,
    translation_unit::{
        Clang, Declaration, Node, TranslationUnit, is_call_kind, is_declaration_kind, is_expression_kind, resolve_loc,
    },
};

/// A position in a specific file of a translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorLocation {
    pub file: PathBuf,
    pub position: SourcePosition,
}

/// The Clang node kind a cursor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorKind<'tu>(&'tu str);

impl<'tu> CursorKind<'tu> {
    pub fn as_str(&self) -> &'tu str {
        self.0
    }

    pub fn is_declaration(&self) -> bool {
        is_declaration_kind(self.0)
    }

    pub fn is_var_decl(&self) -> bool {
        self.0 == "VarDecl"
    }
}

impl Display for CursorKind<'_> {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Kinds a written type can name.
const TYPE_DECLARATION_KINDS: &[&str] = &[
    "CXXRecordDecl",
    "RecordDecl",
    "EnumDecl",
    "TypedefDecl",
    "TypeAliasDecl",
    "ClassTemplateDecl",
    "ObjCInterfaceDecl",
];

/// Words of a written type that are not part of its name.
const TYPE_QUALIFIERS: &[&str] =
    &["const", "volatile", "restrict", "__restrict", "struct", "class", "union", "enum", "typename", "_Nonnull", "_Nullable"];

#[derive(Clone, Copy)]
enum Role<'tu> {
    Node,
    /// The type written in front of the declaration `node`'s name, with the
    /// declaration of that type when the unit describes one.
    TypeRef(Option<&'tu Declaration>),
}

#[derive(Clone, Copy)]
pub struct Cursor<'tu> {
    tu: &'tu TranslationUnit,
    node: &'tu Node,
    extent: Option<SourceExtent>,
    role: Role<'tu>,
}

impl<'tu> Cursor<'tu> {
    /// The most specific node whose extent covers `location`.
    ///
    /// Returns `None` only when the file does not belong to the translation
    /// unit; a position outside every node yields the translation-unit cursor.
    /// A position on the written type of a declaration yields a `TypeRef`.
    pub fn from_location(
        tu: &'tu TranslationUnit,
        location: &CursorLocation,
    ) -> Option<Self> {
        if !tu.contains_file(&location.file) {
            debug!("{} is not part of the translation unit", location.file.display());
            return None;
        }

        let position = location.position;
        let mut files = FileMatcher::new(tu, &location.file);
        let mut cursor = Self {
            tu,
            node: tu.root(),
            extent: None,
            role: Role::Node,
        };
        loop {
            // Initializers that start at the declared name, like the implicit
            // constructor call of `Point p;`, must not hide the declaration.
            let on_declared_name = cursor.kind().is_declaration()
                && files.name_token(cursor.node).is_some_and(|name| name.contains(position));
            let Some((node, extent)) = narrowest_child(cursor.node, position, &mut files, on_declared_name) else {
                break;
            };
            cursor.node = node;
            cursor.extent = Some(extent);
        }

        if let Some(extent) = cursor.extent
            && cursor.kind().is_declaration()
            && let Some(name) = files.name_token(cursor.node)
            && position < name.start
            && let Some(type_name) = written_type_name(cursor.node)
        {
            cursor.role = Role::TypeRef(tu.find_declaration(type_name, TYPE_DECLARATION_KINDS));
            cursor.extent = Some(SourceExtent::new(extent.start, name.start));
        }
        Some(cursor)
    }

    pub fn kind(&self) -> CursorKind<'tu> {
        match self.role {
            Role::TypeRef(_) => CursorKind("TypeRef"),
            Role::Node => CursorKind(self.node.kind.kind_name()),
        }
    }

    pub fn node(&self) -> &'tu Node {
        self.node
    }

    /// The cursor's source range; `end` is one past its last byte.
    pub fn extent(&self) -> Option<SourceExtent> {
        self.extent
    }

    /// The identifier text of the cursor.
    ///
    /// References spell the name they refer to, declarations their own name;
    /// every other cursor has an empty spelling.
    pub fn spelling(&self) -> Cow<'tu, str> {
        if let Role::TypeRef(decl) = self.role {
            return Cow::Borrowed(decl.and_then(|decl| decl.name.as_deref()).unwrap_or_default());
        }
        match &self.node.kind {
            Clang::DeclRefExpr(data) => {
                let name = data.referenced_decl.as_ref().and_then(|decl| decl.name.as_deref());
                Cow::Borrowed(name.unwrap_or_default())
            },
            Clang::ObjCMessageExpr(data) => Cow::Borrowed(data.selector.as_deref().unwrap_or_default()),
            Clang::ObjCIvarRefExpr(data) => {
                Cow::Borrowed(data.decl.as_ref().and_then(|decl| decl.name.as_deref()).unwrap_or_default())
            },
            Clang::GotoStmt(_) => match self.referenced().and_then(|decl| decl.name.clone()) {
                Some(name) => Cow::Owned(name),
                None => Cow::Borrowed(""),
            },
            kind if is_call_kind(kind.kind_name()) => match self.callee() {
                Some(callee) => callee.spelling(),
                None => Cow::Borrowed(""),
            },
            kind if kind.kind_name() == "MemberExpr" || is_declaration_kind(kind.kind_name()) => {
                Cow::Borrowed(kind.name().unwrap_or_default())
            },
            _ => Cow::Borrowed(""),
        }
    }

    /// Spelling of the cursor's type.
    pub fn type_spelling(&self) -> Result<&'tu str, CursorError> {
        let spelling = match self.role {
            Role::TypeRef(decl) => decl.and_then(|decl| decl.name.as_deref()),
            Role::Node => self.node.kind.qual_type().and_then(|ty| ty.spelling()),
        };
        spelling.ok_or_else(|| CursorError::TypeUnavailable {
            kind: self.kind().as_str().to_owned(),
        })
    }

    /// The declaration this cursor refers to.
    ///
    /// A declaration refers to itself. Cursors that are neither references
    /// nor declarations refer to nothing.
    pub fn referenced(&self) -> Option<Cow<'tu, Declaration>> {
        if let Role::TypeRef(decl) = self.role {
            return decl.map(Cow::Borrowed);
        }
        match &self.node.kind {
            Clang::DeclRefExpr(data) => {
                let summary = data.referenced_decl.as_ref()?;
                Some(Cow::Owned(self.tu.referenced_declaration(summary)))
            },
            Clang::MemberExpr(data) => self.tu.declaration(data.referenced_member_decl?).map(Cow::Borrowed),
            Clang::GotoStmt(data) => self.tu.declaration(data.target_label_decl_id?).map(Cow::Borrowed),
            Clang::ObjCMessageExpr(data) => match &data.method_decl {
                Some(method) => Some(Cow::Owned(self.tu.referenced_declaration(method))),
                None => self.tu.find_declaration(data.selector.as_deref()?, &["ObjCMethodDecl"]).map(Cow::Borrowed),
            },
            Clang::ObjCIvarRefExpr(data) => {
                let summary = data.decl.as_ref()?;
                Some(Cow::Owned(self.tu.referenced_declaration(summary)))
            },
            kind if is_call_kind(kind.kind_name()) => self.callee()?.referenced(),
            kind if is_declaration_kind(kind.kind_name()) => self.tu.declaration(self.node.id).map(Cow::Borrowed),
            _ => None,
        }
    }

    /// The callee of a call, looking through implicit casts.
    fn callee(&self) -> Option<Self> {
        let mut callee = self.node.inner.first()?;
        while callee.kind.kind_name() == "ImplicitCastExpr" {
            callee = callee.inner.first()?;
        }
        Some(Self {
            node: callee,
            role: Role::Node,
            ..*self
        })
    }
}

/// Name of the type written in front of a declaration's name.
///
/// Deduced types have nothing written to navigate to.
fn written_type_name(node: &Node) -> Option<&str> {
    let written = node.kind.qual_type()?.qual_type.as_deref()?;
    // A function's type starts with its return type.
    let written = match node.kind.kind_name() {
        "FunctionDecl" | "CXXMethodDecl" => written.split('(').next()?,
        _ => written,
    };
    type_name(written)
}

/// The unqualified name of a written type: `const ns::Point &` names `Point`,
/// `std::vector<int>` names `vector`.
fn type_name(written: &str) -> Option<&str> {
    let is_deduced = written
        .split(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
        .any(|word| matches!(word, "auto" | "decltype" | "typeof" | "__typeof__"));
    if is_deduced {
        return None;
    }
    let head = written.split(['<', '[', '(']).next()?;
    let word = head
        .split(|ch: char| ch.is_whitespace() || ch == '*' || ch == '&')
        .filter(|word| !word.is_empty() && !TYPE_QUALIFIERS.contains(word))
        .last()?;
    word.rsplit("::").next().filter(|name| !name.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    TypeUnavailable {
        kind: String,
    },
}

impl Display for CursorError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::TypeUnavailable {
                kind,
            } => write!(f, "{kind} carries no type information"),
        }
    }
}

impl std::error::Error for CursorError {}

/// Where a node sits relative to the file being queried.
enum NodeSpan {
    /// No usable range, or one that begins and ends in different files. The
    /// node never matches itself; only its children count.
    Transparent,
    /// The range lies in another file.
    Elsewhere,
    Here(SourceExtent),
}

/// Memoizes which of the unit's file names refer to the queried file.
struct FileMatcher<'tu, 'q> {
    tu: &'tu TranslationUnit,
    target: &'q Path,
    known: HashMap<&'tu str, bool>,
}

impl<'tu, 'q> FileMatcher<'tu, 'q> {
    fn new(
        tu: &'tu TranslationUnit,
        target: &'q Path,
    ) -> Self {
        Self {
            tu,
            target,
            known: HashMap::new(),
        }
    }

    fn matches(
        &mut self,
        file: &'tu str,
    ) -> bool {
        if let Some(&known) = self.known.get(file) {
            return known;
        }
        let matches = paths_match(&self.tu.resolve_file(file), self.target);
        self.known.insert(file, matches);
        matches
    }

    fn span_of(
        &mut self,
        node: &'tu Node,
    ) -> NodeSpan {
        let Some(range) = node.kind.range() else {
            return NodeSpan::Transparent;
        };
        let (Some(begin), Some(end)) = (resolve_loc(&range.begin), resolve_loc(&range.end)) else {
            return NodeSpan::Transparent;
        };
        if begin.line == 0 || begin.file.is_empty() || begin.file != end.file {
            return NodeSpan::Transparent;
        }
        if !self.matches(&begin.file) {
            return NodeSpan::Elsewhere;
        }
        NodeSpan::Here(SourceExtent::from_token_range(begin, end))
    }

    /// The token a declaration's `loc` points at, when it is in the queried file.
    fn name_token(
        &mut self,
        node: &'tu Node,
    ) -> Option<SourceExtent> {
        let name = resolve_loc(node.kind.loc()?)?;
        if name.line == 0 || name.file.is_empty() || !self.matches(&name.file) {
            return None;
        }
        Some(SourceExtent::from_token_range(name, name))
    }
}

/// The narrowest child of `node` (looking through transparent children)
/// whose extent contains `position`. Expressions are passed over when
/// `skip_expressions` is set.
fn narrowest_child<'tu>(
    node: &'tu Node,
    position: SourcePosition,
    files: &mut FileMatcher<'tu, '_>,
    skip_expressions: bool,
) -> Option<(&'tu Node, SourceExtent)> {
    let mut best: Option<(&'tu Node, SourceExtent)> = None;
    for child in &node.inner {
        if child.kind.is_implicit() || (skip_expressions && is_expression_kind(child.kind.kind_name())) {
            continue;
        }
        let candidate = match files.span_of(child) {
            NodeSpan::Here(extent) if extent.contains(position) => Some((child, extent)),
            NodeSpan::Here(_) | NodeSpan::Elsewhere => None,
            NodeSpan::Transparent => narrowest_child(child, position, files, skip_expressions),
        };
        if let Some((candidate_node, extent)) = candidate
            && best.is_none_or(|(_, current)| extent.is_narrower_than(&current))
        {
            best = Some((candidate_node, extent));
        }
    }
    best
}

#[cfg(test)]
#[path = "../../tests/src/cursor/cursor_tests.rs"]
mod tests;
