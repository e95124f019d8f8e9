use clang_ast::{BareSourceLocation, Id, SourceLocation, SourceRange};
use serde::Deserialize;

pub type Node = clang_ast::Node<Clang>;

/// Typed representation of the Clang AST node kinds the cursor logic needs.
///
/// Everything else lands in `Other`, which still keeps the kind name, the
/// extent and the few declaration fields shared by every `*Decl` node.
#[derive(Deserialize, Debug)]
pub enum Clang {
    VarDecl(DeclData),
    LabelStmt(LabelStmtData),

    // --- References ---
    DeclRefExpr(DeclRefExprData),
    MemberExpr(MemberExprData),
    GotoStmt(GotoStmtData),
    ObjCMessageExpr(ObjCMessageExprData),
    ObjCIvarRefExpr(ObjCIvarRefExprData),

    // --- Catch-all ---
    // `loc` and `range` MUST be deserialized for every node kind. The
    // `clang-ast` crate carries the "current file" and "current line" across
    // the deserialization stream through `SourceLocation`; skipping them on
    // any node corrupts the locations of every node that follows.
    Other {
        kind: String,
        #[serde(default)]
        loc: Option<SourceLocation>,
        #[serde(default)]
        range: Option<SourceRange>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "type")]
        ty: Option<QualType>,
        #[serde(default, rename = "isImplicit")]
        is_implicit: Option<bool>,
    },
}

/// Fields shared by declaration nodes.
#[derive(Deserialize, Debug)]
pub struct DeclData {
    pub name: Option<String>,
    pub loc: Option<SourceLocation>,
    pub range: Option<SourceRange>,
    #[serde(rename = "isImplicit")]
    pub is_implicit: Option<bool>,
    #[serde(rename = "type")]
    pub ty: Option<QualType>,
}

/// `DeclRefExpr`: a use of a variable, function or enumerator.
#[derive(Deserialize, Debug)]
pub struct DeclRefExprData {
    pub range: Option<SourceRange>,
    #[serde(rename = "type")]
    pub ty: Option<QualType>,
    #[serde(rename = "referencedDecl")]
    pub referenced_decl: Option<ReferencedDecl>,
}

/// `MemberExpr`: `base.member` / `base->member`.
#[derive(Deserialize, Debug)]
pub struct MemberExprData {
    pub range: Option<SourceRange>,
    #[serde(rename = "type")]
    pub ty: Option<QualType>,
    pub name: Option<String>,
    #[serde(rename = "referencedMemberDecl")]
    pub referenced_member_decl: Option<Id>,
}

#[derive(Deserialize, Debug)]
pub struct GotoStmtData {
    pub range: Option<SourceRange>,
    #[serde(rename = "targetLabelDeclId")]
    pub target_label_decl_id: Option<Id>,
}

/// `[receiver selector]`.
#[derive(Deserialize, Debug)]
pub struct ObjCMessageExprData {
    pub range: Option<SourceRange>,
    #[serde(rename = "type")]
    pub ty: Option<QualType>,
    pub selector: Option<String>,
    #[serde(rename = "methodDecl")]
    pub method_decl: Option<ReferencedDecl>,
}

/// `object->ivar`, including ivars accessed through an implicit `self`.
#[derive(Deserialize, Debug)]
pub struct ObjCIvarRefExprData {
    pub range: Option<SourceRange>,
    #[serde(rename = "type")]
    pub ty: Option<QualType>,
    pub decl: Option<ReferencedDecl>,
}

/// `LabelStmt` is the only place the JSON dump describes a `LabelDecl`.
#[derive(Deserialize, Debug)]
pub struct LabelStmtData {
    pub range: Option<SourceRange>,
    pub name: Option<String>,
    #[serde(rename = "declId")]
    pub decl_id: Option<Id>,
}

/// Inline summary of a referenced declaration, as emitted on `DeclRefExpr`
/// and the Objective-C reference expressions.
#[derive(Deserialize, Debug, Clone)]
pub struct ReferencedDecl {
    pub id: Id,
    pub kind: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<QualType>,
}

/// Clang's qualified type representation.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QualType {
    #[serde(rename = "qualType")]
    pub qual_type: Option<String>,
    #[serde(rename = "desugaredQualType")]
    pub desugared_qual_type: Option<String>,
}

impl QualType {
    /// The type as a user would read it.
    ///
    /// Deduced types (`auto`, `decltype(auto)`) are replaced by what they
    /// deduced to when Clang reports a desugared form.
    pub fn spelling(&self) -> Option<&str> {
        let written = self.qual_type.as_deref()?;
        match self.desugared_qual_type.as_deref() {
            Some(desugared) if written.contains("auto") => Some(desugared),
            _ => Some(written),
        }
    }
}

impl Clang {
    pub fn kind_name(&self) -> &str {
        match self {
            Self::VarDecl(_) => "VarDecl",
            Self::LabelStmt(_) => "LabelStmt",
            Self::DeclRefExpr(_) => "DeclRefExpr",
            Self::MemberExpr(_) => "MemberExpr",
            Self::GotoStmt(_) => "GotoStmt",
            Self::ObjCMessageExpr(_) => "ObjCMessageExpr",
            Self::ObjCIvarRefExpr(_) => "ObjCIvarRefExpr",
            Self::Other {
                kind,
                ..
            } => kind,
        }
    }

    pub fn range(&self) -> Option<&SourceRange> {
        match self {
            Self::VarDecl(d) => d.range.as_ref(),
            Self::LabelStmt(d) => d.range.as_ref(),
            Self::DeclRefExpr(d) => d.range.as_ref(),
            Self::MemberExpr(d) => d.range.as_ref(),
            Self::GotoStmt(d) => d.range.as_ref(),
            Self::ObjCMessageExpr(d) => d.range.as_ref(),
            Self::ObjCIvarRefExpr(d) => d.range.as_ref(),
            Self::Other {
                range,
                ..
            } => range.as_ref(),
        }
    }

    pub fn loc(&self) -> Option<&SourceLocation> {
        match self {
            Self::VarDecl(d) => d.loc.as_ref(),
            Self::Other {
                loc,
                ..
            } => loc.as_ref(),
            _ => None,
        }
    }

    /// The node's own `name` field, for declarations and member accesses.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::VarDecl(d) => d.name.as_deref(),
            Self::LabelStmt(d) => d.name.as_deref(),
            Self::MemberExpr(d) => d.name.as_deref(),
            Self::Other {
                name,
                ..
            } => name.as_deref(),
            Self::DeclRefExpr(_) | Self::GotoStmt(_) | Self::ObjCMessageExpr(_) | Self::ObjCIvarRefExpr(_) => None,
        }
    }

    pub fn qual_type(&self) -> Option<&QualType> {
        match self {
            Self::VarDecl(d) => d.ty.as_ref(),
            Self::DeclRefExpr(d) => d.ty.as_ref(),
            Self::MemberExpr(d) => d.ty.as_ref(),
            Self::ObjCMessageExpr(d) => d.ty.as_ref(),
            Self::ObjCIvarRefExpr(d) => d.ty.as_ref(),
            Self::Other {
                ty,
                ..
            } => ty.as_ref(),
            Self::LabelStmt(_) | Self::GotoStmt(_) => None,
        }
    }

    pub fn is_implicit(&self) -> bool {
        match self {
            Self::VarDecl(d) => d.is_implicit.unwrap_or(false),
            Self::Other {
                is_implicit,
                ..
            } => is_implicit.unwrap_or(false),
            _ => false,
        }
    }
}

/// Whether a Clang node kind names a declaration.
///
/// The translation unit itself is a `Decl` in Clang but never a declaration
/// cursor.
pub fn is_declaration_kind(kind: &str) -> bool {
    kind.ends_with("Decl") && kind != "TranslationUnitDecl"
}

/// Whether a Clang node kind is an expression.
pub fn is_expression_kind(kind: &str) -> bool {
    kind.ends_with("Expr")
        || kind.ends_with("Operator")
        || kind.ends_with("Literal")
        || kind == "ExprWithCleanups"
}

/// Call expressions whose first child is the callee.
pub fn is_call_kind(kind: &str) -> bool {
    matches!(kind, "CallExpr" | "CXXMemberCallExpr" | "CXXOperatorCallExpr")
}

/// Extract the concrete source location the user sees.
///
/// Prefers the expansion location (where a macro was invoked) over the
/// spelling location (inside the macro definition).
pub fn resolve_loc(loc: &SourceLocation) -> Option<&BareSourceLocation> {
    loc.expansion_loc.as_ref().or(loc.spelling_loc.as_ref())
}
