//! Parsed form of rule template strings
//!
//! A template string is a sequence of literal spans and `${...}`
//! placeholders. Placeholders hold either a property path or a single-level
//! helper call; there are no other operators. Templates are parsed once and
//! evaluated against a typed scope, never turned into runtime code.

/// A fully parsed template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

/// One span of a template: literal text or a `${...}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Expr),
}

/// The expression inside a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Path(PropertyPath),
    Call(HelperCall),
}

/// A single-level call to a named helper function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCall {
    pub name: String,
    pub args: Vec<Arg>,
}

/// A helper argument: a property path or a string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Path(PropertyPath),
    Literal(String),
}

/// A dotted property path with its resolution root.
///
/// `@input.x` surface syntax is captured as `root: Input` at parse time;
/// the `@` prefix never reaches path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    pub root: PathRoot,
    pub segments: Vec<PathSegment>,
}

/// Where a property path resolves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRoot {
    /// The request context map.
    Context,
    /// The per-request write input (`@input` surface syntax).
    Input,
}

/// One step of a property path: an object key or a numeric array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl Template {
    /// A template consisting of exactly one placeholder and nothing else.
    /// Such placeholders substitute their value's native JSON type instead
    /// of a string rendering.
    pub fn as_single_placeholder(&self) -> Option<&Expr> {
        match self.segments.as_slice() {
            [Segment::Placeholder(expr)] => Some(expr),
            _ => None,
        }
    }

    /// Whether any placeholder resolves against `@input`.
    pub fn references_input(&self) -> bool {
        self.segments.iter().any(|s| match s {
            Segment::Literal(_) => false,
            Segment::Placeholder(Expr::Path(p)) => p.root == PathRoot::Input,
            Segment::Placeholder(Expr::Call(call)) => call
                .args
                .iter()
                .any(|a| matches!(a, Arg::Path(p) if p.root == PathRoot::Input)),
        })
    }
}

impl PropertyPath {
    /// The dotted form used in diagnostics, e.g. `user.roles.0`.
    pub fn dotted(&self) -> String {
        let mut out = String::new();
        if self.root == PathRoot::Input {
            out.push_str("@input");
        }
        for segment in &self.segments {
            if !out.is_empty() {
                out.push('.');
            }
            match segment {
                PathSegment::Key(k) => out.push_str(k),
                PathSegment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(root: PathRoot, keys: &[&str]) -> PropertyPath {
        PropertyPath {
            root,
            segments: keys.iter().map(|k| PathSegment::Key(k.to_string())).collect(),
        }
    }

    #[test]
    fn test_single_placeholder() {
        let tpl = Template {
            segments: vec![Segment::Placeholder(Expr::Path(path(
                PathRoot::Context,
                &["currentUserId"],
            )))],
        };
        assert!(tpl.as_single_placeholder().is_some());

        let mixed = Template {
            segments: vec![
                Segment::Literal("user-".to_string()),
                Segment::Placeholder(Expr::Path(path(PathRoot::Context, &["id"]))),
            ],
        };
        assert!(mixed.as_single_placeholder().is_none());
    }

    #[test]
    fn test_references_input() {
        let tpl = Template {
            segments: vec![Segment::Placeholder(Expr::Path(path(
                PathRoot::Input,
                &["title"],
            )))],
        };
        assert!(tpl.references_input());

        let ctx_only = Template {
            segments: vec![Segment::Placeholder(Expr::Path(path(
                PathRoot::Context,
                &["title"],
            )))],
        };
        assert!(!ctx_only.references_input());
    }

    #[test]
    fn test_dotted_rendering() {
        let mut p = path(PathRoot::Input, &["__current", "name"]);
        assert_eq!(p.dotted(), "@input.__current.name");

        p.root = PathRoot::Context;
        p.segments.push(PathSegment::Index(2));
        assert_eq!(p.dotted(), "__current.name.2");
    }
}
