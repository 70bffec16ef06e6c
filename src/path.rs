//! Lexical path tracking for driver diagnostics.
//!
//! Drivers push a component on every descent into a record key or array
//! element and pop it on return. Errors raised mid-descent are labelled
//! with the rendered path (`/a/b[2]/c` form). The pop must run on every
//! exit path, including errors, so descents go through [`PathStack::scoped`].

use std::fmt;

/// One step of a document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart {
    /// Descent into a record under the given key.
    Key(String),
    /// Descent into an array element at the given flat position.
    Index(usize),
}

/// Stack of path components maintained by the drivers.
#[derive(Debug, Default)]
pub struct PathStack {
    parts: Vec<PathPart>,
}

impl PathStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a component. Callers must guarantee the matching [`pop`]
    /// runs on every exit path; prefer [`PathStack::scoped`].
    ///
    /// [`pop`]: PathStack::pop
    pub fn push(&mut self, part: PathPart) {
        self.parts.push(part);
    }

    pub fn pop(&mut self) {
        self.parts.pop();
    }

    /// Run `f` with `part` pushed; the pop runs regardless of `f`'s outcome.
    pub fn scoped<T, E>(
        &mut self,
        part: PathPart,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        self.parts.push(part);
        let result = f(self);
        self.parts.pop();
        result
    }

    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    /// Render the current location. Keys become `/key` segments, indices
    /// attach as `[i]`; the root renders as `/`.
    pub fn render(&self) -> String {
        if self.parts.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for part in &self.parts {
            match part {
                PathPart::Key(key) => {
                    out.push('/');
                    out.push_str(key);
                }
                PathPart::Index(i) => {
                    if out.is_empty() {
                        out.push('/');
                    }
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

impl fmt::Display for PathStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
