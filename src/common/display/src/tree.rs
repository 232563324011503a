//! Tree display utilities for expression trees.

use std::fmt;

/// A tree addressed by handles, such as an arena-backed expression tree.
pub trait TreeSource {
    /// Handle type identifying a node.
    type Id: Copy;

    /// Get the display label of a node.
    fn label(&self, id: Self::Id) -> String;

    /// Get the present children of a node, in slot order.
    fn children(&self, id: Self::Id) -> Vec<Self::Id>;

    /// Get additional details to display next to the label.
    fn details(&self, _id: Self::Id) -> Option<String> {
        None
    }
}

/// Helper for displaying tree structures with box-drawing connectors.
pub struct DisplayTree<'a, T: TreeSource> {
    source: &'a T,
    root: T::Id,
}

impl<'a, T: TreeSource> DisplayTree<'a, T> {
    /// Create a new display tree rooted at `root`.
    pub fn new(source: &'a T, root: T::Id) -> Self {
        Self { source, root }
    }

    fn write_label(&self, f: &mut fmt::Formatter<'_>, id: T::Id) -> fmt::Result {
        write!(f, "{}", self.source.label(id))?;
        if let Some(details) = self.source.details(id) {
            write!(f, " ({details})")?;
        }
        writeln!(f)
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: T::Id,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let connector = if is_last { "└─ " } else { "├─ " };
        write!(f, "{prefix}{connector}")?;
        self.write_label(f, id)?;

        let children = self.source.children(id);
        let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });
        for (i, child) in children.iter().enumerate() {
            self.fmt_node(f, *child, &child_prefix, i + 1 == children.len())?;
        }

        Ok(())
    }
}

impl<T: TreeSource> fmt::Display for DisplayTree<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_label(f, self.root)?;

        let children = self.source.children(self.root);
        for (i, child) in children.iter().enumerate() {
            self.fmt_node(f, *child, "", i + 1 == children.len())?;
        }

        Ok(())
    }
}
