use core::ptr::NonNull;
use std::fmt::{self, Write};

use crate::{balance_of, links, value, AvlTree, Dir, Node};

/// Accumulates the Graphviz statements for one tree, one `rank=same` group per depth.
struct Dot<'n> {
    name: &'n str,
    levels: Vec<String>,
    edges: String,
    nodes: usize,
    missing: usize,
}

impl<'n> Dot<'n> {
    fn level(&mut self, depth: usize) -> &mut String {
        if self.levels.len() <= depth {
            self.levels.resize_with(depth + 1, String::new);
        }
        &mut self.levels[depth]
    }

    /// Emits `node` and its subtree, returning the identifier assigned to `node`.
    ///
    /// # Safety
    ///
    /// `node` must point to a live node whose subtree is not mutated for the duration of the call.
    unsafe fn subtree<T: fmt::Display>(
        &mut self,
        node: NonNull<Node<T>>,
        depth: usize,
    ) -> Result<String, fmt::Error> {
        let id = format!("{}-n{}", self.name, self.nodes);
        self.nodes += 1;

        let (key, balance) = unsafe { (value(node), balance_of(node)) };
        write!(self.level(depth), "\"{id}\" [label=\"{key}:{balance}\"]; ")?;

        for dir in [Dir::Left, Dir::Right] {
            let child = match unsafe { links(node).child(dir) } {
                Some(child) => unsafe { self.subtree(child, depth + 1)? },
                None => {
                    let id = format!("{}-m{}", self.name, self.missing);
                    self.missing += 1;
                    write!(self.level(depth + 1), "\"{id}\" [shape=point]; ")?;
                    id
                }
            };
            writeln!(self.edges, "  \"{id}\" -> \"{child}\";")?;
        }

        Ok(id)
    }
}

impl<T> AvlTree<T>
where
    T: fmt::Display,
{
    /// Writes the shape of the tree to `w` as a Graphviz `digraph` named `name`.
    ///
    /// Nodes are labelled `value:balance` and grouped by depth. Missing children are drawn as
    /// points.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let Some(root) = self.root else {
            return write!(w, "digraph \"{name}\" {{}}");
        };

        let mut dot = Dot {
            name,
            levels: Vec::new(),
            edges: String::new(),
            nodes: 0,
            missing: 0,
        };
        // SAFETY: `&self` keeps the tree alive and unmodified while it is rendered.
        unsafe { dot.subtree(root, 0)? };

        writeln!(w, "digraph \"{name}\" {{")?;
        for level in &dot.levels {
            writeln!(w, "  {{rank=same; {level}}}")?;
        }
        w.write_str(&dot.edges)?;
        w.write_str("}")
    }
}
