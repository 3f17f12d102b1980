//! Graphviz DOT rendering of a tree's shape and coloring.
//!
//! Nodes are labelled with their key's `Display` output, so keys should
//! render uniquely. Every absent child is drawn as a black `NIL` box. Only
//! the text is produced here; writing it to disk or running `dot` is up to
//! the caller.

use std::fmt::{self, Display, Write};

use crate::{Color, NodeRef, RbTree};

const INDENT: &str = "    ";
const NIL_ATTRS: &str =
    "[label=\"NIL\", shape=box, color=black, fontcolor=white, style=filled];";

/// Render `tree` as a DOT digraph.
pub fn render<K: Display>(tree: &RbTree<K>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_dot(tree, &mut out);
    out
}

/// Write the DOT digraph for `tree` into `out`.
pub fn write_dot<K: Display, W: Write>(tree: &RbTree<K>, out: &mut W) -> fmt::Result {
    writeln!(out, "digraph RBTree {{")?;
    writeln!(out, "{INDENT}graph [ratio=.48];")?;
    writeln!(
        out,
        "{INDENT}node [style=filled, color=black, shape=circle, width=.6, fontname=Helvetica, \
         fontweight=bold, fontcolor=white, fontsize=24, fixedsize=true];"
    )?;

    if let Some(root) = tree.root() {
        write_subtree(root, out)?;
    }

    writeln!(out, "}}")
}

/// Node line, then each side in turn: the edge to the child followed by the
/// child's whole subtree, or a NIL box.
fn write_subtree<K: Display, W: Write>(node: NodeRef<'_, K>, out: &mut W) -> fmt::Result {
    let key = node.key();
    let color = match node.color() {
        Color::Red => "red",
        Color::Black => "black",
    };
    writeln!(out, "{INDENT}\"{key}\" [color={color}, fontcolor=white, style=filled];")?;

    for (child, tag) in [(node.left(), 'L'), (node.right(), 'R')] {
        match child {
            Some(child) => {
                writeln!(out, "{INDENT}\"{key}\" -> \"{}\";", child.key())?;
                write_subtree(child, out)?;
            }
            None => {
                writeln!(out, "{INDENT}\"nil{tag}{key}\" {NIL_ATTRS}")?;
                writeln!(out, "{INDENT}\"{key}\" -> \"nil{tag}{key}\";")?;
            }
        }
    }
    Ok(())
}

impl<K: Display> RbTree<K> {
    /// Shorthand for [`render`].
    pub fn to_dot(&self) -> String {
        render(self)
    }
}
