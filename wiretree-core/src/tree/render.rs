//! Plain-text rendering of a field tree.

use std::io::Write;

use super::{FieldTree, ItemId};

const INDENT: &str = "    ";

impl FieldTree {
    /// Write the tree as indented text, one item per line.
    ///
    /// Children are indented four spaces under their parent. Expert notes
    /// on an item are written one level deeper after the item's children,
    /// so they appear where they were raised. Notes on the root come first.
    pub fn render_text<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for note in self.notes_for(self.root()) {
            writeln!(writer, "{note}")?;
        }
        for (child, _) in self.children(self.root()) {
            self.render_item(writer, child, 0)?;
        }
        Ok(())
    }

    fn render_item<W: Write>(
        &self,
        writer: &mut W,
        id: ItemId,
        depth: usize,
    ) -> std::io::Result<()> {
        if let Some(item) = self.get(id) {
            writeln!(writer, "{}{}", INDENT.repeat(depth), item.label())?;
        }
        for (child, _) in self.children(id) {
            self.render_item(writer, child, depth + 1)?;
        }
        for note in self.notes_for(id) {
            writeln!(writer, "{}{note}", INDENT.repeat(depth + 1))?;
        }
        Ok(())
    }

    /// Render the tree into a string.
    pub fn to_text(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.render_text(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}
