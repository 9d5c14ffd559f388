//! Field tree: the decoded, renderable output of a dissection.
//!
//! A [`FieldTree`] is an append-only arena of [`Item`]s. Every item belongs
//! to exactly one parent and keeps its children in insertion order, which
//! is also display order. Items are never removed or reordered; a tree is
//! written once per packet and then only read.
//!
//! Each non-generated item covers a non-empty byte range that is checked
//! against the dissected buffer when the item is added.

mod render;
mod value;

use smallvec::SmallVec;

use crate::buffer::Tvb;
use crate::error::TreeError;
use crate::expert::{ExpertGroup, ExpertInfo, ExpertNote, Severity};
use crate::schema::HeaderField;

pub use value::{
    format_absolute_time, parse_epoch_seconds, parse_u64, FieldValue, ABSOLUTE_TIME_FORMAT,
};

/// Handle to an item of one [`FieldTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(usize);

impl ItemId {
    /// The dissection root.
    pub const ROOT: ItemId = ItemId(0);

    /// Position of this item in insertion order (root is 0).
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Byte range an item covers, absolute from the start of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteRange {
    pub offset: usize,
    pub length: usize,
}

impl ByteRange {
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// What an item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// The dissection root; holds no value.
    Root,
    /// A registered header field (including protocol items).
    Field(&'static HeaderField),
    /// A free-text label, used for subtrees such as "one source line".
    Text,
}

/// One node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    pub range: ByteRange,
    pub value: FieldValue,
    /// Display value (fields) or label (text items), computed when the
    /// item was added.
    pub display: String,
    /// Synthetic item not backed by wire bytes.
    pub generated: bool,
    pub parent: Option<ItemId>,
    children: SmallVec<[ItemId; 8]>,
}

impl Item {
    /// Header field behind this item, if any.
    pub fn header(&self) -> Option<&'static HeaderField> {
        match self.kind {
            ItemKind::Field(hf) => Some(hf),
            _ => None,
        }
    }

    /// Protocol-qualified identifier, if this item is a header field.
    pub fn abbrev(&self) -> Option<&'static str> {
        self.header().map(|hf| hf.abbrev)
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    /// One-line rendering as shown in a packet details view.
    pub fn label(&self) -> String {
        let text = match self.kind {
            ItemKind::Root => String::new(),
            ItemKind::Text => self.display.clone(),
            ItemKind::Field(hf) if hf.kind == crate::schema::FieldKind::Protocol => {
                if self.display.is_empty() {
                    hf.name.to_string()
                } else {
                    self.display.clone()
                }
            }
            ItemKind::Field(hf) => format!("{}: {}", hf.name, self.display),
        };
        if self.generated {
            format!("[{text}]")
        } else {
            text
        }
    }
}

/// Append-only arena of items produced by one dissection.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTree {
    /// Length of the buffer this tree describes.
    buffer_len: usize,
    items: Vec<Item>,
    notes: Vec<ExpertNote>,
}

impl FieldTree {
    /// Create an empty tree for the given buffer.
    pub fn new(tvb: &Tvb) -> Self {
        Self::for_length(tvb.len())
    }

    /// Create an empty tree for a buffer of `buffer_len` bytes.
    pub fn for_length(buffer_len: usize) -> Self {
        let root = Item {
            kind: ItemKind::Root,
            range: ByteRange::new(0, buffer_len),
            value: FieldValue::None,
            display: String::new(),
            generated: false,
            parent: None,
            children: SmallVec::new(),
        };
        Self {
            buffer_len,
            items: vec![root],
            notes: Vec::new(),
        }
    }

    /// The dissection root.
    pub fn root(&self) -> ItemId {
        ItemId::ROOT
    }

    /// Length of the dissected buffer.
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    fn check_range(
        &self,
        abbrev: &'static str,
        offset: usize,
        length: usize,
        generated: bool,
    ) -> Result<(), TreeError> {
        let fits = offset
            .checked_add(length)
            .is_some_and(|end| end <= self.buffer_len);
        if !fits {
            return Err(TreeError::OutOfBounds {
                abbrev,
                offset,
                length,
                available: self.buffer_len,
            });
        }
        if length == 0 && !generated {
            return Err(TreeError::EmptyRange { abbrev, offset });
        }
        Ok(())
    }

    fn push(&mut self, parent: ItemId, mut item: Item) -> Result<ItemId, TreeError> {
        if parent.0 >= self.items.len() {
            return Err(TreeError::UnknownItem(parent.0));
        }
        let id = ItemId(self.items.len());
        item.parent = Some(parent);
        self.items.push(item);
        self.items[parent.0].children.push(id);
        Ok(id)
    }

    /// Append a field whose display text is derived from its value.
    pub fn add_field(
        &mut self,
        parent: ItemId,
        hf: &'static HeaderField,
        offset: usize,
        length: usize,
        value: FieldValue,
    ) -> Result<ItemId, TreeError> {
        let display = value.display();
        self.add_field_with_display(parent, hf, offset, length, value, display)
    }

    /// Append a field with an explicit display text.
    pub fn add_field_with_display(
        &mut self,
        parent: ItemId,
        hf: &'static HeaderField,
        offset: usize,
        length: usize,
        value: FieldValue,
        display: String,
    ) -> Result<ItemId, TreeError> {
        self.check_range(hf.abbrev, offset, length, false)?;
        self.push(
            parent,
            Item {
                kind: ItemKind::Field(hf),
                range: ByteRange::new(offset, length),
                value,
                display,
                generated: false,
                parent: None,
                children: SmallVec::new(),
            },
        )
    }

    /// Append a synthetic field that is not backed by wire bytes.
    ///
    /// The item has an empty range at offset 0 and is marked generated.
    pub fn add_generated(
        &mut self,
        parent: ItemId,
        hf: &'static HeaderField,
        value: FieldValue,
    ) -> Result<ItemId, TreeError> {
        self.check_range(hf.abbrev, 0, 0, true)?;
        let display = value.display();
        self.push(
            parent,
            Item {
                kind: ItemKind::Field(hf),
                range: ByteRange::new(0, 0),
                value,
                display,
                generated: true,
                parent: None,
                children: SmallVec::new(),
            },
        )
    }

    /// Append a protocol item that groups one dissector's fields.
    ///
    /// `label` overrides the protocol's registered name when non-empty.
    pub fn add_protocol(
        &mut self,
        parent: ItemId,
        hf: &'static HeaderField,
        offset: usize,
        length: usize,
        label: String,
    ) -> Result<ItemId, TreeError> {
        self.add_field_with_display(parent, hf, offset, length, FieldValue::None, label)
    }

    /// Append a labeled subtree; the label is fixed at creation.
    pub fn add_subtree(
        &mut self,
        parent: ItemId,
        offset: usize,
        length: usize,
        label: String,
    ) -> Result<ItemId, TreeError> {
        self.check_range("text", offset, length, false)?;
        self.push(
            parent,
            Item {
                kind: ItemKind::Text,
                range: ByteRange::new(offset, length),
                value: FieldValue::None,
                display: label,
                generated: false,
                parent: None,
                children: SmallVec::new(),
            },
        )
    }

    /// Flag an existing item as synthetic.
    pub fn mark_generated(&mut self, id: ItemId) {
        if let Some(item) = self.items.get_mut(id.0) {
            item.generated = true;
        }
    }

    /// Attach a free-form note to an item.
    ///
    /// Never fails; a handle from another tree attaches to the root.
    pub fn attach_note(&mut self, id: ItemId, severity: Severity, message: impl Into<String>) {
        let item = self.resolve(id);
        let message: String = message.into();
        self.notes.push(ExpertNote {
            item,
            severity,
            group: ExpertGroup::Protocol,
            abbrev: None,
            message: message.into(),
        });
    }

    /// Attach a registered expert info with its default summary.
    pub fn add_expert(&mut self, id: ItemId, info: &'static ExpertInfo) {
        self.add_expert_message(id, info, info.summary);
    }

    /// Attach a registered expert info with a custom message.
    pub fn add_expert_message(
        &mut self,
        id: ItemId,
        info: &'static ExpertInfo,
        message: impl Into<String>,
    ) {
        let item = self.resolve(id);
        let message: String = message.into();
        self.notes.push(ExpertNote {
            item,
            severity: info.severity,
            group: info.group,
            abbrev: Some(info.abbrev),
            message: message.into(),
        });
    }

    fn resolve(&self, id: ItemId) -> ItemId {
        if id.0 < self.items.len() {
            id
        } else {
            ItemId::ROOT
        }
    }

    /// Look up an item.
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0)
    }

    /// Children of an item, in insertion order.
    pub fn children(&self, id: ItemId) -> impl Iterator<Item = (ItemId, &Item)> {
        self.get(id)
            .map(|item| item.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&child| (child, &self.items[child.0]))
    }

    /// All items except the root, in insertion order.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, item)| (ItemId(i), item))
    }

    /// Depth-first walk in display order, yielding `(depth, id, item)`.
    ///
    /// Children of the root have depth 0.
    pub fn walk(&self) -> Vec<(usize, ItemId, &Item)> {
        let mut out = Vec::with_capacity(self.items.len());
        let mut stack: Vec<(usize, ItemId)> = self.items[0]
            .children
            .iter()
            .rev()
            .map(|&id| (0, id))
            .collect();
        while let Some((depth, id)) = stack.pop() {
            let item = &self.items[id.0];
            out.push((depth, id, item));
            stack.extend(item.children.iter().rev().map(|&c| (depth + 1, c)));
        }
        out
    }

    /// Number of items, excluding the root.
    pub fn len(&self) -> usize {
        self.items.len() - 1
    }

    /// Check if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.items.len() == 1
    }

    /// All expert notes, in the order they were attached.
    pub fn notes(&self) -> &[ExpertNote] {
        &self.notes
    }

    /// Notes attached to a single item.
    pub fn notes_for(&self, id: ItemId) -> impl Iterator<Item = &ExpertNote> {
        self.notes.iter().filter(move |note| note.item == id)
    }

    /// First item for a field abbreviation, in insertion order.
    pub fn find(&self, abbrev: &str) -> Option<(ItemId, &Item)> {
        self.items().find(|(_, item)| item.abbrev() == Some(abbrev))
    }

    /// Every item for a field abbreviation, in insertion order.
    pub fn find_all<'a>(&'a self, abbrev: &'a str) -> impl Iterator<Item = (ItemId, &'a Item)> {
        self.items()
            .filter(move |(_, item)| item.abbrev() == Some(abbrev))
    }

    /// Highest severity among all notes.
    pub fn max_severity(&self) -> Option<Severity> {
        self.notes.iter().map(|note| note.severity).max()
    }
}
