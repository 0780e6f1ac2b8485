use bitflags::bitflags;

use crate::Picture;

/// Index of a field inside the schema arena.
pub type FieldId = usize;

/// Reserved name for storage-consuming, never-exposed fields.
pub const FILLER: &str = "FILLER";

bitflags! {
    /// Boolean clauses recorded on a field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldFlags: u8 {
        const SIGN_LEADING = 0x01;
        const SIGN_SEPARATE = 0x02;
        const JUSTIFIED_RIGHT = 0x04;
        const BLANK_WHEN_ZERO = 0x08;
        /// Recorded but advisory: no alignment padding is applied.
        const SYNCHRONIZED = 0x10;
    }
}

/// Physical storage kind of an elementary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    /// One byte per character position (default).
    Display,
    /// Big-endian two's-complement binary (COMP / COMP-4 / BINARY).
    Binary,
    /// IEEE-754 single float, big-endian (COMP-1).
    SingleFloat,
    /// IEEE-754 double float, big-endian (COMP-2).
    DoubleFloat,
    /// Packed decimal with a trailing sign nibble (COMP-3 / PACKED-DECIMAL).
    PackedDecimal,
    /// Host-byte-order two's-complement binary (COMP-5).
    NativeBinary,
    /// Packed decimal without a sign nibble (COMP-6).
    UnsignedPacked,
}

impl Usage {
    /// Parses a usage keyword. Bare `COMP` aliases `COMP-4`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.to_ascii_uppercase();
        match token.as_str() {
            "DISPLAY" => Some(Self::Display),
            "COMP" | "COMP-4" | "BINARY" | "COMPUTATIONAL" | "COMPUTATIONAL-4" => Some(Self::Binary),
            "COMP-1" | "COMPUTATIONAL-1" => Some(Self::SingleFloat),
            "COMP-2" | "COMPUTATIONAL-2" => Some(Self::DoubleFloat),
            "COMP-3" | "COMPUTATIONAL-3" | "PACKED-DECIMAL" => Some(Self::PackedDecimal),
            "COMP-5" | "COMPUTATIONAL-5" => Some(Self::NativeBinary),
            "COMP-6" | "COMPUTATIONAL-6" => Some(Self::UnsignedPacked),
            _ => None,
        }
    }
}

/// A level-88 condition name attached to its parent data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub name: String,
    pub literal: String,
}

/// One node of the copybook tree.
///
/// Fields live in the [`Schema`] arena and refer to their children by index;
/// there are no parent back-references.
#[derive(Debug, Clone)]
pub struct Field {
    pub level: u8,
    pub name: String,
    pub picture: Option<Picture>,
    /// Explicit usage clause; `None` means DISPLAY.
    pub usage: Option<Usage>,
    pub occurs: Option<u32>,
    /// Name of the sibling this field overlays, as written.
    pub redefines: Option<String>,
    /// VALUE literal, recorded for reference.
    pub value: Option<String>,
    pub flags: FieldFlags,
    pub conditions: Vec<Condition>,
    pub children: Vec<FieldId>,
    /// Bytes occupied by one instance, including OCCURS repetitions.
    /// Zero until layout resolution.
    pub size: usize,
    /// Byte offset from record start. Zero until layout resolution.
    pub offset: usize,
    /// Arena index of the REDEFINES target, filled in by layout resolution.
    pub redefines_target: Option<FieldId>,
}

impl Field {
    pub(crate) fn new(level: u8, name: String) -> Self {
        Self {
            level,
            name,
            picture: None,
            usage: None,
            occurs: None,
            redefines: None,
            value: None,
            flags: FieldFlags::empty(),
            conditions: Vec::new(),
            children: Vec::new(),
            size: 0,
            offset: 0,
            redefines_target: None,
        }
    }

    #[must_use]
    pub fn is_filler(&self) -> bool {
        self.name == FILLER
    }

    /// A field is a group iff it has children.
    #[must_use]
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    /// Effective usage; absence of a clause means DISPLAY.
    #[must_use]
    pub fn usage(&self) -> Usage {
        self.usage.unwrap_or(Usage::Display)
    }

    /// Implied fractional digits from the picture's `V`.
    #[must_use]
    pub fn scale(&self) -> u8 {
        self.picture.as_ref().map_or(0, Picture::scale)
    }

    /// `true` iff the picture carries a leading `S`.
    #[must_use]
    pub fn signed(&self) -> bool {
        self.picture.as_ref().is_some_and(Picture::signed)
    }

    /// Size of a single OCCURS element (equal to `size` when there is no
    /// OCCURS clause).
    #[must_use]
    pub fn element_size(&self) -> usize {
        match self.occurs {
            Some(n) if n > 1 => self.size / n as usize,
            _ => self.size,
        }
    }
}

/// The parsed copybook: an arena of fields rooted at a synthetic level-0
/// group.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) fields: Vec<Field>,
    pub(crate) root: FieldId,
}

impl Schema {
    pub(crate) fn new() -> Self {
        let root = Field::new(0, "ROOT".to_owned());
        Self {
            fields: vec![root],
            root: 0,
        }
    }

    pub(crate) fn push(&mut self, field: Field) -> FieldId {
        let id = self.fields.len();
        self.fields.push(field);
        id
    }

    #[must_use]
    pub fn root(&self) -> FieldId {
        self.root
    }

    #[must_use]
    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id]
    }

    pub(crate) fn field_mut(&mut self, id: FieldId) -> &mut Field {
        &mut self.fields[id]
    }

    /// Number of fields in the arena, the synthetic root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Depth-first iteration over all field ids, root first.
    pub fn iter_depth_first(&self) -> impl Iterator<Item = FieldId> + '_ {
        let mut stack = vec![self.root];
        core::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.fields[id].children.iter().rev().copied());
            Some(id)
        })
    }

    /// Finds a field by name anywhere in the tree (first match in
    /// depth-first order).
    #[must_use]
    pub fn find(&self, name: &str) -> Option<FieldId> {
        self.iter_depth_first().find(|&id| self.fields[id].name == name)
    }
}
