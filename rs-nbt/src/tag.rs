use std::collections::BTreeMap;

use crate::NbtError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    End,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    ByteArray,
    String,
    List,
    Compound,
    IntArray,
    LongArray,
}

impl TagType {
    pub fn id(self) -> u8 {
        match self {
            TagType::End => 0,
            TagType::Byte => 1,
            TagType::Short => 2,
            TagType::Int => 3,
            TagType::Long => 4,
            TagType::Float => 5,
            TagType::Double => 6,
            TagType::ByteArray => 7,
            TagType::String => 8,
            TagType::List => 9,
            TagType::Compound => 10,
            TagType::IntArray => 11,
            TagType::LongArray => 12,
        }
    }

    pub fn from_id(id: u8) -> Result<TagType, NbtError> {
        Ok(match id {
            0 => TagType::End,
            1 => TagType::Byte,
            2 => TagType::Short,
            3 => TagType::Int,
            4 => TagType::Long,
            5 => TagType::Float,
            6 => TagType::Double,
            7 => TagType::ByteArray,
            8 => TagType::String,
            9 => TagType::List,
            10 => TagType::Compound,
            11 => TagType::IntArray,
            12 => TagType::LongArray,
            other => return Err(NbtError::UnknownTag(other)),
        })
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TagType::Byte
                | TagType::Short
                | TagType::Int
                | TagType::Long
                | TagType::Float
                | TagType::Double
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(List),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn tag_type(&self) -> TagType {
        match self {
            Tag::Byte(_) => TagType::Byte,
            Tag::Short(_) => TagType::Short,
            Tag::Int(_) => TagType::Int,
            Tag::Long(_) => TagType::Long,
            Tag::Float(_) => TagType::Float,
            Tag::Double(_) => TagType::Double,
            Tag::ByteArray(_) => TagType::ByteArray,
            Tag::String(_) => TagType::String,
            Tag::List(_) => TagType::List,
            Tag::Compound(_) => TagType::Compound,
            Tag::IntArray(_) => TagType::IntArray,
            Tag::LongArray(_) => TagType::LongArray,
        }
    }

    /// Numeric value of any number tag, `None` for everything else.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Tag::Byte(v) => Some(v as f64),
            Tag::Short(v) => Some(v as f64),
            Tag::Int(v) => Some(v as f64),
            Tag::Long(v) => Some(v as f64),
            Tag::Float(v) => Some(v as f64),
            Tag::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Integer value of any number tag; floating values truncate toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Tag::Byte(v) => Some(v as i64),
            Tag::Short(v) => Some(v as i64),
            Tag::Int(v) => Some(v as i64),
            Tag::Long(v) => Some(v),
            Tag::Float(v) => Some(v as i64),
            Tag::Double(v) => Some(v as i64),
            _ => None,
        }
    }
}

macro_rules! tag_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Tag {
            fn from(v: $ty) -> Tag {
                Tag::$variant(v)
            }
        })*
    };
}

tag_from! {
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Vec<i8> => ByteArray,
    String => String,
    List => List,
    Compound => Compound,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
}

impl From<&str> for Tag {
    fn from(v: &str) -> Tag {
        Tag::String(v.to_string())
    }
}

impl From<bool> for Tag {
    fn from(v: bool) -> Tag {
        Tag::Byte(v as i8)
    }
}

/// Homogeneous list. An empty list still remembers its element type.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    element: TagType,
    values: Vec<Tag>,
}

impl Default for List {
    fn default() -> Self {
        Self::new(TagType::End)
    }
}

impl List {
    pub fn new(element: TagType) -> Self {
        Self {
            element,
            values: Vec::new(),
        }
    }

    pub fn element(&self) -> TagType {
        self.element
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.values.iter()
    }

    pub fn push(&mut self, tag: impl Into<Tag>) -> Result<(), NbtError> {
        let tag = tag.into();
        let found = tag.tag_type();
        if self.element == TagType::End && self.values.is_empty() {
            self.element = found;
        } else if self.element != found {
            return Err(NbtError::ListTypeMismatch {
                expected: self.element,
                found,
            });
        }
        self.values.push(tag);
        Ok(())
    }

    pub fn numeric(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(Tag::as_f64)
    }

    pub fn integer(&self, index: usize) -> Option<i64> {
        self.values.get(index).and_then(Tag::as_i64)
    }

    pub fn compounds(&self) -> impl Iterator<Item = &Compound> {
        self.values.iter().filter_map(|tag| match tag {
            Tag::Compound(c) => Some(c),
            _ => None,
        })
    }

    pub fn of_bytes(values: &[i8]) -> Self {
        Self::from_homogeneous(TagType::Byte, values.iter().map(|&v| Tag::Byte(v)))
    }

    pub fn of_shorts(values: &[i16]) -> Self {
        Self::from_homogeneous(TagType::Short, values.iter().map(|&v| Tag::Short(v)))
    }

    pub fn of_ints(values: &[i32]) -> Self {
        Self::from_homogeneous(TagType::Int, values.iter().map(|&v| Tag::Int(v)))
    }

    pub fn of_floats(values: &[f32]) -> Self {
        Self::from_homogeneous(TagType::Float, values.iter().map(|&v| Tag::Float(v)))
    }

    pub fn of_strings<S: AsRef<str>>(values: &[S]) -> Self {
        Self::from_homogeneous(
            TagType::String,
            values.iter().map(|v| Tag::String(v.as_ref().to_string())),
        )
    }

    pub fn of_compounds(values: impl IntoIterator<Item = Compound>) -> Self {
        Self::from_homogeneous(TagType::Compound, values.into_iter().map(Tag::Compound))
    }

    fn from_homogeneous(element: TagType, values: impl Iterator<Item = Tag>) -> Self {
        Self {
            element,
            values: values.collect(),
        }
    }

    /// Used by the reader, which has already checked every element type.
    pub(crate) fn from_parts(element: TagType, values: Vec<Tag>) -> Self {
        Self { element, values }
    }
}

/// Keyed tags. Keys are kept sorted so encoding is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    entries: BTreeMap<String, Tag>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, tag: impl Into<Tag>) -> Option<Tag> {
        self.entries.insert(key.into(), tag.into())
    }

    /// Builder form of [`Compound::insert`].
    pub fn with(mut self, key: impl Into<String>, tag: impl Into<Tag>) -> Self {
        self.insert(key, tag);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_byte(&self, key: &str) -> Option<i8> {
        self.get(key).and_then(Tag::as_i64).map(|v| v as i8)
    }

    pub fn get_short(&self, key: &str) -> Option<i16> {
        self.get(key).and_then(Tag::as_i64).map(|v| v as i16)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(Tag::as_i64).map(|v| v as i32)
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(Tag::as_f64).map(|v| v as f32)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_byte(key).map(|v| v != 0)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Tag::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_byte_array(&self, key: &str) -> Option<&[i8]> {
        match self.get(key) {
            Some(Tag::ByteArray(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_compound(&self, key: &str) -> Option<&Compound> {
        match self.get(key) {
            Some(Tag::Compound(c)) => Some(c),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&List> {
        match self.get(key) {
            Some(Tag::List(l)) => Some(l),
            _ => None,
        }
    }
}
