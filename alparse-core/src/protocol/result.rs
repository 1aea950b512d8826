//! Result elements produced by one parser invocation.
//!
//! Field data either references the caller's input buffer directly
//! ([`FieldData::Borrowed`]) or owns a copy ([`FieldData::Owned`]) when the
//! field had to be reconstructed from carry-over bytes. The lifetime
//! parameter `'data` ties borrowed fields to the input of the call.

use smallvec::SmallVec;

/// Element flag: data is locally owned and freed with the element.
pub const RESULT_ELEMENT_ALLOC: u8 = 0x01;

/// Bytes of one parsed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldData<'data> {
    /// Zero-copy view into the input buffer, valid for the current call only.
    Borrowed(&'data [u8]),
    /// Owned copy, used when the field spans several calls.
    Owned(Vec<u8>),
}

impl FieldData<'_> {
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            FieldData::Borrowed(b) => b,
            FieldData::Owned(v) => v,
        }
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self, FieldData::Owned(_))
    }
}

/// One parsed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultElement<'data> {
    /// Local id of the logical field (e.g. a request-uri id).
    pub name_idx: u16,
    pub data: FieldData<'data>,
}

/// Result element that owns all its data, for consumers that outlive the call.
pub type OwnedResultElement = ResultElement<'static>;

impl<'data> ResultElement<'data> {
    pub fn borrowed(name_idx: u16, data: &'data [u8]) -> Self {
        Self {
            name_idx,
            data: FieldData::Borrowed(data),
        }
    }

    pub fn owned(name_idx: u16, data: Vec<u8>) -> Self {
        Self {
            name_idx,
            data: FieldData::Owned(data),
        }
    }

    /// Element flags byte ([`RESULT_ELEMENT_ALLOC`] when owned).
    pub fn flags(&self) -> u8 {
        if self.data.is_owned() {
            RESULT_ELEMENT_ALLOC
        } else {
            0
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.as_slice().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Copy borrowed data out so the element no longer references the input.
    pub fn into_owned(self) -> OwnedResultElement {
        let data = match self.data {
            FieldData::Borrowed(b) => b.to_vec(),
            FieldData::Owned(v) => v,
        };
        ResultElement::owned(self.name_idx, data)
    }
}

/// Ordered, append-only list of fields produced by one parser call.
///
/// Uses SmallVec since most parsers emit a handful of fields per call.
/// Dropping the list releases owned element buffers; borrowed data belongs
/// to the caller.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput<'data> {
    elements: SmallVec<[ResultElement<'data>; 8]>,
}

impl<'data> ParseOutput<'data> {
    pub fn new() -> Self {
        Self {
            elements: SmallVec::new(),
        }
    }

    /// Create a list pre-sized for a parser's declared maximum output count.
    pub fn with_capacity(max_outputs: usize) -> Self {
        Self {
            elements: SmallVec::with_capacity(max_outputs),
        }
    }

    #[inline]
    pub fn push(&mut self, element: ResultElement<'data>) {
        self.elements.push(element);
    }

    /// Append a field that references the input buffer.
    #[inline]
    pub fn push_borrowed(&mut self, name_idx: u16, data: &'data [u8]) {
        self.push(ResultElement::borrowed(name_idx, data));
    }

    /// Append a field that owns its bytes.
    #[inline]
    pub fn push_owned(&mut self, name_idx: u16, data: Vec<u8>) {
        self.push(ResultElement::owned(name_idx, data));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultElement<'data>> {
        self.elements.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ResultElement<'data>> {
        self.elements.get(index)
    }

    /// First element carrying the given field id.
    pub fn find(&self, name_idx: u16) -> Option<&ResultElement<'data>> {
        self.elements.iter().find(|e| e.name_idx == name_idx)
    }

    /// Number of elements owning their data.
    pub fn owned_count(&self) -> usize {
        self.elements.iter().filter(|e| e.data.is_owned()).count()
    }

    /// Copy every element out of the input buffer.
    pub fn into_owned(self) -> Vec<OwnedResultElement> {
        self.elements
            .into_iter()
            .map(ResultElement::into_owned)
            .collect()
    }
}

impl<'a, 'data> IntoIterator for &'a ParseOutput<'data> {
    type Item = &'a ResultElement<'data>;
    type IntoIter = std::slice::Iter<'a, ResultElement<'data>>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
