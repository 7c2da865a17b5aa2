//! Stack-based construction of compact binary documents.
//!
//! Each open object or array is a scope on a stack. A scope collects its members' bytes, and when
//! it is closed its size (and element count, for arrays) is prefixed once and the result is
//! appended to the enclosing scope. The bottom of the stack is the document root, which accepts
//! any number of unnamed fields.
//!
//! Misuse is a programming error and panics: closing a scope of the wrong kind, naming a field in
//! an array, leaving an object member unnamed, writing the wrong kind into a uniform container, closing
//! an array longer than [`MAX_ARRAY_LEN`](crate::MAX_ARRAY_LEN), or finishing while a scope is
//! still open.

use byteorder::{BigEndian, WriteBytesExt};
use tracing::trace;
use uuid::Uuid;

use crate::{
    field::Field,
    field_type::{FieldType, TypeByte},
    hash::{Blake3Hash, IoHash},
    integer::Integer,
    time::{DateTime, TimeSpan},
    varint, MAX_ARRAY_LEN,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeKind {
    Root,
    Object,
    Array,
}

/// Output bytes, either written by the writer or borrowed from the caller.
#[derive(Clone, Debug)]
enum Segment<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a [u8]),
}

impl Segment<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Segment::Owned(v) => v,
            Segment::Borrowed(s) => s,
        }
    }
}

#[derive(Debug)]
struct Scope<'a> {
    kind: ScopeKind,
    /// Shared member type of a uniform container. Carries the name flag for uniform objects.
    uniform: Option<TypeByte>,
    count: u64,
    /// Finished runs of output, in order, followed by `buf`.
    segments: Vec<Segment<'a>>,
    segments_len: usize,
    buf: Vec<u8>,
}

impl<'a> Scope<'a> {
    fn new(kind: ScopeKind, uniform: Option<TypeByte>) -> Self {
        Scope {
            kind,
            uniform,
            count: 0,
            segments: Vec::new(),
            segments_len: 0,
            buf: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.segments_len + self.buf.len()
    }

    fn push_borrowed(&mut self, data: &'a [u8]) {
        if !self.buf.is_empty() {
            let owned = std::mem::take(&mut self.buf);
            self.segments_len += owned.len();
            self.segments.push(Segment::Owned(owned));
        }
        self.segments_len += data.len();
        self.segments.push(Segment::Borrowed(data));
    }

    /// Move this scope's output onto the end of `parent`, copying owned bytes and keeping borrowed
    /// ones borrowed.
    fn append_to(self, parent: &mut Scope<'a>) {
        for segment in self.segments {
            match segment {
                Segment::Owned(v) => parent.buf.extend_from_slice(&v),
                Segment::Borrowed(s) => parent.push_borrowed(s),
            }
        }
        parent.buf.extend_from_slice(&self.buf);
    }
}

/// Builder for a compact binary document.
///
/// Fields named with `write_*(name, value)` go into objects; `write_*_value(value)` fields go into
/// arrays and the document root. The `'a` lifetime covers bytes borrowed through
/// [`write_binary_reference`](Self::write_binary_reference).
///
/// ```
/// # use compact_binary::{Field, Writer};
/// let mut writer = Writer::new();
/// writer.begin_object_value();
/// writer.write_string("name", "widget");
/// writer.begin_array("sizes");
/// writer.write_integer_value(3);
/// writer.write_integer_value(5);
/// writer.end_array();
/// writer.end_object();
/// let bytes = writer.to_vec();
///
/// let mut doc = Field::new(&bytes).unwrap();
/// assert_eq!(doc.as_object().find("name").as_string(""), "widget");
/// ```
#[derive(Debug)]
pub struct Writer<'a> {
    stack: Vec<Scope<'a>>,
}

impl Default for Writer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Writer<'a> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Start with room for `capacity` bytes of output.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut root = Scope::new(ScopeKind::Root, None);
        root.buf.reserve(capacity);
        Writer { stack: vec![root] }
    }

    fn top(&mut self) -> &mut Scope<'a> {
        // The root scope is never popped.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Start a field of `kind` in the current scope: type byte (unless the scope is uniform) and
    /// name.
    fn begin_field(&mut self, name: Option<&str>, kind: FieldType) {
        let scope = self.top();
        match scope.kind {
            ScopeKind::Object => assert!(name.is_some(), "object members must be named"),
            ScopeKind::Array | ScopeKind::Root => {
                assert!(name.is_none(), "array elements can't be named")
            }
        }
        match scope.uniform {
            Some(shared) => assert_eq!(
                shared.kind(),
                kind,
                "uniform container holds {} fields, not {}",
                shared.kind(),
                kind
            ),
            None => scope
                .buf
                .push(TypeByte::new(kind, name.is_some()).into_u8()),
        }
        if let Some(name) = name {
            varint::write_u64(&mut scope.buf, name.len() as u64);
            scope.buf.extend_from_slice(name.as_bytes());
        }
        scope.count += 1;
    }

    pub(crate) fn write(&mut self, name: Option<&str>, kind: FieldType, payload: &[u8]) {
        self.begin_field(name, kind);
        self.top().buf.extend_from_slice(payload);
    }

    pub(crate) fn write_sized(&mut self, name: Option<&str>, kind: FieldType, data: &[u8]) {
        self.begin_field(name, kind);
        let buf = &mut self.top().buf;
        varint::write_u64(buf, data.len() as u64);
        buf.extend_from_slice(data);
    }

    pub(crate) fn begin_scope(
        &mut self,
        name: Option<&str>,
        kind: FieldType,
        member: Option<FieldType>,
    ) {
        self.begin_field(name, kind);
        let (scope_kind, uniform) = if kind.is_object() {
            (ScopeKind::Object, member.map(FieldType::with_name))
        } else {
            (ScopeKind::Array, member.map(TypeByte::from))
        };
        self.stack.push(Scope::new(scope_kind, uniform));
    }

    fn end_scope(&mut self, expected: ScopeKind) {
        let top = self.top().kind;
        assert!(
            top == expected,
            "tried to end {:?} scope while in {:?} scope",
            expected,
            top
        );
        let Some(scope) = self.stack.pop() else {
            unreachable!("root scope is never popped")
        };
        if expected == ScopeKind::Array {
            assert!(
                scope.count <= MAX_ARRAY_LEN,
                "array of {} elements is longer than {}",
                scope.count,
                MAX_ARRAY_LEN
            );
        }
        let parent = self.top();

        let mut header = Vec::with_capacity(2 * varint::MAX_VARUINT_LEN + 1);
        if expected == ScopeKind::Array {
            varint::write_u64(&mut header, scope.count);
        }
        // Uniform arrays always carry their member type. Uniform objects only do when non-empty.
        if let Some(shared) = scope.uniform {
            if expected == ScopeKind::Array || scope.count > 0 {
                header.push(shared.into_u8());
            }
        }
        let size = header.len() + scope.len();
        trace!(
            scope = ?expected,
            uniform = scope.uniform.is_some(),
            count = scope.count,
            size,
            "closed writer scope"
        );
        varint::write_u64(&mut parent.buf, size as u64);
        parent.buf.extend_from_slice(&header);
        scope.append_to(parent);
    }

    /// Open a named object inside an object.
    pub fn begin_object(&mut self, name: &str) {
        self.begin_scope(Some(name), FieldType::Object, None)
    }

    /// Open an unnamed object inside an array or at the root.
    pub fn begin_object_value(&mut self) {
        self.begin_scope(None, FieldType::Object, None)
    }

    /// Open a named object whose members are all of kind `member`.
    pub fn begin_uniform_object(&mut self, name: &str, member: FieldType) {
        self.begin_scope(Some(name), FieldType::UniformObject, Some(member))
    }

    pub fn begin_uniform_object_value(&mut self, member: FieldType) {
        self.begin_scope(None, FieldType::UniformObject, Some(member))
    }

    /// Close the innermost scope, which must be an object.
    pub fn end_object(&mut self) {
        self.end_scope(ScopeKind::Object)
    }

    pub fn begin_array(&mut self, name: &str) {
        self.begin_scope(Some(name), FieldType::Array, None)
    }

    pub fn begin_array_value(&mut self) {
        self.begin_scope(None, FieldType::Array, None)
    }

    /// Open a named array whose elements are all of kind `element`, stored without per-element
    /// type bytes.
    pub fn begin_uniform_array(&mut self, name: &str, element: FieldType) {
        self.begin_scope(Some(name), FieldType::UniformArray, Some(element))
    }

    pub fn begin_uniform_array_value(&mut self, element: FieldType) {
        self.begin_scope(None, FieldType::UniformArray, Some(element))
    }

    /// Close the innermost scope, which must be an array.
    pub fn end_array(&mut self) {
        self.end_scope(ScopeKind::Array)
    }

    pub fn write_null(&mut self, name: &str) {
        self.write(Some(name), FieldType::Null, &[])
    }

    pub fn write_null_value(&mut self) {
        self.write(None, FieldType::Null, &[])
    }

    fn bool_kind(v: bool) -> FieldType {
        if v {
            FieldType::BoolTrue
        } else {
            FieldType::BoolFalse
        }
    }

    pub fn write_bool(&mut self, name: &str, v: bool) {
        self.write(Some(name), Self::bool_kind(v), &[])
    }

    pub fn write_bool_value(&mut self, v: bool) {
        self.write(None, Self::bool_kind(v), &[])
    }

    pub(crate) fn write_int(&mut self, name: Option<&str>, v: Integer) {
        self.begin_field(name, v.kind());
        varint::write_u64(&mut self.top().buf, v.payload());
    }

    /// Negative values are written as IntegerNegative, everything else as IntegerPositive.
    pub fn write_integer(&mut self, name: &str, v: impl Into<Integer>) {
        self.write_int(Some(name), v.into())
    }

    pub fn write_integer_value(&mut self, v: impl Into<Integer>) {
        self.write_int(None, v.into())
    }

    pub(crate) fn write_f32(&mut self, name: Option<&str>, v: f32) {
        self.begin_field(name, FieldType::Float32);
        // Writing into a Vec can't fail.
        let _ = self.top().buf.write_f32::<BigEndian>(v);
    }

    pub(crate) fn write_f64(&mut self, name: Option<&str>, v: f64) {
        self.begin_field(name, FieldType::Float64);
        let _ = self.top().buf.write_f64::<BigEndian>(v);
    }

    pub fn write_float32(&mut self, name: &str, v: f32) {
        self.write_f32(Some(name), v)
    }

    pub fn write_float32_value(&mut self, v: f32) {
        self.write_f32(None, v)
    }

    pub fn write_float64(&mut self, name: &str, v: f64) {
        self.write_f64(Some(name), v)
    }

    pub fn write_float64_value(&mut self, v: f64) {
        self.write_f64(None, v)
    }

    pub fn write_string(&mut self, name: &str, v: &str) {
        self.write_sized(Some(name), FieldType::String, v.as_bytes())
    }

    pub fn write_string_value(&mut self, v: &str) {
        self.write_sized(None, FieldType::String, v.as_bytes())
    }

    /// Copies `v` into the output.
    pub fn write_binary(&mut self, name: &str, v: &[u8]) {
        self.write_sized(Some(name), FieldType::Binary, v)
    }

    pub fn write_binary_value(&mut self, v: &[u8]) {
        self.write_sized(None, FieldType::Binary, v)
    }

    fn write_binary_ref(&mut self, name: Option<&str>, v: &'a [u8]) {
        self.begin_field(name, FieldType::Binary);
        let scope = self.top();
        varint::write_u64(&mut scope.buf, v.len() as u64);
        scope.push_borrowed(v);
    }

    /// Like [`write_binary`](Self::write_binary), but `v` is referenced rather than copied until
    /// the output is assembled.
    pub fn write_binary_reference(&mut self, name: &str, v: &'a [u8]) {
        self.write_binary_ref(Some(name), v)
    }

    pub fn write_binary_reference_value(&mut self, v: &'a [u8]) {
        self.write_binary_ref(None, v)
    }

    pub fn write_hash(&mut self, name: &str, v: IoHash) {
        self.write(Some(name), FieldType::Hash, v.as_ref())
    }

    pub fn write_hash_value(&mut self, v: IoHash) {
        self.write(None, FieldType::Hash, v.as_ref())
    }

    /// Reference another compact binary document by its hash.
    pub fn write_object_attachment(&mut self, name: &str, v: IoHash) {
        self.write(Some(name), FieldType::ObjectAttachment, v.as_ref())
    }

    pub fn write_object_attachment_value(&mut self, v: IoHash) {
        self.write(None, FieldType::ObjectAttachment, v.as_ref())
    }

    /// Reference an opaque blob by its hash.
    pub fn write_binary_attachment(&mut self, name: &str, v: IoHash) {
        self.write(Some(name), FieldType::BinaryAttachment, v.as_ref())
    }

    pub fn write_binary_attachment_value(&mut self, v: IoHash) {
        self.write(None, FieldType::BinaryAttachment, v.as_ref())
    }

    /// Stored in GUID byte order, the inverse of [`Field::as_uuid`].
    pub fn write_uuid(&mut self, name: &str, v: Uuid) {
        self.write(Some(name), FieldType::Uuid, &v.to_bytes_le())
    }

    pub fn write_uuid_value(&mut self, v: Uuid) {
        self.write(None, FieldType::Uuid, &v.to_bytes_le())
    }

    pub fn write_date_time(&mut self, name: &str, v: DateTime) {
        self.write(Some(name), FieldType::DateTime, &v.to_payload())
    }

    pub fn write_date_time_value(&mut self, v: DateTime) {
        self.write(None, FieldType::DateTime, &v.to_payload())
    }

    pub fn write_time_span(&mut self, name: &str, v: TimeSpan) {
        self.write(Some(name), FieldType::TimeSpan, &v.to_payload())
    }

    pub fn write_time_span_value(&mut self, v: TimeSpan) {
        self.write(None, FieldType::TimeSpan, &v.to_payload())
    }

    /// Copy the value of an already encoded field under a new name. The field's own name is
    /// dropped.
    pub fn write_field(&mut self, name: &str, field: &Field) {
        self.write(Some(name), field.kind(), field.payload())
    }

    pub fn write_field_value(&mut self, field: &Field) {
        self.write(None, field.kind(), field.payload())
    }

    fn root(&self) -> &Scope<'a> {
        assert!(
            self.stack.len() == 1,
            "{} writer scope(s) still open",
            self.stack.len() - 1
        );
        &self.stack[0]
    }

    /// The finished output as a run of byte slices, in order.
    ///
    /// # Panics
    ///
    /// If a scope is still open.
    pub fn segments(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let root = self.root();
        root.segments
            .iter()
            .map(Segment::as_slice)
            .chain(std::iter::once(&root.buf[..]))
            .filter(|s| !s.is_empty())
    }

    /// Total output length.
    ///
    /// # Panics
    ///
    /// If a scope is still open.
    pub fn size(&self) -> usize {
        self.root().len()
    }

    /// Assemble the finished output.
    ///
    /// # Panics
    ///
    /// If a scope is still open.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        for segment in self.segments() {
            out.extend_from_slice(segment);
        }
        out
    }

    /// BLAKE3 of the output, without assembling it.
    ///
    /// # Panics
    ///
    /// If a scope is still open.
    pub fn compute_hash(&self) -> Blake3Hash {
        let mut hasher = blake3::Hasher::new();
        for segment in self.segments() {
            hasher.update(segment);
        }
        Blake3Hash::from_hasher(&hasher)
    }

    /// Drop all output and open scopes, keeping allocated capacity of the root.
    pub fn reset(&mut self) {
        self.stack.truncate(1);
        let root = self.top();
        root.segments.clear();
        root.segments_len = 0;
        root.buf.clear();
        root.count = 0;
    }
}
