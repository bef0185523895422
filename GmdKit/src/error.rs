//! Error types for `GmdKit`

use std::fmt;

use thiserror::Error;

/// Direction of the codec call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Decode,
    Encode,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Decode => f.write_str("decode"),
            Operation::Encode => f.write_str("encode"),
        }
    }
}

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named structure field, header region or copied field.
    Field(&'static str),
    /// An element of a fixed-size array or a region array.
    Index(usize),
}

/// Location of a value inside a nested record, rendered as `a.b.c[2].d`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    fn prepend(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// The error type for `GmdKit` operations.
///
/// Every codec failure carries the operation and the field path of the value
/// that failed. Leaf codecs create errors with an empty path and each enclosing
/// structure, array or file region prepends its own segment.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Value Errors ====================
    /// Integer outside the declared inclusive range of its descriptor.
    #[error("{op} failed at {path}: value {value} outside range [{lo}, {hi}]")]
    Range {
        op: Operation,
        path: FieldPath,
        value: String,
        lo: String,
        hi: String,
    },

    /// Domain value does not fit the descriptor's domain type.
    #[error("{op} failed at {path}: {message}")]
    Type {
        op: Operation,
        path: FieldPath,
        message: String,
    },

    /// Fixed-size array or ASCII string length mismatch.
    #[error("{op} failed at {path}: expected length {expected}, got {actual}")]
    Length {
        op: Operation,
        path: FieldPath,
        expected: usize,
        actual: usize,
    },

    // ==================== Container Errors ====================
    /// The file-endianness byte is neither 0 (little) nor 1 (big).
    #[error("{op} failed at {path}: invalid file endianness byte {value} (expected 0 or 1)")]
    Endianness {
        op: Operation,
        path: FieldPath,
        value: u8,
    },

    /// The version major is not one of the supported schema families.
    #[error("{op} failed at {path}: unsupported GMD version {major}.{minor}")]
    UnknownVersion {
        op: Operation,
        path: FieldPath,
        major: u16,
        minor: u16,
    },

    /// A read or pointer range extends past the buffer or into the header.
    #[error("{op} failed at {path}: range {offset}+{length} outside buffer of {available} bytes")]
    Offset {
        op: Operation,
        path: FieldPath,
        offset: usize,
        length: usize,
        available: usize,
    },

    /// A structure validator rejected the decoded value.
    #[error("{op} failed at {path}: {message}")]
    Validator {
        op: Operation,
        path: FieldPath,
        message: String,
    },

    /// An inner codec could not represent the value on encode.
    #[error("{op} failed at {path}: {message}")]
    Encoding {
        op: Operation,
        path: FieldPath,
        message: String,
    },

    // ==================== Descriptor Errors ====================
    /// A structure descriptor was declared inconsistently.
    #[error("invalid descriptor {descriptor}: {message}")]
    Schema {
        descriptor: &'static str,
        message: String,
    },
}

impl Error {
    pub fn range(op: Operation, value: impl fmt::Display, lo: impl fmt::Display, hi: impl fmt::Display) -> Self {
        Error::Range {
            op,
            path: FieldPath::new(),
            value: value.to_string(),
            lo: lo.to_string(),
            hi: hi.to_string(),
        }
    }

    pub fn type_mismatch(op: Operation, message: impl Into<String>) -> Self {
        Error::Type { op, path: FieldPath::new(), message: message.into() }
    }

    pub fn length(op: Operation, expected: usize, actual: usize) -> Self {
        Error::Length { op, path: FieldPath::new(), expected, actual }
    }

    pub fn validator(op: Operation, message: impl Into<String>) -> Self {
        Error::Validator { op, path: FieldPath::new(), message: message.into() }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Error::Encoding { op: Operation::Encode, path: FieldPath::new(), message: message.into() }
    }

    /// The operation this error was raised under, if it came from a codec call.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Error::Range { op, .. }
            | Error::Type { op, .. }
            | Error::Length { op, .. }
            | Error::Endianness { op, .. }
            | Error::UnknownVersion { op, .. }
            | Error::Offset { op, .. }
            | Error::Validator { op, .. }
            | Error::Encoding { op, .. } => Some(*op),
            Error::Schema { .. } => None,
        }
    }

    /// Field path of the failing value. Descriptor errors have no path.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Error::Range { path, .. }
            | Error::Type { path, .. }
            | Error::Length { path, .. }
            | Error::Endianness { path, .. }
            | Error::UnknownVersion { path, .. }
            | Error::Offset { path, .. }
            | Error::Validator { path, .. }
            | Error::Encoding { path, .. } => Some(path),
            Error::Schema { .. } => None,
        }
    }

    fn path_mut(&mut self) -> Option<&mut FieldPath> {
        match self {
            Error::Range { path, .. }
            | Error::Type { path, .. }
            | Error::Length { path, .. }
            | Error::Endianness { path, .. }
            | Error::UnknownVersion { path, .. }
            | Error::Offset { path, .. }
            | Error::Validator { path, .. }
            | Error::Encoding { path, .. } => Some(path),
            Error::Schema { .. } => None,
        }
    }

    /// Prefix the path with a named field.
    #[must_use]
    pub fn in_field(mut self, name: &'static str) -> Self {
        if let Some(path) = self.path_mut() {
            path.prepend(PathSegment::Field(name));
        }
        self
    }

    /// Prefix the path with an element index.
    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        if let Some(path) = self.path_mut() {
            path.prepend(PathSegment::Index(index));
        }
        self
    }
}

/// A specialized Result type for `GmdKit` operations.
pub type Result<T> = std::result::Result<T, Error>;
