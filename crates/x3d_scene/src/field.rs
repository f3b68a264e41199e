// SPDX-License-Identifier: MIT OR Apache-2.0
//! Field definitions: typed value slots owned by nodes.
//!
//! A field carries an X3D type tag, an access type fixed at declaration
//! time, its current value and a dirty flag. Multi-valued fields are stored
//! as a single `Vec` so a value is always replaced as a whole under the
//! field's lock.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a field within its node, resolved once from the field name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub u32);

impl FieldId {
    /// Position of the field in its node type's declaration list
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Access type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessType {
    /// Set once while the node is being built, never changed afterwards
    InitializeOnly,
    /// Receives events only
    InputOnly,
    /// Sends events only
    OutputOnly,
    /// Receives and sends events
    InputOutput,
}

impl AccessType {
    /// Whether the field may be the destination of a route
    pub fn accepts_input(self) -> bool {
        matches!(self, Self::InputOnly | Self::InputOutput)
    }

    /// Whether the field may be the source of a route
    pub fn produces_output(self) -> bool {
        matches!(self, Self::OutputOnly | Self::InputOutput)
    }

    /// Whether a caller outside the owning node may write the field
    pub fn is_externally_writable(self) -> bool {
        self.accepts_input()
    }

    /// X3D spelling of the access type
    pub fn x3d_name(self) -> &'static str {
        match self {
            Self::InitializeOnly => "initializeOnly",
            Self::InputOnly => "inputOnly",
            Self::OutputOnly => "outputOnly",
            Self::InputOutput => "inputOutput",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.x3d_name())
    }
}

/// Declared data type of a field
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Boolean
    SFBool,
    /// 32-bit integer
    SFInt32,
    /// 32-bit float
    SFFloat,
    /// Time in seconds
    SFTime,
    /// 2D vector
    SFVec2f,
    /// 3D vector
    SFVec3f,
    /// Axis + angle rotation
    SFRotation,
    /// String
    SFString,
    /// Node reference
    SFNode,
    /// Sequence of booleans
    MFBool,
    /// Sequence of integers
    MFInt32,
    /// Sequence of floats
    MFFloat,
    /// Sequence of times
    MFTime,
    /// Sequence of 2D vectors
    MFVec2f,
    /// Sequence of 3D vectors
    MFVec3f,
    /// Sequence of rotations
    MFRotation,
    /// Sequence of strings
    MFString,
    /// Sequence of node references
    MFNode,
}

impl FieldType {
    /// Whether this is a multi-valued (`MF*`) type
    pub fn is_multi(self) -> bool {
        matches!(
            self,
            Self::MFBool
                | Self::MFInt32
                | Self::MFFloat
                | Self::MFTime
                | Self::MFVec2f
                | Self::MFVec3f
                | Self::MFRotation
                | Self::MFString
                | Self::MFNode
        )
    }

    /// Single-valued type of one element (identity for `SF*` types)
    pub fn element_type(self) -> FieldType {
        match self {
            Self::MFBool => Self::SFBool,
            Self::MFInt32 => Self::SFInt32,
            Self::MFFloat => Self::SFFloat,
            Self::MFTime => Self::SFTime,
            Self::MFVec2f => Self::SFVec2f,
            Self::MFVec3f => Self::SFVec3f,
            Self::MFRotation => Self::SFRotation,
            Self::MFString => Self::SFString,
            Self::MFNode => Self::SFNode,
            single => single,
        }
    }

    /// Multi-valued counterpart (identity for `MF*` types)
    pub fn multi_type(self) -> FieldType {
        match self {
            Self::SFBool => Self::MFBool,
            Self::SFInt32 => Self::MFInt32,
            Self::SFFloat => Self::MFFloat,
            Self::SFTime => Self::MFTime,
            Self::SFVec2f => Self::MFVec2f,
            Self::SFVec3f => Self::MFVec3f,
            Self::SFRotation => Self::MFRotation,
            Self::SFString => Self::MFString,
            Self::SFNode => Self::MFNode,
            multi => multi,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Value stored in a field
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Boolean
    SFBool(bool),
    /// 32-bit integer
    SFInt32(i32),
    /// 32-bit float
    SFFloat(f32),
    /// Time in seconds
    SFTime(f64),
    /// 2D vector
    SFVec2f([f32; 2]),
    /// 3D vector
    SFVec3f([f32; 3]),
    /// Axis (x, y, z) + angle in radians
    SFRotation([f32; 4]),
    /// String
    SFString(String),
    /// Weak node reference
    SFNode(Option<NodeId>),
    /// Booleans
    MFBool(Vec<bool>),
    /// Integers
    MFInt32(Vec<i32>),
    /// Floats
    MFFloat(Vec<f32>),
    /// Times
    MFTime(Vec<f64>),
    /// 2D vectors
    MFVec2f(Vec<[f32; 2]>),
    /// 3D vectors
    MFVec3f(Vec<[f32; 3]>),
    /// Rotations
    MFRotation(Vec<[f32; 4]>),
    /// Strings
    MFString(Vec<String>),
    /// Weak node references
    MFNode(Vec<NodeId>),
}

/// Expands `$body` once per multi-valued variant, binding the element
/// vector as `$items` and the matching single-valued constructor as `$sf`.
macro_rules! each_multi {
    ($value:expr, $items:ident, $sf:ident => $body:expr, _ => $fallback:expr) => {
        match $value {
            FieldValue::MFBool($items) => { let $sf = FieldValue::SFBool; $body }
            FieldValue::MFInt32($items) => { let $sf = FieldValue::SFInt32; $body }
            FieldValue::MFFloat($items) => { let $sf = FieldValue::SFFloat; $body }
            FieldValue::MFTime($items) => { let $sf = FieldValue::SFTime; $body }
            FieldValue::MFVec2f($items) => { let $sf = FieldValue::SFVec2f; $body }
            FieldValue::MFVec3f($items) => { let $sf = FieldValue::SFVec3f; $body }
            FieldValue::MFRotation($items) => { let $sf = FieldValue::SFRotation; $body }
            FieldValue::MFString($items) => { let $sf = FieldValue::SFString; $body }
            FieldValue::MFNode($items) => {
                let $sf = |id: NodeId| FieldValue::SFNode(Some(id));
                $body
            }
            _ => $fallback,
        }
    };
}

impl FieldValue {
    /// Get the field type for this value
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::SFBool(_) => FieldType::SFBool,
            Self::SFInt32(_) => FieldType::SFInt32,
            Self::SFFloat(_) => FieldType::SFFloat,
            Self::SFTime(_) => FieldType::SFTime,
            Self::SFVec2f(_) => FieldType::SFVec2f,
            Self::SFVec3f(_) => FieldType::SFVec3f,
            Self::SFRotation(_) => FieldType::SFRotation,
            Self::SFString(_) => FieldType::SFString,
            Self::SFNode(_) => FieldType::SFNode,
            Self::MFBool(_) => FieldType::MFBool,
            Self::MFInt32(_) => FieldType::MFInt32,
            Self::MFFloat(_) => FieldType::MFFloat,
            Self::MFTime(_) => FieldType::MFTime,
            Self::MFVec2f(_) => FieldType::MFVec2f,
            Self::MFVec3f(_) => FieldType::MFVec3f,
            Self::MFRotation(_) => FieldType::MFRotation,
            Self::MFString(_) => FieldType::MFString,
            Self::MFNode(_) => FieldType::MFNode,
        }
    }

    /// Zero/empty value of a type
    pub fn default_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::SFBool => Self::SFBool(false),
            FieldType::SFInt32 => Self::SFInt32(0),
            FieldType::SFFloat => Self::SFFloat(0.0),
            FieldType::SFTime => Self::SFTime(0.0),
            FieldType::SFVec2f => Self::SFVec2f([0.0; 2]),
            FieldType::SFVec3f => Self::SFVec3f([0.0; 3]),
            FieldType::SFRotation => Self::SFRotation([0.0, 0.0, 1.0, 0.0]),
            FieldType::SFString => Self::SFString(String::new()),
            FieldType::SFNode => Self::SFNode(None),
            FieldType::MFBool => Self::MFBool(Vec::new()),
            FieldType::MFInt32 => Self::MFInt32(Vec::new()),
            FieldType::MFFloat => Self::MFFloat(Vec::new()),
            FieldType::MFTime => Self::MFTime(Vec::new()),
            FieldType::MFVec2f => Self::MFVec2f(Vec::new()),
            FieldType::MFVec3f => Self::MFVec3f(Vec::new()),
            FieldType::MFRotation => Self::MFRotation(Vec::new()),
            FieldType::MFString => Self::MFString(Vec::new()),
            FieldType::MFNode => Self::MFNode(Vec::new()),
        }
    }

    /// Number of elements of a multi-valued value
    pub fn mf_len(&self) -> Option<usize> {
        each_multi!(self, items, _sf => Some(items.len()), _ => None)
    }

    /// One element of a multi-valued value, as a single-valued value
    pub fn element(&self, index: usize) -> Option<FieldValue> {
        each_multi!(self, items, sf => items.get(index).cloned().map(sf), _ => None)
    }

    /// All elements of a multi-valued value, as single-valued values
    pub fn elements(&self) -> Option<Vec<FieldValue>> {
        each_multi!(self, items, sf => Some(items.iter().cloned().map(sf).collect()), _ => None)
    }

    /// Build a multi-valued value of `field_type` from single-valued elements.
    ///
    /// Returns `None` if any element has the wrong type.
    pub fn from_elements(field_type: FieldType, elements: Vec<FieldValue>) -> Option<FieldValue> {
        let mut value = Self::default_for(field_type.multi_type());
        for element in elements {
            value.push_element(element).ok()?;
        }
        Some(value)
    }

    /// Collect every node referenced by this value
    pub fn node_references(&self) -> Vec<NodeId> {
        match self {
            Self::SFNode(Some(id)) => vec![*id],
            Self::MFNode(ids) => ids.clone(),
            _ => Vec::new(),
        }
    }

    fn replace_element(&mut self, index: usize, element: FieldValue) -> Result<(), FieldValue> {
        match (self, element) {
            (Self::MFBool(items), Self::SFBool(v)) => put(items, index, v),
            (Self::MFInt32(items), Self::SFInt32(v)) => put(items, index, v),
            (Self::MFFloat(items), Self::SFFloat(v)) => put(items, index, v),
            (Self::MFTime(items), Self::SFTime(v)) => put(items, index, v),
            (Self::MFVec2f(items), Self::SFVec2f(v)) => put(items, index, v),
            (Self::MFVec3f(items), Self::SFVec3f(v)) => put(items, index, v),
            (Self::MFRotation(items), Self::SFRotation(v)) => put(items, index, v),
            (Self::MFString(items), Self::SFString(v)) => put(items, index, v),
            (Self::MFNode(items), Self::SFNode(Some(v))) => put(items, index, v),
            (_, element) => Err(element),
        }
    }

    fn push_element(&mut self, element: FieldValue) -> Result<(), FieldValue> {
        let len = self.mf_len().unwrap_or(0);
        self.replace_element(len, element)
    }

    /// Apply a write operation in place, checking the declared type.
    pub(crate) fn apply(&mut self, field: &str, write: FieldWrite) -> Result<(), FieldError> {
        write.check(field, self.field_type(), self.mf_len())?;
        match write {
            FieldWrite::Set(value) => *self = value,
            FieldWrite::SetElement { index, value } => {
                self.replace_element(index, value)
                    .map_err(|found| mismatch(field, self.field_type().element_type(), &found))?;
            }
            FieldWrite::Append(value) => {
                self.push_element(value)
                    .map_err(|found| mismatch(field, self.field_type().element_type(), &found))?;
            }
        }
        Ok(())
    }
}

/// Replace `items[index]`, or push when `index == len`.
fn put<T>(items: &mut Vec<T>, index: usize, value: T) -> Result<(), FieldValue> {
    if index < items.len() {
        items[index] = value;
    } else {
        items.push(value);
    }
    Ok(())
}

fn mismatch(field: &str, expected: FieldType, found: &FieldValue) -> FieldError {
    FieldError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found.field_type(),
    }
}

/// A requested change to a field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    /// Replace the whole value
    Set(FieldValue),
    /// Replace one element of a multi-valued field
    SetElement {
        /// Element index, must be in range
        index: usize,
        /// Single-valued element
        value: FieldValue,
    },
    /// Append one element to a multi-valued field
    Append(FieldValue),
}

impl FieldWrite {
    /// Validate this write against a field's declared type.
    ///
    /// `current_len` is the element count the field holds now; index checks
    /// are skipped when it is `None` (the length may change before the write
    /// is applied, so queued writes are re-checked at apply time).
    pub fn check(
        &self,
        field: &str,
        field_type: FieldType,
        current_len: Option<usize>,
    ) -> Result<(), FieldError> {
        match self {
            Self::Set(value) => {
                if value.field_type() != field_type {
                    return Err(mismatch(field, field_type, value));
                }
            }
            Self::SetElement { index, value } => {
                if !field_type.is_multi() {
                    return Err(FieldError::NotMultiValued { field: field.to_string() });
                }
                if value.field_type() != field_type.element_type()
                    || matches!(value, FieldValue::SFNode(None))
                {
                    return Err(mismatch(field, field_type.element_type(), value));
                }
                if let Some(len) = current_len {
                    if *index >= len {
                        return Err(FieldError::IndexOutOfRange {
                            field: field.to_string(),
                            index: *index,
                            len,
                        });
                    }
                }
            }
            Self::Append(value) => {
                if !field_type.is_multi() {
                    return Err(FieldError::NotMultiValued { field: field.to_string() });
                }
                if value.field_type() != field_type.element_type()
                    || matches!(value, FieldValue::SFNode(None))
                {
                    return Err(mismatch(field, field_type.element_type(), value));
                }
            }
        }
        Ok(())
    }
}

/// Rust types that map onto one X3D field type
pub trait FieldData: Sized {
    /// The field type this Rust type reads from and writes to
    const FIELD_TYPE: FieldType;

    /// Wrap into a field value
    fn into_value(self) -> FieldValue;

    /// Unwrap from a field value of the matching type
    fn from_value(value: FieldValue) -> Option<Self>;
}

macro_rules! impl_field_data {
    ($ty:ty, $sf:ident, $mf:ident) => {
        impl FieldData for $ty {
            const FIELD_TYPE: FieldType = FieldType::$sf;

            fn into_value(self) -> FieldValue {
                FieldValue::$sf(self)
            }

            fn from_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$sf(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl FieldData for Vec<$ty> {
            const FIELD_TYPE: FieldType = FieldType::$mf;

            fn into_value(self) -> FieldValue {
                FieldValue::$mf(self)
            }

            fn from_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$mf(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_field_data!(bool, SFBool, MFBool);
impl_field_data!(i32, SFInt32, MFInt32);
impl_field_data!(f32, SFFloat, MFFloat);
impl_field_data!(f64, SFTime, MFTime);
impl_field_data!([f32; 2], SFVec2f, MFVec2f);
impl_field_data!([f32; 3], SFVec3f, MFVec3f);
impl_field_data!([f32; 4], SFRotation, MFRotation);
impl_field_data!(String, SFString, MFString);

impl FieldData for Option<NodeId> {
    const FIELD_TYPE: FieldType = FieldType::SFNode;

    fn into_value(self) -> FieldValue {
        FieldValue::SFNode(self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::SFNode(v) => Some(v),
            _ => None,
        }
    }
}

impl FieldData for Vec<NodeId> {
    const FIELD_TYPE: FieldType = FieldType::MFNode;

    fn into_value(self) -> FieldValue {
        FieldValue::MFNode(self)
    }

    fn from_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::MFNode(v) => Some(v),
            _ => None,
        }
    }
}

/// Declaration of a field on a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name, unique within the node type
    pub name: String,
    /// Declared type
    pub field_type: FieldType,
    /// Access type, fixed for the lifetime of every instance
    pub access: AccessType,
    /// Value a new instance starts with
    pub default: FieldValue,
}

impl FieldDecl {
    /// Declare a field; the type is taken from the default value
    pub fn new(name: impl Into<String>, access: AccessType, default: FieldValue) -> Self {
        Self {
            name: name.into(),
            field_type: default.field_type(),
            access,
            default,
        }
    }

    /// Declare an `initializeOnly` field
    pub fn initialize_only(name: impl Into<String>, default: FieldValue) -> Self {
        Self::new(name, AccessType::InitializeOnly, default)
    }

    /// Declare an `inputOnly` field
    pub fn input_only(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, AccessType::InputOnly, FieldValue::default_for(field_type))
    }

    /// Declare an `outputOnly` field
    pub fn output_only(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, AccessType::OutputOnly, FieldValue::default_for(field_type))
    }

    /// Declare an `inputOutput` field
    pub fn input_output(name: impl Into<String>, default: FieldValue) -> Self {
        Self::new(name, AccessType::InputOutput, default)
    }
}

/// Mutable state of one field instance, guarded as a unit
#[derive(Debug, Clone)]
pub(crate) struct FieldState {
    pub value: FieldValue,
    pub dirty: bool,
    pub last_modified_tick: u64,
}

impl FieldState {
    pub fn new(value: FieldValue) -> Self {
        Self {
            value,
            dirty: false,
            last_modified_tick: 0,
        }
    }
}

/// Errors raised by field access
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// The node type has no field of that name
    #[error("Unknown field '{field}' on {node_type}")]
    UnknownField {
        /// Node type name
        node_type: String,
        /// Requested field name
        field: String,
    },

    /// Value type does not match the declared field type
    #[error("Type mismatch on '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Declared (or element) type
        expected: FieldType,
        /// Type that was supplied
        found: FieldType,
    },

    /// The access type forbids this write
    #[error("Access denied: '{field}' is {access}")]
    AccessDenied {
        /// Field name
        field: String,
        /// Declared access type
        access: AccessType,
    },

    /// Element index past the end of a multi-valued field
    #[error("Index {index} out of range for '{field}' ({len} values)")]
    IndexOutOfRange {
        /// Field name
        field: String,
        /// Requested index
        index: usize,
        /// Current element count
        len: usize,
    },

    /// Element operation on a single-valued field
    #[error("'{field}' is not a multi-valued field")]
    NotMultiValued {
        /// Field name
        field: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_rules() {
        assert!(AccessType::InputOutput.accepts_input());
        assert!(AccessType::InputOutput.produces_output());
        assert!(AccessType::InputOnly.is_externally_writable());
        assert!(!AccessType::OutputOnly.is_externally_writable());
        assert!(!AccessType::InitializeOnly.is_externally_writable());
        assert!(!AccessType::InitializeOnly.produces_output());
    }

    #[test]
    fn test_type_pairs() {
        assert_eq!(FieldType::MFVec3f.element_type(), FieldType::SFVec3f);
        assert_eq!(FieldType::SFNode.multi_type(), FieldType::MFNode);
        assert!(FieldType::MFString.is_multi());
        assert!(!FieldType::SFTime.is_multi());
    }

    #[test]
    fn test_element_access() {
        let value = FieldValue::MFFloat(vec![0.0, 0.5, 1.0]);
        assert_eq!(value.mf_len(), Some(3));
        assert_eq!(value.element(1), Some(FieldValue::SFFloat(0.5)));
        assert_eq!(value.element(3), None);
        assert_eq!(FieldValue::SFFloat(1.0).mf_len(), None);

        let id = NodeId::new();
        let nodes = FieldValue::MFNode(vec![id]);
        assert_eq!(nodes.element(0), Some(FieldValue::SFNode(Some(id))));
    }

    #[test]
    fn test_apply_set_checks_type() {
        let mut value = FieldValue::SFVec3f([0.0; 3]);
        let err = value
            .apply("translation", FieldWrite::Set(FieldValue::SFFloat(1.0)))
            .unwrap_err();
        assert!(matches!(err, FieldError::TypeMismatch { expected: FieldType::SFVec3f, .. }));
        assert_eq!(value, FieldValue::SFVec3f([0.0; 3]));

        value
            .apply("translation", FieldWrite::Set(FieldValue::SFVec3f([1.0, 2.0, 3.0])))
            .unwrap();
        assert_eq!(value, FieldValue::SFVec3f([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_apply_partial_replace() {
        let mut value = FieldValue::MFInt32(vec![1, 2, 3]);
        value
            .apply("values", FieldWrite::SetElement { index: 1, value: FieldValue::SFInt32(7) })
            .unwrap();
        assert_eq!(value, FieldValue::MFInt32(vec![1, 7, 3]));

        let err = value
            .apply("values", FieldWrite::SetElement { index: 3, value: FieldValue::SFInt32(0) })
            .unwrap_err();
        assert!(matches!(err, FieldError::IndexOutOfRange { index: 3, len: 3, .. }));

        value.apply("values", FieldWrite::Append(FieldValue::SFInt32(4))).unwrap();
        assert_eq!(value, FieldValue::MFInt32(vec![1, 7, 3, 4]));
    }

    #[test]
    fn test_element_write_on_single_field() {
        let mut value = FieldValue::SFBool(true);
        let err = value
            .apply("on", FieldWrite::Append(FieldValue::SFBool(false)))
            .unwrap_err();
        assert!(matches!(err, FieldError::NotMultiValued { .. }));
    }

    #[test]
    fn test_from_elements() {
        let built = FieldValue::from_elements(
            FieldType::SFVec2f,
            vec![FieldValue::SFVec2f([1.0, 2.0]), FieldValue::SFVec2f([3.0, 4.0])],
        );
        assert_eq!(built, Some(FieldValue::MFVec2f(vec![[1.0, 2.0], [3.0, 4.0]])));

        let wrong = FieldValue::from_elements(FieldType::MFVec2f, vec![FieldValue::SFBool(true)]);
        assert_eq!(wrong, None);
    }

    #[test]
    fn test_field_data_conversions() {
        assert_eq!(<[f32; 3]>::FIELD_TYPE, FieldType::SFVec3f);
        assert_eq!(<Vec<String>>::FIELD_TYPE, FieldType::MFString);
        assert_eq!(i32::from_value(FieldValue::SFInt32(5)), Some(5));
        assert_eq!(i32::from_value(FieldValue::SFFloat(5.0)), None);
        assert_eq!(2.5f64.into_value(), FieldValue::SFTime(2.5));
    }

    #[test]
    fn test_decl_type_from_default() {
        let decl = FieldDecl::input_output("scale", FieldValue::SFVec3f([1.0; 3]));
        assert_eq!(decl.field_type, FieldType::SFVec3f);
        assert_eq!(decl.access, AccessType::InputOutput);

        let decl = FieldDecl::output_only("value_changed", FieldType::SFFloat);
        assert_eq!(decl.default, FieldValue::SFFloat(0.0));
    }
}
