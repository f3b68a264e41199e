// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed Scene Access Interface handles.
//!
//! Field handles resolve the field name and check the Rust type once, when
//! the handle is built; every later call goes straight to the field.

use std::marker::PhantomData;
use x3d_scene::{
    FieldData, FieldError, FieldEvent, FieldRef, FieldType, FieldValue, ListenerId, NodeId, Route,
    SceneError, SceneHandle,
};

type Result<T> = std::result::Result<T, SceneError>;

/// A live node reached through the SAI
#[derive(Debug, Clone)]
pub struct SaiNode {
    id: NodeId,
    handle: SceneHandle,
}

impl SaiNode {
    /// Wrap a node of the scene behind `handle`
    pub fn new(handle: SceneHandle, id: NodeId) -> Result<Self> {
        if !handle.contains_node(id) {
            return Err(SceneError::UnknownNode(id));
        }
        Ok(Self { id, handle })
    }

    /// Node ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Type name
    pub fn type_name(&self) -> Result<String> {
        let node = self.handle.node(self.id).ok_or(SceneError::UnknownNode(self.id))?;
        Ok(node.type_name().to_string())
    }

    /// Names of the node's fields in declaration order
    pub fn field_names(&self) -> Result<Vec<String>> {
        let node = self.handle.node(self.id).ok_or(SceneError::UnknownNode(self.id))?;
        Ok(node.node_type().fields().map(|(_, decl)| decl.name.clone()).collect())
    }

    fn resolve(&self, name: &str, expected: FieldType) -> Result<FieldRef> {
        let node = self.handle.node(self.id).ok_or(SceneError::UnknownNode(self.id))?;
        let field = node.field_id(name)?;
        let decl = node.field_decl(field)?;
        if decl.field_type != expected {
            return Err(FieldError::TypeMismatch {
                field: decl.name.clone(),
                expected: decl.field_type,
                found: expected,
            }
            .into());
        }
        Ok(FieldRef::new(self.id, field))
    }

    /// Typed handle to a field whose type is `T`
    pub fn field<T: FieldData>(&self, name: &str) -> Result<SaiField<T>> {
        Ok(SaiField {
            target: self.resolve(name, T::FIELD_TYPE)?,
            name: name.to_string(),
            handle: self.handle.clone(),
            _marker: PhantomData,
        })
    }

    /// Typed handle to a multi-valued field whose elements are `T`
    pub fn mf_field<T: FieldData>(&self, name: &str) -> Result<SaiMultiField<T>> {
        Ok(SaiMultiField {
            target: self.resolve(name, T::FIELD_TYPE.multi_type())?,
            name: name.to_string(),
            handle: self.handle.clone(),
            _marker: PhantomData,
        })
    }

    /// Route one of this node's fields to a field of `to`.
    ///
    /// Validated now, added at the next Draining phase.
    pub fn add_route(&self, from_field: &str, to: &SaiNode, to_field: &str) -> Result<Route> {
        let from = self.handle.field_ref(self.id, from_field)?;
        let to = to.handle.field_ref(to.id, to_field)?;
        self.handle.add_route(from, to)
    }

    /// Remove the node from the scene at the next Draining phase
    pub fn dispose(&self) -> Result<()> {
        self.handle.remove_node(self.id)
    }
}

/// Typed handle to a field
#[derive(Debug, Clone)]
pub struct SaiField<T> {
    target: FieldRef,
    name: String,
    handle: SceneHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FieldData> SaiField<T> {
    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying field reference
    pub fn field_ref(&self) -> FieldRef {
        self.target
    }

    /// Current value
    pub fn get(&self) -> Result<T> {
        self.handle.get(self.target)
    }

    /// Queue a new value for the next tick
    pub fn set(&self, value: T) -> Result<()> {
        self.handle.write(self.target, value.into_value())
    }

    /// Call `callback` with the new value whenever the field changes
    pub fn add_listener<F>(&self, callback: F) -> Result<ListenerId>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.handle.add_listener(self.target, move |event: &FieldEvent| {
            if let Some(value) = T::from_value(event.value.clone()) {
                callback(value);
            }
        })
    }

    /// Unregister a listener added through this handle
    pub fn remove_listener(&self, id: ListenerId) -> Result<()> {
        self.handle.remove_listener(self.target, id)
    }
}

/// Typed handle to a multi-valued field with elements of type `T`
#[derive(Debug, Clone)]
pub struct SaiMultiField<T> {
    target: FieldRef,
    name: String,
    handle: SceneHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FieldData> SaiMultiField<T> {
    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying field reference
    pub fn field_ref(&self) -> FieldRef {
        self.target
    }

    /// Element count
    pub fn size(&self) -> Result<usize> {
        self.handle.size(self.target)
    }

    /// One element
    pub fn get1(&self, index: usize) -> Result<T> {
        let value = self.handle.read(self.target)?;
        let len = value.mf_len().unwrap_or(0);
        value
            .element(index)
            .and_then(T::from_value)
            .ok_or_else(|| {
                FieldError::IndexOutOfRange {
                    field: self.name.clone(),
                    index,
                    len,
                }
                .into()
            })
    }

    /// Every element, read atomically
    pub fn get_all(&self) -> Result<Vec<T>> {
        let value = self.handle.read(self.target)?;
        Ok(value
            .elements()
            .unwrap_or_default()
            .into_iter()
            .filter_map(T::from_value)
            .collect())
    }

    /// Queue a replacement of one element
    pub fn set1(&self, index: usize, value: T) -> Result<()> {
        self.handle.set_element(self.target, index, value.into_value())
    }

    /// Queue an appended element
    pub fn append(&self, value: T) -> Result<()> {
        self.handle.append(self.target, value.into_value())
    }

    /// Queue a replacement of the whole field
    pub fn set_all(&self, values: Vec<T>) -> Result<()> {
        let elements = values.into_iter().map(FieldData::into_value).collect();
        let value = FieldValue::from_elements(T::FIELD_TYPE, elements).ok_or_else(|| {
            FieldError::TypeMismatch {
                field: self.name.clone(),
                expected: T::FIELD_TYPE.multi_type(),
                found: T::FIELD_TYPE,
            }
        })?;
        self.handle.write(self.target, value)
    }
}
