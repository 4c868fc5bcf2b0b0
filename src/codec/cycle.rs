//! Circular reference detection over a value's `Serialize` graph.
//!
//! Shared ownership (`Rc<RefCell<_>>`, `Arc<RefCell<_>>`) lets a value reach
//! itself, and serializing such a value never terminates. The walker visits
//! the graph depth first through a serializer that produces nothing,
//! identifying every child value by `(address, type)`. A node that reappears
//! on the current path is a cycle. Siblings sharing the same allocation are
//! fine.
//!
//! Cycles closed through `Mutex` or `RwLock` are not supported. serde takes
//! the lock before handing the inner value to the serializer, so the second
//! visit to a locked node blocks inside `lock()` before the walker can see
//! it. Acyclic graphs behind locks are walked normally.

use std::any::type_name;
use std::collections::HashSet;
use std::fmt;

use serde::ser::{self, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Circular reference detected")]
    Circular,

    /// The value's own `Serialize` impl failed during traversal.
    #[error("{0}")]
    Traversal(String),
}

impl ser::Error for CycleError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CycleError::Traversal(msg.to_string())
    }
}

/// Walk `value` and fail on the first circular reference.
pub fn detect_cycles<T: Serialize + ?Sized>(value: &T) -> Result<(), CycleError> {
    let mut walker = Walker::default();
    walker.visit(value)
}

type NodeId = (usize, &'static str);

#[derive(Default)]
struct Walker {
    path: HashSet<NodeId>,
}

impl Walker {
    fn visit<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CycleError> {
        // a value and its first field can share an address, never a type
        let id = ((value as *const T).cast::<()>() as usize, type_name::<T>());
        if !self.path.insert(id) {
            return Err(CycleError::Circular);
        }
        let result = value.serialize(&mut *self);
        self.path.remove(&id);
        result
    }
}

impl<'a> ser::Serializer for &'a mut Walker {
    type Ok = ();
    type Error = CycleError;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _v: bool) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_i8(self, _v: i8) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_i16(self, _v: i16) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_i32(self, _v: i32) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_i64(self, _v: i64) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_u8(self, _v: u8) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_u16(self, _v: u16) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_u32(self, _v: u32) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_u64(self, _v: u64) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_f32(self, _v: f32) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_f64(self, _v: f64) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_char(self, _v: char) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_str(self, _v: &str) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_none(self) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), CycleError> {
        self.visit(value)
    }

    fn serialize_unit(self) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<(), CycleError> {
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), CycleError> {
        self.visit(value)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), CycleError> {
        self.visit(value)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self, CycleError> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self, CycleError> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self, CycleError> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, CycleError> {
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self, CycleError> {
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, CycleError> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, CycleError> {
        Ok(self)
    }
}

impl<'a> ser::SerializeSeq for &'a mut Walker {
    type Ok = ();
    type Error = CycleError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CycleError> {
        self.visit(value)
    }

    fn end(self) -> Result<(), CycleError> {
        Ok(())
    }
}

impl<'a> ser::SerializeTuple for &'a mut Walker {
    type Ok = ();
    type Error = CycleError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CycleError> {
        self.visit(value)
    }

    fn end(self) -> Result<(), CycleError> {
        Ok(())
    }
}

impl<'a> ser::SerializeTupleStruct for &'a mut Walker {
    type Ok = ();
    type Error = CycleError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CycleError> {
        self.visit(value)
    }

    fn end(self) -> Result<(), CycleError> {
        Ok(())
    }
}

impl<'a> ser::SerializeTupleVariant for &'a mut Walker {
    type Ok = ();
    type Error = CycleError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CycleError> {
        self.visit(value)
    }

    fn end(self) -> Result<(), CycleError> {
        Ok(())
    }
}

impl<'a> ser::SerializeMap for &'a mut Walker {
    type Ok = ();
    type Error = CycleError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), CycleError> {
        self.visit(key)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CycleError> {
        self.visit(value)
    }

    fn end(self) -> Result<(), CycleError> {
        Ok(())
    }
}

impl<'a> ser::SerializeStruct for &'a mut Walker {
    type Ok = ();
    type Error = CycleError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), CycleError> {
        self.visit(value)
    }

    fn end(self) -> Result<(), CycleError> {
        Ok(())
    }
}

impl<'a> ser::SerializeStructVariant for &'a mut Walker {
    type Ok = ();
    type Error = CycleError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), CycleError> {
        self.visit(value)
    }

    fn end(self) -> Result<(), CycleError> {
        Ok(())
    }
}
