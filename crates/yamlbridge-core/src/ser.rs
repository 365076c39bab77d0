//! Serialization into a JSON value tree with single-precision floats kept
//! at their own shortest digits.
//!
//! `serde_json::to_value` widens an `f32` with `as f64`, so `f32::MAX` turns
//! into `340282346638528860000000000000000000000`. [`Widening`] wraps any
//! serializer and widens through the `f32`'s shortest decimal text instead
//! (`3.4028235e+38`). Every nested value goes through the wrapper too.

use serde::ser::{
    Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant, Serializer,
};
use serde_json::Value;

use crate::error::Result;

/// Serialize `value` to a JSON value tree.
pub(crate) fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    Ok(value.serialize(Widening(serde_json::value::Serializer))?)
}

/// The `f64` whose shortest text matches the `f32`'s.
fn widen(v: f32) -> f64 {
    if !v.is_finite() {
        return f64::from(v);
    }
    v.to_string().parse().unwrap_or(f64::from(v))
}

struct Widening<S>(S);

/// A value serialized through [`Widening`].
struct Widened<'a, T: ?Sized>(&'a T);

impl<T> Serialize for Widened<'_, T>
where
    T: ?Sized + Serialize,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(Widening(serializer))
    }
}

macro_rules! delegate_scalars {
    ($($method:ident($ty:ty),)*) => {
        $(
            fn $method(self, v: $ty) -> std::result::Result<S::Ok, S::Error> {
                self.0.$method(v)
            }
        )*
    };
}

impl<S> Serializer for Widening<S>
where
    S: Serializer,
{
    type Ok = S::Ok;
    type Error = S::Error;

    type SerializeSeq = Widening<S::SerializeSeq>;
    type SerializeTuple = Widening<S::SerializeTuple>;
    type SerializeTupleStruct = Widening<S::SerializeTupleStruct>;
    type SerializeTupleVariant = Widening<S::SerializeTupleVariant>;
    type SerializeMap = Widening<S::SerializeMap>;
    type SerializeStruct = Widening<S::SerializeStruct>;
    type SerializeStructVariant = Widening<S::SerializeStructVariant>;

    delegate_scalars! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    }

    fn serialize_f32(self, v: f32) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize_f64(widen(v))
    }

    fn serialize_none(self) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize_none()
    }

    fn serialize_some<T>(self, value: &T) -> std::result::Result<S::Ok, S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0.serialize_some(&Widened(value))
    }

    fn serialize_unit(self) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize_unit()
    }

    fn serialize_unit_struct(self, name: &'static str) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize_unit_struct(name)
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize_unit_variant(name, variant_index, variant)
    }

    fn serialize_newtype_struct<T>(
        self,
        name: &'static str,
        value: &T,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0.serialize_newtype_struct(name, &Widened(value))
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0
            .serialize_newtype_variant(name, variant_index, variant, &Widened(value))
    }

    fn serialize_seq(self, len: Option<usize>) -> std::result::Result<Self::SerializeSeq, S::Error> {
        self.0.serialize_seq(len).map(Widening)
    }

    fn serialize_tuple(self, len: usize) -> std::result::Result<Self::SerializeTuple, S::Error> {
        self.0.serialize_tuple(len).map(Widening)
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> std::result::Result<Self::SerializeTupleStruct, S::Error> {
        self.0.serialize_tuple_struct(name, len).map(Widening)
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> std::result::Result<Self::SerializeTupleVariant, S::Error> {
        self.0
            .serialize_tuple_variant(name, variant_index, variant, len)
            .map(Widening)
    }

    fn serialize_map(self, len: Option<usize>) -> std::result::Result<Self::SerializeMap, S::Error> {
        self.0.serialize_map(len).map(Widening)
    }

    fn serialize_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> std::result::Result<Self::SerializeStruct, S::Error> {
        self.0.serialize_struct(name, len).map(Widening)
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> std::result::Result<Self::SerializeStructVariant, S::Error> {
        self.0
            .serialize_struct_variant(name, variant_index, variant, len)
            .map(Widening)
    }

    fn is_human_readable(&self) -> bool {
        self.0.is_human_readable()
    }
}

impl<S> SerializeSeq for Widening<S>
where
    S: SerializeSeq,
{
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_element<T>(&mut self, value: &T) -> std::result::Result<(), S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0.serialize_element(&Widened(value))
    }

    fn end(self) -> std::result::Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S> SerializeTuple for Widening<S>
where
    S: SerializeTuple,
{
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_element<T>(&mut self, value: &T) -> std::result::Result<(), S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0.serialize_element(&Widened(value))
    }

    fn end(self) -> std::result::Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S> SerializeTupleStruct for Widening<S>
where
    S: SerializeTupleStruct,
{
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_field<T>(&mut self, value: &T) -> std::result::Result<(), S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0.serialize_field(&Widened(value))
    }

    fn end(self) -> std::result::Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S> SerializeTupleVariant for Widening<S>
where
    S: SerializeTupleVariant,
{
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_field<T>(&mut self, value: &T) -> std::result::Result<(), S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0.serialize_field(&Widened(value))
    }

    fn end(self) -> std::result::Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S> SerializeMap for Widening<S>
where
    S: SerializeMap,
{
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_key<T>(&mut self, key: &T) -> std::result::Result<(), S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0.serialize_key(&Widened(key))
    }

    fn serialize_value<T>(&mut self, value: &T) -> std::result::Result<(), S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0.serialize_value(&Widened(value))
    }

    fn end(self) -> std::result::Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S> SerializeStruct for Widening<S>
where
    S: SerializeStruct,
{
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> std::result::Result<(), S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0.serialize_field(key, &Widened(value))
    }

    fn skip_field(&mut self, key: &'static str) -> std::result::Result<(), S::Error> {
        self.0.skip_field(key)
    }

    fn end(self) -> std::result::Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S> SerializeStructVariant for Widening<S>
where
    S: SerializeStructVariant,
{
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> std::result::Result<(), S::Error>
    where
        T: ?Sized + Serialize,
    {
        self.0.serialize_field(key, &Widened(value))
    }

    fn skip_field(&mut self, key: &'static str) -> std::result::Result<(), S::Error> {
        self.0.skip_field(key)
    }

    fn end(self) -> std::result::Result<S::Ok, S::Error> {
        self.0.end()
    }
}
