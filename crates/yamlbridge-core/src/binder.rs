//! Binding JSON value trees to typed values, with optional strict field checks.
//!
//! The binder is a `serde::Deserializer` over an owned `serde_json::Value`.
//! Field metadata comes from the target type itself: serde's derive passes the
//! struct name and its resolved field names (after `rename`/`rename_all`) to
//! `deserialize_struct`. That list is a `&'static` table generated once per type,
//! so strict mode needs no reflection and no cache of its own. With
//! [`UnknownFields::Deny`], every key of an object bound to a struct must
//! appear in that table. Objects bound to maps are not checked at their own
//! level; values nested inside them still are.
//!
//! Structs with `#[serde(flatten)]` fields never call `deserialize_struct`.
//! Serde reads them through `deserialize_map`, buffers every key it does not
//! recognise as opaque content, and lets the flattened fields pick from that
//! buffer without calling back into the binder. Under `Deny` the binder
//! records those keys, then binds once more per key with the key's value
//! replaced by a value no field type accepts. A key whose replacement goes
//! unnoticed was read by no field and is reported as unknown.
//!
//! Two conveniences go beyond `serde_json::from_value`:
//!
//! - booleans and numbers bound to a string field yield their canonical text
//!   (`a: 1` fills a `String` with `"1"`);
//! - keys bound to integer, float or boolean map key types are parsed from
//!   their canonical text (`1: a` fills a `BTreeMap<u32, String>`).
//!
//! Binding errors carry the `serde_path_to_error` path of the failing value.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::de::value::StringDeserializer;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, Error as _, Expected, MapAccess,
    SeqAccess, Unexpected, VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};
use tracing::debug;

use crate::convert::{Path, Segment};
use crate::error::{Error, Result};
use crate::number::format_number;
use crate::options::DecodeOptions;

/// The field table of one struct level: serde's resolved names for the
/// struct's fields, as handed to `deserialize_struct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub type_name: &'static str,
    pub fields: &'static [&'static str],
}

impl FieldSpec {
    pub fn declares(&self, key: &str) -> bool {
        self.fields.contains(&key)
    }
}

/// Bind a value tree to `T`, ignoring unknown fields.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value_with_options(value, &DecodeOptions::default())
}

/// Bind a value tree to `T` under the given options.
///
/// # Examples
/// ```
/// use serde::Deserialize;
/// use serde_json::json;
/// use yamlbridge_core::binder::from_value_with_options;
/// use yamlbridge_core::{DecodeOptions, Error};
///
/// #[derive(Deserialize, Debug)]
/// struct Pair { a: String, b: String }
///
/// let err = from_value_with_options::<Pair>(json!({"a": "x", "b": "y", "c": 1}), &DecodeOptions::strict())
///     .unwrap_err();
/// assert!(matches!(err, Error::UnknownField { ref field, ref type_name, .. }
///     if field == "c" && type_name == "Pair"));
/// ```
pub fn from_value_with_options<T>(value: Value, options: &DecodeOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    if !options.is_strict() {
        return bind(value, Mode::lenient());
    }
    let flattened = Rc::new(Flattened::default());
    let bound = bind(value.clone(), Mode::strict(Rc::clone(&flattened)))?;
    let buffered = flattened.buffered.take();
    if !buffered.is_empty() {
        debug!(
            keys = buffered.len(),
            unknown_fields = %options.unknown_fields,
            "checking keys buffered for flattened fields"
        );
    }
    for (ordinal, key) in buffered.into_iter().enumerate() {
        let mode = Mode::strict(Rc::new(Flattened::poisoning(ordinal)));
        if T::deserialize(Binder::new(value.clone(), mode)).is_ok() {
            return Err(Error::UnknownField {
                field: key.field,
                type_name: key.type_name,
                path: key.path,
            });
        }
    }
    Ok(bound)
}

fn bind<T>(value: Value, mode: Mode) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_path_to_error::deserialize(Binder::new(value, mode)).map_err(|err| {
        let path = match err.path().to_string() {
            root if root == "." => String::new(),
            path => path,
        };
        match err.into_inner() {
            Error::UnknownField {
                field, type_name, ..
            } => Error::UnknownField {
                field,
                type_name,
                path,
            },
            Error::Message(message) => Error::Bind { message, path },
            other => other,
        }
    })
}

/// Strictness shared by every binder of one bind.
#[derive(Clone)]
struct Mode {
    /// Present when unknown fields are denied.
    flattened: Option<Rc<Flattened>>,
}

impl Mode {
    fn lenient() -> Self {
        Mode { flattened: None }
    }

    fn strict(flattened: Rc<Flattened>) -> Self {
        Mode {
            flattened: Some(flattened),
        }
    }

    fn denies(&self) -> bool {
        self.flattened.is_some()
    }
}

/// Keys of flatten-style structs seen during one strict bind, and the
/// location currently being bound.
#[derive(Default)]
struct Flattened {
    path: RefCell<Path>,
    buffered: RefCell<Vec<BufferedKey>>,
    /// Ordinal of the buffered key whose value is replaced in this bind.
    poisoned: Option<usize>,
}

struct BufferedKey {
    field: String,
    type_name: String,
    path: String,
}

impl Flattened {
    fn poisoning(ordinal: usize) -> Self {
        Flattened {
            poisoned: Some(ordinal),
            ..Flattened::default()
        }
    }

    /// Record a key; true when its value is the one to replace.
    fn buffer(&self, field: String, type_name: String) -> bool {
        let mut buffered = self.buffered.borrow_mut();
        let ordinal = buffered.len();
        buffered.push(BufferedKey {
            field,
            type_name,
            path: self.path.borrow().to_string(),
        });
        self.poisoned == Some(ordinal)
    }

    fn enter(&self, segment: Segment) {
        self.path.borrow_mut().push(segment);
    }

    fn leave(&self) {
        self.path.borrow_mut().pop();
    }
}

/// Struct name from a derived visitor's expectation text (`struct Config`).
fn owner_name(visitor: &dyn Expected) -> String {
    let text = visitor.to_string();
    match text.strip_prefix("struct ") {
        Some(name) => name.to_string(),
        None => text,
    }
}

struct Binder {
    value: Value,
    mode: Mode,
    /// Rejects every request, so that whichever field reads it fails.
    poisoned: bool,
}

impl Binder {
    fn new(value: Value, mode: Mode) -> Self {
        Binder {
            value,
            mode,
            poisoned: false,
        }
    }
}

/// A newtype wrapping null: no derived field type, number or string
/// accepts it.
fn poison<'de, V>(visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    visitor.visit_newtype_struct(Binder::new(Value::Null, Mode::lenient()))
}

impl<'de> de::Deserializer<'de> for Binder {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.poisoned {
            return poison(visitor);
        }
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else {
                    visitor.visit_f64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => visit_array(items, self.mode, visitor),
            Value::Object(map) => visit_object(map, None, None, self.mode, visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.poisoned {
            return poison(visitor);
        }
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.poisoned {
            return poison(visitor);
        }
        match self.value {
            Value::Bool(b) => visitor.visit_string(b.to_string()),
            Value::Number(n) => visitor.visit_string(format_number(&n)),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.poisoned {
            return poison(visitor);
        }
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.poisoned {
            return poison(visitor);
        }
        match self.value {
            Value::Object(map) => {
                let owner = self.mode.denies().then(|| owner_name(&visitor));
                visit_object(map, None, owner, self.mode, visitor)
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.poisoned {
            return poison(visitor);
        }
        match self.value {
            Value::Object(map) => {
                let spec = self.mode.denies().then_some(FieldSpec {
                    type_name: name,
                    fields,
                });
                visit_object(map, spec, None, self.mode, visitor)
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.poisoned {
            return poison(visitor);
        }
        match self.value {
            Value::String(variant) => visitor.visit_enum(StringDeserializer::<Error>::new(variant)),
            Value::Object(map) if map.len() == 1 => {
                let mut entries = map.into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumBinder {
                        name,
                        variant,
                        value,
                        mode: self.mode,
                    }),
                    None => Err(Error::invalid_length(0, &"map with a single key")),
                }
            }
            other => Err(Error::invalid_type(unexpected(&other), &"string or map")),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char bytes
        byte_buf unit unit_struct seq tuple tuple_struct identifier
    }
}

fn visit_array<'de, V>(items: Vec<Value>, mode: Mode, visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let len = items.len();
    let mut seq = SeqBinder {
        iter: items.into_iter(),
        index: 0,
        mode,
    };
    let value = visitor.visit_seq(&mut seq)?;
    if seq.iter.len() == 0 {
        Ok(value)
    } else {
        Err(Error::invalid_length(len, &"fewer elements in array"))
    }
}

/// `spec` checks keys against a struct's field table; `owner` names a
/// flatten-style struct whose keys are recorded instead.
fn visit_object<'de, V>(
    map: Map<String, Value>,
    spec: Option<FieldSpec>,
    owner: Option<String>,
    mode: Mode,
    visitor: V,
) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let len = map.len();
    let mut access = MapBinder {
        iter: map.into_iter(),
        entry: None,
        spec,
        owner,
        field_key: Cell::new(false),
        mode,
    };
    let value = visitor.visit_map(&mut access)?;
    if access.iter.len() == 0 {
        Ok(value)
    } else {
        Err(Error::invalid_length(len, &"fewer elements in map"))
    }
}

struct SeqBinder {
    iter: std::vec::IntoIter<Value>,
    index: usize,
    mode: Mode,
}

impl<'de> SeqAccess<'de> for SeqBinder {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        let Some(value) = self.iter.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        let binder = Binder::new(value, self.mode.clone());
        match &self.mode.flattened {
            Some(flattened) => {
                flattened.enter(Segment::Index(index));
                let result = seed.deserialize(binder);
                flattened.leave();
                result.map(Some)
            }
            None => seed.deserialize(binder).map(Some),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapBinder {
    iter: serde_json::map::IntoIter,
    /// The pending value, with its key when binding strictly.
    entry: Option<(Option<String>, Value)>,
    spec: Option<FieldSpec>,
    owner: Option<String>,
    /// Whether the last key was read as a struct field identifier.
    field_key: Cell<bool>,
    mode: Mode,
}

impl<'de> MapAccess<'de> for MapBinder {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        if let Some(spec) = &self.spec {
            if !spec.declares(&key) {
                return Err(Error::UnknownField {
                    field: key,
                    type_name: spec.type_name.to_string(),
                    path: String::new(),
                });
            }
        }
        let kept = self.mode.denies().then(|| key.clone());
        self.entry = Some((kept, value));
        self.field_key.set(false);
        seed.deserialize(KeyBinder {
            key,
            field_key: &self.field_key,
        })
        .map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let Some((key, value)) = self.entry.take() else {
            return Err(Error::custom("value is missing"));
        };
        let (Some(flattened), Some(key)) = (&self.mode.flattened, key) else {
            return seed.deserialize(Binder::new(value, self.mode.clone()));
        };
        let poisoned = match &self.owner {
            Some(owner) if self.field_key.get() => flattened.buffer(key.clone(), owner.clone()),
            _ => false,
        };
        flattened.enter(Segment::Key(key));
        let result = seed.deserialize(Binder {
            value,
            mode: self.mode.clone(),
            poisoned,
        });
        flattened.leave();
        result
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumBinder {
    name: &'static str,
    variant: String,
    value: Value,
    mode: Mode,
}

impl<'de> EnumAccess<'de> for EnumBinder {
    type Error = Error;
    type Variant = VariantBinder;

    fn variant_seed<S>(self, seed: S) -> Result<(S::Value, VariantBinder)>
    where
        S: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(StringDeserializer::<Error>::new(self.variant))?;
        Ok((
            variant,
            VariantBinder {
                name: self.name,
                value: self.value,
                mode: self.mode,
            },
        ))
    }
}

struct VariantBinder {
    name: &'static str,
    value: Value,
    mode: Mode,
}

impl<'de> VariantAccess<'de> for VariantBinder {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(Error::invalid_type(unexpected(&other), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(Binder::new(self.value, self.mode))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Array(items) => visit_array(items, self.mode, visitor),
            other => Err(Error::invalid_type(unexpected(&other), &"tuple variant")),
        }
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_struct(
            Binder::new(self.value, self.mode),
            self.name,
            fields,
            visitor,
        )
    }
}

/// Deserializer for object keys. Keys are canonical strings; key types that
/// are not strings parse them back.
struct KeyBinder<'a> {
    key: String,
    field_key: &'a Cell<bool>,
}

macro_rules! deserialize_parsed_key {
    ($($method:ident => $visit:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                match self.key.parse() {
                    Ok(parsed) => visitor.$visit(parsed),
                    Err(_) => visitor.visit_string(self.key),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for KeyBinder<'_> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_string(self.key)
    }

    deserialize_parsed_key! {
        deserialize_bool => visit_bool,
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_i128 => visit_i128,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_u128 => visit_u128,
        deserialize_f32 => visit_f32,
        deserialize_f64 => visit_f64,
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.field_key.set(true);
        visitor.visit_string(self.key)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_enum(StringDeserializer::<Error>::new(self.key))
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct ignored_any
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Unexpected::Unsigned(u)
            } else if let Some(i) = n.as_i64() {
                Unexpected::Signed(i)
            } else {
                Unexpected::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ {} }}", self.type_name, self.fields.join(", "))
    }
}
