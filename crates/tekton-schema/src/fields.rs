//! Typed accessors over a configuration tree.
//!
//! [`FieldReader`] walks one map of the tree and hands out typed leaves,
//! treating absence as "not set". [`FieldWriter`] builds the inverse map and
//! omits zero values, so that `flatten(expand(t)) == t` for every tree that
//! does not spell out zero values explicitly.

use std::collections::BTreeMap;

use crate::error::SchemaError;
use crate::tree::{ConfigMap, ConfigValue, FieldPath};

pub type Result<T> = std::result::Result<T, SchemaError>;

/// A structure that can be read from and written to one map of the tree.
pub trait ConfigBlock: Sized {
    fn expand(fields: &FieldReader<'_>) -> Result<Self>;

    fn flatten(&self) -> ConfigMap;
}

/// A closed set of string values.
pub trait EnumValue: Sized + Copy {
    const ALLOWED: &'static [&'static str];

    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self>;
}

/// Declares a string enum with serde support and an [`EnumValue`] impl.
#[macro_export]
macro_rules! string_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(#[serde(rename = $value)] $variant),+
        }

        impl $crate::fields::EnumValue for $name {
            const ALLOWED: &'static [&'static str] = &[$($value),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            fn parse(value: &str) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::fields::EnumValue::as_str(self))
            }
        }
    };
}

#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    map: &'a ConfigMap,
    path: &'a FieldPath,
}

impl<'a> FieldReader<'a> {
    pub fn new(map: &'a ConfigMap, path: &'a FieldPath) -> Self {
        Self { map, path }
    }

    pub fn path(&self) -> &FieldPath {
        self.path
    }

    fn get(&self, key: &str) -> Option<&'a ConfigValue> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn mismatch(&self, key: &str, expected: &'static str) -> SchemaError {
        SchemaError::type_mismatch(self.path.join(key), expected)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn string(&self, key: &str) -> Result<String> {
        match self.get(key) {
            None => Ok(String::new()),
            Some(ConfigValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.mismatch(key, "string")),
        }
    }

    /// Like [`string`](Self::string) but absence (or an empty value) is an error.
    pub fn required_string(&self, key: &str) -> Result<String> {
        let value = self.string(key)?;
        if value.is_empty() {
            return Err(SchemaError::missing_field(self.path.join(key)));
        }
        Ok(value)
    }

    pub fn bool(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None => Ok(false),
            Some(ConfigValue::Bool(b)) => Ok(*b),
            Some(_) => Err(self.mismatch(key, "bool")),
        }
    }

    pub fn int(&self, key: &str) -> Result<i64> {
        match self.get(key) {
            None => Ok(0),
            Some(ConfigValue::Int(i)) => Ok(*i),
            Some(_) => Err(self.mismatch(key, "int")),
        }
    }

    pub fn strings(&self, key: &str) -> Result<Vec<String>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(ConfigValue::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    ConfigValue::String(s) => Ok(s.clone()),
                    _ => Err(SchemaError::type_mismatch(self.path.join(key).join(i), "string")),
                })
                .collect(),
            Some(_) => Err(self.mismatch(key, "list")),
        }
    }

    pub fn string_map(&self, key: &str) -> Result<BTreeMap<String, String>> {
        match self.get(key) {
            None => Ok(BTreeMap::new()),
            Some(ConfigValue::Map(entries)) => entries
                .iter()
                .map(|(k, v)| match v {
                    ConfigValue::String(s) => Ok((k.clone(), s.clone())),
                    _ => Err(SchemaError::type_mismatch(self.path.join(key).join(k), "string")),
                })
                .collect(),
            Some(_) => Err(self.mismatch(key, "map")),
        }
    }

    pub fn enumerated<T: EnumValue>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::String(s)) if s.is_empty() => Ok(None),
            Some(ConfigValue::String(s)) => T::parse(s)
                .map(Some)
                .ok_or_else(|| SchemaError::invalid_value(self.path.join(key), s.clone(), T::ALLOWED)),
            Some(_) => Err(self.mismatch(key, "string")),
        }
    }

    pub fn required_enumerated<T: EnumValue>(&self, key: &str) -> Result<T> {
        self.enumerated(key)?
            .ok_or_else(|| SchemaError::missing_field(self.path.join(key)))
    }

    pub fn block<T: ConfigBlock>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Map(map)) => {
                let path = self.path.join(key);
                T::expand(&FieldReader::new(map, &path)).map(Some)
            }
            Some(_) => Err(self.mismatch(key, "map")),
        }
    }

    /// Reads a nested block that must be present.
    pub fn required_block<T: ConfigBlock>(&self, key: &str) -> Result<T> {
        self.block(key)?
            .ok_or_else(|| SchemaError::missing_field(self.path.join(key)))
    }

    /// Reads a sequence of blocks, preserving source order.
    pub fn blocks<T: ConfigBlock>(&self, key: &str) -> Result<Vec<T>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(ConfigValue::List(items)) => {
                let list_path = self.path.join(key);
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let path = list_path.join(i);
                        match item {
                            ConfigValue::Map(map) => T::expand(&FieldReader::new(map, &path)),
                            _ => Err(SchemaError::type_mismatch(path, "map")),
                        }
                    })
                    .collect()
            }
            Some(_) => Err(self.mismatch(key, "list")),
        }
    }

    /// Reads a map of named blocks.
    pub fn block_map<T: ConfigBlock>(&self, key: &str) -> Result<BTreeMap<String, T>> {
        match self.get(key) {
            None => Ok(BTreeMap::new()),
            Some(ConfigValue::Map(entries)) => {
                let map_path = self.path.join(key);
                entries
                    .iter()
                    .map(|(name, item)| {
                        let path = map_path.join(name);
                        match item {
                            ConfigValue::Map(map) => {
                                T::expand(&FieldReader::new(map, &path)).map(|v| (name.clone(), v))
                            }
                            _ => Err(SchemaError::type_mismatch(path, "map")),
                        }
                    })
                    .collect()
            }
            Some(_) => Err(self.mismatch(key, "map")),
        }
    }
}

#[derive(Debug, Default)]
pub struct FieldWriter {
    map: ConfigMap,
}

impl FieldWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.map.insert(key.to_string(), ConfigValue::from(value));
        }
        self
    }

    pub fn bool(mut self, key: &str, value: bool) -> Self {
        if value {
            self.map.insert(key.to_string(), ConfigValue::Bool(true));
        }
        self
    }

    pub fn int(mut self, key: &str, value: i64) -> Self {
        if value != 0 {
            self.map.insert(key.to_string(), ConfigValue::Int(value));
        }
        self
    }

    pub fn strings(mut self, key: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            let items = values.iter().map(|v| ConfigValue::from(v.as_str())).collect();
            self.map.insert(key.to_string(), ConfigValue::List(items));
        }
        self
    }

    pub fn string_map(mut self, key: &str, values: &BTreeMap<String, String>) -> Self {
        if !values.is_empty() {
            let entries = values
                .iter()
                .map(|(k, v)| (k.clone(), ConfigValue::from(v.as_str())))
                .collect();
            self.map.insert(key.to_string(), ConfigValue::Map(entries));
        }
        self
    }

    pub fn enumerated<T: EnumValue>(mut self, key: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.map.insert(key.to_string(), ConfigValue::from(value.as_str()));
        }
        self
    }

    /// Writes an optional block. A present but empty block is kept, since
    /// its presence alone can be meaningful (e.g. an `empty_dir` binding).
    pub fn block<T: ConfigBlock>(mut self, key: &str, value: Option<&T>) -> Self {
        if let Some(value) = value {
            self.map.insert(key.to_string(), ConfigValue::Map(value.flatten()));
        }
        self
    }

    /// Writes a block that always exists on the domain side; omitted when it
    /// flattens to nothing.
    pub fn section<T: ConfigBlock>(mut self, key: &str, value: &T) -> Self {
        let map = value.flatten();
        if !map.is_empty() {
            self.map.insert(key.to_string(), ConfigValue::Map(map));
        }
        self
    }

    pub fn blocks<T: ConfigBlock>(mut self, key: &str, values: &[T]) -> Self {
        if !values.is_empty() {
            let items = values.iter().map(|v| ConfigValue::Map(v.flatten())).collect();
            self.map.insert(key.to_string(), ConfigValue::List(items));
        }
        self
    }

    pub fn block_map<T: ConfigBlock>(mut self, key: &str, values: &BTreeMap<String, T>) -> Self {
        if !values.is_empty() {
            let entries = values
                .iter()
                .map(|(k, v)| (k.clone(), ConfigValue::Map(v.flatten())))
                .collect();
            self.map.insert(key.to_string(), ConfigValue::Map(entries));
        }
        self
    }

    pub fn value(mut self, key: &str, value: ConfigValue) -> Self {
        self.map.insert(key.to_string(), value);
        self
    }

    pub fn finish(self) -> ConfigMap {
        self.map
    }
}

/// Expands a whole tree into `T`.
pub fn expand<T: ConfigBlock>(tree: &ConfigMap) -> Result<T> {
    let root = FieldPath::root();
    T::expand(&FieldReader::new(tree, &root))
}

/// Flattens `T` into a whole tree.
pub fn flatten<T: ConfigBlock>(value: &T) -> ConfigMap {
    value.flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    string_enum! {
        enum Color {
            Red => "red",
            Green => "green",
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        name: String,
        color: Option<Color>,
        tags: Vec<String>,
        enabled: bool,
    }

    impl ConfigBlock for Item {
        fn expand(fields: &FieldReader<'_>) -> Result<Self> {
            Ok(Self {
                name: fields.required_string("name")?,
                color: fields.enumerated("color")?,
                tags: fields.strings("tags")?,
                enabled: fields.bool("enabled")?,
            })
        }

        fn flatten(&self) -> ConfigMap {
            FieldWriter::new()
                .string("name", &self.name)
                .enumerated("color", self.color)
                .strings("tags", &self.tags)
                .bool("enabled", self.enabled)
                .finish()
        }
    }

    fn tree(value: serde_json::Value) -> ConfigMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_absent_fields_default() {
        let item: Item = expand(&tree(json!({"name": "a"}))).unwrap();
        assert_eq!(item, Item { name: "a".into(), ..Default::default() });
    }

    #[test]
    fn test_null_counts_as_absent() {
        let item: Item = expand(&tree(json!({"name": "a", "tags": null}))).unwrap();
        assert!(item.tags.is_empty());
    }

    #[test]
    fn test_required_leaf_missing() {
        let err = expand::<Item>(&tree(json!({"color": "red"}))).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { ref path } if path == "name"));
    }

    #[test]
    fn test_type_mismatch_reports_path() {
        let err = expand::<Item>(&tree(json!({"name": "a", "tags": ["x", 3]}))).unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { ref path, .. } if path == "tags.1"));
    }

    #[test]
    fn test_enum_outside_closed_set() {
        let err = expand::<Item>(&tree(json!({"name": "a", "color": "blue"}))).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidValue { ref value, .. } if value == "blue"));
    }

    #[test]
    fn test_round_trip() {
        let original = tree(json!({"name": "a", "color": "green", "tags": ["x", "y"], "enabled": true}));
        let item: Item = expand(&original).unwrap();
        assert_eq!(flatten(&item), original);
    }

    #[test]
    fn test_blocks_preserve_order() {
        #[derive(Debug)]
        struct Holder(Vec<Item>);
        impl ConfigBlock for Holder {
            fn expand(fields: &FieldReader<'_>) -> Result<Self> {
                Ok(Self(fields.blocks("items")?))
            }
            fn flatten(&self) -> ConfigMap {
                FieldWriter::new().blocks("items", &self.0).finish()
            }
        }

        let original = tree(json!({"items": [{"name": "c"}, {"name": "a"}, {"name": "b"}]}));
        let holder: Holder = expand(&original).unwrap();
        let names: Vec<&str> = holder.0.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(flatten(&holder), original);

        let err = expand::<Holder>(&tree(json!({"items": [{"name": "c"}, {}]}))).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { ref path } if path == "items.1.name"));
    }
}
