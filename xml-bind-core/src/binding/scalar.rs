use tracing::trace;

use crate::binding::value::{FieldKind, Protection, Rule, Value};
use crate::entry::{EntryStore, ProtectedString};
use crate::tree::XmlNode;

/// Static description of a leaf: where it lives in an entry and how its
/// text is converted and validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafDef {
    pub entry_key: &'static str,
    pub kind: FieldKind,
    pub rule: Rule,
    pub protection: Protection,
}

/// A typed leaf value bound to an entry key.
///
/// `is_valid` reports whether the last assigned or parsed value passed both
/// the kind's string check and the leaf's [`Rule`]. A failed assignment
/// leaves the kind's default value behind.
#[derive(Debug, Clone)]
pub struct Scalar {
    def: LeafDef,
    mandatory: bool,
    value: Value,
    last_valid: bool,
    loaded_tag: Option<bool>,
}

impl Scalar {
    pub fn new(def: LeafDef, mandatory: bool) -> Self {
        Self {
            def,
            mandatory,
            value: def.kind.default_value(),
            last_valid: false,
            loaded_tag: None,
        }
    }

    pub fn def(&self) -> &LeafDef {
        &self.def
    }

    pub fn entry_key(&self) -> &'static str {
        self.def.entry_key
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn is_valid(&self) -> bool {
        self.last_valid
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The value as text, only if it is valid.
    pub fn valid_text(&self) -> Option<&str> {
        match (&self.value, self.last_valid) {
            (Value::Text(text), true) => Some(text),
            _ => None,
        }
    }

    /// The serialized string form of the current value.
    pub fn serialized(&self) -> String {
        self.value.to_string()
    }

    /// Parse `raw` into the leaf.
    ///
    /// On any failure the leaf is cleared and `false` is returned.
    pub fn set_from_str(&mut self, raw: &str) -> bool {
        if !self.def.kind.accepts_str(raw) {
            trace!(key = self.def.entry_key, "rejected by string check");
            self.clear();
            return false;
        }
        let Some(value) = self.def.kind.convert(raw) else {
            self.clear();
            return false;
        };
        if !self.def.rule.accepts(&value) {
            trace!(key = self.def.entry_key, "rejected by value rule");
            self.clear();
            return false;
        }

        self.value = value;
        self.last_valid = true;
        self.loaded_tag = None;
        true
    }

    /// Assign a typed value directly, recomputing validity from the rule.
    ///
    /// A value of the wrong kind clears the leaf.
    pub fn set_value(&mut self, value: Value) -> bool {
        if !self.def.kind.matches(&value) {
            self.clear();
            return false;
        }
        self.last_valid = self.def.rule.accepts(&value);
        self.value = value;
        self.loaded_tag = None;
        self.last_valid
    }

    /// Valid, and either mandatory or non-empty once serialized.
    pub fn write_necessary(&self) -> bool {
        self.last_valid && (self.mandatory || !self.serialized().is_empty())
    }

    /// Store the value as the text of `element`.
    pub fn write_xml(&self, element: &mut XmlNode) {
        if self.write_necessary() {
            let text = self.serialized();
            element.text = if text.is_empty() { None } else { Some(text) };
        }
    }

    /// Read the text of `element`; a missing text counts as empty.
    pub fn read_xml(&mut self, element: &XmlNode) -> bool {
        self.set_from_str(element.text.as_deref().unwrap_or(""))
    }

    pub fn exists_in(&self, store: &dyn EntryStore) -> bool {
        store.exists(self.def.entry_key)
    }

    pub fn save_in(&self, store: &mut dyn EntryStore) -> bool {
        if !self.last_valid {
            return false;
        }

        let protected = match self.def.protection {
            Protection::Never => false,
            Protection::Inherit => self
                .loaded_tag
                .unwrap_or_else(|| store.protects(self.def.entry_key)),
        };
        store.set(
            self.def.entry_key,
            ProtectedString::new(protected, self.serialized()),
        );
        true
    }

    pub fn load_from(&mut self, store: &dyn EntryStore) -> bool {
        let Some(stored) = store.get(self.def.entry_key).cloned() else {
            return false;
        };

        if self.set_from_str(&stored.value) {
            self.loaded_tag = Some(stored.protected);
        }
        self.last_valid
    }

    pub fn clear_in(&self, store: &mut dyn EntryStore) {
        store.remove(self.def.entry_key);
    }

    pub fn clear(&mut self) {
        self.value = self.def.kind.default_value();
        self.last_valid = false;
        self.loaded_tag = None;
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.def == other.def
            && self.mandatory == other.mandatory
            && self.last_valid == other.last_valid
            && self.value == other.value
    }
}

#[cfg(test)]
mod tests {
    use super::{LeafDef, Scalar};
    use crate::binding::value::{FieldKind, Protection, Rule, Value};
    use crate::entry::{Entry, EntryStore, ProtectedString, PASSWORD_KEY};
    use crate::tree::XmlNode;

    fn leaf(kind: FieldKind, rule: Rule) -> LeafDef {
        LeafDef {
            entry_key: "k",
            kind,
            rule,
            protection: Protection::Inherit,
        }
    }

    #[test]
    fn failed_parse_resets_to_default() {
        let mut ttl = Scalar::new(leaf(FieldKind::Int, Rule::Range { min: 5, max: 1400 }), false);
        assert!(ttl.set_from_str("720"));
        assert_eq!(ttl.value(), &Value::Int(720));

        assert!(!ttl.set_from_str("4"));
        assert_eq!(ttl.value(), &Value::Int(0));
        assert!(!ttl.is_valid());

        assert!(ttl.set_from_str("1400"));
        assert!(!ttl.set_from_str("soon"));
        assert_eq!(ttl.value(), &Value::Int(0));
    }

    #[test]
    fn set_value_skips_string_check_but_applies_rule() {
        let mut mode = Scalar::new(leaf(FieldKind::Text, Rule::OneOf(&["auto", "manual"])), false);
        assert!(mode.set_value(Value::Text("auto".to_string())));
        assert!(!mode.set_value(Value::Text("sometimes".to_string())));
        assert_eq!(mode.value(), &Value::Text("sometimes".to_string()));
        assert!(!mode.set_value(Value::Int(1)));
        assert_eq!(mode.value(), &Value::Text(String::new()));
    }

    #[test]
    fn optional_empty_text_is_not_necessary() {
        let mut optional = Scalar::new(leaf(FieldKind::Text, Rule::Any), false);
        let mut mandatory = Scalar::new(leaf(FieldKind::Text, Rule::Any), true);
        assert!(optional.set_from_str(""));
        assert!(mandatory.set_from_str(""));

        assert!(!optional.write_necessary());
        assert!(mandatory.write_necessary());
    }

    #[test]
    fn invalid_leaf_is_never_saved() {
        let scalar = Scalar::new(leaf(FieldKind::Bool, Rule::Any), true);
        let mut entry = Entry::new();
        assert!(!scalar.save_in(&mut entry));
        assert!(entry.is_empty());
    }

    #[test]
    fn load_keeps_protection_tag_for_next_save() {
        let def = LeafDef {
            entry_key: PASSWORD_KEY,
            kind: FieldKind::Text,
            rule: Rule::Any,
            protection: Protection::Inherit,
        };
        let mut source = Entry::new();
        source.set(PASSWORD_KEY, ProtectedString::new(false, "visible"));

        let mut scalar = Scalar::new(def, true);
        assert!(scalar.load_from(&source));

        let mut target = Entry::new();
        assert!(scalar.save_in(&mut target));
        assert_eq!(target.get(PASSWORD_KEY), Some(&ProtectedString::new(false, "visible")));

        scalar.set_from_str("fresh");
        assert!(scalar.save_in(&mut target));
        assert!(target.get(PASSWORD_KEY).unwrap().protected);
    }

    #[test]
    fn never_protected_leaf_ignores_store_policy() {
        let def = LeafDef {
            entry_key: PASSWORD_KEY,
            kind: FieldKind::Text,
            rule: Rule::Any,
            protection: Protection::Never,
        };
        let mut scalar = Scalar::new(def, true);
        scalar.set_from_str("x");
        let mut entry = Entry::new();
        scalar.save_in(&mut entry);
        assert!(!entry.get(PASSWORD_KEY).unwrap().protected);
    }

    #[test]
    fn xml_read_treats_missing_text_as_empty() {
        let mut name = Scalar::new(leaf(FieldKind::Text, Rule::Length { min: 1, max: 32 }), false);
        assert!(!name.read_xml(&XmlNode::new("name")));

        let mut element = XmlNode::new("name");
        element.text = Some("HomeWifi".to_string());
        assert!(name.read_xml(&element));

        let mut out = XmlNode::new("name");
        name.write_xml(&mut out);
        assert_eq!(out.text.as_deref(), Some("HomeWifi"));
    }
}
