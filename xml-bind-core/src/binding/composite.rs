use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::binding::scalar::Scalar;
use crate::binding::schema::{MemberKind, NodeDef, NodeId, Schema};
use crate::binding::value::Value;
use crate::entry::EntryStore;
use crate::tree::XmlNode;

/// Instance state of one member of a [`Composite`].
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<'s> {
    Leaf(Scalar),
    /// `None` when the nested composite is absent or was dropped as invalid.
    Node(Option<Box<Composite<'s>>>),
}

impl Slot<'_> {
    pub fn is_valid(&self) -> bool {
        match self {
            Slot::Leaf(scalar) => scalar.is_valid(),
            Slot::Node(node) => node.as_ref().is_some_and(|node| node.is_valid()),
        }
    }

    fn write_necessary(&self) -> bool {
        match self {
            Slot::Leaf(scalar) => scalar.write_necessary(),
            Slot::Node(node) => node.is_some(),
        }
    }
}

/// One leaf of a composite tree, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldState {
    /// Member names from the root, joined with `/`.
    pub path: String,
    pub entry_key: &'static str,
    /// Serialized value, `None` when the leaf is invalid.
    pub value: Option<String>,
    pub mandatory: bool,
    /// Whether serialization would emit the leaf.
    pub written: bool,
}

/// An instance of a schema composite: an ordered set of leaves and nested
/// composites.
///
/// Valid iff every mandatory member is valid and, when the definition names
/// alternatives, at least one of them is valid. Invalid optional members are
/// treated as absent.
#[derive(Clone)]
pub struct Composite<'s> {
    schema: &'s Schema,
    id: NodeId,
    slots: Vec<Slot<'s>>,
}

impl<'s> Composite<'s> {
    pub fn new(schema: &'s Schema, id: NodeId) -> Self {
        let slots = schema
            .node(id)
            .members
            .iter()
            .map(|member| match &member.kind {
                MemberKind::Leaf(leaf) => Slot::Leaf(Scalar::new(*leaf, member.mandatory)),
                MemberKind::Node { .. } => Slot::Node(None),
            })
            .collect();
        Self { schema, id, slots }
    }

    /// An empty instance of the schema's root composite.
    pub fn root(schema: &'s Schema) -> Self {
        Self::new(schema, schema.root())
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn def(&self) -> &'s NodeDef {
        self.schema.node(self.id)
    }

    pub fn slots(&self) -> &[Slot<'s>] {
        &self.slots
    }

    pub fn is_valid(&self) -> bool {
        let def = self.def();
        let mandatory_ok = def
            .members
            .iter()
            .zip(&self.slots)
            .all(|(member, slot)| !member.mandatory || slot.is_valid());
        let alternatives_ok = def.require_any.is_empty()
            || def
                .require_any
                .iter()
                .any(|index| self.slots[*index].is_valid());
        mandatory_ok && alternatives_ok
    }

    /// Append one child element per member worth writing.
    ///
    /// Members without a namespace inherit the namespace of `element`.
    pub fn write_xml(&self, element: &mut XmlNode) {
        let def = self.def();
        for (member, slot) in def.members.iter().zip(&self.slots) {
            if !slot.is_valid() {
                if member.mandatory {
                    // Callers check validity first; reaching this means the
                    // instance changed under them.
                    warn!(
                        node = def.name,
                        member = member.name,
                        "mandatory member invalid during serialization, stopping"
                    );
                    break;
                }
                continue;
            }
            if !slot.write_necessary() {
                debug!(node = def.name, member = member.name, "pruned empty member");
                continue;
            }

            let namespace = member.namespace.or(element.namespace.as_deref());
            let mut child = XmlNode::with_namespace(member.name, namespace);
            match slot {
                Slot::Leaf(scalar) => scalar.write_xml(&mut child),
                Slot::Node(Some(node)) => node.write_xml(&mut child),
                Slot::Node(None) => continue,
            }
            element.children.push(child);
        }
    }

    /// Replace the instance's content with what `element` holds.
    ///
    /// Child elements that match no declared member are skipped together with
    /// their subtree. Nested composites that end up invalid are dropped.
    pub fn read_xml(&mut self, element: &XmlNode) {
        self.clear();
        let schema = self.schema;
        let def = self.def();
        let inherited = element.namespace.as_deref();

        for child in &element.children {
            let matched = def.members.iter().position(|member| {
                child.is(member.name, member.namespace.or(inherited))
            });
            let Some(index) = matched else {
                debug!(
                    node = def.name,
                    element = child.tag.as_str(),
                    namespace = child.namespace.as_deref().unwrap_or(""),
                    "skipping unsupported element"
                );
                continue;
            };

            match (&mut self.slots[index], &def.members[index].kind) {
                (Slot::Leaf(scalar), _) => {
                    scalar.read_xml(child);
                }
                (Slot::Node(slot), MemberKind::Node { id, .. }) => {
                    let mut nested = Composite::new(schema, *id);
                    nested.read_xml(child);
                    *slot = nested.is_valid().then(|| Box::new(nested));
                }
                (Slot::Node(_), MemberKind::Leaf(_)) => {}
            }
        }
    }

    /// Build the document root element and serialize into it.
    pub fn to_document(&self) -> XmlNode {
        let document = self.schema.document();
        let mut root = XmlNode::with_namespace(document.tag, document.namespace);
        self.write_xml(&mut root);
        root
    }

    /// Read a whole document. Returns `false` without touching the instance
    /// when the root element is not the schema's document root.
    pub fn read_document(&mut self, root: &XmlNode) -> bool {
        let document = self.schema.document();
        if !root.is(document.tag, document.namespace) {
            return false;
        }
        self.read_xml(root);
        true
    }

    /// Whether any key of this composite's subtree is stored in `store`.
    pub fn exists_in(&self, store: &dyn EntryStore) -> bool {
        match self.def().presence {
            Some(presence) => presence.holds(store),
            None => {
                let keys = self.schema.keys_of(self.id);
                store.keys().iter().any(|key| keys.contains(key.as_str()))
            }
        }
    }

    /// Persist the instance into `store`, replacing whatever the subtree's
    /// keys held before.
    ///
    /// Fails, leaving the subtree's keys wiped, when the instance is invalid
    /// or a mandatory member cannot be saved. Optional members that fail are
    /// left out.
    pub fn save_in(&self, store: &mut dyn EntryStore) -> bool {
        self.clear_in(store);
        if !self.is_valid() {
            return false;
        }

        let def = self.def();
        for (member, slot) in def.members.iter().zip(&self.slots) {
            let saved = match slot {
                Slot::Leaf(scalar) => {
                    if scalar.is_valid() && !scalar.write_necessary() {
                        continue;
                    }
                    scalar.save_in(store)
                }
                Slot::Node(Some(node)) => node.save_in(store),
                Slot::Node(None) => false,
            };

            if !saved && member.mandatory {
                debug!(node = def.name, member = member.name, "mandatory member not saved");
                self.clear_in(store);
                return false;
            }
        }
        true
    }

    /// Replace the instance's content with what `store` holds.
    ///
    /// A mandatory member that cannot be loaded leaves the whole instance
    /// cleared.
    pub fn load_from(&mut self, store: &dyn EntryStore) -> bool {
        self.clear();
        let schema = self.schema;
        let def = self.def();

        for (index, member) in def.members.iter().enumerate() {
            let loaded = match (&mut self.slots[index], &member.kind) {
                (Slot::Leaf(scalar), _) => scalar.load_from(store),
                (Slot::Node(slot), MemberKind::Node { id, .. }) => {
                    if schema.member_exists_in(member, store) {
                        let mut nested = Composite::new(schema, *id);
                        let ok = nested.load_from(store);
                        *slot = ok.then(|| Box::new(nested));
                        ok
                    } else {
                        false
                    }
                }
                (Slot::Node(_), MemberKind::Leaf(_)) => false,
            };

            if !loaded && member.mandatory {
                self.clear();
                return false;
            }
        }

        self.is_valid()
    }

    /// Remove every key of this composite's subtree from `store`.
    pub fn clear_in(&self, store: &mut dyn EntryStore) {
        let keys = self.schema.keys_of(self.id);
        for key in store.keys() {
            if keys.contains(key.as_str()) {
                store.remove(&key);
            }
        }
    }

    /// Reset every leaf and drop every nested composite.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            match slot {
                Slot::Leaf(scalar) => scalar.clear(),
                Slot::Node(node) => *node = None,
            }
        }
    }

    /// Leaf at `path` (member names from this composite).
    pub fn leaf(&self, path: &[&str]) -> Option<&Scalar> {
        let (first, rest) = path.split_first()?;
        let index = self.def().member_index(first)?;
        match &self.slots[index] {
            Slot::Leaf(scalar) if rest.is_empty() => Some(scalar),
            Slot::Node(Some(node)) if !rest.is_empty() => node.leaf(rest),
            _ => None,
        }
    }

    pub fn leaf_mut(&mut self, path: &[&str]) -> Option<&mut Scalar> {
        let (first, rest) = path.split_first()?;
        let index = self.def().member_index(first)?;
        match &mut self.slots[index] {
            Slot::Leaf(scalar) if rest.is_empty() => Some(scalar),
            Slot::Node(Some(node)) if !rest.is_empty() => node.leaf_mut(rest),
            _ => None,
        }
    }

    /// Nested composite at `path`, if present.
    pub fn child(&self, path: &[&str]) -> Option<&Composite<'s>> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        let index = self.def().member_index(first)?;
        match &self.slots[index] {
            Slot::Node(Some(node)) => node.child(rest),
            _ => None,
        }
    }

    /// Valid text value of the leaf at `path`.
    pub fn text(&self, path: &[&str]) -> Option<&str> {
        self.leaf(path)?.valid_text()
    }

    /// Parse `raw` into the leaf at `path`, creating nested composites on the
    /// way. Returns whether the leaf ended up valid.
    pub fn set(&mut self, path: &[&str], raw: &str) -> bool {
        self.with_leaf(path, |scalar| scalar.set_from_str(raw))
    }

    /// Assign a typed value to the leaf at `path`, creating nested composites
    /// on the way.
    pub fn set_value(&mut self, path: &[&str], value: Value) -> bool {
        self.with_leaf(path, |scalar| scalar.set_value(value))
    }

    fn with_leaf(&mut self, path: &[&str], apply: impl FnOnce(&mut Scalar) -> bool) -> bool {
        let Some((first, rest)) = path.split_first() else {
            return false;
        };
        let schema = self.schema;
        let def = self.def();
        let Some(index) = def.member_index(first) else {
            return false;
        };

        match (&mut self.slots[index], &def.members[index].kind) {
            (Slot::Leaf(scalar), _) if rest.is_empty() => apply(scalar),
            (Slot::Node(slot), MemberKind::Node { id, .. }) if !rest.is_empty() => slot
                .get_or_insert_with(|| Box::new(Composite::new(schema, *id)))
                .with_leaf(rest, apply),
            _ => false,
        }
    }

    /// Drop the member at `path` (a leaf is cleared, a composite removed).
    pub fn unset(&mut self, path: &[&str]) {
        let Some((first, rest)) = path.split_first() else {
            return;
        };
        let Some(index) = self.def().member_index(first) else {
            return;
        };
        match &mut self.slots[index] {
            Slot::Leaf(scalar) if rest.is_empty() => scalar.clear(),
            Slot::Node(slot) if rest.is_empty() => *slot = None,
            Slot::Node(Some(node)) => node.unset(rest),
            _ => {}
        }
    }

    /// Every leaf of the present subtree, in declaration order.
    pub fn field_states(&self) -> Vec<FieldState> {
        let mut out = Vec::new();
        self.collect_states("", &mut out);
        out
    }

    fn collect_states(&self, prefix: &str, out: &mut Vec<FieldState>) {
        for (member, slot) in self.def().members.iter().zip(&self.slots) {
            let path = if prefix.is_empty() {
                member.name.to_string()
            } else {
                format!("{prefix}/{}", member.name)
            };
            match slot {
                Slot::Leaf(scalar) => out.push(FieldState {
                    path,
                    entry_key: scalar.entry_key(),
                    value: scalar.is_valid().then(|| scalar.serialized()),
                    mandatory: member.mandatory,
                    written: scalar.write_necessary(),
                }),
                Slot::Node(Some(node)) => node.collect_states(&path, out),
                Slot::Node(None) => {}
            }
        }
    }

    /// Path to value of every leaf serialization would emit.
    pub fn written_values(&self) -> BTreeMap<String, String> {
        self.field_states()
            .into_iter()
            .filter(|state| state.written)
            .filter_map(|state| state.value.map(|value| (state.path, value)))
            .collect()
    }
}

impl PartialEq for Composite<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.schema, other.schema) && self.id == other.id && self.slots == other.slots
    }
}

impl fmt::Debug for Composite<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("node", &self.def().name)
            .field("slots", &self.slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Composite;
    use crate::binding::schema::{Field, NodeSpec, Presence, Schema, SchemaBuilder};
    use crate::binding::value::Value;
    use crate::entry::{Entry, EntryStore, ProtectedString};
    use crate::parser::parse_str;
    use crate::tree::XmlNode;

    const NS: &str = "urn:test:v1";
    const NS2: &str = "urn:test:v2";

    fn schema() -> Schema {
        SchemaBuilder::new("Root", "root", Some(NS))
            .node(
                NodeSpec::new("Root")
                    .field(Field::text("title", "k_title").mandatory().unprotected())
                    .field(Field::node("pair", "Pair").mandatory())
                    .field(Field::choice("mode", "k_mode", &["auto", "manual"]))
                    .field(Field::node("timers", "Timers").exists_by("k_ttl"))
                    .field(Field::boolean("extra", "k_extra").ns(NS2)),
            )
            .node(
                NodeSpec::new("Pair")
                    .field(Field::text("hex", "k_hex").length(1, 4))
                    .field(Field::text("name", "k_name").length(1, 4))
                    .present_if(Presence::AnyKey(&["k_hex", "k_name"]))
                    .valid_if_any(&["hex", "name"]),
            )
            .node(
                NodeSpec::new("Timers")
                    .field(Field::int("ttl", "k_ttl").range(5, 1400).mandatory())
                    .field(Field::text("note", "k_note")),
            )
            .build()
            .expect("test schema")
    }

    fn populated(schema: &Schema) -> Composite<'_> {
        let mut root = Composite::root(schema);
        assert!(root.set(&["title"], "home"));
        assert!(root.set(&["pair", "name"], "abcd"));
        assert!(root.set(&["mode"], "auto"));
        assert!(root.set(&["timers", "ttl"], "720"));
        root
    }

    #[test]
    fn mandatory_children_drive_validity() {
        let schema = schema();
        let mut root = populated(&schema);
        assert!(root.is_valid());

        root.set(&["mode"], "sometimes");
        assert!(root.is_valid(), "optional invalid member is just absent");

        root.set(&["title"], "");
        assert!(root.is_valid(), "empty text is still a valid text");
        root.leaf_mut(&["title"]).expect("title").clear();
        assert!(!root.is_valid());
    }

    #[test]
    fn alternatives_fall_back_to_the_other_leaf() {
        let schema = schema();
        let mut root = populated(&schema);
        root.set(&["pair", "hex"], "0a0b");
        assert!(!root.set(&["pair", "name"], "abcde"));
        assert!(root.is_valid());

        root.set(&["pair", "hex"], "");
        assert!(!root.child(&["pair"]).expect("pair").is_valid());
        assert!(!root.is_valid());
    }

    #[test]
    fn clear_is_idempotent() {
        let schema = schema();
        let mut once = populated(&schema);
        once.clear();
        let mut twice = once.clone();
        twice.clear();
        assert_eq!(once, twice);
        assert!(!once.is_valid());
        assert_eq!(once, Composite::root(&schema));
    }

    #[test]
    fn entry_round_trip_keeps_every_written_value() {
        let schema = schema();
        let root = populated(&schema);
        let mut entry = Entry::new();
        assert!(root.save_in(&mut entry));
        assert!(!entry.exists("k_hex"));

        let mut loaded = Composite::root(&schema);
        assert!(loaded.load_from(&entry));
        assert_eq!(loaded.written_values(), root.written_values());
    }

    #[test]
    fn save_of_invalid_instance_wipes_and_fails() {
        let schema = schema();
        let mut entry = Entry::new();
        entry.set("k_title", ProtectedString::plain("old"));
        entry.set("k_mode", ProtectedString::plain("manual"));
        entry.set("unrelated", ProtectedString::plain("kept"));

        let root = Composite::root(&schema);
        assert!(!root.save_in(&mut entry));
        assert_eq!(entry.keys(), vec!["unrelated".to_string()]);
    }

    #[test]
    fn load_with_missing_mandatory_leaves_instance_empty() {
        let schema = schema();
        let mut entry = Entry::new();
        entry.set("k_title", ProtectedString::plain("home"));
        entry.set("k_mode", ProtectedString::plain("auto"));

        let mut root = populated(&schema);
        assert!(!root.load_from(&entry));
        assert_eq!(root, Composite::root(&schema));
    }

    #[test]
    fn optional_nested_load_failure_is_tolerated() {
        let schema = schema();
        let mut entry = Entry::new();
        entry.set("k_title", ProtectedString::plain("home"));
        entry.set("k_name", ProtectedString::plain("ab"));
        entry.set("k_ttl", ProtectedString::plain("2"));

        let mut root = Composite::root(&schema);
        assert!(root.load_from(&entry));
        assert!(root.child(&["timers"]).is_none());
    }

    #[test]
    fn xml_round_trip_with_inherited_and_explicit_namespaces() {
        let schema = schema();
        let mut root = populated(&schema);
        root.set_value(&["extra"], Value::Bool(true));

        let document = root.to_document();
        assert_eq!(document.namespace.as_deref(), Some(NS));
        let extra = document.get_child("extra").expect("extra");
        assert_eq!(extra.namespace.as_deref(), Some(NS2));
        let ttl = document.get_child("timers").and_then(|t| t.get_child("ttl"));
        assert_eq!(ttl.and_then(|t| t.namespace.as_deref()), Some(NS));

        let mut parsed = Composite::root(&schema);
        assert!(parsed.read_document(&document));
        assert_eq!(parsed.written_values(), root.written_values());
    }

    #[test]
    fn unknown_elements_are_skipped() {
        let schema = schema();
        let with_extension = parse_str(
            r#"<root xmlns="urn:test:v1">
                 <title>home</title>
                 <vendor><blob>1</blob></vendor>
                 <pair><name>ab</name><colour>red</colour></pair>
               </root>"#,
        )
        .expect("xml");
        let plain = parse_str(
            r#"<root xmlns="urn:test:v1"><title>home</title><pair><name>ab</name></pair></root>"#,
        )
        .expect("xml");

        let mut a = Composite::root(&schema);
        let mut b = Composite::root(&schema);
        assert!(a.read_document(&with_extension));
        assert!(b.read_document(&plain));
        assert!(a.is_valid());
        assert_eq!(a, b);
    }

    #[test]
    fn element_in_wrong_namespace_does_not_match() {
        let schema = schema();
        let xml = parse_str(
            r#"<root xmlns="urn:test:v1"><title>home</title><pair><name>ab</name></pair><extra>true</extra></root>"#,
        )
        .expect("xml");
        let mut root = Composite::root(&schema);
        root.read_document(&xml);
        assert!(!root.leaf(&["extra"]).expect("extra").is_valid());
    }

    #[test]
    fn wrong_document_root_is_refused() {
        let schema = schema();
        let mut root = populated(&schema);
        assert!(!root.read_document(&XmlNode::new("root")));
        assert!(root.is_valid());
    }

    #[test]
    fn write_stops_at_invalid_mandatory_member() {
        // Should never occur through callers that check validity first.
        let schema = schema();
        let mut root = populated(&schema);
        root.set(&["pair", "hex"], "");
        root.set(&["pair", "name"], "");
        assert!(!root.is_valid());

        let document = root.to_document();
        let written: Vec<&str> = document.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(written, vec!["title"]);
    }

    #[test]
    fn absent_optional_node_is_not_written() {
        let schema = schema();
        let mut root = populated(&schema);
        assert!(root.to_document().get_child("timers").is_some());

        root.unset(&["timers"]);
        assert!(root.is_valid());
        let document = root.to_document();
        assert!(document.get_child("timers").is_none());
        assert!(document.get_child("pair").is_some());
    }

    #[test]
    fn optional_empty_leaves_are_pruned_on_write() {
        let schema = schema();
        let mut root = populated(&schema);
        root.set(&["timers", "note"], "");
        let document = root.to_document();
        let timers = document.get_child("timers").expect("timers");
        assert!(timers.get_child("note").is_none());
    }
}
