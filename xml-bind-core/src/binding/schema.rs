//! Declarative registry of composite definitions.
//!
//! A [`Schema`] is a flat list of [`NodeDef`]s. Nested composites refer to
//! each other by [`NodeId`], so traversal is plain iteration over declared
//! members and never needs runtime type inspection.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::binding::scalar::LeafDef;
use crate::binding::value::{FieldKind, Protection, Rule};
use crate::entry::EntryStore;

/// Index of a composite definition inside its [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Existence predicate overriding the representative-key check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Present if any of the keys exists.
    AnyKey(&'static [&'static str]),
    /// Present if all of the keys exist.
    AllKeys(&'static [&'static str]),
}

impl Presence {
    pub fn holds(&self, store: &dyn EntryStore) -> bool {
        match self {
            Presence::AnyKey(keys) => keys.iter().any(|key| store.exists(key)),
            Presence::AllKeys(keys) => keys.iter().all(|key| store.exists(key)),
        }
    }
}

/// A member of a composite as resolved in a built schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Element name; also the member's name for path lookups.
    pub name: &'static str,
    /// Element namespace; `None` inherits the parent element's namespace.
    pub namespace: Option<&'static str>,
    pub mandatory: bool,
    pub kind: MemberKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Leaf(LeafDef),
    Node {
        id: NodeId,
        /// Representative key used when the target declares no [`Presence`].
        entry_key: Option<&'static str>,
    },
}

/// A composite definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDef {
    pub name: &'static str,
    pub presence: Option<Presence>,
    /// Members of which at least one must be valid, on top of the mandatory ones.
    pub require_any: Vec<usize>,
    pub members: Vec<Member>,
}

impl NodeDef {
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|member| member.name == name)
    }
}

/// Root element identity of documents described by a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRoot {
    pub tag: &'static str,
    pub namespace: Option<&'static str>,
}

/// A validated set of composite definitions with a designated root.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<NodeDef>,
    root: NodeId,
    document: DocumentRoot,
}

impl Schema {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document(&self) -> DocumentRoot {
        self.document
    }

    pub fn node(&self, id: NodeId) -> &NodeDef {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[NodeDef] {
        &self.nodes
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the composite embedded through `member` has data in `store`.
    pub fn member_exists_in(&self, member: &Member, store: &dyn EntryStore) -> bool {
        match &member.kind {
            MemberKind::Leaf(leaf) => store.exists(leaf.entry_key),
            MemberKind::Node { id, entry_key } => match self.node(*id).presence {
                Some(presence) => presence.holds(store),
                None => entry_key.is_some_and(|key| store.exists(key)),
            },
        }
    }

    /// Every entry key written by the subtree rooted at `id`.
    pub fn keys_of(&self, id: NodeId) -> BTreeSet<&'static str> {
        let mut keys = BTreeSet::new();
        self.collect_keys(id, &mut keys);
        keys
    }

    fn collect_keys(&self, id: NodeId, keys: &mut BTreeSet<&'static str>) {
        for member in &self.node(id).members {
            match &member.kind {
                MemberKind::Leaf(leaf) => {
                    keys.insert(leaf.entry_key);
                }
                MemberKind::Node { id, .. } => self.collect_keys(*id, keys),
            }
        }
    }
}

/// Inconsistencies detected while building a [`Schema`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("composite '{0}' is declared twice")]
    DuplicateNode(&'static str),
    #[error("composite '{node}' declares member '{member}' twice")]
    DuplicateMember {
        node: &'static str,
        member: &'static str,
    },
    #[error("member '{member}' of '{node}' refers to undeclared composite '{target}'")]
    UnknownTarget {
        node: &'static str,
        member: &'static str,
        target: &'static str,
    },
    #[error("composite '{node}' requires unknown member '{member}'")]
    UnknownMember {
        node: &'static str,
        member: &'static str,
    },
    #[error("member '{member}' of '{node}' has no way to detect its presence")]
    MissingPresence {
        node: &'static str,
        member: &'static str,
    },
    #[error("root composite '{0}' is not declared")]
    UnknownRoot(&'static str),
    #[error("composite '{0}' contains itself")]
    Cycle(&'static str),
}

#[derive(Debug, Clone)]
enum Target {
    Leaf(LeafDef),
    Node {
        node: &'static str,
        entry_key: Option<&'static str>,
    },
}

/// Declaration of one member for [`NodeSpec::field`].
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    namespace: Option<&'static str>,
    mandatory: bool,
    target: Target,
}

impl Field {
    fn leaf(name: &'static str, entry_key: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            namespace: None,
            mandatory: false,
            target: Target::Leaf(LeafDef {
                entry_key,
                kind,
                rule: Rule::Any,
                protection: Protection::Inherit,
            }),
        }
    }

    pub fn text(name: &'static str, entry_key: &'static str) -> Self {
        Self::leaf(name, entry_key, FieldKind::Text)
    }

    pub fn boolean(name: &'static str, entry_key: &'static str) -> Self {
        Self::leaf(name, entry_key, FieldKind::Bool)
    }

    pub fn int(name: &'static str, entry_key: &'static str) -> Self {
        Self::leaf(name, entry_key, FieldKind::Int)
    }

    /// Text restricted to an enumerated set.
    pub fn choice(
        name: &'static str,
        entry_key: &'static str,
        allowed: &'static [&'static str],
    ) -> Self {
        Self::text(name, entry_key).rule(Rule::OneOf(allowed))
    }

    /// Nested composite. Its presence in an entry is detected by the target's
    /// [`Presence`] or, failing that, by [`Field::exists_by`].
    pub fn node(name: &'static str, node: &'static str) -> Self {
        Self {
            name,
            namespace: None,
            mandatory: false,
            target: Target::Node {
                node,
                entry_key: None,
            },
        }
    }

    pub fn exists_by(mut self, key: &'static str) -> Self {
        if let Target::Node { entry_key, .. } = &mut self.target {
            *entry_key = Some(key);
        }
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn ns(mut self, namespace: &'static str) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        if let Target::Leaf(leaf) = &mut self.target {
            leaf.rule = rule;
        }
        self
    }

    pub fn range(self, min: i32, max: i32) -> Self {
        self.rule(Rule::Range { min, max })
    }

    pub fn length(self, min: usize, max: usize) -> Self {
        self.rule(Rule::Length { min, max })
    }

    pub fn unprotected(mut self) -> Self {
        if let Target::Leaf(leaf) = &mut self.target {
            leaf.protection = Protection::Never;
        }
        self
    }
}

/// Declaration of one composite for [`SchemaBuilder::node`].
#[derive(Debug, Clone)]
pub struct NodeSpec {
    name: &'static str,
    presence: Option<Presence>,
    require_any: Vec<&'static str>,
    fields: Vec<Field>,
}

impl NodeSpec {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            presence: None,
            require_any: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn present_if(mut self, presence: Presence) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn valid_if_any(mut self, members: &[&'static str]) -> Self {
        self.require_any.extend_from_slice(members);
        self
    }
}

/// Collects [`NodeSpec`]s and resolves them into a [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    root: &'static str,
    document: DocumentRoot,
    specs: Vec<NodeSpec>,
}

impl SchemaBuilder {
    /// Start a schema whose documents have the given root element.
    pub fn new(root: &'static str, tag: &'static str, namespace: Option<&'static str>) -> Self {
        Self {
            root,
            document: DocumentRoot { tag, namespace },
            specs: Vec::new(),
        }
    }

    pub fn node(mut self, spec: NodeSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut ids = BTreeMap::new();
        for (index, spec) in self.specs.iter().enumerate() {
            if ids.insert(spec.name, NodeId(index)).is_some() {
                return Err(SchemaError::DuplicateNode(spec.name));
            }
        }
        let root = *ids
            .get(self.root)
            .ok_or(SchemaError::UnknownRoot(self.root))?;

        let mut nodes = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            nodes.push(resolve_spec(spec, &ids, &self.specs)?);
        }

        let schema = Schema {
            nodes,
            root,
            document: self.document,
        };
        check_acyclic(&schema)?;
        Ok(schema)
    }
}

fn resolve_spec(
    spec: &NodeSpec,
    ids: &BTreeMap<&'static str, NodeId>,
    specs: &[NodeSpec],
) -> Result<NodeDef, SchemaError> {
    let mut members: Vec<Member> = Vec::with_capacity(spec.fields.len());
    for field in &spec.fields {
        if members.iter().any(|m| m.name == field.name) {
            return Err(SchemaError::DuplicateMember {
                node: spec.name,
                member: field.name,
            });
        }

        let kind = match &field.target {
            Target::Leaf(leaf) => MemberKind::Leaf(*leaf),
            Target::Node { node, entry_key } => {
                let id = *ids.get(node).ok_or(SchemaError::UnknownTarget {
                    node: spec.name,
                    member: field.name,
                    target: *node,
                })?;
                if entry_key.is_none() && specs[id.0].presence.is_none() {
                    return Err(SchemaError::MissingPresence {
                        node: spec.name,
                        member: field.name,
                    });
                }
                MemberKind::Node {
                    id,
                    entry_key: *entry_key,
                }
            }
        };

        members.push(Member {
            name: field.name,
            namespace: field.namespace,
            mandatory: field.mandatory,
            kind,
        });
    }

    let mut require_any = Vec::with_capacity(spec.require_any.len());
    for name in &spec.require_any {
        let index = members
            .iter()
            .position(|m| m.name == *name)
            .ok_or(SchemaError::UnknownMember {
                node: spec.name,
                member: *name,
            })?;
        require_any.push(index);
    }

    Ok(NodeDef {
        name: spec.name,
        presence: spec.presence,
        require_any,
        members,
    })
}

fn check_acyclic(schema: &Schema) -> Result<(), SchemaError> {
    fn visit(schema: &Schema, id: NodeId, path: &mut Vec<NodeId>) -> Result<(), SchemaError> {
        if path.contains(&id) {
            return Err(SchemaError::Cycle(schema.node(id).name));
        }
        path.push(id);
        for member in &schema.node(id).members {
            if let MemberKind::Node { id: child, .. } = member.kind {
                visit(schema, child, path)?;
            }
        }
        path.pop();
        Ok(())
    }

    for index in 0..schema.nodes.len() {
        visit(schema, NodeId(index), &mut Vec::new())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Field, NodeSpec, Presence, SchemaBuilder, SchemaError};
    use crate::entry::{Entry, EntryStore, ProtectedString};

    fn pair() -> NodeSpec {
        NodeSpec::new("Pair")
            .field(Field::text("hex", "k_hex"))
            .field(Field::text("name", "k_name"))
            .present_if(Presence::AnyKey(&["k_hex", "k_name"]))
            .valid_if_any(&["hex", "name"])
    }

    #[test]
    fn builds_and_resolves_nested_references() {
        let schema = SchemaBuilder::new("Root", "root", None)
            .node(
                NodeSpec::new("Root")
                    .field(Field::text("title", "k_title").mandatory())
                    .field(Field::node("pair", "Pair").mandatory()),
            )
            .node(pair())
            .build()
            .expect("schema");

        assert_eq!(schema.len(), 2);
        let keys = schema.keys_of(schema.root());
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["k_hex", "k_name", "k_title"]);
        let pair = schema.find("Pair").expect("pair");
        assert_eq!(schema.node(pair).require_any, vec![0, 1]);
    }

    #[test]
    fn unknown_target_is_reported() {
        let err = SchemaBuilder::new("Root", "root", None)
            .node(NodeSpec::new("Root").field(Field::node("x", "Missing").exists_by("k")))
            .build()
            .expect_err("missing target");
        assert_eq!(
            err,
            SchemaError::UnknownTarget {
                node: "Root",
                member: "x",
                target: "Missing"
            }
        );
    }

    #[test]
    fn member_names_must_be_unique_across_namespaces() {
        let err = SchemaBuilder::new("Root", "root", None)
            .node(
                NodeSpec::new("Root")
                    .field(Field::text("flag", "k_one"))
                    .field(Field::text("flag", "k_two").ns("urn:other")),
            )
            .build()
            .expect_err("duplicate");
        assert_eq!(
            err,
            SchemaError::DuplicateMember {
                node: "Root",
                member: "flag"
            }
        );
    }

    #[test]
    fn nested_node_needs_presence_or_key() {
        let err = SchemaBuilder::new("Root", "root", None)
            .node(NodeSpec::new("Root").field(Field::node("leaf", "Leafy")))
            .node(NodeSpec::new("Leafy").field(Field::boolean("on", "k_on")))
            .build()
            .expect_err("no presence");
        assert!(matches!(err, SchemaError::MissingPresence { .. }));
    }

    #[test]
    fn cycles_are_rejected() {
        let err = SchemaBuilder::new("A", "a", None)
            .node(NodeSpec::new("A").field(Field::node("b", "B").exists_by("k")))
            .node(NodeSpec::new("B").field(Field::node("a", "A").exists_by("k")))
            .build()
            .expect_err("cycle");
        assert!(matches!(err, SchemaError::Cycle(_)));
    }

    #[test]
    fn presence_override_beats_representative_key() {
        let schema = SchemaBuilder::new("Root", "root", None)
            .node(NodeSpec::new("Root").field(Field::node("pair", "Pair").exists_by("unused")))
            .node(pair())
            .build()
            .expect("schema");
        let member = &schema.node(schema.root()).members[0];

        let mut entry = Entry::new();
        entry.set("unused", ProtectedString::plain("x"));
        assert!(!schema.member_exists_in(member, &entry));
        entry.set("k_name", ProtectedString::plain("x"));
        assert!(schema.member_exists_in(member, &entry));
    }
}
