//! Path tree: one node per URL segment, constants and path parameters as
//! children, operations hanging off the nodes that terminate a path.

use crate::config::GeneratorConfig;
use crate::examples::{add_example, bounded_text};
use crate::merge::{merge_parameter, merge_path_items};
use crate::openapi::{Method, Parameter, ParameterLocation, PathItem};
use log::debug;
use oasgen_classify::is_gibberish;
use serde_json::Value;
use std::collections::BTreeMap;

const SYNTHETIC_PARAM_PREFIX: char = 'p';

/// Name given to the `position`-th parameter along a path (1-based).
pub fn synthetic_name(position: usize) -> String {
    format!("{SYNTHETIC_PARAM_PREFIX}{position}")
}

fn is_synthetic_name(name: &str) -> bool {
    name.strip_prefix(SYNTHETIC_PARAM_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// `{name}` segments declare a parameter explicitly.
fn param_literal(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')?
        .strip_suffix('}')
        .filter(|name| !name.is_empty())
}

/// Segments of a path without leading and trailing empties; `/` has none.
pub fn split_path(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    segments
}

#[derive(Debug, Clone)]
enum Segment {
    Constant(String),
    Param(Parameter),
}

#[derive(Debug, Clone)]
struct Node {
    segment: Segment,
    item: Option<PathItem>,
    children: Vec<Node>,
}

impl Node {
    fn constant(label: impl Into<String>) -> Self {
        Self {
            segment: Segment::Constant(label.into()),
            item: None,
            children: Vec::new(),
        }
    }

    fn param(mut param: Parameter) -> Self {
        param.location = ParameterLocation::Path;
        param.required = true;
        Self {
            segment: Segment::Param(param),
            item: None,
            children: Vec::new(),
        }
    }

    fn is_param(&self) -> bool {
        matches!(self.segment, Segment::Param(_))
    }

    fn constant_child(&self, label: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|child| matches!(&child.segment, Segment::Constant(l) if l == label))
    }

    fn param_child(&self) -> Option<usize> {
        self.children.iter().position(Node::is_param)
    }

    fn push(&mut self, child: Node) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    /// Exact constant first, then any parameter child, then a new node.
    fn child_for_insert(
        &mut self,
        segment: &str,
        declared: &[Parameter],
        params_above: usize,
    ) -> usize {
        if let Some(name) = param_literal(segment) {
            if let Some(index) = self.param_child() {
                return index;
            }
            let param = declared
                .iter()
                .find(|p| p.matches(ParameterLocation::Path, name))
                .cloned()
                .unwrap_or_else(|| Parameter::path(name));
            return self.push(Node::param(param));
        }

        if let Some(index) = self
            .constant_child(segment)
            .or_else(|| self.param_child())
        {
            return index;
        }

        if is_gibberish(segment) {
            self.push(Node::param(Parameter::path(synthetic_name(params_above + 1))))
        } else {
            self.push(Node::constant(segment))
        }
    }

    fn child_for_lookup(&self, segment: &str) -> Option<usize> {
        match param_literal(segment) {
            Some(_) => self.param_child(),
            None => self
                .constant_child(segment)
                .or_else(|| self.param_child()),
        }
    }

    /// Compaction key: method set plus child shapes, labels ignored.
    fn shape(&self) -> String {
        let methods: Vec<&str> = self
            .item
            .iter()
            .flat_map(PathItem::methods)
            .map(Method::as_str)
            .collect();
        let mut children: Vec<String> = self.children.iter().map(Node::shape).collect();
        children.sort();
        format!("[{}]({})", methods.join(","), children.join(";"))
    }

    fn into_param(self, config: &GeneratorConfig) -> Node {
        match self.segment {
            Segment::Param(_) => self,
            Segment::Constant(label) => {
                let mut param = Parameter::path(synthetic_name(0));
                add_example(
                    &mut param.examples,
                    Value::String(bounded_text(&label, config.max_example_len)),
                    None,
                    config.max_examples,
                );
                Node {
                    segment: Segment::Param(param),
                    item: self.item,
                    children: self.children,
                }
            }
        }
    }

    /// Folds `other` (same position in the tree) into `self`.
    fn absorb(&mut self, other: Node, config: &GeneratorConfig) {
        match (&mut self.segment, other.segment) {
            (Segment::Param(mine), Segment::Param(theirs)) => {
                merge_parameter(mine, theirs, config.max_examples);
            }
            (Segment::Param(mine), Segment::Constant(label)) => {
                add_example(
                    &mut mine.examples,
                    Value::String(bounded_text(&label, config.max_example_len)),
                    None,
                    config.max_examples,
                );
            }
            (Segment::Constant(_), _) => {}
        }

        if let Some(theirs) = other.item {
            match self.item {
                Some(ref mut mine) => merge_path_items(mine, theirs, config.max_examples),
                None => self.item = Some(theirs),
            }
        }

        for child in other.children {
            let target = match &child.segment {
                Segment::Param(_) => self.param_child(),
                Segment::Constant(label) => self.constant_child(label),
            };
            match target {
                Some(index) => self.children[index].absorb(child, config),
                None => self.children.push(child),
            }
        }
    }

    fn renumber(&mut self, params_above: usize) {
        let mut depth = params_above;
        if let Segment::Param(param) = &mut self.segment {
            depth += 1;
            if is_synthetic_name(&param.name) {
                param.name = synthetic_name(depth);
            }
        }
        for child in &mut self.children {
            child.renumber(depth);
        }
    }

    fn sort_key(&self) -> (bool, &str) {
        match &self.segment {
            Segment::Constant(label) => (false, label),
            Segment::Param(param) => (true, &param.name),
        }
    }

    fn collect_paths(
        &self,
        path: &str,
        params: &mut Vec<Parameter>,
        out: &mut Vec<(String, PathItem)>,
    ) {
        if let Some(item) = self.item.as_ref().filter(|item| item.has_operations()) {
            let mut item = item.clone();
            item.parameters
                .retain(|p| p.location != ParameterLocation::Path);
            item.parameters.splice(0..0, params.iter().cloned());
            let path = if path.is_empty() { "/" } else { path };
            out.push((path.to_string(), item));
        }

        let mut ordered: Vec<&Node> = self.children.iter().collect();
        ordered.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        for child in ordered {
            let label = match &child.segment {
                Segment::Constant(label) => label.clone(),
                Segment::Param(param) => {
                    params.push(param.clone());
                    format!("{{{}}}", param.name)
                }
            };
            child.collect_paths(&format!("{path}/{label}"), params, out);
            if child.is_param() {
                params.pop();
            }
        }
    }

    fn visit_items_mut(&mut self, f: &mut impl FnMut(&mut PathItem)) {
        if let Some(item) = self.item.as_mut() {
            f(item);
        }
        for child in &mut self.children {
            child.visit_items_mut(f);
        }
    }
}

/// Bottom-up: children first, then groups of constant siblings sharing a
/// shape fold into this node's parameter child.
fn compact_node(node: &mut Node, config: &GeneratorConfig) -> usize {
    let mut merged: usize = node
        .children
        .iter_mut()
        .map(|child| compact_node(child, config))
        .sum();

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, child) in node.children.iter().enumerate() {
        if !child.is_param() {
            groups.entry(child.shape()).or_default().push(index);
        }
    }
    let groups: Vec<Vec<usize>> = groups
        .into_values()
        .filter(|group| group.len() >= config.compaction_min_siblings)
        .collect();
    if groups.is_empty() {
        return merged;
    }

    let mut slots: Vec<Option<Node>> = std::mem::take(&mut node.children)
        .into_iter()
        .map(Some)
        .collect();
    let mut folded = Vec::with_capacity(groups.len());

    for group in groups {
        let mut members = group.into_iter().filter_map(|index| slots[index].take());
        let Some(first) = members.next() else {
            continue;
        };
        let mut param_node = first.into_param(config);
        for member in members {
            param_node.absorb(member.into_param(config), config);
            merged += 1;
        }
        folded.push(param_node);
    }

    node.children = slots.into_iter().flatten().collect();
    for param_node in folded {
        match node.param_child() {
            Some(index) => node.children[index].absorb(param_node, config),
            None => node.children.push(param_node),
        }
        merged += 1;
    }

    debug!("Compacted {merged} path nodes");
    merged
}

#[derive(Debug, Clone)]
pub struct PathTree {
    root: Node,
    config: GeneratorConfig,
}

impl PathTree {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            root: Node::constant(""),
            config,
        }
    }

    /// Walks (creating as needed) the nodes for `path` and returns its
    /// path item. Concrete values of parameter segments become examples.
    pub fn insert(
        &mut self,
        path: &str,
        declared: &[Parameter],
        sample_id: Option<&str>,
    ) -> &mut PathItem {
        let config = self.config;
        let mut node = &mut self.root;
        let mut params_above = 0;

        for segment in split_path(path) {
            let index = node.child_for_insert(segment, declared, params_above);
            let current = node;
            node = &mut current.children[index];

            if let Segment::Param(param) = &mut node.segment {
                params_above += 1;
                if param_literal(segment).is_none() {
                    add_example(
                        &mut param.examples,
                        Value::String(bounded_text(segment, config.max_example_len)),
                        sample_id,
                        config.max_examples,
                    );
                }
            }
        }

        node.item.get_or_insert_with(PathItem::default)
    }

    /// Like [`PathTree::insert`] but never creates nodes.
    pub fn find_mut(&mut self, path: &str) -> Option<&mut PathItem> {
        let mut node = &mut self.root;
        for segment in split_path(path) {
            let index = node.child_for_lookup(segment)?;
            let current = node;
            node = &mut current.children[index];
        }
        node.item.as_mut()
    }

    /// Runs compaction to a fixed point and renumbers synthetic parameter
    /// names by position. Returns the number of folded nodes.
    pub fn compact(&mut self) -> usize {
        let mut total = 0;
        loop {
            let merged = compact_node(&mut self.root, &self.config);
            if merged == 0 {
                break;
            }
            total += merged;
        }
        self.root.renumber(0);
        total
    }

    /// Every path with at least one operation, constants before
    /// parameters at each level. Path parameters are attached to the item.
    pub fn list_paths(&self) -> Vec<(String, PathItem)> {
        let mut out = Vec::new();
        let mut params = Vec::new();
        self.root.collect_paths("", &mut params, &mut out);
        out
    }

    pub fn visit_items_mut(&mut self, mut f: impl FnMut(&mut PathItem)) {
        self.root.visit_items_mut(&mut f);
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty() && self.root.item.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::Operation;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tree() -> PathTree {
        PathTree::new(GeneratorConfig::default())
    }

    fn add_op(tree: &mut PathTree, path: &str, method: Method) {
        let item = tree.insert(path, &[], Some("s"));
        if item.operation(method).is_none() {
            *item.slot_mut(method) = Some(Operation::new(format!("{method} {path}")));
        }
    }

    fn listed(tree: &PathTree) -> Vec<String> {
        tree.list_paths().into_iter().map(|(path, _)| path).collect()
    }

    #[test]
    fn split_path_drops_outer_empties() {
        assert!(split_path("/").is_empty());
        assert!(split_path("").is_empty());
        assert_eq!(split_path("/a/b/"), vec!["a", "b"]);
        assert_eq!(split_path("/a//b"), vec!["a", "", "b"]);
    }

    #[test]
    fn gibberish_segments_become_parameters() {
        let mut tree = tree();
        add_op(&mut tree, "/v1/users/42", Method::Get);
        add_op(&mut tree, "/v1/users/550e8400-e29b-41d4-a716-446655440000", Method::Get);

        assert_eq!(listed(&tree), vec!["/v1/users/42", "/v1/users/{p1}"]);
    }

    #[test]
    fn param_child_acts_as_wildcard() {
        let mut tree = tree();
        add_op(&mut tree, "/orders/1554507871/items", Method::Get);
        add_op(&mut tree, "/orders/latest/items", Method::Get);

        assert_eq!(listed(&tree), vec!["/orders/{p1}/items"]);
        let (_, item) = &tree.list_paths()[0];
        assert_eq!(item.parameters.len(), 1);
        let examples: Vec<_> = item.parameters[0]
            .examples
            .values()
            .map(|e| e.value.clone())
            .collect();
        assert_eq!(examples, vec![json!("1554507871"), json!("latest")]);
    }

    #[test]
    fn root_path_is_listed() {
        let mut tree = tree();
        add_op(&mut tree, "/", Method::Get);
        assert_eq!(listed(&tree), vec!["/"]);
    }

    #[test]
    fn declared_parameters_keep_their_names() {
        let mut tree = tree();
        let declared = vec![Parameter::path("userId")];
        let item = tree.insert("/users/{userId}", &declared, None);
        *item.slot_mut(Method::Get) = Some(Operation::new("x"));
        tree.compact();

        assert_eq!(listed(&tree), vec!["/users/{userId}"]);
    }

    #[test]
    fn find_does_not_create_nodes() {
        let mut tree = tree();
        assert!(tree.find_mut("/unknown").is_none());
        assert!(tree.is_empty());

        add_op(&mut tree, "/users/1554507871", Method::Get);
        assert!(tree.find_mut("/users/777").is_some());
    }

    #[test]
    fn compaction_needs_enough_identical_siblings() {
        let mut tree = tree();
        for name in ["alpha", "beta", "gamma"] {
            add_op(&mut tree, &format!("/things/{name}"), Method::Get);
        }
        assert_eq!(tree.compact(), 0);
        assert_eq!(listed(&tree).len(), 3);
    }

    #[test]
    fn compaction_folds_siblings_and_keeps_history() {
        let mut tree = PathTree::new(GeneratorConfig {
            compaction_min_siblings: 3,
            ..GeneratorConfig::default()
        });
        for name in ["alpha", "beta", "gamma"] {
            add_op(&mut tree, &format!("/things/{name}"), Method::Get);
        }
        add_op(&mut tree, "/things/delta", Method::Post);

        assert!(tree.compact() > 0);
        assert_eq!(listed(&tree), vec!["/things/delta", "/things/{p1}"]);

        let paths = tree.list_paths();
        let op = paths[1].1.operation(Method::Get).unwrap();
        assert_eq!(op.historical_ids.len(), 2);
        assert_eq!(tree.compact(), 0);
    }

    #[test]
    fn compaction_merges_into_existing_parameter() {
        let mut tree = PathTree::new(GeneratorConfig {
            compaction_min_siblings: 2,
            ..GeneratorConfig::default()
        });
        add_op(&mut tree, "/a/1554507871/x", Method::Get);
        add_op(&mut tree, "/b/one/x", Method::Get);
        add_op(&mut tree, "/b/two/x", Method::Get);

        tree.compact();
        // `/a` and `/b` share a shape once their children fold, so they fold too.
        assert_eq!(listed(&tree), vec!["/{p1}/{p2}/x"]);
    }

    #[test]
    fn synthetic_names_follow_position() {
        assert!(is_synthetic_name("p12"));
        assert!(!is_synthetic_name("p"));
        assert!(!is_synthetic_name("page"));
        assert_eq!(synthetic_name(3), "p3");
    }
}
