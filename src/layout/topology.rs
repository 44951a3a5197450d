use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::graph::{Adjacency, EdgeRecord, GraphSnapshot, NodeRecord};

/// Current page index per parent id. Parents without an entry are on page 0.
pub type SiblingPages = HashMap<String, usize>;

#[derive(Clone, Copy, Debug)]
pub struct TopologyParams<'a> {
    pub root_id: &'a str,
    pub max_depth: usize,
    pub page_size: usize,
    pub pages: &'a SiblingPages,
}

/// The visible subset of the graph. Rebuilt from scratch on every change to
/// root, depth limit, node/edge set or page index; never patched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Topology {
    pub root_id: String,
    /// Visible ids in BFS visiting order.
    pub visible: Vec<String>,
    pub visible_ids: HashSet<String>,
    pub depth_by_id: HashMap<String, usize>,
    pub children_by_parent: HashMap<String, Vec<String>>,
    pub parent_by_id: HashMap<String, String>,
    /// Edges with both endpoints visible, sorted by edge id.
    pub edges: Vec<EdgeRecord>,
    /// Number of candidate children per expanded parent, before paging.
    pub sibling_totals: HashMap<String, usize>,
}

impl Topology {
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.depth_by_id.get(id).copied()
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.children_by_parent
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.visible_ids.contains(id)
    }

    pub fn max_depth(&self) -> usize {
        self.depth_by_id.values().copied().max().unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.visible.len()
    }
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size).max(1)
}

/// Pulls each stored page back inside the range `totals` allows at
/// `page_size`. Parents that now fit on one page, or whose total is
/// unknown, drop their entry.
pub fn clamp_pages(pages: &mut SiblingPages, totals: &HashMap<String, usize>, page_size: usize) {
    pages.retain(|id, page| {
        let last = totals
            .get(id)
            .map_or(0, |total| page_count(*total, page_size).saturating_sub(1));
        *page = (*page).min(last);
        *page > 0
    });
}

/// Neighbors a node may expand into: every adjacent node (or the explicit
/// child list when the node has no edges yet), minus itself and the node it
/// was reached from, sorted by label.
fn candidate_children<'a>(
    graph: &'a GraphSnapshot,
    adjacency: &'a Adjacency,
    node: &'a NodeRecord,
    parent: Option<&str>,
) -> Vec<&'a NodeRecord> {
    let raw: Vec<&str> = if adjacency.has_entry(&node.id) {
        adjacency.neighbors(&node.id).iter().map(String::as_str).collect()
    } else {
        node.children.iter().map(String::as_str).collect()
    };

    let mut seen = HashSet::new();
    let mut candidates = raw
        .into_iter()
        .filter(|id| *id != node.id && Some(*id) != parent)
        .filter(|id| seen.insert(*id))
        .filter_map(|id| graph.nodes.get(id))
        .collect::<Vec<_>>();

    candidates.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
    candidates
}

pub fn build_topology(
    graph: &GraphSnapshot,
    adjacency: &Adjacency,
    params: TopologyParams<'_>,
) -> Option<Topology> {
    if !graph.nodes.contains_key(params.root_id) {
        debug!(root = params.root_id, "root not loaded; skipping topology");
        return None;
    }

    let mut topology = Topology {
        root_id: params.root_id.to_owned(),
        ..Topology::default()
    };

    let mut queue: VecDeque<(&str, usize, Option<&str>)> =
        VecDeque::from([(params.root_id, 0, None)]);

    while let Some((id, depth, parent)) = queue.pop_front() {
        if topology.visible_ids.contains(id) {
            continue;
        }
        let Some(node) = graph.nodes.get(id) else {
            continue;
        };

        topology.visible_ids.insert(id.to_owned());
        topology.visible.push(id.to_owned());
        topology.depth_by_id.insert(id.to_owned(), depth);
        if let Some(parent) = parent {
            topology
                .children_by_parent
                .entry(parent.to_owned())
                .or_default()
                .push(id.to_owned());
            topology
                .parent_by_id
                .insert(id.to_owned(), parent.to_owned());
        }

        if !node.expanded || depth >= params.max_depth {
            continue;
        }

        let candidates = candidate_children(graph, adjacency, node, parent);
        topology
            .sibling_totals
            .insert(id.to_owned(), candidates.len());

        let last_page = page_count(candidates.len(), params.page_size).saturating_sub(1);
        let page = params.pages.get(id).copied().unwrap_or(0).min(last_page);
        let start = page.saturating_mul(params.page_size);
        for child in candidates.iter().skip(start).take(params.page_size) {
            if !topology.visible_ids.contains(&child.id) {
                queue.push_back((child.id.as_str(), depth + 1, Some(id)));
            }
        }
    }

    let mut edges = graph
        .edges
        .values()
        .filter(|edge| {
            topology.visible_ids.contains(&edge.source)
                && topology.visible_ids.contains(&edge.target)
        })
        .cloned()
        .collect::<Vec<_>>();
    edges.sort_by(|a, b| a.id.cmp(&b.id));
    topology.edges = edges;

    debug!(
        root = params.root_id,
        nodes = topology.visible.len(),
        edges = topology.edges.len(),
        "built topology"
    );

    Some(topology)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_graph() -> GraphSnapshot {
        let mut graph = GraphSnapshot::default();
        for id in ["a", "b", "c", "d"] {
            graph.insert_node(NodeRecord::new(id, id.to_uppercase()));
        }
        graph.insert_edge(EdgeRecord::new("ab", "a", "b"));
        graph.insert_edge(EdgeRecord::new("bc", "b", "c"));
        graph.insert_edge(EdgeRecord::new("cd", "c", "d"));
        graph
    }

    fn build(
        graph: &GraphSnapshot,
        root: &str,
        max_depth: usize,
        page_size: usize,
    ) -> Option<Topology> {
        let adjacency = Adjacency::from_graph(graph);
        let pages = SiblingPages::new();
        build_topology(
            graph,
            &adjacency,
            TopologyParams {
                root_id: root,
                max_depth,
                page_size,
                pages: &pages,
            },
        )
    }

    #[test]
    fn missing_root_yields_none() {
        assert!(build(&chain_graph(), "zzz", 3, 20).is_none());
    }

    #[test]
    fn depth_limit_stops_expansion() {
        let topology = build(&chain_graph(), "a", 2, 20).unwrap();
        assert_eq!(topology.visible, ["a", "b", "c"]);
        assert_eq!(topology.depth_of("c"), Some(2));
        assert!(!topology.contains("d"));
        assert_eq!(
            topology.edges.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            ["ab", "bc"]
        );
    }

    #[test]
    fn collapsed_node_keeps_children_hidden() {
        let mut graph = chain_graph();
        graph.nodes.get_mut("b").unwrap().expanded = false;
        let topology = build(&graph, "a", 5, 20).unwrap();
        assert_eq!(topology.visible, ["a", "b"]);
        assert!(topology.children_of("b").is_empty());
    }

    #[test]
    fn child_list_is_used_without_edges() {
        let mut graph = GraphSnapshot::default();
        let mut root = NodeRecord::new("root", "root");
        root.children = vec!["x".into(), "x".into(), "missing".into(), "y".into()];
        graph.insert_node(root);
        graph.insert_node(NodeRecord::new("x", "x"));
        graph.insert_node(NodeRecord::new("y", "y"));

        let topology = build(&graph, "root", 2, 20).unwrap();
        assert_eq!(topology.children_of("root"), ["x", "y"]);
        assert_eq!(topology.sibling_totals.get("root"), Some(&2));
    }

    #[test]
    fn out_of_page_neighbors_stay_unreachable() {
        let mut graph = GraphSnapshot::default();
        graph.insert_node(NodeRecord::new("root", "root"));
        for index in 0..5 {
            let id = format!("n{index}");
            graph.insert_node(NodeRecord::new(&id, &id));
            graph.insert_edge(EdgeRecord::new(format!("e{index}"), "root", &id));
        }
        let adjacency = Adjacency::from_graph(&graph);
        let pages = SiblingPages::from([("root".to_owned(), 1)]);
        let topology = build_topology(
            &graph,
            &adjacency,
            TopologyParams {
                root_id: "root",
                max_depth: 1,
                page_size: 2,
                pages: &pages,
            },
        )
        .unwrap();

        assert_eq!(topology.children_of("root"), ["n2", "n3"]);
        assert!(topology.depth_of("n0").is_none());
        assert_eq!(page_count(5, 2), 3);
    }

    fn fan(children: usize) -> GraphSnapshot {
        let mut graph = GraphSnapshot::default();
        graph.insert_node(NodeRecord::new("root", "root"));
        for index in 0..children {
            let id = format!("n{index:02}");
            graph.insert_node(NodeRecord::new(&id, &id));
            graph.insert_edge(EdgeRecord::new(format!("e{index:02}"), "root", &id));
        }
        graph
    }

    #[test]
    fn page_past_the_end_shows_the_last_page() {
        let graph = fan(30);
        let adjacency = Adjacency::from_graph(&graph);
        let pages = SiblingPages::from([("root".to_owned(), 1)]);
        let topology = build_topology(
            &graph,
            &adjacency,
            TopologyParams {
                root_id: "root",
                max_depth: 1,
                page_size: 40,
                pages: &pages,
            },
        )
        .unwrap();

        assert_eq!(topology.children_of("root").len(), 30);
    }

    #[test]
    fn growing_the_page_size_pulls_pages_back() {
        let totals = HashMap::from([("root".to_owned(), 30), ("wide".to_owned(), 100)]);
        let mut pages = SiblingPages::from([
            ("root".to_owned(), 1),
            ("wide".to_owned(), 4),
            ("gone".to_owned(), 2),
        ]);

        clamp_pages(&mut pages, &totals, 40);
        assert_eq!(pages, SiblingPages::from([("wide".to_owned(), 2)]));

        let graph = fan(30);
        let adjacency = Adjacency::from_graph(&graph);
        let topology = build_topology(
            &graph,
            &adjacency,
            TopologyParams {
                root_id: "root",
                max_depth: 1,
                page_size: 40,
                pages: &pages,
            },
        )
        .unwrap();
        assert_eq!(topology.children_of("root").len(), 30);
    }

    #[test]
    fn first_visit_wins_depth() {
        let mut graph = chain_graph();
        graph.insert_edge(EdgeRecord::new("ad", "a", "d"));
        let topology = build(&graph, "a", 5, 20).unwrap();
        assert_eq!(topology.depth_of("d"), Some(1));
        assert_eq!(topology.depth_of("c"), Some(2));
        assert_eq!(topology.parent_by_id.get("c").map(String::as_str), Some("b"));
    }
}
