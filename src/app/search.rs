use std::collections::HashSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use hierarchy_force::{Hierarchy, NodeData, NodeId, NodeKey};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

pub(super) fn matching_ids<T: NodeData>(
    tree: &Hierarchy<T>,
    visible: &[NodeKey],
    query: &str,
) -> HashSet<NodeId> {
    let query = query.trim();
    if query.is_empty() {
        return HashSet::new();
    }

    let matcher = SkimMatcherV2::default();
    visible
        .iter()
        .map(|&key| tree.node(key))
        .filter(|node| fuzzy_match_score(&matcher, node.data().name(), query).is_some())
        .filter_map(|node| node.id())
        .collect()
}
