use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::{AdjacencyEntry, ImportIndexes, RawGraph, RawNode};

#[derive(Clone, Debug, PartialEq)]
pub struct ModuleMatch<'a> {
    pub uid: &'a str,
    pub node: &'a RawNode,
    pub score: i64,
}

/// What a hover panel shows for one module: its own attributes plus the modules it imports and
/// the modules importing it, each listed once per id.
#[derive(Clone, Debug)]
pub struct ModuleSummary<'a> {
    pub uid: &'a str,
    pub node: &'a RawNode,
    pub imports: Vec<&'a AdjacencyEntry>,
    pub imported_by: Vec<&'a AdjacencyEntry>,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Modules whose id fuzzy-matches `query`, best match first. An exact uid always ranks first.
pub fn find_modules<'a>(graph: &'a RawGraph, query: &str, limit: usize) -> Vec<ModuleMatch<'a>> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut matches = graph
        .nodes
        .iter()
        .filter_map(|(uid, node)| {
            let score = if uid == query {
                i64::MAX
            } else {
                fuzzy_match_score(&matcher, &node.id, query)?
            };
            Some(ModuleMatch {
                uid: uid.as_str(),
                node,
                score,
            })
        })
        .collect::<Vec<_>>();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.node.id.len().cmp(&b.node.id.len()))
            .then_with(|| a.node.id.cmp(&b.node.id))
    });
    matches.truncate(limit);
    matches
}

pub fn describe<'a>(
    graph: &'a RawGraph,
    indexes: &'a ImportIndexes,
    uid: &str,
) -> Option<ModuleSummary<'a>> {
    let (uid, node) = graph.nodes.get_key_value(uid)?;

    Some(ModuleSummary {
        uid,
        node,
        imports: indexes.imports.unique_by_id(uid),
        imported_by: indexes.imported_by.unique_by_id(uid),
    })
}
