//! Static SPARQL text for each statistics query.

use crate::query::QueryId;

const DATE_RANGE: &str = concat!(
    "PREFIX schema: <http://schema.org/>\n",
    "SELECT (MIN(?date) AS ?earliest) (MAX(?date) AS ?latest)\n",
    "WHERE {\n",
    "  ?article a schema:NewsArticle ;\n",
    "           schema:datePublished ?date .\n",
    "}\n",
);

const TOTAL_ARTICLES: &str = concat!(
    "PREFIX schema: <http://schema.org/>\n",
    "SELECT (COUNT(DISTINCT ?article) AS ?count)\n",
    "WHERE {\n",
    "  ?article a schema:NewsArticle .\n",
    "}\n",
);

const UNIQUE_AUTHORS: &str = concat!(
    "PREFIX schema: <http://schema.org/>\n",
    "SELECT (COUNT(DISTINCT ?author) AS ?count)\n",
    "WHERE {\n",
    "  ?article a schema:NewsArticle ;\n",
    "           schema:author ?author .\n",
    "}\n",
);

const TOP_AUTHORS: &str = concat!(
    "PREFIX schema: <http://schema.org/>\n",
    "SELECT ?name (COUNT(DISTINCT ?article) AS ?count)\n",
    "WHERE {\n",
    "  ?article a schema:NewsArticle ;\n",
    "           schema:author ?author .\n",
    "  ?author schema:name ?name .\n",
    "}\n",
    "GROUP BY ?name\n",
    "ORDER BY DESC(?count)\n",
    "LIMIT 10\n",
);

const UNIQUE_LOCATIONS: &str = concat!(
    "PREFIX schema: <http://schema.org/>\n",
    "SELECT (COUNT(DISTINCT ?location) AS ?count)\n",
    "WHERE {\n",
    "  ?article a schema:NewsArticle ;\n",
    "           schema:contentLocation ?location .\n",
    "}\n",
);

const TOP_LOCATIONS: &str = concat!(
    "PREFIX schema: <http://schema.org/>\n",
    "SELECT ?name (COUNT(DISTINCT ?article) AS ?count)\n",
    "WHERE {\n",
    "  ?article a schema:NewsArticle ;\n",
    "           schema:contentLocation ?location .\n",
    "  ?location schema:name ?name .\n",
    "}\n",
    "GROUP BY ?name\n",
    "ORDER BY DESC(?count)\n",
    "LIMIT 10\n",
);

const TOTAL_PEOPLE: &str = concat!(
    "PREFIX schema: <http://schema.org/>\n",
    "SELECT (COUNT(DISTINCT ?person) AS ?count)\n",
    "WHERE {\n",
    "  ?article a schema:NewsArticle ;\n",
    "           schema:mentions ?person .\n",
    "  ?person a schema:Person .\n",
    "}\n",
);

const TOP_PEOPLE: &str = concat!(
    "PREFIX schema: <http://schema.org/>\n",
    "SELECT ?name (COUNT(DISTINCT ?article) AS ?count)\n",
    "WHERE {\n",
    "  ?article a schema:NewsArticle ;\n",
    "           schema:mentions ?person .\n",
    "  ?person a schema:Person ;\n",
    "          schema:name ?name .\n",
    "}\n",
    "GROUP BY ?name\n",
    "ORDER BY DESC(?count)\n",
    "LIMIT 10\n",
);

/// Fixed mapping from query id to SPARQL text.
///
/// There is no runtime composition: every query is a literal known at build
/// time, and the mapping is total over [`QueryId`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCatalog;

impl QueryCatalog {
    /// Get the SPARQL text for a query.
    pub fn resolve(id: QueryId) -> &'static str {
        match id {
            QueryId::DateRange => DATE_RANGE,
            QueryId::TotalArticles => TOTAL_ARTICLES,
            QueryId::UniqueAuthors => UNIQUE_AUTHORS,
            QueryId::TopAuthors => TOP_AUTHORS,
            QueryId::UniqueLocations => UNIQUE_LOCATIONS,
            QueryId::TopLocations => TOP_LOCATIONS,
            QueryId::TotalPeople => TOTAL_PEOPLE,
            QueryId::TopPeople => TOP_PEOPLE,
        }
    }

    /// Iterate over every `(id, text)` pair.
    pub fn entries() -> impl Iterator<Item = (QueryId, &'static str)> {
        QueryId::ALL.into_iter().map(|id| (id, Self::resolve(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryKind;

    #[test]
    fn test_resolve_is_non_empty_and_stable() {
        for id in QueryId::ALL {
            let first = QueryCatalog::resolve(id);
            let second = QueryCatalog::resolve(id);
            assert!(!first.trim().is_empty(), "{id} has empty text");
            assert_eq!(first, second);
            assert!(std::ptr::eq(first, second));
        }
    }

    #[test]
    fn test_every_query_declares_schema_prefix() {
        for (id, text) in QueryCatalog::entries() {
            assert!(text.starts_with("PREFIX schema: <http://schema.org/>\n"), "{id} is missing the schema prefix");
        }
    }

    #[test]
    fn test_queries_are_distinct() {
        let mut texts: Vec<&str> = QueryCatalog::entries().map(|(_, t)| t).collect();
        texts.sort_unstable();
        texts.dedup();
        assert_eq!(texts.len(), QueryId::ALL.len());
    }

    #[test]
    fn test_projection_matches_kind() {
        for (id, text) in QueryCatalog::entries() {
            match id.kind() {
                QueryKind::Count => assert!(text.contains("AS ?count)"), "{id}"),
                QueryKind::Range => {
                    assert!(text.contains("?earliest") && text.contains("?latest"), "{id}")
                }
                QueryKind::Ranking => {
                    assert!(text.contains("SELECT ?name"), "{id}");
                    assert!(text.contains("LIMIT 10"), "{id}");
                }
            }
        }
    }
}
