//! SPARQL JSON results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A single RDF term in a result binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdfTerm {
    /// Lexical value.
    pub value: String,
    /// Term type (`uri`, `literal`, `bnode`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Datatype IRI for typed literals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    /// Language tag for language-tagged literals.
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl RdfTerm {
    /// Create a plain literal term.
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: "literal".to_string(),
            datatype: None,
            lang: None,
        }
    }
}

/// One result row: variable name to bound term.
pub type Binding = BTreeMap<String, RdfTerm>;

/// Errors from validating a results document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResultError {
    /// Body was not JSON at all.
    #[error("invalid JSON: {0}")]
    Json(String),

    /// Body was JSON but not a SPARQL results document.
    #[error("unexpected SPARQL results shape: {0}")]
    Shape(String),
}

#[derive(Deserialize)]
struct ResultsDocument {
    results: ResultsSection,
}

#[derive(Deserialize)]
struct ResultsSection {
    bindings: Vec<Binding>,
}

/// A validated SPARQL JSON results document.
///
/// The original document is kept verbatim and is what gets serialized, so
/// fields the gateway does not model (`head`, `link`, extra term keys) pass
/// through unchanged. The typed bindings are a read-only view over it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct SparqlResult {
    raw: Value,
    bindings: Vec<Binding>,
}

impl SparqlResult {
    /// Parse and validate a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ResultError> {
        let raw: Value =
            serde_json::from_slice(body).map_err(|e| ResultError::Json(e.to_string()))?;
        Self::from_value(raw)
    }

    /// Validate an already-parsed JSON document.
    pub fn from_value(raw: Value) -> Result<Self, ResultError> {
        let document =
            ResultsDocument::deserialize(&raw).map_err(|e| ResultError::Shape(e.to_string()))?;
        Ok(Self {
            raw,
            bindings: document.results.bindings,
        })
    }

    /// Build a result from bindings (used by callers that synthesize results).
    pub fn from_bindings(bindings: Vec<Binding>) -> Self {
        let raw = serde_json::json!({ "results": { "bindings": bindings } });
        Self { raw, bindings }
    }

    /// The typed bindings.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// The document exactly as received.
    pub fn as_json(&self) -> &Value {
        &self.raw
    }

    /// Number of result rows.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether there are no result rows.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Value of `var` in the first row, if bound.
    pub fn first_value(&self, var: &str) -> Option<&str> {
        self.bindings
            .first()
            .and_then(|row| row.get(var))
            .map(|term| term.value.as_str())
    }
}

impl TryFrom<Value> for SparqlResult {
    type Error = ResultError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl Serialize for SparqlResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}
