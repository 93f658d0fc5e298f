//! Declarative case generation for import endpoints
//!
//! Pure: turns fixtures into an ordered list of [`TestCase`]s. Sending the
//! requests and judging the responses happens in the runner crate.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::field::FieldSchema;
use crate::mutate::malformed_queries;

/// Error message the endpoint returns for a missing or unreadable `id`.
pub const MISSING_PARAMETER_ERROR: &str = "Missing parameter for the import endpoint";

/// Query parameter the import adapter probes.
pub const ID_PARAM: &str = "id";

/// Characters `encodeURIComponent` leaves untouched.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode like JavaScript `encodeURIComponent`.
#[must_use]
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

/// Which branch of the endpoint contract a case exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaseKind {
    ValidId,
    NonExistentId,
    MissingParameter,
    MalformedQuery,
}

impl CaseKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidId => "valid_id",
            Self::NonExistentId => "non_existent_id",
            Self::MissingParameter => "missing_parameter",
            Self::MalformedQuery => "malformed_query",
        }
    }
}

impl std::fmt::Display for CaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the response body must look like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum BodyExpectation {
    /// Non-empty array, every element conforming to `fields`
    Items { fields: FieldSchema },
    /// `[]`
    EmptyArray,
    /// Object with an `error` key holding exactly `message`
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Expectation {
    pub status: u16,
    pub body: BodyExpectation,
}

impl Expectation {
    #[must_use]
    pub fn items(fields: FieldSchema) -> Self {
        Self {
            status: 200,
            body: BodyExpectation::Items { fields },
        }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self {
            status: 200,
            body: BodyExpectation::EmptyArray,
        }
    }

    #[must_use]
    pub fn missing_parameter() -> Self {
        Self {
            status: 400,
            body: BodyExpectation::Error {
                message: MISSING_PARAMETER_ERROR.to_string(),
            },
        }
    }
}

/// One GET request and the response it must produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TestCase {
    pub kind: CaseKind,
    /// Human-readable case name, as shown in reports
    pub name: String,
    pub endpoint: String,
    /// Already-encoded query string, without the leading `?`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub expectation: Expectation,
}

impl TestCase {
    /// Path plus query, ready to append to a base URL.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.endpoint),
            None => self.endpoint.clone(),
        }
    }
}

/// Fixtures for one endpoint, with malformed queries spelled out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointFixtures {
    pub valid_ids: Vec<String>,
    pub non_existent_ids: Vec<String>,
    /// Raw `key=value` fragments; encoded as a whole when sent
    pub invalid_queries: Vec<String>,
    pub fields: FieldSchema,
}

/// Fixtures for an import endpoint. Malformed queries are derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFixtures {
    pub valid_ids: Vec<String>,
    /// Ids expected to match nothing
    pub invalid_ids: Vec<String>,
    pub fields: FieldSchema,
}

impl ImportFixtures {
    /// Probe `id` with the first valid id through every mutation.
    ///
    /// Without valid ids the mutated value is empty, so the parser error path
    /// is still exercised.
    #[must_use]
    pub fn to_endpoint_fixtures(&self) -> EndpointFixtures {
        let invalid_queries = malformed_queries(ID_PARAM, first_valid_id(&self.valid_ids))
            .into_iter()
            .map(|(_, q)| q)
            .collect();

        EndpointFixtures {
            valid_ids: self.valid_ids.clone(),
            non_existent_ids: self.invalid_ids.clone(),
            invalid_queries,
            fields: self.fields.clone(),
        }
    }
}

fn first_valid_id(valid_ids: &[String]) -> &str {
    valid_ids.first().map_or("", String::as_str)
}

/// `{endpoint_base}/import`
#[must_use]
pub fn import_endpoint(endpoint_base: &str) -> String {
    format!("{}/import", endpoint_base.trim_end_matches('/'))
}

/// Enumerate every case for an endpoint.
///
/// Order: valid ids, non-existent ids, the missing-parameter case, then the
/// malformed queries.
#[must_use]
pub fn build_endpoint_cases(endpoint: &str, fixtures: &EndpointFixtures) -> Vec<TestCase> {
    let mut cases = Vec::with_capacity(
        fixtures.valid_ids.len() + fixtures.non_existent_ids.len() + 1 + fixtures.invalid_queries.len(),
    );

    for id in &fixtures.valid_ids {
        cases.push(TestCase {
            kind: CaseKind::ValidId,
            name: format!("Query with valid id '{id}' gives proper results"),
            endpoint: endpoint.to_string(),
            query: Some(format!("{ID_PARAM}={}", encode_component(id))),
            expectation: Expectation::items(fixtures.fields.clone()),
        });
    }

    for id in &fixtures.non_existent_ids {
        cases.push(TestCase {
            kind: CaseKind::NonExistentId,
            name: format!("Query with non-existent id '{id}' gives empty result"),
            endpoint: endpoint.to_string(),
            query: Some(format!("{ID_PARAM}={}", encode_component(id))),
            expectation: Expectation::empty(),
        });
    }

    cases.push(TestCase {
        kind: CaseKind::MissingParameter,
        name: "Error when no query".to_string(),
        endpoint: endpoint.to_string(),
        query: None,
        expectation: Expectation::missing_parameter(),
    });

    for query in &fixtures.invalid_queries {
        cases.push(TestCase {
            kind: CaseKind::MalformedQuery,
            name: format!("Error with query '{query}'"),
            endpoint: endpoint.to_string(),
            query: Some(encode_component(query)),
            expectation: Expectation::missing_parameter(),
        });
    }

    cases
}

/// Cases for `{endpoint_base}/import`.
#[must_use]
pub fn build_import_cases(endpoint_base: &str, fixtures: &ImportFixtures) -> Vec<TestCase> {
    build_endpoint_cases(&import_endpoint(endpoint_base), &fixtures.to_endpoint_fixtures())
}

/// Accumulates fixtures before generating cases.
///
/// ```
/// use importcheck_core::{FieldSchema, FieldSpec, SuiteBuilder};
///
/// let cases = SuiteBuilder::import("/widgets")
///     .valid_id("42")
///     .invalid_id("999999")
///     .fields(FieldSchema::new().field("id", FieldSpec::number()))
///     .build();
/// assert_eq!(cases.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct SuiteBuilder {
    endpoint: String,
    fixtures: EndpointFixtures,
    probe_id: bool,
    probes: Vec<(String, String)>,
}

impl SuiteBuilder {
    /// Builder for an arbitrary endpoint. No malformed queries unless added.
    #[must_use]
    pub fn endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            fixtures: EndpointFixtures::default(),
            probe_id: false,
            probes: Vec::new(),
        }
    }

    /// Builder for `{endpoint_base}/import`; probes `id` with the first valid id.
    #[must_use]
    pub fn import(endpoint_base: &str) -> Self {
        Self {
            probe_id: true,
            ..Self::endpoint(import_endpoint(endpoint_base))
        }
    }

    #[must_use]
    pub fn valid_id(mut self, id: impl Into<String>) -> Self {
        self.fixtures.valid_ids.push(id.into());
        self
    }

    #[must_use]
    pub fn valid_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fixtures.valid_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn invalid_id(mut self, id: impl Into<String>) -> Self {
        self.fixtures.non_existent_ids.push(id.into());
        self
    }

    #[must_use]
    pub fn invalid_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fixtures
            .non_existent_ids
            .extend(ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: FieldSchema) -> Self {
        self.fixtures.fields = fields;
        self
    }

    /// Add a raw malformed `key=value` fragment.
    #[must_use]
    pub fn invalid_query(mut self, query: impl Into<String>) -> Self {
        self.fixtures.invalid_queries.push(query.into());
        self
    }

    /// Generate malformed-query cases for another parameter.
    #[must_use]
    pub fn probe_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.probes.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn into_fixtures(self) -> (String, EndpointFixtures) {
        let mut fixtures = self.fixtures;
        let mut derived = Vec::new();
        if self.probe_id {
            let id = first_valid_id(&fixtures.valid_ids);
            derived.extend(malformed_queries(ID_PARAM, id).into_iter().map(|(_, q)| q));
        }
        for (key, value) in &self.probes {
            derived.extend(malformed_queries(key, value).into_iter().map(|(_, q)| q));
        }
        derived.append(&mut fixtures.invalid_queries);
        fixtures.invalid_queries = derived;
        (self.endpoint, fixtures)
    }

    #[must_use]
    pub fn build(self) -> Vec<TestCase> {
        let (endpoint, fixtures) = self.into_fixtures();
        build_endpoint_cases(&endpoint, &fixtures)
    }
}
