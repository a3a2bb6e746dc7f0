//! Measure and view definitions.
//!
//! # Metrics
//! - `graphql_server_field_resolve_count` (count): field resolutions by field
//! - `graphql_server_field_resolve_duration` (histogram, ms): field latency by field
//! - `graphql_server_field_resolve_error_count` (count): failed field resolutions by field
//! - `graphql_server_query_resolve_count` (count): query resolutions
//! - `graphql_server_query_resolve_duration` (histogram, ms): query latency
//! - `graphql_server_query_resolve_error_count` (histogram): errors per failed query
//! - `http_server_request_count` (count): requests by method and path
//! - `http_server_latency` (histogram, ms): request latency by method and path
//! - `http_server_response_count_by_status` (count): responses by status code

/// Field identity tag, value `"<TypeName>.<FieldName>"`.
pub const TAG_FIELD: &str = "graphql_field";
pub const TAG_HTTP_METHOD: &str = "http_method";
pub const TAG_HTTP_PATH: &str = "http_path";
pub const TAG_HTTP_STATUS: &str = "http_status";

/// Latency buckets in milliseconds.
pub const LATENCY_DISTRIBUTION: &[f64] = &[
    1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0, 13.0, 16.0, 20.0, 25.0, 30.0, 40.0, 50.0, 65.0,
    80.0, 100.0, 130.0, 160.0, 200.0, 250.0, 300.0, 400.0, 500.0, 650.0, 800.0, 1000.0,
    2000.0, 5000.0, 10000.0, 20000.0, 50000.0, 100000.0,
];

/// Buckets for the number of errors returned by one query.
pub const ERROR_COUNT_DISTRIBUTION: &[f64] = &[
    1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 10.0, 13.0, 16.0, 20.0, 25.0, 30.0, 40.0, 50.0, 65.0,
    80.0, 100.0, 130.0, 160.0, 200.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Dimensionless,
    Milliseconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
    Int64,
    Float64,
}

/// A named quantity that can be measured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measure {
    pub name: &'static str,
    pub description: &'static str,
    pub unit: Unit,
    pub kind: MeasureKind,
}

impl Measure {
    /// A measurement of this measure. Integer measures truncate `value`.
    pub fn m(&self, value: f64) -> Measurement {
        let value = match self.kind {
            MeasureKind::Int64 => value.trunc(),
            MeasureKind::Float64 => value,
        };
        Measurement {
            measure: *self,
            value,
        }
    }
}

/// One data point of a measure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub measure: Measure,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// How measurements of a view are aggregated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    /// Number of measurements recorded.
    Count,
    /// Histogram over explicit bucket bounds.
    Distribution(&'static [f64]),
}

/// Aggregation policy over one measure, broken down by `tag_keys`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub measure: Measure,
    pub description: &'static str,
    pub tag_keys: &'static [&'static str],
    pub aggregation: Aggregation,
}

impl View {
    pub fn name(&self) -> &'static str {
        self.measure.name
    }
}

pub const FIELD_RESOLVE_COUNT: Measure = Measure {
    name: "graphql_server_field_resolve_count",
    description: "Number of times given GraphQL field was resolved",
    unit: Unit::Dimensionless,
    kind: MeasureKind::Int64,
};

pub const FIELD_RESOLVE_DURATION: Measure = Measure {
    name: "graphql_server_field_resolve_duration",
    description: "Duration of given GraphQL field's resolution",
    unit: Unit::Milliseconds,
    kind: MeasureKind::Float64,
};

pub const FIELD_RESOLVE_ERROR_COUNT: Measure = Measure {
    name: "graphql_server_field_resolve_error_count",
    description: "Number of times given GraphQL field's resolution returned an error",
    unit: Unit::Dimensionless,
    kind: MeasureKind::Int64,
};

pub const QUERY_RESOLVE_COUNT: Measure = Measure {
    name: "graphql_server_query_resolve_count",
    description: "Number of times GraphQL queries were resolved",
    unit: Unit::Dimensionless,
    kind: MeasureKind::Int64,
};

pub const QUERY_RESOLVE_DURATION: Measure = Measure {
    name: "graphql_server_query_resolve_duration",
    description: "Duration of GraphQL queries resolution",
    unit: Unit::Milliseconds,
    kind: MeasureKind::Float64,
};

pub const QUERY_RESOLVE_ERROR_COUNT: Measure = Measure {
    name: "graphql_server_query_resolve_error_count",
    description: "Number of errors returned by GraphQL queries resolution",
    unit: Unit::Dimensionless,
    kind: MeasureKind::Int64,
};

pub const HTTP_SERVER_REQUEST_COUNT: Measure = Measure {
    name: "http_server_request_count",
    description: "Number of HTTP requests started",
    unit: Unit::Dimensionless,
    kind: MeasureKind::Int64,
};

pub const HTTP_SERVER_LATENCY: Measure = Measure {
    name: "http_server_latency",
    description: "End-to-end latency of HTTP requests",
    unit: Unit::Milliseconds,
    kind: MeasureKind::Float64,
};

pub const HTTP_SERVER_RESPONSE_COUNT: Measure = Measure {
    name: "http_server_response_count_by_status",
    description: "Number of HTTP responses by status code",
    unit: Unit::Dimensionless,
    kind: MeasureKind::Int64,
};

/// Views of GraphQL query and field analytics.
pub const ANALYTIC_VIEWS: &[View] = &[
    View {
        measure: FIELD_RESOLVE_COUNT,
        description: "Number of times given GraphQL field was resolved",
        tag_keys: &[TAG_FIELD],
        aggregation: Aggregation::Count,
    },
    View {
        measure: FIELD_RESOLVE_DURATION,
        description: "Duration of given GraphQL field's resolution",
        tag_keys: &[TAG_FIELD],
        aggregation: Aggregation::Distribution(LATENCY_DISTRIBUTION),
    },
    View {
        measure: FIELD_RESOLVE_ERROR_COUNT,
        description: "Number of times given GraphQL field's resolution returned an error",
        tag_keys: &[TAG_FIELD],
        aggregation: Aggregation::Count,
    },
    View {
        measure: QUERY_RESOLVE_COUNT,
        description: "Number of times GraphQL queries were resolved",
        tag_keys: &[],
        aggregation: Aggregation::Count,
    },
    View {
        measure: QUERY_RESOLVE_DURATION,
        description: "Duration of GraphQL queries resolution",
        tag_keys: &[],
        aggregation: Aggregation::Distribution(LATENCY_DISTRIBUTION),
    },
    View {
        measure: QUERY_RESOLVE_ERROR_COUNT,
        description: "Number of errors returned by GraphQL queries resolution",
        tag_keys: &[],
        aggregation: Aggregation::Distribution(ERROR_COUNT_DISTRIBUTION),
    },
];

/// Views of the HTTP server serving the GraphQL endpoint.
pub const HTTP_VIEWS: &[View] = &[
    View {
        measure: HTTP_SERVER_REQUEST_COUNT,
        description: "Count of HTTP requests started, by method and path",
        tag_keys: &[TAG_HTTP_METHOD, TAG_HTTP_PATH],
        aggregation: Aggregation::Count,
    },
    View {
        measure: HTTP_SERVER_LATENCY,
        description: "Latency distribution of HTTP requests, by method and path",
        tag_keys: &[TAG_HTTP_METHOD, TAG_HTTP_PATH],
        aggregation: Aggregation::Distribution(LATENCY_DISTRIBUTION),
    },
    View {
        measure: HTTP_SERVER_RESPONSE_COUNT,
        description: "Count of responses, by status code",
        tag_keys: &[TAG_HTTP_STATUS],
        aggregation: Aggregation::Count,
    },
];

/// Every view the observer registers.
pub fn all_views() -> Vec<View> {
    ANALYTIC_VIEWS.iter().chain(HTTP_VIEWS).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_one_view_per_measure() {
        let views = all_views();
        let names: HashSet<_> = views.iter().map(View::name).collect();
        assert_eq!(names.len(), views.len());
    }

    #[test]
    fn test_buckets_are_sorted() {
        for bounds in [LATENCY_DISTRIBUTION, ERROR_COUNT_DISTRIBUTION] {
            assert!(bounds.windows(2).all(|w| w[0] < w[1]));
        }
        assert_eq!(ERROR_COUNT_DISTRIBUTION.last(), Some(&200.0));
    }

    #[test]
    fn test_int_measure_truncates() {
        assert_eq!(QUERY_RESOLVE_ERROR_COUNT.m(3.7).value, 3.0);
        assert_eq!(QUERY_RESOLVE_DURATION.m(3.7).value, 3.7);
    }
}
