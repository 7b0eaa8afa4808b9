use serde_json::{Value, json};

use crate::error::ExtractError;

/// The record filter for a run: exactly one of an email address, a domain,
/// or a password value. [`Filter::from_options`] is the only constructor
/// path from user input and enforces the exactly-one rule before any
/// network call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Email(String),
    Domain(String),
    Password(String),
}

impl Filter {
    /// Validate the mutually-exclusive email/domain/pass options. Empty
    /// strings count as absent, so a YAML file with `email: ""` does not
    /// conflict with a `--domain` flag.
    pub fn from_options(
        email: Option<String>,
        domain: Option<String>,
        pass: Option<String>,
    ) -> Result<Self, ExtractError> {
        let mut candidates = Vec::new();
        if let Some(value) = email.filter(|v| !v.is_empty()) {
            candidates.push(Filter::Email(value));
        }
        if let Some(value) = domain.filter(|v| !v.is_empty()) {
            candidates.push(Filter::Domain(value));
        }
        if let Some(value) = pass.filter(|v| !v.is_empty()) {
            candidates.push(Filter::Password(value));
        }

        match candidates.len() {
            0 => Err(ExtractError::Config(
                "an argument for one of the following parameters must be supplied: \
                 domain, email, or pass"
                    .into(),
            )),
            1 => Ok(candidates.remove(0)),
            _ => Err(ExtractError::Config(
                "domain, email, and pass parameters are mutually exclusive, i.e. \
                 only one can receive a value"
                    .into(),
            )),
        }
    }

    /// Lucene query-string expression for this filter. Domain searches use a
    /// suffix wildcard on the email field.
    pub fn query_string(&self) -> String {
        match self {
            Filter::Email(email) => format!(r#"email:"{}""#, email),
            Filter::Domain(domain) => format!(r#"email:"*@{}""#, domain),
            Filter::Password(pass) => format!(r#"password:"{}""#, pass),
        }
    }
}

/// Build the query clause shared by the count and scroll requests. The
/// filter sits in a required bool clause so additional filters compose.
pub fn build_query(filter: &Filter) -> Value {
    json!({
        "bool": {
            "must": [
                { "query_string": { "query": filter.query_string() } }
            ]
        }
    })
}

/// Full search body for the initial scroll request.
pub fn search_body(filter: &Filter, page_size: usize) -> Value {
    json!({
        "query": build_query(filter),
        "size": page_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_filter_required() {
        let err = Filter::from_options(None, None, None);
        assert!(err.is_err(), "no filter should be rejected");

        let err = Filter::from_options(
            Some("a@example.com".into()),
            Some("example.com".into()),
            None,
        );
        assert!(err.is_err(), "two filters should be rejected");

        let err = Filter::from_options(
            Some("a@example.com".into()),
            Some("example.com".into()),
            Some("hunter2".into()),
        );
        assert!(err.is_err(), "three filters should be rejected");
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let filter = Filter::from_options(
            Some(String::new()),
            Some("example.com".into()),
            Some(String::new()),
        )
        .unwrap();
        assert_eq!(filter, Filter::Domain("example.com".into()));

        let err = Filter::from_options(Some(String::new()), None, Some(String::new()));
        assert!(err.is_err(), "all-empty options should be rejected");
    }

    #[test]
    fn test_email_query_string() {
        let filter = Filter::Email("user@example.com".into());
        assert_eq!(filter.query_string(), r#"email:"user@example.com""#);
    }

    #[test]
    fn test_domain_query_string_uses_suffix_wildcard() {
        let filter = Filter::Domain("example.com".into());
        assert_eq!(filter.query_string(), r#"email:"*@example.com""#);
    }

    #[test]
    fn test_password_query_string() {
        let filter = Filter::Password("hunter2".into());
        assert_eq!(filter.query_string(), r#"password:"hunter2""#);
    }

    #[test]
    fn test_query_wraps_filter_in_required_bool_clause() {
        let query = build_query(&Filter::Domain("example.com".into()));
        let must = query["bool"]["must"]
            .as_array()
            .expect("must should be an array");
        assert_eq!(must.len(), 1, "exactly one required clause");
        assert_eq!(
            must[0]["query_string"]["query"],
            r#"email:"*@example.com""#,
            "clause should carry the filter expression"
        );
    }

    #[test]
    fn test_search_body_carries_page_size() {
        let body = search_body(&Filter::Email("user@example.com".into()), 10_000);
        assert_eq!(body["size"], 10_000, "size should be set on the body");
        assert!(
            body["query"]["bool"]["must"].is_array(),
            "query should be the wrapped bool clause"
        );
    }
}
