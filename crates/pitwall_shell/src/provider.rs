//! Data-provider collaborator contract.
//!
//! Providers are opaque async functions: the interpreter hands them a [`DataQuery`] and awaits
//! structured data or a failure. Retries and caching are the provider's concern.

use std::rc::Rc;

use futures::{future::LocalBoxFuture, FutureExt};
use pitwall_contract::ShellError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::{DataQuery, ProviderDomain};

/// Structured provider result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProviderData {
    /// The provider had nothing for this query.
    Empty,
    /// Display-ready text produced by the provider.
    Text {
        /// Rendered text.
        text: String,
    },
    /// Label/value pairs.
    Record {
        /// Optional heading line.
        title: Option<String>,
        /// Fields in display order.
        fields: Vec<(String, String)>,
    },
    /// Rows under named columns.
    Table {
        /// Optional heading line.
        title: Option<String>,
        /// Column headers.
        columns: Vec<String>,
        /// Row cells, one vector per row.
        rows: Vec<Vec<String>>,
    },
}

/// Provider-side failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    /// The requested entity does not exist upstream.
    #[error("{0} not found")]
    NotFound(String),
    /// Network or upstream service failure.
    #[error("upstream request failed: {0}")]
    Upstream(String),
    /// The upstream payload could not be interpreted.
    #[error("malformed upstream data: {0}")]
    Malformed(String),
}

impl From<ProviderFailure> for ShellError {
    fn from(failure: ProviderFailure) -> Self {
        ShellError::provider(failure.to_string())
    }
}

/// Async provider entrypoint.
pub type ProviderHandler =
    Rc<dyn Fn(DataQuery) -> LocalBoxFuture<'static, Result<ProviderData, ProviderFailure>>>;

/// The three provider families the interpreter dispatches to.
#[derive(Clone)]
pub struct ProviderSet {
    reference: ProviderHandler,
    live: ProviderHandler,
    results: ProviderHandler,
}

impl ProviderSet {
    /// Wires one handler per domain.
    pub fn new(reference: ProviderHandler, live: ProviderHandler, results: ProviderHandler) -> Self {
        Self {
            reference,
            live,
            results,
        }
    }

    /// Routes every domain to the same handler.
    pub fn uniform(handler: ProviderHandler) -> Self {
        Self::new(handler.clone(), handler.clone(), handler)
    }

    /// Handlers that fail every call; used until real integrations are wired.
    pub fn unconfigured() -> Self {
        Self::uniform(Rc::new(|query: DataQuery| {
            async move {
                Err::<ProviderData, _>(ProviderFailure::Upstream(format!(
                    "no {:?} provider configured for `{}`",
                    query.domain(),
                    query.name()
                )))
            }
            .boxed_local()
        }))
    }

    /// Handler responsible for `domain`.
    pub fn handler(&self, domain: ProviderDomain) -> &ProviderHandler {
        match domain {
            ProviderDomain::Reference => &self.reference,
            ProviderDomain::Live => &self.live,
            ProviderDomain::Results => &self.results,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pitwall_contract::ErrorKind;

    use super::*;

    #[test]
    fn failures_convert_to_provider_errors() {
        let error: ShellError = ProviderFailure::NotFound("driver `nobody`".to_string()).into();
        assert_eq!(error.kind, ErrorKind::Provider);
        assert_eq!(error.message, "driver `nobody` not found");
    }

    #[test]
    fn routing_follows_query_domain() {
        let tagged = |tag: &'static str| -> ProviderHandler {
            Rc::new(move |_query: DataQuery| {
                async move {
                    Ok::<_, ProviderFailure>(ProviderData::Text {
                        text: tag.to_string(),
                    })
                }
                .boxed_local()
            })
        };
        let providers = ProviderSet::new(tagged("reference"), tagged("live"), tagged("results"));
        let query = DataQuery::PitStops {
            year: 2023,
            round: 3,
        };
        let data = block_on(providers.handler(query.domain())(query)).expect("fetch");
        assert_eq!(
            data,
            ProviderData::Text {
                text: "results".to_string()
            }
        );
    }

    #[test]
    fn unconfigured_providers_fail() {
        let providers = ProviderSet::unconfigured();
        let result = block_on(providers.handler(ProviderDomain::Live)(DataQuery::Live));
        assert!(matches!(result, Err(ProviderFailure::Upstream(_))));
    }
}
