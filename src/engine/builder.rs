//! EngineBuilder for assembling a query engine from its collaborators

use super::{ListingQueryEngine, QueryState};
use crate::config::MarketConfig;
use crate::core::error::{ConfigError, MarketError};
use crate::core::filter::SearchCriteria;
use crate::core::listing::UserId;
use crate::core::service::{LikedSetSource, ListingSource, QueryInterpreter};
use crate::storage::NoInterpreter;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Builder for [`ListingQueryEngine`]
///
/// # Example
///
/// ```ignore
/// let engine = EngineBuilder::new()
///     .with_listing_source(store.clone())
///     .with_interpreter(Arc::new(NoInterpreter))
///     .with_config(MarketConfig::from_yaml_file("market.yaml")?)
///     .build()?;
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    source: Option<Arc<dyn ListingSource>>,
    liked_source: Option<Arc<dyn LikedSetSource>>,
    interpreter: Option<Arc<dyn QueryInterpreter>>,
    viewer: Option<UserId>,
    config: Option<MarketConfig>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listing source (required)
    pub fn with_listing_source(mut self, source: Arc<dyn ListingSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the source of the viewer's liked ids
    pub fn with_liked_source(mut self, source: Arc<dyn LikedSetSource>) -> Self {
        self.liked_source = Some(source);
        self
    }

    /// Set the query interpreter (defaults to [`NoInterpreter`])
    pub fn with_interpreter(mut self, interpreter: Arc<dyn QueryInterpreter>) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    /// Set the signed-in viewer; anonymous viewers have no liked set
    pub fn with_viewer(mut self, viewer: UserId) -> Self {
        self.viewer = Some(viewer);
        self
    }

    pub fn with_config(mut self, config: MarketConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the engine
    ///
    /// Fails when no listing source was given or the configuration does
    /// not validate.
    pub fn build(self) -> Result<ListingQueryEngine, MarketError> {
        let source = self.source.ok_or(ConfigError::MissingCollaborator {
            name: "listing source",
        })?;

        let config = self.config.unwrap_or_default();
        config.validate()?;

        let state = QueryState::new(
            SearchCriteria::new(config.default_filter.clone()),
            config.page_size,
        );

        Ok(ListingQueryEngine {
            source,
            liked_source: self.liked_source,
            interpreter: self
                .interpreter
                .unwrap_or_else(|| Arc::new(NoInterpreter)),
            viewer: self.viewer,
            config,
            state: Mutex::new(state),
            liked: OnceCell::new(),
        })
    }
}
