//! Core module containing the listing model, filter types and collaborator traits

pub mod error;
pub mod events;
pub mod filter;
pub mod listing;
pub mod message;
pub mod predicate;
pub mod query;
pub mod service;
pub mod sort;

pub use error::{ConfigError, ErrorReport, MarketError, SourceError};
pub use events::{EventBus, EventEnvelope, MarketEvent};
pub use filter::{
    CategorySelector, FilterPatch, FilterState, Interpretation, MarketTab, RecencyWindow,
    SearchCriteria, SortKey, parse_price_bound,
};
pub use listing::{
    Category, Condition, Listing, ListingId, ListingStatus, TradeMethod, UnknownVariant, UserId,
};
pub use message::{ChatMessage, Notification, NotificationKind};
pub use predicate::{Predicate, apply_local_predicates, predicates_for};
pub use query::{ListingPage, PageRange, PageWindow, RemoteQuery};
pub use service::{LikedSetSource, ListingSource, QueryInterpreter, ViewCounter};
pub use sort::{LikedSet, sort_listings};
