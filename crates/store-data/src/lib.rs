//! # Store Data Crate
//!
//! Domain types and persistence boundary for the store recommendation engine.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Store, Review, Interaction, TasteProfile, RecommendHistory)
//! - **geo**: Distance calculator between two coordinates
//! - **parser**: Parse the JSON dataset into Rust structs
//! - **index**: In-memory `StoreIndex` with category and statistics lookups
//! - **codec**: Versioned blobs used for opaque persisted columns
//! - **repository**: Taste profile, history and interaction repositories
//! - **error**: Error types for loading and persistence
//!
//! ## Example Usage
//!
//! ```ignore
//! use store_data::StoreIndex;
//! use std::path::Path;
//!
//! let index = StoreIndex::load_from_files(Path::new("data/seoul"))?;
//! let store = index.get_store(1).unwrap();
//! let reviews = index.get_store_reviews(1);
//!
//! println!("{} has {} reviews", store.name, reviews.len());
//! ```

pub mod codec;
pub mod error;
pub mod geo;
pub mod index;
pub mod parser;
pub mod repository;
pub mod types;

pub use error::{DataError, Result};
pub use index::StoreIndex;
pub use repository::{
    HistoryStore, InMemoryHistoryStore, InMemoryProfileStore, IndexInteractionSource,
    InteractionSource, TasteProfileStore,
};
pub use types::{
    // Type aliases
    HistoryId,
    StoreId,
    UserId,
    // Core types
    BehaviorPatterns,
    Coordinates,
    HistoryCriteria,
    Interaction,
    Preference,
    RecommendHistory,
    Review,
    Store,
    StoreStats,
    TasteProfile,
    // Enums
    FoodCategory,
    RecommendType,
};
