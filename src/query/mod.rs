pub mod corpus;
pub mod engine;
pub mod filter;

pub use corpus::{Corpus, NameMatch, Named, PathNames, TagNames};
pub use engine::{MatchEngine, Scored, SearchLimits, SearchResults};
pub use filter::{Filter, StructuredQuery};
