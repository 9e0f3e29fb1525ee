//! Shelf engine: metadata extraction, timers, the article store and effect execution.
mod cache;
mod debounce;
mod decode;
mod engine;
mod extract;
mod fetch;
mod persist;
mod records;
mod store;
mod timer;
mod types;

pub use cache::{CacheKey, ListingCache};
pub use debounce::Debouncer;
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use engine::{
    ChannelEventSink, EngineCommand, EngineConfig, EngineError, EngineHandle, EventSink,
    StoreBackend,
};
pub use extract::{extract_metadata, HtmlMetadataExtractor, MetadataSource};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use persist::{ensure_parent_dir, AtomicFileWriter, PersistError};
pub use records::{FileRecordStore, MemoryRecordStore, RecordStore, StoredArticle, StoredStatus};
pub use store::{ArticleStore, AuthContext, StoreError};
pub use timer::{CancelToken, TimerRegistry};
pub use types::{system_clock, Clock, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput};
