pub mod config;
pub mod events;
pub mod history;
pub mod library;
pub mod metadata;
pub mod metrics;
pub mod provider;
pub mod queue;
pub mod scorer;
pub mod testing;
pub mod workflow;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LibraryConfig,
};
pub use events::{BroadcastEventSink, Event, EventSink, NullEventSink, ProgressSnapshot};
pub use history::{CurrentDownloadState, DownloadStateTransition, HistoryConfig, HistoryTracker};
pub use library::{FsLibraryReader, LibraryCache, LibraryError, LibraryReader, MediaAvailability};
pub use metadata::{
    CatalogTrack, MetadataCatalog, MetadataError, PartialDate, PrimaryType, ReleaseCandidate,
    ReleaseStatus,
};
pub use provider::{
    CancellationSource, CancellationToken, FallbackConfig, FallbackError, FallbackExecutor,
    FetchObserver, FetchQuery, FetchSuccess, FetchedFile, Provider, ProviderError, ProviderResult,
};
pub use queue::{
    DownloadQueue, DownloadQueueItem, EnqueueOutcome, QueueConfig, QueueStatus, SlotSnapshot,
    WorkerPool, WorkflowRunner,
};
pub use scorer::{
    pick_default_candidate, rank_default_candidates, score_candidates, ScoredCandidate,
    ScorerConfig,
};
pub use workflow::{AcquisitionWorkflow, DownloadState, OverrideStore, WorkflowError};
