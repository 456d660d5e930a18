// Care Desk - Core Library
// Petty cash WhatsApp messages, contact cards and the bits around them.
// Used by the CLI, the terminal UI and tests.

pub mod storage;
pub mod template;
pub mod record;
pub mod filter;
pub mod export;
pub mod slots;
pub mod names;
pub mod vcard;
pub mod contacts;
pub mod theme;
pub mod site;
pub mod config;
pub mod app;

// Re-export commonly used types
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StorageError};
pub use template::{Placeholder, Template, DEFAULT_TEMPLATE};
pub use record::{Record, RecordId, RecordKind, RecordStore, StatusFlag, ValidationError};
pub use filter::{is_visible, FilterState};
pub use export::{
    format_export_bundle, format_preview, format_record, ExportError, Preview, PreviewBlock,
    EXPORT_FILE_NAME,
};
pub use slots::{CapacityError, MinimumSlotError, SlotNumber, TemplateStore, MAX_SLOTS};
pub use names::NameBook;
pub use contacts::{AddOutcome, Contact, ContactCollector, ContactError, ContactForm, VcfExport};
pub use theme::Theme;
pub use site::{bundle_site, BundleError, DirFetcher, SiteFetcher, SITES, SITE_FILES};
#[cfg(feature = "fetch")]
pub use site::HttpFetcher;
pub use config::Config;
pub use app::{AppError, Command, PettyCash, Render};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
