pub mod issues;
pub mod page;
pub mod path;
pub mod settings;
pub mod topic;

pub use page::{attr_value, AssetLink, Attr, EmbeddedObject, PageLink, PageRecord, HTML_HELP_CLSID};
pub use path::{DocRelPath, RootPath};
pub use settings::{init_settings, settings, Settings};
pub use topic::{KeywordMap, Topic, TopicIndex, CHW_WINDOW};
