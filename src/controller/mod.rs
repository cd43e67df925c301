//! Session state and the flows that change it.
//!
//! Nothing here touches the terminal. The UI layer reads [`Session`] to draw
//! and drives the flows in [`flows`] from background tasks.

pub mod analytics;
pub mod export;
pub mod flows;
mod session;
mod urls;

pub use analytics::{AnalyticsData, ArticleStats};
pub use export::{DownloadFormat, ExportError};
pub use flows::{
    DownloadJob, Flow, FlowError, GenerateForm, GenerateJob, ScrapeForm, ScrapeJob,
};
pub use session::{CurrentArticle, Session};
pub use urls::UrlSet;
