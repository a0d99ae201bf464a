//! The credential list pipeline.
//!
//! Every function here is pure and works on lists already in memory:
//!
//! - [`normalize`] - derive `disabled` and join usage stats onto records
//! - [`filter`] - text search, status filter, prefix filter
//! - [`SelectionSet`] - selected ids, independent of filtering
//! - [`to_chart_series`] - labels plus success/failure series

mod chart;
mod filter;
mod normalize;
mod selection;

pub use chart::{to_chart_series, ChartConfig, ChartSeries, LabelStrategy, LABEL_MAX_CHARS};
pub use filter::{filter, FilterState, StatusFilter};
pub use normalize::{join, normalize, BucketJoin, EntryJoin, NormalizeOptions};
pub use selection::SelectionSet;
