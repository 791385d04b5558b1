//! Sensor telemetry shaping: raw backend readings in, chart-ready series out.
//!
//! The pipeline is `reading::parse_batch` → `window::select` →
//! `series::aggregate`, with `resolver` picking which sensor's readings to
//! fetch for a location or plant and `view` tying it to the backend.

pub mod reading;
pub mod resolver;
pub mod series;
pub mod view;
pub mod window;

pub use reading::{parse_batch, parse_reading, ParsedReading, ReadingError, SensorPayload};
pub use resolver::{resolve, Target};
pub use series::{aggregate, Aggregate, ChartSeries, Metric, MinMax, SensorProfile, Substrate};
pub use view::{build_view, DashboardView, ViewRequest, ViewStatus};
pub use window::{select, WindowConfig, WindowError, WindowRequest};
