//! Data module - CSV loading, typed records and aggregation

mod loader;
mod metric;
mod processor;
mod table;

pub use loader::{parse_date, DataLoader, LoaderError};
pub use metric::{Metric, PopulationTable, UnknownMetric, DATE_COLUMN, DATE_FORMAT, REGION_COLUMN};
pub use processor::{DataProcessor, ProcessorError};
pub use table::{CovidTable, DailyRecord, DateRange};
