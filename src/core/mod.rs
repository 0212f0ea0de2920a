//! Core module - the portfolio engine and its supporting types

pub mod buffer;
pub mod catalog;
pub mod config;
pub mod diagnose;
pub mod entity;
pub mod export;
pub mod gateway;
pub mod portfolio;
pub mod ranking;
pub mod report;
pub mod store;

pub use buffer::{EditBuffer, EditError, FlushOutcome, FlushReport};
pub use config::{Config, ConfigError};
pub use diagnose::{Diagnosis, ErrorCategory};
pub use entity::{Classification, Status};
pub use gateway::{Gateway, GatewayError};
pub use portfolio::{NoticeLevel, Portfolio, PortfolioError, PortfolioEvent};
pub use ranking::{Filter, RankedRow, RankedView, SortDirection, SortKey, SortState, ViewState};
pub use store::RecordStore;
