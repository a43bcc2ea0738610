//! rasqc core library.
//!
//! Registers quality-control checkers into named suites, runs a suite
//! against a HEC-RAS model and aggregates the results for reporting.
//!
//! High-level modules:
//! - `result`: the uniform `CheckResult` record and its status/message types.
//! - `checker`: the `Checker` trait every rule implements.
//! - `schema`: convention schema loading and pattern validation.
//! - `registry`: suites and the registry built from the static table.
//! - `orchestrator`: ordered, fault-isolated suite execution.
//! - `summary`: grouping by outcome/rule/file and tabular exports.
//! - `report`: JSON report, HTML log and GeoJSON layers.
//! - `model`: minimal read-only HEC-RAS model reader.
//! - `stac`: the `stac_ffrd` naming suite over STAC item assets.
//! - `checkers`: built-in checkers.
//! - `config`: discovery and effective configuration resolution.
//! - `output`: console and JSON printers.
//! - `cli`: CLI argument parsing (binary uses this).
pub mod checker;
pub mod checkers;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod registry;
pub mod report;
pub mod result;
pub mod schema;
pub mod stac;
pub mod summary;
