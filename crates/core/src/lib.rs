//! Core library for hkipo
//!
//! This crate is the **Functional Core** of the hkipo application. It turns raw
//! upstream response bodies into typed records and never performs I/O. The
//! `hkipo` binary crate owns the HTTP client, the MCP server and the CLI.
//!
//! Every parser is total: malformed or unexpected input degrades to default
//! values (an empty page, an `unknown` detail record, an absent sub-record)
//! instead of an error.
//!
//! # Module Organization
//!
//! - [`types`]: Output records shared by every parser
//! - [`value`], [`normalize`]: Lenient field access and value normalization
//! - [`list`]: Active IPO list (JSON envelope and legacy HTML table)
//! - [`detail`]: Listing detail (JSON brief document and legacy HTML page)
//! - [`grey`], [`placing`]: Grey-market quotes and placing results
//! - [`stats`]: Name search and market overview statistics
//! - [`format`]: Text rendering of a detail record
//! - [`args`], [`response`]: Tool argument validation and the response envelope
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use hkipo_core::list::parse_ipo_list;
//!
//! let body = r#"{"result":1,"data":{"totalRows":1,"dataList":[{"symbol":"6603","shortName":"IFBH"}]}}"#;
//! let page = parse_ipo_list(body, 1, 20);
//!
//! assert_eq!(page.items[0].stock_code, "06603");
//! ```

pub mod args;
pub mod detail;
pub mod format;
pub mod grey;
pub mod list;
pub mod normalize;
pub mod placing;
pub mod response;
pub mod stats;
pub mod types;
pub mod value;
