//! Network tools, gated behind the `web-tools` Cargo feature.
//!
//! | Tool | Kind | Key Dependency |
//! |------|------|----------------|
//! | `web_fetch` | fetch | `reqwest` + `scraper` |
//!
//! `web_fetch` is not read-only: it reaches outside the machine, so an
//! `ask` policy applies to it like any mutating tool.

mod fetch;

pub use fetch::{WEB_FETCH, WebFetchTool, html_to_text, parse_url};
