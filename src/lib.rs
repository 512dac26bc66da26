//! awesome: browse, crawl and replay curated awesome lists
//!
//! Layers, leaf first:
//! - `domain`: the Category → Subcategory → Repo tree, list documents, navigation
//! - `application`: crawler, favourites and browse services
//! - `infrastructure`: HTTP fetcher, file cache, selector, browser, DI container
//! - `cli`: argument parsing, command dispatch, terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
