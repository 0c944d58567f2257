//! A small boxed-future alias used at the handful of trait boundaries
//! (`cache::Cache`, `net::Fetcher`) that need to be object-safe and
//! implementable by both production and test/stub types, without pulling in
//! an async-trait-style proc macro for two methods.

use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
