//! Deep link resolution.
//!
//! A [`LinkingConfig`] pairs the URI prefixes the app answers to with the
//! route table. [`LinkResolver::resolve`] is a pure function over it.

mod resolver;
mod routes;

pub use resolver::{LinkResolution, LinkResolver, ResolvedLink};
pub use routes::{
    raw_param, LinkRoute, LinkingConfig, ParamParser, PathTemplate, ScreenName, DEFAULT_PREFIXES,
};
