//! Article collection for configured news sites.
//!
//! Collection runs in two phases per site:
//!
//! 1. **Indexing**: fetch the homepage and pull raw article links out of it
//!    ([`homepage`])
//! 2. **Fetching**: resolve each link ([`links`]), fetch and parse it
//!    ([`article`]) and keep the ones that produced a body ([`collect`])
//!
//! Which elements hold links, titles and bodies is described per site by a
//! [`schema::SiteSchema`]. All network access goes through a
//! [`transport::PageSource`], so tests can run the whole loop offline.
//!
//! Failures of individual articles are logged and skipped; only a homepage
//! that cannot be fetched stops a site's run.

pub mod article;
pub mod collect;
pub mod homepage;
pub mod links;
pub mod schema;
pub mod transport;
