//! Page discovery for sites without a published index or usable repository.
//!
//! - [`sitemap`] finds a sitemap (via well-known paths and `robots.txt`)
//! - [`engine`] runs a bounded breadth-first crawl when there is none
//! - [`scope`] keeps both confined to the site's origin and base path

pub mod engine;
pub mod scope;
pub mod sitemap;

pub use engine::{CrawlOptions, CrawlResult, CrawledPage, Crawler};
pub use scope::CrawlScope;
pub use sitemap::{SitemapHit, discover_sitemap, parse_sitemap, robots_sitemaps, sitemap_candidates};
