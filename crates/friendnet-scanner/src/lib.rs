pub mod browser;
pub mod dom_scraper;
pub mod pagination;
pub mod reconcile;
pub mod scanner;
pub mod session;
pub mod source;
pub mod transport;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod test_support;

pub use browser::*;
pub use dom_scraper::*;
pub use pagination::*;
pub use reconcile::*;
pub use scanner::*;
pub use session::*;
pub use source::*;
pub use transport::*;
pub use webdriver::*;
