pub use errors::*;
pub use fetcher::*;
pub use parser::*;
pub use transport::*;

mod errors;
mod fetcher;
mod parser;
mod transport;
