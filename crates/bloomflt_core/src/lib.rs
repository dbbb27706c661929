pub mod consts;
pub mod errors;
pub mod utils;
pub mod hash;
pub mod bits;
pub mod filter;
pub mod codec;
pub mod file;
pub mod config;

pub use bits::{BitField, FoldSink};
pub use codec::{load, load_as, load_raw, save, save_as, save_raw, Encoding, Header, SaveOptions};
pub use config::Config;
pub use errors::{BloomError, Result};
pub use file::{load_file, load_file_as, save_file, save_file_as};
pub use filter::Filter;
pub use hash::{HashSource, Xxh3};
