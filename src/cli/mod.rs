mod cache;
mod evaluate;
mod search;

pub use cache::*;
pub use evaluate::*;
pub use search::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> anyhow::Result<()>;
}
