pub mod ast;
pub mod batch;
pub mod config;
pub mod error;
pub mod logger;
pub mod scope;
pub mod thread_pool;
pub mod transform;
pub mod tree_shaking;
pub mod visitors;

pub use batch::{
    collect_outcomes, transform_source, transform_sources, BatchError, ModuleOutcome, Source,
    TransformedSource,
};
pub use config::{Config, RemovalTarget, RemovalTargets, RootSet};
pub use error::ShakeError;
pub use transform::{transform_module, TransformOutput};
pub use tree_shaking::{keep_exports, remove_exports};
