
pub mod utility;
pub mod term;
pub mod config;
pub mod error;
pub mod context;
pub mod environment;
pub mod reduce;
pub mod conversion;
pub mod infer;

pub mod prelude {
    pub use crate::{
        utility::*,
        term::*,
        config::*,
        error::*,
        context::*,
        environment::*,
        reduce::*,
        conversion::*,
    };

    pub mod core {
        pub use crate::infer::*;
    }
}
