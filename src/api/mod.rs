pub mod sub;

pub use sub::{sub_process, SubQuery, SubResponse};
