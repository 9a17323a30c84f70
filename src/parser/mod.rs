pub mod explodes;
pub mod subparser;

pub use explodes::{explode, explode_conf_content};
pub use subparser::{add_nodes, filter_nodes, ParseSettings};
