pub mod clash;
pub mod mellow;
pub mod quan;
pub mod quanx;
pub mod single;
pub mod ssd;
pub mod surge;

pub use clash::proxy_to_clash;
pub use mellow::proxy_to_mellow;
pub use quan::proxy_to_quan;
pub use quanx::proxy_to_quanx;
pub use single::{proxy_to_single, SingleLinkTypes};
pub use ssd::proxy_to_ssd;
pub use surge::proxy_to_surge;
