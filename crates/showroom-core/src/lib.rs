pub mod asset;
pub mod capability;
pub mod constants;
pub mod decoders;
pub mod lod;
pub mod pick;
pub mod render_mode;
pub mod scene;
pub mod tuning;
pub mod viewport;

pub use asset::*;
pub use capability::*;
pub use constants::*;
pub use decoders::*;
pub use lod::*;
pub use pick::*;
pub use render_mode::*;
pub use scene::*;
pub use tuning::*;
pub use viewport::*;
