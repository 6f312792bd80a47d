mod assignment;
mod game;
mod result;
mod score;
mod season;

pub use assignment::*;
pub use game::*;
pub use result::*;
pub use score::*;
pub use season::*;
