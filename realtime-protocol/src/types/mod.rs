pub mod audio;
pub mod common;
pub mod int_or_inf;
pub mod item;
pub mod nullable;
pub mod response;
pub mod session;
pub mod tool;

pub use audio::*;
pub use common::*;
pub use int_or_inf::*;
pub use item::*;
pub use nullable::*;
pub use response::*;
pub use session::*;
pub use tool::*;
