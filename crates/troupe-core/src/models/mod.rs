pub mod agent_spec;
pub mod conversation;
pub mod use_case;

pub use agent_spec::*;
pub use conversation::*;
pub use use_case::*;
