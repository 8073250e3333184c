pub mod matcher;
pub mod pipeline;
