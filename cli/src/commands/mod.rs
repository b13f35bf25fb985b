pub mod cli;
pub mod execute;
pub mod info;
pub mod planning;
pub mod task;
pub mod template;
