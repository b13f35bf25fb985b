pub mod file;

pub use file::FileCodeProvider;
