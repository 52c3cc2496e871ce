pub mod archive;
mod write_wrapper;
