pub mod batch_loader;

pub use batch_loader::{load_folder, load_upload_batch, load_upload_file};
