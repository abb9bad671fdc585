pub mod cloudinary_blob_store;
