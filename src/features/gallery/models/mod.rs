mod gallery_record;

pub use gallery_record::{GalleryRecord, GalleryRecordPatch, NewGalleryRecord};
