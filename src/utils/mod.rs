pub mod version_tracker;
