pub mod audio;
pub mod messaging;
pub mod observability;
pub mod storage;
