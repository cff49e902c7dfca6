pub mod combined;
pub mod markers;
pub mod scores;
